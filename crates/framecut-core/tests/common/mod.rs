// crates/framecut-core/tests/common/mod.rs
//
// Scripted collaborators for integration tests.
//
// ScriptedHandle behaves like a real decoder handle: seeks complete on a
// background thread after `delay`, the decoded position only changes when a
// seek completes, and rasterize() paints whatever is decoded right now. That
// makes a capture that resolves on the wrong signal visible — it would
// rasterize the previous position.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use framecut_core::{
    AudioSampleBuffer, AudioSource, EngineConfig, FrameCutError, MediaHandle, Result, RgbaFrame,
    SeekSignal, SeekStatus, SourceInfo,
};

#[derive(Default)]
pub struct MockState {
    /// Position of the frame currently decoded.
    pub decoded:    f64,
    /// Every seek request, in order.
    pub seeks:      Vec<(u64, f64)>,
    /// Decoded position at every rasterize call.
    pub rasterized: Vec<f64>,
}

#[derive(Clone, Default)]
pub struct Script {
    pub delay:    Duration,
    /// This seek never answers on its own; its signal is delivered late,
    /// right before the next seek's signal.
    pub hold_seq: Option<u64>,
    /// This seek answers with SeekStatus::Failed.
    pub fail_seq: Option<u64>,
}

pub struct ScriptedHandle {
    duration: f64,
    size:     (u32, u32),
    playhead: f64,
    script:   Script,
    held:     Option<(u64, f64)>,
    state:    Arc<Mutex<MockState>>,
    tx:       Sender<SeekSignal>,
    rx:       Receiver<SeekSignal>,
}

impl ScriptedHandle {
    pub fn new(duration: f64, size: (u32, u32), script: Script) -> (Self, Arc<Mutex<MockState>>) {
        let (tx, rx) = unbounded();
        let state = Arc::new(Mutex::new(MockState::default()));
        let handle = Self {
            duration, size, playhead: 0.0, script, held: None,
            state: Arc::clone(&state), tx, rx,
        };
        (handle, state)
    }
}

impl MediaHandle for ScriptedHandle {
    fn duration(&self) -> f64 { self.duration }
    fn natural_size(&self) -> (u32, u32) { self.size }
    fn playhead(&self) -> f64 { self.playhead }

    fn request_seek(&mut self, seq: u64, time: f64) {
        self.playhead = time;
        self.state.lock().unwrap().seeks.push((seq, time));

        if self.script.hold_seq == Some(seq) {
            self.held = Some((seq, time));
            return;
        }

        let status = if self.script.fail_seq == Some(seq) {
            SeekStatus::Failed("corrupt packet".into())
        } else {
            SeekStatus::Landed(time)
        };
        let held  = self.held.take();
        let delay = self.script.delay;
        let state = Arc::clone(&self.state);
        let tx    = self.tx.clone();
        thread::spawn(move || {
            if let Some((old_seq, old_time)) = held {
                state.lock().unwrap().decoded = old_time;
                let _ = tx.send(SeekSignal { seq: old_seq, status: SeekStatus::Landed(old_time) });
            }
            thread::sleep(delay);
            if matches!(status, SeekStatus::Landed(_)) {
                state.lock().unwrap().decoded = time;
            }
            let _ = tx.send(SeekSignal { seq, status });
        });
    }

    fn signals(&self) -> &Receiver<SeekSignal> { &self.rx }

    fn rasterize(&mut self) -> Result<RgbaFrame> {
        let mut state = self.state.lock().unwrap();
        let decoded = state.decoded;
        state.rasterized.push(decoded);
        let shade = (decoded * 10.0).round() as u8;
        Ok(RgbaFrame::filled(self.size.0, self.size.1, [shade, shade, shade, 255]))
    }
}

pub struct MockAudio {
    pub size:   u64,
    pub buffer: Option<AudioSampleBuffer>,
}

impl AudioSource for MockAudio {
    fn byte_len(&self) -> u64 { self.size }
    fn decode(&self) -> Result<AudioSampleBuffer> {
        self.buffer
            .clone()
            .ok_or_else(|| FrameCutError::DecodeFailure("unsupported codec".into()))
    }
}

/// 440 Hz sine, `seconds` long, `channels` copies.
pub fn sine(seconds: f64, rate: u32, channels: usize) -> AudioSampleBuffer {
    let n = (seconds * rate as f64).round() as usize;
    let plane: Vec<f32> = (0..n)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.8)
        .collect();
    AudioSampleBuffer::new(rate, vec![plane; channels]).unwrap()
}

pub fn source_info(duration: f64) -> SourceInfo {
    SourceInfo {
        path:      PathBuf::from("/videos/sample.mp4"),
        file_size: 1_000,
        duration,
        width:     8,
        height:    6,
        has_audio: true,
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig { seek_timeout_ms: 2_000, ..EngineConfig::default() }.without_delays()
}
