// crates/framecut-media/src/handle.rs
//
// FfmpegHandle: MediaHandle backed by a FrameSource (normally a FrameDecoder)
// on its own thread.
//
// The decoder lives on the decode thread for its whole life (FFmpeg contexts
// are opened there and never cross threads). The handle talks to it over a
// command channel; every seek is answered by a SeekSignal carrying the
// request's sequence number once the frame at the target is decoded and
// stored in the shared slot that rasterize() reads.
//
// Pending seeks are latest-wins: when several are queued (rapid scrubbing)
// only the newest is decoded. The skipped ones never signal, which is fine:
// nobody is waiting on them, since a waiting capture always issued the
// newest seek.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use framecut_core::{FrameCutError, MediaHandle, Result, RgbaFrame, SeekSignal, SeekStatus};

use crate::decode::{FrameDecoder, FrameSource};

enum DecodeCmd {
    Seek { seq: u64, time: f64 },
    Shutdown,
}

pub struct FfmpegHandle {
    label:    &'static str,
    duration: f64,
    size:     (u32, u32),
    playhead: f64,
    cmd_tx:   Sender<DecodeCmd>,
    signals:  Receiver<SeekSignal>,
    /// Most recently decoded frame, written by the decode thread.
    current:  Arc<Mutex<Option<RgbaFrame>>>,
}

impl FfmpegHandle {
    /// Open `path` on a new decode thread and wait (up to `timeout`) for its
    /// metadata. `label` names the thread and tags log lines.
    pub fn open(path: &Path, label: &'static str, timeout: Duration) -> anyhow::Result<Self> {
        let thread_path = path.to_path_buf();
        Self::spawn(label, timeout, move || FrameDecoder::open(&thread_path))
            .with_context(|| format!("open {}", path.display()))
    }

    /// Run the source built by `open_source` on a new decode thread. The
    /// frame at 0 is decoded before the metadata is reported, so a fresh
    /// handle rasterizes without a seek.
    pub fn spawn<S, F>(label: &'static str, timeout: Duration, open_source: F) -> anyhow::Result<Self>
    where
        S: FrameSource + 'static,
        F: FnOnce() -> anyhow::Result<S> + Send + 'static,
    {
        let (cmd_tx, cmd_rx)       = unbounded::<DecodeCmd>();
        let (signal_tx, signals)   = unbounded::<SeekSignal>();
        let (meta_tx, meta_rx)     = bounded::<anyhow::Result<(f64, (u32, u32))>>(1);
        let current: Arc<Mutex<Option<RgbaFrame>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&current);
        thread::Builder::new()
            .name(format!("framecut-decode-{label}"))
            .spawn(move || {
                let mut source = match open_source() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = meta_tx.send(Err(e));
                        return;
                    }
                };
                match source.frame_at(0.0) {
                    Ok((frame, _)) => *slot.lock() = Some(frame),
                    Err(e) => warn!("[media] {label}: first frame failed: {e:#}"),
                }
                let _ = meta_tx.send(Ok((source.duration(), source.size())));
                decode_loop(source, label, cmd_rx, signal_tx, slot);
            })
            .context("spawn decode thread")?;

        let (duration, size) = meta_rx
            .recv_timeout(timeout)
            .map_err(|_| anyhow!("{label} handle: no metadata within {} ms", timeout.as_millis()))??;

        info!("[media] {label} handle ready: {duration:.2}s {}x{}", size.0, size.1);
        Ok(Self {
            label,
            duration,
            size,
            playhead: 0.0,
            cmd_tx,
            signals,
            current,
        })
    }
}

fn decode_loop<S: FrameSource>(
    mut source:  S,
    label:       &'static str,
    cmd_rx:      Receiver<DecodeCmd>,
    signal_tx:   Sender<SeekSignal>,
    slot:        Arc<Mutex<Option<RgbaFrame>>>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        let (mut seq, mut time) = match cmd {
            DecodeCmd::Seek { seq, time } => (seq, time),
            DecodeCmd::Shutdown => break,
        };
        // Latest wins.
        while let Ok(next) = cmd_rx.try_recv() {
            match next {
                DecodeCmd::Seek { seq: s, time: t } => {
                    debug!("[media] {label}: seek #{seq} superseded by #{s}");
                    seq  = s;
                    time = t;
                }
                DecodeCmd::Shutdown => return,
            }
        }

        let status = match source.frame_at(time) {
            Ok((frame, landed)) => {
                *slot.lock() = Some(frame);
                SeekStatus::Landed(landed)
            }
            Err(e) => {
                warn!("[media] {label}: decode at {time:.3}s failed: {e:#}");
                SeekStatus::Failed(format!("{e:#}"))
            }
        };
        if signal_tx.send(SeekSignal { seq, status }).is_err() {
            break;
        }
    }
    debug!("[media] {label} decode thread exiting");
}

impl MediaHandle for FfmpegHandle {
    fn duration(&self) -> f64 { self.duration }
    fn natural_size(&self) -> (u32, u32) { self.size }
    fn playhead(&self) -> f64 { self.playhead }

    fn request_seek(&mut self, seq: u64, time: f64) {
        self.playhead = time;
        if self.cmd_tx.send(DecodeCmd::Seek { seq, time }).is_err() {
            // The thread is gone; the waiter sees the signal channel close.
            warn!("[media] {} decode thread is not running", self.label);
        }
    }

    fn signals(&self) -> &Receiver<SeekSignal> { &self.signals }

    fn rasterize(&mut self) -> Result<RgbaFrame> {
        self.current
            .lock()
            .clone()
            .ok_or_else(|| FrameCutError::SourceNotReady("no frame decoded yet".into()))
    }
}

impl Drop for FfmpegHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(DecodeCmd::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 frames whose red channel is the frame time in tenths of a second.
    struct FakeSource;

    impl FrameSource for FakeSource {
        fn duration(&self) -> f64 { 5.0 }
        fn size(&self) -> (u32, u32) { (4, 4) }
        fn frame_at(&mut self, time: f64) -> anyhow::Result<(RgbaFrame, f64)> {
            let shade = (time * 10.0).round() as u8;
            Ok((RgbaFrame::filled(4, 4, [shade, 0, 0, 255]), time))
        }
    }

    fn fake_handle() -> FfmpegHandle {
        FfmpegHandle::spawn("test", Duration::from_secs(5), || Ok(FakeSource)).unwrap()
    }

    #[test]
    fn fresh_handle_rasterizes_without_a_seek() {
        let mut h = fake_handle();
        assert_eq!(h.duration(), 5.0);
        assert_eq!(h.natural_size(), (4, 4));
        let frame = h.rasterize().unwrap();
        assert_eq!(frame.data[0], 0);
        assert!(h.signals().is_empty());
    }

    #[test]
    fn seek_answers_with_its_seq_and_updates_the_raster() {
        let mut h = fake_handle();
        h.request_seek(7, 2.5);
        let signal = h.signals().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(signal.seq, 7);
        assert!(matches!(signal.status, SeekStatus::Landed(t) if (t - 2.5).abs() < 1e-9));
        assert_eq!(h.playhead(), 2.5);
        assert_eq!(h.rasterize().unwrap().data[0], 25);
    }

    #[test]
    fn failed_open_is_reported_to_the_caller() {
        let err = FfmpegHandle::spawn("test", Duration::from_secs(5), || {
            Err::<FakeSource, _>(anyhow!("no video stream"))
        })
        .err()
        .unwrap();
        assert!(format!("{err:#}").contains("no video stream"), "{err:#}");
    }

    #[test]
    fn open_missing_file_fails_with_context() {
        let err = FfmpegHandle::open(Path::new("/no/such/clip.mp4"), "test", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("/no/such/clip.mp4"), "{err:#}");
    }
}
