// crates/framecut-core/src/capture.rs
//
// Seek-snapshot primitive: "move the playhead to T, wait until the frame at T
// is paintable, then rasterize it". Everything that produces a still is built
// on FrameCapturer.
//
// Handles have no synchronous "decode frame at T" call. A seek is a request
// (`request_seek(seq, t)`) answered later by a SeekSignal on the handle's
// signal channel. Each request carries a per-capturer monotonic sequence
// number, and a waiter only resolves on the signal echoing its own number —
// a late signal from an earlier (timed-out or scrubbed) seek is drained and
// dropped, never mistaken for the current one. The waiter stops reading the
// channel as soon as its own signal arrives.
//
// Single-flight: every seeking method takes `&mut self`, so two captures on
// the same capturer cannot overlap. Sharing across threads goes through the
// session's per-handle mutex.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{FrameCutError, Result};
use crate::image_codec::encode_frame;
use crate::media_types::{CaptureResult, ImageFormat, RgbaFrame, SeekSignal, SeekStatus};

/// A decodable video resource with a movable playhead.
pub trait MediaHandle: Send {
    /// Seconds; 0.0 until metadata is known.
    fn duration(&self) -> f64;

    /// Natural (source) dimensions; (0, 0) until known.
    fn natural_size(&self) -> (u32, u32);

    /// Current playhead in seconds.
    fn playhead(&self) -> f64;

    /// Move the playhead to `time`. Returns immediately; completion is
    /// reported later as a `SeekSignal { seq, .. }` on `signals()`.
    fn request_seek(&mut self, seq: u64, time: f64);

    fn signals(&self) -> &Receiver<SeekSignal>;

    /// The currently decoded frame, at natural size.
    fn rasterize(&mut self) -> Result<RgbaFrame>;
}

pub struct FrameCapturer<H> {
    handle:        H,
    next_seq:      u64,
    render_tick:   Duration,
    seek_timeout:  Duration,
    lossy_quality: f32,
}

impl<H: MediaHandle> FrameCapturer<H> {
    pub fn new(handle: H, config: &EngineConfig) -> Self {
        Self {
            handle,
            next_seq:      0,
            render_tick:   config.render_tick(),
            seek_timeout:  config.seek_timeout(),
            lossy_quality: config.lossy_quality,
        }
    }

    pub fn handle(&self) -> &H { &self.handle }

    pub fn duration(&self) -> f64 { self.handle.duration() }

    /// Capture at `time`, or the current frame when `time` is `None`.
    pub fn capture(&mut self, time: Option<f64>, format: ImageFormat) -> Result<CaptureResult> {
        match time {
            Some(t) => self.capture_at(t, format),
            None    => self.capture_current(format),
        }
    }

    /// Seek to `time`, wait for this seek's signal, yield a render tick,
    /// then rasterize and encode.
    pub fn capture_at(&mut self, time: f64, format: ImageFormat) -> Result<CaptureResult> {
        self.capture_settled(time, format, Duration::ZERO)
    }

    /// Rasterize whatever the handle currently shows. No seek.
    pub fn capture_current(&mut self, format: ImageFormat) -> Result<CaptureResult> {
        let at = self.handle.playhead();
        self.snapshot(at, format)
    }

    /// `capture_at` with an extra settle delay between the seek signal and
    /// the pixel read. Used by the storyboard loop.
    pub fn capture_settled(
        &mut self,
        time:   f64,
        format: ImageFormat,
        settle: Duration,
    ) -> Result<CaptureResult> {
        self.seek(time)?;
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        self.render_yield();
        self.snapshot(time, format)
    }

    /// Seek and wait for completion without rasterizing. Returns the time
    /// the decoder actually landed on.
    pub fn seek(&mut self, time: f64) -> Result<f64> {
        let target = self.clamp_time(time)?;
        let seq = self.issue_seek(target);
        self.await_seek(seq, target)
    }

    /// Fire-and-forget seek (e.g. the preview following a trim drag). The
    /// eventual signal is discarded as stale by the next waiter.
    pub fn scrub(&mut self, time: f64) {
        if let Ok(target) = self.clamp_time(time) {
            self.issue_seek(target);
        }
    }

    fn issue_seek(&mut self, target: f64) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        debug!("[capture] seek #{seq} → {target:.3}s");
        self.handle.request_seek(seq, target);
        seq
    }

    fn await_seek(&mut self, seq: u64, target: f64) -> Result<f64> {
        let deadline = Instant::now() + self.seek_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.handle.signals().recv_timeout(remaining) {
                Ok(signal) if signal.seq == seq => {
                    return match signal.status {
                        SeekStatus::Landed(t)   => Ok(t),
                        SeekStatus::Failed(why) => Err(FrameCutError::DecodeFailure(format!(
                            "seek to {target:.3}s failed: {why}"
                        ))),
                    };
                }
                Ok(stale) => {
                    debug!("[capture] dropping stale seek signal #{} (waiting on #{seq})", stale.seq);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(FrameCutError::DecodeFailure(format!(
                        "seek to {target:.3}s timed out after {} ms",
                        self.seek_timeout.as_millis()
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(FrameCutError::SourceNotReady("media handle closed".into()));
                }
            }
        }
    }

    fn snapshot(&mut self, timestamp: f64, format: ImageFormat) -> Result<CaptureResult> {
        let (w, h) = self.handle.natural_size();
        if w == 0 || h == 0 {
            return Err(FrameCutError::SourceNotReady("video dimensions are not known yet".into()));
        }
        let frame = self.handle.rasterize()?;
        let bytes = encode_frame(&frame, format, self.lossy_quality)?;
        Ok(CaptureResult {
            timestamp,
            format,
            width:  frame.width,
            height: frame.height,
            bytes,
            frame,
        })
    }

    /// Re-encode an existing capture in another format, e.g. the on-demand
    /// PNG as a JPEG download.
    pub fn reencode(&self, capture: &CaptureResult, format: ImageFormat) -> Result<CaptureResult> {
        let bytes = encode_frame(&capture.frame, format, self.lossy_quality)?;
        Ok(CaptureResult { format, bytes, ..capture.clone() })
    }

    fn render_yield(&self) {
        if self.render_tick.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.render_tick);
        }
    }

    fn clamp_time(&self, time: f64) -> Result<f64> {
        if !time.is_finite() {
            return Err(FrameCutError::InvalidRange(format!("cannot seek to {time}")));
        }
        let duration = self.handle.duration();
        Ok(if duration > 0.0 { time.clamp(0.0, duration) } else { time.max(0.0) })
    }
}
