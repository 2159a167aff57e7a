// crates/framecut-core/src/storyboard.rs
//
// Batch storyboard pipeline: sample the source every `interval` seconds,
// encode each frame as a still, and pack them into one ZIP.
//
// Design:
//   • Guard first. A source longer than `storyboard_max_duration` fails with
//     CapacityExceeded before anything is allocated or any seek is issued.
//   • Sample times are `i · interval` while `< duration`, computed from the
//     index so float error never accumulates into an extra frame.
//   • Each frame: seek → wait for this seek's signal → settle delay → render
//     tick → rasterize → encode → append to the in-memory archive.
//   • Progress after each frame is min(99, round(done / total · 100)); it only
//     reaches 100 once the archive bytes exist.
//   • Any capture/encode failure, or the cancel flag, aborts the job and drops
//     every captured frame. No truncated archive is ever returned.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::archive::ArchiveBuilder;
use crate::capture::{FrameCapturer, MediaHandle};
use crate::config::EngineConfig;
use crate::error::{FrameCutError, Result, CANCELLED};
use crate::helpers::names::{storyboard_entry_name, STORYBOARD_FOLDER};
use crate::helpers::time::format_time;
use crate::media_types::ImageFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoryboardProgress {
    pub frames_done: usize,
    pub total:       usize,
    /// 0–99 while capturing, 100 once the archive is finalised.
    pub percent:     u8,
}

/// Sample timestamps for a source of `duration` seconds.
pub fn frame_times(duration: f64, interval: f64) -> Vec<f64> {
    if !(interval > 0.0) || !duration.is_finite() {
        return Vec::new();
    }
    (0u64..)
        .map(|i| i as f64 * interval)
        .take_while(|t| *t < duration)
        .collect()
}

/// In-loop progress. Capped at 99 until the archive is written.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (done as f64 / total as f64 * 100.0).round();
    pct.min(99.0) as u8
}

/// Fail fast when `duration` is over the configured storyboard limit.
pub fn check_capacity(duration: f64, config: &EngineConfig) -> Result<()> {
    if duration > config.storyboard_max_duration {
        let fps = (1.0 / config.storyboard_interval).round() as u32;
        return Err(FrameCutError::CapacityExceeded(format!(
            "video is too long for a storyboard ({}); the limit at {fps} fps is {} (up to {} frames)",
            format_time(duration),
            format_time(config.storyboard_max_duration),
            config.storyboard_max_frames(),
        )));
    }
    Ok(())
}

/// Build a storyboard archive from `capturer`'s handle.
///
/// Blocking — run on a dedicated thread. `cancel` is polled between frames.
pub fn run_storyboard<H: MediaHandle>(
    capturer:    &mut FrameCapturer<H>,
    duration:    f64,
    format:      ImageFormat,
    config:      &EngineConfig,
    cancel:      &AtomicBool,
    mut on_progress: impl FnMut(StoryboardProgress),
) -> Result<Vec<u8>> {
    check_capacity(duration, config)?;
    if !(duration > 0.0) {
        return Err(FrameCutError::SourceNotReady("duration is not known yet".into()));
    }

    let times  = frame_times(duration, config.storyboard_interval);
    let total  = times.len();
    let settle = config.settle_delay();
    info!("[storyboard] {total} frames @ {}s interval, {:?}", config.storyboard_interval, format);

    let mut archive = ArchiveBuilder::new(STORYBOARD_FOLDER);

    for (index, &t) in times.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!("[storyboard] cancelled after {index}/{total} frames — discarding");
            return Err(FrameCutError::PipelineAborted(CANCELLED.into()));
        }

        let capture = capturer
            .capture_settled(t, format, settle)
            .map_err(|e| abort(index, t, e))?;
        archive.push(storyboard_entry_name(index, t, format), capture.bytes);

        let done = index + 1;
        on_progress(StoryboardProgress { frames_done: done, total, percent: progress_percent(done, total) });
    }

    if cancel.load(Ordering::Relaxed) {
        info!("[storyboard] cancelled before packing — discarding");
        return Err(FrameCutError::PipelineAborted(CANCELLED.into()));
    }

    let entries = archive.len();
    let bytes = archive.finish().map_err(|e| {
        warn!("[storyboard] archive failed: {e}");
        FrameCutError::PipelineAborted(format!("could not pack storyboard: {e}"))
    })?;
    on_progress(StoryboardProgress { frames_done: total, total, percent: 100 });
    info!("[storyboard] archive ready: {entries} frames, {} bytes", bytes.len());
    Ok(bytes)
}

fn abort(index: usize, t: f64, e: FrameCutError) -> FrameCutError {
    warn!("[storyboard] frame {index} at {t:.1}s failed: {e} — discarding job");
    FrameCutError::PipelineAborted(format!("storyboard failed at frame {index} ({}): {e}", format_time(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_seconds_is_twenty_frames() {
        let t = frame_times(2.0, 0.1);
        assert_eq!(t.len(), 20);
        assert_eq!(t[0], 0.0);
        assert!((t[19] - 1.9).abs() < 1e-9);
    }

    #[test]
    fn partial_interval_gets_a_frame() {
        assert_eq!(frame_times(2.05, 0.1).len(), 21);
        assert_eq!(frame_times(0.05, 0.1).len(), 1);
        assert!(frame_times(0.0, 0.1).is_empty());
        assert!(frame_times(5.0, 0.0).is_empty());
    }

    #[test]
    fn sixty_seconds_is_six_hundred_frames() {
        assert_eq!(frame_times(60.0, 0.1).len(), 600);
    }

    #[test]
    fn progress_caps_at_99() {
        assert_eq!(progress_percent(0, 20), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(20, 20), 99);
        assert_eq!(progress_percent(1, 0), 0);
    }

    #[test]
    fn capacity_message_names_limits() {
        let err = check_capacity(61.0, &EngineConfig::default()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, FrameCutError::CapacityExceeded(_)));
        assert!(msg.contains("1:01.0"), "{msg}");
        assert!(msg.contains("1:00.0"), "{msg}");
        assert!(msg.contains("600 frames"), "{msg}");
        assert!(check_capacity(60.0, &EngineConfig::default()).is_ok());
    }
}
