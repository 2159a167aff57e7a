// crates/framecut-media/src/helpers/seek.rs
//
// Container-level seek used by every decoder in this crate.
//
// Always a backward seek (`..=seek_ts`): the demuxer lands on the keyframe at
// or before the target and the caller decodes forward, dropping pre-roll
// frames by PTS. A forward seek would land on the next keyframe, which can be
// seconds past the requested time.
//
// A target of 0 is skipped. A freshly opened context is already there, and
// some demuxers reject a seek with max_ts = 0.

use ffmpeg_the_third as ffmpeg;
use tracing::warn;

/// Convert seconds to AV_TIME_BASE units (microseconds).
pub fn secs_to_av_ts(secs: f64) -> i64 {
    (secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64
}

/// Seconds → stream PTS for a stream time base of `num / den`.
pub fn secs_to_pts(secs: f64, num: i32, den: i32) -> i64 {
    if num == 0 {
        return 0;
    }
    (secs * den as f64 / num as f64) as i64
}

/// Stream PTS → seconds for a stream time base of `num / den`.
pub fn pts_to_secs(pts: i64, num: i32, den: i32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    pts as f64 * num as f64 / den as f64
}

/// Seek `ictx` to `target_secs`.
///
/// Returns `false` on failure after logging it; the caller decodes from the
/// current position and its PTS filter still finds the right frame, only
/// slower.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 {
        return true;
    }

    let seek_ts = secs_to_av_ts(target_secs);
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            warn!("[seek] soft-fail in {label} at {target_secs:.3}s: {e} — decoding from current position");
            false
        }
    }
}
