// crates/framecut-media/src/probe.rs
//
// In-process FFmpeg probing: duration, natural video size, audio presence.

use std::path::Path;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;
use tracing::info;

use framecut_core::{FrameCutError, Result, SourceInfo};

/// Probe `path`. Anything FFmpeg cannot open, or a file without a video
/// stream, is `UnsupportedInput`.
pub fn probe_source(path: &Path) -> Result<SourceInfo> {
    let file_size = std::fs::metadata(path)?.len();

    let ctx = input(path)
        .map_err(|e| FrameCutError::UnsupportedInput(format!("{}: {e}", path.display())))?;

    let video = ctx.streams().best(Type::Video).ok_or_else(|| {
        FrameCutError::UnsupportedInput(format!("{}: no video stream", path.display()))
    })?;
    let has_audio = ctx.streams().best(Type::Audio).is_some();

    let (width, height) = {
        let dec = ffmpeg::codec::context::Context::from_parameters(video.parameters())
            .and_then(|c| c.decoder().video())
            .map_err(|e| FrameCutError::UnsupportedInput(format!("video decoder: {e}")))?;
        (dec.width(), dec.height())
    };

    let container = ctx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    let duration = if container > 0.0 {
        container
    } else {
        // Fall back to the stream's own duration.
        let tb = video.time_base();
        let d  = video.duration() as f64 * tb.numerator() as f64 / tb.denominator().max(1) as f64;
        d.max(0.0)
    };

    info!(
        "[media] probed {}: {duration:.2}s {width}x{height}{} ({file_size} bytes)",
        path.display(),
        if has_audio { " +audio" } else { "" },
    );

    Ok(SourceInfo {
        path: path.to_path_buf(),
        file_size,
        duration,
        width,
        height,
        has_audio,
    })
}
