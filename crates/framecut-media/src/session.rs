// crates/framecut-media/src/session.rs
//
// open_session: load a file into a fresh Session backed by FFmpeg.
//
// Two handles are opened on the same file: the interactive one for preview
// and "capture what's on screen", the hidden one for auto frames and the
// storyboard. The auto amplitude profile runs once here, subject to the
// large-file policy.

use std::path::Path;

use tracing::info;

use framecut_core::{EngineConfig, FrameCutError, ProfileOutcome, Result, Session};

use crate::audio::FfmpegAudioSource;
use crate::handle::FfmpegHandle;
use crate::probe::probe_source;

pub type FfmpegSession = Session<FfmpegHandle, FfmpegAudioSource>;

/// Probe `path`, open both handles and run the auto profile.
///
/// Call `ffmpeg_the_third::init()` once before the first load.
pub fn open_session(path: &Path, config: EngineConfig) -> Result<FfmpegSession> {
    config.validate()?;
    let source = probe_source(path)?;

    let open = |label: &'static str| {
        FfmpegHandle::open(path, label, config.seek_timeout())
            .map_err(|e| FrameCutError::UnsupportedInput(format!("{e:#}")))
    };
    let interactive = open("interactive")?;
    let hidden      = open("hidden")?;
    let audio       = FfmpegAudioSource::new(path, source.file_size);

    let session = Session::new(source, interactive, hidden, audio, config);
    if session.source().has_audio {
        match session.profile(false) {
            ProfileOutcome::Ready(p) => info!("[profile] auto profile ready ({} buckets)", p.len()),
            other => info!("[profile] auto profile: {other:?}"),
        }
    } else {
        info!("[profile] no audio track — profile not run");
    }
    Ok(session)
}
