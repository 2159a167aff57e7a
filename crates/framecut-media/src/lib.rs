// crates/framecut-media/src/lib.rs
//
// FFmpeg-backed collaborators for framecut-core. No presentation code —
// callers drive a Session directly or through MediaWorker's channel.
//
//   probe    — SourceInfo from a file
//   decode   — FrameDecoder, native-size RGBA at a timestamp
//   handle   — FfmpegHandle, the MediaHandle over a decode thread
//   audio    — FfmpegAudioSource, the AudioSource over the audio track
//   session  — open_session (load a file into a Session)
//   worker   — MediaWorker, background storyboard / profile jobs

pub mod audio;
pub mod decode;
mod helpers;
pub mod handle;
pub mod probe;
pub mod session;
pub mod worker;

pub use audio::FfmpegAudioSource;
pub use handle::FfmpegHandle;
pub use probe::probe_source;
pub use session::{open_session, FfmpegSession};
pub use worker::MediaWorker;
pub use framecut_core::media_types::MediaResult;

/// MediaWorker over an FFmpeg-backed session.
pub type FfmpegWorker = MediaWorker<FfmpegHandle, FfmpegAudioSource>;
