// crates/framecut-core/src/lib.rs
//
// Timeline capture & audio extraction engine. No ffmpeg dependency — decode
// and rasterize are reached through the MediaHandle and AudioSource traits,
// which framecut-media implements.
//
// Leaf-first:
//   profile     — audio → normalised amplitude profile
//   wav         — planar f32 → 16-bit PCM WAV bytes
//   capture     — seek-snapshot primitive over a MediaHandle
//   trim        — trim range + drag gestures
//   storyboard  — batch seek/capture/encode/pack pipeline
//   session     — context object tying the above to one loaded file

pub mod archive;
pub mod capture;
pub mod config;
pub mod error;
pub mod helpers;
pub mod image_codec;
pub mod job;
pub mod media_types;
pub mod profile;
pub mod session;
pub mod source;
pub mod storyboard;
pub mod trim;
pub mod wav;

pub use capture::{FrameCapturer, MediaHandle};
pub use config::EngineConfig;
pub use error::{FrameCutError, Result};
pub use media_types::{
    AmplitudeProfile, AudioSampleBuffer, CaptureResult, CaptureSlot, ImageFormat, MediaResult,
    ProfileOutcome, RgbaFrame, SeekSignal, SeekStatus, SourceInfo,
};
pub use session::{HandleRole, Session};
pub use source::AudioSource;
pub use storyboard::StoryboardProgress;
pub use trim::{DragGesture, TrimRange};
