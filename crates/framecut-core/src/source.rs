// crates/framecut-core/src/source.rs
//
// Audio-side collaborator seam. The engine never decodes compressed audio
// itself; it asks an AudioSource, which framecut-media implements on top of
// FFmpeg and tests implement with synthetic buffers.

use crate::error::Result;
use crate::media_types::AudioSampleBuffer;

pub trait AudioSource: Send + Sync {
    /// Size of the raw file in bytes. Checked against the large-file
    /// threshold before any decode is attempted.
    fn byte_len(&self) -> u64;

    /// Decode the whole audio track at its native rate and channel count.
    /// Blocking; may take seconds on long files.
    fn decode(&self) -> Result<AudioSampleBuffer>;
}
