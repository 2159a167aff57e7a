// crates/framecut-core/src/wav.rs
//
// PCM container encoder: planar f32 → 16-bit little-endian WAV bytes.
//
// WAV layout (44-byte header):
//   RIFF  <36 + data_size>  WAVE
//   fmt   16  <format=1 PCM>  <channels>  <rate>
//             <byte_rate = rate·channels·2>  <block_align = channels·2>  <bits=16>
//   data  <data_size>  <interleaved i16 samples…>
//
// Pure and deterministic: the same buffer always yields the same bytes.

use crate::error::{FrameCutError, Result};
use crate::media_types::AudioSampleBuffer;

const HEADER_LEN:  usize = 44;
const FORMAT_PCM:  u16   = 1;
const BITS:        u16   = 16;
const BYTES_PER_SAMPLE: usize = (BITS / 8) as usize;

/// Convert one float sample to i16.
///
/// Asymmetric scaling so both -1.0 and 1.0 hit the rails exactly:
/// non-negative values scale by 32767, negative by 32768. The result is
/// clamped to the i16 range and truncated toward zero. NaN becomes 0.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s >= 0.0 { s * 32767.0 } else { s * 32768.0 };
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode the first `frame_count` frames of `buffer` as a WAV file.
///
/// `frame_count` of zero, or more frames than the buffer holds, is an
/// `InvalidRange` error raised before any bytes are produced.
pub fn encode_wav(buffer: &AudioSampleBuffer, frame_count: usize) -> Result<Vec<u8>> {
    if frame_count == 0 {
        return Err(FrameCutError::InvalidRange("audio length is zero frames".into()));
    }
    if frame_count > buffer.frame_count() {
        return Err(FrameCutError::InvalidRange(format!(
            "{frame_count} frames requested from a {}-frame buffer",
            buffer.frame_count()
        )));
    }

    let channels = buffer.channel_count();
    let data_len = frame_count
        .checked_mul(channels * BYTES_PER_SAMPLE)
        .filter(|n| *n <= (u32::MAX as usize) - 36)
        .ok_or_else(|| FrameCutError::EncodingFailure(
            "audio data exceeds the 4 GiB WAV size limit".into(),
        ))?;

    let channels_u16 = u16::try_from(channels)
        .map_err(|_| FrameCutError::EncodingFailure(format!("{channels} channels")))?;
    let rate        = buffer.sample_rate();
    let block_align = channels_u16 * BITS / 8;
    let byte_rate   = rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| FrameCutError::EncodingFailure("byte rate overflows".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt  chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels_u16.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    let planes: Vec<&[f32]> = (0..channels).map(|c| buffer.channel(c)).collect();
    for frame in 0..frame_count {
        for plane in &planes {
            out.extend_from_slice(&quantize(plane[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(out.len(), HEADER_LEN + data_len);
    Ok(out)
}

/// Copy the `[start, end)` second range of `buffer` into a new buffer.
///
/// Sample indices are floor(seconds · rate), clamped to the buffer. An end
/// at or before the start, or a range that contains no frames, is an
/// `InvalidRange` error.
pub fn trim_buffer(buffer: &AudioSampleBuffer, start: f64, end: f64) -> Result<AudioSampleBuffer> {
    if !(end > start) {
        return Err(FrameCutError::InvalidRange(format!(
            "range end ({end:.3}s) must be greater than start ({start:.3}s)"
        )));
    }
    let rate = buffer.sample_rate() as f64;
    let first = ((start * rate).floor().max(0.0) as usize).min(buffer.frame_count());
    let last  = ((end * rate).floor().max(0.0) as usize).min(buffer.frame_count());
    if last <= first {
        return Err(FrameCutError::InvalidRange(format!(
            "{start:.3}s–{end:.3}s contains no audio frames"
        )));
    }
    Ok(buffer.slice_frames(first, last))
}
