// crates/framecut-core/src/media_types.rs
//
// Plain data that flows between the engine, its FFmpeg collaborators and the
// presentation layer. No ffmpeg types here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FrameCutError, Result};

// ── Raster ────────────────────────────────────────────────────────────────────

/// A decoded video frame: tightly packed RGBA, no stride padding.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaFrame {
    pub width:  u32,
    pub height: u32,
    pub data:   Vec<u8>,
}

impl RgbaFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FrameCutError::DecodeFailure(format!(
                "raster is {} bytes, expected {expected} for {width}x{height} RGBA",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Solid-colour frame. Handy for synthetic sources.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self { width, height, data }
    }

    /// Drop the alpha channel (JPEG has none).
    pub fn to_rgb(&self) -> Vec<u8> {
        self.data.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect()
    }
}

// ── Still images ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Full-fidelity PNG.
    Png,
    /// JPEG at the configured quality (0.9 by default).
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png  => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// An encoded still tagged with the timestamp it was captured at.
#[derive(Clone, Debug)]
pub struct CaptureResult {
    pub timestamp: f64,
    pub format:    ImageFormat,
    pub width:     u32,
    pub height:    u32,
    /// Encoded image file bytes.
    pub bytes:     Vec<u8>,
    /// The raster the bytes were encoded from, kept so the capture can be
    /// re-encoded in the other format without another seek.
    pub frame:     RgbaFrame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureSlot {
    FirstFrame,
    LastFrame,
    OnDemand,
}

/// The three independently nullable capture slots of a session.
#[derive(Clone, Debug, Default)]
pub struct CaptureSlots {
    pub first:     Option<CaptureResult>,
    pub last:      Option<CaptureResult>,
    pub on_demand: Option<CaptureResult>,
}

impl CaptureSlots {
    pub fn get(&self, slot: CaptureSlot) -> Option<&CaptureResult> {
        match slot {
            CaptureSlot::FirstFrame => self.first.as_ref(),
            CaptureSlot::LastFrame  => self.last.as_ref(),
            CaptureSlot::OnDemand   => self.on_demand.as_ref(),
        }
    }

    pub fn set(&mut self, slot: CaptureSlot, result: CaptureResult) {
        match slot {
            CaptureSlot::FirstFrame => self.first     = Some(result),
            CaptureSlot::LastFrame  => self.last      = Some(result),
            CaptureSlot::OnDemand   => self.on_demand = Some(result),
        }
    }
}

// ── Seek signalling ───────────────────────────────────────────────────────────

/// One-shot readiness signal emitted by a handle after a seek request.
/// `seq` echoes the sequence number of the request it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct SeekSignal {
    pub seq:    u64,
    pub status: SeekStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SeekStatus {
    /// The frame at (or nearest to) the requested time is decoded and
    /// paintable. Carries the actual presentation time.
    Landed(f64),
    Failed(String),
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Decoded planar PCM. Immutable once built; trimming produces a new buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSampleBuffer {
    sample_rate: u32,
    channels:    Vec<Vec<f32>>,
}

impl AudioSampleBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(FrameCutError::DecodeFailure("sample rate is 0".into()));
        }
        let Some(first) = channels.first() else {
            return Err(FrameCutError::DecodeFailure("audio has no channels".into()));
        };
        let len = first.len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(FrameCutError::DecodeFailure("channel lengths differ".into()));
        }
        Ok(Self { sample_rate, channels })
    }

    pub fn sample_rate(&self)   -> u32   { self.sample_rate }
    pub fn channel_count(&self) -> usize { self.channels.len() }
    pub fn frame_count(&self)   -> usize { self.channels[0].len() }

    pub fn channel(&self, idx: usize) -> &[f32] { &self.channels[idx] }

    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Copy frames `[start, end)` into a new buffer. Caller guarantees bounds.
    pub(crate) fn slice_frames(&self, start: usize, end: usize) -> Self {
        Self {
            sample_rate: self.sample_rate,
            channels:    self.channels.iter().map(|c| c[start..end].to_vec()).collect(),
        }
    }
}

/// Normalised waveform overview, one value per equal-width time bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeProfile {
    pub values: Vec<f32>,
}

impl AmplitudeProfile {
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProfileOutcome {
    #[default]
    NotRun,
    Ready(AmplitudeProfile),
    /// The file is over the large-file threshold; a forced run is required.
    Skipped { file_size: u64, threshold: u64 },
    /// Best-effort analysis failed. Never fatal to the session.
    Failed(String),
}

impl ProfileOutcome {
    pub fn profile(&self) -> Option<&AmplitudeProfile> {
        match self {
            ProfileOutcome::Ready(p) => Some(p),
            _ => None,
        }
    }
}

// ── Source ────────────────────────────────────────────────────────────────────

/// What probing a loaded file established.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub path:      PathBuf,
    pub file_size: u64,
    pub duration:  f64,
    pub width:     u32,
    pub height:    u32,
    pub has_audio: bool,
}

impl SourceInfo {
    /// File name without its extension, used for suggested download names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }
}

// ── Worker results ────────────────────────────────────────────────────────────

/// Results sent from MediaWorker background threads to the presentation layer.
pub enum MediaResult {
    StoryboardProgress { job_id: Uuid, frames_done: usize, total: usize, percent: u8 },
    StoryboardDone     { job_id: Uuid, archive: Vec<u8> },
    /// `cancelled` distinguishes a user cancel from a real failure.
    StoryboardError    { job_id: Uuid, msg: String, cancelled: bool },
    Profile            { outcome: ProfileOutcome },
}
