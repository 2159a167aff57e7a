// crates/framecut-core/src/config.rs
//
// Engine tuning constants surfaced as configuration.
//
// Every field has a serde default so a partial JSON file (or `{}`) loads
// cleanly; only the keys the user wants to change need to be present.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FrameCutError, Result};

/// 350 MiB — above this the profiler does not decode automatically.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 350 * 1024 * 1024;
/// 60 s at 10 fps ⇒ at most 600 storyboard frames.
pub const DEFAULT_STORYBOARD_MAX_DURATION: f64 = 60.0;
pub const DEFAULT_STORYBOARD_INTERVAL: f64 = 0.1;
pub const DEFAULT_LOSSY_QUALITY: f32 = 0.9;
pub const DEFAULT_PROFILE_BUCKETS: usize = 200;
pub const DEFAULT_MIN_TRIM_WIDTH: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Raw file size (bytes) above which auto-profiling is skipped.
    pub large_file_threshold:    u64,
    /// Longest source (seconds) a storyboard may be built from.
    pub storyboard_max_duration: f64,
    /// Seconds between storyboard samples.
    pub storyboard_interval:     f64,
    /// Delay after a storyboard seek signal before pixels are read.
    /// Some decoders signal "seeked" slightly before the frame is paintable.
    pub settle_delay_ms:         u64,
    /// One render tick, yielded between seek completion and rasterization.
    pub render_tick_ms:          u64,
    /// How long a capture waits for its seek signal before giving up.
    pub seek_timeout_ms:         u64,
    /// JPEG quality factor in (0, 1].
    pub lossy_quality:           f32,
    /// Number of buckets in an amplitude profile.
    pub profile_buckets:         usize,
    /// Minimum trim range width in seconds.
    pub min_trim_width:          f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            large_file_threshold:    DEFAULT_LARGE_FILE_THRESHOLD,
            storyboard_max_duration: DEFAULT_STORYBOARD_MAX_DURATION,
            storyboard_interval:     DEFAULT_STORYBOARD_INTERVAL,
            settle_delay_ms:         50,
            render_tick_ms:          16,
            seek_timeout_ms:         10_000,
            lossy_quality:           DEFAULT_LOSSY_QUALITY,
            profile_buckets:         DEFAULT_PROFILE_BUCKETS,
            min_trim_width:          DEFAULT_MIN_TRIM_WIDTH,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: EngineConfig = serde_json::from_str(&text)
            .map_err(|e| FrameCutError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.storyboard_interval > 0.0) {
            return Err(FrameCutError::Config("storyboard_interval must be > 0".into()));
        }
        if !(self.storyboard_max_duration > 0.0) {
            return Err(FrameCutError::Config("storyboard_max_duration must be > 0".into()));
        }
        if !(self.lossy_quality > 0.0 && self.lossy_quality <= 1.0) {
            return Err(FrameCutError::Config("lossy_quality must be in (0, 1]".into()));
        }
        if self.profile_buckets == 0 {
            return Err(FrameCutError::Config("profile_buckets must be ≥ 1".into()));
        }
        if !(self.min_trim_width > 0.0) {
            return Err(FrameCutError::Config("min_trim_width must be > 0".into()));
        }
        if self.seek_timeout_ms == 0 {
            return Err(FrameCutError::Config("seek_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Upper bound on storyboard frames implied by the duration limit.
    pub fn storyboard_max_frames(&self) -> usize {
        (self.storyboard_max_duration / self.storyboard_interval).round() as usize
    }

    pub fn settle_delay(&self) -> Duration { Duration::from_millis(self.settle_delay_ms) }
    pub fn render_tick(&self)  -> Duration { Duration::from_millis(self.render_tick_ms) }
    pub fn seek_timeout(&self) -> Duration { Duration::from_millis(self.seek_timeout_ms) }

    /// Zero settle/tick delays. Used by tests and headless batch runs where
    /// the handle only signals once the frame is already decoded.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.render_tick_ms  = 0;
        self
    }
}
