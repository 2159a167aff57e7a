// crates/framecut-core/src/session.rs
//
// Session: the explicit context object for one loaded file. Every engine
// operation goes through it; nothing is global.
//
// Layout:
//   Session
//     ├── interactive — capturer over the handle used for playback/preview
//     │                 and "capture what's on screen"
//     ├── hidden      — capturer over a second handle reserved for
//     │                 programmatic captures (auto frames, storyboard)
//     ├── audio       — AudioSource for profiling and extraction
//     ├── trim        — TrimModel, written only by drag gestures
//     ├── captures    — first / last / on-demand slots
//     ├── profile     — latest ProfileOutcome
//     └── storyboard  — JobSlot enforcing one storyboard at a time
//
// Each handle sits behind its own mutex, so a storyboard running on the
// hidden handle never blocks preview seeks on the interactive one. A new
// file means a new Session; handles are never re-pointed.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::capture::{FrameCapturer, MediaHandle};
use crate::config::EngineConfig;
use crate::error::{FrameCutError, Result};
use crate::job::{JobSlot, JobState};
use crate::media_types::{CaptureResult, CaptureSlot, CaptureSlots, ImageFormat, ProfileOutcome, SourceInfo};
use crate::profile::profile_source;
use crate::source::AudioSource;
use crate::storyboard::{check_capacity, run_storyboard, StoryboardProgress};
use crate::trim::{DragGesture, TrimModel, TrimRange};
use crate::wav::{encode_wav, trim_buffer};

/// Offset from the end used for the automatic last-frame capture. Seeking
/// to the exact duration lands past the final frame on many containers.
const LAST_FRAME_BACKOFF: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleRole {
    Interactive,
    Hidden,
}

pub struct Session<H, A> {
    source:      SourceInfo,
    config:      EngineConfig,
    interactive: Mutex<FrameCapturer<H>>,
    hidden:      Mutex<FrameCapturer<H>>,
    audio:       A,
    trim:        Mutex<TrimModel>,
    captures:    Mutex<CaptureSlots>,
    profile:     Mutex<ProfileOutcome>,
    storyboard:  JobSlot,
    /// Move the interactive playhead along with trim drags.
    follow_trim: AtomicBool,
}

impl<H: MediaHandle, A: AudioSource> Session<H, A> {
    pub fn new(source: SourceInfo, interactive: H, hidden: H, audio: A, config: EngineConfig) -> Self {
        let duration = if hidden.duration() > 0.0 { hidden.duration() } else { source.duration };
        Self {
            trim:        Mutex::new(TrimModel::new(duration, config.min_trim_width)),
            interactive: Mutex::new(FrameCapturer::new(interactive, &config)),
            hidden:      Mutex::new(FrameCapturer::new(hidden, &config)),
            captures:    Mutex::new(CaptureSlots::default()),
            profile:     Mutex::new(ProfileOutcome::NotRun),
            storyboard:  JobSlot::new("storyboard"),
            follow_trim: AtomicBool::new(false),
            source,
            audio,
            config,
        }
    }

    pub fn source(&self) -> &SourceInfo { &self.source }
    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Duration as reported by the capture handle at load (or the latest
    /// `on_metadata`), falling back to the probed value. Read from the trim
    /// model so it never waits on a busy handle.
    pub fn duration(&self) -> f64 {
        let d = self.trim.lock().duration();
        if d > 0.0 { d } else { self.source.duration }
    }

    /// Metadata arrived (or changed): reset the trim range to the full clip.
    pub fn on_metadata(&self, duration: f64) {
        self.trim.lock().reset(duration);
    }

    // ── Profiling ─────────────────────────────────────────────────────────────

    /// Run the amplitude profiler. `force` bypasses the large-file policy.
    /// Never fails: decode problems land in `ProfileOutcome::Failed`.
    pub fn profile(&self, force: bool) -> ProfileOutcome {
        let outcome = profile_source(&self.audio, &self.config, force);
        *self.profile.lock() = outcome.clone();
        outcome
    }

    pub fn profile_outcome(&self) -> ProfileOutcome { self.profile.lock().clone() }

    // ── Stills ────────────────────────────────────────────────────────────────

    fn capturer(&self, role: HandleRole) -> &Mutex<FrameCapturer<H>> {
        match role {
            HandleRole::Interactive => &self.interactive,
            HandleRole::Hidden      => &self.hidden,
        }
    }

    /// Seek `role`'s handle to `time` and capture it.
    pub fn capture_at(&self, role: HandleRole, time: f64, format: ImageFormat) -> Result<CaptureResult> {
        self.capturer(role).lock().capture_at(time, format)
    }

    /// Capture what the interactive handle currently shows into the
    /// on-demand slot.
    pub fn capture_current(&self, format: ImageFormat) -> Result<CaptureResult> {
        let result = self.interactive.lock().capture_current(format)?;
        self.captures.lock().set(CaptureSlot::OnDemand, result.clone());
        Ok(result)
    }

    /// Move the interactive playhead and wait until it has landed.
    pub fn seek_interactive(&self, time: f64) -> Result<f64> {
        self.interactive.lock().seek(time)
    }

    /// Fill the first- and last-frame slots from the hidden handle.
    /// The last frame is taken 0.1 s before the end.
    pub fn capture_auto_frames(&self) -> Result<()> {
        let duration = self.duration();
        let last_at = if duration > LAST_FRAME_BACKOFF { duration - LAST_FRAME_BACKOFF } else { duration };

        let (first, last) = {
            let mut cap = self.hidden.lock();
            let first = cap.capture_at(0.0, ImageFormat::Png)?;
            let last  = cap.capture_at(last_at, ImageFormat::Png)?;
            (first, last)
        };
        info!("[capture] auto frames at 0.0s and {last_at:.1}s");

        let mut slots = self.captures.lock();
        slots.set(CaptureSlot::FirstFrame, first);
        slots.set(CaptureSlot::LastFrame, last);
        Ok(())
    }

    pub fn capture_slot(&self, slot: CaptureSlot) -> Option<CaptureResult> {
        self.captures.lock().get(slot).cloned()
    }

    /// Re-encode the on-demand capture, e.g. as a JPEG download.
    pub fn export_on_demand(&self, format: ImageFormat) -> Result<CaptureResult> {
        let current = self
            .capture_slot(CaptureSlot::OnDemand)
            .ok_or_else(|| FrameCutError::SourceNotReady("nothing has been captured yet".into()))?;
        if current.format == format {
            return Ok(current);
        }
        self.interactive.lock().reencode(&current, format)
    }

    // ── Trim ──────────────────────────────────────────────────────────────────

    pub fn trim_range(&self) -> TrimRange { self.trim.lock().range() }

    pub fn set_follow_trim(&self, follow: bool) {
        self.follow_trim.store(follow, Ordering::Relaxed);
    }

    pub fn begin_trim(&self, gesture: DragGesture, pointer: f64) {
        self.trim.lock().begin(gesture, pointer);
    }

    /// Apply the active drag for a pointer at `pointer` seconds.
    pub fn update_trim(&self, pointer: f64) -> TrimRange {
        let (range, gesture) = {
            let mut trim = self.trim.lock();
            (trim.update(pointer), trim.active_gesture())
        };
        if let Some(g) = gesture {
            self.follow(g, range);
        }
        range
    }

    pub fn end_trim(&self) {
        self.trim.lock().end();
    }

    /// Begin, update and end in one call.
    pub fn apply_trim(&self, gesture: DragGesture, pointer: f64) -> TrimRange {
        let range = self.trim.lock().apply(gesture, pointer);
        self.follow(gesture, range);
        range
    }

    fn follow(&self, gesture: DragGesture, range: TrimRange) {
        if !self.follow_trim.load(Ordering::Relaxed) {
            return;
        }
        let at = match gesture {
            DragGesture::End => range.end,
            DragGesture::Start | DragGesture::Range => range.start,
        };
        // Preview is best-effort; skip if a capture holds the handle.
        if let Some(mut cap) = self.interactive.try_lock() {
            cap.scrub(at);
        }
    }

    // ── Audio ─────────────────────────────────────────────────────────────────

    /// Decode the audio track and encode it (or `trim` of it) as WAV bytes.
    pub fn extract_audio(&self, trim: Option<TrimRange>) -> Result<Vec<u8>> {
        if let Some(r) = trim {
            if r.end <= r.start {
                return Err(FrameCutError::InvalidRange(
                    "range end must be greater than its start".into(),
                ));
            }
        }

        let decoded = self.audio.decode()?;
        let buffer = match trim {
            Some(r) => trim_buffer(&decoded, r.start, r.end)?,
            None    => decoded,
        };
        let wav = encode_wav(&buffer, buffer.frame_count())?;
        info!(
            "[audio] WAV {} bytes ({} frames, {} ch @ {} Hz)",
            wav.len(), buffer.frame_count(), buffer.channel_count(), buffer.sample_rate()
        );
        Ok(wav)
    }

    /// `extract_audio` over the current trim range.
    pub fn extract_trimmed_audio(&self) -> Result<Vec<u8>> {
        self.extract_audio(Some(self.trim_range()))
    }

    // ── Storyboard ────────────────────────────────────────────────────────────

    /// Build a storyboard archive from the hidden handle.
    ///
    /// Over-long sources fail before the job starts; a second call while one
    /// is running fails with `JobAlreadyRunning`.
    pub fn run_storyboard(
        &self,
        format:      ImageFormat,
        on_progress: impl FnMut(StoryboardProgress),
    ) -> Result<Vec<u8>> {
        let duration = self.duration();
        check_capacity(duration, &self.config)?;

        let job = self.storyboard.begin()?;
        info!("[storyboard] job {} started", job.job_id());
        let result = {
            let mut cap = self.hidden.lock();
            run_storyboard(&mut *cap, duration, format, &self.config, job.cancel_flag(), on_progress)
        };
        if let Err(e) = &result {
            if !e.is_cancelled() {
                warn!("[storyboard] job {} failed: {e}", job.job_id());
            }
        }
        job.finish(&result);
        result
    }

    pub fn cancel_storyboard(&self) { self.storyboard.request_cancel(); }

    pub fn storyboard_state(&self) -> JobState { self.storyboard.state() }
}
