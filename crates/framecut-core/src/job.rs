// crates/framecut-core/src/job.rs
//
// Lifecycle of a long-running job (one slot per job kind per session):
//
//   Idle ──begin──▶ Running ──▶ Completed
//                      │    └──▶ Failed(msg)
//                      └───────▶ Cancelled
//
// `begin` is the only way into Running and is refused while a job of the
// same kind is already running, so two storyboards can never interleave.
// Any terminal state may begin again.
//
// `begin` hands back a RunningJob guard. Finishing it records the terminal
// state; dropping it unfinished (early return, panic unwinding) records
// Failed so the slot never stays stuck in Running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{FrameCutError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    Idle,
    Running { job_id: Uuid },
    Completed,
    Failed(String),
    Cancelled,
}

pub struct JobSlot {
    kind:   &'static str,
    state:  Mutex<JobState>,
    cancel: Arc<AtomicBool>,
}

impl JobSlot {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            state:  Mutex::new(JobState::Idle),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> JobState { self.state.lock().clone() }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), JobState::Running { .. })
    }

    /// Transition to Running. Errors with `JobAlreadyRunning` if a job of
    /// this kind is in flight.
    pub fn begin(&self) -> Result<RunningJob<'_>> {
        let mut state = self.state.lock();
        if matches!(*state, JobState::Running { .. }) {
            return Err(FrameCutError::JobAlreadyRunning(self.kind));
        }
        let job_id = Uuid::new_v4();
        self.cancel.store(false, Ordering::Relaxed);
        *state = JobState::Running { job_id };
        Ok(RunningJob { slot: self, job_id, finished: false })
    }

    /// Ask the running job (if any) to stop at its next checkpoint.
    ///
    /// Checked and stored under the state lock, so a request racing a
    /// finish can never land on the job that `begin`s next.
    pub fn request_cancel(&self) {
        let state = self.state.lock();
        if matches!(*state, JobState::Running { .. }) {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Shared cancel flag, for workers that poll it from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> { Arc::clone(&self.cancel) }
}

pub struct RunningJob<'a> {
    slot:     &'a JobSlot,
    job_id:   Uuid,
    finished: bool,
}

impl RunningJob<'_> {
    pub fn job_id(&self) -> Uuid { self.job_id }

    pub fn cancel_flag(&self) -> &AtomicBool { &self.slot.cancel }

    pub fn is_cancel_requested(&self) -> bool {
        self.slot.cancel.load(Ordering::Relaxed)
    }

    /// Record the job's outcome. Cancelled errors map to `Cancelled`, any
    /// other error to `Failed`.
    pub fn finish<T>(mut self, outcome: &Result<T>) {
        let next = match outcome {
            Ok(_) => JobState::Completed,
            Err(e) if e.is_cancelled() => JobState::Cancelled,
            Err(e) => JobState::Failed(e.to_string()),
        };
        self.set(next);
    }

    fn set(&mut self, next: JobState) {
        *self.slot.state.lock() = next;
        self.finished = true;
    }
}

impl Drop for RunningJob<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.set(JobState::Failed("job ended without reporting a result".into()));
        }
    }
}
