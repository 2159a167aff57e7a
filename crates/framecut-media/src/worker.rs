// crates/framecut-media/src/worker.rs
//
// MediaWorker: runs long session jobs (storyboard, forced profile) on
// background threads and reports over a bounded result channel, so the
// presentation layer never blocks on a decode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use framecut_core::{AudioSource, ImageFormat, MediaHandle, MediaResult, Session};

/// Result channel depth for `MediaWorker::new`.
pub const RESULT_CAPACITY: usize = 512;

pub struct MediaWorker<H, A> {
    /// Shared result channel: storyboard progress/done/error and profiles.
    pub rx:   Receiver<MediaResult>,
    tx:       Sender<MediaResult>,
    session:  Arc<Session<H, A>>,
    shutdown: Arc<AtomicBool>,
    /// Per-job cancel flags, keyed by job id so cancellation is targeted.
    /// Registered before the job thread is spawned and removed when it ends.
    cancels:  Arc<Mutex<HashMap<Uuid, Arc<AtomicBool>>>>,
}

impl<H, A> MediaWorker<H, A>
where
    H: MediaHandle + 'static,
    A: AudioSource + 'static,
{
    pub fn new(session: Arc<Session<H, A>>) -> Self {
        Self::with_capacity(session, RESULT_CAPACITY)
    }

    /// Progress events are dropped while the channel is full; terminal
    /// events (done, error, profile) always wait for room.
    pub fn with_capacity(session: Arc<Session<H, A>>, capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            rx, tx, session,
            shutdown: Arc::new(AtomicBool::new(false)),
            cancels:  Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn session(&self) -> &Arc<Session<H, A>> { &self.session }

    /// Start a storyboard on a background thread and return its job id.
    ///
    /// Every event for the job carries this id. A job that cannot start (a
    /// storyboard is already running, or the source is too long) reports
    /// `StoryboardError` straight away.
    pub fn start_storyboard(&self, format: ImageFormat) -> Uuid {
        let job_id  = Uuid::new_v4();
        let cancel  = Arc::new(AtomicBool::new(false));
        let tx      = self.tx.clone();
        let sd      = Arc::clone(&self.shutdown);
        let session = Arc::clone(&self.session);

        // Register before spawning so an immediate cancel is not lost.
        self.cancels.lock().insert(job_id, Arc::clone(&cancel));

        let cancels_ref = Arc::clone(&self.cancels);
        thread::spawn(move || {
            if sd.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed) {
                let _ = tx.send(MediaResult::StoryboardError {
                    job_id,
                    msg: "cancelled".into(),
                    cancelled: true,
                });
                cancels_ref.lock().remove(&job_id);
                return;
            }

            let result = session.run_storyboard(format, |p| {
                // Never stall the capture loop on a slow consumer.
                let _ = tx.try_send(MediaResult::StoryboardProgress {
                    job_id,
                    frames_done: p.frames_done,
                    total:       p.total,
                    percent:     p.percent,
                });
                // Picked up by the pipeline before the next frame.
                if cancel.load(Ordering::Relaxed) || sd.load(Ordering::Relaxed) {
                    session.cancel_storyboard();
                }
            });

            let event = match result {
                Ok(archive) => {
                    info!("[storyboard] job {job_id} done ({} bytes)", archive.len());
                    MediaResult::StoryboardDone { job_id, archive }
                }
                Err(e) => {
                    let cancelled = e.is_cancelled();
                    if !cancelled {
                        warn!("[storyboard] job {job_id}: {e}");
                    }
                    MediaResult::StoryboardError { job_id, msg: e.to_string(), cancelled }
                }
            };
            let _ = tx.send(event);
            cancels_ref.lock().remove(&job_id);
        });

        job_id
    }

    /// Ask the storyboard `job_id` to stop. It finishes its current frame,
    /// then reports `StoryboardError { cancelled: true }`.
    pub fn cancel_storyboard(&self, job_id: Uuid) {
        if let Some(flag) = self.cancels.lock().get(&job_id) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Recompute the amplitude profile in the background. `force` bypasses
    /// the large-file policy (the user explicitly asked for it).
    pub fn profile(&self, force: bool) {
        let tx      = self.tx.clone();
        let session = Arc::clone(&self.session);
        thread::spawn(move || {
            let outcome = session.profile(force);
            let _ = tx.send(MediaResult::Profile { outcome });
        });
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for flag in self.cancels.lock().values() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}
