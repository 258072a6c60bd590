use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};

use flume::Receiver;

use fg_core::clock::{CancelToken, FrameSchedule};
use fg_core::config::BusyPolicy;
use fg_core::error::CoreError;
use fg_core::traits::FrameSink;

use crate::player::{PlaybackOutcome, play_tracked};

/// Une lecture en cours : frames, cadence, position courante, signal d'arrêt.
///
/// Owned by the worker thread and by every handle; the controller only keeps
/// a weak reference, so the frames are freed once playback has ended and the
/// handles are gone.
#[derive(Debug)]
pub struct PlaybackSession {
    id: u64,
    frames: Arc<[String]>,
    frame_rate: f64,
    position: AtomicUsize,
    finished: AtomicBool,
    cancel: CancelToken,
}

impl PlaybackSession {
    /// Identifiant unique dans le contrôleur.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frames written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// `true` once the worker has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Request a stop at the next frame boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Poignée sur une lecture démarrée par un [`PlaybackController`].
#[derive(Clone)]
pub struct PlaybackHandle {
    session: Arc<PlaybackSession>,
    done: Receiver<PlaybackOutcome>,
}

impl PlaybackHandle {
    /// Identifiant de session.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.session.id
    }

    /// Request a stop; observed within one frame period.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    /// Frames written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.session.position()
    }

    /// `true` once playback has reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Block until playback ends and take its outcome.
    ///
    /// Only one caller receives the outcome; clones waiting on the same
    /// session afterwards get `None`.
    #[must_use]
    pub fn wait(&self) -> Option<PlaybackOutcome> {
        self.done.recv().ok()
    }
}

struct ActiveSlot {
    id: u64,
    session: Weak<PlaybackSession>,
    worker: JoinHandle<()>,
}

impl ActiveSlot {
    /// Session still playing, if any.
    fn running(&self) -> Option<Arc<PlaybackSession>> {
        self.session.upgrade().filter(|s| !s.is_finished())
    }

    fn stop(self) {
        if let Some(session) = self.running() {
            session.cancel();
        }
        let _ = self.worker.join();
    }
}

/// Sérialise les démarrages de lecture : au plus une session active.
///
/// A start request while a session is running is either refused with
/// `PlaybackBusy` or preempts it (cancel, join, then start), according to
/// the [`BusyPolicy`].
pub struct PlaybackController {
    policy: BusyPolicy,
    active: Mutex<Option<ActiveSlot>>,
    /// Tenu pendant tout `start`, y compris l'attente d'une préemption.
    start_lock: Mutex<()>,
    next_id: AtomicU64,
}

impl PlaybackController {
    /// Controller applying `policy` to concurrent starts.
    #[must_use]
    pub fn new(policy: BusyPolicy) -> Self {
        Self {
            policy,
            active: Mutex::new(None),
            start_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start playing `frames` into `sink` on a dedicated thread.
    ///
    /// # Errors
    /// `InvalidConfig` for a non-positive frame rate, `PlaybackBusy` if a
    /// session is running under the `Reject` policy, `StreamWriteFailed` if
    /// the worker thread cannot be spawned.
    pub fn start(
        &self,
        frames: impl Into<Arc<[String]>>,
        frame_rate: f64,
        mut sink: Box<dyn FrameSink>,
    ) -> Result<PlaybackHandle, CoreError> {
        FrameSchedule::start(frame_rate)?;
        let _serial = self.start_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = {
            let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let running = slot.as_ref().filter(|s| s.running().is_some()).map(|s| s.id);
            if let Some(id) = running
                && self.policy == BusyPolicy::Reject
            {
                log::warn!("Lecture {id} déjà active, refus");
                return Err(CoreError::PlaybackBusy);
            }
            slot.take()
        };
        if let Some(prev) = previous {
            if prev.running().is_some() {
                log::info!("Préemption de la lecture {}", prev.id);
            }
            prev.stop();
        }

        let session = Arc::new(PlaybackSession {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            frames: frames.into(),
            frame_rate,
            position: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            cancel: CancelToken::new(),
        });
        let (tx, rx) = flume::bounded(1);

        let worker_session = Arc::clone(&session);
        let worker = thread::Builder::new()
            .name(format!("fg-player-{}", session.id))
            .spawn(move || {
                let s = &worker_session;
                let outcome = play_tracked(
                    &s.frames[..],
                    s.frame_rate,
                    &s.cancel,
                    &mut sink,
                    &s.position,
                );
                s.finished.store(true, Ordering::Release);
                let _ = tx.send(outcome);
            })
            .map_err(CoreError::StreamWriteFailed)?;

        log::info!(
            "Lecture {} démarrée: {} frames @ {frame_rate:.3}fps",
            session.id,
            session.frames.len()
        );

        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveSlot {
            id: session.id,
            session: Arc::downgrade(&session),
            worker,
        });
        Ok(PlaybackHandle { session, done: rx })
    }

    /// Cancel the session behind `handle`.
    pub fn cancel(&self, handle: &PlaybackHandle) {
        log::debug!("Annulation de la lecture {}", handle.id());
        handle.cancel();
    }

    /// Cancel whatever session is running. Returns `false` if none was.
    pub fn cancel_active(&self) -> bool {
        let running = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(ActiveSlot::running);
        match running {
            Some(session) => {
                log::debug!("Arrêt de la lecture active {}", session.id);
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// `true` while a session is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| s.running().is_some())
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        let slot = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(active) = slot {
            active.stop();
        }
    }
}
