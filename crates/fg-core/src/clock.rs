use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::CoreError;

/// Horloge de cadencement absolue pour la lecture.
///
/// Frame `i` is due at `start + (i + 1) / fps`. Deadlines are computed from
/// the start instant, never accumulated, so one slow frame does not shift
/// every later one. Uses `Instant` (monotonic), immune to wall-clock jumps.
///
/// # Example
/// ```
/// use fg_core::clock::FrameSchedule;
/// use std::time::{Duration, Instant};
/// let start = Instant::now();
/// let sched = FrameSchedule::starting_at(start, 10.0).unwrap();
/// assert_eq!(sched.deadline(0), start + Duration::from_millis(100));
/// assert_eq!(sched.deadline(9), start + Duration::from_secs(1));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FrameSchedule {
    start: Instant,
    frame_rate: f64,
}

impl FrameSchedule {
    /// Schedule starting now.
    ///
    /// # Errors
    /// `InvalidConfig` if `frame_rate` is not a finite positive number.
    pub fn start(frame_rate: f64) -> Result<Self, CoreError> {
        Self::starting_at(Instant::now(), frame_rate)
    }

    /// Schedule anchored at an explicit instant.
    ///
    /// # Errors
    /// `InvalidConfig` if `frame_rate` is not a finite positive number.
    pub fn starting_at(start: Instant, frame_rate: f64) -> Result<Self, CoreError> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "frame rate invalide : {frame_rate}"
            )));
        }
        Ok(Self { start, frame_rate })
    }

    /// Instant at which frame `index` ends (when the next one may start).
    #[must_use]
    pub fn deadline(&self, index: usize) -> Instant {
        self.start + Duration::from_secs_f64((index as f64 + 1.0) / self.frame_rate)
    }

    /// Anchor instant.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.start
    }
}

/// Signal d'arrêt coopératif, clonable et partageable entre threads.
///
/// Setting it wakes any thread blocked in [`CancelToken::wait_until`], so a
/// stop request is observed without waiting for the rest of the frame period.
///
/// # Example
/// ```
/// use fg_core::clock::CancelToken;
/// let token = CancelToken::new();
/// let other = token.clone();
/// assert!(!token.is_cancelled());
/// other.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    /// Fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `deadline` or cancellation, whichever comes first.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
    }
}
