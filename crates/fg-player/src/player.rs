use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use fg_core::clock::{CancelToken, FrameSchedule};
use fg_core::error::CoreError;
use fg_core::traits::FrameSink;

use crate::pace::PaceMeter;

/// État terminal d'une lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Every frame was presented.
    Completed,
    /// The cancel token was observed at a frame boundary.
    Cancelled,
    /// The sink stopped accepting output, or the frame rate was unusable.
    Failed,
}

/// Bilan d'une lecture.
#[derive(Debug)]
pub struct PlaybackOutcome {
    /// Terminal state reached.
    pub status: PlaybackStatus,
    /// Index of the last frame actually written, `None` if none was.
    pub last_rendered: Option<usize>,
    /// Number of frames written.
    pub frames_rendered: usize,
    /// Measured presentation rate.
    pub effective_fps: f64,
    /// Cause of a `Failed` status.
    pub failure: Option<CoreError>,
}

impl PlaybackOutcome {
    fn failed(error: CoreError, last_rendered: Option<usize>, frames_rendered: usize) -> Self {
        Self {
            status: PlaybackStatus::Failed,
            last_rendered,
            frames_rendered,
            effective_fps: 0.0,
            failure: Some(error),
        }
    }
}

/// Joue `frames` dans `sink` à `frame_rate`, jusqu'à la fin ou l'annulation.
///
/// Frame `i` is presented, then the player sleeps until
/// `start + (i + 1) / frame_rate`. The cancel token is checked before each
/// frame and again before each sleep; the sleep itself wakes on cancel.
/// `sink.finish()` runs on every exit path once `begin` succeeded.
///
/// # Example
/// ```
/// use fg_core::clock::CancelToken;
/// use fg_player::player::{play, PlaybackStatus};
/// use fg_player::sink::CaptureSink;
///
/// let frames = vec!["@ ".to_string(), " @".to_string()];
/// let capture = CaptureSink::new();
/// let mut sink = capture.clone();
/// let outcome = play(&frames, 100.0, &CancelToken::new(), &mut sink);
/// assert_eq!(outcome.status, PlaybackStatus::Completed);
/// assert_eq!(outcome.last_rendered, Some(1));
/// assert_eq!(capture.frames(), frames);
/// ```
pub fn play<S: AsRef<str>>(
    frames: &[S],
    frame_rate: f64,
    cancel: &CancelToken,
    sink: &mut dyn FrameSink,
) -> PlaybackOutcome {
    let position = AtomicUsize::new(0);
    play_tracked(frames, frame_rate, cancel, sink, &position)
}

/// [`play`], publishing the number of frames written into `position`.
pub fn play_tracked<S: AsRef<str>>(
    frames: &[S],
    frame_rate: f64,
    cancel: &CancelToken,
    sink: &mut dyn FrameSink,
    position: &AtomicUsize,
) -> PlaybackOutcome {
    let schedule = match FrameSchedule::start(frame_rate) {
        Ok(s) => s,
        Err(e) => return PlaybackOutcome::failed(e, None, 0),
    };

    if let Err(e) = sink.begin() {
        // begin peut avoir déjà masqué le curseur.
        let _ = sink.finish();
        return PlaybackOutcome::failed(CoreError::StreamWriteFailed(e), None, 0);
    }
    log::debug!("Lecture: {} frames @ {frame_rate:.3}fps", frames.len());

    let mut meter = PaceMeter::new();
    let mut last_rendered = None;
    let mut status = PlaybackStatus::Completed;
    let mut failure = None;

    for (index, frame) in frames.iter().enumerate() {
        if cancel.is_cancelled() {
            status = PlaybackStatus::Cancelled;
            break;
        }

        let due = if index == 0 {
            schedule.started_at()
        } else {
            schedule.deadline(index - 1)
        };
        if let Err(e) = sink.present(index, frame.as_ref()) {
            status = PlaybackStatus::Failed;
            failure = Some(CoreError::StreamWriteFailed(e));
            break;
        }
        meter.tick(due);
        last_rendered = Some(index);
        position.store(index + 1, Ordering::Release);

        if cancel.is_cancelled() || cancel.wait_until(schedule.deadline(index)) {
            status = PlaybackStatus::Cancelled;
            break;
        }
    }

    if let Err(e) = sink.finish()
        && failure.is_none()
    {
        status = PlaybackStatus::Failed;
        failure = Some(CoreError::StreamWriteFailed(e));
    }

    log::info!(
        "Lecture terminée: {status:?}, dernière frame {last_rendered:?}, {:.2}fps effectifs, retard max {:?} ({:.2}s)",
        meter.fps(),
        meter.max_lag(),
        Instant::now().duration_since(schedule.started_at()).as_secs_f64()
    );

    PlaybackOutcome {
        status,
        last_rendered,
        frames_rendered: meter.frames(),
        effective_fps: meter.fps(),
        failure,
    }
}
