use std::time::{Duration, Instant};

/// Mesure de cadence d'une lecture : FPS effectif et retard max sur l'horaire.
///
/// Fed once per presented frame with the instant it was due; nothing is
/// allocated after construction.
///
/// # Example
/// ```
/// use fg_player::pace::PaceMeter;
/// use std::time::Instant;
/// let mut meter = PaceMeter::new();
/// meter.tick(Instant::now());
/// assert_eq!(meter.frames(), 1);
/// assert!(meter.fps().abs() < f64::EPSILON);
/// ```
#[derive(Debug)]
pub struct PaceMeter {
    first: Option<Instant>,
    last: Option<Instant>,
    frames: usize,
    max_lag: Duration,
}

impl PaceMeter {
    /// Empty meter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            first: None,
            last: None,
            frames: 0,
            max_lag: Duration::ZERO,
        }
    }

    /// Appeler juste après la présentation d'une frame.
    ///
    /// `due` is when the frame was supposed to appear.
    pub fn tick(&mut self, due: Instant) {
        let now = Instant::now();
        self.first.get_or_insert(now);
        self.last = Some(now);
        self.frames += 1;
        self.max_lag = self.max_lag.max(now.saturating_duration_since(due));
    }

    /// Frames presented.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Mean presentation rate between the first and last frame.
    #[must_use]
    pub fn fps(&self) -> f64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) if self.frames >= 2 => {
                let secs = last.duration_since(first).as_secs_f64();
                if secs > 0.0 {
                    (self.frames - 1) as f64 / secs
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Largest delay between a frame's due instant and its presentation.
    #[must_use]
    pub fn max_lag(&self) -> Duration {
        self.max_lag
    }
}

impl Default for PaceMeter {
    fn default() -> Self {
        Self::new()
    }
}
