use fg_core::error::CoreError;
use fg_core::frame::MediaFrame;
use fg_core::traits::FrameSource;

/// Séquence de frames déjà en mémoire.
///
/// Used for replaying synthetic input and as a deterministic source in tests.
///
/// # Example
/// ```
/// use fg_core::frame::MediaFrame;
/// use fg_core::traits::FrameSource;
/// use fg_source::procedural::FrameSequence;
///
/// let mut seq = FrameSequence::new(vec![MediaFrame::new(2, 2)], 12.0);
/// assert!(seq.next_frame().unwrap().is_some());
/// assert!(seq.next_frame().unwrap().is_none());
/// ```
pub struct FrameSequence {
    frames: Vec<MediaFrame>,
    frame_rate: f64,
    cursor: usize,
}

impl FrameSequence {
    /// Wrap `frames` played at `frame_rate`.
    #[must_use]
    pub fn new(frames: Vec<MediaFrame>, frame_rate: f64) -> Self {
        Self {
            frames,
            frame_rate,
            cursor: 0,
        }
    }
}

impl FrameSource for FrameSequence {
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }

    fn rewind(&mut self) -> Result<(), CoreError> {
        self.cursor = 0;
        Ok(())
    }
}

/// Motif généré.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Horizontal black→white ramp that scrolls one step per frame.
    Gradient,
    /// Alternating black/white squares that swap every frame.
    Checker,
}

/// Source synthétique : génère des frames à la volée, sans fichier.
pub struct SyntheticSource {
    pattern: Pattern,
    width: u32,
    height: u32,
    frame_rate: f64,
    frame_count: usize,
    cursor: usize,
}

impl SyntheticSource {
    /// Build a finite generated stream.
    ///
    /// # Errors
    /// `InvalidDimensions` for a zero side, `InvalidConfig` for a
    /// non-positive frame rate.
    pub fn new(
        pattern: Pattern,
        width: u32,
        height: u32,
        frame_rate: f64,
        frame_count: usize,
    ) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "fps procédural invalide : {frame_rate}"
            )));
        }
        Ok(Self {
            pattern,
            width,
            height,
            frame_rate,
            frame_count,
            cursor: 0,
        })
    }

    fn render(&self, t: usize) -> MediaFrame {
        let mut frame = MediaFrame::new(self.width, self.height);
        let w = self.width as usize;
        match self.pattern {
            Pattern::Gradient => {
                for (i, px) in frame.data.chunks_exact_mut(3).enumerate() {
                    let x = (i % w + t) % w;
                    let v = if w > 1 { (x * 255 / (w - 1)) as u8 } else { 0 };
                    px.copy_from_slice(&[v, v, v]);
                }
            }
            Pattern::Checker => {
                let cell = (w / 8).max(1);
                for (i, px) in frame.data.chunks_exact_mut(3).enumerate() {
                    let (x, y) = (i % w, i / w);
                    let on = (x / cell + y / cell + t) % 2 == 0;
                    let v = if on { 255 } else { 0 };
                    px.copy_from_slice(&[v, v, v]);
                }
            }
        }
        frame
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> {
        if self.cursor >= self.frame_count {
            return Ok(None);
        }
        let frame = self.render(self.cursor);
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.frame_count)
    }

    fn rewind(&mut self) -> Result<(), CoreError> {
        self.cursor = 0;
        Ok(())
    }
}

/// Fabrique la source procédurale choisie par l'utilisateur.
///
/// # Errors
/// `InvalidConfig` si le type n'est pas reconnu.
pub fn create_procedural_source(
    target_type: &str,
    width: u32,
    height: u32,
    frame_rate: f64,
    frame_count: usize,
) -> Result<Box<dyn FrameSource>, CoreError> {
    let pattern = match target_type.to_lowercase().as_str() {
        "gradient" => Pattern::Gradient,
        "checker" => Pattern::Checker,
        _ => {
            return Err(CoreError::InvalidConfig(format!(
                "Générateur procédural inconnu : {target_type}. Supportés : gradient, checker"
            )));
        }
    };
    Ok(Box::new(SyntheticSource::new(
        pattern,
        width,
        height,
        frame_rate,
        frame_count,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_rewinds_to_first_frame() {
        let frames = vec![MediaFrame::filled(1, 1, (1, 1, 1)), MediaFrame::filled(1, 1, (2, 2, 2))];
        let mut seq = FrameSequence::new(frames, 5.0);
        assert_eq!(seq.next_frame().unwrap().unwrap().data[0], 1);
        assert_eq!(seq.next_frame().unwrap().unwrap().data[0], 2);
        assert!(seq.next_frame().unwrap().is_none());
        seq.rewind().unwrap();
        assert_eq!(seq.next_frame().unwrap().unwrap().data[0], 1);
    }

    #[test]
    fn synthetic_source_is_finite_and_sized() {
        let mut src = create_procedural_source("gradient", 16, 8, 10.0, 3).unwrap();
        assert_eq!(src.frame_count_hint(), Some(3));
        let mut n = 0;
        while let Some(f) = src.next_frame().unwrap() {
            assert_eq!((f.width, f.height), (16, 8));
            n += 1;
        }
        assert_eq!(n, 3);
    }

    #[test]
    fn gradient_spans_black_to_white() {
        let mut src = SyntheticSource::new(Pattern::Gradient, 8, 1, 1.0, 1).unwrap();
        let f = src.next_frame().unwrap().unwrap();
        assert_eq!(f.pixel(0, 0), (0, 0, 0));
        assert_eq!(f.pixel(7, 0), (255, 255, 255));
    }

    #[test]
    fn checker_alternates_between_frames() {
        let mut src = SyntheticSource::new(Pattern::Checker, 8, 8, 1.0, 2).unwrap();
        let a = src.next_frame().unwrap().unwrap();
        let b = src.next_frame().unwrap().unwrap();
        assert_ne!(a.pixel(0, 0), b.pixel(0, 0));
    }

    #[test]
    fn unknown_generator_is_rejected() {
        assert!(matches!(
            create_procedural_source("mandelbrot", 4, 4, 1.0, 1),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(SyntheticSource::new(Pattern::Checker, 4, 4, 0.0, 1).is_err());
    }
}
