use std::io;

use crate::error::CoreError;
use crate::frame::MediaFrame;

/// Fournit des frames décodées, dans l'ordre temporel.
///
/// Implémenté par : `ImageSource`, `VideoSource`, `FrameSequence`, `SyntheticSource`.
///
/// A source is finite and restartable: after [`rewind`](Self::rewind) it
/// yields the same frames again from frame 0.
///
/// # Example
/// ```
/// use fg_core::traits::FrameSource;
/// use fg_core::frame::MediaFrame;
/// use fg_core::CoreError;
///
/// struct Empty;
/// impl FrameSource for Empty {
///     fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> { Ok(None) }
///     fn frame_rate(&self) -> f64 { 24.0 }
///     fn frame_count_hint(&self) -> Option<usize> { Some(0) }
///     fn rewind(&mut self) -> Result<(), CoreError> { Ok(()) }
/// }
/// ```
pub trait FrameSource: Send {
    /// Prochaine frame complète, `None` en fin de flux.
    ///
    /// # Errors
    /// Any decode failure. A frame is either fully decoded or not returned.
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError>;

    /// Nominal frame rate declared by the container.
    fn frame_rate(&self) -> f64;

    /// Frame count declared by the container, if known before decoding.
    fn frame_count_hint(&self) -> Option<usize>;

    /// Restart from frame 0.
    ///
    /// # Errors
    /// If the underlying decoder cannot be reopened.
    fn rewind(&mut self) -> Result<(), CoreError>;
}

/// Destination des frames rendues pendant la lecture.
///
/// The player owns pacing; a sink only knows how to put one frame on screen
/// (or in memory). `begin` and `finish` bracket a playback; `finish` is
/// called on every exit path, including after a failed `present`.
pub trait FrameSink: Send {
    /// Called once before the first frame.
    ///
    /// # Errors
    /// The stream is not writable.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Replace whatever is displayed with `frame`.
    ///
    /// # Errors
    /// The stream is not writable.
    fn present(&mut self, index: usize, frame: &str) -> io::Result<()>;

    /// Called once after the last frame, cancelled or not.
    ///
    /// # Errors
    /// The stream is not writable.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn begin(&mut self) -> io::Result<()> {
        (**self).begin()
    }

    fn present(&mut self, index: usize, frame: &str) -> io::Result<()> {
        (**self).present(index, frame)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}
