use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use fg_core::traits::FrameSink;

/// Sortie terminal ANSI : retour curseur en haut à gauche puis écriture de la frame.
///
/// Each frame overwrites the previous one in place instead of scrolling.
/// The cursor is hidden for the duration of the playback and restored in
/// [`finish`](FrameSink::finish).
pub struct TerminalSink<W: Write + Send> {
    out: W,
    clear_each_frame: bool,
}

impl TerminalSink<io::Stdout> {
    /// Sink writing to the process's stdout.
    #[must_use]
    pub fn stdout(clear_each_frame: bool) -> Self {
        Self::new(io::stdout(), clear_each_frame)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    /// Wrap any writer. `clear_each_frame` adds a full-screen clear before
    /// every frame on top of the cursor reset.
    pub fn new(out: W, clear_each_frame: bool) -> Self {
        Self {
            out,
            clear_each_frame,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> FrameSink for TerminalSink<W> {
    fn begin(&mut self) -> io::Result<()> {
        queue!(self.out, Hide, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()
    }

    fn present(&mut self, _index: usize, frame: &str) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0))?;
        if self.clear_each_frame {
            queue!(self.out, Clear(ClearType::All))?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        queue!(self.out, Show)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// Sink mémoire : conserve chaque frame présentée, sans séquence de contrôle.
///
/// Clones share the same buffer, so a test can hand one clone to the player
/// and inspect the other afterwards.
///
/// # Example
/// ```
/// use fg_core::traits::FrameSink;
/// use fg_player::sink::CaptureSink;
/// let capture = CaptureSink::new();
/// let mut sink = capture.clone();
/// sink.present(0, "@@").unwrap();
/// assert_eq!(capture.frames(), vec!["@@".to_string()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CaptureSink {
    frames: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink {
    /// Empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every frame presented so far, in order.
    #[must_use]
    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FrameSink for CaptureSink {
    fn present(&mut self, _index: usize, frame: &str) -> io::Result<()> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.to_string());
        Ok(())
    }
}
