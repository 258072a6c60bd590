/// Terminal playback for frameglyph.
///
/// Paces pre-rendered text frames into a sink (ANSI terminal or memory
/// capture), with cooperative cancellation and one-session-at-a-time
/// control.
pub mod pace;
pub mod player;
pub mod session;
pub mod sink;

pub use player::{PlaybackOutcome, PlaybackStatus, play};
pub use session::{PlaybackController, PlaybackHandle, PlaybackSession};
pub use sink::{CaptureSink, TerminalSink};
