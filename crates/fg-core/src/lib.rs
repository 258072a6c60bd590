/// Shared types, traits, and configuration for frameglyph.
///
/// This crate contains the frame types, charset lookup, conversion config,
/// error taxonomy, and the pacing primitives used across the workspace.

pub mod charset;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::{Charset, LuminanceLut};
pub use clock::{CancelToken, FrameSchedule};
pub use config::{AppConfig, BusyPolicy, ConversionConfig};
pub use error::CoreError;
pub use frame::{Glyph, MediaFrame, TextFrame};
pub use traits::{FrameSink, FrameSource};

/// Kind of media a path is declared to contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Single still image.
    Image,
    /// Frame sequence with a nominal frame rate.
    Video,
}
