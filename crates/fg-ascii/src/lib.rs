/// Glyph mapping engine for frameglyph.
///
/// Resizes pixel frames to the target character grid and maps each cell's
/// luminance to a glyph of the configured charset.
pub mod mapper;
pub mod resize;

pub use mapper::{GlyphMapper, map_frame};
