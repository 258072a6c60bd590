/// Frame samplers for frameglyph (image, video, in-memory, synthetic).

pub mod image;
pub mod procedural;
pub mod video;
