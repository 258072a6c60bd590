use fg_core::charset::LuminanceLut;
use fg_core::color::luminance;
use fg_core::config::ConversionConfig;
use fg_core::error::CoreError;
use fg_core::frame::{Glyph, MediaFrame, TextFrame};
use rayon::prelude::*;

use crate::resize::{AreaResizer, grid_size};

/// Convertit des frames pixel en frames texte pour une configuration donnée.
///
/// Holds the luminance LUT and a reusable resizer, so one mapper per worker
/// thread converts a whole video without reallocating either.
///
/// # Example
/// ```
/// use fg_ascii::mapper::GlyphMapper;
/// use fg_core::config::ConversionConfig;
/// use fg_core::frame::MediaFrame;
///
/// let cfg = ConversionConfig::new(8, "@ ", false, false).unwrap();
/// let mut mapper = GlyphMapper::new(&cfg);
/// let text = mapper.map(&MediaFrame::new(16, 16)).unwrap();
/// assert_eq!(text.width(), 8);
/// assert_eq!(text.render().lines().next(), Some("@@@@@@@@"));
/// ```
pub struct GlyphMapper {
    lut: LuminanceLut,
    target_width: u32,
    color: bool,
    resizer: AreaResizer,
}

impl GlyphMapper {
    /// Build a mapper for `config`.
    #[must_use]
    pub fn new(config: &ConversionConfig) -> Self {
        log::debug!(
            "GlyphMapper: largeur {}, {} glyphes, invert={}, couleur={}",
            config.target_width(),
            config.charset().len(),
            config.invert(),
            config.color_enabled()
        );
        Self {
            lut: LuminanceLut::new(config.charset(), config.invert()),
            target_width: config.target_width(),
            color: config.color_enabled(),
            resizer: AreaResizer::new(),
        }
    }

    /// Map one frame.
    ///
    /// Deterministic: the same frame and config always give the same output.
    ///
    /// # Errors
    /// `InvalidDimensions` if the frame buffer is inconsistent.
    pub fn map(&mut self, frame: &MediaFrame) -> Result<TextFrame, CoreError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: frame.width,
                height: frame.height,
            });
        }
        let (cols, rows) = grid_size(frame.width, frame.height, self.target_width);
        let small = self.resizer.resize(frame, cols, rows)?;

        let lut = &self.lut;
        let color = self.color;
        let row_bytes = cols as usize * 3;
        let mut cells = vec![Glyph::default(); cols as usize * rows as usize];

        cells
            .par_chunks_mut(cols as usize)
            .zip(small.data.par_chunks(row_bytes))
            .for_each(|(row, px_row)| {
                for (cell, px) in row.iter_mut().zip(px_row.chunks_exact(3)) {
                    let (r, g, b) = (px[0], px[1], px[2]);
                    *cell = Glyph {
                        ch: lut.map(luminance(r, g, b)),
                        rgb: color.then_some((r, g, b)),
                    };
                }
            });

        TextFrame::from_cells(cols, rows, cells)
    }
}

/// One-shot conversion. Prefer [`GlyphMapper`] when converting many frames.
///
/// # Errors
/// `InvalidDimensions` if the frame buffer is inconsistent.
pub fn map_frame(frame: &MediaFrame, config: &ConversionConfig) -> Result<TextFrame, CoreError> {
    GlyphMapper::new(config).map(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_core::charset::{CHARSET_BLOCKS, CHARSET_DEFAULT, CHARSET_DETAILED};

    fn cfg(width: u32, charset: &str, invert: bool, color: bool) -> ConversionConfig {
        ConversionConfig::new(width, charset, invert, color).unwrap()
    }

    #[test]
    fn black_frame_maps_to_densest_glyph() {
        let black = MediaFrame::new(40, 40);
        for charset in ["#", CHARSET_DEFAULT, CHARSET_DETAILED, CHARSET_BLOCKS, "xy"] {
            let densest = charset.chars().next().unwrap();
            for width in [1, 7, 40, 200] {
                for color in [false, true] {
                    let text = map_frame(&black, &cfg(width, charset, false, color)).unwrap();
                    assert_eq!(text.width(), width);
                    assert!(
                        text.cells().iter().all(|g| g.ch == densest),
                        "{charset:?} largeur {width} couleur {color}"
                    );
                    if color {
                        assert!(text.cells().iter().all(|g| g.rgb == Some((0, 0, 0))));
                    }
                }
            }
        }
    }

    #[test]
    fn inverted_black_frame_maps_to_sparsest_glyph() {
        let text = map_frame(&MediaFrame::new(40, 40), &cfg(10, CHARSET_DEFAULT, true, false))
            .unwrap();
        assert!(text.cells().iter().all(|g| g.ch == ' '));
    }

    #[test]
    fn white_two_by_two_at_width_two() {
        let frame = MediaFrame::filled(2, 2, (255, 255, 255));
        let text = map_frame(&frame, &cfg(2, "@ ", false, false)).unwrap();
        assert_eq!((text.width(), text.height()), (2, 1));
        assert_eq!(text.render(), "  ");
    }

    #[test]
    fn every_row_has_target_width() {
        for &(w, h) in &[(1u32, 1u32), (3, 500), (640, 360), (7, 3)] {
            let frame = MediaFrame::filled(w, h, (90, 120, 30));
            let text = map_frame(&frame, &cfg(37, CHARSET_DEFAULT, false, false)).unwrap();
            assert_eq!(text.width(), 37);
            for line in text.render().split('\n') {
                assert_eq!(line.chars().count(), 37);
            }
        }
    }

    #[test]
    fn mapping_is_idempotent() {
        let mut frame = MediaFrame::new(32, 24);
        for (i, v) in frame.data.iter_mut().enumerate() {
            *v = (i * 7 % 256) as u8;
        }
        let c = cfg(16, CHARSET_DEFAULT, false, true);
        let mut mapper = GlyphMapper::new(&c);
        let a = mapper.map(&frame).unwrap();
        let b = mapper.map(&frame).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, map_frame(&frame, &c).unwrap());
    }

    #[test]
    fn color_keeps_cell_rgb_and_emits_escapes() {
        let frame = MediaFrame::filled(4, 4, (200, 10, 10));
        let text = map_frame(&frame, &cfg(2, CHARSET_DEFAULT, false, true)).unwrap();
        assert!(text.cells().iter().all(|g| g.rgb == Some((200, 10, 10))));
        let rendered = text.render();
        assert!(rendered.starts_with("\x1b[38;2;200;10;10m"));
        assert!(rendered.ends_with("\x1b[0m"));
    }

    #[test]
    fn no_color_means_no_escape_bytes() {
        let frame = MediaFrame::filled(4, 4, (200, 10, 10));
        let text = map_frame(&frame, &cfg(2, CHARSET_DEFAULT, false, false)).unwrap();
        assert!(!text.render().contains('\x1b'));
    }

    #[test]
    fn dimensions_depend_only_on_aspect_and_width() {
        let c = cfg(20, CHARSET_DEFAULT, false, false);
        let a = map_frame(&MediaFrame::filled(100, 50, (0, 0, 0)), &c).unwrap();
        let b = map_frame(&MediaFrame::filled(100, 50, (255, 255, 255)), &c).unwrap();
        assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    }
}
