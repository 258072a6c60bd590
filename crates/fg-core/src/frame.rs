use std::fmt::{self, Write};

use crate::color::{ANSI_RESET, write_fg_escape};
use crate::error::CoreError;

/// Buffer de pixels décodé. RGB row-major, 3 bytes par pixel.
///
/// Produced by a sampler, consumed by the glyph mapper, then dropped.
///
/// # Example
/// ```
/// use fg_core::frame::MediaFrame;
/// let f = MediaFrame::filled(4, 2, (10, 20, 30));
/// assert_eq!(f.data.len(), 4 * 2 * 3);
/// assert_eq!(f.pixel(3, 1), (10, 20, 30));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFrame {
    /// Pixels RGB, row-major.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl MediaFrame {
    /// Black frame of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, (0, 0, 0))
    }

    /// Frame where every pixel has the same color.
    #[must_use]
    pub fn filled(width: u32, height: u32, (r, g, b): (u8, u8, u8)) -> Self {
        let n = width as usize * height as usize;
        let mut data = Vec::with_capacity(n * 3);
        for _ in 0..n {
            data.extend_from_slice(&[r, g, b]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Wrap a raw RGB buffer.
    ///
    /// # Errors
    /// `InvalidDimensions` if a side is zero or the buffer length is not
    /// `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 3 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Number of bytes one frame of this size occupies.
    #[must_use]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// Accès au pixel (x, y) → (r, g, b).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

/// One output cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Caractère à afficher.
    pub ch: char,
    /// Average RGB of the source cell, present only when color is enabled.
    pub rgb: Option<(u8, u8, u8)>,
}

impl Default for Glyph {
    fn default() -> Self {
        Self { ch: ' ', rgb: None }
    }
}

/// Grille de sortie texte, immuable une fois produite.
///
/// Row-major cells. Rendering emits one line per row joined by `\n`, each
/// colored glyph preceded by its truecolor escape and each colored row
/// terminated by a reset.
///
/// # Example
/// ```
/// use fg_core::frame::{Glyph, TextFrame};
/// let frame = TextFrame::from_cells(2, 1, vec![
///     Glyph { ch: '@', rgb: None },
///     Glyph { ch: ' ', rgb: None },
/// ]).unwrap();
/// assert_eq!(frame.render(), "@ ");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFrame {
    cells: Vec<Glyph>,
    width: u32,
    height: u32,
}

impl TextFrame {
    /// Build a frame from row-major cells.
    ///
    /// # Errors
    /// `InvalidDimensions` if `cells.len() != width * height` or a side is zero.
    pub fn from_cells(width: u32, height: u32, cells: Vec<Glyph>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || cells.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Columns (always the configured target width).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Glyph]> {
        self.cells.chunks(self.width as usize)
    }

    /// All cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Glyph] {
        &self.cells
    }

    /// Serialize into `out` (no trailing newline).
    ///
    /// # Errors
    /// Propagates the writer's error.
    pub fn write_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        for (y, row) in self.rows().enumerate() {
            if y > 0 {
                out.write_char('\n')?;
            }
            let mut colored = false;
            for glyph in row {
                if let Some(rgb) = glyph.rgb {
                    write_fg_escape(out, rgb)?;
                    colored = true;
                }
                out.write_char(glyph.ch)?;
            }
            if colored {
                out.write_str(ANSI_RESET)?;
            }
        }
        Ok(())
    }

    /// Rendered string form.
    #[must_use]
    pub fn render(&self) -> String {
        let per_cell = if self.cells.first().is_some_and(|g| g.rgb.is_some()) {
            20
        } else {
            1
        };
        let mut s = String::with_capacity(self.cells.len() * per_cell + self.height as usize);
        // fmt::Write sur String est infaillible.
        let _ = self.write_to(&mut s);
        s
    }
}

impl fmt::Display for TextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}
