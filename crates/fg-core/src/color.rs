use std::fmt::{self, Write};

/// SGR reset, emitted once at the end of every colored row.
pub const ANSI_RESET: &str = "\x1b[0m";

/// Écrit la séquence truecolor foreground `ESC[38;2;R;G;Bm`.
///
/// # Errors
/// Propagates the writer's error.
///
/// # Example
/// ```
/// use fg_core::color::write_fg_escape;
/// let mut s = String::new();
/// write_fg_escape(&mut s, (255, 128, 0)).unwrap();
/// assert_eq!(s, "\x1b[38;2;255;128;0m");
/// ```
#[inline]
pub fn write_fg_escape<W: Write>(out: &mut W, (r, g, b): (u8, u8, u8)) -> fmt::Result {
    write!(out, "\x1b[38;2;{r};{g};{b}m")
}

/// Perceptual luminance (ITU-R BT.601 weights: 0.299 R + 0.587 G + 0.114 B).
///
/// Integer arithmetic, rounded to nearest. Pure white maps to exactly 255.
///
/// # Example
/// ```
/// use fg_core::color::luminance;
/// assert_eq!(luminance(0, 0, 0), 0);
/// assert_eq!(luminance(255, 255, 255), 255);
/// ```
#[inline(always)]
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_weights_green_heaviest() {
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn luminance_never_overflows() {
        for v in 0..=255u8 {
            assert_eq!(luminance(v, v, v), v);
        }
    }
}
