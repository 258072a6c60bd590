use crate::error::CoreError;

/// 10 caractères, du plus dense au plus clair. Défaut historique.
pub const CHARSET_DEFAULT: &str = "@%#*+=-:. ";

/// 70 caractères (Paul Bourke), résolution maximale (dense→clair).
pub const CHARSET_DETAILED: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Blocs Unicode, pseudo-pixels (dense→clair).
pub const CHARSET_BLOCKS: &str = "█▓▒░ ";

/// Charset prédéfini par nom : `default`, `detailed`, `blocks`.
///
/// # Example
/// ```
/// use fg_core::charset::{preset, CHARSET_BLOCKS};
/// assert_eq!(preset("blocks"), Some(CHARSET_BLOCKS));
/// assert_eq!(preset("inconnu"), None);
/// ```
#[must_use]
pub fn preset(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "default" => Some(CHARSET_DEFAULT),
        "detailed" => Some(CHARSET_DETAILED),
        "blocks" => Some(CHARSET_BLOCKS),
        _ => None,
    }
}

/// Ordered glyph list, densest first.
///
/// Index 0 is the glyph chosen for luminance 0 under a non-inverted config.
///
/// # Example
/// ```
/// use fg_core::charset::Charset;
/// let cs = Charset::parse("@ ").unwrap();
/// assert_eq!(cs.len(), 2);
/// assert_eq!(cs.first(), '@');
/// assert_eq!(cs.last(), ' ');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Charset {
    glyphs: Vec<char>,
}

impl Charset {
    /// Validate a user-supplied charset string.
    ///
    /// # Errors
    /// `InvalidConfig` if the string is empty or contains a control
    /// character (a newline inside the charset would corrupt row framing).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = s.chars().collect();
        if glyphs.is_empty() {
            return Err(CoreError::InvalidConfig("charset vide".into()));
        }
        if let Some(bad) = glyphs.iter().find(|c| c.is_control()) {
            return Err(CoreError::InvalidConfig(format!(
                "caractère de contrôle dans le charset : {:?}",
                bad
            )));
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false: a `Charset` is non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Densest glyph.
    #[must_use]
    pub fn first(&self) -> char {
        self.glyphs[0]
    }

    /// Sparsest glyph.
    #[must_use]
    pub fn last(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }

    /// Glyph at `index`, clamped to the last one.
    #[must_use]
    pub fn get(&self, index: usize) -> char {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            glyphs: CHARSET_DEFAULT.chars().collect(),
        }
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in &self.glyphs {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

/// Bucket index for a luminance value.
///
/// `floor(luminance / 256 * len)`, clamped to `[0, len-1]`; mirrored to
/// `len-1-index` when `invert` is set.
///
/// # Example
/// ```
/// use fg_core::charset::glyph_index;
/// assert_eq!(glyph_index(0, 10, false), 0);
/// assert_eq!(glyph_index(255, 10, false), 9);
/// assert_eq!(glyph_index(0, 10, true), 9);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(luminance: u8, len: usize, invert: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let idx = (usize::from(luminance) * len / 256).min(len - 1);
    if invert { len - 1 - idx } else { idx }
}

/// Lookup table mapping luminance [0..255] → glyph.
///
/// Pre-computed once per conversion for O(1) per-cell cost.
///
/// # Example
/// ```
/// use fg_core::charset::{Charset, LuminanceLut};
/// let cs = Charset::parse("@%#*+=-:. ").unwrap();
/// let lut = LuminanceLut::new(&cs, false);
/// assert_eq!(lut.map(0), '@');
/// assert_eq!(lut.map(255), ' ');
/// ```
#[derive(Clone)]
pub struct LuminanceLut {
    lut: [char; 256],
}

impl LuminanceLut {
    /// Build the table for a charset and inversion flag.
    #[must_use]
    pub fn new(charset: &Charset, invert: bool) -> Self {
        let len = charset.len();
        let mut lut = [' '; 256];
        for (lum, slot) in lut.iter_mut().enumerate() {
            *slot = charset.get(glyph_index(lum as u8, len, invert));
        }
        Self { lut }
    }

    /// Map a luminance value [0..255] to a glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_charset_is_rejected() {
        assert!(matches!(Charset::parse(""), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(matches!(
            Charset::parse("@\n "),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn extremes_select_first_and_last() {
        let cs = Charset::parse(CHARSET_DEFAULT).unwrap();
        let lut = LuminanceLut::new(&cs, false);
        assert_eq!(lut.map(0), cs.first());
        assert_eq!(lut.map(255), cs.last());

        let inv = LuminanceLut::new(&cs, true);
        assert_eq!(inv.map(0), cs.last());
        assert_eq!(inv.map(255), cs.first());
    }

    #[test]
    fn buckets_partition_luminance_range() {
        for len in 1..=40usize {
            let mut counts = vec![0usize; len];
            let mut prev = 0usize;
            for lum in 0..=255u8 {
                let idx = glyph_index(lum, len, false);
                assert!(idx < len);
                assert!(idx >= prev, "non monotone à {lum} (len {len})");
                assert!(idx <= prev + 1, "bucket sauté à {lum} (len {len})");
                prev = idx;
                counts[idx] += 1;
            }
            // Every glyph owns a non-empty bucket as long as there are
            // fewer glyphs than luminance levels.
            assert!(counts.iter().all(|&c| c > 0), "len {len}: {counts:?}");
            assert_eq!(counts.iter().sum::<usize>(), 256);
        }
    }

    #[test]
    fn invert_mirrors_index() {
        for lum in 0..=255u8 {
            let a = glyph_index(lum, 7, false);
            let b = glyph_index(lum, 7, true);
            assert_eq!(a + b, 6);
        }
    }

    #[test]
    fn single_glyph_charset_maps_everything_to_it() {
        let cs = Charset::parse("#").unwrap();
        let lut = LuminanceLut::new(&cs, true);
        assert!((0..=255u8).all(|l| lut.map(l) == '#'));
    }

    #[test]
    fn presets_are_valid_charsets() {
        for name in ["default", "detailed", "blocks"] {
            let cs = Charset::parse(preset(name).unwrap()).unwrap();
            assert_eq!(cs.last(), ' ', "{name} finit par le glyphe le plus clair");
        }
    }

    #[test]
    fn display_round_trips_source_string() {
        let cs = Charset::parse(CHARSET_BLOCKS).unwrap();
        assert_eq!(cs.to_string(), CHARSET_BLOCKS);
    }
}
