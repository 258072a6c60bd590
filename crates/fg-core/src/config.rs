use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_DEFAULT, Charset};
use crate::error::CoreError;

/// Largeur maximale acceptée (caractères par ligne).
pub const MAX_TARGET_WIDTH: u32 = 2000;

/// Largeur par défaut.
pub const DEFAULT_TARGET_WIDTH: u32 = 120;

/// Frame rate used when a container reports no usable nominal rate.
pub const DEFAULT_FALLBACK_FPS: f64 = 24.0;

/// Paramètres d'une conversion. Immuable, validé à la construction.
///
/// # Example
/// ```
/// use fg_core::config::ConversionConfig;
/// let cfg = ConversionConfig::new(80, "@%#*+=-:. ", false, true).unwrap();
/// assert_eq!(cfg.target_width(), 80);
/// assert!(cfg.color_enabled());
/// assert!(ConversionConfig::new(0, "@ ", false, false).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionConfig {
    target_width: u32,
    charset: Charset,
    invert: bool,
    color_enabled: bool,
}

impl ConversionConfig {
    /// Validate and build.
    ///
    /// # Errors
    /// `InvalidConfig` for a zero or oversized width, or an invalid charset.
    pub fn new(
        target_width: u32,
        charset: &str,
        invert: bool,
        color_enabled: bool,
    ) -> Result<Self, CoreError> {
        if target_width == 0 {
            return Err(CoreError::InvalidConfig(
                "la largeur cible doit être > 0".into(),
            ));
        }
        if target_width > MAX_TARGET_WIDTH {
            return Err(CoreError::InvalidConfig(format!(
                "largeur cible {target_width} > {MAX_TARGET_WIDTH}"
            )));
        }
        Ok(Self {
            target_width,
            charset: Charset::parse(charset)?,
            invert,
            color_enabled,
        })
    }

    /// Characters per row.
    #[must_use]
    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Glyphs, densest first.
    #[must_use]
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Traverse the charset in reverse.
    #[must_use]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Emit truecolor escapes.
    #[must_use]
    pub fn color_enabled(&self) -> bool {
        self.color_enabled
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            charset: Charset::default(),
            invert: false,
            color_enabled: false,
        }
    }
}

/// What to do when a playback starts while another one is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum BusyPolicy {
    /// Refuse the new playback with `PlaybackBusy`.
    #[default]
    Reject,
    /// Cancel the running playback, wait for it, then start.
    Preempt,
}

/// Valeurs par défaut d'une requête de conversion.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConversionDefaults {
    /// Largeur cible.
    pub width: u32,
    /// Charset (dense→clair).
    pub charset: String,
    /// Inversion.
    pub invert: bool,
    /// Couleur truecolor.
    pub color: bool,
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            charset: CHARSET_DEFAULT.to_string(),
            invert: false,
            color: false,
        }
    }
}

/// Paramètres de lecture terminal.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Jouer les vidéos dans le terminal après conversion.
    pub terminal: bool,
    /// Politique en cas de lecture concurrente.
    pub busy_policy: BusyPolicy,
    /// Effacer tout l'écran à chaque frame (en plus du retour curseur).
    pub clear_each_frame: bool,
    /// FPS de repli si le conteneur n'en déclare pas.
    pub fallback_fps: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            terminal: true,
            busy_policy: BusyPolicy::Reject,
            clear_each_frame: false,
            fallback_fps: DEFAULT_FALLBACK_FPS,
        }
    }
}

/// Emplacement des artefacts.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Dossier de sortie.
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
        }
    }
}

/// Configuration complète de l'application, sérialisable en TOML.
///
/// # Example
/// ```
/// use fg_core::config::AppConfig;
/// let config = AppConfig::default();
/// assert_eq!(config.conversion.width, 120);
/// assert!(config.playback.terminal);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Défauts de conversion.
    pub conversion: ConversionDefaults,
    /// Lecture terminal.
    pub playback: PlaybackSettings,
    /// Sorties.
    pub output: OutputSettings,
}

impl AppConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.conversion.width = self.conversion.width.clamp(1, MAX_TARGET_WIDTH);
        if !self.playback.fallback_fps.is_finite() || self.playback.fallback_fps <= 0.0 {
            self.playback.fallback_fps = DEFAULT_FALLBACK_FPS;
        }
        self.playback.fallback_fps = self.playback.fallback_fps.clamp(1.0, 240.0);
    }

    /// Build the validated conversion config from the defaults.
    ///
    /// # Errors
    /// `InvalidConfig` if the configured charset is invalid.
    pub fn conversion_config(&self) -> Result<ConversionConfig, CoreError> {
        ConversionConfig::new(
            self.conversion.width,
            &self.conversion.charset,
            self.conversion.invert,
            self.conversion.color,
        )
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    conversion: Option<ConversionSection>,
    playback: Option<PlaybackSection>,
    output: Option<OutputSection>,
}

#[derive(Deserialize)]
struct ConversionSection {
    width: Option<u32>,
    charset: Option<String>,
    invert: Option<bool>,
    color: Option<bool>,
}

#[derive(Deserialize)]
struct PlaybackSection {
    terminal: Option<bool>,
    busy_policy: Option<BusyPolicy>,
    clear_each_frame: Option<bool>,
    fallback_fps: Option<f64>,
}

#[derive(Deserialize)]
struct OutputSection {
    dir: Option<PathBuf>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// `Config` if the text is not valid TOML for this schema, `InvalidConfig`
/// if the merged charset is empty.
///
/// # Example
/// ```
/// use fg_core::config::{parse_config, BusyPolicy};
/// let cfg = parse_config("[playback]\nbusy_policy = \"Preempt\"\n").unwrap();
/// assert_eq!(cfg.playback.busy_policy, BusyPolicy::Preempt);
/// assert_eq!(cfg.conversion.width, 120);
/// ```
pub fn parse_config(content: &str) -> Result<AppConfig, CoreError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| CoreError::Config(format!("TOML invalide : {e}")))?;

    let mut config = AppConfig::default();

    if let Some(c) = file.conversion {
        if let Some(v) = c.width {
            config.conversion.width = v;
        }
        if let Some(v) = c.charset {
            config.conversion.charset = v;
        }
        if let Some(v) = c.invert {
            config.conversion.invert = v;
        }
        if let Some(v) = c.color {
            config.conversion.color = v;
        }
    }
    if let Some(p) = file.playback {
        if let Some(v) = p.terminal {
            config.playback.terminal = v;
        }
        if let Some(v) = p.busy_policy {
            config.playback.busy_policy = v;
        }
        if let Some(v) = p.clear_each_frame {
            config.playback.clear_each_frame = v;
        }
        if let Some(v) = p.fallback_fps {
            config.playback.fallback_fps = v;
        }
    }
    if let Some(o) = file.output
        && let Some(v) = o.dir
    {
        config.output.dir = v;
    }

    config.clamp_all();
    Charset::parse(&config.conversion.charset)?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<AppConfig, CoreError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("impossible de lire {} : {e}", path.display())))?;
    let config = parse_config(&content)?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn conversion_config_rejects_bad_input() {
        assert!(matches!(
            ConversionConfig::new(0, "@ ", false, false),
            Err(CoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConversionConfig::new(80, "", false, false),
            Err(CoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConversionConfig::new(MAX_TARGET_WIDTH + 1, "@ ", false, false),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_conversion_config_uses_default_charset() {
        let cfg = ConversionConfig::default();
        assert_eq!(cfg.charset().to_string(), CHARSET_DEFAULT);
        assert_eq!(cfg.target_width(), DEFAULT_TARGET_WIDTH);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse_config("[conversion]\nwidth = 64\ncolor = true\n").unwrap();
        assert_eq!(cfg.conversion.width, 64);
        assert!(cfg.conversion.color);
        assert_eq!(cfg.conversion.charset, CHARSET_DEFAULT);
        assert_eq!(cfg.playback, PlaybackSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg =
            parse_config("[conversion]\nwidth = 999999\n[playback]\nfallback_fps = -3.0\n")
                .unwrap();
        assert_eq!(cfg.conversion.width, MAX_TARGET_WIDTH);
        assert!((cfg.playback.fallback_fps - DEFAULT_FALLBACK_FPS).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_charset_in_file_is_rejected() {
        assert!(matches!(
            parse_config("[conversion]\ncharset = \"\"\n"),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            parse_config("[conversion\nwidth = "),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndir = \"/tmp/ascii\"").unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("/tmp/ascii"));
    }

    #[test]
    fn load_config_missing_file() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/frameglyph.toml")),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn shipped_default_file_matches_defaults() {
        let cfg = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn app_config_builds_conversion_config() {
        let cfg = AppConfig::default().conversion_config().unwrap();
        assert_eq!(cfg, ConversionConfig::default());
    }
}
