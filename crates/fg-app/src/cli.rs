use std::path::PathBuf;

use clap::Parser;

/// frameglyph : conversion image/vidéo → ASCII, lecture cadencée dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source : chemin vers une vidéo. Requiert ffmpeg et ffprobe dans PATH.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Générateur synthétique : "gradient" ou "checker".
    #[arg(long)]
    pub procedural: Option<String>,

    /// Rejouer un artefact vidéo depuis son `<stem>_meta.json`.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Largeur cible en caractères.
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Charset, du plus dense au plus clair.
    #[arg(long)]
    pub charset: Option<String>,

    /// Charset prédéfini : default, detailed, blocks. Ignoré si --charset est fourni.
    #[arg(long)]
    pub preset: Option<String>,

    /// Inverser le charset (fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Couleur truecolor 24 bits.
    #[arg(long, default_value_t = false)]
    pub color: bool,

    /// Forcer la lecture dans le terminal (images comprises).
    #[arg(long, default_value_t = false, conflicts_with = "no_terminal")]
    pub terminal: bool,

    /// Désactiver la lecture dans le terminal.
    #[arg(long, default_value_t = false)]
    pub no_terminal: bool,

    /// Effacer tout l'écran à chaque frame.
    #[arg(long, default_value_t = false)]
    pub clear_each_frame: bool,

    /// Dossier de sortie des artefacts.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Fichier de configuration TOML.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : off, error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: log::LevelFilter,
}

impl Cli {
    /// Validate that exactly one source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.image.is_some())
            + usize::from(self.video.is_some())
            + usize::from(self.procedural.is_some())
            + usize::from(self.replay.is_some());

        if count == 0 {
            anyhow::bail!(
                "Aucune source spécifiée. Utilisez --image, --video, --procedural, ou --replay."
            );
        }
        if count > 1 {
            anyhow::bail!(
                "Une seule source à la fois. Spécifiez --image, --video, --procedural, OU --replay."
            );
        }
        Ok(())
    }

    /// Whether to play in the terminal. Images only play when asked for
    /// explicitly; other sources follow the config unless overridden.
    #[must_use]
    pub fn wants_terminal(&self, config_default: bool) -> bool {
        if self.terminal {
            true
        } else if self.no_terminal || self.image.is_some() {
            false
        } else {
            config_default
        }
    }
}
