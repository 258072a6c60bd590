use std::path::PathBuf;

use thiserror::Error;

/// Errors shared by every frameglyph crate.
///
/// Every failure is a deterministic function of the input: nothing in the
/// conversion or playback path retries.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The file could not be decoded (corrupt, unsupported codec, zero-byte).
    #[error("Média illisible : {path} ({reason})")]
    UnreadableMedia {
        /// Path handed to the sampler.
        path: PathBuf,
        /// Decoder diagnostic.
        reason: String,
    },

    /// The container opened but yielded zero decodable frames.
    #[error("Aucune frame décodable dans {path}")]
    EmptyMedia {
        /// Path handed to the sampler.
        path: PathBuf,
    },

    /// Rejected before any decode work (empty charset, zero width, ...).
    #[error("Configuration invalide : {0}")]
    InvalidConfig(String),

    /// Decode failure in the middle of a video. Partial results are dropped.
    #[error("Conversion échouée à la frame {frame_index} : {reason}")]
    ConversionFailed {
        /// Index of the frame that could not be produced.
        frame_index: usize,
        /// Decoder or resizer diagnostic.
        reason: String,
    },

    /// A playback is already running and the policy is to reject.
    #[error("Une lecture est déjà en cours")]
    PlaybackBusy,

    /// The terminal (or any sink) stopped accepting output.
    #[error("Écriture du flux impossible : {0}")]
    StreamWriteFailed(#[source] std::io::Error),

    /// Pixel buffer does not match its declared dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Configuration file could not be read or parsed.
    #[error("Fichier de configuration : {0}")]
    Config(String),
}

impl CoreError {
    /// Shorthand used by the samplers.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadableMedia {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
