use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::{ConversionResult, VideoMeta};

/// Contenu de `<stem>_meta.json`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayManifest {
    /// Timing and geometry.
    #[serde(flatten)]
    pub meta: VideoMeta,
    /// Frame directory, relative to the manifest.
    pub frames_dir: String,
}

/// Fichiers produits par une conversion.
#[derive(Debug)]
pub enum SavedArtifact {
    /// `<stem>_ascii.txt`
    Image { text: PathBuf },
    /// `<stem>_frames/`, `<stem>_meta.json`, `<stem>_howto.txt`
    Video {
        frames_dir: PathBuf,
        manifest: PathBuf,
        howto: PathBuf,
    },
}

impl SavedArtifact {
    /// Main file to show the user.
    #[must_use]
    pub fn primary(&self) -> &Path {
        match self {
            Self::Image { text } => text,
            Self::Video { manifest, .. } => manifest,
        }
    }
}

/// Nom de fichier d'une frame.
#[must_use]
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:05}.txt")
}

/// Écrit le résultat d'une conversion sous `out_dir`.
///
/// Video frames are written into a scratch directory that is renamed into
/// place once complete, so a failed write leaves no half-filled frame set.
///
/// # Errors
/// Any filesystem error.
pub fn persist(result: &ConversionResult, out_dir: &Path, stem: &str) -> Result<SavedArtifact> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Impossible de créer {}", out_dir.display()))?;

    match result {
        ConversionResult::Image { rendered, .. } => {
            let text = out_dir.join(format!("{stem}_ascii.txt"));
            fs::write(&text, rendered)
                .with_context(|| format!("Écriture de {}", text.display()))?;
            log::info!("Artefact image: {}", text.display());
            Ok(SavedArtifact::Image { text })
        }
        ConversionResult::Video { frames, meta } => {
            let dir_name = format!("{stem}_frames");
            let frames_dir = out_dir.join(&dir_name);
            let scratch = out_dir.join(format!(".{dir_name}.partial"));
            if scratch.exists() {
                fs::remove_dir_all(&scratch)?;
            }
            fs::create_dir_all(&scratch)?;

            let written: Result<()> = frames.iter().enumerate().try_for_each(|(i, frame)| {
                let path = scratch.join(frame_file_name(i));
                fs::write(&path, frame.render()).with_context(|| format!("Écriture de {}", path.display()))
            });
            if let Err(e) = written {
                let _ = fs::remove_dir_all(&scratch);
                return Err(e);
            }
            if frames_dir.exists() {
                fs::remove_dir_all(&frames_dir)
                    .with_context(|| format!("Remplacement de {}", frames_dir.display()))?;
            }
            fs::rename(&scratch, &frames_dir)?;

            let manifest = out_dir.join(format!("{stem}_meta.json"));
            let doc = ReplayManifest {
                meta: meta.clone(),
                frames_dir: dir_name.clone(),
            };
            fs::write(&manifest, serde_json::to_string_pretty(&doc)?)
                .with_context(|| format!("Écriture de {}", manifest.display()))?;

            let howto = out_dir.join(format!("{stem}_howto.txt"));
            fs::write(&howto, howto_text(stem, &dir_name, meta))?;

            log::info!(
                "Artefact vidéo: {} frames dans {}",
                frames.len(),
                frames_dir.display()
            );
            Ok(SavedArtifact::Video {
                frames_dir,
                manifest,
                howto,
            })
        }
    }
}

fn howto_text(stem: &str, dir_name: &str, meta: &VideoMeta) -> String {
    format!(
        "frameglyph : {stem}\n\
         \n\
         {count} frames texte ({width}×{rows} caractères{color}) dans {dir_name}/,\n\
         une par fichier, nommées frame_00000.txt, frame_00001.txt, ...\n\
         Cadence d'origine : {fps:.3} images/s (une frame toutes les {period:.1} ms).\n\
         \n\
         Pour rejouer dans un terminal (≥ {width} colonnes) :\n\
         \n\
         \x20   frameglyph --replay {stem}_meta.json\n\
         \n\
         Un autre lecteur doit, pour chaque frame : replacer le curseur en haut\n\
         à gauche (ESC[H), écrire le fichier, puis attendre jusqu'à\n\
         début + (i + 1) / {fps:.3} secondes.\n",
        count = meta.frame_count,
        width = meta.target_width,
        rows = meta.rows,
        color = if meta.color { ", couleur 24 bits" } else { "" },
        fps = meta.frame_rate,
        period = 1000.0 / meta.frame_rate,
    )
}

/// Recharge un artefact vidéo depuis son manifeste.
///
/// # Errors
/// Manifest unreadable or malformed, or a frame file missing.
pub fn load_replay(manifest_path: &Path) -> Result<(Vec<String>, VideoMeta)> {
    let text = fs::read_to_string(manifest_path)
        .with_context(|| format!("Lecture de {}", manifest_path.display()))?;
    let doc: ReplayManifest = serde_json::from_str(&text)
        .with_context(|| format!("Manifeste invalide : {}", manifest_path.display()))?;

    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let dir = base.join(&doc.frames_dir);
    let frames = (0..doc.meta.frame_count)
        .map(|i| {
            let path = dir.join(frame_file_name(i));
            fs::read_to_string(&path).with_context(|| format!("Frame manquante : {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("Replay chargé: {} frames depuis {}", frames.len(), dir.display());
    Ok((frames, doc.meta))
}

/// Stem used for artifact names: the input file name without extension.
#[must_use]
pub fn artifact_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "media".to_string())
}
