use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fg_app::artifact;
use fg_app::cli::Cli;
use fg_app::control::Engine;
use fg_app::pipeline::ConversionResult;
use fg_core::MediaKind;
use fg_core::charset;
use fg_core::config::AppConfig;
use fg_player::player::PlaybackStatus;
use fg_source::procedural::create_procedural_source;

/// Taille des frames synthétiques (pixels).
const PROCEDURAL_SIZE: (u32, u32) = (320, 180);
/// Durée d'une démo synthétique, en frames.
const PROCEDURAL_FRAMES: usize = 96;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging (stderr, jamais mêlé aux frames)
    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let config = apply_overrides(resolve_config(&cli)?, &cli)?;
    let play = cli.wants_terminal(config.playback.terminal);
    let engine = Arc::new(Engine::new(config));

    // 5. Ctrl-C : arrêter la lecture en cours, sinon quitter
    let stopper = Arc::clone(&engine);
    if let Err(e) = ctrlc::set_handler(move || {
        if !stopper.stop() {
            std::process::exit(130);
        }
    }) {
        log::warn!("Gestionnaire Ctrl-C non installé : {e}");
    }

    // 6. Replay d'un artefact existant
    if let Some(ref manifest) = cli.replay {
        let (frames, meta) = artifact::load_replay(manifest)?;
        return play_frames(&engine, frames.into(), meta.frame_rate);
    }

    // 7. Conversion
    let request = engine.default_request();
    let (result, stem) = if let Some(ref path) = cli.image {
        let result = engine
            .start_conversion(path, &request, MediaKind::Image)
            .with_context(|| format!("Conversion de {}", path.display()))?;
        (result, artifact::artifact_stem(path))
    } else if let Some(ref path) = cli.video {
        let result = engine
            .start_conversion(path, &request, MediaKind::Video)
            .with_context(|| format!("Conversion de {}", path.display()))?;
        (result, artifact::artifact_stem(path))
    } else if let Some(ref name) = cli.procedural {
        let (w, h) = PROCEDURAL_SIZE;
        let fps = engine.config().playback.fallback_fps;
        let mut source = create_procedural_source(name, w, h, fps, PROCEDURAL_FRAMES)?;
        let result = engine.convert_source(source.as_mut(), &request, Path::new(name))?;
        (result, name.to_lowercase())
    } else {
        anyhow::bail!("Aucune source.");
    };

    log::info!("Conversion : {} frame(s)", result.frame_count());

    // 8. Persister l'artefact (uniquement après une conversion complète)
    let saved = artifact::persist(&result, &engine.config().output.dir, &stem)?;

    let primary = saved.primary().display().to_string();

    // 9. Lecture terminal
    if play {
        let (frames, fps) = result.into_playback();
        play_frames(&engine, frames, fps)?;
    } else if let ConversionResult::Image { ref rendered, .. } = result {
        log::debug!("Image rendue ({} octets)", rendered.len());
    }

    println!("Artefact : {primary}");
    Ok(())
}

/// Joue des frames sur stdout et attend la fin.
///
/// A broken terminal is reported but does not fail the run: the artifact is
/// already on disk.
fn play_frames(engine: &Engine, frames: Arc<[String]>, frame_rate: f64) -> Result<()> {
    let handle = engine.start_playback(frames, frame_rate, engine.terminal_sink())?;
    let Some(outcome) = handle.wait() else {
        anyhow::bail!("Lecture interrompue sans bilan");
    };
    match outcome.status {
        PlaybackStatus::Completed => {
            log::info!("Lecture complète ({} frames)", outcome.frames_rendered);
        }
        PlaybackStatus::Cancelled => {
            eprintln!("Lecture annulée après la frame {:?}", outcome.last_rendered);
        }
        PlaybackStatus::Failed => {
            if let Some(e) = outcome.failure {
                eprintln!("Lecture échouée : {e}");
            }
        }
    }
    Ok(())
}

/// Charge `--config` s'il existe, sinon les défauts.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    if cli.config.exists() {
        Ok(fg_core::config::load_config(&cli.config)?)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(AppConfig::default())
    }
}

/// Les options de ligne de commande priment sur le fichier.
fn apply_overrides(mut config: AppConfig, cli: &Cli) -> Result<AppConfig> {
    if let Some(width) = cli.width {
        config.conversion.width = width;
    }
    if let Some(ref charset) = cli.charset {
        config.conversion.charset.clone_from(charset);
    } else if let Some(ref name) = cli.preset {
        let Some(glyphs) = charset::preset(name) else {
            anyhow::bail!("Preset inconnu : {name}. Supportés : default, detailed, blocks");
        };
        config.conversion.charset = glyphs.to_string();
    }
    if cli.invert {
        config.conversion.invert = true;
    }
    if cli.color {
        config.conversion.color = true;
    }
    if cli.clear_each_frame {
        config.playback.clear_each_frame = true;
    }
    if let Some(ref out) = cli.out {
        config.output.dir.clone_from(out);
    }
    Ok(config)
}
