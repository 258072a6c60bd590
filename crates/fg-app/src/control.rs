use std::path::Path;
use std::sync::Arc;

use fg_core::config::{AppConfig, ConversionConfig, ConversionDefaults};
use fg_core::error::CoreError;
use fg_core::traits::{FrameSink, FrameSource};
use fg_core::MediaKind;
use fg_player::session::{PlaybackController, PlaybackHandle};
use fg_player::sink::TerminalSink;

use crate::pipeline::{self, ConversionResult};

/// Paramètres utilisateur d'une conversion, pas encore validés.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Target characters per row.
    pub width: u32,
    /// Charset, densest first.
    pub charset: String,
    /// Traverse the charset in reverse.
    pub invert: bool,
    /// Emit truecolor escapes.
    pub color: bool,
}

impl ConversionRequest {
    /// Validate into an immutable config.
    ///
    /// # Errors
    /// `InvalidConfig` for a zero or oversized width or an unusable charset.
    pub fn to_config(&self) -> Result<ConversionConfig, CoreError> {
        ConversionConfig::new(self.width, &self.charset, self.invert, self.color)
    }
}

impl From<&ConversionDefaults> for ConversionRequest {
    fn from(d: &ConversionDefaults) -> Self {
        Self {
            width: d.width,
            charset: d.charset.clone(),
            invert: d.invert,
            color: d.color,
        }
    }
}

/// Surface de contrôle : conversions indépendantes, une lecture à la fois.
///
/// Conversions share nothing and may run concurrently from several threads.
/// Playback goes through a single [`PlaybackController`] that applies the
/// configured busy policy.
pub struct Engine {
    config: AppConfig,
    player: PlaybackController,
}

impl Engine {
    /// Engine for `config`.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let player = PlaybackController::new(config.playback.busy_policy);
        Self { config, player }
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Request built from the configured defaults.
    #[must_use]
    pub fn default_request(&self) -> ConversionRequest {
        ConversionRequest::from(&self.config.conversion)
    }

    /// Convert the file at `path`. The request is validated before any
    /// decode work.
    ///
    /// # Errors
    /// `InvalidConfig`, `UnreadableMedia`, `EmptyMedia` or `ConversionFailed`.
    pub fn start_conversion(
        &self,
        path: &Path,
        request: &ConversionRequest,
        kind: MediaKind,
    ) -> Result<ConversionResult, CoreError> {
        let config = request.to_config()?;
        pipeline::convert(path, &config, kind, self.config.playback.fallback_fps)
    }

    /// Convert frames pulled from an already-open source.
    ///
    /// # Errors
    /// Same as [`start_conversion`](Self::start_conversion).
    pub fn convert_source(
        &self,
        source: &mut dyn FrameSource,
        request: &ConversionRequest,
        origin: &Path,
    ) -> Result<ConversionResult, CoreError> {
        let config = request.to_config()?;
        pipeline::convert_source(source, &config, origin)
    }

    /// Start playing rendered frames into `sink`.
    ///
    /// # Errors
    /// `PlaybackBusy` under the `Reject` policy while another playback runs,
    /// `InvalidConfig` for a non-positive frame rate.
    pub fn start_playback(
        &self,
        frames: impl Into<Arc<[String]>>,
        frame_rate: f64,
        sink: Box<dyn FrameSink>,
    ) -> Result<PlaybackHandle, CoreError> {
        self.player.start(frames, frame_rate, sink)
    }

    /// Sink on stdout honouring `clear_each_frame`.
    #[must_use]
    pub fn terminal_sink(&self) -> Box<dyn FrameSink> {
        Box::new(TerminalSink::stdout(self.config.playback.clear_each_frame))
    }

    /// Cancel one playback.
    pub fn cancel_playback(&self, handle: &PlaybackHandle) {
        self.player.cancel(handle);
    }

    /// Stop whatever is playing. Returns `false` if nothing was.
    pub fn stop(&self) -> bool {
        self.player.cancel_active()
    }

    /// `true` while a playback runs.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.player.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_core::config::BusyPolicy;
    use fg_player::player::PlaybackStatus;
    use fg_player::sink::CaptureSink;
    use fg_source::procedural::{Pattern, SyntheticSource};

    fn request(charset: &str) -> ConversionRequest {
        ConversionRequest {
            width: 20,
            charset: charset.to_string(),
            invert: false,
            color: false,
        }
    }

    #[test]
    fn empty_charset_is_rejected_before_decoding() {
        let engine = Engine::new(AppConfig::default());
        // Le fichier n'existe pas : seule la validation peut répondre InvalidConfig.
        for kind in [MediaKind::Image, MediaKind::Video] {
            assert!(matches!(
                engine.start_conversion(Path::new("/nonexistent/input"), &request(""), kind),
                Err(CoreError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn zero_width_is_rejected() {
        let engine = Engine::new(AppConfig::default());
        let mut req = request("@ ");
        req.width = 0;
        assert!(matches!(
            engine.start_conversion(Path::new("x.png"), &req, MediaKind::Image),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_byte_video_yields_unreadable_and_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("vide.mp4");
        std::fs::write(&input, b"").unwrap();
        let out = dir.path().join("outputs");

        let engine = Engine::new(AppConfig::default());
        let result = engine.start_conversion(&input, &request("@ "), MediaKind::Video);
        assert!(matches!(result, Err(CoreError::UnreadableMedia { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn synthetic_video_converts_then_plays_and_cancels() {
        let engine = Engine::new(AppConfig::default());
        let mut src = SyntheticSource::new(Pattern::Gradient, 40, 20, 10.0, 10).unwrap();
        let result = engine
            .convert_source(&mut src, &request("@%#*+=-:. "), Path::new("gradient"))
            .unwrap();
        let (frames, fps) = result.into_playback();
        assert_eq!(frames.len(), 10);

        let capture = CaptureSink::new();
        let handle = engine
            .start_playback(Arc::clone(&frames), fps, Box::new(capture.clone()))
            .unwrap();
        // Attendre que la frame 2 soit écrite, puis arrêter.
        while handle.position() < 3 {
            std::thread::yield_now();
        }
        engine.cancel_playback(&handle);
        let outcome = handle.wait().unwrap();
        assert_eq!(outcome.status, PlaybackStatus::Cancelled);
        let written = capture.frames();
        assert!(written.len() < frames.len());
        assert_eq!(written[..], frames[..written.len()]);
    }

    #[test]
    fn busy_policy_comes_from_config() {
        let mut config = AppConfig::default();
        config.playback.busy_policy = BusyPolicy::Reject;
        let engine = Engine::new(config);
        let frames: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let first = engine
            .start_playback(frames.clone(), 5.0, Box::new(CaptureSink::new()))
            .unwrap();
        assert!(engine.is_playing());
        assert!(matches!(
            engine.start_playback(frames, 5.0, Box::new(CaptureSink::new())),
            Err(CoreError::PlaybackBusy)
        ));
        assert!(engine.stop());
        assert_eq!(first.wait().unwrap().status, PlaybackStatus::Cancelled);
    }
}
