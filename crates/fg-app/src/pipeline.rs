use std::path::Path;
use std::sync::Arc;

use fg_ascii::mapper::GlyphMapper;
use fg_ascii::resize::grid_size;
use fg_core::config::ConversionConfig;
use fg_core::error::CoreError;
use fg_core::frame::{MediaFrame, TextFrame};
use fg_core::traits::FrameSource;
use fg_core::MediaKind;
use fg_source::image::ImageSource;
pub use fg_source::image::IMAGE_DISPLAY_FPS;
use fg_source::video::VideoSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Métadonnées d'une conversion vidéo, suffisantes pour la rejouer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    /// Nominal rate of the source container.
    pub frame_rate: f64,
    /// Number of text frames produced.
    pub frame_count: usize,
    /// Columns per frame.
    pub target_width: u32,
    /// Rows per frame.
    pub rows: u32,
    /// Frames carry truecolor escapes.
    pub color: bool,
}

/// Résultat d'une conversion réussie. Jamais partiel.
#[derive(Debug)]
pub enum ConversionResult {
    /// Single still image.
    Image {
        /// Cell grid.
        frame: TextFrame,
        /// Rendered string form of `frame`.
        rendered: String,
    },
    /// Ordered text frames of a video.
    Video {
        /// One frame per source frame, in temporal order.
        frames: Vec<TextFrame>,
        /// Timing and geometry.
        meta: VideoMeta,
    },
}

impl ConversionResult {
    /// Rendered frames and pacing rate for the player.
    ///
    /// Consumes the result; each cell grid is dropped once rendered.
    #[must_use]
    pub fn into_playback(self) -> (Arc<[String]>, f64) {
        match self {
            Self::Image { rendered, .. } => (Arc::from(vec![rendered]), IMAGE_DISPLAY_FPS),
            Self::Video { frames, meta } => (
                frames.into_iter().map(|f| f.render()).collect(),
                meta.frame_rate,
            ),
        }
    }

    /// Number of text frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Image { .. } => 1,
            Self::Video { frames, .. } => frames.len(),
        }
    }
}

/// Convertit un fichier selon son type déclaré.
///
/// # Errors
/// See [`convert_image`] and [`convert_video`].
pub fn convert(
    path: &Path,
    config: &ConversionConfig,
    kind: MediaKind,
    fallback_fps: f64,
) -> Result<ConversionResult, CoreError> {
    match kind {
        MediaKind::Image => convert_image(path, config),
        MediaKind::Video => {
            let mut source = VideoSource::open_with_fallback(path, fallback_fps)?;
            convert_source(&mut source, config, path)
        }
    }
}

/// Image → une `TextFrame`.
///
/// # Errors
/// `UnreadableMedia` if the file cannot be decoded.
pub fn convert_image(path: &Path, config: &ConversionConfig) -> Result<ConversionResult, CoreError> {
    let mut source = ImageSource::new(path)?;
    let pixels = source.next_frame()?.ok_or_else(|| CoreError::EmptyMedia {
        path: path.to_path_buf(),
    })?;
    let frame = GlyphMapper::new(config).map(&pixels)?;
    let rendered = frame.render();
    log::info!(
        "Image convertie: {} → {}×{} cellules",
        path.display(),
        frame.width(),
        frame.height()
    );
    Ok(ConversionResult::Image { frame, rendered })
}

/// Vidéo → séquence ordonnée de frames texte.
///
/// # Errors
/// `UnreadableMedia` / `EmptyMedia` from the sampler, `ConversionFailed` on a
/// mid-stream error. No partial result is ever returned.
pub fn convert_video(
    path: &Path,
    config: &ConversionConfig,
    fallback_fps: f64,
) -> Result<ConversionResult, CoreError> {
    convert(path, config, MediaKind::Video, fallback_fps)
}

/// Draine `source` et mappe ses frames par lots parallèles, dans l'ordre.
///
/// `origin` names the input in errors.
///
/// # Errors
/// `EmptyMedia` if the source yields nothing, `ConversionFailed` (with the
/// index of the failing frame) for any error after the first frame.
pub fn convert_source(
    source: &mut dyn FrameSource,
    config: &ConversionConfig,
    origin: &Path,
) -> Result<ConversionResult, CoreError> {
    let frame_rate = source.frame_rate();
    let batch_len = rayon::current_num_threads().max(1) * 2;
    let mut frames: Vec<TextFrame> = Vec::with_capacity(source.frame_count_hint().unwrap_or(0));
    let mut batch: Vec<MediaFrame> = Vec::with_capacity(batch_len);
    let mut rows = 0u32;

    log::info!(
        "Conversion: {} @ {frame_rate:.3}fps, largeur {}",
        origin.display(),
        config.target_width()
    );

    loop {
        let index = frames.len() + batch.len();
        let next = source.next_frame().map_err(|e| mid_stream(e, index))?;
        let exhausted = next.is_none();
        if let Some(frame) = next {
            if index == 0 {
                rows = grid_size(frame.width, frame.height, config.target_width()).1;
            }
            batch.push(frame);
        }
        if batch.len() == batch_len || (exhausted && !batch.is_empty()) {
            let base = frames.len();
            let mapped: Result<Vec<TextFrame>, CoreError> = batch
                .par_iter()
                .enumerate()
                .map_init(
                    || GlyphMapper::new(config),
                    |mapper, (i, frame)| {
                        mapper.map(frame).map_err(|e| mid_stream(e, base + i))
                    },
                )
                .collect();
            frames.extend(mapped?);
            batch.clear();
        }
        if exhausted {
            break;
        }
    }

    if frames.is_empty() {
        return Err(CoreError::EmptyMedia {
            path: origin.to_path_buf(),
        });
    }

    let meta = VideoMeta {
        frame_rate,
        frame_count: frames.len(),
        target_width: config.target_width(),
        rows,
        color: config.color_enabled(),
    };
    log::info!(
        "Conversion terminée: {} frames {}×{}",
        meta.frame_count,
        meta.target_width,
        meta.rows
    );
    Ok(ConversionResult::Video { frames, meta })
}

/// Une erreur après la première frame devient `ConversionFailed`.
fn mid_stream(error: CoreError, frame_index: usize) -> CoreError {
    match error {
        CoreError::ConversionFailed { .. } => error,
        e if frame_index == 0 => e,
        e => CoreError::ConversionFailed {
            frame_index,
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_source::procedural::{FrameSequence, Pattern, SyntheticSource};

    /// Source qui échoue à la frame `at`.
    struct FailingAt {
        at: usize,
        cursor: usize,
    }

    impl FrameSource for FailingAt {
        fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> {
            if self.cursor == self.at {
                return Err(CoreError::unreadable("clip.mp4", "paquet corrompu"));
            }
            self.cursor += 1;
            Ok(Some(MediaFrame::new(8, 8)))
        }

        fn frame_rate(&self) -> f64 {
            25.0
        }

        fn frame_count_hint(&self) -> Option<usize> {
            None
        }

        fn rewind(&mut self) -> Result<(), CoreError> {
            self.cursor = 0;
            Ok(())
        }
    }

    fn cfg() -> ConversionConfig {
        ConversionConfig::new(16, "@%#*+=-:. ", false, false).unwrap()
    }

    #[test]
    fn video_frames_keep_source_order() {
        let frames: Vec<MediaFrame> = (0..40u8)
            .map(|i| MediaFrame::filled(8, 8, (i * 6, i * 6, i * 6)))
            .collect();
        let expected: Vec<TextFrame> = frames
            .iter()
            .map(|f| GlyphMapper::new(&cfg()).map(f).unwrap())
            .collect();
        let mut seq = FrameSequence::new(frames, 12.0);

        let result = convert_source(&mut seq, &cfg(), Path::new("seq")).unwrap();
        let ConversionResult::Video { frames, meta } = result else {
            panic!("résultat vidéo attendu");
        };
        assert_eq!(frames, expected);
        assert_eq!(meta.frame_count, 40);
        assert!((meta.frame_rate - 12.0).abs() < f64::EPSILON);
        assert_eq!((meta.target_width, meta.rows), (16, 8));
    }

    #[test]
    fn all_frames_share_dimensions() {
        let mut src = SyntheticSource::new(Pattern::Checker, 64, 32, 10.0, 10).unwrap();
        let (cols, rows) = grid_size(64, 32, 16);
        assert_eq!((cols, rows), (16, 4));

        let result = convert_source(&mut src, &cfg(), Path::new("checker")).unwrap();
        let ConversionResult::Video { frames: grids, .. } = &result else {
            panic!("résultat vidéo attendu");
        };
        assert!(grids.iter().all(|g| (g.width(), g.height()) == (cols, rows)));
        let rendered: Vec<String> = grids.iter().map(TextFrame::render).collect();

        let (played, fps) = result.into_playback();
        assert!((fps - 10.0).abs() < f64::EPSILON);
        assert_eq!(played[..], rendered[..]);
        for f in played.iter() {
            let lines: Vec<&str> = f.split('\n').collect();
            assert_eq!(lines.len(), rows as usize);
            assert!(lines.iter().all(|l| l.chars().count() == cols as usize));
        }
    }

    #[test]
    fn mid_stream_failure_discards_everything() {
        let mut src = FailingAt { at: 5, cursor: 0 };
        match convert_source(&mut src, &cfg(), Path::new("clip.mp4")) {
            Err(CoreError::ConversionFailed { frame_index, .. }) => assert_eq!(frame_index, 5),
            other => panic!("ConversionFailed attendu, obtenu {other:?}"),
        }
    }

    #[test]
    fn failure_on_first_frame_keeps_its_kind() {
        let mut src = FailingAt { at: 0, cursor: 0 };
        assert!(matches!(
            convert_source(&mut src, &cfg(), Path::new("clip.mp4")),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn empty_source_is_empty_media() {
        let mut seq = FrameSequence::new(Vec::new(), 24.0);
        assert!(matches!(
            convert_source(&mut seq, &cfg(), Path::new("vide")),
            Err(CoreError::EmptyMedia { .. })
        ));
    }

    #[test]
    fn zero_byte_video_is_unreadable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            convert_video(file.path(), &cfg(), 24.0),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn image_conversion_renders_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blanc.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        let config = ConversionConfig::new(2, "@ ", false, false).unwrap();
        let result = convert_image(&path, &config).unwrap();
        let ConversionResult::Image { frame, rendered } = result else {
            panic!("résultat image attendu");
        };
        assert_eq!((frame.width(), frame.height()), (2, 1));
        assert_eq!(rendered, "  ");

        let result = ConversionResult::Image { frame, rendered };
        let (played, fps) = result.into_playback();
        assert_eq!(played[..], ["  ".to_string()]);
        assert!((fps - IMAGE_DISPLAY_FPS).abs() < f64::EPSILON);
    }
}
