use std::path::Path;

use fg_core::error::CoreError;
use fg_core::frame::MediaFrame;
use fg_core::traits::FrameSource;

/// Cadence d'affichage d'une image fixe dans le terminal (une seule période).
pub const IMAGE_DISPLAY_FPS: f64 = 10.0;

/// Source d'image statique. Une seule frame, rejouable.
///
/// # Example
/// ```no_run
/// use fg_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("test.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: MediaFrame,
    consumed: bool,
}

impl ImageSource {
    /// Decode an image from disk.
    ///
    /// # Errors
    /// `UnreadableMedia` if the image cannot be loaded.
    pub fn new(path: &Path) -> Result<Self, CoreError> {
        Ok(Self {
            frame: load_image(path)?,
            consumed: false,
        })
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;
        Ok(Some(self.frame.clone()))
    }

    fn frame_rate(&self) -> f64 {
        IMAGE_DISPLAY_FPS
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(1)
    }

    fn rewind(&mut self) -> Result<(), CoreError> {
        self.consumed = false;
        Ok(())
    }
}

/// Decode one image file into an RGB frame.
///
/// The format is sniffed from the content, not the extension.
///
/// # Errors
/// `UnreadableMedia` if the file is missing, empty, corrupt or unsupported.
///
/// # Example
/// ```no_run
/// use fg_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("test.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<MediaFrame, CoreError> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| CoreError::unreadable(path, e))?
        .with_guessed_format()
        .map_err(|e| CoreError::unreadable(path, e))?;
    let img = reader
        .decode()
        .map_err(|e| CoreError::unreadable(path, e))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    log::debug!("Image décodée : {width}x{height} : {}", path.display());
    MediaFrame::from_rgb(width, height, rgb.into_raw())
        .map_err(|_| CoreError::unreadable(path, "image vide"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_png(dir: &Path, w: u32, h: u32, rgb: [u8; 3]) -> std::path::PathBuf {
        let path = dir.join("fixture.png");
        let img = image::RgbImage::from_pixel(w, h, image::Rgb(rgb));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn decodes_png_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 3, 2, [10, 200, 30]);
        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.pixel(2, 1), (10, 200, 30));
    }

    #[test]
    fn zero_byte_file_is_unreadable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            load_image(file.path()),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn garbage_is_unreadable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an image").unwrap();
        assert!(matches!(
            load_image(file.path()),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn missing_file_is_unreadable() {
        assert!(matches!(
            load_image(Path::new("/nonexistent/picture.png")),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn image_source_yields_once_then_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 2, 2, [0, 0, 0]);
        let mut src = ImageSource::new(&path).unwrap();
        assert_eq!(src.frame_count_hint(), Some(1));
        assert!((src.frame_rate() - IMAGE_DISPLAY_FPS).abs() < f64::EPSILON);
        assert!(src.next_frame().unwrap().is_some());
        assert!(src.next_frame().unwrap().is_none());
        src.rewind().unwrap();
        assert!(src.next_frame().unwrap().is_some());
    }
}
