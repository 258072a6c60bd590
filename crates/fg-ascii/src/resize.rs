use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use fg_core::error::CoreError;
use fg_core::frame::MediaFrame;

/// Correction hauteur/largeur d'une cellule terminal (~2× plus haute que large).
pub const CELL_ASPECT: f64 = 0.5;

/// Grid size (columns, rows) for a `src_w × src_h` frame at `target_width`.
///
/// `rows = max(1, floor(src_h / src_w * target_width * CELL_ASPECT))`.
///
/// # Example
/// ```
/// use fg_ascii::resize::grid_size;
/// assert_eq!(grid_size(200, 100, 80), (80, 20));
/// assert_eq!(grid_size(2, 2, 2), (2, 1));
/// assert_eq!(grid_size(1000, 1, 10), (10, 1));
/// ```
#[must_use]
pub fn grid_size(src_w: u32, src_h: u32, target_width: u32) -> (u32, u32) {
    let cols = target_width.max(1);
    if src_w == 0 {
        return (cols, 1);
    }
    let rows = (f64::from(src_h) / f64::from(src_w) * f64::from(cols) * CELL_ASPECT).floor();
    (cols, (rows as u32).max(1))
}

/// Resizer par moyenne de zone, réutilisable d'une frame à l'autre.
///
/// Box convolution averages the source pixels each output cell covers,
/// which avoids the aliasing nearest-neighbor sampling gives on downscale.
pub struct AreaResizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Copie de la source (fast_image_resize exige un `&mut`).
    src_buf: Vec<u8>,
}

impl AreaResizer {
    /// Create a resizer configured for area averaging.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` to `width × height`.
    ///
    /// # Errors
    /// `InvalidDimensions` if a side is zero or the source buffer does not
    /// match its declared size.
    ///
    /// # Example
    /// ```
    /// use fg_ascii::resize::AreaResizer;
    /// use fg_core::frame::MediaFrame;
    /// let mut r = AreaResizer::new();
    /// let out = r.resize(&MediaFrame::new(100, 100), 10, 5).unwrap();
    /// assert_eq!((out.width, out.height), (10, 5));
    /// ```
    pub fn resize(
        &mut self,
        src: &MediaFrame,
        width: u32,
        height: u32,
    ) -> Result<MediaFrame, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if src.width == width && src.height == height {
            return Ok(src.clone());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);
        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x3)
                .map_err(|_| CoreError::InvalidDimensions {
                    width: src.width,
                    height: src.height,
                })?;

        let mut dst_data = vec![0u8; MediaFrame::byte_len(width, height)];
        let mut dst_image = Image::from_slice_u8(width, height, &mut dst_data, PixelType::U8x3)
            .map_err(|_| CoreError::InvalidDimensions { width, height })?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| CoreError::ConversionFailed {
                frame_index: 0,
                reason: format!("redimensionnement : {e}"),
            })?;

        MediaFrame::from_rgb(width, height, dst_data)
    }
}

impl Default for AreaResizer {
    fn default() -> Self {
        Self::new()
    }
}
