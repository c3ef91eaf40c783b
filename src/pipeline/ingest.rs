use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use ndarray::Array2;

use super::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// IntensityImage – the numeric form of a loaded image
// ---------------------------------------------------------------------------

/// 8-bit single-channel intensity, indexed `[[row, col]]` with shape (H, W).
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityImage {
    data: Array2<u8>,
}

impl IntensityImage {
    /// Wrap an existing array. Returns `None` for an empty array.
    pub fn from_array(data: Array2<u8>) -> Option<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return None;
        }
        Some(Self { data })
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    /// Intensity as `f64`, the form every numeric stage consumes.
    pub fn to_f64(&self) -> Array2<f64> {
        self.data.mapv(f64::from)
    }
}

#[cfg(test)]
impl IntensityImage {
    /// Image filled with one value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            data: Array2::from_elem((height.max(1), width.max(1)), value),
        }
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

// ---------------------------------------------------------------------------
// Grayscale conversion
// ---------------------------------------------------------------------------

/// ITU-R 601-2 luma in 16.16 fixed point, rounded to nearest.
///
/// A gray pixel (r = g = b) maps to itself exactly.
pub fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    l as u8
}

/// Convert any decoded image to an [`IntensityImage`]. Alpha is ignored.
pub fn to_intensity(image: &DynamicImage) -> Option<IntensityImage> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width == 0 || height == 0 {
        return None;
    }

    let data = match image {
        DynamicImage::ImageLuma8(gray) => {
            Array2::from_shape_vec((height, width), gray.as_raw().clone()).ok()?
        }
        other => {
            let rgb = other.to_rgb8();
            let luma: Vec<u8> = rgb
                .pixels()
                .map(|p| luma_601(p[0], p[1], p[2]))
                .collect();
            Array2::from_shape_vec((height, width), luma).ok()?
        }
    };
    IntensityImage::from_array(data)
}

// ---------------------------------------------------------------------------
// LoadedImage – numeric data plus the colour original for display
// ---------------------------------------------------------------------------

/// A decoded image file.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub intensity: IntensityImage,
    /// Colour original, used only for the thumbnail.
    pub original: DynamicImage,
}

impl LoadedImage {
    /// Build from an already decoded image (file-less callers and tests).
    pub fn from_dynamic(path: PathBuf, original: DynamicImage) -> PipelineResult<Self> {
        let intensity = to_intensity(&original).ok_or_else(|| PipelineError::ImageLoad {
            path: path.display().to_string(),
            reason: "image has no pixels".to_string(),
        })?;
        Ok(Self {
            path,
            intensity,
            original,
        })
    }

    /// Square thumbnail of the colour original. Never used numerically.
    pub fn thumbnail(&self, size: u32) -> RgbaImage {
        self.original
            .resize_exact(size, size, FilterType::Lanczos3)
            .to_rgba8()
    }
}

/// Load and decode an image file.
///
/// Any format enabled in the `image` crate features is accepted; the format
/// is guessed from the file contents, not the extension.
pub fn load_image(path: &Path) -> PipelineResult<LoadedImage> {
    let load_error = |reason: String| PipelineError::ImageLoad {
        path: path.display().to_string(),
        reason,
    };

    let reader = image::ImageReader::open(path)
        .map_err(|e| load_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| load_error(e.to_string()))?;
    let original = reader.decode().map_err(|e| load_error(e.to_string()))?;

    let loaded = LoadedImage::from_dynamic(path.to_path_buf(), original)?;
    log::info!(
        "Loaded {} ({}x{})",
        path.display(),
        loaded.intensity.width(),
        loaded.intensity.height()
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn luma_keeps_gray_values() {
        for v in [0u8, 1, 17, 128, 254, 255] {
            assert_eq!(luma_601(v, v, v), v);
        }
    }

    #[test]
    fn luma_uses_601_weights() {
        // 0.299 * 255 = 76.245
        assert_eq!(luma_601(255, 0, 0), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(luma_601(0, 255, 0), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(luma_601(0, 0, 255), 29);
    }

    #[test]
    fn grayscale_image_is_indexed_row_col() {
        let mut gray = GrayImage::new(3, 2);
        gray.put_pixel(2, 1, Luma([200]));
        let intensity = to_intensity(&DynamicImage::ImageLuma8(gray)).unwrap();

        assert_eq!(intensity.dim(), (2, 3));
        assert_eq!(intensity.width(), 3);
        assert_eq!(intensity.height(), 2);
        assert_eq!(intensity.data()[[1, 2]], 200);
        assert_eq!(intensity.data()[[0, 0]], 0);
    }

    #[test]
    fn colour_image_is_converted() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let intensity = to_intensity(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert!(intensity.data().iter().all(|&v| v == 76));
    }

    #[test]
    fn alpha_is_ignored() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 0]));
        let intensity = to_intensity(&DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(intensity.data()[[0, 0]], 100);
    }

    #[test]
    fn empty_array_is_rejected() {
        assert!(IntensityImage::from_array(Array2::zeros((0, 4))).is_none());
    }

    #[test]
    fn thumbnail_has_requested_size() {
        let gray = GrayImage::from_pixel(7, 3, Luma([9]));
        let loaded =
            LoadedImage::from_dynamic(PathBuf::from("mem.png"), DynamicImage::ImageLuma8(gray))
                .unwrap();
        let thumb = loaded.thumbnail(25);
        assert_eq!(thumb.dimensions(), (25, 25));
        // numeric path keeps the original size
        assert_eq!(loaded.intensity.dim(), (3, 7));
    }

    #[test]
    fn missing_file_is_image_load_error() {
        let err = load_image(Path::new("/nonexistent/si.png")).unwrap_err();
        assert!(matches!(err, PipelineError::ImageLoad { .. }));
    }

    #[test]
    fn garbage_file_is_image_load_error() {
        let path = std::env::temp_dir().join(format!("tbb-garbage-{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not an image").unwrap();
        let result = load_image(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(PipelineError::ImageLoad { .. })));
    }

    #[test]
    fn png_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("tbb-ingest-{}.png", std::process::id()));
        GrayImage::from_pixel(4, 5, Luma([42])).save(&path).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.intensity.dim(), (5, 4));
        assert!(loaded.intensity.data().iter().all(|&v| v == 42));
    }
}
