//! Image files to intensity vectors.
//!
//! Decoding goes through the `image` crate (PNM, PNG and JPEG are enabled).
//! Every image is converted to 8-bit luma and flattened row-major, so pixel
//! `(x, y)` lands at index `y·width + x`.

use std::path::Path;

use image::GrayImage;

use crate::error::FaceError;

/// Extensions accepted when scanning a directory (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["pgm", "ppm", "pnm", "png", "jpg", "jpeg"];

/// A decoded grayscale image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceImage {
    pub width: u32,
    pub height: u32,
    /// Row-major intensities in `[0, 255]`.
    pub pixels: Vec<f64>,
}

impl FaceImage {
    pub fn from_gray(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.as_raw().iter().map(|&v| f64::from(v)).collect(),
        }
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Whether `path` has one of the accepted image extensions.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode `path` to grayscale, optionally enforcing `(width, height)`.
pub fn load_image(path: &Path, expected: Option<(u32, u32)>) -> Result<FaceImage, FaceError> {
    let decoded = image::open(path).map_err(|e| FaceError::image(path, e.to_string()))?;
    let face = FaceImage::from_gray(&decoded.to_luma8());

    if let Some((w, h)) = expected {
        if face.dims() != (w, h) {
            return Err(FaceError::image(
                path,
                format!("is {}x{}, expected {w}x{h}", face.width, face.height),
            ));
        }
    }
    Ok(face)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fisherface-raster-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn gray_image_is_flattened_row_major() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(10 * y + x) as u8]));
        let face = FaceImage::from_gray(&img);
        assert_eq!(face.dims(), (3, 2));
        assert_eq!(face.pixels, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image_path(Path::new("faces/1.PPM")));
        assert!(is_image_path(Path::new("faces/2.pgm")));
        assert!(!is_image_path(Path::new("faces/notes.txt")));
        assert!(!is_image_path(Path::new("faces/README")));
    }

    #[test]
    fn load_round_trips_a_pgm_file() {
        let dir = scratch_dir("image-load");
        let path = dir.join("face.pgm");
        GrayImage::from_fn(4, 3, |x, y| Luma([(x + 4 * y) as u8 * 20]))
            .save(&path)
            .unwrap();

        let face = load_image(&path, Some((4, 3))).unwrap();
        assert_eq!(face.pixels.len(), 12);
        assert_eq!(face.pixels[5], 100.0);

        let err = load_image(&path, Some((3, 4))).unwrap_err();
        assert!(matches!(err, FaceError::Image { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = load_image(Path::new("/nonexistent/face.ppm"), None).unwrap_err();
        assert!(matches!(err, FaceError::Image { .. }));
    }
}
