use image::{GrayImage, Luma, RgbImage};
use std::path::Path;

use crate::config::DetectionParams;
use crate::error::Result;
use crate::models::BoundingBox;

#[cfg(feature = "opencv")]
use crate::error::WhitenError;
#[cfg(feature = "opencv")]
use opencv::{
    core::{self, Mat, Rect, Scalar, Size, Vector},
    objdetect::CascadeClassifier,
    prelude::*,
};
#[cfg(feature = "opencv")]
use std::sync::Mutex;
#[cfg(feature = "opencv")]
use tracing::debug;

/// Pluggable object detection backend.
///
/// The whitener asks one detector for faces, one for eyes and one for mouths.
/// Implement this trait to swap in a different engine or a fixed set of boxes.
pub trait ObjectDetector: Send + Sync {
    /// Bounding boxes of every object found, in `image` coordinates
    fn detect(&self, image: &RgbImage) -> Result<Vec<BoundingBox>>;

    fn name(&self) -> &str;
}

/// Convert to 8-bit luma with BT.601 weights, the weighting Haar cascades are
/// trained against
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().min(255.0) as u8])
    })
}

/// [`ObjectDetector`] backed by an OpenCV Haar cascade
#[cfg(feature = "opencv")]
pub struct CascadeDetector {
    name: String,
    // detect_multi_scale needs &mut self
    classifier: Mutex<CascadeClassifier>,
    params: DetectionParams,
}

#[cfg(feature = "opencv")]
impl CascadeDetector {
    /// Load the cascade XML at `path`; the file name doubles as the detector name
    pub fn from_file(path: &Path, params: DetectionParams) -> Result<Self> {
        let model_error = |reason: String| WhitenError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };
        if !path.is_file() {
            return Err(model_error("file not found".to_string()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| model_error("path is not valid UTF-8".to_string()))?;

        let classifier = CascadeClassifier::new(path_str).map_err(|e| model_error(e.to_string()))?;
        // OpenCV reports unreadable models as an empty classifier, not an error
        if classifier.empty().map_err(|e| model_error(e.to_string()))? {
            return Err(model_error("not a cascade classifier".to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(path = %path.display(), "loaded cascade");

        Ok(Self {
            name,
            classifier: Mutex::new(classifier),
            params,
        })
    }
}

/// Copy a grayscale buffer into a single-channel Mat
#[cfg(feature = "opencv")]
fn gray_mat(gray: &GrayImage) -> opencv::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        gray.height() as i32,
        gray.width() as i32,
        core::CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(gray.as_raw());
    Ok(mat)
}

#[cfg(feature = "opencv")]
impl ObjectDetector for CascadeDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<BoundingBox>> {
        let detection_error = |e: opencv::Error| WhitenError::Detection(format!("{}: {}", self.name, e));
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }

        let gray = gray_mat(&to_grayscale(image)).map_err(detection_error)?;
        let min_size = self
            .params
            .min_size
            .map(|side| Size::new(side as i32, side as i32))
            .unwrap_or_default();
        let mut found = Vector::<Rect>::new();

        let mut classifier = self
            .classifier
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        classifier
            .detect_multi_scale(
                &gray,
                &mut found,
                self.params.scale_factor,
                i32::try_from(self.params.min_neighbors).unwrap_or(i32::MAX),
                0,
                min_size,
                Size::default(),
            )
            .map_err(detection_error)?;

        Ok(found
            .iter()
            .filter(|r| r.width > 0 && r.height > 0)
            .map(|r| {
                BoundingBox::new(r.x.max(0) as u32, r.y.max(0) as u32, r.width as u32, r.height as u32)
                    .clamp_to(image.width(), image.height())
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Placeholder when the crate is built without OpenCV: loading always fails
#[cfg(not(feature = "opencv"))]
pub struct CascadeDetector;

#[cfg(not(feature = "opencv"))]
impl CascadeDetector {
    pub fn from_file(path: &Path, _params: DetectionParams) -> Result<Self> {
        Err(crate::error::WhitenError::ModelLoad {
            path: path.to_path_buf(),
            reason: "built without the opencv feature".to_string(),
        })
    }
}

#[cfg(not(feature = "opencv"))]
impl ObjectDetector for CascadeDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<BoundingBox>> {
        Err(crate::error::WhitenError::Detection(
            "built without the opencv feature".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "cascade (disabled)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn grayscale_uses_bt601_weights() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0)[0], 76);
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn missing_model_is_a_load_error() {
        let err = CascadeDetector::from_file(Path::new("no/such/cascade.xml"), DetectionParams::default()).err();
        assert!(matches!(err, Some(crate::error::WhitenError::ModelLoad { .. })));
    }
}
