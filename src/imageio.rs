use image::{ImageReader, RgbImage};
use std::path::Path;

use crate::error::{Result, WhitenError};

/// Decode an image file into 8-bit RGB
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image_error = |reason: String| WhitenError::ImageLoad {
        path: path.to_path_buf(),
        reason,
    };
    let img = ImageReader::open(path)
        .map_err(|e| image_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| image_error(e.to_string()))?
        .decode()
        .map_err(|e| image_error(format!("failed to decode image: {}", e)))?;
    Ok(img.to_rgb8())
}

/// Encode `img` to `path`, the format following the file extension
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    img.save(path)
        .map_err(|e| WhitenError::unwritable(path, e))
}
