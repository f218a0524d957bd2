use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::config::MaskThresholds;

/// Whether a pixel is strongly red and green but not saturated in blue
pub fn is_yellow(pixel: &Rgb<u8>, thresholds: &MaskThresholds) -> bool {
    let [red, green, blue] = pixel.0;
    red > thresholds.red_min && green > thresholds.green_min && blue < thresholds.blue_max
}

/// Binary mask (0/255) of tooth-coloured pixels in a mouth region
pub fn tooth_mask(region: &RgbImage, thresholds: &MaskThresholds) -> GrayImage {
    GrayImage::from_fn(region.width(), region.height(), |x, y| {
        if is_yellow(region.get_pixel(x, y), thresholds) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

pub fn count_yellow(region: &RgbImage, thresholds: &MaskThresholds) -> usize {
    region.pixels().filter(|p| is_yellow(p, thresholds)).count()
}

/// Number of selected (non-zero) mask pixels
pub fn mask_coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_strict() {
        let t = MaskThresholds::default();
        assert!(is_yellow(&Rgb([151, 151, 229]), &t));
        assert!(!is_yellow(&Rgb([150, 200, 100]), &t));
        assert!(!is_yellow(&Rgb([200, 150, 100]), &t));
        assert!(!is_yellow(&Rgb([200, 200, 230]), &t));
    }

    #[test]
    fn mask_marks_only_yellow_pixels() {
        let mut region = RgbImage::from_pixel(4, 3, Rgb([90, 60, 50]));
        region.put_pixel(1, 1, Rgb([220, 200, 120]));
        region.put_pixel(2, 1, Rgb([220, 200, 120]));
        let mask = tooth_mask(&region, &MaskThresholds::default());
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask_coverage(&mask), 2);
        assert_eq!(count_yellow(&region, &MaskThresholds::default()), 2);
    }
}
