use image::{GrayImage, Luma, Rgb, RgbImage, imageops};

use crate::config::BlendParams;
use crate::models::BoundingBox;

/// Substitute gray for each masked pixel: the saturating red+green sum scaled
/// by `params.scale`, zero wherever the mask is unset
pub fn whiter_color(region: &RgbImage, mask: &GrayImage, params: &BlendParams) -> GrayImage {
    GrayImage::from_fn(region.width(), region.height(), |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            return Luma([0]);
        }
        let [red, green, _] = region.get_pixel(x, y).0;
        let sum = red.saturating_add(green) as f32;
        Luma([(sum * params.scale).min(255.0) as u8])
    })
}

/// Replace masked pixels of a mouth region with their substitute gray and
/// leave the rest untouched
pub fn blend_teeth(region: &RgbImage, mask: &GrayImage, params: &BlendParams) -> RgbImage {
    let whiter = whiter_color(region, mask, params);
    RgbImage::from_fn(region.width(), region.height(), |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            *region.get_pixel(x, y)
        } else {
            let v = whiter.get_pixel(x, y)[0];
            Rgb([v, v, v])
        }
    })
}

/// Write `patch` back into `target` at the box it was cropped from
pub fn paste_region(target: &mut RgbImage, patch: &RgbImage, at: &BoundingBox) {
    imageops::replace(target, patch, at.x as i64, at.y as i64);
}

/// Before and after placed next to each other
pub fn side_by_side(before: &RgbImage, after: &RgbImage) -> RgbImage {
    let width = before.width() + after.width();
    let height = before.height().max(after.height());
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, before, 0, 0);
    imageops::replace(&mut canvas, after, before.width() as i64, 0);
    canvas
}
