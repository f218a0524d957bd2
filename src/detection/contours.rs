use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::dilate;

use crate::config::RefineParams;
use crate::models::Contour;

/// Outer borders of the top-level regions of a binary mask (holes and regions
/// nested inside holes are ignored)
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// Contour enclosing the greatest area. Ties keep the first; contours that
/// enclose nothing are never chosen.
pub fn largest_contour(contours: &[Contour]) -> Option<&Contour> {
    let mut largest = None;
    let mut largest_area = 0.0;
    for contour in contours {
        let area = contour.area();
        if area > largest_area {
            largest_area = area;
            largest = Some(contour);
        }
    }
    largest
}

/// Fresh `width` x `height` mask with only `contour` filled in, boundary included
pub fn fill_contour(width: u32, height: u32, contour: &Contour) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let mut points = contour.points.clone();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() < 3 {
        for p in &points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
            }
        }
    } else {
        draw_polygon_mut(&mut mask, &points, Luma([255u8]));
    }
    mask
}

/// Grow the mask with a square `kernel_size` structuring element, `iterations` times
pub fn dilate_mask(mask: &GrayImage, params: &RefineParams) -> GrayImage {
    let radius = params.kernel_size / 2;
    (0..params.iterations).fold(mask.clone(), |grown, _| dilate(&grown, Norm::LInf, radius))
}

#[derive(Debug, Clone)]
pub struct RefinedMask {
    pub mask: GrayImage,
    /// Area of the kept contour, `None` when the mask held no usable region
    pub contour_area: Option<f64>,
}

/// Keep only the largest region of a tooth mask, then dilate it.
///
/// A mask with no region enclosing any area comes back empty.
pub fn refine_mask(mask: &GrayImage, params: &RefineParams) -> RefinedMask {
    let (width, height) = mask.dimensions();
    let contours = external_contours(mask);

    match largest_contour(&contours) {
        Some(contour) => {
            let filled = fill_contour(width, height, contour);
            RefinedMask {
                mask: dilate_mask(&filled, params),
                contour_area: Some(contour.area()),
            }
        }
        None => RefinedMask {
            mask: GrayImage::new(width, height),
            contour_area: None,
        },
    }
}
