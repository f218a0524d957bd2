use image::RgbImage;
use imageproc::point::Point;

/// Axis-aligned rectangle in pixel coordinates of some image or sub-image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Score used to pick "the largest" mouth when no face was found.
    ///
    /// This is `(x + width) * (y + height)`, the far corner's distance product,
    /// not the true area: boxes further from the origin win ties on area.
    pub fn corner_score(&self) -> u64 {
        self.right() as u64 * self.bottom() as u64
    }

    /// Shift a box expressed relative to `origin` into origin's coordinate space
    pub fn offset_by(&self, origin: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x: self.x + origin.x,
            y: self.y + origin.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Clip to a `width` x `height` image
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let x = self.x.min(width);
        let y = self.y.min(height);
        BoundingBox {
            x,
            y,
            width: self.right().min(width) - x,
            height: self.bottom().min(height) - y,
        }
    }

    /// Grow the right and bottom edges by `padding`, clipped to the image
    pub fn padded(&self, padding: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            width: self.width + padding,
            height: self.height + padding,
            ..*self
        }
        .clamp_to(width, height)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Copy this region out of `img`, clipped to its bounds
    pub fn crop(&self, img: &RgbImage) -> RgbImage {
        let clipped = self.clamp_to(img.width(), img.height());
        image::imageops::crop_imm(img, clipped.x, clipped.y, clipped.width, clipped.height)
            .to_image()
    }
}

/// Outer boundary of one connected region of a mask
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Area enclosed by the boundary polygon (shoelace formula).
    ///
    /// Regions one pixel wide enclose nothing and report zero.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area: i64 = 0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        twice_area.abs() as f64 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_score_is_not_area() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 5, 10, 10);
        assert_eq!(a.area(), b.area());
        assert_eq!(a.corner_score(), 100);
        assert_eq!(b.corner_score(), 225);
    }

    #[test]
    fn padded_box_is_clipped() {
        let b = BoundingBox::new(90, 40, 8, 8).padded(5, 100, 50);
        assert_eq!(b, BoundingBox::new(90, 40, 10, 10));
    }

    #[test]
    fn square_contour_area() {
        let contour = Contour::new(vec![
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 3),
            Point::new(0, 3),
        ]);
        assert_eq!(contour.area(), 12.0);
    }

    #[test]
    fn intersection() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(a.intersects(&BoundingBox::new(9, 9, 5, 5)));
        assert!(!a.intersects(&BoundingBox::new(10, 0, 5, 5)));
    }
}
