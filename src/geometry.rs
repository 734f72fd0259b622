//! Axis-aligned bounding box primitives shared by every grouping stage.

use crate::error::{Error, Result};
use crate::model::Page;

/// An axis-aligned bounding box, `(x_min, y_min, x_max, y_max)`, with origin
/// at the top-left of the displayed page.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Bbox {
    /// Left edge.
    pub x_min: f64,
    /// Top edge.
    pub y_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Bottom edge.
    pub y_max: f64,
}

impl Bbox {
    /// Build a box from raw coordinates, normalising so that
    /// `x_min <= x_max` and `y_min <= y_max`.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x_min: x0.min(x1),
            y_min: y0.min(y1),
            x_max: x0.max(x1),
            y_max: y0.max(y1),
        }
    }

    /// The zero box at the origin.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area of the box (zero is a legal value, e.g. for zero-width glyphs).
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Geometric center of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// A box with the same center as `self` but at least 1 unit wide/tall
    /// on each axis that was degenerate. Used before intersection tests so
    /// that zero-width/zero-height glyph boxes still produce a non-zero
    /// intersection with overlapping geometry.
    pub fn ensure_nonzero_area(&self) -> Self {
        let mut b = *self;
        if b.width() == 0.0 {
            b.x_max += 1.0;
        }
        if b.height() == 0.0 {
            b.y_max += 1.0;
        }
        b
    }

    /// Coordinate-wise union of two boxes.
    pub fn merge(&self, other: &Bbox) -> Bbox {
        Bbox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Union of any non-empty iterator of boxes.
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a Bbox>) -> Option<Bbox> {
        boxes.into_iter().copied().reduce(|a, b| a.merge(&b))
    }

    /// Overlap along the x axis; zero if disjoint.
    pub fn overlap_x(&self, other: &Bbox) -> f64 {
        (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0)
    }

    /// Overlap along the y axis; zero if disjoint.
    pub fn overlap_y(&self, other: &Bbox) -> f64 {
        (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0)
    }

    /// Area of the intersection rectangle.
    pub fn intersection_area(&self, other: &Bbox) -> f64 {
        self.overlap_x(other) * self.overlap_y(other)
    }

    /// Fraction of `self`'s area covered by the intersection with `other`.
    /// Zero when `self` has zero area, to avoid a division by zero.
    pub fn intersection_pct(&self, other: &Bbox) -> f64 {
        let area = self.area();
        if area == 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Map this box through one of the four canonical page rotations.
    ///
    /// `page_width`/`page_height` are the *unrotated* media-box dimensions.
    pub fn rotate(&self, page_width: f64, page_height: f64, rotation: i32) -> Result<Bbox> {
        let (nx0, ny0, nx1, ny1) = match rotation {
            0 => (self.x_min, self.y_min, self.x_max, self.y_max),
            90 => (
                page_height - self.y_max,
                self.x_min,
                page_height - self.y_min,
                self.x_max,
            ),
            180 => (
                page_width - self.x_max,
                page_height - self.y_max,
                page_width - self.x_min,
                page_height - self.y_min,
            ),
            270 => (
                self.y_min,
                page_width - self.x_max,
                self.y_max,
                page_width - self.x_min,
            ),
            other => return Err(Error::InvalidRotation(other as f64)),
        };
        Ok(Bbox::new(nx0, ny0, nx1, ny1))
    }

    /// Rescale this box (given in `page`'s coordinate space) into an image
    /// of size `(img_w, img_h)`.
    pub fn rescale(&self, img_w: f64, img_h: f64, page: &Page) -> Bbox {
        let sx = if page.width > 0.0 {
            img_w / page.width
        } else {
            1.0
        };
        let sy = if page.height > 0.0 {
            img_h / page.height
        } else {
            1.0
        };
        Bbox::new(
            self.x_min * sx,
            self.y_min * sy,
            self.x_max * sx,
            self.y_max * sy,
        )
    }
}

impl std::fmt::Display for Bbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2}, {:.2}, {:.2}]",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_union() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Bbox::new(5.0, 5.0, 20.0, 8.0);
        let m = a.merge(&b);
        assert_eq!(m, Bbox::new(0.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn intersection_pct_zero_area_self() {
        let a = Bbox::new(1.0, 1.0, 1.0, 1.0);
        let b = Bbox::new(0.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersection_pct(&b), 0.0);
    }

    #[test]
    fn rotate_90_matches_reference_formula() {
        let b = Bbox::new(1.0, 2.0, 3.0, 4.0);
        let r = b.rotate(100.0, 200.0, 90).unwrap();
        assert_eq!(r, Bbox::new(196.0, 1.0, 198.0, 3.0));
    }

    #[test]
    fn rotate_rejects_bad_angle() {
        let b = Bbox::new(0.0, 0.0, 1.0, 1.0);
        assert!(b.rotate(10.0, 10.0, 45).is_err());
    }

    #[test]
    fn ensure_nonzero_area_inflates_degenerate_box() {
        let b = Bbox::new(5.0, 5.0, 5.0, 5.0);
        let inflated = b.ensure_nonzero_area();
        assert!(inflated.area() > 0.0);
    }
}
