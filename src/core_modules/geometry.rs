// THEORY:
// The `geometry` module holds the normalized-coordinate primitives shared by every
// other layer. All positions are fractions of the image width and height, with the
// origin at the top-left corner and y growing downwards, so the same numbers mean
// the same thing for a 640x480 preview frame and a 6000x4000 still.
//
// Everything here is a pure function or a plain value type. The three scoring
// primitives (`overlap_ratio`, `distance`, `nearest_key_point`) are what the
// deduplication filter and both recommenders are built on.

use serde::{Deserialize, Serialize};

/// A point in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub const CENTER: NormalizedPoint = NormalizedPoint::new(0.5, 0.5);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in normalized image space.
///
/// `left <= right` and `top <= bottom` are expected; values are usually in
/// `[0, 1]` but detector output is not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormalizedRect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a rect from its top-left corner and size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Builds a rect from pixel coordinates, normalizing by the image size.
    pub fn from_pixels(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let w = image_width.max(1) as f64;
        let h = image_height.max(1) as f64;
        Self::new(left / w, top / h, right / w, bottom / h)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn center(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.center_x(), self.center_y())
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// The overlapping region, or `None` when the rects do not overlap with positive area.
    pub fn intersection(&self, other: &NormalizedRect) -> Option<NormalizedRect> {
        let rect = NormalizedRect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
    }
}

/// Intersection area relative to each rect's own area; the larger of the two.
///
/// A degenerate (zero-area) rect contributes no ratio.
pub fn overlap_ratio(a: &NormalizedRect, b: &NormalizedRect) -> f64 {
    let Some(intersection) = a.intersection(b) else {
        return 0.0;
    };
    let shared = intersection.area();
    let ratio = |area: f64| if area > 0.0 { shared / area } else { 0.0 };
    ratio(a.area()).max(ratio(b.area()))
}

/// Euclidean distance in normalized space.
#[inline]
pub fn distance(p: NormalizedPoint, q: NormalizedPoint) -> f64 {
    (p.x - q.x).hypot(p.y - q.y)
}

/// The closest key point to `p` and its distance.
///
/// Ties go to the earliest key point in the list. Returns `None` for an empty list.
pub fn nearest_key_point(
    p: NormalizedPoint,
    key_points: &[NormalizedPoint],
) -> Option<(NormalizedPoint, f64)> {
    let mut best: Option<(NormalizedPoint, f64)> = None;
    for &candidate in key_points {
        let d = distance(p, candidate);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((candidate, d)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn rect_derived_values() {
        let r = NormalizedRect::new(0.2, 0.4, 0.6, 0.5);
        assert!((r.width() - 0.4).abs() < EPS);
        assert!((r.height() - 0.1).abs() < EPS);
        assert!((r.area() - 0.04).abs() < EPS);
        assert!((r.center_x() - 0.4).abs() < EPS);
        assert!((r.center_y() - 0.45).abs() < EPS);
    }

    #[test]
    fn from_pixels_normalizes() {
        let r = NormalizedRect::from_pixels(100.0, 50.0, 300.0, 150.0, 400, 200);
        assert_eq!(r, NormalizedRect::new(0.25, 0.25, 0.75, 0.75));
    }

    #[test]
    fn overlap_ratio_uses_the_smaller_rect() {
        let big = NormalizedRect::new(0.0, 0.0, 1.0, 1.0);
        let small = NormalizedRect::new(0.1, 0.1, 0.2, 0.2);
        // The small rect is fully inside the big one.
        assert!((overlap_ratio(&big, &small) - 1.0).abs() < EPS);
        assert!((overlap_ratio(&small, &big) - 1.0).abs() < EPS);
    }

    #[test]
    fn overlap_ratio_partial_and_disjoint() {
        let a = NormalizedRect::new(0.0, 0.0, 0.4, 0.4);
        let b = NormalizedRect::new(0.2, 0.0, 0.6, 0.4);
        assert!((overlap_ratio(&a, &b) - 0.5).abs() < EPS);

        let c = NormalizedRect::new(0.5, 0.5, 0.6, 0.6);
        assert_eq!(overlap_ratio(&a, &c), 0.0);

        // Touching edges share no area.
        let d = NormalizedRect::new(0.4, 0.0, 0.8, 0.4);
        assert_eq!(overlap_ratio(&a, &d), 0.0);
    }

    #[test]
    fn nearest_key_point_prefers_first_on_ties() {
        let points = [NormalizedPoint::new(0.0, 0.5), NormalizedPoint::new(1.0, 0.5)];
        let (p, d) = nearest_key_point(NormalizedPoint::CENTER, &points).unwrap();
        assert_eq!(p, points[0]);
        assert!((d - 0.5).abs() < EPS);
    }

    #[test]
    fn nearest_key_point_empty() {
        assert!(nearest_key_point(NormalizedPoint::CENTER, &[]).is_none());
    }

    #[test]
    fn distance_is_euclidean() {
        let d = distance(NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(0.3, 0.4));
        assert!((d - 0.5).abs() < EPS);
    }
}
