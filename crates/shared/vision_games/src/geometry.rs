use serde::{Deserialize, Serialize};

/// Smallest extent (px) any generator will compute with.
///
/// Display surfaces report zero while hidden or before layout; every generator
/// goes through [`Viewport::sanitized`] so no division sees a zero extent.
pub const MIN_EXTENT_PX: f64 = 1.0;
/// Largest extent (px) accepted from a display surface.
pub const MAX_EXTENT_PX: f64 = 16_384.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawable area reported by the display surface, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Replace zero, negative or non-finite extents with [`MIN_EXTENT_PX`] and
    /// cap the rest at [`MAX_EXTENT_PX`].
    pub fn sanitized(self) -> Self {
        Self {
            width: sanitize_extent(self.width),
            height: sanitize_extent(self.height),
        }
    }

    pub fn area(self) -> f64 {
        self.width * self.height
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // Matches the fixed-size game canvas of the web front-end.
        Self::new(400.0, 400.0)
    }
}

pub fn sanitize_extent(v: f64) -> f64 {
    if v.is_finite() && v >= MIN_EXTENT_PX {
        v.min(MAX_EXTENT_PX)
    } else {
        MIN_EXTENT_PX
    }
}

/// Upper bound of a placement range `[0, extent - item]`, never negative.
pub fn free_span(extent: f64, item: f64) -> f64 {
    (extent - item).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_replaces_degenerate_extents() {
        let v = Viewport::new(0.0, f64::NAN).sanitized();
        assert_eq!(v, Viewport::new(MIN_EXTENT_PX, MIN_EXTENT_PX));

        let v = Viewport::new(-20.0, f64::INFINITY).sanitized();
        assert_eq!(v, Viewport::new(MIN_EXTENT_PX, MIN_EXTENT_PX));

        let v = Viewport::new(640.0, 480.0).sanitized();
        assert_eq!(v, Viewport::new(640.0, 480.0));
    }

    #[test]
    fn sanitized_caps_huge_extents() {
        let v = Viewport::new(1.0e6, f64::MAX).sanitized();
        assert_eq!(v, Viewport::new(MAX_EXTENT_PX, MAX_EXTENT_PX));
    }

    #[test]
    fn free_span_never_negative() {
        assert_eq!(free_span(100.0, 30.0), 70.0);
        assert_eq!(free_span(10.0, 30.0), 0.0);
    }
}
