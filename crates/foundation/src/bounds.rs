use serde::{Deserialize, Serialize};

use crate::math::{GeoPoint, Vec2, round_to};

/// Geographic rectangle in degrees.
///
/// `right < left` means the rectangle wraps across the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl GeoBounds {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn is_antimeridian_crossing(&self) -> bool {
        self.right < self.left
    }

    /// Replaces a wrapped longitude range by the full `[-180, 180]` range.
    pub fn normalized(self) -> Self {
        if self.is_antimeridian_crossing() {
            Self {
                left: -180.0,
                right: 180.0,
                ..self
            }
        } else {
            self
        }
    }

    pub fn rounded(self, decimals: u32) -> Self {
        Self {
            left: round_to(self.left, decimals),
            right: round_to(self.right, decimals),
            top: round_to(self.top, decimals),
            bottom: round_to(self.bottom, decimals),
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            self.left + (self.right - self.left) * 0.5,
            self.bottom + (self.top - self.bottom) * 0.5,
        )
    }
}

/// Axis-aligned screen rectangle in pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        ScreenBounds { min, max }
    }

    /// Bounds that contain nothing; the identity for [`ScreenBounds::include`].
    pub fn empty() -> Self {
        ScreenBounds {
            min: Vec2::new(f64::INFINITY, f64::INFINITY),
            max: Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(mut self, other: ScreenBounds) -> Self {
        if other.is_empty() {
            return self;
        }
        self.include(other.min);
        self.include(other.max);
        self
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }

    pub fn center(&self) -> Vec2 {
        self.min.midpoint(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoBounds, ScreenBounds};
    use crate::math::{GeoPoint, Vec2};

    #[test]
    fn json_field_names() {
        let b: GeoBounds = serde_json::from_str(r#"{"left":0,"right":40,"top":30,"bottom":10}"#).unwrap();
        assert_eq!(b, GeoBounds::new(0.0, 40.0, 30.0, 10.0));
        let g: GeoPoint = serde_json::from_str(r#"{"longitude":10,"latitude":20}"#).unwrap();
        assert_eq!(g, GeoPoint::new(10.0, 20.0));
        assert!(serde_json::from_str::<GeoPoint>(r#"{"lon":10,"lat":20}"#).is_err());
    }

    #[test]
    fn crossing_bounds_normalize_to_full_range() {
        let b = GeoBounds::new(170.0, -170.0, 10.0, -10.0);
        assert!(b.is_antimeridian_crossing());
        assert_eq!(b.normalized(), GeoBounds::new(-180.0, 180.0, 10.0, -10.0));

        let ok = GeoBounds::new(-10.0, 10.0, 5.0, -5.0);
        assert_eq!(ok.normalized(), ok);
    }

    #[test]
    fn rounding_suppresses_jitter() {
        let a = GeoBounds::new(-10.000_000_2, 10.0, 5.0, -5.000_4);
        let b = GeoBounds::new(-9.999_999_9, 10.000_1, 5.000_2, -5.0);
        assert_eq!(a.rounded(3), b.rounded(3));
    }

    #[test]
    fn screen_bounds_accumulate() {
        let mut b = ScreenBounds::empty();
        assert!(b.is_empty());
        assert_eq!(b.width(), 0.0);
        b.include(Vec2::new(10.0, 20.0));
        b.include(Vec2::new(-5.0, 40.0));
        assert_eq!(b.width(), 15.0);
        assert_eq!(b.height(), 20.0);
        assert_eq!(b.center(), Vec2::new(2.5, 30.0));

        let u = b.union(ScreenBounds::empty());
        assert_eq!(u, b);
    }
}
