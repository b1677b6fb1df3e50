use serde::{Deserialize, Serialize};

use super::Vec3;

/// Largest latitude representable by a square Web Mercator world.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const ZERO: Self = Self {
        longitude: 0.0,
        latitude: 0.0,
    };

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// `(lambda, phi)` in radians.
    pub fn to_radians(self) -> (f64, f64) {
        (self.longitude.to_radians(), self.latitude.to_radians())
    }

    pub fn from_radians(lambda: f64, phi: f64) -> Self {
        Self::new(lambda.to_degrees(), phi.to_degrees())
    }

    pub fn is_finite(self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Unit vector on the sphere (x towards lon 0, z towards the north pole).
    pub fn to_unit_vector(self) -> Vec3 {
        let (lambda, phi) = self.to_radians();
        unit_vector(lambda, phi)
    }
}

pub fn unit_vector(lambda: f64, phi: f64) -> Vec3 {
    let cos_phi = phi.cos();
    Vec3::new(lambda.cos() * cos_phi, lambda.sin() * cos_phi, phi.sin())
}

/// Inverse of [`unit_vector`]; the input does not need to be normalized.
pub fn spherical(v: Vec3) -> (f64, f64) {
    let n = v.norm();
    if n <= 1e-12 {
        return (0.0, 0.0);
    }
    (v.y.atan2(v.x), asin_clamped(v.z / n))
}

/// `asin` with the argument clamped to `[-1, 1]` so rounding noise never
/// produces NaN near the poles.
pub fn asin_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

pub fn wrap_lon_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Wraps an angle in radians into `[-PI, PI]`, keeping `PI` itself.
pub fn wrap_lambda(lambda: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    if lambda.abs() > std::f64::consts::PI {
        lambda - (lambda / tau).round() * tau
    } else {
        lambda
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, spherical, unit_vector, wrap_lambda, wrap_lon_deg};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn unit_vector_equator_prime_meridian() {
        let v = GeoPoint::new(0.0, 0.0).to_unit_vector();
        assert_close(v.x, 1.0, 1e-12);
        assert_close(v.y, 0.0, 1e-12);
        assert_close(v.z, 0.0, 1e-12);
    }

    #[test]
    fn round_trip_unit_vector() {
        let g = GeoPoint::new(-63.0, 41.5);
        let (lambda, phi) = g.to_radians();
        let (l2, p2) = spherical(unit_vector(lambda, phi));
        let back = GeoPoint::from_radians(l2, p2);
        assert_close(back.longitude, g.longitude, 1e-9);
        assert_close(back.latitude, g.latitude, 1e-9);
    }

    #[test]
    fn wraps_longitudes() {
        assert_close(wrap_lon_deg(190.0), -170.0, 1e-12);
        assert_close(wrap_lon_deg(-190.0), 170.0, 1e-12);
        assert_close(wrap_lon_deg(45.0), 45.0, 1e-12);
        assert_close(wrap_lambda(std::f64::consts::PI), std::f64::consts::PI, 1e-12);
        assert_close(wrap_lambda(3.5 * std::f64::consts::PI), -0.5 * std::f64::consts::PI, 1e-12);
    }

    #[test]
    fn zero_vector_maps_to_origin() {
        let (l, p) = spherical(crate::math::Vec3::new(0.0, 0.0, 0.0));
        assert_eq!((l, p), (0.0, 0.0));
    }
}
