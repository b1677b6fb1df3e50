//! Spherical rotation by three Euler angles.
//!
//! The rotation is a longitude shift by `lambda` followed by a combined
//! rotation about the y axis (`phi`) and the x axis (`gamma`). The inverse
//! undoes the two steps in reverse order.

use foundation::math::{asin_clamped, wrap_lambda};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    delta_lambda: f64,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
    has_phi_gamma: bool,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::from_degrees([0.0, 0.0, 0.0])
    }
}

impl Rotation {
    /// `[lambda, phi, gamma]` in degrees.
    pub fn from_degrees(angles: [f64; 3]) -> Self {
        let delta_lambda = (angles[0].to_radians()) % std::f64::consts::TAU;
        let delta_phi = angles[1].to_radians();
        let delta_gamma = angles[2].to_radians();
        Self {
            delta_lambda,
            cos_phi: delta_phi.cos(),
            sin_phi: delta_phi.sin(),
            cos_gamma: delta_gamma.cos(),
            sin_gamma: delta_gamma.sin(),
            has_phi_gamma: delta_phi != 0.0 || delta_gamma != 0.0,
        }
    }

    pub fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_lambda(lambda + self.delta_lambda);
        if !self.has_phi_gamma {
            return (lambda, phi);
        }
        let cos_p = phi.cos();
        let x = lambda.cos() * cos_p;
        let y = lambda.sin() * cos_p;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;
        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            asin_clamped(k * self.cos_gamma + y * self.sin_gamma),
        )
    }

    pub fn inverse(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (lambda, phi) = if self.has_phi_gamma {
            let cos_p = phi.cos();
            let x = lambda.cos() * cos_p;
            let y = lambda.sin() * cos_p;
            let z = phi.sin();
            let k = z * self.cos_gamma - y * self.sin_gamma;
            (
                (y * self.cos_gamma + z * self.sin_gamma).atan2(x * self.cos_phi + k * self.sin_phi),
                asin_clamped(k * self.cos_phi - x * self.sin_phi),
            )
        } else {
            (lambda, phi)
        };
        (wrap_lambda(lambda - self.delta_lambda), phi)
    }
}

#[cfg(test)]
mod tests {
    use super::Rotation;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn identity_only_wraps() {
        let r = Rotation::default();
        assert_eq!(r, Rotation::from_degrees([0.0, 0.0, 0.0]));
        let (l, p) = r.forward(0.5, 0.25);
        assert_close(l, 0.5, 1e-12);
        assert_close(p, 0.25, 1e-12);
    }

    #[test]
    fn lambda_rotation_shifts_longitude() {
        let r = Rotation::from_degrees([90.0, 0.0, 0.0]);
        let (l, _) = r.forward(0.0, 0.0);
        assert_close(l.to_degrees(), 90.0, 1e-9);
        let (l, _) = r.forward(150f64.to_radians(), 0.0);
        assert_close(l.to_degrees(), -120.0, 1e-9);
    }

    #[test]
    fn phi_rotation_moves_pole_to_center() {
        // Rotating by -90 degrees of phi brings the north pole to the origin.
        let r = Rotation::from_degrees([0.0, -90.0, 0.0]);
        let (_, p) = r.forward(0.0, std::f64::consts::FRAC_PI_2);
        assert_close(p, 0.0, 1e-9);
    }

    #[test]
    fn inverse_undoes_forward() {
        let r = Rotation::from_degrees([-40.0, 25.0, 10.0]);
        for (lon, lat) in [(0.0, 0.0), (120.0, -35.0), (-170.0, 70.0)] {
            let (l, p) = r.forward(f64::to_radians(lon), f64::to_radians(lat));
            let (l2, p2) = r.inverse(l, p);
            assert_close(l2.to_degrees(), lon, 1e-9);
            assert_close(p2.to_degrees(), lat, 1e-9);
        }
    }
}
