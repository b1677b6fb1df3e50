use foundation::math::{GeoPoint, Vec2};

use crate::raw::ProjectionRef;
use crate::rotation::Rotation;

/// Raw projection plus rotation, scale and translate.
///
/// `screen = translate + scale * (x, -y)` where `(x, y)` is the raw output
/// for the rotated point. "Unit" coordinates are the same with scale 1 and
/// no translate.
#[derive(Debug, Clone)]
pub struct GeoProjection {
    raw: ProjectionRef,
    rotation_deg: [f64; 3],
    rotation: Rotation,
    scale: f64,
    translate: Vec2,
}

impl GeoProjection {
    pub fn new(raw: ProjectionRef) -> Self {
        Self {
            raw,
            rotation_deg: [0.0; 3],
            rotation: Rotation::default(),
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }

    pub fn raw(&self) -> &ProjectionRef {
        &self.raw
    }

    pub fn set_raw(&mut self, raw: ProjectionRef) {
        self.raw = raw;
        self.rebuild_rotation();
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn set_translate(&mut self, translate: Vec2) {
        self.translate = translate;
    }

    pub fn rotation(&self) -> [f64; 3] {
        self.rotation_deg
    }

    /// Returns `false` (and changes nothing) if the raw projection cannot rotate.
    pub fn set_rotation(&mut self, degrees: [f64; 3]) -> bool {
        if !self.raw.supports_rotation() {
            return false;
        }
        self.rotation_deg = degrees;
        self.rebuild_rotation();
        true
    }

    fn rebuild_rotation(&mut self) {
        self.rotation = if self.raw.supports_rotation() {
            Rotation::from_degrees(self.rotation_deg)
        } else {
            Rotation::default()
        };
    }

    pub fn unit_point(&self, geo: GeoPoint) -> Option<Vec2> {
        let (lambda, phi) = geo.to_radians();
        let (lambda, phi) = if self.raw.supports_rotation() {
            self.rotation.forward(lambda, phi)
        } else {
            (lambda, phi)
        };
        let [x, y] = self.raw.forward(lambda, phi)?;
        let p = Vec2::new(x, -y);
        p.is_finite().then_some(p)
    }

    pub fn forward(&self, geo: GeoPoint) -> Option<Vec2> {
        self.unit_point(geo)
            .map(|u| self.translate + u * self.scale)
    }

    pub fn inverse(&self, screen: Vec2) -> Option<GeoPoint> {
        if !self.raw.has_inverse() || self.scale == 0.0 {
            return None;
        }
        let x = (screen.x - self.translate.x) / self.scale;
        let y = (self.translate.y - screen.y) / self.scale;
        let [lambda, phi] = self.raw.inverse(x, y)?;
        let (lambda, phi) = if self.raw.supports_rotation() {
            self.rotation.inverse(lambda, phi)
        } else {
            (lambda, phi)
        };
        let geo = GeoPoint::from_radians(lambda, phi);
        geo.is_finite().then_some(geo)
    }
}

#[cfg(test)]
mod tests {
    use super::GeoProjection;
    use crate::raw::ProjectionKind;
    use foundation::math::{GeoPoint, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn scale_and_translate_apply_with_y_flipped() {
        let mut p = GeoProjection::new(ProjectionKind::Equirectangular.into());
        p.set_scale(100.0);
        p.set_translate(Vec2::new(400.0, 300.0));
        let s = p.forward(GeoPoint::new(0.0, 45.0)).unwrap();
        assert_close(s.x, 400.0, 1e-9);
        assert_close(s.y, 300.0 - 100.0 * std::f64::consts::FRAC_PI_4, 1e-9);
    }

    #[test]
    fn rotated_round_trip() {
        let mut p = GeoProjection::new(ProjectionKind::Orthographic.into());
        p.set_scale(250.0);
        p.set_translate(Vec2::new(300.0, 300.0));
        assert!(p.set_rotation([-20.0, -30.0, 0.0]));
        let g = GeoPoint::new(15.0, 40.0);
        let back = p.inverse(p.forward(g).unwrap()).unwrap();
        assert_close(back.longitude, g.longitude, 1e-9);
        assert_close(back.latitude, g.latitude, 1e-9);
    }

    #[test]
    fn rotated_center_projects_to_translate() {
        let mut p = GeoProjection::new(ProjectionKind::Orthographic.into());
        p.set_translate(Vec2::new(10.0, 20.0));
        p.set_rotation([-100.0, -45.0, 0.0]);
        let s = p.forward(GeoPoint::new(100.0, 45.0)).unwrap();
        assert_close(s.x, 10.0, 1e-9);
        assert_close(s.y, 20.0, 1e-9);
    }

    #[test]
    fn identity_refuses_rotation() {
        let mut p = GeoProjection::new(ProjectionKind::Identity.into());
        assert!(!p.set_rotation([10.0, 0.0, 0.0]));
        assert_eq!(p.rotation(), [0.0; 3]);
    }
}
