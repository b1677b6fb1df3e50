//! Raw projections: functions from `(lambda, phi)` in radians to an unscaled
//! plane with y pointing north.

use std::sync::{Arc, LazyLock};

use foundation::math::{MERCATOR_MAX_LAT_DEG, asin_clamped};
use serde::{Deserialize, Serialize};

pub trait RawProjection: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// `None` when the point is outside the projection's domain.
    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]>;

    fn inverse(&self, _x: f64, _y: f64) -> Option<[f64; 2]> {
        None
    }

    fn has_inverse(&self) -> bool {
        false
    }

    fn supports_rotation(&self) -> bool {
        true
    }

    /// Angular radius (radians) of the visible cap, for projections that
    /// only show part of the sphere.
    fn clip_angle(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mercator;

impl RawProjection for Mercator {
    fn name(&self) -> &str {
        "mercator"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let max = MERCATOR_MAX_LAT_DEG.to_radians();
        let phi = phi.clamp(-max, max);
        let y = (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln();
        Some([lambda, y])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        Some([x, 2.0 * y.exp().atan() - std::f64::consts::FRAC_PI_2])
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Equirectangular;

impl RawProjection for Equirectangular {
    fn name(&self) -> &str {
        "equirectangular"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        Some([lambda, phi])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        Some([x, y])
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

/// Globe seen from infinitely far away. The far hemisphere is undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Orthographic;

impl RawProjection for Orthographic {
    fn name(&self) -> &str {
        "orthographic"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        if phi.cos() * lambda.cos() < 0.0 {
            return None;
        }
        Some([phi.cos() * lambda.sin(), phi.sin()])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let z = x.hypot(y);
        if z > 1.0 {
            return None;
        }
        if z == 0.0 {
            return Some([0.0, 0.0]);
        }
        let c = z.asin();
        let (sin_c, cos_c) = c.sin_cos();
        Some([(x * sin_c).atan2(z * cos_c), asin_clamped(y * sin_c / z)])
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn clip_angle(&self) -> Option<f64> {
        Some(std::f64::consts::FRAC_PI_2)
    }
}

const EE_A1: f64 = 1.340264;
const EE_A2: f64 = -0.081106;
const EE_A3: f64 = 0.000893;
const EE_A4: f64 = 0.003796;
const EE_ITERATIONS: usize = 12;

fn ee_m() -> f64 {
    3f64.sqrt() / 2.0
}

/// Equal Earth (Šavrič, Patterson and Jenny, 2018).
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualEarth;

impl RawProjection for EqualEarth {
    fn name(&self) -> &str {
        "equalEarth"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let m = ee_m();
        let l = asin_clamped(m * phi.sin());
        let l2 = l * l;
        let l6 = l2 * l2 * l2;
        Some([
            lambda * l.cos() / (m * (EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2))),
            l * (EE_A1 + EE_A2 * l2 + l6 * (EE_A3 + EE_A4 * l2)),
        ])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let m = ee_m();
        let mut l = y;
        let mut l2 = l * l;
        let mut l6 = l2 * l2 * l2;
        for _ in 0..EE_ITERATIONS {
            let fy = l * (EE_A1 + EE_A2 * l2 + l6 * (EE_A3 + EE_A4 * l2)) - y;
            let fpy = EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2);
            let delta = fy / fpy;
            l -= delta;
            l2 = l * l;
            l6 = l2 * l2 * l2;
            if delta.abs() < 1e-12 {
                break;
            }
        }
        let lambda = m * x * (EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2)) / l.cos();
        let phi = asin_clamped(l.sin() / m);
        (lambda.is_finite() && phi.is_finite()).then_some([lambda, phi])
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

/// Natural Earth I (Šavrič et al., 2011), polynomial form.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalEarth1;

impl RawProjection for NaturalEarth1 {
    fn name(&self) -> &str {
        "naturalEarth1"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let phi2 = phi * phi;
        let phi4 = phi2 * phi2;
        Some([
            lambda
                * (0.8707 - 0.131979 * phi2
                    + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
            phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
        ])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let mut phi = y;
        for _ in 0..25 {
            let phi2 = phi * phi;
            let phi4 = phi2 * phi2;
            let delta = (phi
                * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
                - y)
                / (1.007226
                    + phi2
                        * (0.015085 * 3.0
                            + phi4 * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2 - 0.005916 * 11.0 * phi4)));
            phi -= delta;
            if delta.abs() <= 1e-6 {
                break;
            }
        }
        let phi2 = phi * phi;
        let lambda = x
            / (0.8707 + phi2 * (-0.131979 + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2))));
        (lambda.is_finite() && phi.is_finite()).then_some([lambda, phi])
    }

    fn has_inverse(&self) -> bool {
        true
    }
}

/// Planar pass-through for geometry that is already in plane coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl RawProjection for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        Some([lambda, phi])
    }

    fn inverse(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        Some([x, y])
    }

    fn has_inverse(&self) -> bool {
        true
    }

    fn supports_rotation(&self) -> bool {
        false
    }
}

/// Shared handle to a raw projection.
///
/// Equality is identity: swapping in a different instance counts as a change
/// even if it computes the same thing.
#[derive(Debug, Clone)]
pub struct ProjectionRef(Arc<dyn RawProjection>);

impl ProjectionRef {
    pub fn new(raw: impl RawProjection + 'static) -> Self {
        Self(Arc::new(raw))
    }

    pub fn raw(&self) -> &dyn RawProjection {
        self.0.as_ref()
    }
}

impl PartialEq for ProjectionRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ProjectionRef {
    type Target = dyn RawProjection;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Built-in projections by name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionKind {
    #[default]
    Mercator,
    Equirectangular,
    Orthographic,
    EqualEarth,
    NaturalEarth1,
    Identity,
}

static MERCATOR: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(Mercator));
static EQUIRECTANGULAR: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(Equirectangular));
static ORTHOGRAPHIC: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(Orthographic));
static EQUAL_EARTH: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(EqualEarth));
static NATURAL_EARTH_1: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(NaturalEarth1));
static IDENTITY: LazyLock<ProjectionRef> = LazyLock::new(|| ProjectionRef::new(Identity));

impl From<ProjectionKind> for ProjectionRef {
    /// Built-ins are shared, so the same kind always compares equal.
    fn from(kind: ProjectionKind) -> Self {
        let shared = match kind {
            ProjectionKind::Mercator => &MERCATOR,
            ProjectionKind::Equirectangular => &EQUIRECTANGULAR,
            ProjectionKind::Orthographic => &ORTHOGRAPHIC,
            ProjectionKind::EqualEarth => &EQUAL_EARTH,
            ProjectionKind::NaturalEarth1 => &NATURAL_EARTH_1,
            ProjectionKind::Identity => &IDENTITY,
        };
        ProjectionRef::clone(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::{EqualEarth, Mercator, NaturalEarth1, Orthographic, ProjectionKind, ProjectionRef, RawProjection};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_round_trip(p: &dyn RawProjection, lon: f64, lat: f64) {
        let (lambda, phi) = (lon.to_radians(), lat.to_radians());
        let [x, y] = p.forward(lambda, phi).unwrap();
        let [l2, p2] = p.inverse(x, y).unwrap();
        assert_close(l2, lambda, 1e-6);
        assert_close(p2, phi, 1e-6);
    }

    #[test]
    fn builtins_round_trip() {
        for (lon, lat) in [(0.0, 0.0), (-120.0, 45.0), (33.3, -60.0), (179.0, 10.0)] {
            assert_round_trip(&Mercator, lon, lat);
            assert_round_trip(&EqualEarth, lon, lat);
            assert_round_trip(&NaturalEarth1, lon, lat);
        }
        assert_round_trip(&Orthographic, 30.0, 20.0);
    }

    #[test]
    fn mercator_clamps_poles() {
        let [_, y] = Mercator.forward(0.0, std::f64::consts::FRAC_PI_2).unwrap();
        assert!(y.is_finite());
        assert_close(y, std::f64::consts::PI, 1e-6);
    }

    #[test]
    fn orthographic_hides_far_side() {
        assert!(Orthographic.forward(std::f64::consts::PI, 0.0).is_none());
        assert!(Orthographic.inverse(0.8, 0.8).is_none());
        assert_eq!(Orthographic.inverse(0.0, 0.0), Some([0.0, 0.0]));
    }

    #[test]
    fn builtin_refs_compare_by_identity() {
        let a: ProjectionRef = ProjectionKind::Orthographic.into();
        let b: ProjectionRef = ProjectionKind::Orthographic.into();
        assert_eq!(a, b);
        assert_ne!(a, ProjectionRef::new(Orthographic));
        assert_eq!(a.name(), "orthographic");
    }

    #[test]
    fn kind_deserializes_from_camel_case() {
        let k: ProjectionKind = serde_json::from_str("\"naturalEarth1\"").unwrap();
        assert_eq!(k, ProjectionKind::NaturalEarth1);
    }
}
