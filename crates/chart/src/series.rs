//! Series plugged into a map chart.
//!
//! A series owns its geographic geometry and the screen positions derived
//! from the chart's shared projection. The chart never reaches into a series:
//! it asks for geometry when a series reports a change and tells it when the
//! projection moved.

use foundation::math::{GeoPoint, Vec2};
use projection::engine::ProjectionEngine;
use projection::geometry::Geometry;

pub trait MapSeries: std::fmt::Debug {
    fn geometries(&self) -> Vec<Geometry>;

    /// Returns whether the geometry changed since the last call and resets
    /// the flag.
    fn take_geometry_dirty(&mut self) -> bool;

    /// Whether this series takes part in fitting and geo bounds.
    fn affects_bounds(&self) -> bool {
        true
    }

    fn mark_dirty_projection(&mut self);

    /// Re-derives screen geometry when marked dirty. Returns whether any
    /// work was done.
    fn update_projection(&mut self, engine: &ProjectionEngine) -> bool;
}

/// Edit to a chart's series list.
#[derive(Debug)]
pub enum SeriesChange {
    Push(Box<dyn MapSeries>),
    Insert(usize, Box<dyn MapSeries>),
    Set(usize, Box<dyn MapSeries>),
    Remove(usize),
    Clear,
}

/// Plain geometry with projected points cached per geometry.
#[derive(Debug, Clone, Default)]
pub struct GeometrySeries {
    geometries: Vec<Geometry>,
    affects_bounds: bool,
    geometry_dirty: bool,
    projection_dirty: bool,
    /// `None` where a point is not visible in the projection.
    screen: Vec<Vec<Option<Vec2>>>,
    projection_updates: usize,
}

impl GeometrySeries {
    pub fn new(geometries: impl IntoIterator<Item = Geometry>) -> Self {
        Self {
            geometries: geometries.into_iter().collect(),
            affects_bounds: true,
            geometry_dirty: true,
            projection_dirty: true,
            ..Self::default()
        }
    }

    pub fn excluded_from_bounds(mut self) -> Self {
        self.affects_bounds = false;
        self
    }

    pub fn screen_points(&self) -> &[Vec<Option<Vec2>>] {
        &self.screen
    }

    pub fn projection_updates(&self) -> usize {
        self.projection_updates
    }
}

impl MapSeries for GeometrySeries {
    fn geometries(&self) -> Vec<Geometry> {
        self.geometries.clone()
    }

    fn take_geometry_dirty(&mut self) -> bool {
        std::mem::take(&mut self.geometry_dirty)
    }

    fn affects_bounds(&self) -> bool {
        self.affects_bounds
    }

    fn mark_dirty_projection(&mut self) {
        self.projection_dirty = true;
    }

    fn update_projection(&mut self, engine: &ProjectionEngine) -> bool {
        if !self.projection_dirty {
            return false;
        }
        self.screen = self
            .geometries
            .iter()
            .map(|g| {
                g.positions()
                    .into_iter()
                    .map(|[lon, lat]| engine.try_convert(GeoPoint::new(lon, lat)))
                    .collect()
            })
            .collect();
        self.projection_dirty = false;
        self.projection_updates += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{GeometrySeries, MapSeries};
    use foundation::math::Vec2;
    use projection::engine::ProjectionEngine;
    use projection::geometry::Geometry;
    use projection::raw::ProjectionKind;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn geometry_flag_is_taken_once() {
        let mut s = GeometrySeries::new([Geometry::Point([0.0, 0.0])]);
        assert!(s.take_geometry_dirty());
        assert!(!s.take_geometry_dirty());
    }

    #[test]
    fn projects_only_when_marked() {
        let mut engine = ProjectionEngine::new(ProjectionKind::Equirectangular.into());
        engine.set_viewport(200.0, 100.0);
        engine.set_translate(Vec2::new(100.0, 50.0));

        let mut s = GeometrySeries::new([Geometry::LineString(vec![[0.0, 0.0], [90.0, 0.0]])]);
        assert!(s.update_projection(&engine));
        assert!(!s.update_projection(&engine));
        assert_eq!(s.projection_updates(), 1);

        let p = s.screen_points()[0][1].unwrap();
        assert_close(p.x, 100.0 + std::f64::consts::FRAC_PI_2, 1e-12);
        assert_close(p.y, 50.0, 1e-12);

        s.mark_dirty_projection();
        assert!(s.update_projection(&engine));
        assert_eq!(s.projection_updates(), 2);
    }

    #[test]
    fn hidden_points_stay_unprojected() {
        let engine = ProjectionEngine::new(ProjectionKind::Orthographic.into());
        let mut s = GeometrySeries::new([Geometry::MultiPoint(vec![[0.0, 0.0], [180.0, 0.0]])]);
        s.update_projection(&engine);
        assert!(s.screen_points()[0][0].is_some());
        assert!(s.screen_points()[0][1].is_none());
    }

    #[test]
    fn exclusion_from_bounds() {
        assert!(GeometrySeries::new([]).affects_bounds());
        assert!(!GeometrySeries::new([]).excluded_from_bounds().affects_bounds());
    }
}
