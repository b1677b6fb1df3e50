//! Projection state of one map: fit, zoom, translate and rotation.
//!
//! `scale = base_fit_scale * zoom_level` always holds. The base scale and fit
//! translate only change in [`ProjectionEngine::fit`], which the owner calls
//! when geometry, projection or viewport change.

use foundation::bounds::{GeoBounds, ScreenBounds};
use foundation::math::{GeoPoint, Vec2, safe_div};
use tracing::debug;

use crate::extent::{compute_geo_bounds, geo_centroid, unit_extent};
use crate::geometry::GeometryCollection;
use crate::projector::GeoProjection;
use crate::raw::ProjectionRef;

pub const DEFAULT_MIN_ZOOM: f64 = 1.0;
pub const DEFAULT_MAX_ZOOM: f64 = 32.0;

/// Share of the plot area a zoomed-to bounding box may fill.
pub const BOUNDS_FIT_FRACTION: f64 = 0.9;

/// Where a zoom should end up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTarget {
    pub translate: Vec2,
    pub zoom_level: f64,
}

/// A zoom expressed as a geographic point to center and a level.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoZoom {
    pub point: GeoPoint,
    pub zoom_level: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    projection: GeoProjection,
    collection: GeometryCollection,
    unit_extent: ScreenBounds,
    base_fit_scale: f64,
    fit_translate: Vec2,
    geo_bounds: Option<GeoBounds>,
    centroid: GeoPoint,
    zoom_level: f64,
    min_zoom: f64,
    max_zoom: f64,
    viewport: Vec2,
    locked_center: Option<GeoPoint>,
}

impl ProjectionEngine {
    pub fn new(raw: ProjectionRef) -> Self {
        Self {
            projection: GeoProjection::new(raw),
            collection: GeometryCollection::new(),
            unit_extent: ScreenBounds::empty(),
            base_fit_scale: 1.0,
            fit_translate: Vec2::ZERO,
            geo_bounds: None,
            centroid: GeoPoint::ZERO,
            zoom_level: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            viewport: Vec2::ZERO,
            locked_center: None,
        }
    }

    pub fn projection(&self) -> &GeoProjection {
        &self.projection
    }

    /// Swaps the raw projection. Rotation carries over when supported.
    pub fn set_projection(&mut self, raw: ProjectionRef) -> bool {
        if *self.projection.raw() == raw {
            return false;
        }
        self.projection.set_raw(raw);
        true
    }

    pub fn set_geometry(&mut self, collection: GeometryCollection) {
        self.geo_bounds = compute_geo_bounds(&collection);
        self.centroid = geo_centroid(&collection);
        self.collection = collection;
    }

    pub fn geometry(&self) -> &GeometryCollection {
        &self.collection
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Vec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn viewport_center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    /// Fits the geometry into the viewport at zoom 1 and resets translate to
    /// the fit translate. Returns `false` when there is nothing to fit.
    pub fn fit(&mut self) -> bool {
        let extent = unit_extent(&self.collection, &self.projection);
        self.unit_extent = extent;
        let (w, h) = (self.viewport.x, self.viewport.y);
        if extent.is_empty() {
            self.base_fit_scale = 1.0;
            self.fit_translate = self.viewport_center();
            self.apply_scale();
            self.projection.set_translate(self.fit_translate);
            return false;
        }

        let dx = extent.width();
        let dy = extent.height();
        let k = match (dx > 0.0, dy > 0.0) {
            (true, true) => (w / dx).min(h / dy),
            (true, false) => w / dx,
            (false, true) => h / dy,
            (false, false) => 1.0,
        };
        let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
        self.base_fit_scale = k;
        self.fit_translate = Vec2::new(
            (w - k * (extent.min.x + extent.max.x)) / 2.0,
            (h - k * (extent.min.y + extent.max.y)) / 2.0,
        );
        self.apply_scale();
        self.projection.set_translate(self.fit_translate);
        debug!(
            projection = self.projection.raw().name(),
            scale = k,
            tx = self.fit_translate.x,
            ty = self.fit_translate.y,
            "projection fitted"
        );
        true
    }

    pub fn base_fit_scale(&self) -> f64 {
        self.base_fit_scale
    }

    pub fn fit_translate(&self) -> Vec2 {
        self.fit_translate
    }

    /// Screen bounds of the geometry at zoom 1 with the fit translate.
    pub fn fit_bounds(&self) -> ScreenBounds {
        self.screen_extent(self.fit_translate, self.base_fit_scale)
    }

    /// Screen bounds of the geometry as currently displayed.
    pub fn map_screen_bounds(&self) -> ScreenBounds {
        self.screen_extent(self.projection.translate(), self.projection.scale())
    }

    fn screen_extent(&self, t: Vec2, k: f64) -> ScreenBounds {
        if self.unit_extent.is_empty() {
            return ScreenBounds::empty();
        }
        ScreenBounds::new(t + self.unit_extent.min * k, t + self.unit_extent.max * k)
    }

    pub fn scale(&self) -> f64 {
        self.projection.scale()
    }

    pub fn translate(&self) -> Vec2 {
        self.projection.translate()
    }

    pub fn set_translate(&mut self, t: Vec2) {
        self.projection.set_translate(t);
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn set_zoom_bounds(&mut self, min: f64, max: f64) {
        self.min_zoom = min;
        self.max_zoom = max.max(min);
    }

    pub fn clamp_zoom(&self, z: f64) -> f64 {
        z.clamp(self.min_zoom, self.max_zoom)
    }

    /// Rescales without refitting. With a locked center, translate follows so
    /// that point stays at the viewport center.
    pub fn set_zoom_level(&mut self, z: f64) -> f64 {
        self.zoom_level = self.clamp_zoom(z);
        self.apply_scale();
        self.recenter_on_lock();
        self.zoom_level
    }

    fn apply_scale(&mut self) {
        self.projection.set_scale(self.base_fit_scale * self.zoom_level);
    }

    pub fn lock_center(&mut self, center: Option<GeoPoint>) {
        self.locked_center = center;
    }

    pub fn locked_center(&self) -> Option<GeoPoint> {
        self.locked_center
    }

    /// Moves translate so the locked point sits at the viewport center.
    pub fn recenter_on_lock(&mut self) -> bool {
        let Some(geo) = self.locked_center else {
            return false;
        };
        let Some(p) = self.projection.forward(geo) else {
            return false;
        };
        let t = self.projection.translate() + (self.viewport_center() - p);
        self.projection.set_translate(t);
        true
    }

    pub fn rotation(&self) -> [f64; 3] {
        self.projection.rotation()
    }

    /// Silently refuses projections that cannot rotate.
    pub fn rotate(&mut self, x: f64, y: f64, z: f64) -> bool {
        self.projection.set_rotation([x, y, z])
    }

    pub fn supports_rotation(&self) -> bool {
        self.projection.raw().supports_rotation()
    }

    pub fn supports_invert(&self) -> bool {
        self.projection.raw().has_inverse()
    }

    pub fn try_convert(&self, geo: GeoPoint) -> Option<Vec2> {
        self.projection.forward(geo)
    }

    /// Screen position of `geo`, or `(0, 0)` when it cannot be shown.
    pub fn convert(&self, geo: GeoPoint) -> Vec2 {
        self.try_convert(geo).unwrap_or(Vec2::ZERO)
    }

    pub fn try_invert(&self, screen: Vec2) -> Option<GeoPoint> {
        self.projection.inverse(screen)
    }

    /// Geographic position under `screen`, or `(0, 0)` when undefined.
    pub fn invert(&self, screen: Vec2) -> GeoPoint {
        self.try_invert(screen).unwrap_or(GeoPoint::ZERO)
    }

    pub fn geo_bounds(&self) -> Option<GeoBounds> {
        self.geo_bounds
    }

    pub fn geo_centroid(&self) -> GeoPoint {
        self.centroid
    }

    /// Translate that shows the zoom-1 fit view scaled by `zoom` about the
    /// viewport center.
    pub fn centered_translate(&self, zoom: f64) -> Vec2 {
        let c = self.viewport_center();
        c + (self.fit_translate - c) * zoom
    }

    /// Degrees of longitude and latitude covered by one pixel at `point`.
    pub fn pixel_to_geo_ratio(&self, point: Vec2) -> Option<(f64, f64)> {
        let g0 = self.try_invert(point)?;
        let g1 = self.try_invert(point + Vec2::new(1.0, 1.0))?;
        Some((
            (g1.longitude - g0.longitude).abs(),
            (g1.latitude - g0.latitude).abs(),
        ))
    }

    /// Target that keeps the geography under `point` in place while zooming
    /// to `level`, or moves it to the viewport center when `center` is set.
    pub fn zoom_to_point_target(&self, point: Vec2, level: f64, center: bool) -> ZoomTarget {
        let level = self.clamp_zoom(level);
        let anchor = if center { self.viewport_center() } else { point };
        let t = self.projection.translate();
        let z = self.zoom_level;
        ZoomTarget {
            translate: Vec2::new(
                anchor.x - safe_div(point.x - t.x, z, 0.0) * level,
                anchor.y - safe_div(point.y - t.y, z, 0.0) * level,
            ),
            zoom_level: level,
        }
    }

    /// Zoom that fits `bounds` into most of the plot area.
    ///
    /// The box is clamped vertically to the map's current screen bounds so
    /// zooming never reaches past the top or bottom of the map.
    pub fn zoom_to_geo_bounds_target(&self, bounds: GeoBounds) -> GeoZoom {
        let bounds = bounds.normalized();
        let mut p0 = self.convert(GeoPoint::new(bounds.left, bounds.top));
        let mut p1 = self.convert(GeoPoint::new(bounds.right, bounds.bottom));
        let map = self.map_screen_bounds();
        if !map.is_empty() {
            p0.y = p0.y.max(map.min.y);
            p1.y = p1.y.min(map.max.y);
        }

        let z = self.zoom_level;
        let fx = safe_div(self.viewport.x, p1.x - p0.x, f64::INFINITY).abs() * z;
        let fy = safe_div(self.viewport.y, p1.y - p0.y, f64::INFINITY).abs() * z;
        let fitted = BOUNDS_FIT_FRACTION * fx.min(fy);
        let zoom_level = if fitted.is_finite() { fitted } else { self.max_zoom };

        GeoZoom {
            point: self.invert(p0.midpoint(p1)),
            zoom_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionEngine;
    use crate::geometry::{Geometry, GeometryCollection};
    use crate::raw::ProjectionKind;
    use foundation::bounds::GeoBounds;
    use foundation::math::{GeoPoint, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn world() -> GeometryCollection {
        let mut ring = Vec::new();
        for lon in [-180.0, -90.0, 0.0, 90.0, 180.0] {
            ring.push([lon, -60.0]);
        }
        for lon in [180.0, 90.0, 0.0, -90.0, -180.0] {
            ring.push([lon, 60.0]);
        }
        ring.push([-180.0, -60.0]);
        std::iter::once(Geometry::Polygon(vec![ring])).collect()
    }

    fn engine(kind: ProjectionKind, w: f64, h: f64) -> ProjectionEngine {
        let mut e = ProjectionEngine::new(kind.into());
        e.set_geometry(world());
        e.set_viewport(w, h);
        e.fit();
        e
    }

    #[test]
    fn fits_world_into_viewport() {
        let e = engine(ProjectionKind::Mercator, 800.0, 600.0);
        assert_close(e.base_fit_scale(), 800.0 / std::f64::consts::TAU, 1e-9);
        assert_close(e.fit_translate().x, 400.0, 1e-9);
        assert_close(e.fit_translate().y, 300.0, 1e-9);
        let b = e.fit_bounds();
        assert_close(b.width(), 800.0, 1e-6);
        assert!(b.height() <= 600.0);
        assert_eq!(e.geo_bounds(), Some(GeoBounds::new(-180.0, 180.0, 60.0, -60.0)));
    }

    #[test]
    fn refit_is_idempotent() {
        let mut e = engine(ProjectionKind::EqualEarth, 640.0, 480.0);
        let (k, t) = (e.base_fit_scale(), e.fit_translate());
        e.fit();
        assert_eq!(e.base_fit_scale(), k);
        assert_eq!(e.fit_translate(), t);
    }

    #[test]
    fn zoom_to_center_keeps_centroid_centered() {
        let mut e = engine(ProjectionKind::Mercator, 800.0, 600.0);
        let target = e.zoom_to_point_target(Vec2::new(400.0, 300.0), 4.0, true);
        assert_eq!(target.zoom_level, 4.0);
        e.set_zoom_level(target.zoom_level);
        e.set_translate(target.translate);
        assert_close(e.scale(), e.base_fit_scale() * 4.0, 1e-9);
        let c = e.convert(e.geo_centroid());
        assert_close(c.x, 400.0, 1e-9);
        assert_close(c.y, 300.0, 1e-9);
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut e = engine(ProjectionKind::NaturalEarth1, 800.0, 600.0);
        e.set_zoom_level(1.5);
        e.set_translate(Vec2::new(380.0, 320.0));
        for p in [Vec2::new(123.0, 456.0), Vec2::new(700.0, 80.0)] {
            let g = e.invert(p);
            let mut z = e.clone();
            let target = z.zoom_to_point_target(p, 3.0, false);
            z.set_zoom_level(target.zoom_level);
            z.set_translate(target.translate);
            let back = z.convert(g);
            assert_close(back.x, p.x, 1e-6);
            assert_close(back.y, p.y, 1e-6);
        }
    }

    #[test]
    fn zoom_level_is_clamped() {
        let mut e = engine(ProjectionKind::Mercator, 800.0, 600.0);
        assert_eq!(e.set_zoom_level(100.0), 32.0);
        assert_eq!(e.set_zoom_level(0.1), 1.0);
        let target = e.zoom_to_point_target(Vec2::new(0.0, 0.0), 64.0, false);
        assert_eq!(target.zoom_level, 32.0);
    }

    #[test]
    fn locked_center_survives_zoom() {
        let mut e = engine(ProjectionKind::Equirectangular, 800.0, 600.0);
        let g = GeoPoint::new(30.0, 20.0);
        e.lock_center(Some(g));
        e.set_zoom_level(5.0);
        let p = e.convert(g);
        assert_close(p.x, 400.0, 1e-9);
        assert_close(p.y, 300.0, 1e-9);
    }

    #[test]
    fn round_trip_and_fallbacks() {
        let mut e = engine(ProjectionKind::Orthographic, 600.0, 600.0);
        e.rotate(-20.0, -10.0, 0.0);
        let g = GeoPoint::new(10.0, 25.0);
        let back = e.invert(e.convert(g));
        assert_close(back.longitude, g.longitude, 1e-9);
        assert_close(back.latitude, g.latitude, 1e-9);

        assert_eq!(e.convert(GeoPoint::new(-160.0, -10.0)), Vec2::ZERO);
        assert_eq!(e.try_convert(GeoPoint::new(-160.0, -10.0)), None);
        assert_eq!(e.invert(Vec2::new(-5000.0, 0.0)), GeoPoint::ZERO);
    }

    #[test]
    fn rotation_is_a_no_op_without_capability() {
        let mut e = engine(ProjectionKind::Identity, 100.0, 100.0);
        assert!(!e.supports_rotation());
        assert!(!e.rotate(10.0, 0.0, 0.0));
        assert_eq!(e.rotation(), [0.0; 3]);
    }

    #[test]
    fn centered_translate_scales_about_viewport_center() {
        let e = engine(ProjectionKind::Mercator, 800.0, 600.0);
        assert_eq!(e.centered_translate(1.0), e.fit_translate());
        let t = e.centered_translate(2.0);
        assert_close(t.x, 400.0, 1e-9);
        assert_close(t.y, 300.0, 1e-9);
    }

    #[test]
    fn pixel_ratio_matches_scale() {
        let e = engine(ProjectionKind::Equirectangular, 800.0, 600.0);
        let (lon, lat) = e.pixel_to_geo_ratio(Vec2::new(400.0, 300.0)).unwrap();
        let expected = (1.0 / e.scale()).to_degrees();
        assert_close(lon, expected, 1e-9);
        assert_close(lat, expected, 1e-9);
    }

    #[test]
    fn zoom_to_geo_bounds_fits_ninety_percent() {
        let e = engine(ProjectionKind::Equirectangular, 800.0, 600.0);
        let z = e.zoom_to_geo_bounds_target(GeoBounds::new(-45.0, 45.0, 30.0, -30.0));
        assert_close(z.zoom_level, 0.9 * 4.5, 1e-9);
        assert_close(z.point.longitude, 0.0, 1e-9);
        assert_close(z.point.latitude, 0.0, 1e-9);

        // Latitudes past the map are clamped to the map's screen bounds.
        let z = e.zoom_to_geo_bounds_target(GeoBounds::new(-45.0, 45.0, 89.0, -89.0));
        assert_close(z.zoom_level, 0.9 * 2.25, 1e-9);
    }
}
