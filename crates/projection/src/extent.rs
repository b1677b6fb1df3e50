//! Geographic and projected extents of a geometry collection.

use foundation::bounds::{GeoBounds, ScreenBounds};
use foundation::math::{GeoPoint, Vec2, Vec3, spherical, wrap_lon_deg};

use crate::geometry::{Geometry, GeometryCollection, Position};
use crate::projector::GeoProjection;

/// Decimal places kept for reported geographic bounds.
pub const GEO_BOUNDS_DECIMALS: u32 = 3;

fn normalize_lon(lon: f64) -> f64 {
    if lon.abs() <= 180.0 { lon } else { wrap_lon_deg(lon) }
}

/// Longitude intervals covered by one path, splitting edges that cross the
/// antimeridian (an edge spanning more than 180 degrees is taken the short
/// way round).
fn push_path_intervals(path: &[Position], closed: bool, out: &mut Vec<(f64, f64)>) {
    let lons: Vec<f64> = path.iter().map(|p| normalize_lon(p[0])).collect();
    for &lon in &lons {
        out.push((lon, lon));
    }
    let mut edges: Vec<(f64, f64)> = lons.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && lons.len() > 2 {
        edges.push((lons[lons.len() - 1], lons[0]));
    }
    for (a, b) in edges {
        if (b - a).abs() <= 180.0 {
            out.push((a.min(b), a.max(b)));
        } else if a > b {
            out.push((a, 180.0));
            out.push((-180.0, b));
        } else {
            out.push((-180.0, a));
            out.push((b, 180.0));
        }
    }
}

fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Tightest rectangle around the collection, before normalization.
///
/// The longitude range is the complement of the largest uncovered gap on the
/// circle, so `right < left` when that gap is not the one at the antimeridian.
pub fn raw_geo_bounds(collection: &GeometryCollection) -> Option<GeoBounds> {
    let mut intervals = Vec::new();
    let mut top = f64::NEG_INFINITY;
    let mut bottom = f64::INFINITY;
    collection.for_each_path(|path, closed| {
        for p in path {
            top = top.max(p[1]);
            bottom = bottom.min(p[1]);
        }
        push_path_intervals(path, closed, &mut intervals);
    });
    if intervals.is_empty() {
        return None;
    }

    let merged = merge_intervals(intervals);
    let first = merged[0];
    let last = merged[merged.len() - 1];
    let wrap_gap = first.0 + 360.0 - last.1;
    let widest_inner = merged
        .windows(2)
        .map(|w| (w[1].0 - w[0].1, w[1].0, w[0].1))
        .max_by(|a, b| a.0.total_cmp(&b.0));

    let (left, right) = match widest_inner {
        Some((gap, left, right)) if gap > wrap_gap => (left, right),
        _ => (first.0, last.1),
    };
    Some(GeoBounds::new(left, right, top, bottom))
}

/// Geographic bounds as reported to listeners: wrapped ranges become the full
/// longitude range and values are rounded to suppress jitter.
pub fn compute_geo_bounds(collection: &GeometryCollection) -> Option<GeoBounds> {
    raw_geo_bounds(collection).map(|b| b.normalized().rounded(GEO_BOUNDS_DECIMALS))
}

#[derive(Default)]
struct Weighted {
    weight: f64,
    x: f64,
    y: f64,
}

impl Weighted {
    fn add(&mut self, w: f64, x: f64, y: f64) {
        self.weight += w;
        self.x += w * x;
        self.y += w * y;
    }

    fn centroid(&self) -> Option<GeoPoint> {
        (self.weight.abs() > 1e-12).then(|| GeoPoint::new(self.x / self.weight, self.y / self.weight))
    }
}

/// Signed shoelace area and the area-weighted centroid of a ring.
fn ring_area_centroid(ring: &[Position]) -> (f64, f64, f64) {
    let n = ring.len();
    let mut a2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let [x0, y0] = ring[i];
        let [x1, y1] = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        a2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    if a2 == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    (a2 / 2.0, cx / (3.0 * a2), cy / (3.0 * a2))
}

/// Centroid of the highest-dimension geometry present, computed in
/// longitude/latitude space. Empty input yields `(0, 0)`.
pub fn geo_centroid(collection: &GeometryCollection) -> GeoPoint {
    let mut areas = Weighted::default();
    let mut lines = Weighted::default();
    let mut points = Weighted::default();

    for geometry in collection.iter() {
        geometry.for_each_path(|path, _| {
            for p in path {
                points.add(1.0, p[0], p[1]);
            }
            for w in path.windows(2) {
                let len = (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]);
                lines.add(len, (w[0][0] + w[1][0]) / 2.0, (w[0][1] + w[1][1]) / 2.0);
            }
        });

        let polygons: Vec<&Vec<Vec<Position>>> = match geometry {
            Geometry::Polygon(rings) => vec![rings],
            Geometry::MultiPolygon(polys) => polys.iter().collect(),
            _ => Vec::new(),
        };
        for rings in polygons {
            for (i, ring) in rings.iter().enumerate() {
                let (area, x, y) = ring_area_centroid(ring);
                // Holes subtract regardless of winding.
                let w = if i == 0 { area.abs() } else { -area.abs() };
                areas.add(w, x, y);
            }
        }
    }

    areas
        .centroid()
        .or_else(|| lines.centroid())
        .or_else(|| points.centroid())
        .unwrap_or(GeoPoint::ZERO)
}

/// Bounds of the collection in unit coordinates of `projection`.
///
/// Points the projection cannot show are skipped; if any were skipped and the
/// projection clips to a cap, the cap's horizon is included so the visible
/// disc fits whole.
pub fn unit_extent(collection: &GeometryCollection, projection: &GeoProjection) -> ScreenBounds {
    let mut bounds = ScreenBounds::empty();
    let mut hidden = false;
    collection.for_each_path(|path, _| {
        for p in path {
            match projection.unit_point(GeoPoint::new(p[0], p[1])) {
                Some(u) => bounds.include(u),
                None => hidden = true,
            }
        }
    });

    if hidden {
        if let Some(clip) = projection.raw().clip_angle() {
            let (sin_c, cos_c) = clip.sin_cos();
            for step in 0..72 {
                let a = (step as f64 * 5.0).to_radians();
                let (lambda, phi) = spherical(Vec3::new(cos_c, sin_c * a.cos(), sin_c * a.sin()));
                if let Some([x, y]) = projection.raw().forward(lambda, phi) {
                    bounds.include(Vec2::new(x, -y));
                }
            }
        }
    }
    bounds
}
