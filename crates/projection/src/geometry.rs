use serde::{Deserialize, Serialize};

/// `[longitude, latitude]` in degrees.
pub type Position = [f64; 2];

/// GeoJSON-shaped geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// Visits every connected run of positions; `closed` is true for rings.
    pub fn for_each_path(&self, mut f: impl FnMut(&[Position], bool)) {
        match self {
            Geometry::Point(p) => f(std::slice::from_ref(p), false),
            Geometry::MultiPoint(points) => {
                for p in points {
                    f(std::slice::from_ref(p), false);
                }
            }
            Geometry::LineString(line) => f(line.as_slice(), false),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    f(line.as_slice(), false);
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    f(ring.as_slice(), true);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for ring in polygons.iter().flatten() {
                    f(ring.as_slice(), true);
                }
            }
        }
    }

    pub fn positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        self.for_each_path(|path, _| out.extend_from_slice(path));
        out
    }

    pub fn is_empty(&self) -> bool {
        let mut empty = true;
        self.for_each_path(|path, _| empty &= path.is_empty());
        empty
    }
}

/// The aggregate of every series' geometry, used for fitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryCollection {
    pub geometries: Vec<Geometry>,
}

impl GeometryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.iter().all(Geometry::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Geometry> {
        self.geometries.iter()
    }

    pub fn for_each_path(&self, mut f: impl FnMut(&[Position], bool)) {
        for g in &self.geometries {
            g.for_each_path(&mut f);
        }
    }
}

impl FromIterator<Geometry> for GeometryCollection {
    fn from_iter<I: IntoIterator<Item = Geometry>>(iter: I) -> Self {
        Self {
            geometries: iter.into_iter().collect(),
        }
    }
}

impl Extend<Geometry> for GeometryCollection {
    fn extend<I: IntoIterator<Item = Geometry>>(&mut self, iter: I) {
        self.geometries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, GeometryCollection};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_geojson_geometry() {
        let g: Geometry =
            serde_json::from_str(r#"{"type":"LineString","coordinates":[[0,0],[10,5]]}"#).unwrap();
        assert_eq!(g, Geometry::LineString(vec![[0.0, 0.0], [10.0, 5.0]]));
    }

    #[test]
    fn visits_rings_as_closed_paths() {
        let g = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0]]],
        ]);
        let mut paths = Vec::new();
        g.for_each_path(|p, closed| paths.push((p.len(), closed)));
        assert_eq!(paths, vec![(3, true), (3, true)]);
        assert_eq!(g.positions().len(), 6);
    }

    #[test]
    fn empty_collection_detection() {
        let mut c: GeometryCollection = std::iter::once(Geometry::MultiPoint(vec![])).collect();
        assert!(c.is_empty());
        c.push(Geometry::Point([1.0, 2.0]));
        assert!(!c.is_empty());
    }
}
