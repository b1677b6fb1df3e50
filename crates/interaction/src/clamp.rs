//! Legal translate ranges for panning.
//!
//! Map screen position at zoom `z` and translate `t` is
//! `t + z * (fit_bounds - fit_translate)`. The range is centered on the
//! translate that puts the map center at the viewport center; its half width
//! is `|W - w| / 2 + max_pan_out * W` with `W` the scaled map extent and `w`
//! the viewport extent. When the map is larger than the viewport this keeps
//! the viewport covered up to the allowance; when it is smaller it keeps the
//! map inside the viewport up to the allowance.

use foundation::bounds::ScreenBounds;
use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TranslateBounds {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl TranslateBounds {
    pub fn clamp(&self, t: Vec2) -> Vec2 {
        Vec2::new(self.x.clamp(t.x), self.y.clamp(t.y))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundsClamp {
    /// Map screen bounds at zoom 1 with the fit translate.
    pub fit_bounds: ScreenBounds,
    pub fit_translate: Vec2,
    pub viewport: Vec2,
    pub max_pan_out: f64,
}

fn axis(center: f64, extent_at_zoom: f64, viewport: f64, max_pan_out: f64) -> AxisRange {
    let half = (extent_at_zoom - viewport).abs() / 2.0 + max_pan_out.max(0.0) * extent_at_zoom;
    AxisRange {
        min: center - half,
        max: center + half,
    }
}

impl BoundsClamp {
    /// `None` when there is no geometry to clamp against.
    pub fn range(&self, zoom: f64) -> Option<TranslateBounds> {
        if self.fit_bounds.is_empty() {
            return None;
        }
        let c = self.viewport * 0.5;
        let offset = self.fit_bounds.center() - self.fit_translate;
        let centered = c - offset * zoom;
        Some(TranslateBounds {
            x: axis(centered.x, self.fit_bounds.width() * zoom, self.viewport.x, self.max_pan_out),
            y: axis(centered.y, self.fit_bounds.height() * zoom, self.viewport.y, self.max_pan_out),
        })
    }

    pub fn clamp(&self, t: Vec2, zoom: f64) -> Vec2 {
        match self.range(zoom) {
            Some(range) => range.clamp(t),
            None => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoundsClamp;
    use foundation::bounds::ScreenBounds;
    use foundation::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// A 400x200 map fitted at the center of a viewport.
    fn clamp_for(viewport: Vec2, max_pan_out: f64) -> BoundsClamp {
        let fit_translate = viewport * 0.5;
        BoundsClamp {
            fit_bounds: ScreenBounds::new(
                fit_translate - Vec2::new(200.0, 100.0),
                fit_translate + Vec2::new(200.0, 100.0),
            ),
            fit_translate,
            viewport,
            max_pan_out,
        }
    }

    fn map_at(c: &BoundsClamp, t: Vec2, zoom: f64) -> (Vec2, Vec2) {
        (
            t + (c.fit_bounds.min - c.fit_translate) * zoom,
            t + (c.fit_bounds.max - c.fit_translate) * zoom,
        )
    }

    #[test]
    fn centered_map_is_always_legal() {
        let c = clamp_for(Vec2::new(800.0, 600.0), 0.0);
        for zoom in [1.0, 2.0, 7.5] {
            let t = c.clamp(Vec2::new(400.0, 300.0), zoom);
            assert_close(t.x, 400.0, 1e-9);
            assert_close(t.y, 300.0, 1e-9);
        }
    }

    #[test]
    fn clamped_map_stays_within_allowance() {
        let m = 0.4;
        for viewport in [Vec2::new(1.0, 1.0), Vec2::new(300.0, 150.0), Vec2::new(800.0, 600.0), Vec2::new(2000.0, 90.0)] {
            let c = clamp_for(viewport, m);
            for zoom in [1.0, 1.5, 4.0, 32.0] {
                for t in [Vec2::new(-1e6, -1e6), Vec2::new(1e6, 1e6), Vec2::new(-1e6, 1e6)] {
                    let t = c.clamp(t, zoom);
                    let (lo, hi) = map_at(&c, t, zoom);
                    for (l, h, w) in [(lo.x, hi.x, viewport.x), (lo.y, hi.y, viewport.y)] {
                        let extent = h - l;
                        let slack = m * extent + 1e-6;
                        if extent >= w {
                            assert!(l <= slack, "left edge {l} pulled in past {slack}");
                            assert!(h >= w - slack, "right edge {h} pulled in past {}", w - slack);
                        } else {
                            assert!(l >= -slack, "map escaped left: {l}");
                            assert!(h <= w + slack, "map escaped right: {h}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn range_widens_with_allowance() {
        let tight = clamp_for(Vec2::new(800.0, 600.0), 0.0).range(2.0).unwrap();
        let loose = clamp_for(Vec2::new(800.0, 600.0), 0.4).range(2.0).unwrap();
        // W = 800 at zoom 2, so the tight range collapses to the center.
        assert_close(tight.x.min, tight.x.max, 1e-9);
        assert_close(loose.x.max - loose.x.min, 2.0 * 0.4 * 800.0, 1e-9);
    }

    #[test]
    fn empty_geometry_does_not_clamp() {
        let c = BoundsClamp {
            fit_bounds: ScreenBounds::empty(),
            fit_translate: Vec2::ZERO,
            viewport: Vec2::new(100.0, 100.0),
            max_pan_out: 0.4,
        };
        assert_eq!(c.clamp(Vec2::new(1e6, -3.0), 2.0), Vec2::new(1e6, -3.0));
    }
}
