//! Scripted chart sessions.
//!
//! A scenario is a JSON document with the geometry to show and a list of
//! steps. Time only moves on `tick` steps; everything else queues settings
//! that the next tick reconciles.

use chart::config::MapChartConfig;
use chart::error::{ChartError, ConfigError};
use chart::map_chart::{MapChart, MapView};
use chart::reconcile::{ChartEvent, ReconcileReport};
use chart::series::{GeometrySeries, SeriesChange};
use foundation::bounds::GeoBounds;
use foundation::math::{GeoPoint, Vec2};
use foundation::time::Time;
use projection::geometry::Geometry;
use runtime::event_bus::EventBus;
use runtime::frame::Frame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub geometries: Vec<Geometry>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    Resize {
        width: f64,
        height: f64,
    },
    /// Seconds since the start of the session.
    Tick {
        time: f64,
    },
    #[serde(rename_all = "camelCase")]
    PointerDown {
        id: u32,
        x: f64,
        y: f64,
    },
    #[serde(rename_all = "camelCase")]
    PointerMove {
        id: u32,
        x: f64,
        y: f64,
    },
    PointerUp {
        id: u32,
    },
    #[serde(rename_all = "camelCase")]
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        delta_x: f64,
        #[serde(default)]
        delta_y: f64,
    },
    ZoomToPoint {
        x: f64,
        y: f64,
        level: f64,
        #[serde(default)]
        center: bool,
        /// Milliseconds.
        duration: Option<f64>,
    },
    ZoomToGeoPoint {
        longitude: f64,
        latitude: f64,
        level: f64,
        #[serde(default)]
        center: bool,
        duration: Option<f64>,
    },
    ZoomToGeoBounds {
        bounds: GeoBounds,
        duration: Option<f64>,
    },
    ZoomIn,
    ZoomOut,
    GoHome {
        duration: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEvent {
    pub frame: u64,
    pub event: ChartEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutput {
    pub view: MapView,
    pub events: Vec<RecordedEvent>,
    pub reports: Vec<ReconcileReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioError {
    Config(ConfigError),
    Chart(ChartError),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Config(e) => write!(f, "{e}"),
            ScenarioError::Chart(e) => write!(f, "chart: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<ConfigError> for ScenarioError {
    fn from(e: ConfigError) -> Self {
        ScenarioError::Config(e)
    }
}

impl From<ChartError> for ScenarioError {
    fn from(e: ChartError) -> Self {
        ScenarioError::Chart(e)
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        ScenarioError::Config(e.into())
    }
}

pub fn parse(json: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_json::from_str(json)?)
}

pub fn run(config: &MapChartConfig, scenario: &Scenario) -> Result<ScenarioOutput, ScenarioError> {
    let mut chart = MapChart::new(config)?;
    if !scenario.geometries.is_empty() {
        let series = GeometrySeries::new(scenario.geometries.iter().cloned());
        chart.apply_series_change(SeriesChange::Push(Box::new(series)))?;
    }

    let mut bus = EventBus::new();
    let mut reports = Vec::new();
    let mut frame: Option<Frame> = None;
    for step in &scenario.steps {
        debug!(?step, "scenario step");
        match *step {
            Step::Resize { width, height } => chart.resize(width, height),
            Step::Tick { time } => {
                let next = match frame {
                    Some(prev) => Frame::at(prev.index + 1, Time(time), Time(time).since(prev.time)),
                    None => Frame::at(0, Time(time), 0.0),
                };
                frame = Some(next);
                reports.push(chart.tick(next, &mut bus));
            }
            Step::PointerDown { id, x, y } => chart.pointer_down(id, Vec2::new(x, y)),
            Step::PointerMove { id, x, y } => chart.pointer_move(id, Vec2::new(x, y)),
            Step::PointerUp { id } => chart.pointer_up(id),
            Step::Wheel {
                x,
                y,
                delta_x,
                delta_y,
            } => chart.wheel(Vec2::new(x, y), delta_x, delta_y),
            Step::ZoomToPoint {
                x,
                y,
                level,
                center,
                duration,
            } => {
                chart.zoom_to_point(Vec2::new(x, y), level, center, duration);
            }
            Step::ZoomToGeoPoint {
                longitude,
                latitude,
                level,
                center,
                duration,
            } => {
                chart.zoom_to_geo_point(GeoPoint::new(longitude, latitude), level, center, duration);
            }
            Step::ZoomToGeoBounds { bounds, duration } => {
                chart.zoom_to_geo_bounds(bounds, duration);
            }
            Step::ZoomIn => {
                chart.zoom_in();
            }
            Step::ZoomOut => {
                chart.zoom_out();
            }
            Step::GoHome { duration } => {
                chart.go_home(duration);
            }
        }
    }

    let events: Vec<RecordedEvent> = bus
        .drain()
        .into_iter()
        .map(|e| RecordedEvent {
            frame: e.frame_index,
            event: e.payload,
        })
        .collect();
    info!(
        steps = scenario.steps.len(),
        ticks = reports.len(),
        events = events.len(),
        "scenario finished"
    );
    Ok(ScenarioOutput {
        view: chart.view(),
        events,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::{ScenarioError, parse, run};
    use chart::config::MapChartConfig;
    use chart::error::ConfigError;
    use chart::reconcile::{ChartEvent, ReconcilePhase};
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    const WORLD: &str = r#"{"type":"Polygon","coordinates":[[
        [-180,-60],[-90,-60],[0,-60],[90,-60],[180,-60],
        [180,60],[90,60],[0,60],[-90,60],[-180,60],[-180,-60]]]}"#;

    fn scenario(steps: &str) -> String {
        format!(r#"{{"geometries":[{WORLD}],"steps":{steps}}}"#)
    }

    #[test]
    fn zoom_scenario_ends_centered() {
        let s = parse(&scenario(
            r#"[{"step":"resize","width":800,"height":600},
                {"step":"tick","time":0},
                {"step":"zoomToPoint","x":400,"y":300,"level":4,"center":true,"duration":500},
                {"step":"tick","time":0.25},
                {"step":"tick","time":0.5}]"#,
        ))
        .unwrap();
        let out = run(&MapChartConfig::default(), &s).unwrap();
        assert_eq!(out.view.zoom_level, 4.0);
        assert_close(out.view.translate_x, 400.0, 1e-9);
        assert_close(out.view.translate_y, 300.0, 1e-9);
        assert_eq!(out.reports.len(), 3);
        assert_eq!(
            out.reports[0].phases,
            vec![
                ReconcilePhase::Geometry,
                ReconcilePhase::Projection,
                ReconcilePhase::Fit,
                ReconcilePhase::Size,
                ReconcilePhase::Zoom,
                ReconcilePhase::Rotation,
                ReconcilePhase::BoundsChanged,
                ReconcilePhase::Series,
            ]
        );
        assert!(out.reports[1..].iter().all(|r| r.ran(ReconcilePhase::Zoom)));

        let bounds = out
            .events
            .iter()
            .filter(|e| matches!(e.event, ChartEvent::GeoBoundsChanged { .. }))
            .count();
        assert_eq!(bounds, 1);
        let completed = out
            .events
            .iter()
            .filter(|e| matches!(e.event, ChartEvent::AnimationStopped { completed: true, .. }))
            .count();
        assert_eq!(completed, 3);
        assert!(out.events.iter().all(|e| e.frame <= 2));
    }

    #[test]
    fn pinch_scenario() {
        let s = parse(&scenario(
            r#"[{"step":"resize","width":800,"height":600},
                {"step":"tick","time":0},
                {"step":"zoomToPoint","x":400,"y":300,"level":2,"center":true,"duration":0},
                {"step":"tick","time":0.1},
                {"step":"pointerDown","id":1,"x":100,"y":300},
                {"step":"pointerDown","id":2,"x":300,"y":300},
                {"step":"pointerMove","id":1,"x":50,"y":300},
                {"step":"pointerMove","id":2,"x":350,"y":300},
                {"step":"pointerUp","id":1},
                {"step":"pointerUp","id":2},
                {"step":"tick","time":0.2}]"#,
        ))
        .unwrap();
        let out = run(&MapChartConfig::default(), &s).unwrap();
        assert_close(out.view.zoom_level, 3.0, 1e-12);
    }

    #[test]
    fn output_serializes_to_json() {
        let s = parse(&scenario(
            r#"[{"step":"resize","width":400,"height":300},{"step":"tick","time":0}]"#,
        ))
        .unwrap();
        let out = run(&MapChartConfig::default(), &s).unwrap();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["view"]["projection"], "mercator");
        assert_eq!(v["events"][0]["event"]["type"], "geoBoundsChanged");
        assert_eq!(v["reports"][0]["phases"][0], "geometry");
    }

    #[test]
    fn unknown_step_is_rejected() {
        assert!(matches!(
            parse(r#"{"steps":[{"step":"explode"}]}"#),
            Err(ScenarioError::Config(ConfigError::Json(_)))
        ));
    }
}
