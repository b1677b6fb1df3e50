//! The map chart: settings in, projected view out.
//!
//! Everything that changes the view (the public zoom API, gestures and
//! animations) writes settings. [`MapChart::tick`] advances animations and
//! then runs one reconciliation pass that brings the projection and the
//! series in line with whatever became dirty. Screen coordinates are relative
//! to the plot area, which is the chart size minus padding.

use foundation::bounds::GeoBounds;
use foundation::math::{GeoPoint, Vec2};
use foundation::time::Time;
use interaction::clamp::BoundsClamp;
use interaction::gesture::{
    GestureCommand, GestureConfig, GestureHost, GestureState, GestureStateMachine, PointerId, ViewState,
};
use interaction::modes::Axis;
use projection::engine::ProjectionEngine;
use projection::geometry::GeometryCollection;
use runtime::animation::{AnimationController, AnimationEvent, AnimationHandle, Easing};
use runtime::event_bus::EventBus;
use runtime::frame::Frame;
use serde::Serialize;
use tracing::debug;

use crate::config::MapChartConfig;
use crate::error::{ChartError, ConfigError};
use crate::keys::{MapPrivate, MapSetting, MapStore, MapStoreExt, SettingValue};
use crate::reconcile::{ChartEvent, Reconcile, ReconcilePhase, ReconcileReport};
use crate::series::{MapSeries, SeriesChange};

const ROTATION: [MapSetting; 3] = [MapSetting::RotationX, MapSetting::RotationY, MapSetting::RotationZ];
const TRANSLATE: [MapSetting; 2] = [MapSetting::TranslateX, MapSetting::TranslateY];

/// Snapshot of the displayed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub projection: String,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub zoom_level: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotation: [f64; 3],
    pub geo_bounds: Option<GeoBounds>,
    pub geo_centroid: GeoPoint,
}

#[derive(Debug)]
pub struct MapChart {
    store: MapStore,
    animations: AnimationController<MapSetting>,
    engine: ProjectionEngine,
    gestures: GestureStateMachine,
    series: Vec<Box<dyn MapSeries>>,
    /// The series list itself changed.
    geometry_dirty: bool,
    last_bounds: Option<GeoBounds>,
    now: Time,
    fitted: bool,
    /// Zoom or translate was written after the last fit. Refits then keep the
    /// geography at the plot center instead of returning to the fitted view.
    view_moved: bool,
}

impl MapChart {
    pub fn new(config: &MapChartConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut store = MapStore::new();
        config.apply_to(&mut store);
        let gestures = GestureStateMachine::new(gesture_config(&store));
        Ok(Self {
            store,
            animations: AnimationController::new(),
            engine: ProjectionEngine::new(config.projection.into()),
            gestures,
            series: Vec::new(),
            geometry_dirty: true,
            last_bounds: None,
            now: Time::ZERO,
            fitted: false,
            view_moved: false,
        })
    }

    pub fn get(&self, key: MapSetting) -> Option<&SettingValue> {
        self.store.get(key)
    }

    /// Writes a setting. A running animation on the same key is stopped so
    /// this write is not overwritten on the next tick.
    pub fn set(&mut self, key: MapSetting, value: SettingValue) -> bool {
        self.animations.stop(key);
        self.store.set(key, value)
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.store.set_private(MapPrivate::Width, width.into());
        self.store.set_private(MapPrivate::Height, height.into());
    }

    /// Advances animations to the frame time, then reconciles.
    pub fn tick(&mut self, frame: Frame, bus: &mut EventBus<ChartEvent>) -> ReconcileReport {
        self.now = frame.time;
        for event in self.animations.tick(frame.time, &mut self.store) {
            let AnimationEvent::Stopped { key, value, completed } = event;
            bus.emit(frame, ChartEvent::AnimationStopped { key, value, completed });
        }
        self.reconcile(frame, bus)
    }

    pub fn series(&self) -> &[Box<dyn MapSeries>] {
        &self.series
    }

    pub fn apply_series_change(&mut self, change: SeriesChange) -> Result<(), ChartError> {
        let len = self.series.len();
        let out_of_range = |index| ChartError::SeriesIndexOutOfRange { index, len };
        match change {
            SeriesChange::Push(series) => self.series.push(series),
            SeriesChange::Insert(index, series) => {
                if index > len {
                    return Err(out_of_range(index));
                }
                self.series.insert(index, series);
            }
            SeriesChange::Set(index, series) => {
                let slot = self.series.get_mut(index).ok_or_else(|| out_of_range(index))?;
                *slot = series;
            }
            SeriesChange::Remove(index) => {
                if index >= len {
                    return Err(out_of_range(index));
                }
                self.series.remove(index);
            }
            SeriesChange::Clear => self.series.clear(),
        }
        self.geometry_dirty = true;
        Ok(())
    }

    pub fn geo_centroid(&self) -> GeoPoint {
        self.engine.geo_centroid()
    }

    pub fn geo_bounds(&self) -> Option<GeoBounds> {
        self.engine.geo_bounds()
    }

    pub fn invert(&self, point: Vec2) -> GeoPoint {
        self.engine.invert(point)
    }

    pub fn convert(&self, geo: GeoPoint) -> Vec2 {
        self.engine.convert(geo)
    }

    pub fn view(&self) -> MapView {
        let t = self.engine.translate();
        let size = self.engine.viewport();
        MapView {
            projection: self.engine.projection().raw().name().to_string(),
            width: size.x,
            height: size.y,
            scale: self.engine.scale(),
            zoom_level: self.engine.zoom_level(),
            translate_x: t.x,
            translate_y: t.y,
            rotation: self.engine.rotation(),
            geo_bounds: self.engine.geo_bounds(),
            geo_centroid: self.engine.geo_centroid(),
        }
    }

    pub fn click_enabled(&self) -> bool {
        self.gestures.click_enabled()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    /// Animates to `level`, keeping the geography under `point` in place or,
    /// with `center`, moving it to the middle of the plot area.
    ///
    /// With `centerMapOnZoomOut`, zooming out to the home level or below
    /// centers the home point instead. `duration_ms` defaults to
    /// `animationDuration`.
    pub fn zoom_to_point(&mut self, point: Vec2, level: f64, center: bool, duration_ms: Option<f64>) -> AnimationHandle {
        let duration_s = self.duration_s(duration_ms);
        let easing = self.store.easing(MapSetting::AnimationEasing);
        self.zoom_to_point_with(point, level, center, duration_s, easing)
    }

    pub fn zoom_to_geo_point(
        &mut self,
        geo: GeoPoint,
        level: f64,
        center: bool,
        duration_ms: Option<f64>,
    ) -> AnimationHandle {
        let point = self.engine.convert(geo);
        self.zoom_to_point(point, level, center, duration_ms)
    }

    /// Zooms so `bounds` fills most of the plot area.
    pub fn zoom_to_geo_bounds(&mut self, bounds: GeoBounds, duration_ms: Option<f64>) -> AnimationHandle {
        let target = self.engine.zoom_to_geo_bounds_target(bounds);
        self.zoom_to_geo_point(target.point, target.zoom_level, true, duration_ms)
    }

    pub fn zoom_in(&mut self) -> AnimationHandle {
        self.zoom_by_step(true)
    }

    pub fn zoom_out(&mut self) -> AnimationHandle {
        self.zoom_by_step(false)
    }

    /// Returns to the home point, zoom level and rotation.
    pub fn go_home(&mut self, duration_ms: Option<f64>) -> AnimationHandle {
        let duration_s = self.duration_s(duration_ms);
        let easing = self.store.easing(MapSetting::AnimationEasing);
        if self.engine.supports_rotation() {
            for (key, home) in [
                (MapSetting::RotationX, MapSetting::HomeRotationX),
                (MapSetting::RotationY, MapSetting::HomeRotationY),
            ] {
                if let Some(to) = self.store.number(home) {
                    self.animations.animate(&mut self.store, key, to, duration_s, easing, self.now);
                }
            }
        }
        let point = self.engine.convert(self.home_geo_point());
        let level = self.store.number_or(MapSetting::HomeZoomLevel, 1.0);
        self.zoom_to_point_with(point, level, true, duration_s, easing)
    }

    pub fn pointer_down(&mut self, id: PointerId, point: Vec2) {
        self.gestures.set_config(gesture_config(&self.store));
        let host = ChartHost {
            engine: &self.engine,
            store: &self.store,
        };
        let commands = self.gestures.pointer_down(id, point, &host);
        self.apply_commands(commands);
    }

    pub fn pointer_move(&mut self, id: PointerId, point: Vec2) {
        let host = ChartHost {
            engine: &self.engine,
            store: &self.store,
        };
        let commands = self.gestures.pointer_move(id, point, &host);
        self.apply_commands(commands);
    }

    pub fn pointer_up(&mut self, id: PointerId) {
        self.gestures.pointer_up(id);
    }

    pub fn wheel(&mut self, point: Vec2, delta_x: f64, delta_y: f64) {
        self.gestures.set_config(gesture_config(&self.store));
        let host = ChartHost {
            engine: &self.engine,
            store: &self.store,
        };
        let commands = self.gestures.wheel(point, delta_x, delta_y, &host);
        self.apply_commands(commands);
    }

    fn duration_s(&self, duration_ms: Option<f64>) -> f64 {
        duration_ms.unwrap_or_else(|| self.store.number_or(MapSetting::AnimationDuration, 0.0)) / 1000.0
    }

    fn wheel_timing(&self) -> (f64, Easing) {
        (
            self.store.number_or(MapSetting::WheelDuration, 0.0) / 1000.0,
            self.store.easing(MapSetting::WheelEasing),
        )
    }

    fn home_geo_point(&self) -> GeoPoint {
        self.store
            .geo_point(MapSetting::HomeGeoPoint)
            .unwrap_or_else(|| self.engine.geo_centroid())
    }

    fn zoom_by_step(&mut self, zoom_in: bool) -> AnimationHandle {
        // Repeated clicks build on the level already being animated to.
        let current = self
            .animations
            .target_of(MapSetting::ZoomLevel)
            .unwrap_or_else(|| self.engine.zoom_level());
        let step = self.store.number_or(MapSetting::ZoomStep, 2.0);
        let level = if zoom_in { current * step } else { current / step };
        let center = self.engine.viewport_center();
        self.zoom_to_point(center, level, true, None)
    }

    fn zoom_to_point_with(
        &mut self,
        point: Vec2,
        level: f64,
        center: bool,
        duration_s: f64,
        easing: Easing,
    ) -> AnimationHandle {
        let level = self.engine.clamp_zoom(level);
        let home_level = self.store.number_or(MapSetting::HomeZoomLevel, 1.0);
        let home_point = if self.store.flag(MapSetting::CenterMapOnZoomOut, true) && level <= home_level {
            self.engine.try_convert(self.home_geo_point())
        } else {
            None
        };
        let (point, center) = match home_point {
            Some(p) => (p, true),
            None => (point, center),
        };

        let target = self.engine.zoom_to_point_target(point, level, center);
        let now = self.now;
        self.animations
            .animate(&mut self.store, MapSetting::TranslateX, target.translate.x, duration_s, easing, now);
        self.animations
            .animate(&mut self.store, MapSetting::TranslateY, target.translate.y, duration_s, easing, now);
        self.animations
            .animate(&mut self.store, MapSetting::ZoomLevel, target.zoom_level, duration_s, easing, now)
    }

    fn apply_commands(&mut self, commands: Vec<GestureCommand>) {
        for command in commands {
            match command {
                GestureCommand::StopAnimations => self.animations.stop_all(&MapSetting::VIEW),
                GestureCommand::SetTranslate(t) => {
                    self.store.set(MapSetting::TranslateX, t.x.into());
                    self.store.set(MapSetting::TranslateY, t.y.into());
                }
                GestureCommand::SetRotationX(v) => {
                    self.store.set(MapSetting::RotationX, v.into());
                }
                GestureCommand::SetRotationY(v) => {
                    self.store.set(MapSetting::RotationY, v.into());
                }
                GestureCommand::SetZoomLevel(z) => {
                    self.store.set(MapSetting::ZoomLevel, z.into());
                }
                GestureCommand::ZoomToPoint { point, level } => {
                    let (duration_s, easing) = self.wheel_timing();
                    self.zoom_to_point_with(point, level, false, duration_s, easing);
                }
                GestureCommand::AnimateRotation { axis, to } => {
                    let key = match axis {
                        Axis::X => MapSetting::RotationX,
                        Axis::Y => MapSetting::RotationY,
                    };
                    let (duration_s, easing) = self.wheel_timing();
                    self.animations.animate(&mut self.store, key, to, duration_s, easing, self.now);
                }
                GestureCommand::SetBackgroundClick(enabled) => {
                    self.store.set_private(MapPrivate::BackgroundClick, enabled.into());
                }
            }
        }
    }

    fn plot_size(&self) -> Vec2 {
        let width = self.store.private_number(MapPrivate::Width).unwrap_or(0.0);
        let height = self.store.private_number(MapPrivate::Height).unwrap_or(0.0);
        let [left, right, top, bottom] = MapSetting::PADDING.map(|k| self.store.number_or(k, 0.0));
        Vec2::new((width - left - right).max(0.0), (height - top - bottom).max(0.0))
    }

    fn rotation_setting(&self) -> [f64; 3] {
        ROTATION.map(|k| self.store.number_or(k, 0.0))
    }

    fn apply_zoom_setting(&mut self) {
        let requested = self.store.number_or(MapSetting::ZoomLevel, 1.0);
        let zoom = self.engine.set_zoom_level(requested);
        if zoom != requested {
            self.store.set_raw(MapSetting::ZoomLevel, zoom.into());
        }
    }

    /// Translate derived from a fit or a re-center only lands in the store
    /// when nothing else wrote it this pass.
    fn write_derived_translate(&mut self) {
        let t = self.engine.translate();
        for (key, v) in [(MapSetting::TranslateX, t.x), (MapSetting::TranslateY, t.y)] {
            if !self.store.is_dirty(key) {
                self.store.set_raw(key, v.into());
            }
        }
    }

    fn mark_series_dirty(&mut self) {
        for series in &mut self.series {
            series.mark_dirty_projection();
        }
    }

    fn refit(&mut self) {
        let [x, y, z] = self.rotation_setting();
        self.engine.rotate(x, y, z);
        self.engine.fit();
        self.fitted = true;
        self.apply_zoom_setting();
        let t = self.engine.centered_translate(self.engine.zoom_level());
        self.engine.set_translate(t);
        self.write_derived_translate();
        self.mark_series_dirty();
    }

    /// Moves translate so `anchor` sits at the plot center.
    fn recenter_on(&mut self, anchor: GeoPoint) {
        self.engine.lock_center(Some(anchor));
        self.engine.recenter_on_lock();
        self.engine.lock_center(None);
        self.write_derived_translate();
    }
}

impl Reconcile for MapChart {
    type Event = ChartEvent;

    fn reconcile(&mut self, frame: Frame, bus: &mut EventBus<ChartEvent>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let changes = self.store.change_set();
        let was_fitted = self.fitted;

        let mut geometry_dirty = std::mem::take(&mut self.geometry_dirty);
        for series in &mut self.series {
            geometry_dirty |= series.take_geometry_dirty();
        }
        let projection_dirty = changes.contains(MapSetting::Projection);
        let fit_needed = geometry_dirty || projection_dirty;
        let size_dirty = self.store.is_private_dirty(MapPrivate::Width)
            || self.store.is_private_dirty(MapPrivate::Height)
            || changes.contains_any(&MapSetting::PADDING);
        let keep_center = was_fitted && (size_dirty || (fit_needed && self.view_moved));
        let anchor = if keep_center {
            self.engine.try_invert(self.engine.viewport_center())
        } else {
            None
        };
        if size_dirty {
            let plot = self.plot_size();
            self.engine.set_viewport(plot.x, plot.y);
        }
        let zoom_bounds_dirty = changes.contains_any(&[MapSetting::MinZoomLevel, MapSetting::MaxZoomLevel]);
        if zoom_bounds_dirty {
            self.engine.set_zoom_bounds(
                self.store.number_or(MapSetting::MinZoomLevel, 1.0),
                self.store.number_or(MapSetting::MaxZoomLevel, 32.0),
            );
        }

        if geometry_dirty {
            let collection: GeometryCollection = self
                .series
                .iter()
                .filter(|s| s.affects_bounds())
                .flat_map(|s| s.geometries())
                .collect();
            self.engine.set_geometry(collection);
            report.record(ReconcilePhase::Geometry);
        }

        if projection_dirty {
            if let Some(raw) = self.store.projection() {
                self.engine.set_projection(raw);
            }
            report.record(ReconcilePhase::Projection);
        }

        if fit_needed {
            self.refit();
            if let Some(anchor) = anchor.filter(|_| self.view_moved) {
                self.recenter_on(anchor);
                debug!(
                    lon = anchor.longitude,
                    lat = anchor.latitude,
                    "kept center across refit"
                );
            }
            report.record(ReconcilePhase::Fit);
        }

        if size_dirty {
            if !fit_needed {
                self.refit();
            }
            if let Some(anchor) = anchor.filter(|_| !fit_needed) {
                self.recenter_on(anchor);
                debug!(
                    lon = anchor.longitude,
                    lat = anchor.latitude,
                    "recentered after resize"
                );
            }
            report.record(ReconcilePhase::Size);
        }

        let translate_dirty = changes.contains_any(&TRANSLATE);
        let zoom_dirty = changes.contains(MapSetting::ZoomLevel);
        if zoom_bounds_dirty || zoom_dirty {
            // Without a translate of its own, a zoom scales about the plot center.
            let center = if translate_dirty {
                None
            } else {
                self.engine.try_invert(self.engine.viewport_center())
            };
            self.engine.lock_center(center);
            self.apply_zoom_setting();
            self.engine.lock_center(None);
            if center.is_some() {
                self.write_derived_translate();
            }
            self.view_moved |= zoom_dirty && was_fitted;
            self.mark_series_dirty();
            report.record(ReconcilePhase::Zoom);
        }

        if translate_dirty {
            let t = self.engine.translate();
            self.engine.set_translate(Vec2::new(
                self.store.number_or(MapSetting::TranslateX, t.x),
                self.store.number_or(MapSetting::TranslateY, t.y),
            ));
            self.view_moved = true;
            self.mark_series_dirty();
            report.record(ReconcilePhase::Translate);
        }

        if changes.contains_any(&ROTATION) {
            let [x, y, z] = self.rotation_setting();
            self.engine.rotate(x, y, z);
            self.mark_series_dirty();
            report.record(ReconcilePhase::Rotation);
        }

        let bounds = self.engine.geo_bounds();
        if bounds != self.last_bounds {
            self.last_bounds = bounds;
            if let Some(bounds) = bounds {
                debug!(
                    left = bounds.left,
                    right = bounds.right,
                    top = bounds.top,
                    bottom = bounds.bottom,
                    "geo bounds changed"
                );
                bus.emit(frame, ChartEvent::GeoBoundsChanged { bounds });
                report.record(ReconcilePhase::BoundsChanged);
            }
        }

        let mut updated = false;
        for series in &mut self.series {
            updated |= series.update_projection(&self.engine);
        }
        if updated {
            report.record(ReconcilePhase::Series);
        }

        self.store.set_private_raw(MapPrivate::MapScale, self.engine.scale().into());
        self.store.clear_dirty();
        report
    }
}

fn gesture_config(store: &MapStore) -> GestureConfig {
    let defaults = GestureConfig::default();
    GestureConfig {
        pan_x: store.pan_x(),
        pan_y: store.pan_y(),
        wheel_x: store.wheel(MapSetting::WheelX),
        wheel_y: store.wheel(MapSetting::WheelY),
        pinch_zoom: store.flag(MapSetting::PinchZoom, defaults.pinch_zoom),
        zoom_step: store.number_or(MapSetting::ZoomStep, defaults.zoom_step),
        wheel_sensitivity: store.number_or(MapSetting::WheelSensitivity, defaults.wheel_sensitivity),
        drag_threshold: store.number_or(MapSetting::DragThreshold, defaults.drag_threshold),
    }
}

/// Read-only view of the chart handed to the gesture machine.
struct ChartHost<'a> {
    engine: &'a ProjectionEngine,
    store: &'a MapStore,
}

impl GestureHost for ChartHost<'_> {
    fn view(&self) -> ViewState {
        let t = self.engine.translate();
        ViewState {
            translate: Vec2::new(
                self.store.number_or(MapSetting::TranslateX, t.x),
                self.store.number_or(MapSetting::TranslateY, t.y),
            ),
            rotation_x: self.store.number_or(MapSetting::RotationX, 0.0),
            rotation_y: self.store.number_or(MapSetting::RotationY, 0.0),
            zoom_level: self.store.number_or(MapSetting::ZoomLevel, self.engine.zoom_level()),
        }
    }

    fn invert(&self, point: Vec2) -> Option<GeoPoint> {
        self.engine.try_invert(point)
    }

    fn supports_rotation(&self) -> bool {
        self.engine.supports_rotation()
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        self.engine.clamp_zoom(zoom)
    }

    fn clamp_translate(&self, translate: Vec2, zoom: f64) -> Vec2 {
        BoundsClamp {
            fit_bounds: self.engine.fit_bounds(),
            fit_translate: self.engine.fit_translate(),
            viewport: self.engine.viewport(),
            max_pan_out: self.store.number_or(MapSetting::MaxPanOut, 0.4),
        }
        .clamp(translate, zoom)
    }
}
