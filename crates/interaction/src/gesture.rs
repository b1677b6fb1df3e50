//! Pointer and wheel interpretation.
//!
//! The machine never touches chart state. It reads the view through a
//! [`GestureHost`] and answers each input with a list of [`GestureCommand`]s
//! for the owner to apply.

use std::collections::BTreeMap;

use foundation::math::{GeoPoint, Vec2};
use tracing::trace;

use crate::modes::{Axis, PanX, PanY, WheelMode};

pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 5.0;

pub type PointerId = u32;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GestureConfig {
    pub pan_x: PanX,
    pub pan_y: PanY,
    pub wheel_x: WheelMode,
    pub wheel_y: WheelMode,
    pub pinch_zoom: bool,
    pub zoom_step: f64,
    pub wheel_sensitivity: f64,
    /// Distance a pointer must travel before a press counts as a drag.
    pub drag_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pan_x: PanX::TranslateX,
            pan_y: PanY::TranslateY,
            wheel_x: WheelMode::None,
            wheel_y: WheelMode::Zoom,
            pinch_zoom: true,
            zoom_step: 2.0,
            wheel_sensitivity: 1.0,
            drag_threshold: DEFAULT_DRAG_THRESHOLD_PX,
        }
    }
}

/// The parts of the view a gesture reads and restores from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    pub translate: Vec2,
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub zoom_level: f64,
}

pub trait GestureHost {
    fn view(&self) -> ViewState;
    fn invert(&self, point: Vec2) -> Option<GeoPoint>;
    fn supports_rotation(&self) -> bool;
    fn clamp_zoom(&self, zoom: f64) -> f64;
    fn clamp_translate(&self, translate: Vec2, zoom: f64) -> Vec2;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GestureCommand {
    /// Stop running pan, zoom and rotation animations.
    StopAnimations,
    SetTranslate(Vec2),
    SetRotationX(f64),
    SetRotationY(f64),
    SetZoomLevel(f64),
    /// Animated, anchor-preserving zoom.
    ZoomToPoint { point: Vec2, level: f64 },
    AnimateRotation { axis: Axis, to: f64 },
    SetBackgroundClick(bool),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    SingleDown,
    Dragging,
    Pinching,
}

#[derive(Debug)]
pub struct GestureStateMachine {
    config: GestureConfig,
    state: GestureState,
    pointers: BTreeMap<PointerId, Vec2>,
    down_points: BTreeMap<PointerId, Vec2>,
    snapshot: Option<ViewState>,
    /// Degrees per pixel `(lon, lat)`; kept across gestures.
    geo_ratio: (f64, f64),
    /// A pinch lost a pointer; moves are ignored until all are up.
    pinch_broken: bool,
    click_enabled: bool,
}

impl GestureStateMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            pointers: BTreeMap::new(),
            down_points: BTreeMap::new(),
            snapshot: None,
            geo_ratio: (0.0, 0.0),
            pinch_broken: false,
            click_enabled: true,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn click_enabled(&self) -> bool {
        self.click_enabled
    }

    pub fn geo_ratio(&self) -> (f64, f64) {
        self.geo_ratio
    }

    fn transition(&mut self, next: GestureState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "gesture state");
            self.state = next;
        }
    }

    fn pans(&self) -> bool {
        self.config.pan_x.is_active() || self.config.pan_y.is_active()
    }

    pub fn pointer_down(&mut self, id: PointerId, point: Vec2, host: &impl GestureHost) -> Vec<GestureCommand> {
        let mut out = Vec::new();
        match self.pointers.len() {
            0 => {
                self.pointers.insert(id, point);
                self.down_points.clear();
                self.down_points.insert(id, point);
                self.snapshot = Some(host.view());
                self.pinch_broken = false;
                if let (Some(g0), Some(g1)) = (host.invert(point), host.invert(point + Vec2::new(1.0, 1.0))) {
                    self.geo_ratio = (
                        (g1.longitude - g0.longitude).abs(),
                        (g1.latitude - g0.latitude).abs(),
                    );
                }
                self.click_enabled = true;
                out.push(GestureCommand::SetBackgroundClick(true));
                if self.pans() {
                    out.push(GestureCommand::StopAnimations);
                }
                self.transition(GestureState::SingleDown);
            }
            1 if self.config.pinch_zoom && !self.pointers.contains_key(&id) => {
                self.pointers.insert(id, point);
                self.down_points = self.pointers.clone();
                self.snapshot = Some(host.view());
                self.pinch_broken = false;
                out.push(GestureCommand::StopAnimations);
                self.transition(GestureState::Pinching);
            }
            _ => {}
        }
        out
    }

    pub fn pointer_move(&mut self, id: PointerId, point: Vec2, host: &impl GestureHost) -> Vec<GestureCommand> {
        let Some(slot) = self.pointers.get_mut(&id) else {
            return Vec::new();
        };
        *slot = point;
        match self.state {
            GestureState::Idle => Vec::new(),
            GestureState::SingleDown => {
                let Some(down) = self.down_points.get(&id).copied() else {
                    return Vec::new();
                };
                if down.distance(point) <= self.config.drag_threshold {
                    return Vec::new();
                }
                self.click_enabled = false;
                self.transition(GestureState::Dragging);
                let mut out = vec![GestureCommand::SetBackgroundClick(false)];
                out.extend(self.pan(down, point, host));
                out
            }
            GestureState::Dragging => match self.down_points.get(&id).copied() {
                Some(down) => self.pan(down, point, host),
                None => Vec::new(),
            },
            GestureState::Pinching => self.pinch(host),
        }
    }

    pub fn pointer_up(&mut self, id: PointerId) {
        if self.pointers.remove(&id).is_none() {
            return;
        }
        self.down_points.remove(&id);
        if self.pointers.is_empty() {
            self.snapshot = None;
            self.pinch_broken = false;
            self.down_points.clear();
            self.transition(GestureState::Idle);
        } else if self.state == GestureState::Pinching {
            self.pinch_broken = true;
        }
    }

    fn pan(&self, down: Vec2, point: Vec2, host: &impl GestureHost) -> Vec<GestureCommand> {
        let Some(snap) = self.snapshot else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut t = snap.translate;
        let mut translates = false;
        let rotates = host.supports_rotation();

        match self.config.pan_x {
            PanX::TranslateX => {
                t.x += point.x - down.x;
                translates = true;
            }
            PanX::RotateX if rotates => {
                out.push(GestureCommand::SetRotationX(
                    snap.rotation_x - (down.x - point.x) * self.geo_ratio.0,
                ));
            }
            _ => {}
        }
        match self.config.pan_y {
            PanY::TranslateY => {
                t.y += point.y - down.y;
                translates = true;
            }
            PanY::RotateY if rotates => {
                out.push(GestureCommand::SetRotationY(
                    snap.rotation_y + (down.y - point.y) * self.geo_ratio.1,
                ));
            }
            _ => {}
        }
        if translates {
            out.push(GestureCommand::SetTranslate(host.clamp_translate(t, snap.zoom_level)));
        }
        out
    }

    /// The geography under the midpoint of the down points ends up under the
    /// midpoint of the current points.
    fn pinch(&self, host: &impl GestureHost) -> Vec<GestureCommand> {
        if self.pinch_broken || self.pointers.len() < 2 {
            return Vec::new();
        }
        let Some(snap) = self.snapshot else {
            return Vec::new();
        };
        let mut ids = self.pointers.keys();
        let (Some(a), Some(b)) = (ids.next(), ids.next()) else {
            return Vec::new();
        };
        let (Some(&da), Some(&db)) = (self.down_points.get(a), self.down_points.get(b)) else {
            return Vec::new();
        };
        let (ca, cb) = (self.pointers[a], self.pointers[b]);

        let initial = da.distance(db);
        if initial == 0.0 || snap.zoom_level == 0.0 {
            return Vec::new();
        }
        let level = host.clamp_zoom(snap.zoom_level * ca.distance(cb) / initial);
        let down_center = da.midpoint(db);
        let move_center = ca.midpoint(cb);
        let t = move_center - (down_center - snap.translate) * (level / snap.zoom_level);
        vec![
            GestureCommand::SetZoomLevel(level),
            GestureCommand::SetTranslate(host.clamp_translate(t, level)),
        ]
    }

    pub fn wheel(&mut self, point: Vec2, delta_x: f64, delta_y: f64, host: &impl GestureHost) -> Vec<GestureCommand> {
        let view = host.view();
        let mut out = Vec::new();
        for (mode, delta) in [(self.config.wheel_x, delta_x), (self.config.wheel_y, delta_y)] {
            if delta == 0.0 || !delta.is_finite() {
                continue;
            }
            let step = delta / 5.0 * self.config.wheel_sensitivity;
            match mode {
                WheelMode::None => {}
                WheelMode::Zoom => {
                    let level = if delta > 0.0 {
                        view.zoom_level / self.config.zoom_step
                    } else {
                        view.zoom_level * self.config.zoom_step
                    };
                    out.push(GestureCommand::ZoomToPoint {
                        point,
                        level: host.clamp_zoom(level),
                    });
                }
                WheelMode::RotateX if host.supports_rotation() => out.push(GestureCommand::AnimateRotation {
                    axis: Axis::X,
                    to: view.rotation_x - step,
                }),
                WheelMode::RotateY if host.supports_rotation() => out.push(GestureCommand::AnimateRotation {
                    axis: Axis::Y,
                    to: view.rotation_y - step,
                }),
                WheelMode::RotateX | WheelMode::RotateY => {}
            }
        }
        out
    }
}
