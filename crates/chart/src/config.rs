//! Map chart options as loaded from JSON.

use foundation::math::GeoPoint;
use interaction::gesture::DEFAULT_DRAG_THRESHOLD_PX;
use interaction::modes::{PanX, PanY, WheelMode};
use projection::raw::ProjectionKind;
use runtime::animation::Easing;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::{MapSetting, MapStore, SettingValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MapChartConfig {
    pub projection: ProjectionKind,
    pub pan_x: PanX,
    pub pan_y: PanY,
    pub wheel_x: WheelMode,
    pub wheel_y: WheelMode,
    pub zoom_step: f64,
    pub min_zoom_level: f64,
    pub max_zoom_level: f64,
    pub pinch_zoom: bool,
    pub max_pan_out: f64,
    pub wheel_sensitivity: f64,
    /// Milliseconds.
    pub wheel_duration: f64,
    pub wheel_easing: Easing,
    pub animation_easing: Easing,
    /// Milliseconds.
    pub animation_duration: f64,
    pub home_geo_point: Option<GeoPoint>,
    pub home_zoom_level: f64,
    pub home_rotation_x: Option<f64>,
    pub home_rotation_y: Option<f64>,
    pub center_map_on_zoom_out: bool,
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub rotation_z: f64,
    pub zoom_level: f64,
    /// Overrides the translate derived from fitting.
    pub translate_x: Option<f64>,
    pub translate_y: Option<f64>,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub drag_threshold: f64,
}

impl Default for MapChartConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Mercator,
            pan_x: PanX::TranslateX,
            pan_y: PanY::TranslateY,
            wheel_x: WheelMode::None,
            wheel_y: WheelMode::Zoom,
            zoom_step: 2.0,
            min_zoom_level: 1.0,
            max_zoom_level: 32.0,
            pinch_zoom: true,
            max_pan_out: 0.4,
            wheel_sensitivity: 1.0,
            wheel_duration: 0.0,
            wheel_easing: Easing::CubicOut,
            animation_easing: Easing::CubicOut,
            animation_duration: 700.0,
            home_geo_point: None,
            home_zoom_level: 1.0,
            home_rotation_x: None,
            home_rotation_y: None,
            center_map_on_zoom_out: true,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            zoom_level: 1.0,
            translate_x: None,
            translate_y: None,
            padding_left: 0.0,
            padding_right: 0.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            drag_threshold: DEFAULT_DRAG_THRESHOLD_PX,
        }
    }
}

impl MapChartConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if !(self.min_zoom_level > 0.0) || !(self.max_zoom_level > 0.0) {
            return invalid(format!(
                "zoom levels must be positive (min {}, max {})",
                self.min_zoom_level, self.max_zoom_level
            ));
        }
        if self.min_zoom_level > self.max_zoom_level {
            return invalid(format!(
                "minZoomLevel {} exceeds maxZoomLevel {}",
                self.min_zoom_level, self.max_zoom_level
            ));
        }
        if !(self.zoom_step > 1.0) {
            return invalid(format!("zoomStep must be greater than 1, got {}", self.zoom_step));
        }
        if !(self.max_pan_out >= 0.0) {
            return invalid(format!("maxPanOut must not be negative, got {}", self.max_pan_out));
        }
        if !(self.drag_threshold >= 0.0) {
            return invalid(format!("dragThreshold must not be negative, got {}", self.drag_threshold));
        }
        if self.animation_duration < 0.0 || self.wheel_duration < 0.0 {
            return invalid("durations must not be negative".to_string());
        }
        Ok(())
    }

    /// Writes every option into `store` with `set`, so changed options are
    /// picked up by the next reconciliation pass.
    pub fn apply_to(&self, store: &mut MapStore) {
        use MapSetting as K;
        use SettingValue as V;

        store.set(K::Projection, V::Projection(self.projection.into()));
        store.set(K::PanX, V::PanX(self.pan_x));
        store.set(K::PanY, V::PanY(self.pan_y));
        store.set(K::WheelX, V::Wheel(self.wheel_x));
        store.set(K::WheelY, V::Wheel(self.wheel_y));
        store.set(K::WheelEasing, V::Easing(self.wheel_easing));
        store.set(K::AnimationEasing, V::Easing(self.animation_easing));
        store.set(K::PinchZoom, V::Bool(self.pinch_zoom));
        store.set(K::CenterMapOnZoomOut, V::Bool(self.center_map_on_zoom_out));

        for (key, value) in [
            (K::ZoomStep, self.zoom_step),
            (K::MinZoomLevel, self.min_zoom_level),
            (K::MaxZoomLevel, self.max_zoom_level),
            (K::MaxPanOut, self.max_pan_out),
            (K::WheelSensitivity, self.wheel_sensitivity),
            (K::WheelDuration, self.wheel_duration),
            (K::AnimationDuration, self.animation_duration),
            (K::HomeZoomLevel, self.home_zoom_level),
            (K::RotationX, self.rotation_x),
            (K::RotationY, self.rotation_y),
            (K::RotationZ, self.rotation_z),
            (K::ZoomLevel, self.zoom_level),
            (K::PaddingLeft, self.padding_left),
            (K::PaddingRight, self.padding_right),
            (K::PaddingTop, self.padding_top),
            (K::PaddingBottom, self.padding_bottom),
            (K::DragThreshold, self.drag_threshold),
        ] {
            store.set(key, V::Number(value));
        }

        for (key, value) in [
            (K::HomeRotationX, self.home_rotation_x),
            (K::HomeRotationY, self.home_rotation_y),
        ] {
            match value {
                Some(v) => store.set(key, V::Number(v)),
                None => store.remove(key).is_some(),
            };
        }
        // Left alone when unset so the fitted translate survives a re-apply.
        for (key, value) in [(K::TranslateX, self.translate_x), (K::TranslateY, self.translate_y)] {
            if let Some(v) = value {
                store.set(key, V::Number(v));
            }
        }
        match self.home_geo_point {
            Some(g) => store.set(K::HomeGeoPoint, V::GeoPoint(g)),
            None => store.remove(K::HomeGeoPoint).is_some(),
        };
    }
}
