use foundation::math::GeoPoint;
use interaction::modes::{PanX, PanY, WheelMode};
use projection::raw::ProjectionRef;
use runtime::animation::Easing;
use runtime::settings::{AnimatableValue, SettingsStore};
use serde::Serialize;

/// User-facing map chart options.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MapSetting {
    Projection,
    PanX,
    PanY,
    WheelX,
    WheelY,
    ZoomStep,
    MinZoomLevel,
    MaxZoomLevel,
    PinchZoom,
    MaxPanOut,
    WheelSensitivity,
    /// Milliseconds.
    WheelDuration,
    WheelEasing,
    AnimationEasing,
    /// Milliseconds.
    AnimationDuration,
    HomeGeoPoint,
    HomeZoomLevel,
    HomeRotationX,
    HomeRotationY,
    CenterMapOnZoomOut,
    RotationX,
    RotationY,
    RotationZ,
    TranslateX,
    TranslateY,
    ZoomLevel,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    DragThreshold,
}

impl MapSetting {
    pub const VIEW: [MapSetting; 6] = [
        MapSetting::TranslateX,
        MapSetting::TranslateY,
        MapSetting::ZoomLevel,
        MapSetting::RotationX,
        MapSetting::RotationY,
        MapSetting::RotationZ,
    ];

    pub const PADDING: [MapSetting; 4] = [
        MapSetting::PaddingLeft,
        MapSetting::PaddingRight,
        MapSetting::PaddingTop,
        MapSetting::PaddingBottom,
    ];
}

/// Values the chart derives for itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapPrivate {
    Width,
    Height,
    MapScale,
    BackgroundClick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Number(f64),
    Bool(bool),
    PanX(PanX),
    PanY(PanY),
    Wheel(WheelMode),
    Easing(Easing),
    GeoPoint(GeoPoint),
    Projection(ProjectionRef),
}

impl AnimatableValue for SettingValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            SettingValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn from_number(v: f64) -> Self {
        SettingValue::Number(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Number(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

pub type MapStore = SettingsStore<MapSetting, MapPrivate, SettingValue>;

/// Typed reads with defaults.
pub trait MapStoreExt {
    fn flag(&self, key: MapSetting, default: bool) -> bool;
    fn easing(&self, key: MapSetting) -> Easing;
    fn geo_point(&self, key: MapSetting) -> Option<GeoPoint>;
    fn pan_x(&self) -> PanX;
    fn pan_y(&self) -> PanY;
    fn wheel(&self, key: MapSetting) -> WheelMode;
    fn projection(&self) -> Option<ProjectionRef>;
}

impl MapStoreExt for MapStore {
    fn flag(&self, key: MapSetting, default: bool) -> bool {
        match self.get(key) {
            Some(SettingValue::Bool(b)) => *b,
            _ => default,
        }
    }

    fn easing(&self, key: MapSetting) -> Easing {
        match self.get(key) {
            Some(SettingValue::Easing(e)) => *e,
            _ => Easing::default(),
        }
    }

    fn geo_point(&self, key: MapSetting) -> Option<GeoPoint> {
        match self.get(key) {
            Some(SettingValue::GeoPoint(g)) => Some(*g),
            _ => None,
        }
    }

    fn pan_x(&self) -> PanX {
        match self.get(MapSetting::PanX) {
            Some(SettingValue::PanX(p)) => *p,
            _ => PanX::default(),
        }
    }

    fn pan_y(&self) -> PanY {
        match self.get(MapSetting::PanY) {
            Some(SettingValue::PanY(p)) => *p,
            _ => PanY::default(),
        }
    }

    fn wheel(&self, key: MapSetting) -> WheelMode {
        match self.get(key) {
            Some(SettingValue::Wheel(w)) => *w,
            _ if key == MapSetting::WheelY => WheelMode::Zoom,
            _ => WheelMode::None,
        }
    }

    fn projection(&self) -> Option<ProjectionRef> {
        match self.get(MapSetting::Projection) {
            Some(SettingValue::Projection(p)) => Some(p.clone()),
            _ => None,
        }
    }
}
