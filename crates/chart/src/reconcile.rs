use foundation::bounds::GeoBounds;
use runtime::event_bus::EventBus;
use runtime::frame::Frame;
use serde::Serialize;

use crate::keys::MapSetting;

/// Steps of one reconciliation pass, in the order they run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcilePhase {
    Geometry,
    Projection,
    Fit,
    Size,
    Zoom,
    Translate,
    Rotation,
    BoundsChanged,
    Series,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub phases: Vec<ReconcilePhase>,
}

impl ReconcileReport {
    pub(crate) fn record(&mut self, phase: ReconcilePhase) {
        self.phases.push(phase);
    }

    pub fn ran(&self, phase: ReconcilePhase) -> bool {
        self.phases.contains(&phase)
    }

    /// Nothing was dirty.
    pub fn is_idle(&self) -> bool {
        self.phases.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ChartEvent {
    GeoBoundsChanged { bounds: GeoBounds },
    AnimationStopped { key: MapSetting, value: f64, completed: bool },
}

/// A chart that converges its derived state to its settings once per tick.
pub trait Reconcile {
    type Event;

    fn reconcile(&mut self, frame: Frame, bus: &mut EventBus<Self::Event>) -> ReconcileReport;
}
