use moldview_base::DimensionUnit;

use super::camera::CameraKind;
use super::math::Axis;
use super::ui::Color32;

pub const DEFAULT_MODEL_COLOR: Color32 = Color32::from_gray(0xAA);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportPhase {
    Empty,
    Loading,
    Ready,
    Disposed,
}

impl ViewportPhase {
    pub fn label(self) -> &'static str {
        match self {
            ViewportPhase::Empty => "empty",
            ViewportPhase::Loading => "loading",
            ViewportPhase::Ready => "ready",
            ViewportPhase::Disposed => "disposed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportState {
    pub phase: ViewportPhase,
    pub color: Color32,
    pub wireframe: bool,
    pub bounding_box_visible: bool,
    pub camera_kind: CameraKind,
    pub dimensions_visible: bool,
    pub unit: DimensionUnit,
    pub demolding_visible: bool,
    pub demolding_axis: Axis,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            phase: ViewportPhase::Empty,
            color: DEFAULT_MODEL_COLOR,
            wireframe: false,
            bounding_box_visible: false,
            camera_kind: CameraKind::Perspective,
            dimensions_visible: false,
            unit: DimensionUnit::default(),
            demolding_visible: false,
            demolding_axis: Axis::Z,
        }
    }
}

impl ViewportState {
    pub fn with(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == ViewportPhase::Disposed
    }
}
