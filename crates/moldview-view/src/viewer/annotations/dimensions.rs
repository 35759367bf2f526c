use moldview_base::DimensionUnit;
use tracing::debug;

use super::{LABEL_HEIGHT_FRACTION, OwnedNodes};
use crate::viewer::label::{LabelSprite, LabelStyle};
use crate::viewer::math::{Axis, Bounds, Vec3};
use crate::viewer::scene::{NodeFamily, NodePayload, SceneGraph, SceneNode, Segment, Transform};
use crate::viewer::ui::Color32;

const LINE_OFFSET_FRACTION: f64 = 0.1;
const CAP_FRACTION: f64 = 0.05;
const LINE_COLOR: Color32 = Color32::from_gray(0x20);

/// Bounding-box extents rounded to two decimals. The values carry no unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
            Axis::Z => self.depth,
        }
    }
}

pub fn calculate_dimensions(bounds: &Bounds) -> Dimensions {
    let size = bounds.size();
    Dimensions {
        width: round2(size.x),
        height: round2(size.y),
        depth: round2(size.z),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn axis_prefix(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "W",
        Axis::Y => "H",
        Axis::Z => "D",
    }
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "width",
        Axis::Y => "height",
        Axis::Z => "depth",
    }
}

#[derive(Debug, Default)]
pub struct DimensionOverlay {
    owned: OwnedNodes,
}

impl DimensionOverlay {
    pub fn build(
        &mut self,
        scene: &mut SceneGraph,
        bounds: &Bounds,
        unit: &DimensionUnit,
    ) -> Dimensions {
        self.clear(scene);

        let dims = calculate_dimensions(bounds);
        let max_dim = bounds.max_dimension();
        let offset = max_dim * LINE_OFFSET_FRACTION;
        let cap = max_dim * CAP_FRACTION;
        let label_height = max_dim * LABEL_HEIGHT_FRACTION;

        for axis in Axis::ALL {
            let measure = measurement(bounds, axis, offset, cap);
            let name = axis_name(axis);
            self.owned.add(
                scene,
                SceneNode::new(
                    format!("dimension-{name}-line"),
                    NodeFamily::Dimensions,
                    NodePayload::Lines(measure.segments.to_vec()),
                ),
            );

            let text = format!(
                "{}: {:.2} {}",
                axis_prefix(axis),
                dims.along(axis),
                unit.label()
            );
            let sprite = LabelSprite::new(text, LabelStyle::default(), label_height);
            self.owned.add(
                scene,
                SceneNode::new(
                    format!("dimension-{name}-label"),
                    NodeFamily::Dimensions,
                    NodePayload::Label(sprite),
                )
                .with_transform(Transform::from_translation(
                    measure.midpoint + measure.label_shift * label_height,
                )),
            );
        }

        debug!(
            width = dims.width,
            height = dims.height,
            depth = dims.depth,
            unit = unit.label(),
            "dimension overlay built"
        );
        dims
    }

    pub fn clear(&mut self, scene: &mut SceneGraph) -> usize {
        self.owned.clear(scene)
    }

    pub fn owned(&self) -> &OwnedNodes {
        &self.owned
    }
}

struct Measurement {
    segments: [Segment; 3],
    midpoint: Vec3,
    label_shift: Vec3,
}

fn measurement(bounds: &Bounds, axis: Axis, offset: f64, cap: f64) -> Measurement {
    let (min, max) = (bounds.min, bounds.max);
    let (start, end, cap_dir, label_shift) = match axis {
        Axis::X => {
            let y = min.y - offset;
            let z = max.z + offset;
            (
                Vec3::new(min.x, y, z),
                Vec3::new(max.x, y, z),
                Vec3::UNIT_Y,
                Vec3::new(0.0, -1.0, 0.0),
            )
        }
        Axis::Y => {
            let x = max.x + offset;
            let z = max.z + offset;
            (
                Vec3::new(x, min.y, z),
                Vec3::new(x, max.y, z),
                Vec3::UNIT_X,
                Vec3::UNIT_X,
            )
        }
        Axis::Z => {
            let x = max.x + offset;
            let y = min.y - offset;
            (
                Vec3::new(x, y, min.z),
                Vec3::new(x, y, max.z),
                Vec3::UNIT_X,
                Vec3::new(0.5, -0.5, 0.0),
            )
        }
    };
    let half_cap = cap_dir * (cap / 2.0);
    let segment = |start: Vec3, end: Vec3| Segment {
        start,
        end,
        color: LINE_COLOR,
    };
    Measurement {
        segments: [
            segment(start, end),
            segment(start - half_cap, start + half_cap),
            segment(end - half_cap, end + half_cap),
        ],
        midpoint: (start + end) * 0.5,
        label_shift,
    }
}
