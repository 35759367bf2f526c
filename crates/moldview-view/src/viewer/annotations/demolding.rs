use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use tracing::debug;

use super::{LABEL_HEIGHT_FRACTION, OwnedNodes};
use crate::viewer::label::{LabelSprite, LabelStyle};
use crate::viewer::math::{Axis, Bounds, Vec3};
use crate::viewer::mesh::ViewerMesh;
use crate::viewer::scene::{
    MeshMaterial, NodeFamily, NodeId, NodePayload, SceneGraph, SceneNode, Segment, Transform,
};
use crate::viewer::ui::Color32;

const AXES_FRACTION: f64 = 0.7;
const ARROW_LENGTH_FRACTION: f64 = 1.2;
const HEAD_SHARE: f64 = 0.2;
const SHAFT_RADIUS_FRACTION: f64 = 0.02;
const HEAD_RADIUS_FACTOR: f64 = 3.0;
const LABEL_GAP_FRACTION: f64 = 0.1;

pub const AXES_NODE: &str = "demolding-axes";
pub const ARROW_NODE: &str = "demolding-arrow";
pub const LABEL_NODE: &str = "demolding-label";

pub fn axis_color(axis: Axis) -> Color32 {
    match axis {
        Axis::X => Color32::RED,
        Axis::Y => Color32::GREEN,
        Axis::Z => Color32::BLUE,
    }
}

pub fn demolding_label(axis: Axis) -> String {
    format!("Demolding: {}+", axis.label())
}

fn primitive_rotation(axis: Axis) -> Option<(Vec3, f64)> {
    match axis {
        Axis::X => Some((Vec3::UNIT_Z, -FRAC_PI_2)),
        Axis::Y => None,
        Axis::Z => Some((Vec3::UNIT_X, FRAC_PI_2)),
    }
}

fn label_side(axis: Axis) -> Vec3 {
    match axis {
        Axis::X | Axis::Z => Vec3::UNIT_Y,
        Axis::Y => Vec3::UNIT_X,
    }
}

#[derive(Debug, Default)]
pub struct DemoldingIndicator {
    owned: OwnedNodes,
    arrow: Option<NodeId>,
}

impl DemoldingIndicator {
    pub fn build(&mut self, scene: &mut SceneGraph, bounds: &Bounds, axis: Axis) {
        self.clear(scene);

        let center = bounds.center();
        let max_dim = bounds.max_dimension();
        let dir = axis.unit();
        let color = axis_color(axis);

        let axes_size = max_dim * AXES_FRACTION;
        let axes = Axis::ALL
            .iter()
            .map(|&a| Segment {
                start: center,
                end: center + a.unit() * axes_size,
                color: axis_color(a),
            })
            .collect();
        self.owned.add(
            scene,
            SceneNode::new(AXES_NODE, NodeFamily::Demolding, NodePayload::Lines(axes)),
        );

        let length = max_dim * ARROW_LENGTH_FRACTION;
        let head_length = length * HEAD_SHARE;
        let shaft_length = length - head_length;
        let shaft_radius = max_dim * SHAFT_RADIUS_FRACTION;
        let head_radius = shaft_radius * HEAD_RADIUS_FACTOR;
        let rotation = primitive_rotation(axis);
        let material = MeshMaterial::phong(color, false);

        let group = self.owned.add(
            scene,
            SceneNode::new(ARROW_NODE, NodeFamily::Demolding, NodePayload::Group),
        );
        self.arrow = Some(group);

        let shaft = SceneNode::new(
            "demolding-arrow-shaft",
            NodeFamily::Demolding,
            NodePayload::Mesh {
                mesh: Arc::new(ViewerMesh::cylinder(shaft_radius, shaft_radius, shaft_length)),
                material,
            },
        )
        .with_parent(group)
        .with_transform(Transform {
            translation: center + dir * (shaft_length / 2.0),
            rotation,
        });
        self.owned.add(scene, shaft);

        let head = SceneNode::new(
            "demolding-arrow-head",
            NodeFamily::Demolding,
            NodePayload::Mesh {
                mesh: Arc::new(ViewerMesh::cone(head_radius, head_length)),
                material,
            },
        )
        .with_parent(group)
        .with_transform(Transform {
            translation: center + dir * (shaft_length + head_length / 2.0),
            rotation,
        });
        self.owned.add(scene, head);

        let gap = max_dim * LABEL_GAP_FRACTION;
        let label_position = center + dir * (length + gap) + label_side(axis) * gap;
        let sprite = LabelSprite::new(
            demolding_label(axis),
            LabelStyle::with_text_color(color),
            max_dim * LABEL_HEIGHT_FRACTION,
        );
        self.owned.add(
            scene,
            SceneNode::new(LABEL_NODE, NodeFamily::Demolding, NodePayload::Label(sprite))
                .with_transform(Transform::from_translation(label_position)),
        );

        debug!(axis = axis.label(), length, "demolding indicator built");
    }

    pub fn clear(&mut self, scene: &mut SceneGraph) -> usize {
        self.arrow = None;
        self.owned.clear(scene)
    }

    pub fn arrow(&self) -> Option<NodeId> {
        self.arrow
    }

    pub fn owned(&self) -> &OwnedNodes {
        &self.owned
    }
}
