use moldview_base::Guid;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::camera::CameraKind;
use super::label::LabelSprite;
use super::math::{Vec3, rotate_around_axis};
use super::mesh::ViewerMesh;
use super::ui::Color32;

pub type NodeId = Guid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeFamily {
    Model,
    BoundingBox,
    Light,
    Camera,
    Dimensions,
    Demolding,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Option<(Vec3, f64)>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: None,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: None,
        }
    }

    pub fn with_rotation(mut self, axis: Vec3, angle: f64) -> Self {
        self.rotation = Some((axis, angle));
        self
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        let rotated = match self.rotation {
            Some((axis, angle)) => rotate_around_axis(point, Vec3::ZERO, axis, angle),
            None => point,
        };
        rotated + self.translation
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshMaterial {
    pub color: Color32,
    pub specular: Color32,
    pub shininess: f32,
    pub wireframe: bool,
}

impl MeshMaterial {
    pub fn phong(color: Color32, wireframe: bool) -> Self {
        Self {
            color,
            specular: Color32::from_gray(0x11),
            shininess: 30.0,
            wireframe,
        }
    }

    pub fn flat(color: Color32) -> Self {
        Self {
            color,
            specular: Color32::BLACK,
            shininess: 0.0,
            wireframe: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional { direction: Vec3 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color32,
    pub intensity: f32,
}

#[derive(Clone, Debug)]
pub enum NodePayload {
    Group,
    Mesh {
        mesh: Arc<ViewerMesh>,
        material: MeshMaterial,
    },
    Lines(Vec<Segment>),
    Label(LabelSprite),
    Light(Light),
    Camera(CameraKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: u64,
    kind: ResourceKind,
}

#[derive(Debug, Default)]
pub struct ResourceLedger {
    next_id: u64,
    live: HashSet<ResourceHandle>,
}

impl ResourceLedger {
    fn allocate(&mut self, kind: ResourceKind) -> ResourceHandle {
        self.next_id += 1;
        let handle = ResourceHandle {
            id: self.next_id,
            kind,
        };
        self.live.insert(handle);
        handle
    }

    fn release(&mut self, handle: ResourceHandle) -> bool {
        self.live.remove(&handle)
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.live.iter().filter(|handle| handle.kind == kind).count()
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    id: NodeId,
    pub name: String,
    pub family: NodeFamily,
    pub parent: Option<NodeId>,
    pub visible: bool,
    pub transform: Transform,
    pub payload: NodePayload,
    resources: Vec<ResourceHandle>,
    disposed: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, family: NodeFamily, payload: NodePayload) -> Self {
        Self {
            id: Guid::new(),
            name: name.into(),
            family,
            parent: None,
            visible: true,
            transform: Transform::IDENTITY,
            payload,
            resources: Vec::new(),
            disposed: false,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self, ledger: &mut ResourceLedger) -> bool {
        if self.disposed {
            debug!(node = %self.name, "node already disposed");
            return false;
        }
        for handle in self.resources.drain(..) {
            if !ledger.release(handle) {
                debug!(node = %self.name, ?handle, "resource already released");
            }
        }
        self.disposed = true;
        true
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        match self.payload {
            NodePayload::Mesh { .. } | NodePayload::Lines(_) => {
                &[ResourceKind::Geometry, ResourceKind::Material]
            }
            NodePayload::Label(_) => &[
                ResourceKind::Geometry,
                ResourceKind::Material,
                ResourceKind::Texture,
            ],
            NodePayload::Group | NodePayload::Light(_) | NodePayload::Camera(_) => &[],
        }
    }
}

#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    ledger: ResourceLedger,
    revision: u64,
    pub background: Color32,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(Color32::from_gray(0xF0))
    }
}

impl SceneGraph {
    pub fn new(background: Color32) -> Self {
        Self {
            nodes: Vec::new(),
            ledger: ResourceLedger::default(),
            revision: 0,
            background,
        }
    }

    pub fn add(&mut self, mut node: SceneNode) -> NodeId {
        let kinds = node.resource_kinds();
        node.resources = kinds.iter().map(|&kind| self.ledger.allocate(kind)).collect();
        let id = node.id;
        self.nodes.push(node);
        self.touch();
        id
    }

    /// Detaches a node and all of its descendants without releasing their resources.
    pub fn remove(&mut self, id: NodeId) -> Vec<SceneNode> {
        let mut doomed = vec![id];
        let mut idx = 0;
        while idx < doomed.len() {
            let parent = doomed[idx];
            doomed.extend(
                self.nodes
                    .iter()
                    .filter(|node| node.parent == Some(parent))
                    .map(|node| node.id),
            );
            idx += 1;
        }

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            if doomed.contains(&node.id) {
                removed.push(node);
            } else {
                kept.push(node);
            }
        }
        self.nodes = kept;
        if !removed.is_empty() {
            self.touch();
        }
        removed
    }

    /// Removes a node subtree and releases its resources. Returns the number of nodes removed.
    pub fn remove_and_dispose(&mut self, id: NodeId) -> usize {
        let removed = self.remove(id);
        let count = removed.len();
        for mut node in removed {
            node.dispose(&mut self.ledger);
        }
        count
    }

    pub fn clear(&mut self) {
        for mut node in self.nodes.drain(..) {
            node.dispose(&mut self.ledger);
        }
        self.touch();
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let node = self.nodes.iter_mut().find(|node| node.id == id)?;
        self.revision = self.revision.wrapping_add(1);
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_family(&self, family: NodeFamily) -> usize {
        self.nodes.iter().filter(|node| node.family == family).count()
    }

    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SceneNode> + 'a {
        self.nodes.iter().filter(move |node| node.name == name)
    }

    pub fn is_effectively_visible(&self, node: &SceneNode) -> bool {
        let mut current = Some(node);
        while let Some(node) = current {
            if !node.visible {
                return false;
            }
            current = node.parent.and_then(|parent| self.get(parent));
        }
        true
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_node(name: &str, family: NodeFamily) -> SceneNode {
        SceneNode::new(
            name,
            family,
            NodePayload::Lines(vec![Segment {
                start: Vec3::ZERO,
                end: Vec3::UNIT_X,
                color: Color32::BLACK,
            }]),
        )
    }

    #[test]
    fn removing_group_takes_children_and_releases_resources() {
        let mut scene = SceneGraph::default();
        let group = scene.add(SceneNode::new("group", NodeFamily::Demolding, NodePayload::Group));
        scene.add(line_node("a", NodeFamily::Demolding).with_parent(group));
        scene.add(line_node("b", NodeFamily::Demolding).with_parent(group));
        scene.add(line_node("other", NodeFamily::Dimensions));
        assert_eq!(scene.ledger().live(), 6);

        assert_eq!(scene.remove_and_dispose(group), 3);
        assert_eq!(scene.count_family(NodeFamily::Demolding), 0);
        assert_eq!(scene.count_family(NodeFamily::Dimensions), 1);
        assert_eq!(scene.ledger().live(), 2);
    }

    #[test]
    fn disposing_twice_is_harmless() {
        let mut scene = SceneGraph::default();
        let id = scene.add(line_node("a", NodeFamily::Dimensions));
        let mut removed = scene.remove(id);
        let mut ledger = ResourceLedger::default();
        let node = &mut removed[0];
        assert!(node.dispose(&mut scene.ledger));
        assert!(!node.dispose(&mut ledger));
        assert!(node.is_disposed());
        assert_eq!(scene.ledger().live(), 0);
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut scene = SceneGraph::default();
        let group =
            scene.add(SceneNode::new("group", NodeFamily::Demolding, NodePayload::Group).hidden());
        let child = scene.add(line_node("a", NodeFamily::Demolding).with_parent(group));
        let node = scene.get(child).unwrap();
        assert!(!scene.is_effectively_visible(node));
    }

    #[test]
    fn transform_rotates_then_translates() {
        let transform = Transform::from_translation(Vec3::new(0.0, 0.0, 5.0))
            .with_rotation(Vec3::UNIT_Z, -std::f64::consts::FRAC_PI_2);
        let moved = transform.apply(Vec3::UNIT_Y);
        assert!(moved.distance(Vec3::new(1.0, 0.0, 5.0)) < 1.0e-12);
    }
}
