mod demolding;
mod dimensions;

pub use demolding::{
    ARROW_NODE, AXES_NODE, DemoldingIndicator, LABEL_NODE, axis_color, demolding_label,
};
pub use dimensions::{DimensionOverlay, Dimensions, calculate_dimensions};

use tracing::debug;

use super::scene::{NodeId, SceneGraph, SceneNode};

pub const LABEL_HEIGHT_FRACTION: f64 = 0.08;

#[derive(Debug, Default)]
pub struct OwnedNodes {
    ids: Vec<NodeId>,
}

impl OwnedNodes {
    pub fn add(&mut self, scene: &mut SceneGraph, node: SceneNode) -> NodeId {
        let id = scene.add(node);
        self.ids.push(id);
        id
    }

    /// Removes and disposes every owned node. Returns how many scene nodes went away.
    pub fn clear(&mut self, scene: &mut SceneGraph) -> usize {
        let mut removed = 0;
        for id in self.ids.drain(..) {
            removed += scene.remove_and_dispose(id);
        }
        if removed > 0 {
            debug!(removed, "annotation nodes cleared");
        }
        removed
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
