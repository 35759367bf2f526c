use tracing::debug;

use super::camera::Camera;
use super::scene::{NodePayload, SceneGraph};
use super::surface::SurfaceSize;

pub trait SceneRenderer {
    fn resize(&mut self, size: SurfaceSize);
    fn render(&mut self, scene: &SceneGraph, camera: &Camera);
    fn dispose(&mut self);
    fn draw_calls(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    size: Option<SurfaceSize>,
    draw_calls: u64,
    last_drawn: usize,
    last_camera: Option<Camera>,
    disposed: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Option<SurfaceSize> {
        self.size
    }

    pub fn last_drawn(&self) -> usize {
        self.last_drawn
    }

    pub fn last_camera(&self) -> Option<&Camera> {
        self.last_camera.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        if self.disposed {
            return;
        }
        self.size = Some(size);
    }

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) {
        if self.disposed {
            debug!("render after dispose ignored");
            return;
        }
        self.last_drawn = scene
            .nodes()
            .iter()
            .filter(|node| {
                matches!(
                    node.payload,
                    NodePayload::Mesh { .. } | NodePayload::Lines(_) | NodePayload::Label(_)
                ) && scene.is_effectively_visible(node)
            })
            .count();
        self.last_camera = Some(*camera);
        self.draw_calls += 1;
    }

    fn dispose(&mut self) {
        if self.disposed {
            debug!("headless renderer already disposed");
            return;
        }
        self.disposed = true;
        self.last_camera = None;
    }

    fn draw_calls(&self) -> u64 {
        self.draw_calls
    }
}
