use cgmath::{Deg, Matrix4, Point3, Vector3};
use tracing::info;

use super::math::Vec3;
use super::orbit::OrbitController;
use super::scene::{NodeFamily, NodeId, NodePayload, SceneGraph, SceneNode};
use super::surface::SurfaceSize;

pub const PERSPECTIVE_FOV_DEG: f64 = 75.0;
pub const NEAR_PLANE: f64 = 0.1;
pub const FAR_PLANE: f64 = 1000.0;
pub const ORTHO_PADDING: f64 = 1.2;
pub const DEFAULT_ORTHO_EXTENT: f64 = 10.0;
pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

impl CameraKind {
    pub fn label(self) -> &'static str {
        match self {
            CameraKind::Perspective => "perspective",
            CameraKind::Orthographic => "orthographic",
        }
    }
}

impl std::str::FromStr for CameraKind {
    type Err = moldview_base::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "perspective" | "persp" => Ok(CameraKind::Perspective),
            "orthographic" | "ortho" => Ok(CameraKind::Orthographic),
            other => Err(moldview_base::Error::InvalidParameter(format!(
                "unknown camera kind '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fov_deg: f64,
        aspect: f64,
        near: f64,
        far: f64,
    },
    Orthographic {
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        near: f64,
        far: f64,
    },
}

impl Projection {
    pub fn new(kind: CameraKind, aspect: f64, model_max_dim: Option<f64>) -> Self {
        match kind {
            CameraKind::Perspective => Projection::Perspective {
                fov_deg: PERSPECTIVE_FOV_DEG,
                aspect,
                near: NEAR_PLANE,
                far: FAR_PLANE,
            },
            CameraKind::Orthographic => {
                let (half_width, half_height) = ortho_half_extents(aspect, model_max_dim);
                Projection::Orthographic {
                    left: -half_width,
                    right: half_width,
                    top: half_height,
                    bottom: -half_height,
                    near: NEAR_PLANE,
                    far: FAR_PLANE,
                }
            }
        }
    }

    pub fn kind(&self) -> CameraKind {
        match self {
            Projection::Perspective { .. } => CameraKind::Perspective,
            Projection::Orthographic { .. } => CameraKind::Orthographic,
        }
    }

    pub fn resize(&mut self, aspect: f64, model_max_dim: Option<f64>) {
        match self {
            Projection::Perspective { aspect: current, .. } => *current = aspect,
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                ..
            } => {
                let (half_width, half_height) = ortho_half_extents(aspect, model_max_dim);
                *left = -half_width;
                *right = half_width;
                *top = half_height;
                *bottom = -half_height;
            }
        }
    }

    pub fn matrix(&self, zoom: f64) -> Matrix4<f64> {
        match *self {
            Projection::Perspective {
                fov_deg,
                aspect,
                near,
                far,
            } => cgmath::perspective(Deg(fov_deg), aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => {
                let zoom = if zoom > 0.0 { zoom } else { 1.0 };
                cgmath::ortho(
                    left / zoom,
                    right / zoom,
                    bottom / zoom,
                    top / zoom,
                    near,
                    far,
                )
            }
        }
    }
}

pub fn ortho_half_extents(aspect: f64, model_max_dim: Option<f64>) -> (f64, f64) {
    let ortho_size = model_max_dim.unwrap_or(DEFAULT_ORTHO_EXTENT) * ORTHO_PADDING;
    (ortho_size * aspect / 2.0, ortho_size / 2.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub zoom: f64,
}

impl Camera {
    pub fn new(projection: Projection, position: Vec3) -> Self {
        Self {
            projection,
            position,
            target: Vec3::ZERO,
            up: Vec3::UNIT_Y,
            zoom: 1.0,
        }
    }

    pub fn kind(&self) -> CameraKind {
        self.projection.kind()
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalized()
    }

    /// World-space up vector used for the view basis; falls back to -Z when looking along Y.
    pub fn view_up(&self) -> Vec3 {
        let forward = self.forward();
        if forward.cross(self.up).length() <= 1.0e-9 {
            Vec3::new(0.0, 0.0, -1.0)
        } else {
            self.up
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let target = Point3::new(self.target.x, self.target.y, self.target.z);
        let up = self.view_up();
        Matrix4::look_at_rh(eye, target, Vector3::new(up.x, up.y, up.z))
    }

    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection.matrix(self.zoom) * self.view_matrix()
    }
}

#[derive(Debug)]
pub struct CameraRig {
    camera: Option<Camera>,
    node: Option<NodeId>,
    orbit: OrbitController,
}

impl CameraRig {
    pub fn new(orbit: OrbitController) -> Self {
        Self {
            camera: None,
            node: None,
            orbit,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn kind(&self) -> Option<CameraKind> {
        self.camera.as_ref().map(Camera::kind)
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    pub fn parts_mut(&mut self) -> (Option<&mut Camera>, &mut OrbitController) {
        (self.camera.as_mut(), &mut self.orbit)
    }

    /// Replaces the active camera with one of `kind`, keeping position and orbit target.
    /// Returns false when `kind` is already active.
    pub fn set_camera_type(
        &mut self,
        kind: CameraKind,
        scene: &mut SceneGraph,
        surface: SurfaceSize,
        model_max_dim: Option<f64>,
    ) -> bool {
        if self.kind() == Some(kind) {
            return false;
        }

        let (position, target) = match &self.camera {
            Some(camera) => (camera.position, self.orbit.target()),
            None => (DEFAULT_CAMERA_POSITION, Vec3::ZERO),
        };

        if let Some(node) = self.node.take() {
            scene.remove_and_dispose(node);
        }

        let projection = Projection::new(kind, surface.aspect(), model_max_dim);
        let mut camera = Camera::new(projection, position);
        camera.look_at(target);

        let node = SceneNode::new(
            format!("camera-{}", kind.label()),
            NodeFamily::Camera,
            NodePayload::Camera(kind),
        );
        self.node = Some(scene.add(node));

        self.orbit.bind(target);
        self.orbit.update(&mut camera);
        self.camera = Some(camera);
        info!(kind = kind.label(), "camera type changed");
        true
    }

    pub fn resize(&mut self, surface: SurfaceSize, model_max_dim: Option<f64>) {
        if let Some(camera) = &mut self.camera {
            camera.projection.resize(surface.aspect(), model_max_dim);
        }
    }

    pub fn place(&mut self, position: Vec3, target: Vec3) {
        let Some(camera) = &mut self.camera else {
            return;
        };
        camera.position = position;
        self.orbit.set_target(target);
        self.orbit.update(camera);
    }

    pub fn update(&mut self) -> bool {
        match &mut self.camera {
            Some(camera) => self.orbit.update(camera),
            None => false,
        }
    }

    pub fn dispose(&mut self, scene: &mut SceneGraph) {
        if let Some(node) = self.node.take() {
            scene.remove_and_dispose(node);
        }
        self.camera = None;
        self.orbit.dispose();
    }
}
