use moldview_base::{DimensionUnit, Result};
use moldview_io::{GeometrySource, LoadedGeometry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::annotations::{DemoldingIndicator, DimensionOverlay, Dimensions, calculate_dimensions};
use super::camera::{Camera, CameraKind, CameraRig};
use super::framing::{ViewDirection, compute_framing};
use super::input::ViewerInput;
use super::loader::{GeometryLoader, LoadCompletion};
use super::math::{Axis, Bounds, Vec3};
use super::mesh::ViewerMesh;
use super::orbit::{OrbitController, OrbitSettings};
use super::render_loop::RenderLoop;
use super::renderer::SceneRenderer;
use super::scene::{
    Light, LightKind, MeshMaterial, NodeFamily, NodeId, NodePayload, SceneGraph, SceneNode,
    Segment,
};
use super::state::{DEFAULT_MODEL_COLOR, ViewportPhase, ViewportState};
use super::surface::SurfaceSize;
use super::ui::Color32;

pub const DEFAULT_ASSET_PATH: &str = "assets/models/test_part.stl";
pub const DEFAULT_BACKGROUND: Color32 = Color32::from_gray(0xF0);
const BOUNDING_BOX_COLOR: Color32 = Color32::GREEN;
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

#[derive(Clone, Debug)]
pub struct ViewportOptions {
    pub asset_path: PathBuf,
    pub color: Color32,
    pub background: Color32,
    pub unit: DimensionUnit,
    pub camera: CameraKind,
    pub orbit: OrbitSettings,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from(DEFAULT_ASSET_PATH),
            color: DEFAULT_MODEL_COLOR,
            background: DEFAULT_BACKGROUND,
            unit: DimensionUnit::default(),
            camera: CameraKind::Perspective,
            orbit: OrbitSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelInfo {
    pub path: PathBuf,
    /// Bounds after centering; the center is the origin.
    pub bounds: Bounds,
    /// Translation removed from the file coordinates when centering.
    pub offset: Vec3,
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Debug)]
struct InstalledModel {
    info: ModelInfo,
    node: NodeId,
    bounding_box: NodeId,
}

pub struct ViewportController<R: SceneRenderer> {
    state: ViewportState,
    scene: SceneGraph,
    rig: CameraRig,
    renderer: R,
    loader: GeometryLoader,
    render_loop: RenderLoop,
    surface: SurfaceSize,
    asset_path: PathBuf,
    generation: u64,
    model: Option<InstalledModel>,
    dimensions: Option<Dimensions>,
    dimension_overlay: DimensionOverlay,
    demolding: DemoldingIndicator,
    lights: Vec<NodeId>,
    last_error: Option<String>,
    ready: bool,
}

impl<R: SceneRenderer> ViewportController<R> {
    pub fn new(
        surface: SurfaceSize,
        options: ViewportOptions,
        renderer: R,
        source: Arc<dyn GeometrySource>,
    ) -> Self {
        let state = ViewportState {
            color: options.color,
            unit: options.unit,
            camera_kind: options.camera,
            ..ViewportState::default()
        };
        Self {
            state,
            scene: SceneGraph::new(options.background),
            rig: CameraRig::new(OrbitController::new(options.orbit)),
            renderer,
            loader: GeometryLoader::new(source),
            render_loop: RenderLoop::default(),
            surface,
            asset_path: options.asset_path,
            generation: 0,
            model: None,
            dimensions: None,
            dimension_overlay: DimensionOverlay::default(),
            demolding: DemoldingIndicator::default(),
            lights: Vec::new(),
            last_error: None,
            ready: false,
        }
    }

    pub fn on_ready(&mut self) {
        if self.state.is_disposed() {
            debug!("on_ready after teardown ignored");
            return;
        }
        if self.ready {
            warn!("on_ready called twice");
            return;
        }
        self.ready = true;
        self.add_lights();

        let kind = self.state.camera_kind;
        let max_dim = self.model_max_dim();
        self.rig
            .set_camera_type(kind, &mut self.scene, self.surface, max_dim);
        self.renderer.resize(self.surface);
        self.render_loop.start();
        info!(
            width = self.surface.width,
            height = self.surface.height,
            camera = kind.label(),
            "viewport ready"
        );

        let path = self.asset_path.clone();
        self.request_load(path);
    }

    /// Releases every resource and stops the render loop. Later calls are no-ops.
    pub fn on_teardown(&mut self) {
        if self.state.is_disposed() {
            debug!("viewport already disposed");
            return;
        }
        self.render_loop.cancel();
        self.renderer.dispose();
        self.dimension_overlay.clear(&mut self.scene);
        self.demolding.clear(&mut self.scene);
        self.dispose_model();
        for light in self.lights.drain(..) {
            self.scene.remove_and_dispose(light);
        }
        self.rig.dispose(&mut self.scene);
        self.scene.clear();
        self.dimensions = None;
        self.transition(|s| s.phase = ViewportPhase::Disposed);
        info!(frames = self.render_loop.frame_count(), "viewport disposed");
    }

    /// Starts loading `path`. The current model and its annotations are dropped first;
    /// completions of earlier requests are ignored from now on.
    pub fn request_load(&mut self, path: impl Into<PathBuf>) {
        if self.state.is_disposed() {
            debug!("load after teardown ignored");
            return;
        }
        let path = path.into();
        self.dispose_model();
        self.dimension_overlay.clear(&mut self.scene);
        self.demolding.clear(&mut self.scene);
        self.dimensions = None;
        self.generation += 1;
        self.asset_path = path.clone();
        self.transition(|s| s.phase = ViewportPhase::Loading);
        info!(path = %path.display(), generation = self.generation, "load requested");
        self.loader.request(self.generation, path);
    }

    pub fn poll_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.loader.try_recv() {
            if self.on_load_complete(completion) {
                applied += 1;
            }
        }
        applied
    }

    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.state.phase == ViewportPhase::Loading {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.loader.recv_timeout(remaining) {
                Some(completion) => {
                    self.on_load_complete(completion);
                }
                None => return false,
            }
        }
        self.state.phase == ViewportPhase::Ready
    }

    pub fn on_load_complete(&mut self, completion: LoadCompletion) -> bool {
        if self.state.is_disposed() {
            debug!(generation = completion.generation, "load finished after teardown");
            return false;
        }
        if completion.generation != self.generation {
            debug!(
                generation = completion.generation,
                current = self.generation,
                "stale load ignored"
            );
            return false;
        }
        match completion.result {
            Ok(geometry) => self.install_model(&completion.path, geometry),
            Err(err) => {
                self.fail_load(&completion.path, &format!("{err:#}"));
                false
            }
        }
    }

    pub fn set_color(&mut self, color: &str) -> Result<()> {
        let color = Color32::from_hex(color)?;
        if self.state.is_disposed() {
            return Ok(());
        }
        self.transition(|s| s.color = color);
        self.update_model_material(|material| material.color = color);
        Ok(())
    }

    pub fn toggle_wireframe(&mut self) {
        if self.state.is_disposed() {
            return;
        }
        let wireframe = !self.state.wireframe;
        self.transition(|s| s.wireframe = wireframe);
        self.update_model_material(|material| material.wireframe = wireframe);
        debug!(wireframe, "wireframe toggled");
    }

    pub fn toggle_bounding_box(&mut self) {
        if self.state.is_disposed() {
            return;
        }
        let Some(model) = &self.model else {
            warn!("no bounding box helper available");
            return;
        };
        let visible = !self.state.bounding_box_visible;
        if let Some(node) = self.scene.get_mut(model.bounding_box) {
            node.visible = visible;
        }
        self.transition(|s| s.bounding_box_visible = visible);
        debug!(visible, "bounding box toggled");
    }

    pub fn set_camera_type(&mut self, kind: CameraKind) {
        if self.state.is_disposed() {
            return;
        }
        self.transition(|s| s.camera_kind = kind);
        let max_dim = self.model_max_dim();
        let switched = self
            .rig
            .set_camera_type(kind, &mut self.scene, self.surface, max_dim);
        if switched && self.model.is_some() {
            self.set_view(ViewDirection::Reset);
        }
        self.on_resize(self.surface);
    }

    pub fn set_view(&mut self, direction: ViewDirection) {
        if self.state.is_disposed() {
            return;
        }
        let Some(model) = &self.model else {
            warn!(view = direction.label(), "no model loaded to set view for");
            return;
        };
        let Some(camera) = self.rig.camera() else {
            warn!(view = direction.label(), "no camera to frame");
            return;
        };
        let framing = compute_framing(&model.info.bounds, &camera.projection, direction);
        self.rig.place(framing.position, framing.target);
        debug!(view = direction.label(), "view framed");
    }

    pub fn set_dimensions_visible(&mut self, visible: bool) {
        if self.state.is_disposed() {
            return;
        }
        self.transition(|s| s.dimensions_visible = visible);
        if visible {
            self.rebuild_dimensions();
        } else {
            self.dimension_overlay.clear(&mut self.scene);
        }
    }

    pub fn toggle_dimensions(&mut self) {
        let visible = !self.state.dimensions_visible;
        self.set_dimensions_visible(visible);
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        if self.state.is_disposed() {
            return;
        }
        let unit = DimensionUnit::new(unit);
        if unit == self.state.unit {
            return;
        }
        self.transition(|s| s.unit = unit);
        if self.state.dimensions_visible {
            self.rebuild_dimensions();
        }
    }

    pub fn set_demolding_direction(&mut self, axis: Axis) {
        if self.state.is_disposed() {
            return;
        }
        self.transition(|s| s.demolding_axis = axis);
        if self.state.demolding_visible {
            self.rebuild_demolding();
        }
    }

    pub fn set_demolding_visible(&mut self, visible: bool) {
        if self.state.is_disposed() {
            return;
        }
        self.transition(|s| s.demolding_visible = visible);
        if visible {
            self.rebuild_demolding();
        } else {
            self.demolding.clear(&mut self.scene);
        }
    }

    pub fn toggle_demolding(&mut self) {
        let visible = !self.state.demolding_visible;
        self.set_demolding_visible(visible);
    }

    pub fn on_resize(&mut self, surface: SurfaceSize) {
        if self.state.is_disposed() {
            return;
        }
        self.surface = surface;
        let max_dim = self.model_max_dim();
        self.rig.resize(surface, max_dim);
        self.renderer.resize(surface);
    }

    pub fn apply_input(&mut self, input: &ViewerInput) {
        if self.state.is_disposed() {
            return;
        }
        let surface = self.surface;
        let (camera, orbit) = self.rig.parts_mut();
        if let Some(camera) = camera {
            orbit.apply_input(input, camera, surface);
        }
    }

    /// Runs one scheduled frame: advances the orbit damping and draws the scene.
    /// Returns false when no frame was due.
    pub fn tick(&mut self) -> bool {
        let Some(handle) = self.render_loop.take_due() else {
            return false;
        };
        self.rig.update();
        if let Some(camera) = self.rig.camera() {
            self.renderer.render(&self.scene, camera);
        }
        self.render_loop.complete(handle);
        true
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.rig.camera()
    }

    pub fn orbit_target(&self) -> Vec3 {
        self.rig.orbit().target()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn model(&self) -> Option<&ModelInfo> {
        self.model.as_ref().map(|model| &model.info)
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame_count(&self) -> u64 {
        self.render_loop.frame_count()
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn asset_path(&self) -> &Path {
        &self.asset_path
    }

    fn transition(&mut self, change: impl FnOnce(&mut ViewportState)) {
        let next = self.state.with(change);
        if next.phase != self.state.phase {
            debug!(
                from = self.state.phase.label(),
                to = next.phase.label(),
                "viewport phase changed"
            );
        }
        self.state = next;
    }

    fn model_max_dim(&self) -> Option<f64> {
        self.model
            .as_ref()
            .map(|model| model.info.bounds.max_dimension())
    }

    fn add_lights(&mut self) {
        let lights = [
            ("ambient-light", LightKind::Ambient, 0.7),
            (
                "key-light",
                LightKind::Directional {
                    direction: Vec3::UNIT_Y,
                },
                0.8,
            ),
            (
                "fill-light",
                LightKind::Directional {
                    direction: -Vec3::UNIT_Y,
                },
                0.5,
            ),
        ];
        for (name, kind, intensity) in lights {
            let light = Light {
                kind,
                color: Color32::WHITE,
                intensity,
            };
            let id = self.scene.add(SceneNode::new(
                name,
                NodeFamily::Light,
                NodePayload::Light(light),
            ));
            self.lights.push(id);
        }
    }

    fn install_model(&mut self, path: &Path, geometry: LoadedGeometry) -> bool {
        let mut mesh = ViewerMesh::from_mesh(&geometry.mesh);
        if mesh.is_empty() {
            self.fail_load(path, "mesh has no triangles");
            return false;
        }
        let offset = Vec3::from(geometry.bounds.center());
        mesh.translate(-offset);
        let bounds = Bounds::new(
            Vec3::from(geometry.bounds.min) - offset,
            Vec3::from(geometry.bounds.max) - offset,
        );
        let info = ModelInfo {
            path: path.to_path_buf(),
            bounds,
            offset,
            vertices: mesh.positions.len(),
            triangles: mesh.tri_faces.len(),
        };

        let material = MeshMaterial::phong(self.state.color, self.state.wireframe);
        let node = self.scene.add(SceneNode::new(
            "model",
            NodeFamily::Model,
            NodePayload::Mesh {
                mesh: Arc::new(mesh),
                material,
            },
        ));
        let corners = bounds.corners();
        let edges = BOX_EDGES
            .iter()
            .map(|&(a, b)| Segment {
                start: corners[a],
                end: corners[b],
                color: BOUNDING_BOX_COLOR,
            })
            .collect();
        let bounding_box = self.scene.add(
            SceneNode::new(
                "bounding-box",
                NodeFamily::BoundingBox,
                NodePayload::Lines(edges),
            )
            .hidden(),
        );

        info!(
            path = %path.display(),
            vertices = info.vertices,
            triangles = info.triangles,
            "model loaded"
        );
        self.dimensions = Some(calculate_dimensions(&bounds));
        self.model = Some(InstalledModel {
            info,
            node,
            bounding_box,
        });
        self.last_error = None;
        self.transition(|s| {
            s.phase = ViewportPhase::Ready;
            s.bounding_box_visible = false;
        });

        if self.state.dimensions_visible {
            self.rebuild_dimensions();
        }
        if self.state.demolding_visible {
            self.rebuild_demolding();
        }

        let max_dim = self.model_max_dim();
        self.rig.resize(self.surface, max_dim);
        self.set_view(ViewDirection::Reset);
        self.set_view(ViewDirection::Front);
        true
    }

    fn fail_load(&mut self, path: &Path, reason: &str) {
        let err = moldview_base::Error::Load {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        warn!(%err, "model load failed");
        self.last_error = Some(err.to_string());
        let phase = if self.model.is_some() {
            ViewportPhase::Ready
        } else {
            ViewportPhase::Empty
        };
        self.transition(|s| s.phase = phase);
    }

    fn dispose_model(&mut self) {
        let Some(model) = self.model.take() else {
            return;
        };
        self.scene.remove_and_dispose(model.node);
        self.scene.remove_and_dispose(model.bounding_box);
        debug!(path = %model.info.path.display(), "model disposed");
    }

    fn update_model_material(&mut self, change: impl FnOnce(&mut MeshMaterial)) {
        let Some(model) = &self.model else {
            return;
        };
        if let Some(node) = self.scene.get_mut(model.node) {
            if let NodePayload::Mesh { material, .. } = &mut node.payload {
                change(material);
            }
        }
    }

    fn rebuild_dimensions(&mut self) {
        let Some(model) = &self.model else {
            warn!("no model loaded to measure");
            return;
        };
        let bounds = model.info.bounds;
        let dims = self
            .dimension_overlay
            .build(&mut self.scene, &bounds, &self.state.unit);
        self.dimensions = Some(dims);
    }

    fn rebuild_demolding(&mut self) {
        let Some(model) = &self.model else {
            warn!("no model loaded to show a demolding direction for");
            return;
        };
        let bounds = model.info.bounds;
        self.demolding
            .build(&mut self.scene, &bounds, self.state.demolding_axis);
    }
}
