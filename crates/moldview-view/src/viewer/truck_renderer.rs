use image::DynamicImage;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use truck_base::cgmath64::{
    InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector2, Vector3, Vector4,
};
use truck_meshalgo::prelude::NormalFilters;
use truck_platform::{
    BackendBufferConfig, Camera as StudioCamera, DeviceHandler, Light as StudioLight, LightType,
    ProjectionMethod, RenderTextureConfig, Scene, SceneDescriptor, StudioConfig,
};
use truck_polymesh::{Faces, PolygonMesh, StandardAttributes, StandardVertex};
use truck_rendimpl::{
    CreatorCreator, InstanceCreator, Material, PolygonInstance, PolygonState, WireFrameInstance,
    WireFrameState,
};

use super::camera::{Camera, Projection};
use super::label::LabelSprite;
use super::math::Vec3;
use super::mesh::ViewerMesh;
use super::renderer::SceneRenderer;
use super::scene::{
    LightKind, MeshMaterial, NodeId, NodePayload, SceneGraph, SceneNode, Segment, Transform,
};
use super::surface::SurfaceSize;
use super::ui::Color32;

const AMBIENT_SCALE: f64 = 0.4;

pub struct TruckRenderer {
    scene: Scene,
    creator: InstanceCreator,
    device: wgpu::Device,
    target: RenderTarget,
    target_revision: u64,
    synced_revision: Option<u64>,
    objects: HashMap<NodeId, NodeObject>,
    ambient: f64,
    draw_calls: u64,
    disposed: bool,
}

struct RenderTarget {
    size: [u32; 2],
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

enum NodeObject {
    Surface(PolygonInstance),
    Wire(WireFrameInstance),
    Lines(Vec<WireFrameInstance>),
    Label {
        instance: PolygonInstance,
        anchor: Vec3,
    },
}

impl TruckRenderer {
    pub fn new(adapter: wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let initial_size = [1, 1];
        let scene_desc = SceneDescriptor {
            studio: StudioConfig {
                background: to_wgpu_color(Color32::from_gray(0xF0)),
                camera: StudioCamera::default(),
                lights: vec![StudioLight {
                    position: Point3::new(0.0, 1.0, 0.0),
                    color: Vector3::new(0.8, 0.8, 0.8),
                    light_type: LightType::Uniform,
                }],
            },
            backend_buffer: BackendBufferConfig {
                depth_test: true,
                sample_count: 1,
            },
            render_texture: RenderTextureConfig {
                canvas_size: (initial_size[0], initial_size[1]),
                format: wgpu::TextureFormat::Rgba8Unorm,
            },
        };
        let handler = DeviceHandler::new(adapter, device.clone(), queue);
        let scene = Scene::new(handler, &scene_desc);
        let creator = scene.instance_creator();
        let target = RenderTarget::new(&device, initial_size);
        Self {
            scene,
            creator,
            device,
            target,
            target_revision: 0,
            synced_revision: None,
            objects: HashMap::new(),
            ambient: 0.7,
            draw_calls: 0,
            disposed: false,
        }
    }

    pub fn target_view(&self) -> &wgpu::TextureView {
        &self.target.view
    }

    pub fn target_size(&self) -> [u32; 2] {
        self.target.size
    }

    pub fn target_revision(&self) -> u64 {
        self.target_revision
    }

    fn ensure_target(&mut self, size: [u32; 2]) {
        if self.target.size != size {
            self.target = RenderTarget::new(&self.device, size);
            self.target_revision = self.target_revision.wrapping_add(1);
        }
        let current = self.scene.descriptor().render_texture.canvas_size;
        if current != (size[0], size[1]) {
            let mut desc = self.scene.descriptor_mut();
            desc.render_texture.canvas_size = (size[0], size[1]);
        }
    }

    fn sync(&mut self, graph: &SceneGraph) {
        self.sync_studio(graph);

        let mut live = HashSet::new();
        for node in graph.nodes() {
            let id = node.id();
            let matrix = world_matrix(graph, node);
            let visible = graph.is_effectively_visible(node);
            match &node.payload {
                NodePayload::Mesh { mesh, material } => {
                    live.insert(id);
                    let stale = match self.objects.get(&id) {
                        Some(NodeObject::Surface(_)) => material.wireframe,
                        Some(NodeObject::Wire(_)) => !material.wireframe,
                        _ => false,
                    };
                    if stale {
                        self.drop_object(id);
                    }
                    if !self.objects.contains_key(&id) {
                        let object = self.create_mesh_object(mesh, material, matrix);
                        self.insert_object(id, object);
                    }
                    self.update_mesh_state(id, material, matrix);
                }
                NodePayload::Lines(segments) => {
                    live.insert(id);
                    if !self.objects.contains_key(&id) {
                        let object = self.create_lines_object(segments, matrix);
                        self.insert_object(id, object);
                    }
                }
                NodePayload::Label(sprite) => {
                    live.insert(id);
                    if !self.objects.contains_key(&id) {
                        let w = matrix.w;
                        let anchor = Vec3::new(w.x, w.y, w.z);
                        let object = self.create_label_object(sprite, anchor);
                        self.insert_object(id, object);
                    }
                }
                NodePayload::Group | NodePayload::Light(_) | NodePayload::Camera(_) => {}
            }
            if let Some(object) = self.objects.get(&id) {
                set_object_visibility(&mut self.scene, object, visible);
            }
        }

        let gone: Vec<NodeId> = self
            .objects
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for id in gone {
            self.drop_object(id);
        }
    }

    fn sync_studio(&mut self, graph: &SceneGraph) {
        let mut lights = Vec::new();
        let mut ambient = 0.0;
        for node in graph.nodes() {
            let NodePayload::Light(light) = &node.payload else {
                continue;
            };
            match light.kind {
                LightKind::Ambient => ambient += light.intensity as f64,
                LightKind::Directional { direction } => {
                    let [r, g, b, _] = color_to_vec4(light.color, 1.0).into();
                    let intensity = light.intensity as f64;
                    lights.push(StudioLight {
                        position: Point3::new(direction.x, direction.y, direction.z),
                        color: Vector3::new(r, g, b) * intensity,
                        light_type: LightType::Uniform,
                    });
                }
            }
        }
        self.ambient = ambient;
        let studio = self.scene.studio_config_mut();
        studio.background = to_wgpu_color(graph.background);
        if !lights.is_empty() {
            studio.lights = lights;
        }
    }

    fn insert_object(&mut self, id: NodeId, object: NodeObject) {
        match &object {
            NodeObject::Surface(instance) | NodeObject::Label { instance, .. } => {
                self.scene.add_object(instance);
            }
            NodeObject::Wire(instance) => {
                self.scene.add_object(instance);
            }
            NodeObject::Lines(instances) => {
                for instance in instances {
                    self.scene.add_object(instance);
                }
            }
        }
        self.objects.insert(id, object);
    }

    fn drop_object(&mut self, id: NodeId) {
        let Some(object) = self.objects.remove(&id) else {
            return;
        };
        match &object {
            NodeObject::Surface(instance) | NodeObject::Label { instance, .. } => {
                self.scene.remove_object(instance);
            }
            NodeObject::Wire(instance) => {
                self.scene.remove_object(instance);
            }
            NodeObject::Lines(instances) => {
                for instance in instances {
                    self.scene.remove_object(instance);
                }
            }
        }
    }

    fn create_mesh_object(
        &self,
        mesh: &ViewerMesh,
        material: &MeshMaterial,
        matrix: Matrix4,
    ) -> NodeObject {
        if material.wireframe {
            let edges = edge_segments(mesh);
            let state = WireFrameState {
                matrix,
                color: color_to_vec4(material.color, 1.0),
            };
            NodeObject::Wire(self.creator.create_instance(&edges, &state))
        } else {
            let state = PolygonState {
                matrix,
                material: phong_material(material, self.ambient),
                texture: None,
                backface_culling: false,
            };
            NodeObject::Surface(self.creator.create_instance(&polygon_mesh(mesh), &state))
        }
    }

    fn create_lines_object(&self, segments: &[Segment], matrix: Matrix4) -> NodeObject {
        let mut by_color: Vec<(Color32, Vec<(Point3, Point3)>)> = Vec::new();
        for segment in segments {
            let pair: (Point3, Point3) = (segment.start.into(), segment.end.into());
            match by_color.iter_mut().find(|(color, _)| *color == segment.color) {
                Some((_, list)) => list.push(pair),
                None => by_color.push((segment.color, vec![pair])),
            }
        }
        let instances = by_color
            .into_iter()
            .map(|(color, lines)| {
                let state = WireFrameState {
                    matrix,
                    color: color_to_vec4(color, 1.0),
                };
                self.creator.create_instance(&lines, &state)
            })
            .collect();
        NodeObject::Lines(instances)
    }

    fn create_label_object(&self, sprite: &LabelSprite, anchor: Vec3) -> NodeObject {
        let texture = self
            .creator
            .create_texture(&DynamicImage::ImageRgba8(sprite.image.clone()));
        let state = PolygonState {
            matrix: Matrix4::from_translation(Vector3::new(anchor.x, anchor.y, anchor.z)),
            material: Material {
                albedo: Vector4::new(1.0, 1.0, 1.0, 1.0),
                roughness: 1.0,
                reflectance: 0.0,
                ambient_ratio: 1.0,
                background_ratio: 0.0,
                alpha_blend: true,
            },
            texture: Some(texture),
            backface_culling: false,
        };
        let quad = label_quad(sprite.world_width(), sprite.world_height);
        NodeObject::Label {
            instance: self.creator.create_instance(&quad, &state),
            anchor,
        }
    }

    fn update_mesh_state(&mut self, id: NodeId, material: &MeshMaterial, matrix: Matrix4) {
        match self.objects.get_mut(&id) {
            Some(NodeObject::Surface(instance)) => {
                let state = instance.instance_state_mut();
                state.matrix = matrix;
                state.material = phong_material(material, self.ambient);
                self.scene.update_bind_group(instance);
            }
            Some(NodeObject::Wire(instance)) => {
                let state = instance.instance_state_mut();
                state.matrix = matrix;
                state.color = color_to_vec4(material.color, 1.0);
                self.scene.update_bind_group(instance);
            }
            _ => {}
        }
    }

    fn update_camera(&mut self, camera: &Camera) {
        let eye = to_point(camera.position);
        let target = to_point(camera.target);
        let up = camera.view_up();
        let view = Matrix4::look_at_rh(eye, target, Vector3::new(up.x, up.y, up.z));
        let matrix = view.invert().unwrap_or_else(Matrix4::identity);
        let (method, near_clip, far_clip) = match camera.projection {
            Projection::Perspective {
                fov_deg, near, far, ..
            } => (
                ProjectionMethod::perspective(Rad(fov_deg.to_radians())),
                near,
                far,
            ),
            Projection::Orthographic {
                top,
                bottom,
                near,
                far,
                ..
            } => {
                let zoom = if camera.zoom > 0.0 { camera.zoom } else { 1.0 };
                (ProjectionMethod::parallel((top - bottom) / zoom), near, far)
            }
        };
        self.scene.studio_config_mut().camera = StudioCamera {
            matrix,
            method,
            near_clip,
            far_clip,
        };
    }

    fn update_labels(&mut self, camera: &Camera) {
        let forward = camera.forward();
        let right = forward.cross(camera.view_up()).normalized();
        let up = right.cross(forward).normalized();
        let back = -forward;
        for object in self.objects.values_mut() {
            let NodeObject::Label { instance, anchor } = object else {
                continue;
            };
            let basis = Matrix4::from_cols(
                Vector4::new(right.x, right.y, right.z, 0.0),
                Vector4::new(up.x, up.y, up.z, 0.0),
                Vector4::new(back.x, back.y, back.z, 0.0),
                Vector4::new(anchor.x, anchor.y, anchor.z, 1.0),
            );
            instance.instance_state_mut().matrix = basis;
            self.scene.update_bind_group(instance);
        }
    }
}

impl SceneRenderer for TruckRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        if self.disposed {
            return;
        }
        self.ensure_target(size.physical());
    }

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) {
        if self.disposed {
            return;
        }
        if self.synced_revision != Some(scene.revision()) {
            self.sync(scene);
            self.synced_revision = Some(scene.revision());
        }
        self.update_camera(camera);
        self.update_labels(camera);
        self.scene.render(&self.target.view);
        self.draw_calls += 1;
    }

    fn dispose(&mut self) {
        if self.disposed {
            debug!("truck renderer already disposed");
            return;
        }
        self.scene.clear_objects();
        self.objects.clear();
        self.synced_revision = None;
        self.disposed = true;
    }

    fn draw_calls(&self) -> u64 {
        self.draw_calls
    }
}

impl RenderTarget {
    fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("moldview_scene"),
            size: wgpu::Extent3d {
                width: size[0].max(1),
                height: size[1].max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            size,
            texture,
            view,
        }
    }
}

fn set_object_visibility(scene: &mut Scene, object: &NodeObject, visible: bool) {
    match object {
        NodeObject::Surface(instance) | NodeObject::Label { instance, .. } => {
            scene.set_visibility(instance, visible);
        }
        NodeObject::Wire(instance) => {
            scene.set_visibility(instance, visible);
        }
        NodeObject::Lines(instances) => {
            for instance in instances {
                scene.set_visibility(instance, visible);
            }
        }
    }
}

fn transform_matrix(transform: &Transform) -> Matrix4 {
    let t = transform.translation;
    let translation = Matrix4::from_translation(Vector3::new(t.x, t.y, t.z));
    match transform.rotation {
        Some((axis, angle)) => {
            let axis = Vector3::new(axis.x, axis.y, axis.z).normalize();
            translation * Matrix4::from_axis_angle(axis, Rad(angle))
        }
        None => translation,
    }
}

fn world_matrix(graph: &SceneGraph, node: &SceneNode) -> Matrix4 {
    let mut matrix = transform_matrix(&node.transform);
    let mut parent = node.parent;
    while let Some(id) = parent {
        let Some(parent_node) = graph.get(id) else {
            break;
        };
        matrix = transform_matrix(&parent_node.transform) * matrix;
        parent = parent_node.parent;
    }
    matrix
}

fn polygon_mesh(mesh: &ViewerMesh) -> PolygonMesh {
    let attrs = StandardAttributes {
        positions: mesh.positions.iter().map(|&p| p.into()).collect(),
        ..Default::default()
    };
    let tri_faces: Vec<[StandardVertex; 3]> = mesh
        .tri_faces
        .iter()
        .map(|&tri| {
            tri.map(|pos| StandardVertex {
                pos,
                uv: None,
                nor: None,
            })
        })
        .collect();
    let faces = Faces::from_tri_and_quad_faces(tri_faces, Vec::new());
    let mut poly = PolygonMesh::new(attrs, faces);
    poly.add_naive_normals(true);
    poly
}

fn label_quad(width: f64, height: f64) -> PolygonMesh {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let attrs = StandardAttributes {
        positions: vec![
            Point3::new(-hw, -hh, 0.0),
            Point3::new(hw, -hh, 0.0),
            Point3::new(hw, hh, 0.0),
            Point3::new(-hw, hh, 0.0),
        ],
        uv_coords: vec![
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 0.0),
        ],
        normals: vec![Vector3::new(0.0, 0.0, 1.0)],
    };
    let vertex = |idx: usize| StandardVertex {
        pos: idx,
        uv: Some(idx),
        nor: Some(0),
    };
    let tri_faces = vec![
        [vertex(0), vertex(1), vertex(2)],
        [vertex(0), vertex(2), vertex(3)],
    ];
    PolygonMesh::new(attrs, Faces::from_tri_and_quad_faces(tri_faces, Vec::new()))
}

fn edge_segments(mesh: &ViewerMesh) -> Vec<(Point3, Point3)> {
    let mut segments: Vec<(Point3, Point3)> = mesh
        .edges()
        .iter()
        .map(|edge| (mesh.positions[edge[0]].into(), mesh.positions[edge[1]].into()))
        .collect();
    if segments.is_empty() {
        let origin = Point3::new(0.0, 0.0, 0.0);
        segments.push((origin, origin));
    }
    segments
}

fn phong_material(material: &MeshMaterial, ambient: f64) -> Material {
    let specular = material.specular.r as f64 / 255.0;
    Material {
        albedo: color_to_vec4(material.color, 1.0),
        roughness: (1.0 - material.shininess as f64 / 100.0).clamp(0.1, 1.0),
        reflectance: specular,
        ambient_ratio: (ambient * AMBIENT_SCALE).clamp(0.0, 1.0),
        background_ratio: 0.0,
        alpha_blend: false,
    }
}

fn color_to_vec4(color: Color32, alpha: f32) -> Vector4 {
    let [r, g, b, _] = color.to_array();
    Vector4::new(
        srgb_to_linear(r) as f64,
        srgb_to_linear(g) as f64,
        srgb_to_linear(b) as f64,
        alpha as f64,
    )
}

fn to_wgpu_color(color: Color32) -> wgpu::Color {
    let [r, g, b, a] = color.to_array();
    wgpu::Color {
        r: srgb_to_linear(r) as f64,
        g: srgb_to_linear(g) as f64,
        b: srgb_to_linear(b) as f64,
        a: a as f64 / 255.0,
    }
}

fn srgb_to_linear(value: u8) -> f32 {
    let c = value as f32 / 255.0;
    c.powf(2.2)
}

fn to_point(value: Vec3) -> Point3 {
    Point3::new(value.x, value.y, value.z)
}
