use anyhow::{Result, anyhow};
use moldview_io::{GeometrySource, LoadedGeometry, MeshBounds};
use moldview_view::viewer::loader::LoadCompletion;
use moldview_view::viewer::{
    Axis, CameraKind, Color32, HeadlessRenderer, NodeFamily, NodeId, NodePayload, Projection,
    SceneRenderer, SurfaceSize, Vec3, ViewDirection, ViewportController, ViewportOptions,
    ViewportPhase,
};
use moldview_view::viewer::scene::MeshMaterial;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use truck_base::cgmath64::Point3;
use truck_polymesh::{Faces, PolygonMesh, StandardAttributes, StandardVertex};

const TIMEOUT: Duration = Duration::from_secs(5);

struct BoxSource {
    boxes: HashMap<PathBuf, (Vec3, Vec3)>,
}

impl BoxSource {
    fn new(entries: &[(&str, Vec3, Vec3)]) -> Arc<Self> {
        let boxes = entries
            .iter()
            .map(|(path, min, max)| (PathBuf::from(path), (*min, *max)))
            .collect();
        Arc::new(Self { boxes })
    }
}

impl GeometrySource for BoxSource {
    fn load(&self, path: &Path) -> Result<LoadedGeometry> {
        let (min, max) = self
            .boxes
            .get(path)
            .copied()
            .ok_or_else(|| anyhow!("no such model: {}", path.display()))?;
        LoadedGeometry::new(box_mesh(min, max))
    }
}

fn box_mesh(min: Vec3, max: Vec3) -> PolygonMesh {
    let positions = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    let quads: [[usize; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [1, 2, 6, 5],
        [0, 4, 7, 3],
    ];
    let vertex = |pos: usize| StandardVertex {
        pos,
        uv: None,
        nor: None,
    };
    let tri_faces: Vec<[StandardVertex; 3]> = quads
        .iter()
        .flat_map(|q| {
            [
                [vertex(q[0]), vertex(q[1]), vertex(q[2])],
                [vertex(q[0]), vertex(q[2]), vertex(q[3])],
            ]
        })
        .collect();
    PolygonMesh::new(
        StandardAttributes {
            positions,
            ..Default::default()
        },
        Faces::from_tri_and_quad_faces(tri_faces, Vec::new()),
    )
}

fn part_a() -> (&'static str, Vec3, Vec3) {
    ("a.stl", Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 4.0, 2.0))
}

fn part_b() -> (&'static str, Vec3, Vec3) {
    ("b.stl", Vec3::new(5.0, 5.0, 5.0), Vec3::new(45.0, 25.0, 15.0))
}

fn viewport(asset: &str, source: Arc<BoxSource>) -> ViewportController<HeadlessRenderer> {
    let options = ViewportOptions {
        asset_path: PathBuf::from(asset),
        ..ViewportOptions::default()
    };
    ViewportController::new(
        SurfaceSize::new(800, 600, 1.0),
        options,
        HeadlessRenderer::new(),
        source,
    )
}

fn loaded_viewport() -> Result<ViewportController<HeadlessRenderer>> {
    let mut viewport = viewport("a.stl", BoxSource::new(&[part_a(), part_b()]));
    viewport.on_ready();
    if !viewport.wait_for_load(TIMEOUT) {
        return Err(anyhow!("load did not finish"));
    }
    Ok(viewport)
}

fn assert_close(a: Vec3, b: Vec3) {
    let eps = 1e-9;
    assert!(
        (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps && (a.z - b.z).abs() < eps,
        "{a:?} != {b:?}"
    );
}

fn model_material(
    viewport: &ViewportController<HeadlessRenderer>,
) -> Result<(NodeId, MeshMaterial)> {
    let mut models = viewport
        .scene()
        .nodes()
        .iter()
        .filter(|node| node.family == NodeFamily::Model);
    let node = models.next().ok_or_else(|| anyhow!("no model node"))?;
    assert!(models.next().is_none());
    match &node.payload {
        NodePayload::Mesh { material, .. } => Ok((node.id(), *material)),
        _ => Err(anyhow!("model node has no mesh")),
    }
}

fn label_texts(viewport: &ViewportController<HeadlessRenderer>) -> Vec<String> {
    viewport
        .scene()
        .nodes()
        .iter()
        .filter(|node| node.family == NodeFamily::Dimensions)
        .filter_map(|node| match &node.payload {
            NodePayload::Label(sprite) => Some(sprite.text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn load_centers_model_and_frames_front() -> Result<()> {
    let viewport = loaded_viewport()?;
    assert_eq!(viewport.state().phase, ViewportPhase::Ready);
    let model = viewport.model().ok_or_else(|| anyhow!("no model"))?;
    assert_close(model.bounds.center(), Vec3::ZERO);
    assert_close(model.offset, Vec3::new(5.0, 2.0, 1.0));

    let camera = viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    assert_close(camera.target, Vec3::ZERO);
    assert!(camera.position.x.abs() < 1e-9);
    assert!(camera.position.y.abs() < 1e-9);
    assert!((camera.position.z - 9.7742).abs() < 1e-3);
    assert_eq!(viewport.scene().count_family(NodeFamily::BoundingBox), 1);
    assert!(!viewport.state().bounding_box_visible);
    Ok(())
}

#[test]
fn camera_switch_round_trip_without_model_restores_pose() -> Result<()> {
    let mut viewport = viewport("missing.stl", BoxSource::new(&[]));
    viewport.on_ready();
    assert!(!viewport.wait_for_load(TIMEOUT));
    assert_eq!(viewport.state().phase, ViewportPhase::Empty);

    let before = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    viewport.set_camera_type(CameraKind::Orthographic);
    assert_eq!(viewport.state().camera_kind, CameraKind::Orthographic);
    viewport.set_camera_type(CameraKind::Perspective);
    let after = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;

    assert_eq!(after.kind(), CameraKind::Perspective);
    assert_close(after.position, before.position);
    assert_close(after.target, before.target);
    assert_eq!(viewport.scene().count_family(NodeFamily::Camera), 1);
    Ok(())
}

#[test]
fn camera_switch_round_trip_from_reset_view_restores_pose() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_view(ViewDirection::Reset);
    let before = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;

    viewport.set_camera_type(CameraKind::Orthographic);
    viewport.set_camera_type(CameraKind::Perspective);
    let after = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;

    assert_close(after.position, before.position);
    assert_close(after.target, before.target);
    Ok(())
}

#[test]
fn framing_front_twice_is_bit_identical() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_view(ViewDirection::Top);
    viewport.set_view(ViewDirection::Front);
    let first = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    viewport.set_view(ViewDirection::Front);
    let second = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;

    assert_eq!(first.position, second.position);
    assert_eq!(first.target, second.target);
    Ok(())
}

#[test]
fn framing_without_model_is_a_no_op() -> Result<()> {
    let mut viewport = viewport("missing.stl", BoxSource::new(&[]));
    viewport.on_ready();
    viewport.wait_for_load(TIMEOUT);
    let before = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    viewport.set_view(ViewDirection::Side);
    let after = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn annotations_without_model_add_no_nodes() -> Result<()> {
    let mut viewport = viewport("missing.stl", BoxSource::new(&[]));
    viewport.on_ready();
    viewport.wait_for_load(TIMEOUT);
    let live_before = viewport.scene().ledger().live();

    viewport.set_dimensions_visible(true);
    viewport.set_demolding_visible(true);
    viewport.set_demolding_direction(Axis::Z);
    assert!(viewport.state().dimensions_visible);
    assert!(viewport.state().demolding_visible);
    assert!(viewport.dimensions().is_none());
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 0);
    assert_eq!(viewport.scene().count_family(NodeFamily::Demolding), 0);
    assert_eq!(viewport.scene().ledger().live(), live_before);
    Ok(())
}

#[test]
fn dimensions_on_then_off_leaves_no_nodes() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    let live_before = viewport.scene().ledger().live();

    viewport.set_dimensions_visible(true);
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 6);
    viewport.set_dimensions_visible(true);
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 6);

    viewport.set_dimensions_visible(false);
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 0);
    assert_eq!(viewport.scene().ledger().live(), live_before);
    Ok(())
}

#[test]
fn demolding_changes_keep_one_arrow_and_one_axes_helper() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_demolding_visible(true);
    for axis in [Axis::X, Axis::Y, Axis::Z, Axis::Y, Axis::X, Axis::X] {
        viewport.set_demolding_direction(axis);
        let scene = viewport.scene();
        assert_eq!(scene.find_by_name("demolding-arrow").count(), 1);
        assert_eq!(scene.find_by_name("demolding-axes").count(), 1);
        assert_eq!(scene.find_by_name("demolding-label").count(), 1);
    }
    assert_eq!(viewport.state().demolding_axis, Axis::X);

    viewport.toggle_demolding();
    assert_eq!(viewport.scene().count_family(NodeFamily::Demolding), 0);
    Ok(())
}

#[test]
fn reload_sizes_annotations_to_new_model_only() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_dimensions_visible(true);
    viewport.set_demolding_visible(true);
    let live_with_a = viewport.scene().ledger().live();

    viewport.request_load("b.stl");
    assert_eq!(viewport.state().phase, ViewportPhase::Loading);
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 0);
    assert_eq!(viewport.scene().count_family(NodeFamily::Demolding), 0);
    assert_eq!(viewport.scene().count_family(NodeFamily::Model), 0);
    assert!(viewport.wait_for_load(TIMEOUT));

    let dims = viewport.dimensions().ok_or_else(|| anyhow!("no dimensions"))?;
    assert_eq!((dims.width, dims.height, dims.depth), (40.0, 20.0, 10.0));
    let mut texts = label_texts(&viewport);
    texts.sort();
    assert_eq!(
        texts,
        vec!["D: 10.00 mm", "H: 20.00 mm", "W: 40.00 mm"]
    );
    assert_eq!(viewport.scene().count_family(NodeFamily::Model), 1);
    assert_eq!(viewport.scene().count_family(NodeFamily::BoundingBox), 1);
    assert_eq!(viewport.scene().count_family(NodeFamily::Dimensions), 6);
    assert_eq!(viewport.scene().find_by_name("demolding-arrow").count(), 1);
    assert_eq!(viewport.scene().ledger().live(), live_with_a);
    Ok(())
}

#[test]
fn unit_changes_only_label_text() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_dimensions_visible(true);
    let before = viewport.dimensions().ok_or_else(|| anyhow!("no dimensions"))?;
    assert_eq!((before.width, before.height, before.depth), (10.0, 4.0, 2.0));

    viewport.set_unit("in");
    let after = viewport.dimensions().ok_or_else(|| anyhow!("no dimensions"))?;
    assert_eq!(before, after);
    let mut texts = label_texts(&viewport);
    texts.sort();
    assert_eq!(texts, vec!["D: 2.00 in", "H: 4.00 in", "W: 10.00 in"]);
    Ok(())
}

#[test]
fn orthographic_resize_scales_width_only() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.set_camera_type(CameraKind::Orthographic);
    viewport.on_resize(SurfaceSize::new(1000, 500, 1.0));
    let Some(Projection::Orthographic {
        left,
        right,
        top,
        bottom,
        ..
    }) = viewport.camera().map(|c| c.projection)
    else {
        return Err(anyhow!("expected orthographic projection"));
    };
    assert!((top - 6.0).abs() < 1e-9);
    assert!((bottom + 6.0).abs() < 1e-9);
    assert!((right - 12.0).abs() < 1e-9);
    assert!((left + 12.0).abs() < 1e-9);

    viewport.on_resize(SurfaceSize::new(500, 500, 1.0));
    let Some(Projection::Orthographic {
        left, right, top, ..
    }) = viewport.camera().map(|c| c.projection)
    else {
        return Err(anyhow!("expected orthographic projection"));
    };
    assert!((top - 6.0).abs() < 1e-9);
    assert!((right - 6.0).abs() < 1e-9);
    assert!((left + 6.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn teardown_stops_frames_and_ignores_later_events() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    assert!(viewport.tick());
    assert!(viewport.tick());
    let frames = viewport.frame_count();
    let draws = viewport.renderer().draw_calls();
    assert_eq!(frames, 2);

    viewport.on_teardown();
    viewport.on_teardown();
    assert!(!viewport.is_running());
    assert!(!viewport.tick());
    viewport.set_dimensions_visible(true);
    viewport.toggle_wireframe();
    viewport.set_view(ViewDirection::Top);
    viewport.on_resize(SurfaceSize::new(10, 10, 1.0));
    viewport.request_load("b.stl");

    assert_eq!(viewport.frame_count(), frames);
    assert_eq!(viewport.renderer().draw_calls(), draws);
    assert!(viewport.renderer().is_disposed());
    assert_eq!(viewport.state().phase, ViewportPhase::Disposed);
    assert!(viewport.scene().is_empty());
    assert_eq!(viewport.scene().ledger().live(), 0);
    Ok(())
}

#[test]
fn stale_completion_is_ignored() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    let current = viewport.generation();
    let stale = LoadCompletion {
        generation: current - 1,
        path: PathBuf::from("b.stl"),
        result: LoadedGeometry::new(box_mesh(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0))),
    };
    assert!(!viewport.on_load_complete(stale));
    let model = viewport.model().ok_or_else(|| anyhow!("no model"))?;
    assert_eq!(model.path, PathBuf::from("a.stl"));
    Ok(())
}

#[test]
fn superseded_request_installs_latest_model() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.request_load("a.stl");
    viewport.request_load("b.stl");
    assert!(viewport.wait_for_load(TIMEOUT));
    let model = viewport.model().ok_or_else(|| anyhow!("no model"))?;
    assert_eq!(model.path, PathBuf::from("b.stl"));
    assert_eq!(viewport.scene().count_family(NodeFamily::Model), 1);
    Ok(())
}

#[test]
fn failed_load_reports_and_recovers() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    viewport.request_load("missing.stl");
    assert!(!viewport.wait_for_load(TIMEOUT));
    assert_eq!(viewport.state().phase, ViewportPhase::Empty);
    let err = viewport.last_error().ok_or_else(|| anyhow!("no error recorded"))?;
    assert!(err.contains("missing.stl"));

    viewport.toggle_bounding_box();
    assert!(!viewport.state().bounding_box_visible);

    viewport.request_load("b.stl");
    assert!(viewport.wait_for_load(TIMEOUT));
    assert_eq!(viewport.state().phase, ViewportPhase::Ready);
    Ok(())
}

#[test]
fn display_toggles_update_state() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    let (model_id, material) = model_material(&viewport)?;
    assert!(!material.wireframe);

    assert!(viewport.set_color("not-a-color").is_err());
    assert_eq!(model_material(&viewport)?.1, material);
    viewport.set_color("#FF8800")?;
    assert_eq!(viewport.state().color.to_hex(), "#FF8800");
    let (id, material) = model_material(&viewport)?;
    assert_eq!(id, model_id);
    assert_eq!(material.color, Color32::from_rgb(0xFF, 0x88, 0x00));

    viewport.toggle_wireframe();
    assert!(viewport.state().wireframe);
    let (id, material) = model_material(&viewport)?;
    assert_eq!(id, model_id);
    assert!(material.wireframe);
    assert_eq!(material.color, Color32::from_rgb(0xFF, 0x88, 0x00));
    assert_eq!(viewport.scene().count_family(NodeFamily::Model), 1);

    viewport.toggle_bounding_box();
    assert!(viewport.state().bounding_box_visible);
    let visible_boxes = viewport
        .scene()
        .nodes()
        .iter()
        .filter(|node| node.family == NodeFamily::BoundingBox && node.visible)
        .count();
    assert_eq!(visible_boxes, 1);
    Ok(())
}

#[test]
fn perspective_resize_changes_aspect_only() -> Result<()> {
    let mut viewport = loaded_viewport()?;
    let before = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;
    viewport.on_resize(SurfaceSize::new(1000, 500, 1.0));
    let after = *viewport.camera().ok_or_else(|| anyhow!("no camera"))?;

    let Projection::Perspective {
        fov_deg,
        aspect,
        near,
        far,
    } = after.projection
    else {
        return Err(anyhow!("expected perspective projection"));
    };
    assert_eq!(fov_deg, 75.0);
    assert_eq!(aspect, 2.0);
    assert_eq!((near, far), (0.1, 1000.0));
    assert_eq!(after.position, before.position);
    assert_eq!(after.target, before.target);
    Ok(())
}

// Bounds wider than the mesh itself.
struct PaddedSource;

impl GeometrySource for PaddedSource {
    fn load(&self, _path: &Path) -> Result<LoadedGeometry> {
        let mesh = box_mesh(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 4.0, 2.0));
        let bounds = MeshBounds {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(11.0, 5.0, 3.0),
        };
        Ok(LoadedGeometry { mesh, bounds })
    }
}

#[test]
fn model_is_centered_on_source_bounds() -> Result<()> {
    let mut viewport = ViewportController::new(
        SurfaceSize::new(800, 600, 1.0),
        ViewportOptions::default(),
        HeadlessRenderer::new(),
        Arc::new(PaddedSource),
    );
    viewport.on_ready();
    assert!(viewport.wait_for_load(TIMEOUT));

    let model = viewport.model().ok_or_else(|| anyhow!("no model"))?;
    assert_close(model.offset, Vec3::new(5.0, 2.0, 1.0));
    assert_close(model.bounds.min, Vec3::new(-6.0, -3.0, -2.0));
    assert_close(model.bounds.max, Vec3::new(6.0, 3.0, 2.0));
    let dims = viewport.dimensions().ok_or_else(|| anyhow!("no dimensions"))?;
    assert_eq!((dims.width, dims.height, dims.depth), (12.0, 6.0, 4.0));
    Ok(())
}
