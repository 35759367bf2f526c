use anyhow::{Result, bail};
use moldview_base::DimensionUnit;
use moldview_io::FileGeometrySource;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use moldview_view::viewer::{
    Axis, CameraKind, HeadlessRenderer, NodeFamily, Projection, SceneRenderer, SurfaceSize,
    ViewDirection, ViewportController,
};
use moldview_view::ViewerConfig;

use crate::cli::{HeadlessCommand, InspectArgs};

pub fn run_headless(command: HeadlessCommand, config: &ViewerConfig) -> Result<()> {
    match command {
        HeadlessCommand::Inspect(args) => inspect(args, config),
    }
}

fn inspect(args: InspectArgs, config: &ViewerConfig) -> Result<()> {
    let camera: CameraKind = args.camera.parse()?;
    let view: ViewDirection = args.view.parse()?;
    let axis: Axis = args.axis.parse()?;

    let mut options = config.viewport_options()?;
    options.asset_path = args.input.clone();
    if let Some(unit) = &args.unit {
        options.unit = DimensionUnit::new(unit.clone());
    }

    let surface = SurfaceSize::new(args.width, args.height, 1.0);
    let mut viewport = ViewportController::new(
        surface,
        options,
        HeadlessRenderer::new(),
        Arc::new(FileGeometrySource),
    );
    viewport.on_ready();
    if !viewport.wait_for_load(Duration::from_secs(args.timeout)) {
        let reason = viewport
            .last_error()
            .map(str::to_string)
            .unwrap_or_else(|| format!("timed out loading {}", args.input.display()));
        viewport.on_teardown();
        bail!(reason);
    }

    viewport.set_camera_type(camera);
    viewport.set_demolding_direction(axis);
    viewport.set_dimensions_visible(true);
    viewport.set_demolding_visible(true);
    viewport.set_view(view);
    for _ in 0..args.frames {
        viewport.tick();
    }

    if let Some(model) = viewport.model() {
        println!("model: {}", model.path.display());
        println!(
            "mesh: {} vertices, {} triangles",
            model.vertices, model.triangles
        );
    }
    if let Some(dims) = viewport.dimensions() {
        let unit = &viewport.state().unit;
        println!(
            "dimensions: W {:.2} {unit}, H {:.2} {unit}, D {:.2} {unit}",
            dims.width, dims.height, dims.depth
        );
    }
    if let Some(camera) = viewport.camera() {
        println!(
            "camera: {} at ({:.3}, {:.3}, {:.3}) looking at ({:.3}, {:.3}, {:.3})",
            camera.kind().label(),
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z
        );
        match camera.projection {
            Projection::Perspective { fov_deg, aspect, .. } => {
                println!("projection: fov {fov_deg:.1} deg, aspect {aspect:.3}");
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                ..
            } => {
                println!(
                    "projection: left {left:.3}, right {right:.3}, top {top:.3}, bottom {bottom:.3}"
                );
            }
        }
    }
    let scene = viewport.scene();
    println!(
        "nodes: dimensions {}, demolding {}, bounding box {}",
        scene.count_family(NodeFamily::Dimensions),
        scene.count_family(NodeFamily::Demolding),
        scene.count_family(NodeFamily::BoundingBox)
    );
    println!(
        "frames: {} ({} draw calls, {} drawables last frame)",
        viewport.frame_count(),
        viewport.renderer().draw_calls(),
        viewport.renderer().last_drawn()
    );

    viewport.on_teardown();
    info!(path = %args.input.display(), "inspection complete");
    Ok(())
}
