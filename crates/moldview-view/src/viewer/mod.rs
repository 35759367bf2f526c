pub mod annotations;
pub mod camera;
pub mod framing;
pub mod input;
pub mod label;
pub mod loader;
pub mod math;
pub mod mesh;
pub mod orbit;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod surface;
#[cfg(feature = "gui")]
pub mod truck_renderer;
pub mod ui;
pub mod viewport;

pub use annotations::{DemoldingIndicator, DimensionOverlay, Dimensions, calculate_dimensions};
pub use camera::{Camera, CameraKind, CameraRig, Projection};
pub use framing::{Framing, ViewDirection, compute_framing};
pub use input::ViewerInput;
pub use loader::{GeometryLoader, LoadCompletion};
pub use math::{Axis, Bounds, Vec3};
pub use orbit::{OrbitController, OrbitSettings};
pub use render_loop::{FrameHandle, RenderLoop};
pub use renderer::{HeadlessRenderer, SceneRenderer};
pub use scene::{NodeFamily, NodeId, NodePayload, SceneGraph, SceneNode};
pub use state::{ViewportPhase, ViewportState};
pub use surface::SurfaceSize;
pub use ui::Color32;
#[cfg(feature = "gui")]
pub use truck_renderer::TruckRenderer;
pub use viewport::{ModelInfo, ViewportController, ViewportOptions};
