use super::camera::Projection;
use super::math::{Bounds, Vec3};

pub const FRAMING_PADDING: f64 = 1.5;
pub const ISOMETRIC_FACTOR: f64 = 0.7;
pub const ORTHOGRAPHIC_FRAMING_FOV_DEG: f64 = 45.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewDirection {
    Front,
    Top,
    Side,
    Reset,
}

impl ViewDirection {
    pub const ALL: [ViewDirection; 4] = [
        ViewDirection::Front,
        ViewDirection::Top,
        ViewDirection::Side,
        ViewDirection::Reset,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewDirection::Front => "front",
            ViewDirection::Top => "top",
            ViewDirection::Side => "side",
            ViewDirection::Reset => "reset",
        }
    }
}

impl std::str::FromStr for ViewDirection {
    type Err = moldview_base::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(ViewDirection::Front),
            "top" => Ok(ViewDirection::Top),
            "side" => Ok(ViewDirection::Side),
            "reset" | "iso" | "isometric" => Ok(ViewDirection::Reset),
            other => Err(moldview_base::Error::InvalidParameter(format!(
                "unknown view direction '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Framing {
    pub position: Vec3,
    pub target: Vec3,
}

pub fn framing_fov(projection: &Projection) -> f64 {
    match projection {
        Projection::Perspective { fov_deg, .. } => fov_deg.to_radians(),
        Projection::Orthographic { .. } => ORTHOGRAPHIC_FRAMING_FOV_DEG.to_radians(),
    }
}

pub fn framing_distance(max_dim: f64, fov: f64) -> f64 {
    max_dim / 2.0 / (fov / 2.0).tan() * FRAMING_PADDING
}

pub fn view_offset(direction: ViewDirection, distance: f64) -> Vec3 {
    match direction {
        ViewDirection::Front => Vec3::new(0.0, 0.0, distance),
        ViewDirection::Top => Vec3::new(0.0, distance, 0.0),
        ViewDirection::Side => Vec3::new(distance, 0.0, 0.0),
        ViewDirection::Reset => Vec3::splat(distance * ISOMETRIC_FACTOR),
    }
}

pub fn compute_framing(
    bounds: &Bounds,
    projection: &Projection,
    direction: ViewDirection,
) -> Framing {
    let center = bounds.center();
    let distance = framing_distance(bounds.max_dimension(), framing_fov(projection));
    Framing {
        position: center + view_offset(direction, distance),
        target: center,
    }
}
