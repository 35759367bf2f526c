use anyhow::{Context, Result};
use moldview_base::DimensionUnit;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::viewer::viewport::{DEFAULT_ASSET_PATH, ViewportOptions};
use crate::viewer::{CameraKind, Color32, OrbitSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset_path: PathBuf,
    pub model_color: String,
    pub background_color: String,
    pub unit: DimensionUnit,
    pub camera: String,
    pub orbit: OrbitSettings,
    pub window: WindowConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from(DEFAULT_ASSET_PATH),
            model_color: "#AAAAAA".to_string(),
            background_color: "#F0F0F0".to_string(),
            unit: DimensionUnit::default(),
            camera: CameraKind::Perspective.label().to_string(),
            orbit: OrbitSettings::default(),
            window: WindowConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn viewport_options(&self) -> Result<ViewportOptions> {
        Ok(ViewportOptions {
            asset_path: self.asset_path.clone(),
            color: Color32::from_hex(&self.model_color).context("model_color")?,
            background: Color32::from_hex(&self.background_color).context("background_color")?,
            unit: self.unit.clone(),
            camera: self.camera.parse::<CameraKind>().context("camera")?,
            orbit: self.orbit,
        })
    }
}
