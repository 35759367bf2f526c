use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display label for measured lengths. Only the label text changes with the unit;
/// measured values are never converted.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionUnit(String);

impl DimensionUnit {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl Default for DimensionUnit {
    fn default() -> Self {
        Self("mm".to_string())
    }
}

impl std::fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guids_are_unique() {
        assert_ne!(Guid::new(), Guid::new());
    }

    #[test]
    fn unit_defaults_to_millimeters() {
        assert_eq!(DimensionUnit::default().label(), "mm");
        assert_eq!(DimensionUnit::new("in").to_string(), "in");
    }

    #[test]
    fn load_error_names_path() {
        let err = Error::Load {
            path: PathBuf::from("part.stl"),
            reason: "truncated".to_string(),
        };
        assert_eq!(err.to_string(), "failed to load part.stl: truncated");
    }
}
