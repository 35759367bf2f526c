use anyhow::{Result, bail};
use std::path::Path;
use truck_polymesh::PolygonMesh;

use crate::mesh::{MeshBounds, read_mesh};

#[derive(Clone, Debug)]
pub struct LoadedGeometry {
    pub mesh: PolygonMesh,
    pub bounds: MeshBounds,
}

impl LoadedGeometry {
    pub fn new(mesh: PolygonMesh) -> Result<Self> {
        let Some(bounds) = MeshBounds::from_points(mesh.positions()) else {
            bail!("mesh has no vertices");
        };
        Ok(Self { mesh, bounds })
    }
}

pub trait GeometrySource: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedGeometry>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FileGeometrySource;

impl GeometrySource for FileGeometrySource {
    fn load(&self, path: &Path) -> Result<LoadedGeometry> {
        LoadedGeometry::new(read_mesh(path)?)
    }
}
