use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use truck_base::cgmath64::{Point3, Vector3};
use truck_meshalgo::prelude::*;
use truck_polymesh::{PolygonMesh, obj, stl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Point3,
    pub max: Point3,
}

impl MeshBounds {
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut min = *first;
        let mut max = *first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }
}

pub fn read_mesh(path: impl AsRef<Path>) -> Result<PolygonMesh> {
    let path = path.as_ref();
    let Some(format) = MeshFormat::from_path(path) else {
        bail!("unsupported mesh format: {}", path.display());
    };

    let file = File::open(path).with_context(|| format!("open mesh file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut mesh = match format {
        MeshFormat::Stl => stl::read(reader, stl::StlType::Automatic)
            .with_context(|| format!("read STL file {}", path.display()))?,
        MeshFormat::Obj => {
            obj::read(reader).with_context(|| format!("read OBJ file {}", path.display()))?
        }
    };

    if mesh.positions().is_empty() || mesh.faces().len() == 0 {
        bail!("mesh file contains no triangles: {}", path.display());
    }

    mesh.put_together_same_attrs(truck_base::tolerance::TOLERANCE);
    mesh.remove_unused_attrs();
    Ok(mesh)
}
