pub mod mesh;
pub mod source;

pub use mesh::{MeshBounds, MeshFormat, read_mesh};
pub use source::{FileGeometrySource, GeometrySource, LoadedGeometry};
