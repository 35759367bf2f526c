use anyhow::Result;
use moldview_io::{FileGeometrySource, GeometrySource, MeshFormat, read_mesh};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_nanos(),
        Err(_) => 0,
    };
    path.push(format!("moldview_{stamp}_{file_name}"));
    path
}

fn write_tetra_stl(path: &Path) -> Result<()> {
    let text = "solid tetra
facet normal 0 0 -1
 outer loop
  vertex 0 0 0
  vertex 10 0 0
  vertex 0 4 0
 endloop
endfacet
facet normal 0 -1 0
 outer loop
  vertex 0 0 0
  vertex 0 0 2
  vertex 10 0 0
 endloop
endfacet
facet normal -1 0 0
 outer loop
  vertex 0 0 0
  vertex 0 4 0
  vertex 0 0 2
 endloop
endfacet
facet normal 1 1 1
 outer loop
  vertex 10 0 0
  vertex 0 0 2
  vertex 0 4 0
 endloop
endfacet
endsolid tetra
";
    fs::write(path, text)?;
    Ok(())
}

#[test]
fn ascii_stl_loads_with_bounds() -> Result<()> {
    let path = temp_path("tetra.stl");
    write_tetra_stl(&path)?;

    let geometry = FileGeometrySource.load(&path)?;
    let size = geometry.bounds.size();
    assert!((size.x - 10.0).abs() < 1.0e-9);
    assert!((size.y - 4.0).abs() < 1.0e-9);
    assert!((size.z - 2.0).abs() < 1.0e-9);
    assert_eq!(geometry.mesh.positions().len(), 4);

    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn obj_loads_with_bounds() -> Result<()> {
    let path = temp_path("tri.obj");
    fs::write(&path, "v -1 -1 0\nv 1 -1 0\nv 0 3 5\nf 1 2 3\n")?;

    let geometry = FileGeometrySource.load(&path)?;
    let center = geometry.bounds.center();
    assert!((center.y - 1.0).abs() < 1.0e-9);
    assert!((center.z - 2.5).abs() < 1.0e-9);

    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() {
    let path = temp_path("part.step");
    assert_eq!(MeshFormat::from_path(&path), None);
    let err = read_mesh(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported mesh format"));
}

#[test]
fn missing_file_reports_path() {
    let path = temp_path("missing.stl");
    let err = FileGeometrySource.load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("missing.stl"));
}
