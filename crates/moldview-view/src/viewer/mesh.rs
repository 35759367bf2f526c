use std::collections::HashSet;
use truck_polymesh::PolygonMesh;

use super::math::{Bounds, Vec3};

const RADIAL_SEGMENTS: usize = 24;

#[derive(Clone, Debug)]
pub struct ViewerMesh {
    pub positions: Vec<Vec3>,
    pub tri_faces: Vec<[usize; 3]>,
    pub bounds: Option<Bounds>,
}

impl ViewerMesh {
    pub fn new(positions: Vec<Vec3>, tri_faces: Vec<[usize; 3]>) -> Self {
        let bounds = Bounds::from_points(&positions);
        Self {
            positions,
            tri_faces,
            bounds,
        }
    }

    pub fn from_mesh(mesh: &PolygonMesh) -> Self {
        let positions: Vec<Vec3> = mesh.positions().iter().copied().map(Vec3::from).collect();

        let mut tri_faces = Vec::new();
        tri_faces.extend(mesh.tri_faces().iter().map(|tri| [tri[0].pos, tri[1].pos, tri[2].pos]));
        for quad in mesh.quad_faces() {
            tri_faces.push([quad[0].pos, quad[1].pos, quad[2].pos]);
            tri_faces.push([quad[0].pos, quad[2].pos, quad[3].pos]);
        }
        for face in mesh.faces().other_faces() {
            if face.len() < 3 {
                continue;
            }
            for idx in 1..(face.len() - 1) {
                tri_faces.push([face[0].pos, face[idx].pos, face[idx + 1].pos]);
            }
        }

        Self::new(positions, tri_faces)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.tri_faces.is_empty()
    }

    pub fn translate(&mut self, delta: Vec3) {
        for p in &mut self.positions {
            *p = *p + delta;
        }
        self.bounds = self
            .bounds
            .map(|bounds| Bounds::new(bounds.min + delta, bounds.max + delta));
    }

    pub fn edges(&self) -> Vec<[usize; 2]> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for tri in &self.tri_faces {
            for &(a, b) in &[(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = if a <= b { (a, b) } else { (b, a) };
                if seen.insert(key) {
                    edges.push([key.0, key.1]);
                }
            }
        }
        edges
    }

    pub fn cylinder(radius_top: f64, radius_bottom: f64, height: f64) -> Self {
        let half = height * 0.5;
        let mut positions = Vec::with_capacity(RADIAL_SEGMENTS * 2 + 2);
        for i in 0..RADIAL_SEGMENTS {
            let theta = i as f64 / RADIAL_SEGMENTS as f64 * std::f64::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            positions.push(Vec3::new(radius_bottom * sin, -half, radius_bottom * cos));
            positions.push(Vec3::new(radius_top * sin, half, radius_top * cos));
        }
        let bottom_center = positions.len();
        positions.push(Vec3::new(0.0, -half, 0.0));
        let top_center = positions.len();
        positions.push(Vec3::new(0.0, half, 0.0));

        let mut tri_faces = Vec::with_capacity(RADIAL_SEGMENTS * 4);
        for i in 0..RADIAL_SEGMENTS {
            let j = (i + 1) % RADIAL_SEGMENTS;
            let (b0, t0) = (2 * i, 2 * i + 1);
            let (b1, t1) = (2 * j, 2 * j + 1);
            tri_faces.push([b0, b1, t0]);
            if radius_top > 0.0 {
                tri_faces.push([t0, b1, t1]);
                tri_faces.push([top_center, t0, t1]);
            }
            tri_faces.push([bottom_center, b1, b0]);
        }

        Self::new(positions, tri_faces)
    }

    pub fn cone(radius: f64, height: f64) -> Self {
        Self::cylinder(0.0, radius, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_moves_points_and_bounds() {
        let mut mesh = ViewerMesh::new(
            vec![
                Vec3::new(10.0, 10.0, 10.0),
                Vec3::new(20.0, 14.0, 12.0),
                Vec3::new(10.0, 14.0, 10.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.translate(-Vec3::new(15.0, 12.0, 11.0));
        assert_eq!(mesh.positions[0], Vec3::new(-5.0, -2.0, -1.0));
        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.center(), Vec3::ZERO);
        assert_eq!(bounds.size(), Vec3::new(10.0, 4.0, 2.0));
    }

    #[test]
    fn triangle_edges_are_deduplicated() {
        let mesh = ViewerMesh::new(
            vec![Vec3::ZERO, Vec3::UNIT_X, Vec3::UNIT_Y, Vec3::new(1.0, 1.0, 0.0)],
            vec![[0, 1, 2], [1, 3, 2]],
        );
        assert_eq!(mesh.edges().len(), 5);
    }

    #[test]
    fn cone_spans_its_height() {
        let cone = ViewerMesh::cone(0.5, 2.0);
        let bounds = cone.bounds.unwrap();
        assert!((bounds.size().y - 2.0).abs() < 1.0e-12);
        assert!((bounds.max_dimension() - 2.0).abs() < 1.0e-12);
        assert!(!cone.is_empty());
    }
}
