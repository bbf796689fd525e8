//! Loop-style subdivision
use super::{adjacency::FaceAdjacency, IsoSurface, IsoVertex};
use crate::{grid::NO_VERTEX, NormalMode};
use nalgebra::Vector3;

/// Blend weight for an interior vertex, given the number of edge samples
/// gathered around it (each incident edge is seen from two triangles)
fn interior_alpha(samples: usize) -> f32 {
    match samples {
        6 => 1.05,
        8 => 0.86,
        10 => 0.7,
        _ => 0.6,
    }
}

/// Running sum of vertex positions and normals
#[derive(Copy, Clone)]
struct Accum {
    pos: Vector3<f32>,
    normal: Vector3<f32>,
    count: usize,
}

impl Accum {
    fn new() -> Self {
        Self {
            pos: Vector3::zeros(),
            normal: Vector3::zeros(),
            count: 0,
        }
    }
    fn add(&mut self, pos: Vector3<f32>, normal: Vector3<f32>) {
        self.pos += pos;
        self.normal += normal;
        self.count += 1;
    }
    fn mean(&self) -> IsoVertex {
        let s = 1.0 / self.count as f32;
        IsoVertex {
            pos: self.pos * s,
            normal: self.normal * s,
        }
    }
}

impl IsoSurface {
    /// Runs one pass of Loop subdivision on the current mesh
    ///
    /// Every triangle is split into four, with one new vertex per edge
    /// (shared between the two triangles on either side of it).  On a closed
    /// mesh, this takes `V` vertices, `E` edges, and `F` triangles to `V + E`
    /// vertices and `4F` triangles.
    ///
    /// Edge vertices use the Loop stencil on interior edges and the midpoint
    /// on boundary edges; old vertices are pulled towards the average of the
    /// edge vertices around them.  Normals are carried along with the same
    /// weights then normalized ([`NormalMode::Accumulate`]) or rebuilt from
    /// the new triangles ([`NormalMode::Recalculate`]).
    pub fn subdivide(&mut self, mode: NormalMode) {
        let nv = self.points.len();
        let nf = self.indices.len() / 3;
        if nf == 0 {
            return;
        }
        let adj = FaceAdjacency::new(nv, &self.indices);

        // Assign one new vertex to each edge, shared with the face across it
        let mut edge_verts = vec![NO_VERTEX; nf * 3];
        let mut next = nv;
        for f in 0..nf {
            for e in 0..3 {
                if edge_verts[f * 3 + e] != NO_VERTEX {
                    continue;
                }
                edge_verts[f * 3 + e] = next;
                if let Some(other) = adj.across_edge[f * 3 + e] {
                    let v1 = self.indices[f * 3 + (e + 1) % 3];
                    let tri = &self.indices[other * 3..other * 3 + 3];
                    if let Some(p) = tri.iter().position(|&v| v == v1) {
                        edge_verts[other * 3 + (p + 1) % 3] = next;
                    }
                }
                next += 1;
            }
        }

        let mut edge_accum = vec![Accum::new(); next - nv];
        for f in 0..nf {
            let tri = &self.indices[f * 3..f * 3 + 3];
            for e in 0..3 {
                let c = &self.points[tri[e]];
                let a = &self.points[tri[(e + 1) % 3]];
                let b = &self.points[tri[(e + 2) % 3]];
                let acc = &mut edge_accum[edge_verts[f * 3 + e] - nv];
                if adj.across_edge[f * 3 + e].is_some() {
                    acc.add(
                        c.pos * 0.25 + (a.pos + b.pos) * 0.375,
                        c.normal * 0.25 + (a.normal + b.normal) * 0.375,
                    );
                } else {
                    acc.add((a.pos + b.pos) * 0.5, (a.normal + b.normal) * 0.5);
                }
            }
        }

        let mut points = self.points.clone();
        points.extend(edge_accum.iter().map(Accum::mean));

        // Pull old vertices towards their surrounding edge vertices
        for (v, p) in points[..nv].iter_mut().enumerate() {
            let mut boundary = Accum::new();
            let mut interior = Accum::new();
            for &f in &adj.adjacent_faces[v] {
                let tri = &self.indices[f * 3..f * 3 + 3];
                let Some(c) = tri.iter().position(|&t| t == v) else {
                    continue;
                };
                for e in [(c + 1) % 3, (c + 2) % 3] {
                    let n = edge_verts[f * 3 + e] - nv;
                    let q = edge_accum[n].mean();
                    if adj.across_edge[f * 3 + e].is_none() {
                        boundary.add(q.pos, q.normal);
                    } else {
                        interior.add(q.pos, q.normal);
                    }
                }
            }
            let (target, alpha) = if boundary.count > 0 {
                (boundary.mean(), 0.5)
            } else if interior.count > 0 {
                (interior.mean(), interior_alpha(interior.count))
            } else {
                continue;
            };
            p.pos = p.pos * (1.0 - alpha) + target.pos * alpha;
            p.normal = p.normal * (1.0 - alpha) + target.normal * alpha;
        }

        // Split faces: the center triangle replaces the original, and the
        // three corner triangles go at the end
        let mut indices = self.indices.clone();
        indices.reserve(nf * 9);
        for f in 0..nf {
            let [v0, v1, v2] = [0, 1, 2].map(|i| self.indices[f * 3 + i]);
            let [n0, n1, n2] = [0, 1, 2].map(|i| edge_verts[f * 3 + i]);
            indices.extend([v0, n2, n1, v1, n0, n2, v2, n1, n0]);
            indices[f * 3..f * 3 + 3].copy_from_slice(&[n0, n1, n2]);
        }

        self.points = points;
        self.indices = indices;
        match mode {
            NormalMode::Accumulate => (),
            NormalMode::Recalculate => self.recalculate_normals(),
        }
        self.normalize_normals();

        log::debug!(
            "subdivided {nf} -> {} triangles, {nv} -> {} vertices",
            self.triangle_count(),
            self.vertex_count()
        );
    }

    /// Replaces vertex normals with the area-weighted sum of face normals
    fn recalculate_normals(&mut self) {
        for p in self.points.iter_mut() {
            p.normal = Vector3::zeros();
        }
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| self.points[i].pos);
            let n = (b - a).cross(&(c - a));
            for &i in tri {
                self.points[i].normal += n;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::adjacency::test::{octahedron, vert};
    use approx::assert_relative_eq;

    #[test]
    fn octahedron_counts() {
        let (points, indices) = octahedron();
        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.subdivide(NormalMode::Accumulate);
        // V + E, 4F
        assert_eq!(iso.vertex_count(), 6 + 12);
        assert_eq!(iso.triangle_count(), 32);
        assert!(iso.indices().iter().all(|&i| i < 18));

        iso.subdivide(NormalMode::Accumulate);
        assert_eq!(iso.vertex_count(), 18 + 48);
        assert_eq!(iso.triangle_count(), 128);
    }

    #[test]
    fn octahedron_positions() {
        let (points, indices) = octahedron();
        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.subdivide(NormalMode::Accumulate);

        // Valence-4 vertex: 8 interior samples averaging to x = 0.375
        let p = iso.vertices()[0].pos;
        assert_relative_eq!(p, Vector3::new(0.4625, 0.0, 0.0), epsilon = 1e-6);

        // Edge (0, 2) is interior; its opposite vertices are 4 and 5
        let edge = iso
            .vertices()
            .iter()
            .skip(6)
            .find(|v| v.pos.x > 0.0 && v.pos.y > 0.0)
            .unwrap();
        assert_relative_eq!(
            edge.pos,
            Vector3::new(0.375, 0.375, 0.0),
            epsilon = 1e-6
        );

        // Normals were all +Z and stay that way
        for v in iso.vertices() {
            assert_relative_eq!(v.normal, Vector3::z(), epsilon = 1e-6);
        }
    }

    #[test]
    fn recalculated_normals_point_outwards() {
        let (points, indices) = octahedron();
        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.subdivide(NormalMode::Recalculate);
        for v in iso.vertices() {
            assert_relative_eq!(v.normal.norm(), 1.0, epsilon = 1e-5);
            assert!(v.normal.dot(&v.pos) > 0.0);
        }
        assert_relative_eq!(
            iso.vertices()[4].normal,
            Vector3::z(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn single_triangle() {
        let points =
            vec![vert(0.0, 0.0, 0.0), vert(1.0, 0.0, 0.0), vert(0.0, 1.0, 0.0)];
        let mut iso = IsoSurface::from_mesh(points, vec![0, 1, 2]);
        iso.subdivide(NormalMode::Accumulate);
        assert_eq!(iso.vertex_count(), 6);
        assert_eq!(
            iso.indices(),
            &[3, 4, 5, 0, 5, 4, 1, 3, 5, 2, 4, 3]
        );

        // Boundary edges get midpoints
        let v = iso.vertices();
        assert_relative_eq!(v[3].pos, Vector3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(v[4].pos, Vector3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(v[5].pos, Vector3::new(0.5, 0.0, 0.0));

        // Corners move halfway towards the average of their edge vertices
        assert_relative_eq!(v[0].pos, Vector3::new(0.125, 0.125, 0.0));
        assert_relative_eq!(v[1].pos, Vector3::new(0.75, 0.125, 0.0));
    }

    #[test]
    fn empty_mesh() {
        let mut iso = IsoSurface::from_mesh(vec![], vec![]);
        iso.subdivide(NormalMode::Recalculate);
        assert_eq!(iso.vertex_count(), 0);
        assert_eq!(iso.triangle_count(), 0);
    }
}
