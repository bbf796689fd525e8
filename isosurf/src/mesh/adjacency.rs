//! Connectivity and area weights for triangle meshes
//!
//! Everything here is rebuilt from the flat index buffer on demand and holds
//! plain indices into the vertex and triangle arrays.
use super::IsoVertex;

/// Corner areas below this (or non-finite ones) are clamped to it
pub(crate) const MIN_CORNER_AREA: f32 = 1e-6;

/// Face-based connectivity, used by subdivision
pub(crate) struct FaceAdjacency {
    /// Triangles touching each vertex
    pub adjacent_faces: Vec<Vec<usize>>,

    /// Triangle across each edge, indexed as `3 * face + e`
    ///
    /// Edge `e` of a triangle is the one opposite its `e`'th corner.  `None`
    /// marks a boundary (or an edge that can't be paired consistently).
    pub across_edge: Vec<Option<usize>>,
}

impl FaceAdjacency {
    pub fn new(vertex_count: usize, indices: &[usize]) -> Self {
        let mut adjacent_faces = vec![vec![]; vertex_count];
        for (f, tri) in indices.chunks_exact(3).enumerate() {
            for &v in tri {
                adjacent_faces[v].push(f);
            }
        }

        let mut across_edge = vec![None; indices.len()];
        for f in 0..indices.len() / 3 {
            for e in 0..3 {
                if across_edge[f * 3 + e].is_some() {
                    continue;
                }
                let v1 = indices[f * 3 + (e + 1) % 3];
                let v2 = indices[f * 3 + (e + 2) % 3];

                // The matching triangle runs the same edge as v2 -> v1
                for &other in &adjacent_faces[v1] {
                    if other == f || !adjacent_faces[v2].contains(&other) {
                        continue;
                    }
                    let tri = &indices[other * 3..other * 3 + 3];
                    let Some(p) = tri.iter().position(|&v| v == v1) else {
                        continue;
                    };
                    let opposite = (p + 1) % 3;
                    if tri[(opposite + 1) % 3] != v2 {
                        continue;
                    }
                    across_edge[f * 3 + e] = Some(other);
                    across_edge[other * 3 + opposite] = Some(f);
                    break;
                }
            }
        }

        Self {
            adjacent_faces,
            across_edge,
        }
    }
}

/// Returns the deduplicated set of vertices sharing a triangle with each vertex
pub(crate) fn vertex_neighbors(
    vertex_count: usize,
    indices: &[usize],
) -> Vec<Vec<usize>> {
    let mut out: Vec<Vec<usize>> = vec![vec![]; vertex_count];
    for tri in indices.chunks_exact(3) {
        for j in 0..3 {
            let me = &mut out[tri[j]];
            for n in [tri[(j + 1) % 3], tri[(j + 2) % 3]] {
                if !me.contains(&n) {
                    me.push(n);
                }
            }
        }
    }
    out
}

/// Voronoi-style area weights
///
/// Each triangle's area is split among its three corners (following Meyer et
/// al., with the obtuse-triangle special cases), and each vertex collects the
/// corner areas of its triangles.
pub(crate) struct SurfaceAreas {
    /// Area assigned to each corner of each triangle
    pub corner: Vec<[f32; 3]>,
    /// Total area around each vertex
    pub point: Vec<f32>,
}

impl SurfaceAreas {
    pub fn new(points: &[IsoVertex], indices: &[usize]) -> Self {
        let mut corner = Vec::with_capacity(indices.len() / 3);
        let mut point = vec![0.0; points.len()];
        for tri in indices.chunks_exact(3) {
            let p = |i: usize| points[tri[i]].pos;
            let e = [p(2) - p(1), p(0) - p(2), p(1) - p(0)];

            let area = 0.5 * e[0].cross(&e[1]).norm();
            let l2 = e.map(|e| e.norm_squared());
            let ew = [
                l2[0] * (l2[1] + l2[2] - l2[0]),
                l2[1] * (l2[2] + l2[0] - l2[1]),
                l2[2] * (l2[0] + l2[1] - l2[2]),
            ];

            let mut c = [0.0f32; 3];
            if ew[0] <= 0.0 {
                c[1] = -0.25 * l2[2] * area / e[0].dot(&e[2]);
                c[2] = -0.25 * l2[1] * area / e[0].dot(&e[1]);
                c[0] = area - c[1] - c[2];
            } else if ew[1] <= 0.0 {
                c[2] = -0.25 * l2[0] * area / e[1].dot(&e[0]);
                c[0] = -0.25 * l2[2] * area / e[1].dot(&e[2]);
                c[1] = area - c[2] - c[0];
            } else if ew[2] <= 0.0 {
                c[0] = -0.25 * l2[1] * area / e[2].dot(&e[1]);
                c[1] = -0.25 * l2[0] * area / e[2].dot(&e[0]);
                c[2] = area - c[0] - c[1];
            } else {
                let scale = 0.5 * area / (ew[0] + ew[1] + ew[2]);
                for j in 0..3 {
                    c[j] = scale * (ew[(j + 1) % 3] + ew[(j + 2) % 3]);
                }
            }

            for (j, a) in c.iter_mut().enumerate() {
                if !a.is_finite() || *a < MIN_CORNER_AREA {
                    *a = MIN_CORNER_AREA;
                }
                point[tri[j]] += *a;
            }
            corner.push(c);
        }
        Self { corner, point }
    }
}
