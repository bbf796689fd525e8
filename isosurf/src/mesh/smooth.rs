//! Gaussian diffusion of positions and normals over the mesh surface
//!
//! Fields are averaged over a geodesic neighborhood of each vertex, grown
//! outwards through the mesh connectivity.  Each neighbor is weighted by its
//! area, a Gaussian falloff in distance, and its normal's agreement with the
//! center vertex, so samples across sharp creases barely contribute.
use super::{
    adjacency::{vertex_neighbors, SurfaceAreas},
    IsoSurface, IsoVertex,
};
use nalgebra::Vector3;
use std::collections::VecDeque;

/// Neighbors past this many standard deviations are ignored
const CUTOFF_SIGMAS: f32 = 3.0;

/// Normal smoothing after surface smoothing uses a wider kernel
const NORMAL_SIGMA_SCALE: f32 = 1.5;

/// Connectivity and scratch space for diffusing per-vertex fields
struct Diffusion<'a> {
    points: &'a [IsoVertex],
    neighbors: Vec<Vec<usize>>,
    areas: SurfaceAreas,

    /// Visit stamps, compared against `generation`
    visited: Vec<usize>,
    generation: usize,
    queue: VecDeque<usize>,
}

impl<'a> Diffusion<'a> {
    fn new(points: &'a [IsoVertex], indices: &[usize]) -> Self {
        Self {
            points,
            neighbors: vertex_neighbors(points.len(), indices),
            areas: SurfaceAreas::new(points, indices),
            visited: vec![0; points.len()],
            generation: 0,
            queue: VecDeque::new(),
        }
    }

    /// Returns the weighted average of `field` around vertex `src`
    ///
    /// Returns `None` for vertices that aren't part of any triangle.
    fn vertex_field(
        &mut self,
        field: &[Vector3<f32>],
        src: usize,
        invsigma2: f32,
    ) -> Option<Vector3<f32>> {
        let area = self.areas.point[src];
        if self.neighbors[src].is_empty() || area.is_nan() || area <= 0.0 {
            return None;
        }
        self.generation += 1;
        self.visited[src] = self.generation;

        let center = self.points[src];
        let mut sum = field[src] * area;
        let mut sum_w = area;

        self.queue.clear();
        self.queue.extend(&self.neighbors[src]);
        while let Some(n) = self.queue.pop_front() {
            if self.visited[n] == self.generation {
                continue;
            }
            self.visited[n] = self.generation;

            let nv = center.normal.dot(&self.points[n].normal);
            if nv <= 0.0 {
                continue;
            }
            let d2 =
                invsigma2 * (self.points[n].pos - center.pos).norm_squared();
            if d2 >= CUTOFF_SIGMAS * CUTOFF_SIGMAS {
                continue;
            }
            let w = nv * self.areas.point[n] * (-0.5 * d2).exp();
            sum += field[n] * w;
            sum_w += w;
            self.queue.extend(&self.neighbors[n]);
        }
        Some(sum / sum_w)
    }
}

impl IsoSurface {
    /// Smooths vertex positions with a Gaussian of width `sigma`
    ///
    /// This applies a diffusion step followed by an inverse step, which
    /// removes noise without shrinking the surface much.  Normals are then
    /// smoothed with a kernel 1.5× wider.  Non-positive widths do nothing.
    pub fn smooth_surface(&mut self, sigma: f32) {
        if sigma.is_nan() || sigma <= 0.0 || self.indices.is_empty() {
            return;
        }
        let invsigma2 = 1.0 / (sigma * sigma);
        let pos: Vec<Vector3<f32>> =
            self.points.iter().map(|p| p.pos).collect();

        let mut d = Diffusion::new(&self.points, &self.indices);
        let mut dflt: Vec<Vector3<f32>> = (0..pos.len())
            .map(|i| {
                d.vertex_field(&pos, i, invsigma2)
                    .map_or_else(Vector3::zeros, |p| p - pos[i])
            })
            .collect();

        // Pull each vertex towards the centroids of its triangles
        for (f, tri) in self.indices.chunks_exact(3).enumerate() {
            let centroid = (pos[tri[0]] + pos[tri[1]] + pos[tri[2]]) / 3.0;
            for (j, &v) in tri.iter().enumerate() {
                let delta = (centroid - pos[v]) * 0.5;
                let w = d.areas.corner[f][j] / d.areas.point[v]
                    * (-0.5 * invsigma2 * delta.norm_squared()).exp();
                dflt[v] += delta * w;
            }
        }

        let dflt2: Vec<Vector3<f32>> = (0..pos.len())
            .map(|i| {
                d.vertex_field(&dflt, i, invsigma2)
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect();

        for (i, p) in self.points.iter_mut().enumerate() {
            p.pos += dflt[i] - dflt2[i];
        }
        log::debug!(
            "smoothed {} vertex positions (sigma = {sigma})",
            pos.len()
        );

        let ns = NORMAL_SIGMA_SCALE * sigma;
        self.diffuse_normals(1.0 / (ns * ns));
    }

    /// Smooths vertex normals with a Gaussian of width `sigma`
    ///
    /// Positions are left untouched.  Non-positive widths do nothing.
    pub fn smooth_normals(&mut self, sigma: f32) {
        if sigma.is_nan() || sigma <= 0.0 || self.indices.is_empty() {
            return;
        }
        self.diffuse_normals(1.0 / (sigma * sigma));
        log::debug!(
            "smoothed {} vertex normals (sigma = {sigma})",
            self.vertex_count()
        );
    }

    fn diffuse_normals(&mut self, invsigma2: f32) {
        let normals: Vec<Vector3<f32>> =
            self.points.iter().map(|p| p.normal).collect();
        let mut d = Diffusion::new(&self.points, &self.indices);
        let out: Vec<Option<Vector3<f32>>> = (0..normals.len())
            .map(|i| {
                d.vertex_field(&normals, i, invsigma2)
                    .and_then(|n| n.try_normalize(0.0))
            })
            .collect();
        for (p, n) in self.points.iter_mut().zip(out) {
            if let Some(n) = n {
                p.normal = n;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::adjacency::test::{octahedron, vert};
    use approx::assert_relative_eq;

    /// Flat `n x n` vertex patch in the XY plane, facing +Z
    fn plane(n: usize) -> (Vec<IsoVertex>, Vec<usize>) {
        let mut points = vec![];
        for j in 0..n {
            for i in 0..n {
                points.push(vert(i as f32, j as f32, 0.0));
            }
        }
        let mut indices = vec![];
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let a = j * n + i;
                let (b, c, d) = (a + 1, a + n, a + n + 1);
                indices.extend([a, b, d, a, d, c]);
            }
        }
        (points, indices)
    }

    #[test]
    fn constant_field_is_preserved() {
        let (points, indices) = plane(6);
        let mut d = Diffusion::new(&points, &indices);
        let field = vec![Vector3::new(1.0, -2.0, 3.0); points.len()];
        for i in 0..points.len() {
            let v = d.vertex_field(&field, i, 1.0).unwrap();
            assert_relative_eq!(v, field[0], epsilon = 1e-5);
        }
    }

    #[test]
    fn isolated_vertex_has_no_field() {
        let (mut points, indices) = plane(3);
        points.push(vert(10.0, 10.0, 10.0));
        let mut d = Diffusion::new(&points, &indices);
        let pos: Vec<_> = points.iter().map(|p| p.pos).collect();
        assert!(d.vertex_field(&pos, 9, 1.0).is_none());
        assert!(d.vertex_field(&pos, 4, 1.0).is_some());
    }

    #[test]
    fn opposing_normals_are_ignored() {
        let (mut points, indices) = plane(3);
        points[4].normal = -Vector3::z();
        let mut d = Diffusion::new(&points, &indices);
        let field: Vec<_> = (0..points.len())
            .map(|i| Vector3::new(i as f32, 0.0, 0.0))
            .collect();
        // The center vertex only sees itself
        let v = d.vertex_field(&field, 4, 1.0).unwrap();
        assert_relative_eq!(v.x, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn cutoff_limits_neighborhood() {
        let (points, indices) = plane(5);
        let mut d = Diffusion::new(&points, &indices);
        let field: Vec<_> = (0..points.len())
            .map(|i| Vector3::new(i as f32, 0.0, 0.0))
            .collect();
        // A tiny kernel excludes every neighbor at unit distance
        let v = d.vertex_field(&field, 12, 100.0).unwrap();
        assert_relative_eq!(v.x, 12.0, epsilon = 1e-6);
    }

    #[test]
    fn plane_stays_flat() {
        let (points, indices) = plane(9);
        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.smooth_surface(1.0);
        for v in iso.vertices() {
            assert!(v.pos.iter().all(|c| c.is_finite()));
            assert_relative_eq!(v.pos.z, 0.0, epsilon = 1e-6);
            assert_relative_eq!(v.normal, Vector3::z(), epsilon = 1e-5);
        }
        // The patch is symmetric about its center vertex, which stays put
        assert_relative_eq!(
            iso.vertices()[40].pos,
            Vector3::new(4.0, 4.0, 0.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn noisy_normals_get_smoother() {
        let (mut points, indices) = plane(8);
        let deviation = |points: &[IsoVertex]| -> f32 {
            points.iter().map(|p| 1.0 - p.normal.z).sum()
        };
        for (i, p) in points.iter_mut().enumerate() {
            let t = if i % 2 == 0 { 0.3 } else { -0.3 };
            p.normal = Vector3::new(t, -t * 0.5, 1.0).normalize();
        }
        let before = deviation(&points);

        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.smooth_normals(2.0);
        let after = deviation(iso.vertices());
        assert!(after < before, "{after} >= {before}");
        for v in iso.vertices() {
            assert_relative_eq!(v.normal.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(v.pos.z, 0.0);
        }
    }

    #[test]
    fn smoothing_keeps_closed_mesh_sane() {
        let (points, indices) = octahedron();
        let mut iso = IsoSurface::from_mesh(points, indices);
        iso.subdivide(crate::NormalMode::Recalculate);
        let before: Vec<_> = iso.vertices().to_vec();
        iso.smooth_surface(0.5);
        for (a, b) in iso.vertices().iter().zip(&before) {
            assert!((a.pos - b.pos).norm() < 0.5);
            assert_relative_eq!(a.normal.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn zero_width_does_nothing() {
        let (points, indices) = octahedron();
        let mut iso = IsoSurface::from_mesh(points.clone(), indices);
        iso.smooth_surface(0.0);
        iso.smooth_normals(-1.0);
        assert_eq!(iso.vertices(), points.as_slice());
    }
}
