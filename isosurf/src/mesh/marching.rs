//! Marching Cubes triangulation
use super::{
    tables::{EDGE_TABLE, TRI_TABLE},
    types::{Corner, CubeIndex, Edge},
    IsoSurface, IsoVertex,
};
use crate::{grid::NO_VERTEX, Error, Grid};
use nalgebra::Vector3;

/// Returns the fraction of the way from `v1` to `v2` at which `iso` is crossed
///
/// Equal endpoint values (and any other non-finite result) give the midpoint.
pub(crate) fn crossing(v1: f32, v2: f32, iso: f32) -> f32 {
    if v1 == v2 {
        return 0.5;
    }
    let mu = (iso - v1) / (v2 - v1);
    if mu.is_finite() {
        mu
    } else {
        0.5
    }
}

/// Sample positions for one triangulation pass
#[derive(Copy, Clone)]
struct Lattice {
    start: Vector3<f32>,
    spacing: Vector3<f32>,
}

impl Lattice {
    fn pos(&self, [i, j, k]: [usize; 3]) -> Vector3<f32> {
        self.start
            + self
                .spacing
                .component_mul(&Vector3::new(i as f32, j as f32, k as f32))
    }
}

fn offset(cell: [usize; 3], c: Corner) -> [usize; 3] {
    let o = c.offset();
    [cell[0] + o[0], cell[1] + o[1], cell[2] + o[2]]
}

/// Builds the vertex where the surface crosses edge `e` of the given cell
fn edge_vertex(
    grid: &Grid,
    lattice: Lattice,
    cell: [usize; 3],
    e: Edge,
    values: &[f32; 8],
    iso: f32,
) -> IsoVertex {
    let (a, b) = e.corners();
    let mu = crossing(values[a.index()], values[b.index()], iso);

    let (ia, ib) = (offset(cell, a), offset(cell, b));
    let (pa, pb) = (lattice.pos(ia), lattice.pos(ib));
    let na = grid.normal(ia[0], ia[1], ia[2]);
    let nb = grid.normal(ib[0], ib[1], ib[2]);
    IsoVertex {
        pos: pa + (pb - pa) * mu,
        normal: na * (1.0 - mu) + nb * mu,
    }
}

impl IsoSurface {
    /// Rebuilds the mesh from the current scalar field
    ///
    /// Any previous mesh is discarded.  After Marching Cubes, the configured
    /// post-processing runs in this order: surface smoothing, subdivision
    /// (repeated [`Settings::loop_subdivs`](crate::Settings::loop_subdivs)
    /// times), and normal smoothing.
    ///
    /// Returns [`Error::NotInitialized`] if no field has been allocated.
    pub fn triangulate(&mut self) -> Result<(), Error> {
        let lattice = Lattice {
            start: self.start,
            spacing: self.spacing(),
        };
        let iso = self.settings.iso_value;
        let Some(grid) = self.grid.as_mut() else {
            log::error!("cannot triangulate isosurface: no scalar field");
            return Err(Error::NotInitialized);
        };

        self.points.clear();
        self.indices.clear();
        grid.reset_edges();

        // The last layer of cells is never visited
        let [nx, ny, nz] = grid.size();
        let mut active = 0;
        for k in 0..nz - 2 {
            for j in 0..ny - 2 {
                for i in 0..nx - 2 {
                    let cell = [i, j, k];
                    let mut values = [0.0; 8];
                    for c in Corner::iter() {
                        let [ci, cj, ck] = offset(cell, c);
                        values[c.index()] = grid.get(ci, cj, ck);
                    }

                    let mask = CubeIndex::new(&values, iso);
                    let edges = EDGE_TABLE[mask.index()];
                    if edges == 0 {
                        continue;
                    }
                    active += 1;

                    let mut verts = [NO_VERTEX; 12];
                    let crossed = |e: &Edge| edges & (1 << e.index()) != 0;
                    for e in Edge::iter().filter(crossed) {
                        let [oi, oj, ok] = e.origin();
                        let slot = grid.index(i + oi, j + oj, k + ok);
                        verts[e.index()] = match grid.edge(e.axis(), slot) {
                            Some(v) => v,
                            None => {
                                let v = self.points.len();
                                self.points.push(edge_vertex(
                                    grid, lattice, cell, e, &values, iso,
                                ));
                                grid.set_edge(e.axis(), slot, v);
                                v
                            }
                        };
                    }

                    for tri in TRI_TABLE[mask.index()]
                        .chunks_exact(3)
                        .take_while(|t| t[0] >= 0)
                    {
                        self.indices.extend(tri.iter().map(|&e| {
                            debug_assert_ne!(verts[e as usize], NO_VERTEX);
                            verts[e as usize]
                        }));
                    }
                }
            }
        }
        self.normalize_normals();
        log::debug!(
            "marching cubes: {active} active cells, {} vertices, {} triangles",
            self.vertex_count(),
            self.triangle_count()
        );

        let settings = self.settings;
        if settings.smooth_surface > 0.0 {
            self.smooth_surface(settings.smooth_surface);
        }
        for _ in 0..settings.loop_subdivs {
            self.subdivide(settings.normal_mode);
        }
        if settings.smooth_normals > 0.0 {
            self.smooth_normals(settings.smooth_normals);
        }
        Ok(())
    }
}
