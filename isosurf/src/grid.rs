//! Dense scalar field storage and per-edge vertex caches
use crate::{mesh::types::Axis, Error};
use nalgebra::Vector3;

/// Marker for an edge whose crossing vertex has not been built yet
pub(crate) const NO_VERTEX: usize = usize::MAX;

/// Dense 3D scalar field, plus the edge caches used while meshing it
///
/// Samples are stored in a single flat array, with `x` varying fastest; see
/// [`Grid::index`].  The three edge caches have the same shape as the field:
/// the entry at a sample's index holds the output vertex placed on the edge
/// leaving that sample in the +X, +Y, or +Z direction.
#[derive(Clone, Debug)]
pub struct Grid {
    size: [usize; 3],
    data: Vec<f32>,
    edges: [Vec<usize>; 3],
}

impl Grid {
    /// Allocates a zero-filled grid with every edge cache cleared
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self, Error> {
        if nx < 2 || ny < 2 || nz < 2 {
            return Err(Error::BadGridSize(nx, ny, nz));
        }
        let n = nx * ny * nz;
        log::trace!("allocating {nx} x {ny} x {nz} grid ({n} samples)");
        Ok(Self {
            size: [nx, ny, nz],
            data: vec![0.0; n],
            edges: [vec![NO_VERTEX; n], vec![NO_VERTEX; n], vec![NO_VERTEX; n]],
        })
    }

    /// Returns the number of samples along each axis
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Returns the total number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether the grid has no samples (never true once built)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts a sample position into an offset in the flat array
    ///
    /// ```
    /// # use isosurf::Grid;
    /// let g = Grid::new(4, 3, 2)?;
    /// assert_eq!(g.index(1, 2, 1), (1 * 3 + 2) * 4 + 1);
    /// # Ok::<(), isosurf::Error>(())
    /// ```
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.size[0]);
        debug_assert!(j < self.size[1]);
        debug_assert!(k < self.size[2]);
        (k * self.size[1] + j) * self.size[0] + i
    }

    /// Reads the sample at the given position
    ///
    /// # Panics
    /// If the position is outside of the grid
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[self.index(i, j, k)]
    }

    /// Returns a mutable reference to the sample at the given position
    ///
    /// # Panics
    /// If the position is outside of the grid
    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> &mut f32 {
        let index = self.index(i, j, k);
        &mut self.data[index]
    }

    /// Returns the flat sample array
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the flat sample array, for bulk writes by a field producer
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sets every sample to the given value
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Estimates the (unnormalized) surface normal at a sample
    ///
    /// This is the negated central difference along each axis, so it points
    /// towards lower field values.  Neighbors past the grid border are clamped
    /// to the border sample, which turns the stencil one-sided there.
    pub fn normal(&self, i: usize, j: usize, k: usize) -> Vector3<f32> {
        let [nx, ny, nz] = self.size;
        let lo = |v: usize| v.saturating_sub(1);
        let hi = |v: usize, n: usize| (v + 1).min(n - 1);
        Vector3::new(
            self.get(lo(i), j, k) - self.get(hi(i, nx), j, k),
            self.get(i, lo(j), k) - self.get(i, hi(j, ny), k),
            self.get(i, j, lo(k)) - self.get(i, j, hi(k, nz)),
        )
    }

    /// Marks every edge as having no vertex
    pub(crate) fn reset_edges(&mut self) {
        for e in self.edges.iter_mut() {
            e.fill(NO_VERTEX);
        }
    }

    /// Looks up the cached vertex on the edge leaving `index` along `axis`
    #[inline]
    pub(crate) fn edge(&self, axis: Axis, index: usize) -> Option<usize> {
        match self.edges[axis.index()][index] {
            NO_VERTEX => None,
            v => Some(v),
        }
    }

    /// Records the vertex built on the edge leaving `index` along `axis`
    #[inline]
    pub(crate) fn set_edge(&mut self, axis: Axis, index: usize, vert: usize) {
        self.edges[axis.index()][index] = vert;
    }
}
