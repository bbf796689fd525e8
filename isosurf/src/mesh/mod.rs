//! Isosurface extraction and mesh refinement
//!
//! The entry point is [`IsoSurface`], which owns a dense scalar field and
//! turns it into a shared-vertex triangle mesh:
//!
//! 1. [`IsoSurface::initialize`] allocates the field
//! 2. A field producer writes samples through [`IsoSurface::grid_mut`]
//! 3. [`IsoSurface::triangulate`] (or [`IsoSurface::get_triangles`], which
//!    calls it) runs Marching Cubes, then the configured smoothing and
//!    subdivision passes
//!
//! Each triangulation starts from scratch; nothing is carried over between
//! frames except the field itself.
use crate::{Error, Grid, NormalMode, Settings};
use nalgebra::Vector3;

mod adjacency;
mod marching;
mod output;
mod smooth;
mod subdivide;

pub mod tables;
pub mod types;

pub use output::{
    MaterialProperties, Mesh, ObjectProperties, Triangle, TriangleFlags,
};

/// A single mesh vertex
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoVertex {
    /// Vertex position
    pub pos: Vector3<f32>,
    /// Vertex normal (unit length once triangulation finishes)
    pub normal: Vector3<f32>,
}

/// Marching Cubes surface over a dense scalar field
///
/// ```
/// use isosurf::{IsoSurface, Settings};
/// use nalgebra::Vector3;
///
/// let mut iso = IsoSurface::new(Settings::default());
/// iso.initialize(8, 8, 8, Vector3::new(1.0, 1.0, 1.0))?;
/// for k in 0..8 {
///     for j in 0..8 {
///         for i in 0..8 {
///             // Inside is below the iso value (0.5 by default)
///             let inside = (2..5).contains(&i)
///                 && (2..5).contains(&j)
///                 && (2..5).contains(&k);
///             *iso.grid_mut().unwrap().get_mut(i, j, k) =
///                 if inside { 0.0 } else { 1.0 };
///         }
///     }
/// }
/// iso.triangulate()?;
/// assert!(iso.triangle_count() > 0);
/// # Ok::<(), isosurf::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct IsoSurface {
    settings: Settings,

    /// Scalar field and edge caches, allocated by `initialize`
    grid: Option<Grid>,

    /// Lower corner of the meshed region
    start: Vector3<f32>,
    /// Upper corner of the meshed region
    end: Vector3<f32>,
    /// Domain size passed to `initialize`
    extent: Vector3<f32>,

    material_name: String,

    /// Output vertices, in creation order
    points: Vec<IsoVertex>,
    /// Output triangles, as a flat list of vertex triples
    indices: Vec<usize>,
}

impl IsoSurface {
    /// Builds a new, uninitialized surface
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            grid: None,
            start: Vector3::zeros(),
            end: Vector3::zeros(),
            extent: Vector3::zeros(),
            material_name: "default".to_owned(),
            points: vec![],
            indices: vec![],
        }
    }

    /// Allocates the scalar field
    ///
    /// A grid with a single Z slice (a 2D simulation) is promoted to 5 slices,
    /// giving Marching Cubes a thin slab to work with.
    ///
    /// If no bounding box was set with [`IsoSurface::set_start`] and
    /// [`IsoSurface::set_end`] (i.e. `start >= end` on every axis), a box of
    /// size `extent` centered on the origin is used.  A box that is
    /// degenerate on only some axes is rejected.
    ///
    /// Calling this again discards the previous field and mesh.
    pub fn initialize(
        &mut self,
        nx: usize,
        ny: usize,
        nz: usize,
        extent: Vector3<f32>,
    ) -> Result<(), Error> {
        let nz = if nz == 1 { 5 } else { nz };
        let grid = Grid::new(nx, ny, nz)?;

        let unset = (0..3).all(|i| self.start[i] >= self.end[i]);
        let (start, end) = if unset {
            (-extent * 0.5, extent * 0.5)
        } else {
            (self.start, self.end)
        };
        if !(0..3).all(|i| start[i] < end[i]) {
            log::error!(
                "cannot initialize isosurface with bounds {start:?} - {end:?}"
            );
            return Err(Error::BadBounds);
        }

        self.start = start;
        self.end = end;
        self.extent = extent;
        self.grid = Some(grid);
        self.points.clear();
        self.indices.clear();
        Ok(())
    }

    /// Checks whether [`IsoSurface::initialize`] has succeeded
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Returns the scalar field, if allocated
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Returns the scalar field for writing, if allocated
    pub fn grid_mut(&mut self) -> Option<&mut Grid> {
        self.grid.as_mut()
    }

    /// Returns the distance between neighboring samples on each axis
    ///
    /// This is zero before initialization.
    pub fn spacing(&self) -> Vector3<f32> {
        match &self.grid {
            Some(g) => {
                let size = g.size();
                Vector3::from_fn(|i, _| {
                    (self.end[i] - self.start[i]) / (size[i] - 1) as f32
                })
            }
            None => Vector3::zeros(),
        }
    }

    /// Returns the current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces all settings at once
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Returns the iso value
    pub fn iso_value(&self) -> f32 {
        self.settings.iso_value
    }

    /// Sets the iso value
    pub fn set_iso_value(&mut self, v: f32) {
        self.settings.iso_value = v;
    }

    /// Returns the blend value
    pub fn blend_value(&self) -> f32 {
        self.settings.blend_value
    }

    /// Sets the number of subdivision passes
    pub fn set_loop_subdivs(&mut self, n: usize) {
        self.settings.loop_subdivs = n;
    }

    /// Sets the surface smoothing width (0 disables surface smoothing)
    pub fn set_smooth_surface(&mut self, sigma: f32) {
        self.settings.smooth_surface = sigma;
    }

    /// Sets the normal smoothing width (0 disables normal smoothing)
    pub fn set_smooth_normals(&mut self, sigma: f32) {
        self.settings.smooth_normals = sigma;
    }

    /// Selects how normals are produced during subdivision
    pub fn set_normal_mode(&mut self, mode: NormalMode) {
        self.settings.normal_mode = mode;
    }

    /// Returns the lower corner of the meshed region
    pub fn start(&self) -> Vector3<f32> {
        self.start
    }

    /// Sets the lower corner of the meshed region
    ///
    /// This should be called before [`IsoSurface::initialize`], which checks
    /// the box and falls back to the domain extent if it is unset.
    pub fn set_start(&mut self, start: Vector3<f32>) {
        self.start = start;
    }

    /// Returns the upper corner of the meshed region
    pub fn end(&self) -> Vector3<f32> {
        self.end
    }

    /// Sets the upper corner of the meshed region
    ///
    /// See [`IsoSurface::set_start`] for ordering requirements.
    pub fn set_end(&mut self, end: Vector3<f32>) {
        self.end = end;
    }

    /// Returns the domain extent passed to [`IsoSurface::initialize`]
    pub fn domain_extent(&self) -> Vector3<f32> {
        self.extent
    }

    /// Returns the material name
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    /// Sets the material name
    pub fn set_material_name(&mut self, name: impl Into<String>) {
        self.material_name = name.into();
    }

    /// Returns the vertices built by the last triangulation
    pub fn vertices(&self) -> &[IsoVertex] {
        &self.points
    }

    /// Returns the triangles built by the last triangulation, as a flat list
    /// of vertex index triples
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the number of vertices from the last triangulation
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of triangles from the last triangulation
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Normalizes every vertex normal, leaving zero-length normals untouched
    fn normalize_normals(&mut self) {
        for p in self.points.iter_mut() {
            if let Some(n) = p.normal.try_normalize(0.0) {
                p.normal = n;
            }
        }
    }

    /// Builds a surface directly from a mesh, skipping triangulation
    #[cfg(test)]
    pub(crate) fn from_mesh(
        points: Vec<IsoVertex>,
        indices: Vec<usize>,
    ) -> Self {
        let mut out = Self::new(Settings::default());
        out.points = points;
        out.indices = indices;
        out
    }
}
