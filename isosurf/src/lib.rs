//! `isosurf` turns a dense scalar field into a smooth triangle mesh.
//!
//! The field is typically a fluid fill fraction from a grid-based simulation:
//! cells below the **iso value** are inside the fluid, and the surface is
//! placed where the field crosses that value.
//!
//! # Pipeline
//! Each call to [`IsoSurface::triangulate`] rebuilds the mesh from scratch:
//!
//! - **Marching Cubes** walks every cell of the [`Grid`], looks up its
//!   corner configuration in the classic edge / triangle tables, and places a
//!   vertex on each crossed edge by linear interpolation.  Vertices on shared
//!   edges are deduplicated, so the output is a connected mesh.  Normals come
//!   from the field gradient.
//! - **Surface smoothing** ([`Settings::smooth_surface`]) diffuses vertex
//!   positions over the surface with a Gaussian kernel, weighting neighbors by
//!   area and normal agreement so creases survive.
//! - **Subdivision** ([`Settings::loop_subdivs`]) runs Loop-style passes,
//!   each quadrupling the triangle count.
//! - **Normal smoothing** ([`Settings::smooth_normals`]) diffuses normals
//!   only.
//!
//! # Example
//! ```
//! use isosurf::{IsoSurface, Mesh, ObjectProperties, Settings};
//! use nalgebra::Vector3;
//!
//! let settings = Settings {
//!     loop_subdivs: 1,
//!     ..Settings::default()
//! };
//! let mut iso = IsoSurface::new(settings);
//! iso.initialize(16, 16, 16, Vector3::new(2.0, 2.0, 2.0))?;
//!
//! // A sphere of radius 0.5 around the origin
//! let (start, spacing) = (iso.start(), iso.spacing());
//! let grid = iso.grid_mut().unwrap();
//! for k in 0..16 {
//!     for j in 0..16 {
//!         for i in 0..16 {
//!             let p = start
//!                 + Vector3::new(i as f32, j as f32, k as f32)
//!                     .component_mul(&spacing);
//!             *grid.get_mut(i, j, k) = p.norm();
//!         }
//!     }
//! }
//!
//! let mut mesh = Mesh::new();
//! iso.append_to(&mut mesh, &ObjectProperties::default())?;
//! assert_eq!(mesh.vertices.len(), mesh.normals.len());
//! assert!(!mesh.triangles.is_empty());
//! # Ok::<(), isosurf::Error>(())
//! ```
pub mod error;
pub mod grid;
pub mod mesh;
pub mod settings;

pub use error::Error;
pub use grid::Grid;
pub use mesh::{
    IsoSurface, IsoVertex, MaterialProperties, Mesh, ObjectProperties,
    Triangle, TriangleFlags,
};
pub use settings::{NormalMode, Settings};
