//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `isosurf`
#[derive(Error, Debug)]
pub enum Error {
    /// The surface has no scalar field yet
    #[error("isosurface is not initialized; call `initialize` first")]
    NotInitialized,

    /// Output vertex and normal containers have different lengths
    #[error(
        "vertex and normal output sizes do not match ({vertices} != {normals})"
    )]
    MismatchedOutput {
        /// Length of the vertex container on entry
        vertices: usize,
        /// Length of the normal container on entry
        normals: usize,
    },

    /// Every grid axis needs at least two samples
    #[error("bad grid size {0} x {1} x {2}; each axis must be at least 2")]
    BadGridSize(usize, usize, usize),

    /// Bounding box is empty or inverted on some axis
    #[error("bad bounding box; start must be below end on every axis")]
    BadBounds,

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
