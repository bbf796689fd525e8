//! Mesh output: triangle records for a renderer, plus binary STL
use super::IsoSurface;
use crate::Error;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};

/// Per-triangle flag bits
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TriangleFlags(u32);

impl TriangleFlags {
    /// The triangle is visible geometry
    pub const GEOMETRY: Self = Self(1 << 0);
    /// The triangle casts shadows
    pub const CAST_SHADOWS: Self = Self(1 << 1);
    /// The triangle's material produces caustics
    pub const MAKE_CAUSTICS: Self = Self(1 << 2);
    /// The triangle's material does not produce caustics
    pub const NO_CAUSTICS: Self = Self(1 << 3);

    /// First bit used to tag a geometry-initialization id
    pub const GEO_INIT_SHIFT: u32 = 4;

    /// Builds flags from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
    /// Returns the raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }
    /// Checks whether every bit in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TriangleFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TriangleFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Optical properties that decide whether a surface makes caustics
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub mirror: f32,
    pub transparency: f32,
    pub fresnel: f32,
}

impl MaterialProperties {
    /// Checks whether light can reflect or refract off this material
    pub fn makes_caustics(&self) -> bool {
        self.mirror > 0.0 || self.transparency > 0.0 || self.fresnel > 0.0
    }
}

/// Scene-level properties stamped onto every output triangle
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperties {
    pub visible: bool,
    pub cast_shadows: bool,
    pub material: MaterialProperties,

    /// Geometry-initialization id for a downstream solver (0 for none)
    pub geo_init_id: i32,
    /// Extra bits OR'd in when `geo_init_id` is set
    pub geo_init_type: u32,

    pub object_id: i32,
}

impl Default for ObjectProperties {
    fn default() -> Self {
        Self {
            visible: true,
            cast_shadows: true,
            material: MaterialProperties::default(),
            geo_init_id: 0,
            geo_init_type: 0,
            object_id: 0,
        }
    }
}

impl ObjectProperties {
    /// Builds the flag word shared by every triangle of this object
    pub fn flags(&self) -> TriangleFlags {
        let mut flags = TriangleFlags::default();
        if self.visible {
            flags |= TriangleFlags::GEOMETRY;
        }
        if self.cast_shadows {
            flags |= TriangleFlags::CAST_SHADOWS;
        }
        flags |= if self.material.makes_caustics() {
            TriangleFlags::MAKE_CAUSTICS
        } else {
            TriangleFlags::NO_CAUSTICS
        };
        if self.geo_init_id > 0 {
            let shift = self.geo_init_id as u32 + TriangleFlags::GEO_INIT_SHIFT;
            match 1u32.checked_shl(shift) {
                Some(bit) => flags |= TriangleFlags(bit),
                None => log::warn!(
                    "geo-init id {} does not fit in triangle flags",
                    self.geo_init_id
                ),
            }
            flags |= TriangleFlags(self.geo_init_type);
        }
        flags
    }
}

/// A single output triangle
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    /// Indices into the shared vertex and normal arrays
    pub points: [usize; 3],
    /// Flat normal (always zero; per-vertex normals are used instead)
    pub normal: Vector3<f32>,
    pub flags: TriangleFlags,
    /// Whether per-vertex normals should be interpolated
    pub smooth_normals: bool,
    pub object_id: i32,
}

/// Owned output containers, for callers that don't bring their own
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub triangles: Vec<Triangle>,
}

impl IsoSurface {
    /// Triangulates the surface and appends the result to caller buffers
    ///
    /// Triangle indices are offset by the initial length of `vertices`, so
    /// several surfaces can share one set of buffers.  The vertex and normal
    /// buffers must have the same length on entry; otherwise this returns
    /// [`Error::MismatchedOutput`] without appending anything.
    ///
    /// An uninitialized surface logs a warning and appends nothing.
    pub fn get_triangles(
        &mut self,
        triangles: &mut Vec<Triangle>,
        vertices: &mut Vec<Vector3<f32>>,
        normals: &mut Vec<Vector3<f32>>,
        object: &ObjectProperties,
    ) -> Result<(), Error> {
        if !self.is_initialized() {
            log::warn!("skipping output of uninitialized isosurface");
            return Ok(());
        }
        if vertices.len() != normals.len() {
            log::error!(
                "output buffers out of sync: {} vertices, {} normals",
                vertices.len(),
                normals.len()
            );
            return Err(Error::MismatchedOutput {
                vertices: vertices.len(),
                normals: normals.len(),
            });
        }
        self.triangulate()?;

        let offset = vertices.len();
        vertices.extend(self.points.iter().map(|p| p.pos));
        normals.extend(self.points.iter().map(|p| p.normal));

        let flags = object.flags();
        triangles.extend(self.indices.chunks_exact(3).map(|t| Triangle {
            points: [t[0] + offset, t[1] + offset, t[2] + offset],
            normal: Vector3::zeros(),
            flags,
            smooth_normals: true,
            object_id: object.object_id,
        }));
        log::debug!(
            "appended {} triangles at vertex offset {offset}",
            self.triangle_count()
        );
        Ok(())
    }

    /// Triangulates the surface and appends it to the given [`Mesh`]
    pub fn append_to(
        &mut self,
        mesh: &mut Mesh,
        object: &ObjectProperties,
    ) -> Result<(), Error> {
        self.get_triangles(
            &mut mesh.triangles,
            &mut mesh.vertices,
            &mut mesh.normals,
            object,
        )
    }
}

impl Mesh {
    /// Builds an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a binary STL to the given output
    pub fn write_stl<F: std::io::Write>(
        &self,
        out: &mut F,
    ) -> Result<(), Error> {
        // Many small writes, usually to a file
        let mut out = BufWriter::new(out);
        const HEADER: &[u8] = b"This is a binary STL file exported by isosurf";
        static_assertions::const_assert!(HEADER.len() <= 80);
        out.write_all(HEADER)?;
        out.write_all(&[0u8; 80 - HEADER.len()])?;
        out.write_all(&(self.triangles.len() as u32).to_le_bytes())?;
        for t in &self.triangles {
            let [a, b, c] = t.points.map(|i| self.vertices[i]);
            let normal = (b - a).cross(&(c - a)).try_normalize(0.0);
            for p in &normal.unwrap_or_else(Vector3::zeros) {
                out.write_all(&p.to_le_bytes())?;
            }
            for p in [a, b, c].iter().flat_map(|v| v.iter()) {
                out.write_all(&p.to_le_bytes())?;
            }
            out.write_all(&[0u8; std::mem::size_of::<u16>()])?; // attributes
        }
        out.flush()?;
        Ok(())
    }
}
