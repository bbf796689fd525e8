//! Strongly-typed indexes for Marching Cubes cells
//!
//! Corners and edges use the classic Marching Cubes numbering, which is what
//! the lookup tables in [`tables`](super::tables) are keyed on:
//!
//! ```text
//!         7 -------- 6
//!        /|         /|       Z
//!       / |        / |       ^  _ Y
//!      4----------5  |       | /
//!      |  |       |  |       |/
//!      |  3-------|--2       ---> X
//!      | /        | /
//!      |/         |/
//!      0----------1
//! ```
//!
//! Edges 0-3 run around the bottom face (`0-1`, `1-2`, `2-3`, `3-0`), edges
//! 4-7 around the top face in the same order, and edges 8-11 are the vertical
//! edges rising from corners 0-3.

/// A single axis, represented as a `u8` with one bit (between 0 and 3) set
///
/// These invariants are enforced at construction
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Axis(u8);

impl Axis {
    /// Builds a new axis
    ///
    /// # Panics
    /// If the input does not have exactly 1 set bit in the 0-2 range
    pub const fn new(i: u8) -> Self {
        assert!(i.count_ones() == 1);
        assert!(i.trailing_zeros() < 3);
        Self(i)
    }

    /// Converts from a bitmask to an index
    pub fn index(self) -> usize {
        self.0.trailing_zeros() as usize
    }
}

/// The X axis, i.e. `[1, 0, 0]`
pub const X: Axis = Axis(1);
/// The Y axis, i.e. `[0, 1, 0]`
pub const Y: Axis = Axis(2);
/// The Z axis, i.e. `[0, 0, 1]`
pub const Z: Axis = Axis(4);

/// Cell corner offsets, in Marching Cubes order
const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corners joined by each edge, as `(start, end)`
const EDGE_CORNERS: [(u8, u8); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Strongly-typed cell corner, in the `[0, 8)` range
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Corner(u8);

impl Corner {
    /// Builds a new corner
    ///
    /// # Panics
    /// If `i >= 8`, which is not a valid corner index
    pub const fn new(i: u8) -> Self {
        assert!(i < 8);
        Self(i)
    }
    /// Returns the value of this corner as an index
    pub fn index(self) -> usize {
        self.0 as usize
    }
    /// Iterates over all 8 corners
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(Corner)
    }
    /// Returns the `[i, j, k]` offset of this corner from the cell origin
    pub fn offset(self) -> [usize; 3] {
        CORNER_OFFSETS[self.0 as usize]
    }
}

/// An edge within a cell, in the `[0, 12)` range
///
/// Edges are directed from `start` to `end`; interpolation along an edge runs
/// in that direction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Edge(u8);

impl Edge {
    /// Builds a new edge
    ///
    /// # Panics
    /// If `i >= 12`, since that's an invalid edge
    pub const fn new(i: u8) -> Self {
        assert!(i < 12);
        Self(i)
    }
    /// Converts from an edge to an index
    pub fn index(self) -> usize {
        self.0 as usize
    }
    /// Iterates over all 12 edges
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..12).map(Edge)
    }
    /// Returns a `(start, end)` tuple for the given edge
    pub fn corners(self) -> (Corner, Corner) {
        let (a, b) = EDGE_CORNERS[self.0 as usize];
        (Corner(a), Corner(b))
    }
    /// Returns the axis along which this edge runs
    pub fn axis(self) -> Axis {
        match self.0 {
            0 | 2 | 4 | 6 => X,
            1 | 3 | 5 | 7 => Y,
            8..=11 => Z,
            _ => unreachable!("invalid edge index"),
        }
    }
    /// Returns the offset of the edge's lower endpoint from the cell origin
    ///
    /// Neighboring cells that share an edge agree on this sample (after
    /// adding their own origins), so it keys the per-grid edge caches.
    pub fn origin(self) -> [usize; 3] {
        let (a, b) = self.corners();
        let (a, b) = (a.offset(), b.offset());
        [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])]
    }
}

/// Bitmask of which corners in a cell are inside the surface
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CubeIndex(u8);

impl CubeIndex {
    /// Builds a mask from corner samples, setting bit `n` when sample `n` is
    /// below `iso`
    pub fn new(values: &[f32; 8], iso: f32) -> Self {
        let mask = values
            .iter()
            .enumerate()
            .filter(|(_i, &v)| v < iso)
            .fold(0, |acc, (i, _v)| acc | (1 << i));
        Self(mask)
    }

    /// Returns the bitmask as an index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::BitAnd<Corner> for CubeIndex {
    type Output = bool;
    fn bitand(self, c: Corner) -> bool {
        (self.0 & (1 << c.index())) != 0
    }
}
