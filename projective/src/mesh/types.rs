//! Strongly-typed indexes into a cubic sampling cell
//!
//! Corners are numbered `x + 2y + 4z`.  Edges are numbered using a
//! right-handed `(t, u, v)` frame, where `t` is the edge's own axis; this
//! numbering is shared with the build script that generates the
//! triangulation table, so it must not change.

/// One of the three lattice directions, stored as a single-bit mask
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Axis(u8);

impl Axis {
    /// Builds an axis from its bit
    ///
    /// ```
    /// # use projective::mesh::types::Axis;
    /// const UP: Axis = Axis::new(0b100);
    /// ```
    ///
    /// # Panics
    /// Unless exactly one of the bits `0b001`, `0b010`, `0b100` is set
    ///
    /// ```compile_fail
    /// # use projective::mesh::types::Axis;
    /// const A: Axis = Axis::new(0b101);
    /// ```
    pub const fn new(bit: u8) -> Self {
        assert!(bit == X.0 || bit == Y.0 || bit == Z.0);
        Self(bit)
    }

    /// Returns `0`, `1`, or `2` for `X`, `Y`, or `Z`
    pub fn index(self) -> usize {
        match self.0 {
            1 => 0,
            2 => 1,
            _ => 2,
        }
    }

    /// Returns the following axis in `X → Y → Z → X` order
    ///
    /// For an edge along `t`, `(t, t.next(), t.next().next())` is a
    /// right-handed frame.
    pub const fn next(self) -> Self {
        match self.0 {
            1 => Y,
            2 => Z,
            _ => X,
        }
    }
}

#[allow(missing_docs)]
pub const X: Axis = Axis(0b001);
#[allow(missing_docs)]
pub const Y: Axis = Axis(0b010);
#[allow(missing_docs)]
pub const Z: Axis = Axis(0b100);

/// `axis * b` is the corner offset by one step along `axis` if `b` is set
impl std::ops::Mul<bool> for Axis {
    type Output = Corner;
    fn mul(self, b: bool) -> Corner {
        Corner(self.0 * u8::from(b))
    }
}

/// One of the eight corners of a cell, numbered `x + 2y + 4z`
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Corner(u8);

impl Corner {
    /// Builds a corner from its index
    ///
    /// # Panics
    /// If `i` is 8 or more
    pub const fn new(i: u8) -> Self {
        assert!(i < 8);
        Self(i)
    }

    #[allow(missing_docs)]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Iterates over corners in index order
    pub fn iter() -> impl Iterator<Item = Self> {
        (0u8..8).map(Self)
    }

    /// Returns this corner's lattice offset as `[dx, dy, dz]`, each 0 or 1
    pub fn offset(self) -> [usize; 3] {
        [self & X, self & Y, self & Z].map(usize::from)
    }
}

/// Checks whether the corner is on the far side of the cell along an axis
impl std::ops::BitAnd<Axis> for Corner {
    type Output = bool;
    fn bitand(self, axis: Axis) -> bool {
        self.0 & axis.0 == axis.0
    }
}

impl std::ops::BitOr<Corner> for Corner {
    type Output = Corner;
    fn bitor(self, other: Corner) -> Corner {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr<Axis> for Corner {
    type Output = Corner;
    fn bitor(self, axis: Axis) -> Corner {
        Self(self.0 | axis.0)
    }
}

/// One of the twelve edges of a cell
///
/// An edge along axis `t` is numbered `4 * t + 2 * v + u`, where `u` and `v`
/// are the bits of its corners along `t.next()` and `t.next().next()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Edge(u8);

impl Edge {
    /// Builds an edge from its index
    ///
    /// # Panics
    /// If `i` is 12 or more
    pub const fn new(i: u8) -> Self {
        assert!(i < 12);
        Self(i)
    }

    #[allow(missing_docs)]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Iterates over edges in index order
    pub fn iter() -> impl Iterator<Item = Self> {
        (0u8..12).map(Self)
    }

    /// Returns the edge's own axis
    pub fn axis(self) -> Axis {
        Axis(1 << (self.0 / 4))
    }

    /// Returns the edge's endpoints, ordered along its axis
    pub fn corners(self) -> (Corner, Corner) {
        let t = self.axis();
        let start = (t.next() * (self.0 & 1 != 0))
            | (t.next().next() * (self.0 & 2 != 0));
        (start, start | t)
    }
}

/// Bitmask of which corners in a cell have a non-negative sample
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellMask(u8);

impl CellMask {
    /// Wraps a raw bitmask, with bit `i` standing for corner `i`
    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Builds a mask from a per-corner predicate
    pub fn from_fn<F: FnMut(Corner) -> bool>(mut f: F) -> Self {
        Self(
            Corner::iter()
                .filter(|c| f(*c))
                .fold(0, |acc, c| acc | (1 << c.0)),
        )
    }

    /// Returns the raw bitmask, for table lookups
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Returns the mask with corner 7 clear, and whether it was flipped
    ///
    /// Complementing a mask swaps which side of the surface is non-negative,
    /// which is equivalent to reversing the winding of every triangle.
    pub fn canonical(self) -> (Self, bool) {
        if self & Corner(7) {
            (Self(!self.0), true)
        } else {
            (self, false)
        }
    }
}

impl std::ops::BitAnd<Corner> for CellMask {
    type Output = bool;
    fn bitand(self, c: Corner) -> bool {
        (self.0 >> c.0) & 1 == 1
    }
}
