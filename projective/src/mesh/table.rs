//! Marching cubes table for leaf cells (generated by the build script)
use super::types::{CellMask, Edge};

/// A closed loop of surface crossings on the edges of a cell
#[derive(Copy, Clone, Debug)]
pub struct Loop {
    /// Crossing edges, in winding order
    pub edges: &'static [Edge],
    /// Fan around the loop's centroid, rather than its first edge
    pub center: bool,
}

/// A triangle vertex within a cell
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Vertex {
    /// Interpolated crossing on a cell edge
    Edge(Edge),
    /// Centroid of the current loop's crossings
    Center,
}

include!(concat!(env!("OUT_DIR"), "/mc_tables.rs"));

/// Looks up the surface loops for a cell
///
/// Returns the loops from [`CELL_TO_LOOPS`], plus a flag which is `true` if
/// the mask was complemented to find them; in that case, triangle winding
/// must be reversed (see [`Loop::triangles`]).
pub fn loops(mask: CellMask) -> (&'static [Loop], bool) {
    let (m, flip) = mask.canonical();
    (CELL_TO_LOOPS[m.index()], flip)
}

impl Loop {
    /// Splits the loop into triangles
    ///
    /// Triangles have normals pointing towards the cell's non-negative
    /// corners, provided that `flip` is the flag returned by [`loops`].
    pub fn triangles(
        &self,
        flip: bool,
    ) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        let n = self.edges.len();
        let e = move |i: usize| Vertex::Edge(self.edges[i % n]);
        let count = if self.center { n } else { n - 2 };
        (0..count).map(move |i| {
            let [a, b, c] = if self.center {
                [Vertex::Center, e(i), e(i + 1)]
            } else {
                [e(0), e(i + 1), e(i + 2)]
            };
            if flip { [a, c, b] } else { [a, b, c] }
        })
    }
}
