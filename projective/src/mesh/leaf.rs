//! Bottom-level sampling and triangulation
use super::{
    DebugLines,
    cell::CellBounds,
    patch::Patch,
    table::{self, Vertex},
    types::{CellMask, Corner, Edge},
};
use crate::expr::Polynomial;
use nalgebra::Vector4;

/// Triangles for one bottom-level box of a patch
///
/// Vertices are stored as a flat triangle soup (three per triangle) in
/// homogeneous coordinates, with the polynomial's 4D gradient at each vertex.
#[derive(Clone, Debug, Default)]
pub struct Leaf {
    /// Triangle vertices, in homogeneous coordinates
    pub vertices: Vec<Vector4<f32>>,
    /// Gradient of the polynomial at each vertex
    pub gradients: Vec<Vector4<f32>>,
    /// Sampling cell outlines, if requested
    pub debug: DebugLines,
}

impl Leaf {
    /// Samples a `(res + 1)³` lattice over `bounds` and triangulates each of
    /// its `res³` cells
    pub fn build(
        poly: &Polynomial,
        patch: Patch,
        bounds: &CellBounds,
        res: usize,
        debug_lines: bool,
    ) -> Self {
        let n = res + 1;
        let mut pos = Vec::with_capacity(n * n * n);
        let mut values = Vec::with_capacity(n * n * n);
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    let p = patch.to_homogeneous(bounds.lattice([i, j, k], res));
                    values.push(poly.eval_at(p));
                    pos.push(p);
                }
            }
        }
        let index = |[i, j, k]: [usize; 3]| i + n * (j + n * k);

        let mut out = Leaf::default();
        let mut crossings = [Vector4::zeros(); 12];
        for k in 0..res {
            for j in 0..res {
                for i in 0..res {
                    let at = |c: Corner| {
                        let [dx, dy, dz] = c.offset();
                        index([i + dx, j + dy, k + dz])
                    };
                    let mask = CellMask::from_fn(|c| values[at(c)] >= 0.0);
                    if debug_lines {
                        out.debug.push_cell(|c| (pos[at(c)], mask & c));
                    }

                    let (loops, flip) = table::loops(mask);
                    for l in loops {
                        for &e in l.edges {
                            let (a, b) = e.corners();
                            crossings[e.index()] = interpolate(
                                (pos[at(a)], values[at(a)]),
                                (pos[at(b)], values[at(b)]),
                            );
                        }
                        let center = if l.center {
                            l.edges
                                .iter()
                                .map(|e| crossings[e.index()])
                                .sum::<Vector4<f64>>()
                                / l.edges.len() as f64
                        } else {
                            Vector4::zeros()
                        };
                        for tri in l.triangles(flip) {
                            for v in tri {
                                let p = match v {
                                    Vertex::Edge(e) => crossings[e.index()],
                                    Vertex::Center => center,
                                };
                                out.push(poly, p);
                            }
                        }
                    }
                }
            }
        }
        out
    }

    fn push(&mut self, poly: &Polynomial, p: Vector4<f64>) {
        self.vertices.push(p.map(|v| v as f32));
        self.gradients.push(poly.grad(p).map(|v| v as f32));
    }

    /// Checks whether this leaf produced any triangles
    ///
    /// Debug lines are ignored, so a leaf which only has cell outlines is
    /// still empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the number of triangles in this leaf
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Finds the zero crossing between two samples of opposite sign
///
/// The samples are ordered along the edge (`a` is the edge's start), so the
/// two cells sharing an edge compute the same point.
fn interpolate(
    (pa, va): (Vector4<f64>, f64),
    (pb, vb): (Vector4<f64>, f64),
) -> Vector4<f64> {
    let t = va / (va - vb);
    pa + (pb - pa) * t
}

impl DebugLines {
    /// Records the 12 edges of a sampling cell
    ///
    /// `f` returns the position of a corner and whether its sample was
    /// non-negative, which selects the color of that end of the line.
    fn push_cell<F: Fn(Corner) -> (Vector4<f64>, bool)>(&mut self, f: F) {
        for e in Edge::iter() {
            let (a, b) = e.corners();
            for c in [a, b] {
                let (p, inside) = f(c);
                self.vertices.push(p.map(|v| v as f32));
                self.colors.push(if inside {
                    DebugLines::GREEN
                } else {
                    DebugLines::RED
                });
            }
        }
    }
}
