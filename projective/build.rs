use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
};

// Same axes as in `projective::mesh::types`, but available at build time.
const X: usize = 1;
const Y: usize = 2;
const Z: usize = 4;

fn next(axis: usize) -> usize {
    assert_eq!(axis.count_ones(), 1);
    if axis == Z { X } else { axis << 1 }
}

/// Packs the edge between two adjacent corners as `4 * t + 2 * v + 1 * u`
fn edge_index(a: usize, b: usize) -> usize {
    let t = a ^ b;
    assert_eq!(t.count_ones(), 1);
    let u = next(t);
    let v = next(u);
    assert_eq!(a & u, b & u);
    assert_eq!(a & v, b & v);
    (t.trailing_zeros() as usize) * 4
        + ((a & u) != 0) as usize
        + (((a & v) != 0) as usize) * 2
}

fn position(c: usize) -> [f64; 3] {
    [X, Y, Z].map(|a| ((c & a) != 0) as u8 as f64)
}

fn midpoint(a: usize, b: usize) -> [f64; 3] {
    let (pa, pb) = (position(a), position(b));
    [0, 1, 2].map(|i| (pa[i] + pb[i]) / 2.0)
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Checks whether two edges lie on a common face of the cube
fn share_face(a: usize, b: usize) -> bool {
    let (a0, a1) = corners(a);
    let (b0, b1) = corners(b);
    [X, Y, Z].into_iter().any(|axis| {
        let bits = [a0, a1, b0, b1].map(|c| c & axis);
        bits.iter().all(|&c| c == bits[0])
    })
}

/// Inverse of `edge_index`
fn corners(e: usize) -> (usize, usize) {
    let t = 1 << (e / 4);
    let u = next(t);
    let v = next(u);
    let su = if e & 1 != 0 { u } else { 0 };
    let sv = if e & 2 != 0 { v } else { 0 };
    (su | sv, su | sv | t)
}

/// Finds the surface loops for a single cell configuration
///
/// Bit `i` of `mask` is set if corner `i` is non-negative.  Each loop is a
/// cycle of edge indexes, ordered so that a fan of triangles over the loop
/// has normals (by the right-hand rule) pointing towards the non-negative
/// corners.
///
/// This works face-by-face: each face of the cube with a sign change gets
/// one or two segments joining the crossing points on its edges.  Segments
/// are oriented so that the non-negative corners are on their left (seen
/// from outside the cube), then chained into closed loops.
///
/// A face with alternating corner signs is ambiguous.  We always cut off the
/// two corners which are off the diagonal through the face's lowest corner;
/// this only depends on the face, so the two cells sharing it agree.
///
/// If a loop includes two edges of an ambiguous face which aren't joined by
/// a segment, then any triangulation using only edge vertices may put a
/// diagonal on that face, where it could collide with one from the
/// neighboring cell.  Those loops are flagged to be fanned around their
/// centroid instead.
fn cell_loops(mask: usize) -> Vec<(Vec<usize>, bool)> {
    let inside = |c: usize| (mask & (1 << c)) != 0;

    // Map from segment start edge to end edge
    let mut segments: BTreeMap<usize, usize> = BTreeMap::new();
    let mut push = |a: (usize, usize), b: (usize, usize), normal: [f64; 3]| {
        let (pa, pb) = (midpoint(a.0, a.1), midpoint(b.0, b.1));
        let left = cross(normal, sub(pb, pa));

        // a.0 is strictly on one side of the segment's line
        let side = dot(sub(position(a.0), pa), left);
        assert!(side.abs() > 1e-6);
        let (ea, eb) = (edge_index(a.0, a.1), edge_index(b.0, b.1));
        let (start, end) =
            if (side > 0.0) == inside(a.0) { (ea, eb) } else { (eb, ea) };
        let prev = segments.insert(start, end);
        assert!(prev.is_none(), "edge {start} starts two segments");
    };

    for t in [X, Y, Z] {
        let u = next(t);
        let v = next(u);
        for side in [0, t] {
            let mut normal = [0.0; 3];
            normal[t.trailing_zeros() as usize] =
                if side == 0 { -1.0 } else { 1.0 };

            let c00 = side;
            let c10 = side | u;
            let c11 = side | u | v;
            let c01 = side | v;
            let ring = [(c00, c10), (c10, c11), (c11, c01), (c01, c00)];
            let crossing: Vec<_> = ring
                .into_iter()
                .filter(|&(a, b)| inside(a) != inside(b))
                .collect();
            match crossing.len() {
                0 => (),
                2 => push(crossing[0], crossing[1], normal),
                4 => {
                    push(ring[0], ring[1], normal);
                    push(ring[2], ring[3], normal);
                }
                n => panic!("invalid crossing count {n}"),
            }
        }
    }

    // Every crossing edge must start exactly one segment and end exactly one
    let starts: BTreeSet<usize> = segments.keys().cloned().collect();
    let ends: BTreeSet<usize> = segments.values().cloned().collect();
    assert_eq!(starts, ends);
    assert_eq!(ends.len(), segments.len());

    let joined = |a: usize, b: usize| segments[&a] == b || segments[&b] == a;

    let mut out = vec![];
    let mut todo = starts;
    while let Some(first) = todo.pop_first() {
        let mut ring = vec![first];
        let mut e = segments[&first];
        while e != first {
            assert!(todo.remove(&e));
            ring.push(e);
            e = segments[&e];
        }
        assert!(ring.len() >= 3);
        let center = ring.iter().enumerate().any(|(i, &a)| {
            ring[i + 1..]
                .iter()
                .any(|&b| share_face(a, b) && !joined(a, b))
        });
        out.push((ring, center));
    }
    out
}

/// Builds a marching cubes loop table
///
/// Only the 128 masks with corner 7 clear are stored; the remaining masks
/// are complements of these, and are handled at runtime by reversing
/// triangle winding.
fn main() -> Result<(), std::io::Error> {
    // The build script stands alone; ignore other changes (e.g. edits to
    // benchmarks in the benches subfolder).
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let dest_path = std::path::Path::new(&out_dir).join("mc_tables.rs");
    let mut file =
        std::fs::File::create(dest_path).expect("could not make output file");

    writeln!(
        &mut file,
        "
/// Lookup table from cell mask to surface loops
///
/// Given a cell mask `i` (with corner 7 clear, so `i < 128`), returns a list
/// of loops, each of which is a cycle of cell edges.  Fanning a loop into
/// triangles (around its first edge, or around its centroid if `center` is
/// set) produces normals which point towards the non-negative corners of the
/// cell.
pub const CELL_TO_LOOPS: [&[Loop]; 128] = ["
    )?;
    for i in 0..128 {
        writeln!(&mut file, "    &[")?;
        for (ring, center) in cell_loops(i) {
            writeln!(&mut file, "        Loop {{")?;
            writeln!(&mut file, "            edges: &[")?;
            for e in ring {
                writeln!(&mut file, "                Edge::new({e}),")?;
            }
            writeln!(&mut file, "            ],")?;
            writeln!(&mut file, "            center: {center},")?;
            writeln!(&mut file, "        }},")?;
        }
        writeln!(&mut file, "    ],")?;
    }
    writeln!(&mut file, "];")?;

    Ok(())
}
