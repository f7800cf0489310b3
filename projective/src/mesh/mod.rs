//! Meshing of projective surfaces across four affine patches
//!
//! Each [`Patch`] is sampled independently by a bounded-depth
//! [`MeshTree`]: the sampling box is split into `r₁³` cells, each of those
//! into `r³` cells, and so on down to [`Settings::depth`] levels, where
//! every bottom-level box samples the polynomial on a small lattice and
//! triangulates it with a marching cubes table.  Subtrees without triangles
//! are discarded as they're built.
//!
//! The resulting meshes should be watertight (within each patch) and
//! consistently wound, with triangle normals pointing along the polynomial's
//! gradient.  However, they are not guaranteed to catch features thinner
//! than the bottom-level lattice spacing, and patches overlap freely.
//!
//! Here's a full example:
//!
//! ```
//! use projective::{expr::Polynomial, mesh::{Mesh, Settings}};
//!
//! // A cylinder is an ordinary surface in the `w = 1` patch, which
//! // closes up at infinity (seen in the `z = 1` patch)
//! let p = Polynomial::new("x^2 + y^2 - 1")?;
//! let settings = Settings {
//!     depth: 3,
//!     ..Default::default()
//! };
//! let mesh = Mesh::build(&p, &settings)?;
//!
//! // Open a file to write, e.g.
//! // let mut f = std::fs::File::create("out.stl")?;
//! # let mut f = vec![];
//! mesh.write_stl(&mut f)?;
//! # Ok::<(), projective::Error>(())
//! ```
use crate::{Error, expr::Polynomial};
use log::info;
use nalgebra::{Vector3, Vector4};

mod cell;
mod leaf;
mod output;
mod patch;
mod table;
mod tree;

#[doc(hidden)]
pub mod types;

pub use cell::CellBounds;
pub use leaf::Leaf;
pub use patch::Patch;
pub use tree::MeshTree;

/// Thread pool to use for multithreaded meshing
#[derive(Debug)]
pub enum ThreadPool {
    /// User-provided pool
    Custom(rayon::ThreadPool),
    /// Global Rayon pool
    Global,
}

impl ThreadPool {
    /// Runs a function across the thread pool
    pub fn run<F: FnOnce() -> V + Send, V: Send>(&self, f: F) -> V {
        match self {
            ThreadPool::Custom(p) => p.install(f),
            ThreadPool::Global => f(),
        }
    }

    /// Returns the number of threads in the pool
    pub fn thread_count(&self) -> usize {
        match self {
            ThreadPool::Custom(p) => p.current_num_threads(),
            ThreadPool::Global => rayon::current_num_threads(),
        }
    }
}

/// Settings when building mesh trees
#[derive(Copy, Clone, Debug)]
pub struct Settings<'a> {
    /// Number of tree levels, including the bottom (leaf) level
    ///
    /// Must be at least 1; a depth of 1 makes the whole sampling box a
    /// single leaf.
    pub depth: u8,

    /// Subdivisions per axis at the top level of the tree
    pub initial_branch_factor: u8,

    /// Subdivisions per axis at every level below the top
    ///
    /// This is also the lattice resolution used within each leaf (unless
    /// the leaf is the top level, in which case `initial_branch_factor` is
    /// used instead).
    pub branch_factor: u8,

    /// Lower corner of the sampling box, in patch-local coordinates
    pub min: Vector3<f64>,

    /// Upper corner of the sampling box, in patch-local coordinates
    pub max: Vector3<f64>,

    /// Thread pool to use for meshing
    ///
    /// If this is `None`, then the four patches are meshed one after the
    /// other on the calling thread; otherwise, they are meshed concurrently
    /// on the provided pool.
    pub threads: Option<&'a ThreadPool>,

    /// Record the outline of every sampling cell as colored line segments
    pub debug_lines: bool,
}

impl Default for Settings<'_> {
    fn default() -> Self {
        Self {
            depth: 6,
            initial_branch_factor: 2,
            branch_factor: 2,
            min: Vector3::repeat(-1.0),
            max: Vector3::repeat(1.0),
            threads: Some(&ThreadPool::Global),
            debug_lines: false,
        }
    }
}

impl Settings<'_> {
    /// Checks that these settings describe a buildable tree
    pub fn validate(&self) -> Result<(), Error> {
        if self.depth == 0 {
            return Err(Error::BadDepth);
        }
        for b in [self.initial_branch_factor, self.branch_factor] {
            if b == 0 {
                return Err(Error::BadBranchFactor(b));
            }
        }
        for (&lo, &hi) in self.min.iter().zip(self.max.iter()) {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(Error::BadBounds(lo, hi));
            }
        }
        Ok(())
    }

    /// Returns the branch factor used for nodes at the given depth
    ///
    /// The root is at depth 1.
    pub(crate) fn branch_factor_at(&self, depth: u8) -> u8 {
        if depth <= 1 {
            self.initial_branch_factor
        } else {
            self.branch_factor
        }
    }
}

/// Colored line segments outlining sampling cells
#[derive(Clone, Debug, Default)]
pub struct DebugLines {
    /// Line endpoints (two per segment), in homogeneous coordinates
    pub vertices: Vec<Vector4<f32>>,
    /// Color at each endpoint
    pub colors: Vec<Vector3<f32>>,
}

impl DebugLines {
    /// Color for corners with a non-negative sample
    pub const GREEN: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
    /// Color for corners with a negative sample
    pub const RED: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);
}

/// A flat triangle mesh, in homogeneous coordinates
///
/// Every three consecutive vertices form a triangle; there's no sharing of
/// vertices between triangles.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Triangle vertices, in homogeneous coordinates
    pub vertices: Vec<Vector4<f32>>,
    /// Polynomial gradient at each vertex
    pub gradients: Vec<Vector4<f32>>,
    /// Sampling cell outlines, if [`Settings::debug_lines`] was set
    pub debug: DebugLines,
}

impl Mesh {
    /// Builds a new (empty) mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes all four patches, then concatenates their triangles
    pub fn build(poly: &Polynomial, settings: &Settings) -> Result<Self, Error> {
        let start = std::time::Instant::now();
        let trees = build_trees(poly, settings)?;
        let mesh = Self::from_trees(trees.iter().flatten());
        info!(
            "built {} triangles in {:?}",
            mesh.triangle_count(),
            start.elapsed()
        );
        Ok(mesh)
    }

    /// Concatenates the triangles from a set of trees, in order
    pub fn from_trees<'a, I: IntoIterator<Item = &'a MeshTree>>(
        trees: I,
    ) -> Self {
        let mut out = Self::new();
        for t in trees {
            t.collect(&mut out);
        }
        out
    }

    /// Returns the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Checks whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates over triangles, as triples of homogeneous vertices
    pub fn triangles(&self) -> impl Iterator<Item = [Vector4<f32>; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Builds the mesh trees for all four patches
///
/// Trees are returned in `X, Y, Z, W` patch order, with `None` for patches
/// that the surface doesn't cross.  If a thread pool is provided in the
/// settings, the four patches are built concurrently and this function
/// returns once all of them are done.
pub fn build_trees(
    poly: &Polynomial,
    settings: &Settings,
) -> Result<[Option<MeshTree>; 4], Error> {
    settings.validate()?;
    let build = |patch| MeshTree::build(poly, patch, settings);
    let [x, y, z, w] = match settings.threads {
        Some(pool) => pool.run(|| {
            let ((x, y), (z, w)) = rayon::join(
                || rayon::join(|| build(Patch::X), || build(Patch::Y)),
                || rayon::join(|| build(Patch::Z), || build(Patch::W)),
            );
            [x, y, z, w]
        }),
        None => [Patch::X, Patch::Y, Patch::Z, Patch::W].map(build),
    };
    Ok([x?, y?, z?, w?])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());
        let s = Settings {
            depth: 0,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(Error::BadDepth)));

        let s = Settings {
            branch_factor: 0,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(Error::BadBranchFactor(0))));

        let s = Settings {
            min: Vector3::new(-1.0, 2.0, -1.0),
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(Error::BadBounds(2.0, 1.0))));

        let s = Settings {
            max: Vector3::new(1.0, 1.0, f64::NAN),
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_branch_factor() {
        let s = Settings {
            initial_branch_factor: 3,
            branch_factor: 2,
            ..Default::default()
        };
        assert_eq!(s.branch_factor_at(1), 3);
        assert_eq!(s.branch_factor_at(2), 2);
        assert_eq!(s.branch_factor_at(6), 2);
    }

    #[test]
    fn test_patch_order() {
        // The plane 3x = w misses the X patch's sampling box, and cuts
        // through every other patch
        let poly = Polynomial::new("3x - 1").unwrap();
        let settings = Settings {
            depth: 2,
            ..Default::default()
        };
        let [x, y, z, w] = build_trees(&poly, &settings).unwrap();
        assert!(x.is_none());
        for t in [&y, &z, &w] {
            assert!(t.is_some());
        }

        // Vertices in the Y tree have y = 1, etc
        for (t, i) in [(&y, 1), (&z, 2), (&w, 3)] {
            let mut m = Mesh::new();
            t.as_ref().unwrap().collect(&mut m);
            assert!(m.vertices.iter().all(|v| v[i] == 1.0));
        }

        let mesh = Mesh::build(&poly, &settings).unwrap();
        let n = |t: &Option<MeshTree>| t.as_ref().unwrap().triangle_count();
        assert_eq!(mesh.triangle_count(), n(&y) + n(&z) + n(&w));
        assert_eq!(mesh.vertices[0].y, 1.0);
        assert_eq!(mesh.vertices.last().unwrap().w, 1.0);
    }

    #[test]
    fn test_custom_pool() {
        let pool = ThreadPool::Custom(
            rayon::ThreadPoolBuilder::new()
                .num_threads(2)
                .build()
                .unwrap(),
        );
        assert_eq!(pool.thread_count(), 2);

        let poly = Polynomial::new("4x^2 + 4y^2 + 4z^2 - 1").unwrap();
        let a = Mesh::build(
            &poly,
            &Settings {
                depth: 3,
                threads: Some(&pool),
                ..Default::default()
            },
        )
        .unwrap();
        let b = Mesh::build(
            &poly,
            &Settings {
                depth: 3,
                threads: None,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!a.is_empty());
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.gradients, b.gradients);
    }
}
