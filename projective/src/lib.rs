//! `projective` draws polynomial surfaces in real projective 3-space.
//!
//! A **projective surface** is the zero set of a homogeneous polynomial
//! `f(x, y, z, w)`.  Points are lines through the origin of 4D space, so
//! `(x, y, z, w)` and `(λx, λy, λz, λw)` name the same point; since `f` is
//! homogeneous, its sign changes consistently along each line (up to a
//! global flip for odd degrees), and the zero set is well defined.
//!
//! Projective space can't be drawn as a single 3D volume.  Instead, this
//! crate covers it with four **affine patches** (one per coordinate) and
//! meshes each patch independently.  The patch for coordinate `w` is the
//! ordinary `(x, y, z)` space with `w = 1`; the others show what happens
//! "at infinity".
//!
//! # Polynomials
//! Users write polynomials as text, which is parsed into an
//! [`Expr`](crate::expr::Expr) tree.  A [`Polynomial`](crate::expr::Polynomial)
//! homogenizes that tree (padding lower-degree terms with powers of `w`) and
//! precomputes its four partial derivatives:
//!
//! ```
//! use projective::expr::{Polynomial, Var};
//!
//! let p = Polynomial::new("x^2 + y^2 + z^2 - 1")?;
//! assert_eq!(p.degree(), 2);
//! assert_eq!(p.expr().to_string(), "((((x)^(2)) + ((y)^(2))) + ((z)^(2))) - ((w)^(2))");
//! assert_eq!(p.partial(Var::X).to_string(), "(2)*(x)");
//! # Ok::<(), projective::Error>(())
//! ```
//!
//! The grammar supports integers, the variables `x y z w`, parentheses,
//! `+ - * ^`, unary minus, and implicit multiplication (`3x`, `2(x + y)`).
//! Exponents must be non-negative integer constants.
//!
//! # Meshing
//! Each patch is meshed by a bounded-depth subdivision tree.  The sampling
//! box (default `[-1, 1]³`) is split into a grid of cells, those are split
//! again, and so on; at the bottom level, each cell samples the polynomial on
//! a small lattice and runs a marching-cubes variant over it.  Subtrees that
//! produce no triangles are pruned.
//!
//! The four patches are meshed in parallel, then concatenated (in `X, Y, Z,
//! W` order) into one flat triangle soup, with a gradient stored for each
//! vertex:
//!
//! ```
//! use projective::{expr::Polynomial, mesh::{Mesh, Settings}};
//!
//! let p = Polynomial::new("x^2 + y^2 + z^2 - 1")?;
//! let settings = Settings {
//!     depth: 3,
//!     ..Default::default()
//! };
//! let mesh = Mesh::build(&p, &settings)?;
//! assert!(mesh.triangle_count() > 0);
//! assert_eq!(mesh.vertices.len(), mesh.gradients.len());
//!
//! // Open a file to write, e.g.
//! // let mut f = std::fs::File::create("out.stl")?;
//! # let mut f = vec![];
//! mesh.write_stl(&mut f)?;
//! # Ok::<(), projective::Error>(())
//! ```
//!
//! # Interactive use
//! Rebuilding a mesh takes a while, so interactive front-ends shouldn't do it
//! on their render loop.  The [`rebuild`] module (enabled by default) runs the
//! whole pipeline on a background thread and hands back the finished surface
//! when it's ready, while keeping the previous surface available in the
//! meantime.
//!
//! # Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]

pub mod expr;
pub mod mesh;

#[cfg(feature = "rebuild")]
pub mod rebuild;

mod error;
pub use error::Error;
