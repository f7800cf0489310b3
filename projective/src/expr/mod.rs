//! Integer-coefficient polynomial expressions in `x, y, z, w`
//!
//! An [`Expr`] is a small owned tree, built by [`parse`], by the operator
//! overloads on `Expr`, or by the algebra in this module (derivatives,
//! [simplification](Expr::simplify), [homogenization](Expr::homogenize)).
//! Every operation allocates a fresh tree; nothing is mutated in place.
//!
//! ```
//! use projective::expr::{Expr, Var};
//!
//! let e: Expr = "x^2 + 3y".parse()?;
//! assert_eq!(e.eval(2.0, 1.0, 0.0, 0.0), 7.0);
//!
//! let dx = e.derivative(Var::X).simplify();
//! assert_eq!(dx.eval(5.0, 0.0, 0.0, 0.0), 10.0);
//! # Ok::<(), projective::Error>(())
//! ```
use crate::Error;
use nalgebra::Vector4;

mod homogenize;
mod parse;
mod poly;
mod simplify;

pub use parse::parse;
pub use poly::Polynomial;

/// One of the four homogeneous coordinates
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    strum::EnumIter,
    strum::EnumCount,
    strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Var {
    #[allow(missing_docs)]
    X,
    #[allow(missing_docs)]
    Y,
    #[allow(missing_docs)]
    Z,
    /// Homogenizing coordinate
    W,
}

impl Var {
    /// Returns the position of this variable in `(x, y, z, w)`
    pub fn index(self) -> usize {
        self as usize
    }

    /// Picks out the coordinate named by this variable
    pub fn select(self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        match self {
            Var::X => x,
            Var::Y => y,
            Var::Z => z,
            Var::W => w,
        }
    }

    /// Converts from an ASCII character (`x`, `y`, `z`, or `w`)
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Var::X),
            'y' => Some(Var::Y),
            'z' => Some(Var::Z),
            'w' => Some(Var::W),
            _ => None,
        }
    }
}

/// A two-argument operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Opcode {
    #[allow(missing_docs)]
    Add,
    #[allow(missing_docs)]
    Sub,
    #[allow(missing_docs)]
    Mul,
    /// Exponentiation; only integer exponents are meaningful
    Pow,
}

impl Opcode {
    /// Applies this operation to a pair of values
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Opcode::Add => a + b,
            Opcode::Sub => a - b,
            Opcode::Mul => a * b,
            Opcode::Pow => a.powf(b),
        }
    }

    /// Returns the infix symbol for this operation
    pub fn symbol(self) -> char {
        match self {
            Opcode::Add => '+',
            Opcode::Sub => '-',
            Opcode::Mul => '*',
            Opcode::Pow => '^',
        }
    }
}

impl TryFrom<char> for Opcode {
    type Error = Error;
    fn try_from(c: char) -> Result<Self, Error> {
        match c {
            '+' => Ok(Opcode::Add),
            '-' => Ok(Opcode::Sub),
            '*' => Ok(Opcode::Mul),
            '^' => Ok(Opcode::Pow),
            c => Err(Error::InvalidOperator(c)),
        }
    }
}

/// Owned expression tree
///
/// Each node owns its children exclusively, so [`Clone`] is a deep copy and
/// [`PartialEq`] is structural equality.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Integer constant
    Const(i64),
    /// One of the four coordinates
    Var(Var),
    /// Binary operation over two owned subtrees
    Binary(Opcode, Box<Expr>, Box<Expr>),
}

impl From<i64> for Expr {
    fn from(v: i64) -> Expr {
        Expr::Const(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Expr {
        Expr::Const(v.into())
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Expr {
        Expr::Var(v)
    }
}

impl std::str::FromStr for Expr {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        parse(s)
    }
}

#[allow(missing_docs)]
impl Expr {
    pub fn constant(v: i64) -> Self {
        Expr::Const(v)
    }
    pub fn var(v: Var) -> Self {
        Expr::Var(v)
    }
    pub fn binary(op: Opcode, a: Expr, b: Expr) -> Self {
        Expr::Binary(op, Box::new(a), Box::new(b))
    }
    pub fn pow<E: Into<Expr>>(self, e: E) -> Self {
        Self::binary(Opcode::Pow, self, e.into())
    }
}

impl Expr {
    /// Evaluates the expression at the given point
    pub fn eval(&self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        match self {
            Expr::Const(c) => *c as f64,
            Expr::Var(v) => v.select(x, y, z, w),
            Expr::Binary(op, a, b) => {
                op.apply(a.eval(x, y, z, w), b.eval(x, y, z, w))
            }
        }
    }

    /// Evaluates the expression at a homogeneous position
    pub fn eval_at(&self, p: Vector4<f64>) -> f64 {
        self.eval(p.x, p.y, p.z, p.w)
    }

    /// Checks whether this is the constant `0`
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(0))
    }

    /// Checks whether this is the constant `1`
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(1))
    }

    /// Checks whether this subtree contains no variables
    pub fn is_numeric(&self) -> bool {
        match self {
            Expr::Const(..) => true,
            Expr::Var(..) => false,
            Expr::Binary(_, a, b) => a.is_numeric() && b.is_numeric(),
        }
    }

    /// Returns the (unsimplified) partial derivative with respect to `v`
    ///
    /// Powers are differentiated with the power rule, which is only correct
    /// for numeric exponents.  This isn't checked here; trees that passed
    /// through [`Expr::homogenize`] satisfy it.
    pub fn derivative(&self, v: Var) -> Expr {
        match self {
            Expr::Const(..) => Expr::Const(0),
            Expr::Var(u) => Expr::Const((*u == v) as i64),
            Expr::Binary(op, a, b) => match op {
                Opcode::Add | Opcode::Sub => {
                    Expr::binary(*op, a.derivative(v), b.derivative(v))
                }
                Opcode::Mul => {
                    a.derivative(v) * b.as_ref().clone()
                        + a.as_ref().clone() * b.derivative(v)
                }
                Opcode::Pow => {
                    // x^0 is constant, and x^-1 would be singular at 0
                    if b.is_numeric() && b.eval(0.0, 0.0, 0.0, 0.0) == 0.0 {
                        return Expr::Const(0);
                    }
                    let n = b.as_ref().clone();
                    n.clone() * a.derivative(v) * a.as_ref().clone().pow(n - 1)
                }
            },
        }
    }
}

/// Fully parenthesized infix rendering
///
/// This is meant for diagnostics; it is not guaranteed to round-trip
/// through [`parse`] (e.g. negative constants produced by folding).
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Binary(op @ (Opcode::Add | Opcode::Sub), a, b) => {
                write!(f, "({a}) {} ({b})", op.symbol())
            }
            Expr::Binary(op, a, b) => write!(f, "({a}){}({b})", op.symbol()),
        }
    }
}

macro_rules! impl_binary {
    ($op:ident, $base_fn:ident) => {
        impl<A: Into<Expr>> std::ops::$op<A> for Expr {
            type Output = Self;

            fn $base_fn(self, other: A) -> Self {
                Self::binary(Opcode::$op, self, other.into())
            }
        }
        impl std::ops::$op<Expr> for i32 {
            type Output = Expr;
            fn $base_fn(self, other: Expr) -> Expr {
                Expr::binary(Opcode::$op, self.into(), other)
            }
        }
    };
}

impl_binary!(Add, add);
impl_binary!(Sub, sub);
impl_binary!(Mul, mul);

#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use strum::IntoEnumIterator;

    /// Builds a random expression from the parser's grammar
    pub(crate) fn random_expr(rng: &mut StdRng, depth: usize) -> Expr {
        if depth == 0 || rng.gen_bool(0.25) {
            return if rng.gen_bool(0.5) {
                Expr::Const(rng.gen_range(0..4))
            } else {
                Expr::Var(Var::iter().nth(rng.gen_range(0..4)).unwrap())
            };
        }
        let a = random_expr(rng, depth - 1);
        match rng.gen_range(0..4) {
            0 => a + random_expr(rng, depth - 1),
            1 => a - random_expr(rng, depth - 1),
            2 => a * random_expr(rng, depth - 1),
            _ => a.pow(rng.gen_range(0..3i64)),
        }
    }

    #[test]
    fn test_eval() {
        let (x, y, z, w) = (Var::X, Var::Y, Var::Z, Var::W);
        let e = Expr::var(x) * 2 + Expr::var(y).pow(3) - Expr::var(z) * w;
        assert_eq!(e.eval(1.0, 2.0, 3.0, 4.0), 2.0 + 8.0 - 12.0);
        assert_eq!(e.eval(-1.0, -2.0, 3.0, -4.0), -2.0 - 8.0 + 12.0);
        assert_eq!(e.eval_at(Vector4::new(1.0, 2.0, 3.0, 4.0)), -2.0);
    }

    #[test]
    fn test_predicates() {
        assert!(Expr::Const(0).is_zero());
        assert!(!Expr::Const(0).is_one());
        assert!(Expr::Const(1).is_one());
        assert!(!Expr::var(Var::X).is_zero());

        // Zero-valued trees are not the constant zero
        let e = Expr::Const(1) - 1;
        assert!(!e.is_zero());
        assert!(e.is_numeric());
        assert!(!(e * Var::W).is_numeric());
    }

    #[test]
    fn test_opcode_from_char() {
        assert_eq!(Opcode::try_from('^').unwrap(), Opcode::Pow);
        assert!(matches!(
            Opcode::try_from('/'),
            Err(Error::InvalidOperator('/'))
        ));
        for op in [Opcode::Add, Opcode::Sub, Opcode::Mul, Opcode::Pow] {
            assert_eq!(Opcode::try_from(op.symbol()).unwrap(), op);
        }
    }

    #[test]
    fn test_display() {
        let e = (Expr::var(Var::X) + 1).pow(2) * Var::Y;
        assert_eq!(e.to_string(), "(((x) + (1))^(2))*(y)");
    }

    #[test]
    fn test_clone_is_deep() {
        let a = Expr::var(Var::X) * Var::Y;
        let b = a.clone() + 1;
        assert_eq!(a, Expr::var(Var::X) * Var::Y);
        assert_ne!(a, b);
    }

    #[test]
    fn test_derivative_simple() {
        let x = Expr::var(Var::X);
        let e = x.clone().pow(3) + x.clone() * Var::Y;
        let dx = e.derivative(Var::X);
        assert_eq!(dx.eval(2.0, 5.0, 0.0, 0.0), 3.0 * 4.0 + 5.0);
        let dy = e.derivative(Var::Y);
        assert_eq!(dy.eval(2.0, 5.0, 0.0, 0.0), 2.0);
        let dz = e.derivative(Var::Z);
        assert_eq!(dz.eval(2.0, 5.0, 0.0, 0.0), 0.0);

        // Zero exponents don't produce a singular x^-1 term
        let e = x.pow(0);
        assert_eq!(e.derivative(Var::X).eval(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_derivative_finite_difference() {
        const H: f64 = 1e-4;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let e = random_expr(&mut rng, 3);
            let p = Vector4::from_fn(|_, _| rng.gen_range(-1.0..1.0));
            for v in Var::iter() {
                let mut dp = Vector4::zeros();
                dp[v.index()] = H;
                let estimate =
                    (e.eval_at(p + dp) - e.eval_at(p - dp)) / (2.0 * H);
                let exact = e.derivative(v).eval_at(p);
                let tol = 1e-4 * (1.0 + exact.abs());
                assert!(
                    (estimate - exact).abs() < tol,
                    "d/d{v} of {e} at {p:?}: {exact} != {estimate}"
                );
            }
        }
    }
}
