use super::{Expr, Var, parse};
use crate::Error;
use log::debug;
use nalgebra::Vector4;
use strum::IntoEnumIterator;

/// A homogeneous polynomial and its four partial derivatives
///
/// This is the evaluation handle used by mesh extraction: it's built once per
/// surface, then shared (immutably) by every worker thread.
///
/// ```
/// use projective::expr::{Polynomial, Var};
///
/// let p = Polynomial::new("x^2 + y^2 + z^2 - 1")?;
/// assert_eq!(p.degree(), 2);
/// assert_eq!(p.eval(0.0, 0.0, 0.0, 1.0), -1.0);
/// assert_eq!(p.eval_partial(Var::W, 0.0, 0.0, 0.0, 1.0), -2.0);
/// # Ok::<(), projective::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Polynomial {
    expr: Expr,
    degree: u32,
    partials: [Expr; 4],
}

impl Polynomial {
    /// Parses and homogenizes the given text
    pub fn new(text: &str) -> Result<Self, Error> {
        Self::from_expr(&parse(text)?)
    }

    /// Homogenizes an existing expression
    pub fn from_expr(e: &Expr) -> Result<Self, Error> {
        let (h, degree) = e.homogenize()?;
        let partials = [Var::X, Var::Y, Var::Z, Var::W]
            .map(|v| h.derivative(v).simplify());
        let expr = h.simplify();
        debug!("homogenized to {expr} (degree {degree})");
        for (v, p) in Var::iter().zip(&partials) {
            debug!("  d/d{v} = {p}");
        }
        Ok(Self {
            expr,
            degree,
            partials,
        })
    }

    /// Returns the (simplified) homogeneous expression
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Returns the total degree
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Returns the (simplified) partial derivative with respect to `v`
    pub fn partial(&self, v: Var) -> &Expr {
        &self.partials[v.index()]
    }

    /// Evaluates the polynomial at the given point
    pub fn eval(&self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        self.expr.eval(x, y, z, w)
    }

    /// Evaluates the polynomial at a homogeneous position
    pub fn eval_at(&self, p: Vector4<f64>) -> f64 {
        self.expr.eval_at(p)
    }

    /// Evaluates one partial derivative at the given point
    pub fn eval_partial(&self, v: Var, x: f64, y: f64, z: f64, w: f64) -> f64 {
        self.partial(v).eval(x, y, z, w)
    }

    /// Evaluates the 4D gradient at a homogeneous position
    pub fn grad(&self, p: Vector4<f64>) -> Vector4<f64> {
        Vector4::from_fn(|i, _| self.partials[i].eval_at(p))
    }
}

impl std::str::FromStr for Polynomial {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(s)
    }
}
