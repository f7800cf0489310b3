//! Conversion to homogeneous form
use super::{Expr, Opcode, Var};
use crate::Error;
use std::cmp::Ordering;

impl Expr {
    /// Lifts this expression into a homogeneous polynomial in `x, y, z, w`
    ///
    /// Returns the new tree and its degree `d`, which satisfy
    /// `h(λp) = λ^d h(p)` for every `λ`.  Terms of lower degree in a sum or
    /// difference are padded by multiplying with `w` (or `w^k`), so setting
    /// `w = 1` recovers the original expression.
    ///
    /// # Errors
    /// Exponents must be numeric and non-negative; a degree which overflows
    /// a `u32` is also rejected.
    pub fn homogenize(&self) -> Result<(Expr, u32), Error> {
        match self {
            Expr::Const(..) => Ok((self.clone(), 0)),
            Expr::Var(..) => Ok((self.clone(), 1)),
            Expr::Binary(op, a, b) => match op {
                Opcode::Add | Opcode::Sub => {
                    let (a, da) = a.homogenize()?;
                    let (b, db) = b.homogenize()?;
                    let out = match da.cmp(&db) {
                        Ordering::Equal => Expr::binary(*op, a, b),
                        Ordering::Greater => {
                            Expr::binary(*op, a, b * padding(da - db))
                        }
                        Ordering::Less => {
                            Expr::binary(*op, a * padding(db - da), b)
                        }
                    };
                    Ok((out, da.max(db)))
                }
                Opcode::Mul => {
                    let (a, da) = a.homogenize()?;
                    let (b, db) = b.homogenize()?;
                    let d = da.checked_add(db).ok_or_else(too_large)?;
                    Ok((a * b, d))
                }
                Opcode::Pow => {
                    if !b.is_numeric() {
                        return Err(Error::malformed(
                            "Variables not allowed in exponents.",
                        ));
                    }
                    let n = exponent(b)?;
                    let (a, da) = a.homogenize()?;
                    let d = da.checked_mul(n).ok_or_else(too_large)?;
                    Ok((a.pow(b.as_ref().clone()), d))
                }
            },
        }
    }
}

/// Returns `w^k` (or plain `w` when `k == 1`)
fn padding(k: u32) -> Expr {
    let w = Expr::Var(Var::W);
    if k == 1 { w } else { w.pow(i64::from(k)) }
}

/// Evaluates a numeric exponent to an integer power
fn exponent(e: &Expr) -> Result<u32, Error> {
    let v = e.eval(0.0, 0.0, 0.0, 0.0).round();
    if v.is_nan() || v < 0.0 {
        Err(Error::malformed("Only non-negative exponents allowed."))
    } else if v > f64::from(u32::MAX) {
        Err(too_large())
    } else {
        Ok(v as u32)
    }
}

fn too_large() -> Error {
    Error::malformed("Degree too large.")
}

#[cfg(test)]
mod test {
    use super::super::{parse, test::random_expr};
    use super::*;
    use nalgebra::Vector4;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn homogenize(text: &str) -> (Expr, u32) {
        parse(text).unwrap().homogenize().unwrap()
    }

    #[test]
    fn test_degree() {
        assert_eq!(homogenize("7").1, 0);
        assert_eq!(homogenize("x").1, 1);
        assert_eq!(homogenize("x y z").1, 3);
        assert_eq!(homogenize("x^2 + 1").1, 2);
        assert_eq!(homogenize("(x + 1)^3 - y").1, 3);
        assert_eq!(homogenize("x^0").1, 0);
        assert_eq!(homogenize("x^(1 + 1)").1, 2);
    }

    #[test]
    fn test_sphere() {
        let (h, d) = homogenize("x^2+y^2+z^2-1");
        assert_eq!(d, 2);
        let expected = parse("x^2+y^2+z^2-w^2").unwrap();
        assert_eq!(h.simplify(), expected);
    }

    #[test]
    fn test_padding() {
        let (h, _) = homogenize("x^3 + 2");
        assert_eq!(h.simplify(), parse("x^3 + 2w^3").unwrap());

        let (h, _) = homogenize("1 - y");
        assert_eq!(h.simplify(), parse("w - y").unwrap());
    }

    #[test]
    fn test_exponent_errors() {
        for text in ["x^y", "2^(z + 1)", "(x^w)^2"] {
            match parse(text).unwrap().homogenize() {
                Err(Error::MalformedExpression(s)) => {
                    assert_eq!(s, "Variables not allowed in exponents.")
                }
                r => panic!("unexpected result for {text}: {r:?}"),
            }
        }

        // Built by hand, since the parser rejects this
        let e = Expr::var(Var::X).pow(Expr::Const(0) - 2);
        assert!(matches!(
            e.homogenize(),
            Err(Error::MalformedExpression(s))
                if s == "Only non-negative exponents allowed."
        ));

        let e = Expr::var(Var::X).pow(1i64 << 40);
        assert!(matches!(
            e.homogenize(),
            Err(Error::MalformedExpression(s)) if s == "Degree too large."
        ));
    }

    #[test]
    fn test_dehomogenize() {
        let e = parse("x^3 - 2x y + 3z - 4").unwrap();
        let (h, _) = e.homogenize().unwrap();
        for p in [[0.5, 1.0, -2.0], [1.0, 1.0, 1.0], [-3.0, 0.25, 0.0]] {
            let [x, y, z] = p;
            assert_eq!(e.eval(x, y, z, 0.0), h.eval(x, y, z, 1.0));
        }
    }

    #[test]
    fn test_scaling_law() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..300 {
            let e = random_expr(&mut rng, 3);
            let (h, d) = e.homogenize().unwrap();
            let p = Vector4::from_fn(|_, _| rng.gen_range(-1.0..1.0));
            let lambda: f64 = rng.gen_range(0.5..2.0);
            let lhs = h.eval_at(p * lambda);
            let rhs = lambda.powi(d as i32) * h.eval_at(p);
            assert!(
                (lhs - rhs).abs() <= 1e-9 * (1.0 + lhs.abs().max(rhs.abs())),
                "{h} (degree {d}): {lhs} != {rhs}"
            );
        }
    }
}
