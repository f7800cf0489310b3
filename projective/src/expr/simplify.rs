//! Algebraic cleanup of expression trees
use super::{Expr, Opcode};

impl Expr {
    /// Returns a simplified copy of this expression
    ///
    /// Children are simplified first.  Any node whose children are both
    /// numeric is folded into a single (rounded) integer constant, unless the
    /// result doesn't fit in an `i64` (in which case it's left as-is);
    /// otherwise,
    /// the identities `0 + a`, `a + 0`, `a - 0`, `0 * a`, `a * 0`, `1 * a`,
    /// `a * 1`, `a ^ 1`, `a ^ 0`, `1 ^ a` and `0 ^ a` are elided.
    ///
    /// The result evaluates to the same value as the input everywhere, and
    /// simplifying it again is a no-op.
    pub fn simplify(&self) -> Expr {
        let Expr::Binary(op, a, b) = self else {
            return self.clone();
        };
        let a = a.simplify();
        let b = b.simplify();

        if a.is_numeric() && b.is_numeric() {
            let v = op
                .apply(a.eval(0.0, 0.0, 0.0, 0.0), b.eval(0.0, 0.0, 0.0, 0.0))
                .round();
            // `as` saturates, which would silently change the polynomial
            if v.is_finite() && v.abs() < i64::MAX as f64 {
                return Expr::Const(v as i64);
            }
            return Expr::binary(*op, a, b);
        }

        match *op {
            Opcode::Add if a.is_zero() => b,
            Opcode::Add | Opcode::Sub if b.is_zero() => a,

            Opcode::Mul if a.is_zero() || b.is_zero() => Expr::Const(0),
            Opcode::Mul if a.is_one() => b,
            Opcode::Mul if b.is_one() => a,

            Opcode::Pow if b.is_one() => a,
            Opcode::Pow if b.is_zero() => Expr::Const(1),
            Opcode::Pow if a.is_one() => Expr::Const(1),
            Opcode::Pow if a.is_zero() => Expr::Const(0),

            op => Expr::binary(op, a, b),
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::{Var, test::random_expr};
    use super::*;
    use nalgebra::Vector4;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_folding() {
        let e = (Expr::Const(2) + 3) * Expr::Const(2).pow(3);
        assert_eq!(e.simplify(), Expr::Const(40));

        let e = Expr::Const(3) - 5;
        assert_eq!(e.simplify(), Expr::Const(-2));
    }

    #[test]
    fn test_folding_out_of_range() {
        // 2^70 doesn't fit in an i64, so it stays a power
        let big = Expr::Const(2).pow(70);
        assert_eq!(big.simplify(), big);
        assert_eq!(big.simplify().eval(0.0, 0.0, 0.0, 0.0), 2f64.powi(70));

        // Children are still folded where they fit
        let e = (Expr::Const(1) + 1).pow(Expr::Const(7) * 10);
        assert_eq!(e.simplify(), big);
        assert_eq!(e.simplify().simplify(), e.simplify());

        // A parent that lands back in range is folded
        let e = Expr::Const(2).pow(70) - Expr::Const(2).pow(70);
        assert_eq!(e.simplify(), Expr::Const(0));
    }

    #[test]
    fn test_identities() {
        let x = || Expr::var(Var::X);
        assert_eq!((0 + x()).simplify(), x());
        assert_eq!((x() + 0).simplify(), x());
        assert_eq!((x() - 0).simplify(), x());
        assert_eq!((0 * x()).simplify(), Expr::Const(0));
        assert_eq!((x() * 0).simplify(), Expr::Const(0));
        assert_eq!((1 * x()).simplify(), x());
        assert_eq!((x() * 1).simplify(), x());
        assert_eq!(x().pow(1).simplify(), x());
        assert_eq!(x().pow(0).simplify(), Expr::Const(1));
        assert_eq!(Expr::Const(1).pow(x()).simplify(), Expr::Const(1));
        assert_eq!(Expr::Const(0).pow(x()).simplify(), Expr::Const(0));

        // 0 - a is not an identity
        let e = (0 - x()).simplify();
        assert_eq!(e, Expr::binary(Opcode::Sub, Expr::Const(0), x()));
    }

    #[test]
    fn test_nested() {
        // d/dx of x^2 is (2 * 1) * x^(2 - 1), which should become 2x
        let e = Expr::var(Var::X).pow(2).derivative(Var::X);
        assert_eq!(e.simplify(), 2 * Expr::var(Var::X));

        let e = (Expr::var(Var::Y) * (Expr::Const(3) - 3) + Var::Z) * 1;
        assert_eq!(e.simplify(), Expr::var(Var::Z));
    }

    #[test]
    fn test_simplify_random() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..500 {
            let e = random_expr(&mut rng, 4);
            let s = e.simplify();
            assert_eq!(s.simplify(), s, "simplify is not idempotent on {e}");

            let p = Vector4::from_fn(|_, _| rng.gen_range(-1.0..1.0));
            let (a, b) = (e.eval_at(p), s.eval_at(p));
            assert!(
                (a - b).abs() <= 1e-9 * (1.0 + a.abs()),
                "{e} => {s}: {a} != {b}"
            );
        }
    }
}
