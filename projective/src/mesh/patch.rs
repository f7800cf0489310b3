//! Affine patches covering projective space
use crate::expr::Var;
use nalgebra::{Vector3, Vector4};

/// One of the four affine charts of real projective 3-space
///
/// Each patch fixes one homogeneous coordinate to 1 and spans the other
/// three, so a local point `(a, b, c)` in the patch's sampling box maps to
/// `a·e1 + b·e2 + c·e3 + e4` in homogeneous coordinates.  Free coordinates
/// keep their `x, y, z, w` order; for example, the `X` patch maps
/// `(a, b, c)` to `(1, a, b, c)`.
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
pub enum Patch {
    /// The patch where `x = 1`
    X,
    /// The patch where `y = 1`
    Y,
    /// The patch where `z = 1`
    Z,
    /// The patch where `w = 1`, i.e. ordinary affine space
    W,
}

impl Patch {
    /// Returns the homogeneous coordinate fixed by this patch
    pub fn var(self) -> Var {
        match self {
            Patch::X => Var::X,
            Patch::Y => Var::Y,
            Patch::Z => Var::Z,
            Patch::W => Var::W,
        }
    }

    /// Returns the basis `[e1, e2, e3, e4]` for this patch
    ///
    /// `e1`, `e2`, and `e3` span the free coordinates; `e4` is the unit
    /// vector along the fixed coordinate.
    pub fn basis(self) -> [Vector4<f64>; 4] {
        let e = |i: usize| Vector4::ith(i, 1.0);
        match self {
            Patch::X => [e(1), e(2), e(3), e(0)],
            Patch::Y => [e(0), e(2), e(3), e(1)],
            Patch::Z => [e(0), e(1), e(3), e(2)],
            Patch::W => [e(0), e(1), e(2), e(3)],
        }
    }

    /// Maps a point in this patch's local coordinates to homogeneous space
    pub fn to_homogeneous(self, p: Vector3<f64>) -> Vector4<f64> {
        let [e1, e2, e3, e4] = self.basis();
        e1 * p.x + e2 * p.y + e3 * p.z + e4
    }

    /// Maps a homogeneous point into this patch's local coordinates
    ///
    /// Returns `None` if the point is on this patch's plane at infinity (i.e.
    /// its fixed coordinate is zero).
    pub fn to_local(self, p: Vector4<f64>) -> Option<Vector3<f64>> {
        let [e1, e2, e3, e4] = self.basis();
        let s = p.dot(&e4);
        (s != 0.0).then(|| Vector3::new(p.dot(&e1), p.dot(&e2), p.dot(&e3)) / s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_basis() {
        let p = Vector3::new(0.25, 0.5, 0.75);
        assert_eq!(
            Patch::X.to_homogeneous(p),
            Vector4::new(1.0, 0.25, 0.5, 0.75)
        );
        assert_eq!(
            Patch::Y.to_homogeneous(p),
            Vector4::new(0.25, 1.0, 0.5, 0.75)
        );
        assert_eq!(
            Patch::Z.to_homogeneous(p),
            Vector4::new(0.25, 0.5, 1.0, 0.75)
        );
        assert_eq!(
            Patch::W.to_homogeneous(p),
            Vector4::new(0.25, 0.5, 0.75, 1.0)
        );
    }

    #[test]
    fn test_round_trip() {
        let p = Vector3::new(-0.5, 0.125, 0.875);
        for patch in Patch::iter() {
            let h = patch.to_homogeneous(p);
            assert_eq!(h[patch.var().index()], 1.0);
            assert_eq!(patch.to_local(h * 2.0), Some(p));
        }
        let inf = Vector4::new(1.0, 2.0, 3.0, 0.0);
        assert_eq!(Patch::W.to_local(inf), None);
        assert_eq!(
            Patch::X.to_local(inf),
            Some(Vector3::new(2.0, 3.0, 0.0))
        );
    }
}
