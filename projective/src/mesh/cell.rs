//! Axis-aligned sampling boxes in patch-local coordinates
use nalgebra::Vector3;

/// An axis-aligned box in a patch's local coordinates
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellBounds {
    /// Lower corner
    pub min: Vector3<f64>,
    /// Upper corner
    pub max: Vector3<f64>,
}

impl CellBounds {
    /// Builds a new box
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Returns a point on the lattice which splits this box into `n` steps
    /// per axis
    ///
    /// Lattice points on the box's boundary are exactly `min` or `max` on the
    /// relevant axes, so neighboring boxes agree bit-for-bit on the
    /// positions (and therefore the samples) that they share.
    pub fn lattice(&self, [i, j, k]: [usize; 3], n: usize) -> Vector3<f64> {
        Vector3::new(
            lerp(self.min.x, self.max.x, i, n),
            lerp(self.min.y, self.max.y, j, n),
            lerp(self.min.z, self.max.z, k, n),
        )
    }

    /// Iterates over the `n³` child boxes of this box
    pub fn children(&self, n: usize) -> impl Iterator<Item = CellBounds> + '_ {
        (0..n).flat_map(move |k| {
            (0..n).flat_map(move |j| {
                (0..n).map(move |i| CellBounds {
                    min: self.lattice([i, j, k], n),
                    max: self.lattice([i + 1, j + 1, k + 1], n),
                })
            })
        })
    }
}

fn lerp(lo: f64, hi: f64, i: usize, n: usize) -> f64 {
    if i == n {
        hi
    } else {
        lo + (hi - lo) * (i as f64 / n as f64)
    }
}
