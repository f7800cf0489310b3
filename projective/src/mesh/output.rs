//! Mesh output implementation
use super::Mesh;
use nalgebra::{Vector3, Vector4};
use std::io::{BufWriter, Write};

/// Triangles with a vertex this close to the plane at infinity are skipped
const MIN_W: f32 = 1e-3;

impl Mesh {
    /// Writes a binary STL to the given output
    ///
    /// Homogeneous vertices are projected into affine space by dividing by
    /// `w`.  Triangles which touch (or nearly touch) the plane `w = 0` have
    /// no affine image and are left out of the file.
    pub fn write_stl<F: std::io::Write>(
        &self,
        out: &mut F,
    ) -> Result<(), crate::Error> {
        let tris: Vec<[Vector3<f32>; 3]> = self
            .triangles()
            .filter_map(|t| {
                let [a, b, c] = t.map(project);
                Some([a?, b?, c?])
            })
            .collect();
        log::debug!(
            "writing {} of {} triangles to STL",
            tris.len(),
            self.triangle_count()
        );

        // Lots of small writes follow, usually into a file
        let mut out = BufWriter::new(out);
        const HEADER: &[u8] = b"Binary STL of a projective surface (affine w = 1 view)";
        static_assertions::const_assert!(HEADER.len() <= 80);
        out.write_all(HEADER)?;
        out.write_all(&[0u8; 80 - HEADER.len()])?;
        out.write_all(&(tris.len() as u32).to_le_bytes())?;
        for [a, b, c] in &tris {
            let normal = (b - a).cross(&(c - a));
            for p in normal.iter().chain(a.iter()).chain(b.iter()).chain(c.iter())
            {
                out.write_all(&p.to_le_bytes())?;
            }
            out.write_all(&[0u8; std::mem::size_of::<u16>()])?; // attributes
        }
        out.flush()?;
        Ok(())
    }
}

fn project(v: Vector4<f32>) -> Option<Vector3<f32>> {
    (v.w.abs() >= MIN_W).then(|| v.xyz() / v.w)
}
