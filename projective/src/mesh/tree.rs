//! Bounded-depth subdivision of a single patch
use super::{Mesh, Settings, cell::CellBounds, leaf::Leaf, patch::Patch};
use crate::{Error, expr::Polynomial};
use log::debug;

/// Subdivision tree for one patch
///
/// Interior nodes own their (non-empty) children; leaves own triangles.
/// Subtrees which produced no triangles are pruned during construction, so
/// every `Node` has at least one child and every `Leaf` is non-empty.
#[derive(Clone, Debug)]
pub enum MeshTree {
    /// Interior node, with between 1 and `r³` children
    Node(Vec<MeshTree>),
    /// Bottom-level box
    Leaf(Leaf),
}

impl MeshTree {
    /// Builds the tree for one patch
    ///
    /// Returns `Ok(None)` if the surface doesn't pass through the patch's
    /// sampling box (at the sampling resolution).
    pub fn build(
        poly: &Polynomial,
        patch: Patch,
        settings: &Settings,
    ) -> Result<Option<Self>, Error> {
        settings.validate()?;
        let root = CellBounds::new(settings.min, settings.max);
        let out = Self::build_cell(poly, patch, &root, 1, settings);
        match &out {
            Some(t) => debug!(
                "patch {patch}: {} leaves, {} triangles",
                t.leaf_count(),
                t.triangle_count()
            ),
            None => debug!("patch {patch} is empty"),
        }
        Ok(out)
    }

    fn build_cell(
        poly: &Polynomial,
        patch: Patch,
        bounds: &CellBounds,
        depth: u8,
        settings: &Settings,
    ) -> Option<Self> {
        let res = settings.branch_factor_at(depth) as usize;
        if depth >= settings.depth {
            let leaf =
                Leaf::build(poly, patch, bounds, res, settings.debug_lines);
            (!leaf.is_empty()).then_some(MeshTree::Leaf(leaf))
        } else {
            let children: Vec<_> = bounds
                .children(res)
                .filter_map(|c| {
                    Self::build_cell(poly, patch, &c, depth + 1, settings)
                })
                .collect();
            (!children.is_empty()).then_some(MeshTree::Node(children))
        }
    }

    /// Returns the children of an interior node (or an empty slice)
    pub fn children(&self) -> &[MeshTree] {
        match self {
            MeshTree::Node(c) => c,
            MeshTree::Leaf(..) => &[],
        }
    }

    /// Iterates over every leaf in the tree, in construction order
    pub fn leaves(&self) -> Box<dyn Iterator<Item = &Leaf> + '_> {
        match self {
            MeshTree::Node(c) => Box::new(c.iter().flat_map(|c| c.leaves())),
            MeshTree::Leaf(leaf) => Box::new(std::iter::once(leaf)),
        }
    }

    /// Returns the number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Returns the number of triangles in the tree
    pub fn triangle_count(&self) -> usize {
        self.leaves().map(Leaf::triangle_count).sum()
    }

    /// Appends this tree's triangles and debug lines to a mesh
    pub fn collect(&self, out: &mut Mesh) {
        for leaf in self.leaves() {
            out.vertices.extend_from_slice(&leaf.vertices);
            out.gradients.extend_from_slice(&leaf.gradients);
            out.debug.vertices.extend_from_slice(&leaf.debug.vertices);
            out.debug.colors.extend_from_slice(&leaf.debug.colors);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn settings(depth: u8) -> Settings<'static> {
        Settings {
            depth,
            threads: None,
            ..Default::default()
        }
    }

    /// Checks that no subtree is empty
    fn check_pruned(t: &MeshTree) {
        match t {
            MeshTree::Node(c) => {
                assert!(!c.is_empty());
                c.iter().for_each(check_pruned);
            }
            MeshTree::Leaf(leaf) => assert!(!leaf.is_empty()),
        }
    }

    fn depth(t: &MeshTree) -> usize {
        match t {
            MeshTree::Node(c) => 1 + c.iter().map(depth).max().unwrap(),
            MeshTree::Leaf(..) => 1,
        }
    }

    #[test]
    fn test_sphere_tree() {
        let poly = Polynomial::new("2x^2 + 2y^2 + 2z^2 - 1").unwrap();
        for d in 1..=4 {
            let t = MeshTree::build(&poly, Patch::W, &settings(d))
                .unwrap()
                .unwrap();
            check_pruned(&t);
            assert_eq!(depth(&t), d as usize);
            assert!(t.children().len() <= 8);
        }
    }

    #[test]
    fn test_pruning() {
        // A small sphere is only seen by a few of the 64 possible leaves
        let poly = Polynomial::new("16x^2 + 16y^2 + 16z^2 - 1").unwrap();
        let t = MeshTree::build(&poly, Patch::W, &settings(3))
            .unwrap()
            .unwrap();
        check_pruned(&t);
        assert!(t.leaf_count() < 64);

        // Only the 8 interior children around the origin survive
        assert_eq!(t.children().len(), 8);
    }

    #[test]
    fn test_empty_patch() {
        let poly = Polynomial::new("x^2 + y^2 + z^2 + w^2").unwrap();
        for patch in [Patch::X, Patch::W] {
            let t = MeshTree::build(&poly, patch, &settings(3)).unwrap();
            assert!(t.is_none());
        }
    }

    #[test]
    fn test_bad_settings() {
        let poly = Polynomial::new("x").unwrap();
        let s = Settings {
            depth: 0,
            ..settings(1)
        };
        assert!(matches!(
            MeshTree::build(&poly, Patch::W, &s),
            Err(Error::BadDepth)
        ));
    }

    #[test]
    fn test_collect() {
        let poly = Polynomial::new("x + y + z").unwrap();
        let s = Settings {
            debug_lines: true,
            ..settings(2)
        };
        let t = MeshTree::build(&poly, Patch::W, &s).unwrap().unwrap();
        let mut mesh = Mesh::default();
        t.collect(&mut mesh);
        assert_eq!(mesh.triangle_count(), t.triangle_count());
        assert_eq!(mesh.vertices.len(), mesh.gradients.len());

        // Each leaf has 2³ cells with 24 line endpoints each
        assert_eq!(mesh.debug.vertices.len(), t.leaf_count() * 8 * 24);
    }
}
