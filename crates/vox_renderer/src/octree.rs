//! Bracket octree over a volume grid.
//!
//! Every node records which density brackets occur anywhere inside it, so
//! the free-flight sampler can skip regions whose brackets are all disabled
//! and bound the extinction inside a leaf. Nodes live in a flat arena and
//! refer to their children by index.

use vox_core::{BracketTable, Volume};
use vox_math::BoundingBox;

/// Child slot value of a leaf.
pub const NO_CHILD: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub bbox: BoundingBox,
    /// Children in [`BoundingBox::octant`] order
    pub children: [u32; 8],
    pub is_leaf: bool,
    /// Bit `i` set when bracket `i` occurs inside the node
    pub mask: u32,
}

/// Immutable octree built once per volume and settings.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
}

impl Octree {
    /// Subdivide the grid bounds `levels` times, collapsing nodes whose
    /// eight children are leaves sharing one mask.
    pub fn build(grid: &Volume, brackets: &BracketTable, levels: u32) -> Self {
        let mut nodes = Vec::new();
        build_node(&mut nodes, grid, brackets, grid.bounds(), levels);

        let octree = Self { nodes };
        log::info!(
            "Built volume octree: {} nodes, {} leaves, {} levels",
            octree.nodes.len(),
            octree.nodes.iter().filter(|n| n.is_leaf).count(),
            levels
        );
        octree
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: u32) -> &OctreeNode {
        &self.nodes[index as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf)
    }
}

fn build_node(
    nodes: &mut Vec<OctreeNode>,
    grid: &Volume,
    brackets: &BracketTable,
    bbox: BoundingBox,
    levels: u32,
) -> u32 {
    let index = nodes.len() as u32;
    nodes.push(OctreeNode {
        bbox,
        children: [NO_CHILD; 8],
        is_leaf: true,
        mask: 0,
    });

    // Stop at the requested depth or once nodes are about a voxel wide
    if levels == 0 || bbox.size().min_element() <= 1.0 {
        nodes[index as usize].mask = leaf_mask(grid, brackets, &bbox);
        return index;
    }

    let mut children = [NO_CHILD; 8];
    for (octant, child) in children.iter_mut().enumerate() {
        *child = build_node(nodes, grid, brackets, bbox.octant(octant), levels - 1);
    }

    let first = nodes[children[0] as usize].mask;
    if children
        .iter()
        .all(|&c| nodes[c as usize].is_leaf && nodes[c as usize].mask == first)
    {
        // Drop the whole subtree; it was pushed right after this node
        nodes.truncate(index as usize + 1);
        nodes[index as usize].mask = first;
        return index;
    }

    let mask = children.iter().fold(0, |m, &c| m | nodes[c as usize].mask);
    let node = &mut nodes[index as usize];
    node.mask = mask;
    node.children = children;
    node.is_leaf = false;
    index
}

/// Brackets reachable by trilinear samples inside `bbox`.
fn leaf_mask(grid: &Volume, brackets: &BracketTable, bbox: &BoundingBox) -> u32 {
    let lo = bbox.min.floor().as_ivec3() - 1;
    let hi = bbox.max.ceil().as_ivec3();

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let v = grid.voxel(x as isize, y as isize, z as isize);
                min = min.min(v);
                max = max.max(v);
            }
        }
    }
    brackets.mask_between(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::{TfNode, TransferFunction};
    use vox_math::Vec3;

    fn brackets() -> BracketTable {
        let tf = TransferFunction::new(vec![
            TfNode::new(0.0, 0.0, Vec3::ZERO),
            TfNode::new(1.0, 1.0, Vec3::ONE),
        ]);
        BracketTable::new(vec![0.0, 0.5, 2.0], &tf)
    }

    #[test]
    fn test_uniform_volume_collapses_to_root() {
        let grid = Volume::from_fn(16, 16, 16, |_, _, _| 0.2).unwrap();
        let octree = Octree::build(&grid, &brackets(), 3);
        assert_eq!(octree.len(), 1);
        assert!(octree.root().is_leaf);
        assert_eq!(octree.root().mask, 0b01);
    }

    #[test]
    fn test_half_filled_volume_splits() {
        // Dense only where x >= 8
        let grid = Volume::from_fn(16, 16, 16, |x, _, _| if x >= 8 { 1.0 } else { 0.0 }).unwrap();
        let octree = Octree::build(&grid, &brackets(), 2);

        let root = octree.root();
        assert!(!root.is_leaf);
        assert_eq!(root.mask, 0b11);

        // Deep inside the empty half only the low bracket occurs
        let low = octree.node(root.children[0]);
        assert!(low.bbox.max.x <= 8.0);
        let far_low = octree
            .leaves()
            .find(|n| n.bbox.max.x <= 4.0)
            .map(|n| n.mask);
        assert_eq!(far_low, Some(0b01));
        assert_eq!(low.mask & 0b01, 0b01);
    }

    #[test]
    fn test_children_masks_are_covered_by_parent() {
        let grid = Volume::from_fn(8, 8, 8, |x, y, z| ((x * y + z) % 3) as f32 * 0.5).unwrap();
        let octree = Octree::build(&grid, &brackets(), 3);
        for i in 0..octree.len() as u32 {
            let node = octree.node(i);
            if node.is_leaf {
                assert!(node.children.iter().all(|&c| c == NO_CHILD));
                continue;
            }
            for &c in &node.children {
                assert_eq!(octree.node(c).mask & !node.mask, 0);
            }
        }
    }

    #[test]
    fn test_leaf_mask_bounds_every_sample() {
        let grid = Volume::from_fn(8, 8, 8, |x, _, _| x as f32 / 7.0).unwrap();
        let table = brackets();
        let octree = Octree::build(&grid, &table, 2);
        for leaf in octree.leaves() {
            for i in 0..5 {
                let t = i as f32 / 4.0;
                let p = leaf.bbox.min + (leaf.bbox.max - leaf.bbox.min) * t;
                let v = grid.sample(p);
                let mask = table.mask_between(v, v);
                assert_eq!(mask & !leaf.mask, 0, "sample {v} outside leaf mask");
            }
        }
    }
}
