// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Horizontal layouts of the visible tree.
//!
//! Positions are `(depth axis, breadth axis)`: the root sits at `x = 0` and
//! leaves spread along `y`.

use kurbo::{Point, Size};

use super::tree::Tree;

impl Tree {
    /// Places visible nodes by depth. Leaf slot `i` of `n` sits at
    /// `(i + 0.5) / n × size.height`; parents sit at the midpoint of their
    /// first and last visible child.
    pub fn layout_tidy(&mut self, size: Size) {
        self.layout(size, false);
    }

    /// Like [`layout_tidy`](Self::layout_tidy), but every leaf is aligned at
    /// `x = size.width` and parents step back by subtree height.
    pub fn layout_cluster(&mut self, size: Size) {
        self.layout(size, true);
    }

    fn layout(&mut self, size: Size, align_leaves: bool) {
        let order = self.visible_preorder();
        let mut breadth = vec![0.0_f64; self.nodes.len()];
        let mut height = vec![0_u32; self.nodes.len()];

        let leaves: Vec<u32> = order
            .iter()
            .copied()
            .filter(|&idx| self.nodes[idx as usize].children.is_empty())
            .collect();
        let n = leaves.len().max(1) as f64;
        for (i, &leaf) in leaves.iter().enumerate() {
            breadth[leaf as usize] = (i as f64 + 0.5) / n * size.height;
        }

        for &idx in order.iter().rev() {
            let children = &self.nodes[idx as usize].children;
            if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
                breadth[idx as usize] = (breadth[first as usize] + breadth[last as usize]) / 2.0;
                height[idx as usize] = 1 + children
                    .iter()
                    .map(|&c| height[c as usize])
                    .max()
                    .unwrap_or(0);
            }
        }

        let root_depth = self.nodes[self.root as usize].depth;
        let max_depth = order
            .iter()
            .map(|&idx| self.nodes[idx as usize].depth - root_depth)
            .max()
            .unwrap_or(0);
        let root_height = height[self.root as usize];

        for &idx in &order {
            let depth_pos = if align_leaves {
                if root_height == 0 {
                    0.0
                } else {
                    f64::from(root_height - height[idx as usize]) / f64::from(root_height)
                        * size.width
                }
            } else if max_depth == 0 {
                0.0
            } else {
                f64::from(self.nodes[idx as usize].depth - root_depth) / f64::from(max_depth)
                    * size.width
            };
            let node = &mut self.nodes[idx as usize];
            node.previous = node.position;
            node.position = Point::new(depth_pos, breadth[idx as usize]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::TreeRecord;

    fn sample() -> Tree {
        Tree::stratify([
            TreeRecord::new("r", None),
            TreeRecord::new("a", Some("r")),
            TreeRecord::new("a1", Some("a")),
            TreeRecord::new("a2", Some("a")),
            TreeRecord::new("b", Some("r")),
        ])
        .unwrap()
    }

    fn pos(tree: &Tree, key: &str) -> Point {
        tree.position(tree.find(key).unwrap())
    }

    #[test]
    fn tidy_spreads_leaves_evenly() {
        let mut tree = sample();
        tree.layout_tidy(Size::new(200.0, 300.0));
        assert_eq!(pos(&tree, "a1"), Point::new(200.0, 50.0));
        assert_eq!(pos(&tree, "a2"), Point::new(200.0, 150.0));
        assert_eq!(pos(&tree, "b"), Point::new(100.0, 250.0), "leaf at its own depth");
        assert_eq!(pos(&tree, "a"), Point::new(100.0, 100.0), "midpoint of children");
        assert_eq!(pos(&tree, "r"), Point::new(0.0, 175.0));
    }

    #[test]
    fn cluster_aligns_leaves() {
        let mut tree = sample();
        tree.layout_cluster(Size::new(200.0, 300.0));
        assert_eq!(pos(&tree, "b").x, 200.0, "shallow leaf pushed to the edge");
        assert_eq!(pos(&tree, "a").x, 100.0);
        assert_eq!(pos(&tree, "r").x, 0.0);
    }

    #[test]
    fn previous_position_is_remembered() {
        let mut tree = sample();
        tree.layout_tidy(Size::new(200.0, 300.0));
        let before = pos(&tree, "b");
        let a = tree.find("a").unwrap();
        tree.toggle_collapse(a);
        tree.layout_tidy(Size::new(200.0, 300.0));
        let b = tree.find("b").unwrap();
        assert_eq!(tree.previous_position(b), before);
        assert_eq!(tree.visible_leaf_count(), 2);
        assert_eq!(tree.position(b).y, 225.0);
    }

    #[test]
    fn single_node_sits_at_origin_column() {
        let mut tree = Tree::stratify([TreeRecord::new("r", None)]).unwrap();
        tree.layout_cluster(Size::new(10.0, 10.0));
        assert_eq!(tree.position(tree.root()), Point::new(0.0, 5.0));
    }
}
