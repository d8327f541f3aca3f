// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Agglomerative clustering of matrix rows.
//!
//! [`hcluster`] repeatedly merges the two closest clusters (Euclidean
//! distance between rows, combined by the chosen [`Linkage`]) until one
//! remains. The result is a binary [`Dendrogram`] whose in-order leaf
//! sequence gives display positions.

use kurbo::Point;

/// How the distance between two clusters is derived from row distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Linkage {
    /// Closest pair of rows.
    Single,
    /// Farthest pair of rows.
    Complete,
    /// Mean over all row pairs.
    #[default]
    Average,
}

/// One node of a [`Dendrogram`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    /// `(left, right)` node indices for merges, `None` for leaves.
    pub children: Option<(usize, usize)>,
    /// Input row index for leaves.
    pub leaf: Option<usize>,
    /// Linkage distance at which the children merged (`0` for leaves).
    pub distance: f64,
    /// Number of leaves below this node.
    pub size: usize,
    /// Ordering score: the row mean for leaves; for merges, the size-weighted
    /// mean until [`Dendrogram::sort_by_mean`] replaces it with the left
    /// child's score.
    pub score: f64,
}

/// A binary cluster tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    nodes: Vec<ClusterNode>,
    root: usize,
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn row_mean(row: &[f64]) -> f64 {
    if row.is_empty() {
        0.0
    } else {
        row.iter().sum::<f64>() / row.len() as f64
    }
}

/// Clusters `rows`. Returns `None` when there are no rows.
#[must_use]
pub fn hcluster(rows: &[Vec<f64>], linkage: Linkage) -> Option<Dendrogram> {
    let n = rows.len();
    if n == 0 {
        return None;
    }
    let mut nodes: Vec<ClusterNode> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| ClusterNode {
            children: None,
            leaf: Some(i),
            distance: 0.0,
            size: 1,
            score: row_mean(row),
        })
        .collect();

    let mut dist = vec![vec![0.0_f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&rows[i], &rows[j]);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    // Slot `s` holds the cluster whose node index is `slot_node[s]`.
    let mut slot_node: Vec<usize> = (0..n).collect();
    let mut active = vec![true; n];
    for _ in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in (0..n).filter(|&a| active[a]) {
            for b in ((a + 1)..n).filter(|&b| active[b]) {
                if best.is_none_or(|(_, _, d)| dist[a][b] < d) {
                    best = Some((a, b, dist[a][b]));
                }
            }
        }
        let Some((a, b, d)) = best else {
            break;
        };

        let (left, right) = (slot_node[a], slot_node[b]);
        let (sa, sb) = (nodes[left].size, nodes[right].size);
        for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
            let merged = match linkage {
                Linkage::Single => dist[a][k].min(dist[b][k]),
                Linkage::Complete => dist[a][k].max(dist[b][k]),
                Linkage::Average => {
                    (sa as f64 * dist[a][k] + sb as f64 * dist[b][k]) / (sa + sb) as f64
                }
            };
            dist[a][k] = merged;
            dist[k][a] = merged;
        }
        active[b] = false;

        let score = (sa as f64 * nodes[left].score + sb as f64 * nodes[right].score)
            / (sa + sb) as f64;
        nodes.push(ClusterNode {
            children: Some((left, right)),
            leaf: None,
            distance: d,
            size: sa + sb,
            score,
        });
        slot_node[a] = nodes.len() - 1;
    }

    let root = nodes.len() - 1;
    Some(Dendrogram { nodes, root })
}

impl Dendrogram {
    /// Returns the root node index.
    #[must_use]
    pub fn root(&self) -> usize {
        self.root
    }

    /// Returns all nodes; leaves come first, in input order.
    #[must_use]
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes[self.root].size
    }

    /// Orders every merge so the child with the higher score is on the left.
    ///
    /// A merge takes its left child's score afterwards, so a branch sorts by
    /// the best-scoring leaf it contains.
    pub fn sort_by_mean(&mut self) {
        // Merge nodes are pushed after their children, so index order is a
        // valid post-order.
        for i in 0..self.nodes.len() {
            if let Some((left, right)) = self.nodes[i].children {
                let (l, r) = if self.nodes[left].score < self.nodes[right].score {
                    (right, left)
                } else {
                    (left, right)
                };
                self.nodes[i].children = Some((l, r));
                self.nodes[i].score = self.nodes[l].score;
            }
        }
    }

    /// Returns the input row indices in left-to-right leaf order.
    #[must_use]
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.leaf_count());
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if let Some(leaf) = node.leaf {
                out.push(leaf);
            }
            if let Some((left, right)) = node.children {
                stack.push(right);
                stack.push(left);
            }
        }
        out
    }

    /// Returns the number of edges on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 0_usize)];
        while let Some((i, d)) = stack.pop() {
            max = max.max(d);
            if let Some((left, right)) = self.nodes[i].children {
                stack.push((left, d + 1));
                stack.push((right, d + 1));
            }
        }
        max
    }

    /// Returns `(parent, child)` node index pairs.
    #[must_use]
    pub fn links(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.children.map(|(l, r)| [(i, l), (i, r)]))
            .flatten()
            .collect()
    }

    /// Cluster layout, indexed by node: `x` along the leaves (slot `i` of `n`
    /// at `(i + 0.5) / n × breadth`), `y` from the root (`0`) to the aligned
    /// leaves (`extent`), stepping back by subtree height.
    #[must_use]
    pub fn layout(&self, breadth: f64, extent: f64) -> Vec<Point> {
        let mut pos = vec![Point::ZERO; self.nodes.len()];
        let mut height = vec![0_usize; self.nodes.len()];
        let n = self.leaf_count().max(1) as f64;
        for (slot, leaf) in self.leaf_order().into_iter().enumerate() {
            pos[leaf].x = (slot as f64 + 0.5) / n * breadth;
        }
        for i in 0..self.nodes.len() {
            if let Some((l, r)) = self.nodes[i].children {
                pos[i].x = (pos[l].x + pos[r].x) / 2.0;
                height[i] = 1 + height[l].max(height[r]);
            }
        }
        let root_height = height[self.root];
        for i in 0..self.nodes.len() {
            pos[i].y = if root_height == 0 {
                extent
            } else {
                (root_height - height[i]) as f64 / root_height as f64 * extent
            };
        }
        pos
    }
}
