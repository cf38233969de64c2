// Cluster hierarchy view.
//
// Turns condensed tree rows into a navigable parent -> children structure
// with node sizes, lambdas and the final flat cluster (if any) each node
// became. Both the text and the HTML reports render from this view.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::cluster::condensed::CondensedTree;

/// Read-only hierarchy derived from a condensed tree.
#[derive(Debug, Clone, Default)]
pub struct HierarchyView {
    children: HashMap<usize, Vec<usize>>,
    sizes: HashMap<usize, usize>,
    lambdas: HashMap<usize, f64>,
    node_cluster: HashMap<usize, usize>,
    roots: Vec<usize>,
}

/// One visible node (size > 1) of the hierarchy, with its visible children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: usize,
    pub size: usize,
    pub lambda: f64,
    pub cluster: Option<usize>,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyView {
    /// `cluster_map` maps final label -> condensed node id.
    pub fn build(tree: &CondensedTree, cluster_map: &BTreeMap<usize, usize>) -> Self {
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut direct: HashMap<usize, usize> = HashMap::new();
        let mut lambdas = HashMap::new();
        let mut seen_as_child = HashSet::new();
        let mut skipped = 0usize;

        for row in &tree.rows {
            if !tree.is_forward(row) {
                skipped += 1;
                continue;
            }
            children.entry(row.parent).or_default().push(row.child);
            // Later rows win, matching a keyed lookup over the rows.
            direct.insert(row.child, row.child_size);
            lambdas.insert(row.child, row.lambda);
            seen_as_child.insert(row.child);
        }
        if skipped > 0 {
            warn!(skipped, "Ignored condensed tree rows that point back up the tree");
        }

        let mut roots: Vec<usize> = children
            .keys()
            .filter(|p| !seen_as_child.contains(p))
            .copied()
            .collect();
        roots.sort_unstable_by(|a, b| b.cmp(a));

        let mut sizes = HashMap::new();
        let nodes: Vec<usize> = children.keys().chain(direct.keys()).copied().collect();
        for node in nodes {
            resolve_size(node, &children, &direct, &mut sizes);
        }

        let node_cluster = cluster_map
            .iter()
            .map(|(&label, &node)| (node, label))
            .collect();

        Self {
            children,
            sizes,
            lambdas,
            node_cluster,
            roots,
        }
    }

    /// Parents that never appear as a child, highest id first.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, node: usize) -> &[usize] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of points under `node`; 1 for anything unknown.
    pub fn node_size(&self, node: usize) -> usize {
        self.sizes.get(&node).copied().unwrap_or(1)
    }

    /// Lambda at which `node` left its parent; 0 for roots.
    pub fn lambda(&self, node: usize) -> f64 {
        self.lambdas.get(&node).copied().unwrap_or(0.0)
    }

    /// The final flat cluster this node became, if it was selected.
    pub fn cluster_of(&self, node: usize) -> Option<usize> {
        self.node_cluster.get(&node).copied()
    }

    pub fn has_visible_children(&self, node: usize) -> bool {
        self.children(node).iter().any(|&c| self.node_size(c) > 1)
    }

    /// Nested visible nodes, one entry per visible root.
    pub fn tree(&self) -> Vec<HierarchyNode> {
        self.roots.iter().filter_map(|&r| self.node(r)).collect()
    }

    /// The visible subtree rooted at `id`, or `None` for size <= 1 nodes.
    pub fn node(&self, id: usize) -> Option<HierarchyNode> {
        let size = self.node_size(id);
        if size <= 1 {
            return None;
        }
        Some(HierarchyNode {
            id,
            size,
            lambda: self.lambda(id),
            cluster: self.cluster_of(id),
            children: self
                .children(id)
                .iter()
                .filter_map(|&c| self.node(c))
                .collect(),
        })
    }
}

impl HierarchyNode {
    pub fn has_visible_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// This node plus every visible descendant.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }
}

fn resolve_size(
    node: usize,
    children: &HashMap<usize, Vec<usize>>,
    direct: &HashMap<usize, usize>,
    memo: &mut HashMap<usize, usize>,
) -> usize {
    if let Some(&s) = memo.get(&node) {
        return s;
    }
    if let Some(&s) = direct.get(&node) {
        memo.insert(node, s);
        return s;
    }
    let Some(kids) = children.get(&node) else {
        return 1;
    };
    let size = kids
        .iter()
        .map(|&c| resolve_size(c, children, direct, memo))
        .sum();
    memo.insert(node, size);
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::condensed::CondensedRow;

    fn row(parent: usize, child: usize, lambda: f64, child_size: usize) -> CondensedRow {
        CondensedRow {
            parent,
            child,
            lambda,
            child_size,
        }
    }

    /// Root 6 splits into 7 {0,1,2} and 8 {3,4,5}.
    fn two_cluster_tree() -> CondensedTree {
        CondensedTree::new(
            6,
            vec![
                row(6, 7, 0.5, 3),
                row(6, 8, 0.5, 3),
                row(7, 0, 2.0, 1),
                row(7, 1, 2.0, 1),
                row(7, 2, 1.0, 1),
                row(8, 3, 3.0, 1),
                row(8, 4, 3.0, 1),
                row(8, 5, 3.0, 1),
            ],
        )
    }

    #[test]
    fn sizes_lambdas_and_roots() {
        let map = BTreeMap::from([(0, 7), (1, 8)]);
        let view = HierarchyView::build(&two_cluster_tree(), &map);
        assert_eq!(view.roots(), &[6]);
        assert_eq!(view.node_size(6), 6);
        assert_eq!(view.node_size(7), 3);
        assert_eq!(view.node_size(0), 1);
        assert_eq!(view.lambda(6), 0.0);
        assert_eq!(view.lambda(8), 0.5);
        assert_eq!(view.cluster_of(8), Some(1));
        assert_eq!(view.cluster_of(6), None);
        assert_eq!(view.children(6), &[7, 8]);
    }

    #[test]
    fn point_children_are_hidden() {
        let view = HierarchyView::build(&two_cluster_tree(), &BTreeMap::new());
        assert!(view.has_visible_children(6));
        assert!(!view.has_visible_children(7));
        let tree = view.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].count(), 3);
        assert!(tree[0].children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn multiple_roots_sorted_descending() {
        let tree = CondensedTree::new(
            4,
            vec![
                row(4, 0, 1.0, 1),
                row(4, 1, 1.0, 1),
                row(5, 2, 1.0, 1),
                row(5, 3, 1.0, 1),
            ],
        );
        let view = HierarchyView::build(&tree, &BTreeMap::new());
        assert_eq!(view.roots(), &[5, 4]);
        assert_eq!(view.node_size(5), 2);
    }

    #[test]
    fn backward_rows_are_ignored() {
        // 7 -> 8 -> 7 would loop forever if followed
        let mut tree = two_cluster_tree();
        tree.rows.push(row(8, 7, 0.5, 3));
        tree.rows.push(row(2, 6, 0.5, 6));
        let view = HierarchyView::build(&tree, &BTreeMap::new());
        assert_eq!(view.roots(), &[6]);
        assert_eq!(view.children(8), &[3, 4, 5]);
        assert!(view.children(2).is_empty());
        assert_eq!(view.node_size(6), 6);
        assert_eq!(view.tree()[0].count(), 3);
    }

    #[test]
    fn empty_tree_has_no_nodes() {
        let view = HierarchyView::build(&CondensedTree::default(), &BTreeMap::new());
        assert!(view.roots().is_empty());
        assert!(view.tree().is_empty());
    }
}
