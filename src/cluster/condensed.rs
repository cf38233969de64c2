// Condensed cluster tree.
//
// The single-linkage hierarchy is collapsed so that a split only counts when
// both sides keep at least `min_cluster_size` points; everything smaller
// "falls out" of its parent as individual points. Each row records the
// parent cluster, the child (point or cluster), the lambda (1 / distance) at
// which the child left, and the child's size.
//
// Point ids are 0..n and cluster ids start at n, so the root is always n.
// Children always get larger ids than their parents, which lets the
// bottom-up passes below just walk ids in descending order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ClusterError;
use super::params::SelectionMethod;

/// One edge of the condensed tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CondensedRow {
    pub parent: usize,
    pub child: usize,
    #[serde(rename = "lambda_val", with = "lambda_serde")]
    pub lambda: f64,
    pub child_size: usize,
}

/// A node of the single-linkage tree; node `i` lives at index `i - n`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinkageNode {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CondensedTree {
    pub n_points: usize,
    pub rows: Vec<CondensedRow>,
}

impl CondensedTree {
    pub fn new(n_points: usize, rows: Vec<CondensedRow>) -> Self {
        Self { n_points, rows }
    }

    pub fn root(&self) -> usize {
        self.n_points
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the row hangs a point, or a cluster with a larger id, off a
    /// cluster node. Trees made only of such rows cannot contain a cycle.
    pub fn is_forward(&self, row: &CondensedRow) -> bool {
        row.parent >= self.n_points && (row.child < self.n_points || row.child > row.parent)
    }

    /// Check that the rows form one tree rooted at `n_points`.
    pub fn check_structure(&self) -> Result<(), ClusterError> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let n = self.n_points;
        let mut seen_children = BTreeSet::new();
        for row in &self.rows {
            if row.parent < n {
                return Err(ClusterError::Inconsistent(format!(
                    "condensed tree parent {} is a point id (expected >= {n})",
                    row.parent
                )));
            }
            if !self.is_forward(row) {
                return Err(ClusterError::Inconsistent(format!(
                    "cluster node {} must have a larger id than its parent {}",
                    row.child, row.parent
                )));
            }
            if row.child < n && row.child_size != 1 {
                return Err(ClusterError::Inconsistent(format!(
                    "point {} has child_size {}",
                    row.child, row.child_size
                )));
            }
            if row.child_size == 0 {
                return Err(ClusterError::Inconsistent(format!(
                    "node {} has child_size 0",
                    row.child
                )));
            }
            if !seen_children.insert(row.child) {
                return Err(ClusterError::Inconsistent(format!(
                    "node {} appears under more than one parent",
                    row.child
                )));
            }
        }
        for row in &self.rows {
            if row.parent != n && !seen_children.contains(&row.parent) {
                return Err(ClusterError::Inconsistent(format!(
                    "cluster node {} is not reachable from the root {n}",
                    row.parent
                )));
            }
        }
        Ok(())
    }

    /// Collapse a single-linkage tree into its condensed form.
    pub(crate) fn condense(linkage: &[LinkageNode], n: usize, min_cluster_size: usize) -> Self {
        if n < 2 || linkage.len() != n - 1 {
            return Self::new(n, Vec::new());
        }

        let root = 2 * n - 2;
        let mut relabel = vec![0usize; root + 1];
        let mut ignore = vec![false; root + 1];
        relabel[root] = n;
        let mut next_label = n + 1;
        let mut rows = Vec::new();

        let node_size = |node: usize| -> usize {
            if node < n {
                1
            } else {
                linkage[node - n].size
            }
        };

        for node in bfs(linkage, n, root) {
            if node < n || ignore[node] {
                continue;
            }
            let LinkageNode {
                left,
                right,
                distance,
                ..
            } = linkage[node - n];
            let lambda = if distance > 0.0 {
                1.0 / distance
            } else {
                f64::INFINITY
            };
            let left_count = node_size(left);
            let right_count = node_size(right);
            let parent = relabel[node];

            let left_big = left_count >= min_cluster_size;
            let right_big = right_count >= min_cluster_size;

            if left_big && right_big {
                for (side, count) in [(left, left_count), (right, right_count)] {
                    relabel[side] = next_label;
                    next_label += 1;
                    rows.push(CondensedRow {
                        parent,
                        child: relabel[side],
                        lambda,
                        child_size: count,
                    });
                }
            } else {
                if left_big {
                    relabel[left] = parent;
                } else {
                    fall_out(linkage, n, left, parent, lambda, &mut ignore, &mut rows);
                }
                if right_big {
                    relabel[right] = parent;
                } else {
                    fall_out(linkage, n, right, parent, lambda, &mut ignore, &mut rows);
                }
            }
        }

        Self::new(n, rows)
    }

    /// Cluster node ids present in the tree, root included.
    pub fn cluster_ids(&self) -> BTreeSet<usize> {
        let mut ids: BTreeSet<usize> = self
            .rows
            .iter()
            .filter(|r| r.child >= self.n_points)
            .map(|r| r.child)
            .collect();
        if !self.rows.is_empty() {
            ids.insert(self.root());
        }
        ids
    }

    /// Child clusters per parent cluster.
    pub fn cluster_children(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for row in &self.rows {
            if row.child >= self.n_points {
                children.entry(row.parent).or_default().push(row.child);
            }
        }
        children
    }

    /// Parent of every node that appears as a child.
    pub fn parents(&self) -> HashMap<usize, usize> {
        self.rows.iter().map(|r| (r.child, r.parent)).collect()
    }

    /// Lambdas are infinite where points coincide; arithmetic uses the
    /// largest finite lambda instead.
    fn lambda_cap(&self) -> f64 {
        let cap = self
            .rows
            .iter()
            .map(|r| r.lambda)
            .filter(|l| l.is_finite())
            .fold(0.0_f64, f64::max);
        if cap > 0.0 {
            cap
        } else {
            1.0
        }
    }

    fn capped(&self, lambda: f64, cap: f64) -> f64 {
        if lambda.is_finite() {
            lambda
        } else {
            cap
        }
    }

    /// Lambda at which each cluster was born (0 for the root).
    pub fn birth_lambdas(&self) -> HashMap<usize, f64> {
        let cap = self.lambda_cap();
        let mut births: HashMap<usize, f64> = HashMap::new();
        births.insert(self.root(), 0.0);
        for row in &self.rows {
            if row.child >= self.n_points {
                births.insert(row.child, self.capped(row.lambda, cap));
            }
        }
        births
    }

    /// Excess-of-mass stability of every cluster.
    pub fn stabilities(&self) -> BTreeMap<usize, f64> {
        let cap = self.lambda_cap();
        let births = self.birth_lambdas();
        let mut stability: BTreeMap<usize, f64> =
            self.cluster_ids().into_iter().map(|c| (c, 0.0)).collect();
        for row in &self.rows {
            let birth = births.get(&row.parent).copied().unwrap_or(0.0);
            let lambda = self.capped(row.lambda, cap);
            *stability.entry(row.parent).or_insert(0.0) +=
                (lambda - birth) * row.child_size as f64;
        }
        stability
    }

    /// Pick the flat clusters.
    pub fn select_clusters(
        &self,
        method: SelectionMethod,
        allow_single_cluster: bool,
    ) -> BTreeSet<usize> {
        let root = self.root();
        let children = self.cluster_children();
        let candidates: Vec<usize> = self
            .cluster_ids()
            .into_iter()
            .filter(|&c| allow_single_cluster || c != root)
            .collect();

        if candidates.is_empty() {
            return BTreeSet::new();
        }

        match method {
            SelectionMethod::Leaf => {
                let leaves: BTreeSet<usize> = candidates
                    .iter()
                    .copied()
                    .filter(|c| children.get(c).map_or(true, |v| v.is_empty()))
                    .collect();
                leaves
            }
            SelectionMethod::Eom => {
                let mut stability = self.stabilities();
                let mut selected: BTreeMap<usize, bool> =
                    candidates.iter().map(|&c| (c, true)).collect();

                for &node in candidates.iter().rev() {
                    let kids = children.get(&node).map(Vec::as_slice).unwrap_or(&[]);
                    let subtree: f64 = kids
                        .iter()
                        .map(|c| stability.get(c).copied().unwrap_or(0.0))
                        .sum();
                    let own = stability.get(&node).copied().unwrap_or(0.0);
                    if !kids.is_empty() && subtree > own {
                        selected.insert(node, false);
                        stability.insert(node, subtree);
                    } else {
                        for d in descendants(&children, node) {
                            selected.insert(d, false);
                        }
                    }
                }

                selected
                    .into_iter()
                    .filter_map(|(c, keep)| keep.then_some(c))
                    .collect()
            }
        }
    }

    /// Label every point with the selected cluster above it, if any.
    ///
    /// Returns the per-point labels and the label -> node map. Labels are
    /// numbered by ascending node id.
    pub fn label_points(
        &self,
        selected: &BTreeSet<usize>,
    ) -> (Vec<Option<usize>>, BTreeMap<usize, usize>) {
        let cluster_map: BTreeMap<usize, usize> = selected.iter().copied().enumerate().collect();
        let node_to_label: HashMap<usize, usize> =
            cluster_map.iter().map(|(&l, &node)| (node, l)).collect();
        let parents = self.parents();

        let labels = (0..self.n_points)
            .map(|point| {
                let mut node = *parents.get(&point)?;
                loop {
                    if let Some(&label) = node_to_label.get(&node) {
                        return Some(label);
                    }
                    node = *parents.get(&node)?;
                }
            })
            .collect();

        (labels, cluster_map)
    }

    /// Largest lambda among the direct children of each cluster.
    pub fn max_lambdas(&self) -> HashMap<usize, f64> {
        let cap = self.lambda_cap();
        let mut deaths: HashMap<usize, f64> = HashMap::new();
        for row in &self.rows {
            let lambda = self.capped(row.lambda, cap);
            let entry = deaths.entry(row.parent).or_insert(0.0);
            if lambda > *entry {
                *entry = lambda;
            }
        }
        deaths
    }

    /// Membership strength of each point in its assigned cluster.
    pub fn probabilities(
        &self,
        labels: &[Option<usize>],
        cluster_map: &BTreeMap<usize, usize>,
    ) -> Vec<f64> {
        let deaths = self.max_lambdas();
        let mut result = vec![0.0; self.n_points];
        for row in &self.rows {
            if row.child >= self.n_points {
                continue;
            }
            let Some(label) = labels.get(row.child).copied().flatten() else {
                continue;
            };
            let Some(cluster) = cluster_map.get(&label) else {
                continue;
            };
            let max_lambda = deaths.get(cluster).copied().unwrap_or(0.0);
            result[row.child] = if max_lambda == 0.0 || !row.lambda.is_finite() {
                1.0
            } else {
                row.lambda.min(max_lambda) / max_lambda
            };
        }
        result
    }

    /// GLOSH outlier score of each point.
    pub fn outlier_scores(&self) -> Vec<f64> {
        let mut deaths = self.max_lambdas();

        // Push the deepest death lambda of each subtree up to its ancestors.
        let mut cluster_rows: Vec<&CondensedRow> = self
            .rows
            .iter()
            .filter(|r| r.child >= self.n_points)
            .collect();
        cluster_rows.sort_by(|a, b| b.child.cmp(&a.child));
        for row in cluster_rows {
            let child_death = deaths.get(&row.child).copied().unwrap_or(0.0);
            let entry = deaths.entry(row.parent).or_insert(0.0);
            if child_death > *entry {
                *entry = child_death;
            }
        }

        let mut result = vec![0.0; self.n_points];
        for row in &self.rows {
            if row.child >= self.n_points {
                continue;
            }
            let lambda_max = deaths.get(&row.parent).copied().unwrap_or(0.0);
            result[row.child] = if lambda_max == 0.0 || !row.lambda.is_finite() {
                0.0
            } else {
                ((lambda_max - row.lambda) / lambda_max).clamp(0.0, 1.0)
            };
        }
        result
    }
}

fn bfs(linkage: &[LinkageNode], n: usize, root: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        out.extend_from_slice(&frontier);
        frontier = frontier
            .iter()
            .filter(|&&node| node >= n)
            .flat_map(|&node| {
                let l = linkage[node - n];
                [l.left, l.right]
            })
            .collect();
    }
    out
}

fn fall_out(
    linkage: &[LinkageNode],
    n: usize,
    subtree: usize,
    parent: usize,
    lambda: f64,
    ignore: &mut [bool],
    rows: &mut Vec<CondensedRow>,
) {
    for sub in bfs(linkage, n, subtree) {
        if sub < n {
            rows.push(CondensedRow {
                parent,
                child: sub,
                lambda,
                child_size: 1,
            });
        }
        ignore[sub] = true;
    }
}

fn descendants(children: &BTreeMap<usize, Vec<usize>>, node: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = children.get(&node).cloned().unwrap_or_default();
    while let Some(c) = stack.pop() {
        out.push(c);
        if let Some(kids) = children.get(&c) {
            stack.extend(kids.iter().copied());
        }
    }
    out
}

/// JSON has no infinity; an infinite lambda travels as `null`.
mod lambda_serde {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
    }
}
