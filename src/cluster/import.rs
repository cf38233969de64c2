// Import a clustering computed by another tool.
//
// The JSON layout mirrors the attributes of a fitted model from the `hdbscan`
// library: `labels` (-1 = noise), `probabilities`, `outlier_scores`,
// `condensed_tree` rows (`parent`, `child`, `lambda_val`, `child_size`),
// `cluster_map` (condensed node id -> label, keys as strings) and optionally
// the `mst` edges. Only `labels` is required.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::condensed::{CondensedRow, CondensedTree};
use super::error::ClusterError;
use super::util::MstEdge;
use super::{ClusterAssignment, Clustering};

#[derive(Debug, Deserialize)]
pub struct ExternalClustering {
    pub labels: Vec<i64>,
    #[serde(default)]
    pub probabilities: Option<Vec<f64>>,
    #[serde(default)]
    pub outlier_scores: Option<Vec<f64>>,
    #[serde(default)]
    pub condensed_tree: Vec<CondensedRow>,
    #[serde(default)]
    pub cluster_map: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub mst: Vec<MstEdge>,
}

/// Read an external clustering from a JSON file.
pub fn load_clustering(path: &Path) -> Result<Clustering> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read clustering file {}", path.display()))?;
    let external: ExternalClustering = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse clustering file {}", path.display()))?;
    let clustering = external.into_clustering()?;
    info!(
        path = %path.display(),
        points = clustering.assignments.len(),
        clusters = clustering.n_clusters(),
        "Imported external clustering"
    );
    Ok(clustering)
}

impl ExternalClustering {
    /// Validate and convert into the crate's clustering type.
    pub fn into_clustering(self) -> std::result::Result<Clustering, ClusterError> {
        let n = self.labels.len();
        if n == 0 {
            return Err(ClusterError::EmptyInput);
        }

        let check_len = |name: &str, len: usize| {
            if len != n {
                Err(ClusterError::Inconsistent(format!(
                    "{name} has {len} entries but there are {n} labels"
                )))
            } else {
                Ok(())
            }
        };
        if let Some(p) = &self.probabilities {
            check_len("probabilities", p.len())?;
            if let Some(i) = p.iter().position(|v| !(0.0..=1.0).contains(v)) {
                return Err(ClusterError::Inconsistent(format!(
                    "probability {} of point {i} is outside [0, 1]",
                    p[i]
                )));
            }
        }
        if let Some(o) = &self.outlier_scores {
            check_len("outlier_scores", o.len())?;
            if let Some(i) = o.iter().position(|v| !v.is_finite()) {
                return Err(ClusterError::NonFinite { index: i });
            }
        }
        if let Some(i) = self.labels.iter().position(|&l| l < -1) {
            return Err(ClusterError::Inconsistent(format!(
                "label {} of point {i} is below -1",
                self.labels[i]
            )));
        }

        let labels: Vec<Option<usize>> = self
            .labels
            .iter()
            .map(|&l| usize::try_from(l).ok())
            .collect();

        let tree = CondensedTree::new(n, self.condensed_tree);
        tree.check_structure()?;
        for edge in &self.mst {
            if edge.from >= n || edge.to >= n {
                return Err(ClusterError::Inconsistent(format!(
                    "mst edge {}-{} references a missing point",
                    edge.from, edge.to
                )));
            }
        }

        let cluster_map = match self.cluster_map {
            Some(map) => parse_cluster_map(map, n)?,
            None => derive_cluster_map(&tree, &labels),
        };

        let assignments = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| ClusterAssignment {
                label,
                probability: self
                    .probabilities
                    .as_ref()
                    .map_or(if label.is_some() { 1.0 } else { 0.0 }, |p| p[i]),
                outlier_score: self.outlier_scores.as_ref().map_or(0.0, |o| o[i]),
            })
            .collect();

        Ok(Clustering {
            assignments,
            tree,
            cluster_map,
            mst: self.mst,
        })
    }
}

fn parse_cluster_map(
    map: BTreeMap<String, i64>,
    n_points: usize,
) -> std::result::Result<BTreeMap<usize, usize>, ClusterError> {
    let mut out = BTreeMap::new();
    for (node, label) in map {
        let node: usize = node
            .trim()
            .parse()
            .ok()
            .filter(|&id| id >= n_points)
            .ok_or_else(|| {
                ClusterError::Inconsistent(format!("cluster_map key '{node}' is not a cluster node id"))
            })?;
        let label = usize::try_from(label).map_err(|_| {
            ClusterError::Inconsistent(format!("cluster_map maps node {node} to noise"))
        })?;
        out.insert(label, node);
    }
    Ok(out)
}

/// For each label, the deepest condensed node whose subtree holds every member.
///
/// `check_structure` has already guaranteed that every node has one parent
/// with a smaller id, so each chain ends at the root and the deepest shared
/// ancestor is the largest id common to all members' chains.
fn derive_cluster_map(tree: &CondensedTree, labels: &[Option<usize>]) -> BTreeMap<usize, usize> {
    let parents: HashMap<usize, usize> = tree.parents();
    let ancestors = |point: usize| -> BTreeSet<usize> {
        let mut chain = BTreeSet::new();
        let mut node = point;
        while let Some(&p) = parents.get(&node) {
            chain.insert(p);
            node = p;
        }
        chain
    };

    let mut shared: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (point, label) in labels.iter().enumerate() {
        let Some(label) = label else { continue };
        let chain = ancestors(point);
        shared
            .entry(*label)
            .and_modify(|s| s.retain(|n| chain.contains(n)))
            .or_insert(chain);
    }

    shared
        .into_iter()
        .filter_map(|(label, nodes)| nodes.last().map(|&node| (label, node)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "labels": [0, 0, -1, 1, 1],
            "probabilities": [1.0, 0.8, 0.0, 0.9, 1.0],
            "outlier_scores": [0.0, 0.1, 0.9, 0.05, 0.0],
            "condensed_tree": [
                {"parent": 5, "child": 2, "lambda_val": 0.1, "child_size": 1},
                {"parent": 5, "child": 6, "lambda_val": 0.5, "child_size": 2},
                {"parent": 5, "child": 7, "lambda_val": 0.5, "child_size": 2},
                {"parent": 6, "child": 0, "lambda_val": null, "child_size": 1},
                {"parent": 6, "child": 1, "lambda_val": 2.0, "child_size": 1},
                {"parent": 7, "child": 3, "lambda_val": 3.0, "child_size": 1},
                {"parent": 7, "child": 4, "lambda_val": 3.0, "child_size": 1}
            ],
            "cluster_map": {"6": 0, "7": 1}
        }"#
    }

    #[test]
    fn imports_hdbscan_style_json() {
        let ext: ExternalClustering = serde_json::from_str(sample_json()).unwrap();
        let c = ext.into_clustering().unwrap();
        assert_eq!(c.n_clusters(), 2);
        assert_eq!(c.n_noise(), 1);
        assert_eq!(c.cluster_map[&0], 6);
        assert_eq!(c.cluster_map[&1], 7);
        assert!(c.tree.rows[3].lambda.is_infinite());
        assert!((c.assignments[1].probability - 0.8).abs() < 1e-9);
    }

    #[test]
    fn derives_cluster_map_when_missing() {
        let mut value: serde_json::Value = serde_json::from_str(sample_json()).unwrap();
        value.as_object_mut().unwrap().remove("cluster_map");
        let ext: ExternalClustering = serde_json::from_value(value).unwrap();
        let c = ext.into_clustering().unwrap();
        assert_eq!(c.cluster_map[&0], 6);
        assert_eq!(c.cluster_map[&1], 7);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let json = r#"{"labels": [0, 1], "probabilities": [1.0]}"#;
        let ext: ExternalClustering = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ext.into_clustering(),
            Err(ClusterError::Inconsistent(_))
        ));
    }

    #[test]
    fn labels_only_defaults_probabilities() {
        let json = r#"{"labels": [0, -1]}"#;
        let ext: ExternalClustering = serde_json::from_str(json).unwrap();
        let c = ext.into_clustering().unwrap();
        assert_eq!(c.assignments[0].probability, 1.0);
        assert_eq!(c.assignments[1].probability, 0.0);
        assert!(c.cluster_map.is_empty());
        assert_eq!(c.n_clusters(), 1);
    }
}
