// Density clustering: HDBSCAN backend, condensed tree, validity, import.

pub mod condensed;
pub mod error;
pub mod hdbscan;
pub mod import;
pub mod params;
pub mod traits;
pub mod util;
pub mod validity;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use self::condensed::CondensedTree;
use self::util::MstEdge;

/// Per-row result of clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Final flat cluster, `None` for noise (serialized as -1).
    #[serde(with = "noise_label")]
    pub label: Option<usize>,
    /// Membership strength in [0, 1]; 0 for noise.
    pub probability: f64,
    /// GLOSH outlier score in [0, 1].
    pub outlier_score: f64,
}

impl ClusterAssignment {
    pub fn noise() -> Self {
        Self {
            label: None,
            probability: 0.0,
            outlier_score: 0.0,
        }
    }
}

/// Everything a clustering run produces.
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    pub assignments: Vec<ClusterAssignment>,
    pub tree: CondensedTree,
    /// Final label -> condensed tree node.
    pub cluster_map: BTreeMap<usize, usize>,
    /// Mutual reachability MST; empty for imported clusterings without one.
    pub mst: Vec<MstEdge>,
}

impl Clustering {
    pub fn labels(&self) -> Vec<Option<usize>> {
        self.assignments.iter().map(|a| a.label).collect()
    }

    pub fn n_clusters(&self) -> usize {
        self.assignments
            .iter()
            .filter_map(|a| a.label)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn n_noise(&self) -> usize {
        self.assignments.iter().filter(|a| a.label.is_none()).count()
    }

    pub fn noise_ratio(&self) -> f64 {
        if self.assignments.is_empty() {
            0.0
        } else {
            self.n_noise() as f64 / self.assignments.len() as f64
        }
    }

    /// Row indices assigned to `label`.
    pub fn members(&self, label: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.label == Some(label))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mean membership probability of a cluster.
    pub fn mean_probability(&self, label: usize) -> f64 {
        let members = self.members(label);
        if members.is_empty() {
            return 0.0;
        }
        members
            .iter()
            .map(|&i| self.assignments[i].probability)
            .sum::<f64>()
            / members.len() as f64
    }

    /// DBCV-style relative validity, when an MST is available.
    pub fn relative_validity(&self) -> Option<f64> {
        validity::relative_validity(&self.labels(), &self.mst)
    }
}

/// Noise travels as -1 in JSON, matching the usual HDBSCAN label convention.
pub(crate) mod noise_label {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(label: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match label {
            Some(l) => s.serialize_i64(*l as i64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        Ok(usize::try_from(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(label: Option<usize>, probability: f64) -> ClusterAssignment {
        ClusterAssignment {
            label,
            probability,
            outlier_score: 0.0,
        }
    }

    #[test]
    fn counts_and_ratios() {
        let c = Clustering {
            assignments: vec![
                assignment(Some(0), 1.0),
                assignment(Some(0), 0.5),
                assignment(None, 0.0),
                assignment(Some(1), 0.8),
            ],
            cluster_map: [(0, 5), (1, 6)].into(),
            ..Default::default()
        };
        assert_eq!(c.n_clusters(), 2);
        assert_eq!(c.n_noise(), 1);
        assert!((c.noise_ratio() - 0.25).abs() < 1e-9);
        assert_eq!(c.members(0), vec![0, 1]);
        assert!((c.mean_probability(0) - 0.75).abs() < 1e-9);
        assert_eq!(c.mean_probability(7), 0.0);
    }

    #[test]
    fn noise_serializes_as_minus_one() {
        let json = serde_json::to_string(&ClusterAssignment::noise()).unwrap();
        assert!(json.contains("\"label\":-1"));
        let back: ClusterAssignment = serde_json::from_str(&json).unwrap();
        assert!(back.label.is_none());
    }
}
