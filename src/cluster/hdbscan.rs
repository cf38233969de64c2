// HDBSCAN: Hierarchical Density-Based Spatial Clustering of Applications with Noise.
//
// Campello, Moulavi & Sander (2013). The pipeline is:
//
//   1. Core distance: distance to the `min_samples`-th nearest neighbour,
//      counting the point itself (so min_samples = 1 gives 0).
//   2. Mutual reachability: mrd(a, b) = max(core[a], core[b], d(a, b)).
//   3. Prim's MST over mutual reachability (dense, O(n^2)).
//   4. Single-linkage tree from the sorted MST.
//   5. Condensed tree, stability, and flat cluster selection.
//
// Everything after step 4 lives in `condensed.rs`. Runtime is quadratic in
// the number of points, which is fine for the low-dimensional projections
// this crate clusters but not for raw embeddings at scale.

use std::time::Instant;

use tracing::{debug, info};

use super::condensed::{CondensedTree, LinkageNode};
use super::error::{ClusterError, Result};
use super::params::HdbscanParams;
use super::traits::DensityClusterer;
use super::util::{self, LinkageUnionFind, MstEdge};
use super::{ClusterAssignment, Clustering};

/// The built-in HDBSCAN backend.
#[derive(Debug, Clone, Default)]
pub struct Hdbscan {
    params: HdbscanParams,
}

impl Hdbscan {
    pub fn new(params: HdbscanParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HdbscanParams {
        &self.params
    }
}

impl DensityClusterer for Hdbscan {
    fn fit(&self, data: &[Vec<f32>]) -> Result<Clustering> {
        self.params.validate()?;
        check_points(data)?;

        let started = Instant::now();
        let n = data.len();

        if n == 1 {
            return Ok(Clustering {
                assignments: vec![ClusterAssignment::noise()],
                tree: CondensedTree::new(1, Vec::new()),
                cluster_map: Default::default(),
                mst: Vec::new(),
            });
        }

        let core = core_distances(data, self.params.min_samples);
        let mst = util::prim_mst(n, |i, j| {
            util::euclidean(&data[i], &data[j])
                .max(core[i])
                .max(core[j])
        });
        debug!(points = n, edges = mst.len(), "Built mutual reachability MST");

        let linkage = single_linkage(&mst, n);
        let tree = CondensedTree::condense(&linkage, n, self.params.min_cluster_size);
        let selected =
            tree.select_clusters(self.params.selection, self.params.allow_single_cluster);
        let (labels, cluster_map) = tree.label_points(&selected);
        let probabilities = tree.probabilities(&labels, &cluster_map);
        let outlier_scores = tree.outlier_scores();

        let assignments = labels
            .into_iter()
            .zip(probabilities)
            .zip(outlier_scores)
            .map(|((label, probability), outlier_score)| ClusterAssignment {
                label,
                probability: if label.is_some() { probability } else { 0.0 },
                outlier_score,
            })
            .collect();

        let clustering = Clustering {
            assignments,
            tree,
            cluster_map,
            mst,
        };

        info!(
            min_cluster_size = self.params.min_cluster_size,
            min_samples = self.params.min_samples,
            clusters = clustering.n_clusters(),
            noise = clustering.n_noise(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HDBSCAN finished"
        );

        Ok(clustering)
    }
}

fn check_points(data: &[Vec<f32>]) -> Result<()> {
    let first = data.first().ok_or(ClusterError::EmptyInput)?;
    let dim = first.len();
    if dim == 0 {
        return Err(ClusterError::invalid_parameter(
            "dimension",
            "points must have at least one coordinate",
        ));
    }
    for (index, point) in data.iter().enumerate() {
        if point.len() != dim {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected: dim,
                found: point.len(),
            });
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::NonFinite { index });
        }
    }
    Ok(())
}

fn core_distances(data: &[Vec<f32>], min_samples: usize) -> Vec<f64> {
    let n = data.len();
    let k = min_samples.min(n).max(1);
    let mut row = vec![0.0f64; n];
    (0..n)
        .map(|i| {
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = if i == j {
                    0.0
                } else {
                    util::euclidean(&data[i], &data[j])
                };
            }
            let (_, kth, _) = row.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
            *kth
        })
        .collect()
}

fn single_linkage(mst: &[MstEdge], n: usize) -> Vec<LinkageNode> {
    let mut uf = LinkageUnionFind::new(n);
    let mut nodes = Vec::with_capacity(n.saturating_sub(1));
    for edge in mst {
        let a = uf.find(edge.from);
        let b = uf.find(edge.to);
        let size = uf.size(a) + uf.size(b);
        nodes.push(LinkageNode {
            left: a,
            right: b,
            distance: edge.distance,
            size,
        });
        uf.union(a, b);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_cluster(center: &[f32], n: usize, spread: f32) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                center
                    .iter()
                    .enumerate()
                    .map(|(d, &c)| {
                        c + spread * ((i * 7 + d * 13) % 11) as f32 / 11.0 - spread / 2.0
                    })
                    .collect()
            })
            .collect()
    }

    fn fit(data: &[Vec<f32>], mcs: usize, ms: usize) -> Clustering {
        Hdbscan::new(HdbscanParams::new(mcs, ms)).fit(data).unwrap()
    }

    #[test]
    fn two_well_separated_clusters() {
        let mut data = make_cluster(&[0.0, 0.0], 20, 0.5);
        data.extend(make_cluster(&[20.0, 20.0], 20, 0.5));

        let c = fit(&data, 10, 3);
        let labels = c.labels();

        let l0 = labels[0];
        assert!(l0.is_some());
        assert!(labels[..20].iter().all(|&l| l == l0));
        let l20 = labels[20];
        assert!(l20.is_some());
        assert!(labels[20..].iter().all(|&l| l == l20));
        assert_ne!(l0, l20);
        assert_eq!(c.n_clusters(), 2);
    }

    #[test]
    fn cluster_map_points_at_condensed_nodes() {
        let mut data = make_cluster(&[0.0, 0.0], 15, 0.5);
        data.extend(make_cluster(&[30.0, 0.0], 15, 0.5));

        let c = fit(&data, 5, 3);
        let ids = c.tree.cluster_ids();
        for node in c.cluster_map.values() {
            assert!(ids.contains(node));
            assert!(*node > c.tree.root());
        }
    }

    #[test]
    fn distant_point_is_noise_with_high_outlier_score() {
        let mut data = make_cluster(&[0.0, 0.0], 15, 0.3);
        data.extend(make_cluster(&[10.0, 10.0], 15, 0.3));
        data.push(vec![100.0, -100.0]);

        let c = fit(&data, 5, 3);
        let last = c.assignments.last().unwrap();
        assert!(last.label.is_none());
        assert_eq!(last.probability, 0.0);
        assert!(last.outlier_score > 0.5, "got {}", last.outlier_score);
    }

    #[test]
    fn probabilities_and_scores_are_bounded() {
        let mut data = make_cluster(&[0.0, 0.0], 25, 1.0);
        data.extend(make_cluster(&[8.0, 8.0], 25, 2.0));

        let c = fit(&data, 5, 5);
        for a in &c.assignments {
            assert!((0.0..=1.0).contains(&a.probability));
            assert!((0.0..=1.0).contains(&a.outlier_score));
        }
    }

    #[test]
    fn all_noise_with_huge_min_cluster_size() {
        let data = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![20.0, 20.0]];
        let c = fit(&data, 100, 2);
        assert!(c.labels().iter().all(Option::is_none));
        assert_eq!(c.n_clusters(), 0);
    }

    #[test]
    fn single_cluster_when_allowed() {
        let data = make_cluster(&[0.0, 0.0], 20, 0.5);
        let params = HdbscanParams::new(15, 3).with_single_cluster(true);
        let c = Hdbscan::new(params).fit(&data).unwrap();
        let distinct: HashSet<_> = c.labels().into_iter().flatten().collect();
        assert_eq!(distinct.len(), 1);
    }

    #[test]
    fn duplicate_points_do_not_produce_nan() {
        let mut data = vec![vec![1.0, 1.0]; 10];
        data.extend(vec![vec![9.0, 9.0]; 10]);
        let c = fit(&data, 5, 3);
        for a in &c.assignments {
            assert!(a.probability.is_finite());
            assert!(a.outlier_score.is_finite());
        }
        assert_eq!(c.n_clusters(), 2);
    }

    #[test]
    fn empty_input_is_rejected() {
        let data: Vec<Vec<f32>> = vec![];
        let err = Hdbscan::default().fit(&data).unwrap_err();
        assert!(matches!(err, ClusterError::EmptyInput));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let data = vec![vec![0.0, 0.0], vec![1.0]];
        let err = Hdbscan::default().fit(&data).unwrap_err();
        assert!(matches!(err, ClusterError::DimensionMismatch { index: 1, .. }));
    }

    #[test]
    fn non_finite_is_rejected() {
        let data = vec![vec![0.0, 0.0], vec![f32::NAN, 1.0]];
        assert!(Hdbscan::default().fit(&data).is_err());
    }

    #[test]
    fn single_point_is_noise() {
        let c = fit(&[vec![1.0, 2.0]], 2, 1);
        assert_eq!(c.assignments.len(), 1);
        assert!(c.assignments[0].label.is_none());
    }

    #[test]
    fn core_distance_counts_the_point_itself() {
        let data = vec![vec![0.0], vec![1.0], vec![3.0]];
        let core = core_distances(&data, 2);
        assert_eq!(core, vec![1.0, 1.0, 2.0]);
        let core1 = core_distances(&data, 1);
        assert_eq!(core1, vec![0.0, 0.0, 0.0]);
    }
}
