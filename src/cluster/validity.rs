// Relative validity: a fast DBCV approximation over the mutual reachability MST.
//
// For each cluster:
//   sparseness  = longest MST edge with both ends inside the cluster
//   separation  = shortest MST edge leaving the cluster for another cluster
//   V(c)        = (separation - sparseness) / max(separation, sparseness)
// and the score is the size-weighted sum of V over all points (noise counts
// towards the total but contributes nothing). Clusters with no MST edge to
// another cluster get a separation of twice the longest MST edge.

use std::collections::BTreeMap;

use super::util::MstEdge;

const CORRECTION: f64 = 2.0;

/// Score a labelling against the MST it was built from.
///
/// Returns `None` when there are no clusters or no MST edges.
pub fn relative_validity(labels: &[Option<usize>], mst: &[MstEdge]) -> Option<f64> {
    if mst.is_empty() {
        return None;
    }
    // Labels may be sparse (imported clusterings), so index them densely.
    let mut slots: BTreeMap<usize, usize> = BTreeMap::new();
    for &l in labels.iter().flatten() {
        let next = slots.len();
        slots.entry(l).or_insert(next);
    }
    let n_clusters = slots.len();
    if n_clusters == 0 {
        return None;
    }
    let dense: Vec<Option<usize>> = labels.iter().map(|l| l.map(|l| slots[&l])).collect();

    let mut sizes = vec![0usize; n_clusters];
    for &i in dense.iter().flatten() {
        sizes[i] += 1;
    }
    let total = labels.len() as f64;

    let mut sparseness = vec![0.0f64; n_clusters];
    let mut separation = vec![f64::INFINITY; n_clusters];
    let mut min_outlier_sep = f64::INFINITY;
    let mut max_distance = 0.0f64;

    for edge in mst {
        let a = dense.get(edge.from).copied().flatten();
        let b = dense.get(edge.to).copied().flatten();
        let length = edge.distance;
        max_distance = max_distance.max(length);

        match (a, b) {
            (None, None) => {}
            (None, Some(_)) | (Some(_), None) => {
                min_outlier_sep = min_outlier_sep.min(length);
            }
            (Some(x), Some(y)) if x == y => {
                sparseness[x] = sparseness[x].max(length);
            }
            (Some(x), Some(y)) => {
                separation[x] = separation[x].min(length);
                separation[y] = separation[y].min(length);
            }
        }
    }

    if min_outlier_sep.is_infinite() {
        min_outlier_sep = max_distance;
    }
    let correction = CORRECTION
        * if n_clusters > 1 {
            max_distance
        } else {
            min_outlier_sep
        };

    let score = (0..n_clusters)
        .map(|i| {
            let sep = if separation[i].is_infinite() {
                correction
            } else {
                separation[i]
            };
            let denom = sep.max(sparseness[i]);
            let v = if denom > 0.0 {
                (sep - sparseness[i]) / denom
            } else {
                0.0
            };
            sizes[i] as f64 * v / total
        })
        .sum();

    Some(score)
}
