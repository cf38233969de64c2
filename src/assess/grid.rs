// Parameter sweeps over min_cluster_size x min_samples.
//
// Each grid cell is an independent clustering run, so the sweep fans the
// CPU-bound fits out to the blocking pool and keeps `concurrency` in flight.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cluster::hdbscan::Hdbscan;
use crate::cluster::params::HdbscanParams;
use crate::cluster::traits::DensityClusterer;

/// Candidate sizes tried by `optimize` when none are given.
pub const DEFAULT_CANDIDATES: [usize; 8] = [20, 30, 40, 50, 75, 100, 150, 200];

/// Outcome of clustering with one parameter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub min_cluster_size: usize,
    pub min_samples: usize,
    pub n_clusters: usize,
    pub noise_ratio: f64,
    /// Relative validity; absent when no cluster was found
    #[serde(rename = "dbcv_score")]
    pub dbcv: Option<f64>,
}

/// Every (mcs, ms) pair with `ms <= mcs`, in sweep order.
pub fn param_grid(mcs_values: &[usize], ms_values: &[usize]) -> Vec<(usize, usize)> {
    mcs_values
        .iter()
        .flat_map(|&mcs| {
            ms_values
                .iter()
                .filter(move |&&ms| ms <= mcs)
                .map(move |&ms| (mcs, ms))
        })
        .collect()
}

/// Cluster `points` with one parameter pair and score the result.
pub fn evaluate(points: &[Vec<f32>], params: HdbscanParams) -> Result<AssessmentResult> {
    let clustering = Hdbscan::new(params.clone())
        .fit(points)
        .with_context(|| {
            format!(
                "Clustering failed for min_cluster_size={}, min_samples={}",
                params.min_cluster_size, params.min_samples
            )
        })?;
    Ok(AssessmentResult {
        min_cluster_size: params.min_cluster_size,
        min_samples: params.min_samples,
        n_clusters: clustering.n_clusters(),
        noise_ratio: clustering.noise_ratio(),
        dbcv: clustering.relative_validity(),
    })
}

/// Run the full 2D sweep. Failed cells are logged and skipped.
pub async fn assess_grid(
    points: Arc<Vec<Vec<f32>>>,
    mcs_values: &[usize],
    ms_values: &[usize],
    concurrency: usize,
) -> Result<Vec<AssessmentResult>> {
    let grid = param_grid(mcs_values, ms_values);
    if grid.is_empty() {
        bail!("Parameter grid is empty: every min_samples value exceeds every min_cluster_size");
    }
    info!(cells = grid.len(), concurrency, "Starting parameter assessment");

    let pb = ProgressBar::new(grid.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar().template("  Assessing [{bar:30}] {pos}/{len} ({eta})")?,
    );

    let outcomes: Vec<Result<AssessmentResult>> =
        stream::iter(grid.into_iter().map(|(mcs, ms)| {
            let points = Arc::clone(&points);
            let pb = pb.clone();
            async move {
                let params = HdbscanParams::new(mcs, ms);
                let result = tokio::task::spawn_blocking(move || evaluate(&points, params))
                    .await
                    .context("Assessment task panicked")?;
                pb.inc(1);
                result
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(e) => warn!(error = %e, "Skipping parameter pair"),
        }
    }
    results.sort_by_key(|r| (r.min_cluster_size, r.min_samples));
    info!(results = results.len(), "Parameter assessment complete");
    Ok(results)
}

/// The `k` best results by relative validity, best first.
pub fn best_by_dbcv(results: &[AssessmentResult], k: usize) -> Vec<AssessmentResult> {
    let mut scored: Vec<&AssessmentResult> = results.iter().filter(|r| r.dbcv.is_some()).collect();
    scored.sort_by(|a, b| {
        b.dbcv
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&a.dbcv.unwrap_or(f64::NEG_INFINITY))
    });
    scored.into_iter().take(k).cloned().collect()
}

/// Result of a target-range search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeOutcome {
    pub chosen: AssessmentResult,
    /// Whether `chosen` landed inside the target range
    pub in_range: bool,
    pub tried: Vec<AssessmentResult>,
}

/// Walk `candidates` (min_cluster_size values, `min_samples = max(5, mcs/2)`)
/// until one yields a cluster count inside `target`; otherwise return the
/// run closest to the middle of the range.
pub fn optimize(
    points: &[Vec<f32>],
    candidates: &[usize],
    target: (usize, usize),
) -> Result<OptimizeOutcome> {
    let (lo, hi) = target;
    if lo > hi {
        bail!("Target range {lo}..{hi} is empty");
    }
    let midpoint = (lo + hi) as f64 / 2.0;
    let mut tried = Vec::new();

    for &mcs in candidates {
        let ms = (mcs / 2).max(5);
        let result = match evaluate(points, HdbscanParams::new(mcs, ms)) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, mcs, ms, "Skipping candidate");
                continue;
            }
        };
        info!(
            mcs,
            ms,
            clusters = result.n_clusters,
            noise = format!("{:.1}%", result.noise_ratio * 100.0),
            "Tried candidate"
        );
        tried.push(result.clone());
        if (lo..=hi).contains(&result.n_clusters) {
            return Ok(OptimizeOutcome {
                chosen: result,
                in_range: true,
                tried,
            });
        }
    }

    let chosen = tried
        .iter()
        .min_by(|a, b| {
            (a.n_clusters as f64 - midpoint)
                .abs()
                .total_cmp(&(b.n_clusters as f64 - midpoint).abs())
        })
        .cloned()
        .context("No candidate produced a clustering")?;
    Ok(OptimizeOutcome {
        chosen,
        in_range: false,
        tried,
    })
}

/// Which value a heatmap shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Clusters,
    Noise,
    Dbcv,
}

impl Metric {
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Clusters => "Number of Clusters",
            Metric::Noise => "Noise Ratio",
            Metric::Dbcv => "Cluster Quality (DBCV)",
        }
    }

    pub fn value(&self, r: &AssessmentResult) -> Option<f64> {
        match self {
            Metric::Clusters => Some(r.n_clusters as f64),
            Metric::Noise => Some(r.noise_ratio),
            Metric::Dbcv => r.dbcv,
        }
    }
}

/// Results pivoted to min_samples rows x min_cluster_size columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub mcs_values: Vec<usize>,
    pub ms_values: Vec<usize>,
    /// `cells[row][col]`, `None` where the pair was not run or has no value
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn pivot(results: &[AssessmentResult], metric: Metric) -> Pivot {
    let mcs_values: Vec<usize> = results
        .iter()
        .map(|r| r.min_cluster_size)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let ms_values: Vec<usize> = results
        .iter()
        .map(|r| r.min_samples)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![None; mcs_values.len()]; ms_values.len()];
    for r in results {
        let (Ok(col), Ok(row)) = (
            mcs_values.binary_search(&r.min_cluster_size),
            ms_values.binary_search(&r.min_samples),
        ) else {
            continue;
        };
        cells[row][col] = metric.value(r);
    }
    Pivot {
        mcs_values,
        ms_values,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(mcs: usize, ms: usize, n: usize, noise: f64, dbcv: Option<f64>) -> AssessmentResult {
        AssessmentResult {
            min_cluster_size: mcs,
            min_samples: ms,
            n_clusters: n,
            noise_ratio: noise,
            dbcv,
        }
    }

    #[test]
    fn grid_skips_samples_above_size() {
        let grid = param_grid(&[10, 20], &[5, 15]);
        assert_eq!(grid, vec![(10, 5), (20, 5), (20, 15)]);
    }

    #[test]
    fn best_by_dbcv_drops_missing_scores() {
        let results = vec![
            result(10, 5, 3, 0.1, Some(0.2)),
            result(20, 5, 2, 0.1, None),
            result(30, 5, 2, 0.1, Some(0.6)),
        ];
        let best = best_by_dbcv(&results, 5);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].min_cluster_size, 30);
    }

    #[test]
    fn pivot_places_cells() {
        let results = vec![
            result(10, 5, 3, 0.1, Some(0.2)),
            result(20, 5, 2, 0.3, None),
            result(20, 10, 1, 0.5, Some(0.4)),
        ];
        let p = pivot(&results, Metric::Noise);
        assert_eq!(p.mcs_values, vec![10, 20]);
        assert_eq!(p.ms_values, vec![5, 10]);
        assert_eq!(p.cells[0], vec![Some(0.1), Some(0.3)]);
        assert_eq!(p.cells[1], vec![None, Some(0.5)]);
        let d = pivot(&results, Metric::Dbcv);
        assert_eq!(d.cells[0][1], None);
    }

    #[test]
    fn result_serializes_dbcv_score() {
        let json = serde_json::to_string(&result(10, 5, 3, 0.1, None)).unwrap();
        assert!(json.contains("\"dbcv_score\":null"));
    }
}
