// Parameter sweep pipelines: grid assessment, target-range search, Pareto front.
//
// All three work on the same standardized projection the analysis pipeline
// clusters, so the numbers they report carry over to `analyze` directly.
// Strategy: project once, then cluster many times on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::assess::{
    assess_grid, best_by_dbcv, load_results, optimize, pareto_front, pivot, save_results,
    AssessmentResult, Metric, OptimizeOutcome,
};
use crate::config::Config;
use crate::output::charts;
use crate::reduce::{project, Pca};
use crate::table::{embedding_matrix, load_table, TableSchema};

pub const ASSESSMENT_FILE: &str = "hdbscan_assessment_results.json";
pub const OPTIMIZE_FILE: &str = "optimize_results.json";
pub const PARETO_FILE: &str = "pareto_front.json";
pub const PARETO_PAGE: &str = "pareto_front_visualization.html";

/// What a sweep wrote, plus its results.
#[derive(Debug)]
pub struct SweepOutcome {
    pub results: Vec<AssessmentResult>,
    pub files: Vec<PathBuf>,
}

/// Load the configured table and return its standardized projection.
pub async fn load_points(config: &Config, n_components: usize) -> Result<Vec<Vec<f32>>> {
    let input = config.require_input()?;
    let rows = load_table(input, &TableSchema::for_kind(config.text_kind))?;
    let matrix = embedding_matrix(&rows)?;
    let pca = Pca::new(n_components);
    let projection = tokio::task::spawn_blocking(move || project(&pca, &matrix))
        .await
        .context("Projection task panicked")??;
    Ok(projection.standardized)
}

/// Sweep every (min_cluster_size, min_samples) pair and write the results
/// plus one heatmap page per metric.
pub async fn run_assessment(
    config: &Config,
    mcs_values: &[usize],
    ms_values: &[usize],
    concurrency: usize,
    n_components: usize,
) -> Result<SweepOutcome> {
    let points = Arc::new(load_points(config, n_components).await?);
    let results = assess_grid(points, mcs_values, ms_values, concurrency).await?;
    if results.is_empty() {
        bail!("Every parameter pair failed; nothing to report");
    }

    let dir = &config.output_dir;
    create_dir(dir)?;
    let mut files = Vec::new();

    let path = dir.join(ASSESSMENT_FILE);
    save_results(&path, &results)?;
    files.push(path);

    let chosen = best_by_dbcv(&results, 1)
        .first()
        .map(|r| (r.min_cluster_size, r.min_samples));
    for metric in [Metric::Clusters, Metric::Noise, Metric::Dbcv] {
        let svg = charts::heatmap_svg(&pivot(&results, metric), metric, chosen);
        let page = charts::html_page(
            &format!("HDBSCAN Assessment: {}", metric.title()),
            &format!("<div class=\"chart\">{svg}</div>"),
        );
        let path = dir.join(heatmap_file(metric));
        write(&path, &page)?;
        files.push(path);
    }

    info!(
        results = results.len(),
        output_dir = %dir.display(),
        "Assessment reports written"
    );
    Ok(SweepOutcome { results, files })
}

pub fn heatmap_file(metric: Metric) -> &'static str {
    match metric {
        Metric::Clusters => "assessment_heatmap_clusters.html",
        Metric::Noise => "assessment_heatmap_noise.html",
        Metric::Dbcv => "assessment_heatmap_dbcv.html",
    }
}

/// Search `candidates` for a min_cluster_size that lands in `target` and
/// save every run tried.
pub async fn run_optimize(
    config: &Config,
    candidates: &[usize],
    target: (usize, usize),
    n_components: usize,
) -> Result<OptimizeOutcome> {
    let points = load_points(config, n_components).await?;
    let candidates = candidates.to_vec();
    let outcome = tokio::task::spawn_blocking(move || optimize(&points, &candidates, target))
        .await
        .context("Optimize task panicked")??;

    create_dir(&config.output_dir)?;
    let path = config.output_dir.join(OPTIMIZE_FILE);
    write(&path, &serde_json::to_string_pretty(&outcome)?)?;
    info!(
        mcs = outcome.chosen.min_cluster_size,
        ms = outcome.chosen.min_samples,
        in_range = outcome.in_range,
        "Optimize complete"
    );
    Ok(outcome)
}

/// Compute the Pareto front of saved assessment results and chart it.
pub fn run_pareto(results_path: &Path, output_dir: &Path) -> Result<SweepOutcome> {
    let all = load_results(results_path)?;
    let front = pareto_front(&all);
    if front.is_empty() {
        bail!(
            "No result in {} has a validity score; cannot build a Pareto front",
            results_path.display()
        );
    }

    create_dir(output_dir)?;
    let mut files = Vec::new();

    let path = output_dir.join(PARETO_FILE);
    save_results(&path, &front)?;
    files.push(path);

    let page = charts::html_page(
        "Pareto Front of HDBSCAN Parameters",
        &format!("<div class=\"chart\">{}</div>", charts::pareto_svg(&all, &front)),
    );
    let path = output_dir.join(PARETO_PAGE);
    write(&path, &page)?;
    files.push(path);

    info!(
        candidates = all.len(),
        front = front.len(),
        "Pareto front computed"
    );
    Ok(SweepOutcome {
        results: front,
        files,
    })
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
