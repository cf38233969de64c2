// Analysis pipeline: embedding table -> clusters -> reports.
//
// This is the main workflow behind `claimscape analyze`:
// 1. Load the embedding table
// 2. Project the embeddings and standardize the coordinates
// 3. Cluster the projection (or import a clustering computed elsewhere)
// 4. Describe each cluster with keywords, samples and hypernyms
// 5. Write the text, HTML and JSON reports into the output directory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cluster::hdbscan::Hdbscan;
use crate::cluster::import::load_clustering;
use crate::cluster::params::HdbscanParams;
use crate::cluster::traits::DensityClusterer;
use crate::cluster::{ClusterAssignment, Clustering};
use crate::config::Config;
use crate::hierarchy::HierarchyView;
use crate::output::html_report::{self, ReportContext};
use crate::output::palette::cluster_colors;
use crate::output::text_report;
use crate::reduce::{project, Pca, Projection};
use crate::table::{embedding_matrix, load_table, EmbeddingRow, TableSchema, TextKind};
use crate::topics::{
    describe_clusters, ClusterDescriptor, DescribeOptions, HypernymSource, KeywordStrategy, Lexicon,
};

pub const PROJECTION_FILE: &str = "enhanced_clustering.html";
pub const TEXT_REPORT_FILE: &str = "hierarchical_clustering_results.txt";
pub const HTML_REPORT_FILE: &str = "hierarchical_report.html";
pub const ANALYSIS_FILE: &str = "cluster_analysis_report.html";
pub const SUMMARY_FILE: &str = "clustering_summary.json";

/// Where the clustering comes from.
#[derive(Debug, Clone)]
pub enum ClusterSource {
    /// Run the built-in HDBSCAN on the projection.
    Hdbscan(HdbscanParams),
    /// Read a clustering computed by another tool.
    Import(PathBuf),
}

/// Per-run knobs that don't belong in the environment config.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub source: ClusterSource,
    pub keywords: KeywordStrategy,
    /// Dimensions of the projection the clusterer sees
    pub n_components: usize,
    pub sample_count: usize,
    pub unique_triples: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            source: ClusterSource::Hdbscan(HdbscanParams::default()),
            keywords: KeywordStrategy::default(),
            n_components: 2,
            sample_count: 5,
            unique_triples: false,
        }
    }
}

/// Machine-readable record of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringSummary {
    pub generated: String,
    pub input: PathBuf,
    pub text_kind: TextKind,
    pub n_rows: usize,
    pub n_clusters: usize,
    pub n_noise: usize,
    pub noise_ratio: f64,
    #[serde(rename = "dbcv_score")]
    pub dbcv: Option<f64>,
    /// `None` when the clustering was imported
    pub params: Option<HdbscanParams>,
    pub keyword_strategy: KeywordStrategy,
    pub clusters: Vec<ClusterDescriptor>,
    pub assignments: Vec<RowAssignment>,
}

/// One row's place in the result, with its 2D coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct RowAssignment {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub assignment: ClusterAssignment,
}

/// What a run produced, for the caller to print.
#[derive(Debug)]
pub struct AnalyzeOutcome {
    pub clustering: Clustering,
    pub descriptors: BTreeMap<usize, ClusterDescriptor>,
    pub summary: ClusteringSummary,
    pub files: Vec<PathBuf>,
}

/// Run the analysis pipeline and write every report.
pub async fn run(config: &Config, options: &AnalyzeOptions) -> Result<AnalyzeOutcome> {
    let input = config.require_input()?.clone();
    let started = Instant::now();

    // Stage 1: load
    let stage = Instant::now();
    let schema = TableSchema::for_kind(config.text_kind);
    let rows = load_table(&input, &schema)?;
    let matrix = embedding_matrix(&rows)?;
    info!(elapsed_ms = stage.elapsed().as_millis() as u64, "Stage: load");

    // Stage 2: project + standardize
    let stage = Instant::now();
    let pca = Pca::new(options.n_components);
    let projection = tokio::task::spawn_blocking(move || project(&pca, &matrix))
        .await
        .context("Projection task panicked")??;
    info!(
        dims = projection.dims(),
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Stage: project"
    );

    // Stage 3: cluster
    let stage = Instant::now();
    let (clustering, params) = match &options.source {
        ClusterSource::Hdbscan(params) => {
            let clusterer = Hdbscan::new(params.clone());
            let points = projection.standardized.clone();
            let clustering = tokio::task::spawn_blocking(move || clusterer.fit(&points))
                .await
                .context("Clustering task panicked")??;
            (clustering, Some(params.clone()))
        }
        ClusterSource::Import(path) => (load_clustering(path)?, None),
    };
    if clustering.assignments.len() != rows.len() {
        bail!(
            "Clustering has {} assignments but {} has {} rows",
            clustering.assignments.len(),
            input.display(),
            rows.len()
        );
    }
    info!(
        clusters = clustering.n_clusters(),
        noise = clustering.n_noise(),
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Stage: cluster"
    );

    // Stage 4: describe
    let stage = Instant::now();
    let lexicon = match &config.lexicon {
        Some(path) => Some(Lexicon::load(path)?),
        None => None,
    };
    let describe = DescribeOptions {
        strategy: options.keywords.clone(),
        sample_count: options.sample_count,
        unique_triples: options.unique_triples,
        hypernyms: lexicon.as_ref().map(|l| l as &dyn HypernymSource),
    };
    let descriptors = describe_clusters(&rows, &clustering, &describe)?;
    info!(elapsed_ms = stage.elapsed().as_millis() as u64, "Stage: describe");

    // Stage 5: reports
    let stage = Instant::now();
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let summary = build_summary(
        &input,
        config.text_kind,
        &generated,
        &clustering,
        &projection,
        &descriptors,
        params,
        &options.keywords,
    );
    let files = write_reports(
        &config.output_dir,
        &generated,
        &rows,
        &projection,
        &clustering,
        &descriptors,
        &summary,
    )?;
    info!(
        files = files.len(),
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Stage: reports"
    );

    info!(
        total_ms = started.elapsed().as_millis() as u64,
        output_dir = %config.output_dir.display(),
        "Analysis complete"
    );

    Ok(AnalyzeOutcome {
        clustering,
        descriptors,
        summary,
        files,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_summary(
    input: &Path,
    text_kind: TextKind,
    generated: &str,
    clustering: &Clustering,
    projection: &Projection,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    params: Option<HdbscanParams>,
    keywords: &KeywordStrategy,
) -> ClusteringSummary {
    let assignments = clustering
        .assignments
        .iter()
        .zip(&projection.standardized)
        .enumerate()
        .map(|(index, (a, coords))| RowAssignment {
            index,
            x: coords.first().copied().unwrap_or(0.0),
            y: coords.get(1).copied().unwrap_or(0.0),
            assignment: *a,
        })
        .collect();

    ClusteringSummary {
        generated: generated.to_string(),
        input: input.to_path_buf(),
        text_kind,
        n_rows: clustering.assignments.len(),
        n_clusters: clustering.n_clusters(),
        n_noise: clustering.n_noise(),
        noise_ratio: clustering.noise_ratio(),
        dbcv: clustering.relative_validity(),
        params,
        keyword_strategy: keywords.clone(),
        clusters: descriptors.values().cloned().collect(),
        assignments,
    }
}

fn write_reports(
    dir: &Path,
    generated: &str,
    rows: &[EmbeddingRow],
    projection: &Projection,
    clustering: &Clustering,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    summary: &ClusteringSummary,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let palette = cluster_colors(&clustering.labels());
    let view = HierarchyView::build(&clustering.tree, &clustering.cluster_map);
    let ctx = ReportContext {
        generated,
        clustering,
        view: &view,
        descriptors,
        palette: &palette,
    };

    let pages = [
        (
            PROJECTION_FILE,
            html_report::projection_page(rows, projection, clustering, descriptors, &palette),
        ),
        (
            TEXT_REPORT_FILE,
            text_report::render(clustering, &view, descriptors, generated),
        ),
        (HTML_REPORT_FILE, html_report::render(&ctx)),
        (
            ANALYSIS_FILE,
            html_report::analysis_page(rows, clustering, descriptors, &palette),
        ),
        (SUMMARY_FILE, serde_json::to_string_pretty(summary)?),
    ];

    let mut files = Vec::with_capacity(pages.len());
    for (name, contents) in pages {
        let path = dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote report");
        files.push(path);
    }
    Ok(files)
}
