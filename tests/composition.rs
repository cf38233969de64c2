// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   table -> projection -> HDBSCAN -> descriptors -> reports
//   table -> projection -> parameter sweep -> Pareto front
// on a small synthetic embedding table written to the system temp dir.

use std::path::{Path, PathBuf};

use claimscape::cluster::params::HdbscanParams;
use claimscape::config::Config;
use claimscape::pipeline::analyze::{self, AnalyzeOptions, ClusterSource};
use claimscape::pipeline::sweep;
use claimscape::table::TextKind;
use claimscape::topics::KeywordStrategy;
use serde_json::{json, Value};

const DIM: usize = 8;
const PER_TOPIC: usize = 20;

const TOPICS: [(&str, usize); 3] = [
    ("the archive preserved letters", 0),
    ("students learned programming quickly", 1),
    ("funding agencies supported research", 2),
];

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("claimscape_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Three well-separated groups of embeddings, one topic each.
fn write_table(dir: &Path, kind: TextKind) -> PathBuf {
    let prefix = kind.as_str();
    let mut lines = Vec::new();
    for (text, axis) in TOPICS {
        for i in 0..PER_TOPIC {
            let embedding: Vec<f32> = (0..DIM)
                .map(|d| {
                    let jitter = ((i * 7 + d * 3) % 23) as f32 / 23.0 * 0.3;
                    if d == axis {
                        5.0 + jitter
                    } else {
                        jitter
                    }
                })
                .collect();
            let mut record = json!({
                "source_file": format!("interview_{axis}.json"),
            });
            record[format!("{prefix}_text")] = json!(format!("{text} {i}"));
            record[format!("{prefix}_embedding")] = json!(embedding);
            if kind == TextKind::Predicate {
                record["subject_text"] = json!("we");
                record["object_text"] = json!(format!("thing {}", i % 3));
            }
            lines.push(record.to_string());
        }
    }
    let path = dir.join("embeddings.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn config(input: PathBuf, output_dir: PathBuf, kind: TextKind) -> Config {
    Config {
        input: Some(input),
        output_dir,
        text_kind: kind,
        ..Config::default()
    }
}

fn options() -> AnalyzeOptions {
    AnalyzeOptions {
        source: ClusterSource::Hdbscan(HdbscanParams::new(10, 4)),
        ..AnalyzeOptions::default()
    }
}

// ============================================================
// Chain: table -> projection -> clustering -> reports
// ============================================================

#[tokio::test]
async fn analyze_finds_topics_and_writes_every_report() {
    let dir = temp_dir("analyze");
    let input = write_table(&dir, TextKind::Claim);
    let out = dir.join("out");
    let cfg = config(input, out.clone(), TextKind::Claim);

    let outcome = analyze::run(&cfg, &options()).await.unwrap();

    assert_eq!(outcome.clustering.n_clusters(), 3);
    assert_eq!(outcome.files.len(), 5);
    for name in [
        analyze::PROJECTION_FILE,
        analyze::TEXT_REPORT_FILE,
        analyze::HTML_REPORT_FILE,
        analyze::ANALYSIS_FILE,
        analyze::SUMMARY_FILE,
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }

    // Rows of one topic share a label, and that cluster's keywords name the topic
    let label = outcome.clustering.assignments[0].label.unwrap();
    assert!(outcome.clustering.members(label).iter().all(|&i| i < PER_TOPIC));
    assert!(outcome.descriptors[&label]
        .keywords
        .contains(&"archive".to_string()));

    let summary: Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(analyze::SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(summary["n_clusters"], 3);
    assert_eq!(summary["n_rows"], 60);
    assert_eq!(summary["keyword_strategy"]["kind"], "frequency");
    assert_eq!(summary["assignments"].as_array().unwrap().len(), 60);
    assert!(summary["dbcv_score"].as_f64().unwrap() > 0.0);

    let text = std::fs::read_to_string(out.join(analyze::TEXT_REPORT_FILE)).unwrap();
    assert!(text.contains("Number of clusters: 3"));
    let html = std::fs::read_to_string(out.join(analyze::HTML_REPORT_FILE)).unwrap();
    assert!(html.contains("id=\"cluster-0\""));
    let projection = std::fs::read_to_string(out.join(analyze::PROJECTION_FILE)).unwrap();
    assert!(projection.contains("<svg"));
}

#[tokio::test]
async fn predicate_tables_keep_triples_in_samples() {
    let dir = temp_dir("predicates");
    let input = write_table(&dir, TextKind::Predicate);
    let cfg = config(input, dir.join("out"), TextKind::Predicate);
    let opts = AnalyzeOptions {
        keywords: KeywordStrategy::phrases(),
        unique_triples: true,
        ..options()
    };

    let outcome = analyze::run(&cfg, &opts).await.unwrap();
    for d in outcome.descriptors.values() {
        assert!(!d.samples.is_empty());
        assert!(d.samples.iter().all(|s| s.is_triple()));
    }
}

#[tokio::test]
async fn imported_clustering_must_match_the_table() {
    let dir = temp_dir("import");
    let input = write_table(&dir, TextKind::Claim);
    let clustering = dir.join("clustering.json");
    std::fs::write(&clustering, r#"{"labels": [0, 0, 1]}"#).unwrap();
    let cfg = config(input, dir.join("out"), TextKind::Claim);
    let opts = AnalyzeOptions {
        source: ClusterSource::Import(clustering),
        ..options()
    };

    let err = analyze::run(&cfg, &opts).await.unwrap_err();
    assert!(err.to_string().contains("assignments"));
}

#[tokio::test]
async fn imported_clustering_drives_the_reports() {
    let dir = temp_dir("import_ok");
    let input = write_table(&dir, TextKind::Claim);
    let labels: Vec<i64> = (0..3 * PER_TOPIC).map(|i| (i / PER_TOPIC) as i64).collect();
    let clustering = dir.join("clustering.json");
    std::fs::write(&clustering, json!({ "labels": labels }).to_string()).unwrap();
    let out = dir.join("out");
    let cfg = config(input, out.clone(), TextKind::Claim);
    let opts = AnalyzeOptions {
        source: ClusterSource::Import(clustering),
        ..options()
    };

    let outcome = analyze::run(&cfg, &opts).await.unwrap();
    assert_eq!(outcome.clustering.n_clusters(), 3);
    assert!(outcome.summary.params.is_none());
    assert!(out.join(analyze::HTML_REPORT_FILE).exists());
}

#[tokio::test]
async fn missing_input_is_reported() {
    let cfg = Config::default();
    let err = analyze::run(&cfg, &options()).await.unwrap_err();
    assert!(err.to_string().contains("CLAIMSCAPE_INPUT"));
}

// ============================================================
// Chain: table -> sweep -> Pareto front
// ============================================================

#[tokio::test]
async fn assessment_feeds_pareto_front() {
    let dir = temp_dir("sweep");
    let input = write_table(&dir, TextKind::Claim);
    let out = dir.join("out");
    let cfg = config(input, out.clone(), TextKind::Claim);

    let assessed = sweep::run_assessment(&cfg, &[5, 10], &[2, 4], 2, 2)
        .await
        .unwrap();
    assert_eq!(assessed.results.len(), 4);
    // results JSON plus three heatmaps
    assert_eq!(assessed.files.len(), 4);
    let heatmap = std::fs::read_to_string(&assessed.files[3]).unwrap();
    assert!(heatmap.contains("class=\"chosen\""));

    let front = sweep::run_pareto(&out.join(sweep::ASSESSMENT_FILE), &out).unwrap();
    assert!(!front.results.is_empty());
    assert!(front.results.len() <= assessed.results.len());
    assert!(out.join(sweep::PARETO_PAGE).exists());
}

#[tokio::test]
async fn optimize_lands_in_target_range() {
    let dir = temp_dir("optimize");
    let input = write_table(&dir, TextKind::Claim);
    let cfg = config(input, dir.join("out"), TextKind::Claim);

    let outcome = sweep::run_optimize(&cfg, &[10, 15], (2, 4), 2).await.unwrap();
    assert!(outcome.in_range);
    assert_eq!(outcome.chosen.n_clusters, 3);
    assert_eq!(outcome.chosen.min_cluster_size, 10);
    assert_eq!(outcome.tried.len(), 1);
}
