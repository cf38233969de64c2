// Colored terminal output for cluster summaries and parameter sweeps.
//
// This module handles all terminal-specific formatting: colors and tables.
// The main.rs subcommands delegate here.

use std::collections::BTreeMap;

use colored::Colorize;

use crate::assess::{AssessmentResult, OptimizeOutcome};
use crate::cluster::Clustering;
use crate::topics::ClusterDescriptor;

/// Display the overall numbers and one line per cluster.
pub fn display_cluster_summary(
    clustering: &Clustering,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
) {
    let total = clustering.assignments.len();
    println!(
        "\n{}",
        format!(
            "=== Clustering Summary ({} clusters, {} rows) ===",
            clustering.n_clusters(),
            total
        )
        .bold()
    );
    println!(
        "  Noise: {} ({:.1}%)",
        clustering.n_noise(),
        clustering.noise_ratio() * 100.0
    );
    if let Some(score) = clustering.relative_validity() {
        println!("  Relative validity: {}", colorize_validity(score));
    }
    println!();

    if descriptors.is_empty() {
        println!("  No clusters found. Try a smaller min_cluster_size.");
        return;
    }

    println!(
        "  {:>7}  {:>6}  {:>6}  {}",
        "Cluster".dimmed(),
        "Size".dimmed(),
        "Conf".dimmed(),
        "Keywords".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());
    for d in descriptors.values() {
        let keywords = super::truncate_chars(&d.keywords.join(", "), 56);
        println!(
            "  {:>7}  {:>6}  {:>6.3}  {}",
            format!("C{}", d.cluster_id),
            d.size,
            d.mean_probability,
            keywords
        );
    }
    println!();
}

/// Display sweep results as a table, best relative validity highlighted.
pub fn display_assessment(results: &[AssessmentResult]) {
    if results.is_empty() {
        println!("No assessment results.");
        return;
    }
    let best = results
        .iter()
        .filter_map(|r| r.dbcv)
        .fold(f64::NEG_INFINITY, f64::max);

    println!(
        "\n{}",
        format!("=== Parameter Assessment ({} runs) ===", results.len()).bold()
    );
    println!(
        "  {:>5}  {:>5}  {:>8}  {:>7}  {:>8}",
        "mcs".dimmed(),
        "ms".dimmed(),
        "clusters".dimmed(),
        "noise".dimmed(),
        "dbcv".dimmed(),
    );
    println!("  {}", "-".repeat(42).dimmed());
    for r in results {
        let dbcv = match r.dbcv {
            Some(d) if d == best => format!("{d:>8.4}").green().bold().to_string(),
            Some(d) => format!("{d:>8.4}"),
            None => format!("{:>8}", "n/a").dimmed().to_string(),
        };
        println!(
            "  {:>5}  {:>5}  {:>8}  {:>6.1}%  {}",
            r.min_cluster_size,
            r.min_samples,
            r.n_clusters,
            r.noise_ratio * 100.0,
            dbcv
        );
    }
    println!();
}

pub fn display_optimize(outcome: &OptimizeOutcome, target: (usize, usize)) {
    for r in &outcome.tried {
        println!(
            "  Params: size={}, samples={} -> Clusters: {}, Noise: {:.1}%",
            r.min_cluster_size,
            r.min_samples,
            r.n_clusters,
            r.noise_ratio * 100.0
        );
    }
    let c = &outcome.chosen;
    let verdict = if outcome.in_range {
        format!("within target range {}..={}", target.0, target.1).green()
    } else {
        format!("closest to target range {}..={}", target.0, target.1).yellow()
    };
    println!(
        "\n  {} min_cluster_size={}, min_samples={} ({} clusters, {})",
        "Chosen:".bold(),
        c.min_cluster_size,
        c.min_samples,
        c.n_clusters,
        verdict
    );
}

fn colorize_validity(score: f64) -> colored::ColoredString {
    let text = format!("{score:.4}");
    if score >= 0.5 {
        text.green()
    } else if score >= 0.2 {
        text.yellow()
    } else {
        text.red()
    }
}
