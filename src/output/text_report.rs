// Plain-text hierarchical clustering report.

use std::collections::{BTreeMap, BTreeSet};

use super::group_thousands;
use crate::cluster::Clustering;
use crate::hierarchy::HierarchyView;
use crate::topics::ClusterDescriptor;

const RULE: usize = 80;
const SUBRULE: usize = 40;

/// Render the report. `generated` is the timestamp printed in the header.
pub fn render(
    clustering: &Clustering,
    view: &HierarchyView,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    generated: &str,
) -> String {
    let total = clustering.assignments.len();
    let noise = clustering.n_noise();
    let mut out = String::new();

    out.push_str(&"=".repeat(RULE));
    out.push_str("\nHIERARCHICAL CLUSTERING ANALYSIS REPORT\n");
    out.push_str(&format!("Generated: {generated}\n"));
    out.push_str(&"=".repeat(RULE));
    out.push_str("\n\n");

    out.push_str("OVERALL STATISTICS\n");
    out.push_str(&"-".repeat(SUBRULE));
    out.push('\n');
    out.push_str(&format!("Total embeddings: {}\n", group_thousands(total)));
    out.push_str(&format!("Number of clusters: {}\n", clustering.n_clusters()));
    out.push_str(&format!(
        "Noise points: {} ({:.2}%)\n",
        group_thousands(noise),
        clustering.noise_ratio() * 100.0
    ));
    if let Some(score) = clustering.relative_validity() {
        out.push_str(&format!("Relative validity (DBCV): {score:.4}\n"));
    }
    out.push('\n');

    out.push_str("CLUSTER HIERARCHY (from Condensed Tree)\n");
    out.push_str(&"-".repeat(SUBRULE));
    out.push('\n');
    if view.roots().is_empty() {
        out.push_str("No condensed tree available.\n");
    }
    for &root in view.roots() {
        write_node(&mut out, view, root, 0);
    }

    out.push_str("\n\nDETAILED CLUSTER INFORMATION\n");
    out.push_str(&"=".repeat(RULE));
    out.push_str("\n\n");
    for d in descriptors.values() {
        out.push_str(&format!("CLUSTER {}\n", d.cluster_id));
        out.push_str(&"-".repeat(SUBRULE));
        out.push('\n');
        out.push_str(&format!("Size: {} embeddings\n", d.size));
        out.push_str(&format!("Avg. Confidence: {:.3}\n", d.mean_probability));
        if !d.keywords.is_empty() {
            out.push_str(&format!("Top Keywords: {}\n", d.keywords.join(", ")));
        }
        let hypernyms: BTreeSet<&str> = d.hypernyms.values().flatten().map(String::as_str).collect();
        if !hypernyms.is_empty() {
            let joined: Vec<&str> = hypernyms.into_iter().collect();
            out.push_str(&format!("WordNet Hypernyms: {}\n", joined.join("; ")));
        }
        out.push('\n');
    }
    out
}

fn write_node(out: &mut String, view: &HierarchyView, node: usize, level: usize) {
    let size = view.node_size(node);
    if size <= 1 {
        return;
    }
    out.push_str(&format!("{}└─ Node {node} (size: {size})\n", "  ".repeat(level)));
    for &child in view.children(node) {
        write_node(out, view, child, level + 1);
    }
}
