// Standalone HTML reports.
//
// `render` builds the hierarchical report: overall statistics, the
// collapsible condensed-tree view, and one card per cluster with keywords,
// sample rows and (when available) verb hypernyms. `projection_page` and
// `analysis_page` wrap the SVG charts. All user-supplied text is escaped.

use std::collections::BTreeMap;

use super::charts::{self, Bar, BoxSeries, ScatterPoint};
use super::palette::Palette;
use super::{escape_html, format_hover_text, group_thousands};
use crate::cluster::Clustering;
use crate::hierarchy::HierarchyView;
use crate::reduce::Projection;
use crate::table::EmbeddingRow;
use crate::topics::{ClusterDescriptor, SampleRow};

/// Everything the hierarchical report needs.
pub struct ReportContext<'a> {
    pub generated: &'a str,
    pub clustering: &'a Clustering,
    pub view: &'a HierarchyView,
    pub descriptors: &'a BTreeMap<usize, ClusterDescriptor>,
    pub palette: &'a Palette,
}

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f8f9fa; margin: 0; padding: 20px; }
.container { max-width: 1200px; margin: auto; background: #fff; padding: 30px; border-radius: 8px; box-shadow: 0 4px 12px rgba(0,0,0,0.08); }
h1, h2, h3 { color: #0056b3; border-bottom: 2px solid #e9ecef; padding-bottom: 10px; }
h1 { font-size: 2.2em; text-align: center; }
h2 { font-size: 1.8em; margin-top: 40px; }
.toc { background: #f8f9fa; padding: 15px 25px; border-radius: 8px; }
.toc a { text-decoration: none; color: #0056b3; }
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; margin-bottom: 30px; }
.stat-card { background: #f8f9fa; padding: 20px; border-radius: 8px; border-left: 5px solid #007bff; text-align: center; }
.stat-card .value { font-size: 2.5em; font-weight: bold; color: #0056b3; }
.stat-card .label { color: #6c757d; }
.tree-container { background: #f8f9fa; padding: 20px; border-radius: 8px; overflow-x: auto; }
.tree ul { list-style-type: none; padding-left: 20px; }
.tree li { position: relative; padding: 4px 0 4px 25px; }
.tree .node-content { display: flex; align-items: center; cursor: pointer; border-radius: 5px; padding: 5px; white-space: nowrap; }
.tree .node-content:hover { background-color: #e9ecef; }
.tree .toggle { font-family: monospace; font-size: 1.2em; margin-right: 8px; width: 20px; text-align: center; color: #6c757d; }
.tree .node-id { font-weight: bold; color: #0056b3; }
.tree .node-size { color: #28a745; }
.tree .node-lambda { color: #dc3545; }
.tree .final-cluster-node { font-weight: bold; border: 1px solid; padding: 2px 6px; border-radius: 4px; text-decoration: none; }
.tree .node-keywords { color: #555; font-style: italic; margin-left: 10px; font-size: 0.9em; }
.tree ul.collapsed { display: none; }
.cluster-card { border: 1px solid #dee2e6; border-radius: 8px; margin-bottom: 20px; padding: 20px; }
.cluster-card h3 { border-left: 5px solid; padding-left: 15px; margin-top: 0; }
.keywords span { background-color: #e9ecef; padding: 3px 8px; border-radius: 4px; margin-right: 5px; font-family: monospace; }
.sample-item { background: #f8f9fa; border: 1px solid #e9ecef; padding: 15px; border-radius: 6px; margin-bottom: 10px; }
.sample-item.sample-item-hidden { display: none; }
.toggle-samples-btn { background-color: #007bff; color: white; border: none; padding: 8px 15px; border-radius: 5px; cursor: pointer; font-size: 0.9em; margin-top: 10px; }
.toggle-samples-btn:hover { background-color: #0056b3; }
.sample-triple { display: flex; align-items: center; gap: 10px; flex-wrap: wrap; }
.sample-triple .part { padding: 5px 10px; border-radius: 5px; }
.sample-triple .subject { background-color: #d1ecf1; color: #0c5460; }
.sample-triple .predicate { background-color: #fff3cd; color: #856404; font-weight: bold; }
.sample-triple .object { background-color: #d4edda; color: #155724; }
.sample-triple .claim { background-color: #f8d7da; color: #721c24; font-style: italic; }
.sample-triple .arrow { color: #6c757d; font-weight: bold; }
.sample-meta { display: flex; flex-wrap: wrap; gap: 15px; font-size: 0.85em; margin-top: 10px; border-top: 1px solid #e9ecef; padding-top: 10px; }
.sample-meta span { background-color: #e0e0e0; padding: 2px 8px; border-radius: 10px; }
.meta-label { font-weight: bold; color: #555; }
.hypernym-item { margin-bottom: 15px; }
.hypernym-item .verb { font-weight: bold; color: #0056b3; }
.hypernym-list li { background-color: #e9ecef; padding: 3px 8px; border-radius: 4px; margin: 3px; display: inline-block; }
"#;

const SCRIPT: &str = r#"
document.getElementById('hierarchy-tree').addEventListener('click', function (e) {
    const target = e.target.closest('.node-content');
    if (!target) return;
    const childUl = target.parentElement.querySelector('ul');
    if (childUl) {
        childUl.classList.toggle('collapsed');
        target.querySelector('.toggle').textContent = childUl.classList.contains('collapsed') ? '[+]' : '[-]';
    }
});
document.addEventListener('click', function (e) {
    if (!e.target.classList.contains('toggle-samples-btn')) return;
    const items = e.target.closest('.cluster-card').querySelectorAll('.sample-item');
    for (let i = VISIBLE_SAMPLES; i < items.length; i++) {
        items[i].classList.toggle('sample-item-hidden');
    }
    if (e.target.dataset.state === 'expanded') {
        e.target.textContent = 'Show more (' + (items.length - VISIBLE_SAMPLES) + ')';
        e.target.dataset.state = 'collapsed';
    } else {
        e.target.textContent = 'Collapse';
        e.target.dataset.state = 'expanded';
    }
});
"#;

/// Samples shown per cluster card before the "Show more" button.
const VISIBLE_SAMPLES: usize = 10;

/// The hierarchical clustering report.
pub fn render(ctx: &ReportContext<'_>) -> String {
    let c = ctx.clustering;
    let has_hypernyms = ctx.descriptors.values().any(|d| !d.hypernyms.is_empty());

    let mut html = String::new();
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Hierarchical Clustering Report</title>\n<style>",
    );
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");
    html.push_str("<h1>Hierarchical Clustering Report</h1>\n");
    html.push_str(&format!(
        "<p style=\"text-align:center; color:#6c757d;\">Generated: {}</p>\n",
        escape_html(ctx.generated)
    ));

    html.push_str(&toc(ctx.descriptors, has_hypernyms));

    html.push_str("<h2 id=\"statistics\">Overall Statistics</h2>\n<div class=\"stats-grid\">\n");
    html.push_str(&stat_card(&group_thousands(c.assignments.len()), "Total Embeddings", None));
    html.push_str(&stat_card(&c.n_clusters().to_string(), "Clusters Found", None));
    html.push_str(&stat_card(
        &group_thousands(c.n_noise()),
        &format!("Noise Points ({:.1}%)", c.noise_ratio() * 100.0),
        Some("#ffc107"),
    ));
    if let Some(score) = c.relative_validity() {
        html.push_str(&stat_card(&format!("{score:.3}"), "Relative Validity (DBCV)", Some("#28a745")));
    }
    html.push_str("</div>\n");

    html.push_str("<h2 id=\"hierarchy\">Cluster Hierarchy</h2>\n<div class=\"tree-container\">\n");
    html.push_str(
        "<p>Tree view of the cluster hierarchy. Nodes with size = 1 are hidden. \
         Click [+] to expand/collapse branches.</p>\n",
    );
    html.push_str("<div class=\"tree\" id=\"hierarchy-tree\">");
    html.push_str(&tree_html(ctx));
    html.push_str("</div>\n</div>\n");

    html.push_str("<h2 id=\"cluster-details\">Cluster Details</h2>\n");
    for d in ctx.descriptors.values() {
        html.push_str(&cluster_card(d, ctx.palette));
    }

    if has_hypernyms {
        html.push_str("<h2 id=\"hypernyms\">WordNet Hypernym Analysis</h2>\n");
        html.push_str(
            "<p>Verbs found in cluster keywords and their more general concepts \
             (e.g. 'move' is a hypernym of 'run').</p>\n",
        );
        for d in ctx.descriptors.values().filter(|d| !d.hypernyms.is_empty()) {
            html.push_str(&hypernym_block(d, ctx.palette));
        }
    }

    html.push_str("</div>\n<script>");
    html.push_str(&format!("const VISIBLE_SAMPLES = {VISIBLE_SAMPLES};"));
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn toc(descriptors: &BTreeMap<usize, ClusterDescriptor>, has_hypernyms: bool) -> String {
    let mut html = String::from("<div class=\"toc\"><b>Contents</b><ul>");
    html.push_str("<li><a href=\"#statistics\">Overall Statistics</a></li>");
    html.push_str("<li><a href=\"#hierarchy\">Cluster Hierarchy</a></li>");
    html.push_str("<li><a href=\"#cluster-details\">Cluster Details</a><ul>");
    for d in descriptors.values() {
        html.push_str(&format!(
            "<li><a href=\"#cluster-{id}\">Cluster {id}</a> ({} items)</li>",
            d.size,
            id = d.cluster_id
        ));
    }
    html.push_str("</ul></li>");
    if has_hypernyms {
        html.push_str("<li><a href=\"#hypernyms\">WordNet Hypernym Analysis</a></li>");
    }
    html.push_str("</ul></div>\n");
    html
}

fn stat_card(value: &str, label: &str, border: Option<&str>) -> String {
    let style = border
        .map(|c| format!(" style=\"border-color: {c};\""))
        .unwrap_or_default();
    format!(
        "<div class=\"stat-card\"{style}><div class=\"value\">{}</div><div class=\"label\">{}</div></div>\n",
        escape_html(value),
        escape_html(label)
    )
}

fn format_lambda(lambda: f64) -> String {
    if lambda.is_finite() {
        format!("{lambda:.4}")
    } else {
        "inf".to_string()
    }
}

/// The nested `<ul>` tree, starting from every visible root.
pub fn tree_html(ctx: &ReportContext<'_>) -> String {
    let mut html = String::from("<ul>");
    for &root in ctx.view.roots() {
        node_html(ctx, root, &mut html);
    }
    html.push_str("</ul>");
    html
}

fn node_html(ctx: &ReportContext<'_>, node: usize, html: &mut String) {
    let view = ctx.view;
    let size = view.node_size(node);
    if size <= 1 {
        return;
    }
    let expandable = view.has_visible_children(node);

    html.push_str("<li>");
    html.push_str(&format!(
        "<div class=\"node-content\" data-node-id=\"{node}\"><span class=\"toggle\">{}</span><span class=\"node-details\">",
        if expandable { "[+]" } else { " " }
    ));
    html.push_str(&format!(
        "<span class=\"node-id\">Node {node}</span> | <span class=\"node-size\">Size: {size}</span> | <span class=\"node-lambda\">&lambda;: {}</span>",
        format_lambda(view.lambda(node))
    ));
    if let Some(label) = view.cluster_of(node) {
        let color = ctx.palette.color(Some(label));
        html.push_str(&format!(
            " &rarr; <a href=\"#cluster-{label}\" class=\"final-cluster-node\" style=\"border-color:{color}; color:{color};\">Cluster {label}</a>"
        ));
        if let Some(d) = ctx.descriptors.get(&label) {
            if !d.keywords.is_empty() {
                let preview: Vec<&str> = d.keywords.iter().take(3).map(String::as_str).collect();
                html.push_str(&format!(
                    "<span class=\"node-keywords\"><i>- {}...</i></span>",
                    escape_html(&preview.join(", "))
                ));
            }
        }
    }
    html.push_str("</span></div>");

    if expandable {
        html.push_str("<ul class=\"collapsed\">");
        for &child in view.children(node) {
            node_html(ctx, child, html);
        }
        html.push_str("</ul>");
    }
    html.push_str("</li>");
}

fn cluster_card(d: &ClusterDescriptor, palette: &Palette) -> String {
    let color = palette.color(Some(d.cluster_id));
    let keywords: String = d
        .keywords
        .iter()
        .map(|k| format!("<span>{}</span>", escape_html(k)))
        .collect();
    let mut samples: String = d
        .samples
        .iter()
        .enumerate()
        .map(|(i, s)| sample_html(s, i >= VISIBLE_SAMPLES))
        .collect();
    if d.samples.len() > VISIBLE_SAMPLES {
        samples.push_str(&format!(
            "<button class=\"toggle-samples-btn\" data-state=\"collapsed\">Show more ({})</button>\n",
            d.samples.len() - VISIBLE_SAMPLES
        ));
    }
    let heading = if d.samples.iter().any(SampleRow::is_triple) {
        "Sample Triples"
    } else {
        "Sample Items"
    };

    format!(
        "<div class=\"cluster-card\" id=\"cluster-{id}\">\n\
         <h3 style=\"border-color: {color};\">Cluster {id}</h3>\n\
         <p><b>Size:</b> {size} | <b>Avg. Confidence:</b> {conf:.3}</p>\n\
         <div class=\"keywords\"><b>Keywords:</b> {keywords}</div>\n\
         <div><b>{heading} (Top {n} by Confidence):</b><div class=\"samples-container\">{samples}</div></div>\n\
         </div>\n",
        id = d.cluster_id,
        size = group_thousands(d.size),
        conf = d.mean_probability,
        n = d.samples.len(),
    )
}

fn sample_html(s: &SampleRow, hidden: bool) -> String {
    let body = match (&s.subject_text, &s.object_text) {
        (Some(subject), Some(object)) => format!(
            "<span class=\"part subject\">{}</span><span class=\"arrow\">&rarr;</span>\
             <span class=\"part predicate\">{}</span><span class=\"arrow\">&rarr;</span>\
             <span class=\"part object\">{}</span>",
            escape_html(subject),
            escape_html(&s.text),
            escape_html(object)
        ),
        _ => format!("<span class=\"part claim\">\"{}\"</span>", escape_html(&s.text)),
    };
    format!(
        "<div class=\"sample-item{}\"><div class=\"sample-triple\">{body}</div>\
         <div class=\"sample-meta\">\
         <span><span class=\"meta-label\">Source:</span> {}</span>\
         <span><span class=\"meta-label\">Index:</span> {}</span>\
         <span><span class=\"meta-label\">Confidence:</span> {:.3}</span>\
         <span><span class=\"meta-label\">Outlier Score:</span> {:.3}</span>\
         </div></div>\n",
        if hidden { " sample-item-hidden" } else { "" },
        escape_html(&s.source_file),
        s.index,
        s.probability,
        s.outlier_score
    )
}

fn hypernym_block(d: &ClusterDescriptor, palette: &Palette) -> String {
    let mut html = format!(
        "<h3 style=\"border-left: 5px solid {}; padding-left: 15px;\">Cluster {}</h3>\n",
        palette.color(Some(d.cluster_id)),
        d.cluster_id
    );
    for (verb, hypers) in &d.hypernyms {
        let items: String = hypers
            .iter()
            .map(|h| format!("<li>{}</li>", escape_html(h)))
            .collect();
        html.push_str(&format!(
            "<div class=\"hypernym-item\"><span class=\"verb\">{}</span><ul class=\"hypernym-list\">{items}</ul></div>\n",
            escape_html(verb)
        ));
    }
    html
}

/// Hover text for one row in the projection scatter.
pub fn hover_text(row: &EmbeddingRow, label: Option<usize>, probability: f64, outlier: f64) -> String {
    let cluster = label.map_or_else(|| "Noise".to_string(), |l| format!("Cluster {l}"));
    format!(
        "{cluster}\nConfidence: {probability:.3}\nOutlier Score: {outlier:.3}\nSource: {}\nIndex: {}\n\nText: {}",
        row.source_file,
        row.index,
        format_hover_text(&row.text, 200)
    )
}

/// Projection scatter plus the cluster size bars.
pub fn projection_page(
    rows: &[EmbeddingRow],
    projection: &Projection,
    clustering: &Clustering,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    palette: &Palette,
) -> String {
    let points: Vec<ScatterPoint> = projection
        .standardized
        .iter()
        .zip(rows)
        .zip(&clustering.assignments)
        .map(|((coords, row), a)| ScatterPoint {
            x: coords.first().copied().unwrap_or(0.0),
            y: coords.get(1).copied().unwrap_or(0.0),
            label: a.label,
            hover: hover_text(row, a.label, a.probability, a.outlier_score),
        })
        .collect();

    let title = format!("Embedding Projection ({} clusters)", clustering.n_clusters());
    let mut body = String::from("<div class=\"chart\">");
    body.push_str(&charts::scatter_svg(&points, palette, &title));
    body.push_str("</div>\n<div class=\"chart\">");
    body.push_str(&charts::bar_svg(&size_bars(clustering, descriptors, palette), "Cluster Sizes"));
    body.push_str("</div>\n<h2>Legend</h2>\n<ul>");
    for d in descriptors.values() {
        body.push_str(&format!(
            "<li><span style=\"color:{}\">&#9679;</span> C{}: {}</li>",
            palette.color(Some(d.cluster_id)),
            d.cluster_id,
            escape_html(&super::truncate_chars(&d.keywords.join(", "), 30))
        ));
    }
    body.push_str("</ul>\n");
    charts::html_page("Embedding Visualization", &body)
}

fn size_bars(
    clustering: &Clustering,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    palette: &Palette,
) -> Vec<Bar> {
    let mut bars = Vec::new();
    let noise = clustering.n_noise();
    if noise > 0 {
        bars.push(Bar {
            label: "Noise".to_string(),
            value: noise as f64,
            color: palette.color(None).to_string(),
        });
    }
    bars.extend(descriptors.values().map(|d| Bar {
        label: format!("C{}", d.cluster_id),
        value: d.size as f64,
        color: palette.color(Some(d.cluster_id)).to_string(),
    }));
    bars
}

/// Size, confidence, outlier-score and source-file breakdowns.
pub fn analysis_page(
    rows: &[EmbeddingRow],
    clustering: &Clustering,
    descriptors: &BTreeMap<usize, ClusterDescriptor>,
    palette: &Palette,
) -> String {
    let series = |pick: fn(&crate::cluster::ClusterAssignment) -> f64| -> Vec<BoxSeries> {
        descriptors
            .keys()
            .map(|&label| BoxSeries {
                name: format!("C{label}"),
                values: clustering
                    .members(label)
                    .into_iter()
                    .map(|i| pick(&clustering.assignments[i]))
                    .collect(),
                color: palette.color(Some(label)).to_string(),
            })
            .collect()
    };

    let mut sources: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *sources.entry(row.source_file.as_str()).or_default() += 1;
    }
    let mut top_sources: Vec<(&str, usize)> = sources.into_iter().collect();
    top_sources.sort_by(|a, b| b.1.cmp(&a.1));
    let source_bars: Vec<Bar> = top_sources
        .into_iter()
        .take(10)
        .map(|(name, count)| Bar {
            label: name.to_string(),
            value: count as f64,
            color: "#add8e6".to_string(),
        })
        .collect();

    let mut body = String::from("<div class=\"grid\">");
    for chart in [
        charts::bar_svg(&size_bars(clustering, descriptors, palette), "Cluster Size Distribution"),
        charts::box_svg(&series(|a| a.probability), "Cluster Confidence Distribution"),
        charts::box_svg(&series(|a| a.outlier_score), "Outlier Score by Cluster"),
        charts::hbar_svg(&source_bars, "Source File Distribution"),
    ] {
        body.push_str("<div class=\"chart\">");
        body.push_str(&chart);
        body.push_str("</div>\n");
    }
    body.push_str("</div>\n");
    charts::html_page("Cluster Analysis Report", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::condensed::{CondensedRow, CondensedTree};
    use crate::cluster::ClusterAssignment;
    use crate::output::palette::cluster_colors;

    fn fixture() -> (Clustering, HierarchyView, BTreeMap<usize, ClusterDescriptor>) {
        let rows = vec![
            CondensedRow { parent: 4, child: 5, lambda: 0.5, child_size: 2 },
            CondensedRow { parent: 4, child: 6, lambda: 0.5, child_size: 2 },
            CondensedRow { parent: 5, child: 0, lambda: 2.0, child_size: 1 },
            CondensedRow { parent: 5, child: 1, lambda: 2.0, child_size: 1 },
            CondensedRow { parent: 6, child: 2, lambda: 2.0, child_size: 1 },
            CondensedRow { parent: 6, child: 3, lambda: 2.0, child_size: 1 },
        ];
        let tree = CondensedTree::new(4, rows);
        let map = BTreeMap::from([(0, 5), (1, 6)]);
        let clustering = Clustering {
            assignments: [Some(0), Some(0), Some(1), Some(1)]
                .into_iter()
                .map(|label| ClusterAssignment { label, probability: 0.9, outlier_score: 0.1 })
                .collect(),
            tree: tree.clone(),
            cluster_map: map.clone(),
            mst: Vec::new(),
        };
        let view = HierarchyView::build(&tree, &map);
        let descriptor = |id: usize, subject: Option<&str>| ClusterDescriptor {
            cluster_id: id,
            size: 2,
            mean_probability: 0.9,
            keywords: vec!["<script>".to_string(), "archive".to_string()],
            top_terms: Vec::new(),
            hypernyms: BTreeMap::new(),
            samples: vec![SampleRow {
                index: id,
                text: "built the archive".to_string(),
                source_file: "a & b.json".to_string(),
                subject_text: subject.map(String::from),
                object_text: subject.map(|_| "collection".to_string()),
                probability: 0.9,
                outlier_score: 0.1,
            }],
        };
        let mut descriptors = BTreeMap::from([(0, descriptor(0, None)), (1, descriptor(1, Some("she")))]);
        if let Some(d) = descriptors.get_mut(&1) {
            d.hypernyms.insert("built".to_string(), vec!["make".to_string()]);
        }
        (clustering, view, descriptors)
    }

    #[test]
    fn report_has_tree_cards_and_escaping() {
        let (clustering, view, descriptors) = fixture();
        let palette = cluster_colors(&clustering.labels());
        let html = render(&ReportContext {
            generated: "now",
            clustering: &clustering,
            view: &view,
            descriptors: &descriptors,
            palette: &palette,
        });
        assert!(html.contains("data-node-id=\"4\""));
        assert!(html.contains("<span class=\"toggle\">[+]</span>"));
        assert!(html.contains("<ul class=\"collapsed\">"));
        assert!(html.contains("href=\"#cluster-1\""));
        assert!(html.contains("id=\"cluster-0\""));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<span><script>"));
        assert!(html.contains("a &amp; b.json"));
        assert!(html.contains("class=\"part subject\">she"));
        assert!(html.contains("WordNet Hypernym Analysis"));
        assert!(html.contains("<li>make</li>"));
    }

    #[test]
    fn leaf_clusters_have_no_toggle() {
        let (clustering, view, descriptors) = fixture();
        let palette = cluster_colors(&clustering.labels());
        let ctx = ReportContext {
            generated: "now",
            clustering: &clustering,
            view: &view,
            descriptors: &descriptors,
            palette: &palette,
        };
        let tree = tree_html(&ctx);
        assert!(tree.contains("data-node-id=\"5\"><span class=\"toggle\"> </span>"));
        assert!(!tree.contains("data-node-id=\"0\""));
    }

    #[test]
    fn long_sample_lists_collapse_after_ten() {
        let (clustering, view, mut descriptors) = fixture();
        if let Some(d) = descriptors.get_mut(&0) {
            let first = d.samples[0].clone();
            d.samples = (0..12).map(|i| SampleRow { index: i, ..first.clone() }).collect();
        }
        let palette = cluster_colors(&clustering.labels());
        let html = render(&ReportContext {
            generated: "now",
            clustering: &clustering,
            view: &view,
            descriptors: &descriptors,
            palette: &palette,
        });
        assert_eq!(html.matches("class=\"sample-item sample-item-hidden\"").count(), 2);
        assert_eq!(html.matches("\">Show more (").count(), 1);
        assert!(html.contains("data-state=\"collapsed\">Show more (2)</button>"));
        assert!(html.contains("const VISIBLE_SAMPLES = 10;"));
    }

    #[test]
    fn hover_text_labels_noise() {
        let row = EmbeddingRow {
            index: 3,
            text: "a  b".to_string(),
            source_file: "s".to_string(),
            embedding: vec![],
            subject_text: None,
            object_text: None,
        };
        let text = hover_text(&row, None, 0.0, 0.5);
        assert!(text.starts_with("Noise\n"));
        assert!(text.ends_with("Text: a b"));
    }
}
