// Per-cluster descriptions: keywords, hypernyms and the most confident rows.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;

use super::hypernyms::{verb_hypernyms_for, HypernymSource};
use super::keywords::KeywordStrategy;
use super::traits::TermScore;
use crate::cluster::Clustering;
use crate::table::EmbeddingRow;

/// How many of the most confident rows are considered for unique triples.
const TRIPLE_POOL: usize = 200;

/// A representative row shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub index: usize,
    pub text: String,
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_text: Option<String>,
    pub probability: f64,
    pub outlier_score: f64,
}

impl SampleRow {
    pub fn is_triple(&self) -> bool {
        self.subject_text.is_some() && self.object_text.is_some()
    }
}

/// Everything the reports say about one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterDescriptor {
    pub cluster_id: usize,
    pub size: usize,
    pub mean_probability: f64,
    pub keywords: Vec<String>,
    pub top_terms: Vec<TermScore>,
    /// Verb -> hypernyms, empty when no lexicon was supplied
    pub hypernyms: BTreeMap<String, Vec<String>>,
    pub samples: Vec<SampleRow>,
}

pub struct DescribeOptions<'a> {
    pub strategy: KeywordStrategy,
    pub sample_count: usize,
    /// Deduplicate samples by (subject, text, object)
    pub unique_triples: bool,
    pub hypernyms: Option<&'a dyn HypernymSource>,
}

impl Default for DescribeOptions<'_> {
    fn default() -> Self {
        Self {
            strategy: KeywordStrategy::default(),
            sample_count: 5,
            unique_triples: false,
            hypernyms: None,
        }
    }
}

/// Describe every non-noise cluster, keyed by label.
pub fn describe_clusters(
    rows: &[EmbeddingRow],
    clustering: &Clustering,
    options: &DescribeOptions<'_>,
) -> Result<BTreeMap<usize, ClusterDescriptor>> {
    if rows.len() != clustering.assignments.len() {
        bail!(
            "Clustering has {} assignments but the table has {} rows",
            clustering.assignments.len(),
            rows.len()
        );
    }

    let start = Instant::now();
    let extractor = options.strategy.extractor();
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, a) in clustering.assignments.iter().enumerate() {
        if let Some(label) = a.label {
            members.entry(label).or_default().push(i);
        }
    }

    let mut out = BTreeMap::new();
    for (label, idx) in members {
        let texts: Vec<String> = idx.iter().map(|&i| rows[i].text.clone()).collect();
        let keywords = extractor.extract(&texts)?;
        let hypernyms = options
            .hypernyms
            .map(|src| verb_hypernyms_for(&keywords.keywords, src))
            .unwrap_or_default();

        let mut ranked = idx.clone();
        ranked.sort_by(|&a, &b| {
            clustering.assignments[b]
                .probability
                .total_cmp(&clustering.assignments[a].probability)
                .then(a.cmp(&b))
        });

        let picked: Vec<usize> = if options.unique_triples {
            let mut seen = HashSet::new();
            ranked
                .into_iter()
                .take(TRIPLE_POOL)
                .filter(|&i| {
                    let r = &rows[i];
                    seen.insert((r.subject_text.clone(), r.text.clone(), r.object_text.clone()))
                })
                .take(options.sample_count)
                .collect()
        } else {
            ranked.into_iter().take(options.sample_count).collect()
        };

        let samples = picked
            .into_iter()
            .map(|i| {
                let row = &rows[i];
                let a = &clustering.assignments[i];
                SampleRow {
                    index: row.index,
                    text: row.text.clone(),
                    source_file: row.source_file.clone(),
                    subject_text: row.subject_text.clone(),
                    object_text: row.object_text.clone(),
                    probability: a.probability,
                    outlier_score: a.outlier_score,
                }
            })
            .collect();

        out.insert(
            label,
            ClusterDescriptor {
                cluster_id: label,
                size: idx.len(),
                mean_probability: clustering.mean_probability(label),
                keywords: keywords.keywords,
                top_terms: keywords.top_terms,
                hypernyms,
                samples,
            },
        );
    }

    info!(
        clusters = out.len(),
        strategy = options.strategy.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Described clusters"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterAssignment;
    use crate::topics::hypernyms::Lexicon;

    fn row(index: usize, text: &str, subject: Option<&str>, object: Option<&str>) -> EmbeddingRow {
        EmbeddingRow {
            index,
            text: text.to_string(),
            source_file: "t.json".to_string(),
            embedding: vec![0.0],
            subject_text: subject.map(String::from),
            object_text: object.map(String::from),
        }
    }

    fn clustering(labels: &[(Option<usize>, f64)]) -> Clustering {
        Clustering {
            assignments: labels
                .iter()
                .map(|&(label, probability)| ClusterAssignment {
                    label,
                    probability,
                    outlier_score: 0.1,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn samples_sorted_by_confidence_and_noise_excluded() {
        let rows = vec![
            row(0, "archive digitised records", None, None),
            row(1, "archive catalogue records", None, None),
            row(2, "unrelated noise", None, None),
            row(3, "records of the archive", None, None),
        ];
        let c = clustering(&[(Some(0), 0.5), (Some(0), 0.9), (None, 0.0), (Some(0), 0.7)]);
        let out = describe_clusters(&rows, &c, &DescribeOptions::default()).unwrap();
        assert_eq!(out.len(), 1);
        let d = &out[&0];
        assert_eq!(d.size, 3);
        let order: Vec<usize> = d.samples.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![1, 3, 0]);
        assert_eq!(d.keywords[0], "archive");
        assert!(d.hypernyms.is_empty());
    }

    #[test]
    fn unique_triples_drop_duplicates() {
        let rows = vec![
            row(0, "founded", Some("she"), Some("the lab")),
            row(1, "founded", Some("she"), Some("the lab")),
            row(2, "founded", Some("he"), Some("the lab")),
        ];
        let c = clustering(&[(Some(0), 1.0), (Some(0), 0.9), (Some(0), 0.8)]);
        let opts = DescribeOptions {
            unique_triples: true,
            ..Default::default()
        };
        let out = describe_clusters(&rows, &c, &opts).unwrap();
        let order: Vec<usize> = out[&0].samples.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 2]);
        assert!(out[&0].samples[0].is_triple());
    }

    #[test]
    fn hypernyms_come_from_the_source() {
        let rows = vec![row(0, "funded projects", None, None), row(1, "funded projects", None, None)];
        let c = clustering(&[(Some(0), 1.0), (Some(0), 1.0)]);
        let lex = Lexicon::parse("funded\tfinance\n");
        let opts = DescribeOptions {
            hypernyms: Some(&lex),
            ..Default::default()
        };
        let out = describe_clusters(&rows, &c, &opts).unwrap();
        assert_eq!(out[&0].hypernyms["funded"], vec!["finance"]);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let rows = vec![row(0, "a", None, None)];
        let c = clustering(&[(Some(0), 1.0), (Some(0), 1.0)]);
        assert!(describe_clusters(&rows, &c, &DescribeOptions::default()).is_err());
    }
}
