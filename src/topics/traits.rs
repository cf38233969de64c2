// Keyword extractor trait: swap-ready abstraction.
//
// Cluster descriptions only need "what words characterise these texts";
// frequency counts, repeated phrases and TF-IDF all answer that, and any of
// them can sit behind this trait.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A ranked term with its score (a count for frequency, a weight otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub term: String,
    pub score: f64,
}

/// Keywords for one group of texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    /// The headline keywords, best first
    pub keywords: Vec<String>,
    /// A longer ranked list for the detailed reports
    pub top_terms: Vec<TermScore>,
}

/// Trait for extracting keywords from the texts of one cluster.
pub trait KeywordExtractor {
    fn extract(&self, texts: &[String]) -> Result<Keywords>;
}
