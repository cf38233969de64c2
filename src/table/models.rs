// Row types for the embedding table.

use serde::{Deserialize, Serialize};

/// Which extracted text the embeddings were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    /// Whole claims, one sentence-ish statement per row.
    #[default]
    Claim,
    /// Predicates of subject-predicate-object triples.
    Predicate,
}

impl TextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextKind::Claim => "claim",
            TextKind::Predicate => "predicate",
        }
    }
}

impl std::str::FromStr for TextKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claim" | "claims" => Ok(TextKind::Claim),
            "predicate" | "predicates" => Ok(TextKind::Predicate),
            other => Err(format!("unknown text kind '{other}' (expected claim or predicate)")),
        }
    }
}

/// Column names to read from each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub text_field: String,
    pub embedding_field: String,
    pub source_field: String,
    pub subject_field: String,
    pub object_field: String,
}

impl TableSchema {
    /// Column names used by the claim and predicate extraction exports.
    pub fn for_kind(kind: TextKind) -> Self {
        let prefix = kind.as_str();
        Self {
            text_field: format!("{prefix}_text"),
            embedding_field: format!("{prefix}_embedding"),
            source_field: "source_file".to_string(),
            subject_field: "subject_text".to_string(),
            object_field: "object_text".to_string(),
        }
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::for_kind(TextKind::Claim)
    }
}

/// One row of the embedding table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRow {
    /// Position in the input file (0-based).
    pub index: usize,
    pub text: String,
    pub source_file: String,
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_text: Option<String>,
}

impl EmbeddingRow {
    /// True when the row carries a full subject-predicate-object triple.
    pub fn is_triple(&self) -> bool {
        self.subject_text.is_some() && self.object_text.is_some()
    }
}
