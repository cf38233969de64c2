use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::table::TextKind;

const DEFAULT_OUTPUT_DIR: &str = "./claimscape_output";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy; CLI flags
/// override whatever is set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Embedding table to analyze (CLAIMSCAPE_INPUT)
    pub input: Option<PathBuf>,
    /// Where reports are written (CLAIMSCAPE_OUTPUT_DIR)
    pub output_dir: PathBuf,
    /// Whether the table holds claim or predicate embeddings
    pub text_kind: TextKind,
    /// Optional verb hypernym lexicon (CLAIMSCAPE_LEXICON)
    pub lexicon: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            text_kind: TextKind::default(),
            lexicon: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the input table, which is checked
    /// separately by `require_input` for the commands that need it.
    pub fn load() -> Result<Self> {
        let text_kind = match env::var("CLAIMSCAPE_TEXT_KIND") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<TextKind>()
                .map_err(anyhow::Error::msg)
                .context("Invalid CLAIMSCAPE_TEXT_KIND")?,
            _ => TextKind::default(),
        };

        Ok(Self {
            input: non_empty_path("CLAIMSCAPE_INPUT"),
            output_dir: non_empty_path("CLAIMSCAPE_OUTPUT_DIR")
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            text_kind,
            lexicon: non_empty_path("CLAIMSCAPE_LEXICON"),
        })
    }

    /// Check that an input table is configured and return it.
    /// Call this before any operation that reads embeddings.
    pub fn require_input(&self) -> Result<&PathBuf> {
        match &self.input {
            Some(path) => Ok(path),
            None => anyhow::bail!(
                "No embedding table given. Pass --input or set CLAIMSCAPE_INPUT in your .env file.\n\
                 See .env.example for the available variables."
            ),
        }
    }
}

fn non_empty_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("./claimscape_output"));
        assert_eq!(config.text_kind, TextKind::Claim);
        assert!(config.lexicon.is_none());
    }

    #[test]
    fn require_input_fails_without_input() {
        let config = Config::default();
        let err = config.require_input().unwrap_err();
        assert!(err.to_string().contains("CLAIMSCAPE_INPUT"));
    }

    #[test]
    fn require_input_returns_path() {
        let config = Config {
            input: Some(PathBuf::from("claims.jsonl")),
            ..Config::default()
        };
        assert_eq!(
            config.require_input().unwrap(),
            &PathBuf::from("claims.jsonl")
        );
    }
}
