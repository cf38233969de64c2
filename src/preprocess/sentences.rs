// Utterance -> sentence splitting for interview transcripts.
//
// Splits after `.`, `!` or `?` when followed by whitespace and an uppercase
// letter, a quote or `(`. Abbreviations, honorifics, decimals, initials and
// anything inside parentheses are masked first so their dots never split.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One utterance as it appears in a segmented transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker_name: String,
    pub role: String,
    pub utterance: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub sentence: String,
    /// `"{utterance_order}-{k}"`, k counting from 1
    pub sentence_order: String,
}

/// An utterance broken into ordered sentences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceUtterance {
    pub speaker_name: String,
    pub role: String,
    pub utterance_order: i64,
    pub sentences: Vec<Sentence>,
}

/// Compiled masking and splitting patterns.
pub struct SentenceSplitter {
    glued: Regex,
    et_al: Regex,
    eg: Regex,
    ie: Regex,
    cf: Regex,
    honorific: Regex,
    decimal: Regex,
    initial: Regex,
    parens: Regex,
    boundary: Regex,
    restore_honorific: Regex,
    restore_decimal: Regex,
    restore_initial: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Result<Self> {
        let re = |pattern: &str| {
            Regex::new(pattern).with_context(|| format!("Invalid sentence pattern {pattern}"))
        };
        Ok(Self {
            glued: re(r"([.!?])([A-Z])")?,
            et_al: re(r"\bet al\.")?,
            eg: re(r"\be\.g\.")?,
            ie: re(r"\bi\.e\.")?,
            cf: re(r"\bcf\.")?,
            honorific: re(r"\b(Mr|Mrs|Ms|Dr|Prof|Sr|Jr)\.\s")?,
            decimal: re(r"(\d+)\.(\d+)")?,
            initial: re(r"\b([A-Z])\.(\s*[A-Z])")?,
            parens: re(r"\([^)]+\)")?,
            boundary: re(r#"[.!?]\s+[A-Z"'(]"#)?,
            restore_honorific: re(r"(\w+)_DOT_MARKER")?,
            restore_decimal: re(r"(\d+)_DECIMAL_(\d+)")?,
            restore_initial: re(r"([A-Z])_INITIAL_")?,
        })
    }

    pub fn split_into_sentences(&self, text: &str) -> Vec<String> {
        let text = self.glued.replace_all(text, "$1 $2");
        let masked = self.et_al.replace_all(&text, "ET_AL_MARKER");
        let masked = self.eg.replace_all(&masked, "EG_MARKER");
        let masked = self.ie.replace_all(&masked, "IE_MARKER");
        let masked = self.cf.replace_all(&masked, "CF_MARKER");
        let masked = self.honorific.replace_all(&masked, "${1}_DOT_MARKER ");
        let masked = self.decimal.replace_all(&masked, "${1}_DECIMAL_${2}");
        let masked = self.initial.replace_all(&masked, "${1}_INITIAL_${2}");
        let masked = self
            .parens
            .replace_all(&masked, |caps: &Captures<'_>| caps[0].replace('.', "_PAREN_DOT_"));

        // Each boundary match starts at the punctuation and ends on the first
        // character of the next sentence (always one ASCII byte).
        let mut pieces = Vec::new();
        let mut start = 0;
        for m in self.boundary.find_iter(&masked) {
            pieces.push(&masked[start..m.start() + 1]);
            start = m.end() - 1;
        }
        pieces.push(&masked[start..]);

        pieces
            .into_iter()
            .map(|piece| self.restore(piece))
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn restore(&self, piece: &str) -> String {
        let s = piece
            .replace("ET_AL_MARKER", "et al.")
            .replace("EG_MARKER", "e.g.")
            .replace("IE_MARKER", "i.e.")
            .replace("CF_MARKER", "cf.");
        let s = self.restore_honorific.replace_all(&s, "${1}.");
        let s = self.restore_decimal.replace_all(&s, "${1}.${2}");
        let s = self.restore_initial.replace_all(&s, "${1}.");
        s.replace("_PAREN_DOT_", ".").trim().to_string()
    }
}

/// Split every utterance into numbered sentences.
pub fn transform_utterances(
    splitter: &SentenceSplitter,
    items: &[Utterance],
) -> Vec<SentenceUtterance> {
    items
        .iter()
        .map(|item| SentenceUtterance {
            speaker_name: item.speaker_name.clone(),
            role: item.role.clone(),
            utterance_order: item.order,
            sentences: splitter
                .split_into_sentences(&item.utterance)
                .into_iter()
                .enumerate()
                .map(|(k, sentence)| Sentence {
                    sentence,
                    sentence_order: format!("{}-{}", item.order, k + 1),
                })
                .collect(),
        })
        .collect()
}

/// `<dir>/<stem>_sentences.<ext>` next to the input.
pub fn default_sentences_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("transcript");
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_sentences.{ext}"),
        None => format!("{stem}_sentences"),
    };
    input.with_file_name(name)
}

/// Read a transcript, split it, and write the sentence-level JSON.
pub fn transform_file(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read transcript {}", input.display()))?;
    let items: Vec<Utterance> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse utterances in {}", input.display()))?;

    let splitter = SentenceSplitter::new()?;
    let transformed = transform_utterances(&splitter, &items);
    let output = output.map_or_else(|| default_sentences_path(input), Path::to_path_buf);
    std::fs::write(&output, serde_json::to_string_pretty(&transformed)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        utterances = items.len(),
        sentences = transformed.iter().map(|t| t.sentences.len()).sum::<usize>(),
        output = %output.display(),
        "Split utterances into sentences"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        SentenceSplitter::new().unwrap().split_into_sentences(text)
    }

    #[test]
    fn protects_honorifics_and_decimals() {
        assert_eq!(
            split("Hello world. This is Dr. Smith. He paid 3.50 dollars."),
            vec!["Hello world.", "This is Dr. Smith.", "He paid 3.50 dollars."]
        );
    }

    #[test]
    fn protects_abbreviations() {
        assert_eq!(
            split("Work by Avram et al. Was early. Tools, e.g. Punch cards, mattered."),
            vec!["Work by Avram et al. Was early.", "Tools, e.g. Punch cards, mattered."]
        );
    }

    #[test]
    fn separates_glued_sentences() {
        assert_eq!(split("It worked.Next we moved"), vec!["It worked.", "Next we moved"]);
    }

    #[test]
    fn keeps_parenthetical_dots_and_initials() {
        assert_eq!(
            split("Written by J. Smith (see p. 5. Also) today. Fine!"),
            vec!["Written by J. Smith (see p. 5. Also) today.", "Fine!"]
        );
    }

    #[test]
    fn splits_before_quotes() {
        assert_eq!(
            split("He said no. \"Really?\" she asked."),
            vec!["He said no.", "\"Really?\" she asked."]
        );
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split("   ").is_empty());
    }

    #[test]
    fn numbers_sentences_per_utterance() {
        let splitter = SentenceSplitter::new().unwrap();
        let items = vec![Utterance {
            speaker_name: "Julianne".into(),
            role: "Interviewer".into(),
            utterance: "First one. Second one.".into(),
            order: 7,
        }];
        let out = transform_utterances(&splitter, &items);
        assert_eq!(out[0].utterance_order, 7);
        assert_eq!(out[0].sentences[1].sentence_order, "7-2");
        assert_eq!(out[0].sentences[1].sentence, "Second one.");
    }

    #[test]
    fn default_output_path() {
        let p = default_sentences_path(Path::new("/data/Interview A.json"));
        assert_eq!(p, Path::new("/data/Interview A_sentences.json"));
    }
}
