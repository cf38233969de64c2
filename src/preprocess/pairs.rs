// Previous/current utterance pairs.
//
// A pair is one Interviewer utterance immediately followed by one
// Interviewee utterance. Each output file holds the current pair and the
// pair before it, giving an annotator one exchange of context. Utterances
// are carried through as raw JSON so any extra fields survive untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

const INTERVIEWER: &str = "Interviewer";
const INTERVIEWEE: &str = "Interviewee";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousCurrentPair {
    /// The pair before this one; `null` for the first pair
    pub previous_utterances: Option<Vec<Value>>,
    pub current_utterance: Vec<Value>,
}

fn role(item: &Value) -> Option<&str> {
    item.get("role").and_then(Value::as_str)
}

/// Group utterances into Interviewer + Interviewee pairs, chaining each pair
/// to the one before it.
pub fn build_pairs(items: &[Value]) -> Vec<PreviousCurrentPair> {
    let mut exchanges: Vec<Vec<Value>> = Vec::new();
    let mut i = 0;
    while i + 1 < items.len() {
        if role(&items[i]) == Some(INTERVIEWER) && role(&items[i + 1]) == Some(INTERVIEWEE) {
            exchanges.push(vec![items[i].clone(), items[i + 1].clone()]);
            i += 2;
        } else {
            warn!(index = i, "Unexpected pattern, expected an Interviewer+Interviewee pair");
            i += 1;
        }
    }

    let mut pairs = Vec::with_capacity(exchanges.len());
    let mut previous: Option<Vec<Value>> = None;
    for current in exchanges {
        pairs.push(PreviousCurrentPair {
            previous_utterances: previous.take(),
            current_utterance: current.clone(),
        });
        previous = Some(current);
    }
    pairs
}

/// Write `Previous-current pair - {k}.json` (k from 1) into `dir`.
pub fn write_pairs(pairs: &[PreviousCurrentPair], dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for (k, pair) in pairs.iter().enumerate() {
        let path = dir.join(format!("Previous-current pair - {}.json", k + 1));
        std::fs::write(&path, serde_json::to_string_pretty(pair)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    info!(pairs = pairs.len(), dir = %dir.display(), "Wrote previous-current pairs");
    Ok(pairs.len())
}

/// `Previous_Current_Pairs/` next to the input.
pub fn default_pairs_dir(input: &Path) -> PathBuf {
    input.with_file_name("Previous_Current_Pairs")
}

/// Read a sentence-level transcript and write its pair files.
pub fn pairs_file(input: &Path, out_dir: Option<&Path>) -> Result<(usize, PathBuf)> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read transcript {}", input.display()))?;
    let items: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must hold a JSON array of utterances", input.display()))?;
    let dir = out_dir.map_or_else(|| default_pairs_dir(input), Path::to_path_buf);
    let count = write_pairs(&build_pairs(&items), &dir)?;
    Ok((count, dir))
}
