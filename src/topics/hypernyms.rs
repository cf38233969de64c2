// Verb hypernyms for cluster keywords.
//
// Hypernyms ("move" for "run") give a more general reading of what a cluster
// of predicates is about. They come from a lexical database exported as a
// tab-separated file:
//
//     # verb <TAB> comma-separated hypernyms
//     run	move,travel
//     publish	issue
//
// Lookups go through `HypernymSource` so a different backend can be dropped in.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use stop_words::{get, LANGUAGE};
use tracing::{info, warn};

/// Anything that can map a verb to its more general terms.
pub trait HypernymSource {
    /// Hypernyms of the verb's most common sense, or `None` if it is not a
    /// known verb.
    fn verb_hypernyms(&self, verb: &str) -> Option<Vec<String>>;
}

/// In-memory verb -> hypernyms table.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hypernym lexicon {}", path.display()))?;
        let lexicon = Self::parse(&text);
        info!(
            verbs = lexicon.len(),
            path = %path.display(),
            "Loaded hypernym lexicon"
        );
        Ok(lexicon)
    }

    /// Parse the tab-separated format; malformed lines are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((verb, hypers)) = line.split_once('\t') else {
                warn!(line = line_no + 1, "Skipping lexicon line without a tab");
                continue;
            };
            let verb = verb.trim().to_lowercase().replace('_', " ");
            if verb.is_empty() {
                continue;
            }
            let hypers = hypers
                .split(',')
                .map(|h| h.trim().replace('_', " "))
                .filter(|h| !h.is_empty());
            entries.entry(verb).or_default().extend(hypers);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HypernymSource for Lexicon {
    fn verb_hypernyms(&self, verb: &str) -> Option<Vec<String>> {
        self.entries.get(&verb.to_lowercase()).cloned()
    }
}

/// Map every known verb found in `keywords` to its sorted, deduplicated
/// hypernyms. Adjacent token pairs are tried first so phrasal verbs
/// ("set up") win over their head word. Single stop words are ignored;
/// verbs with no hypernyms are left out.
pub fn verb_hypernyms_for(
    keywords: &[String],
    source: &dyn HypernymSource,
) -> BTreeMap<String, Vec<String>> {
    let stop_words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
    let mut out = BTreeMap::new();

    for keyword in keywords {
        let tokens: Vec<String> = keyword
            .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut i = 0;
        while i < tokens.len() {
            if let Some(next) = tokens.get(i + 1) {
                let phrase = format!("{} {next}", tokens[i]);
                if out.contains_key(&phrase) || record(&mut out, phrase, source) {
                    i += 2;
                    continue;
                }
            }
            let token = &tokens[i];
            i += 1;
            if !stop_words.contains(token) && !out.contains_key(token) {
                record(&mut out, token.clone(), source);
            }
        }
    }
    out
}

/// Look `verb` up and store its hypernyms; false if the source does not know it.
fn record(
    out: &mut BTreeMap<String, Vec<String>>,
    verb: String,
    source: &dyn HypernymSource,
) -> bool {
    let Some(hypers) = source.verb_hypernyms(&verb) else {
        return false;
    };
    let hypers: BTreeSet<String> = hypers.into_iter().collect();
    if !hypers.is_empty() {
        out.insert(verb, hypers.into_iter().collect());
    }
    true
}
