// Keyword extraction strategies.
//
// Three ways to summarise a cluster's texts:
//   - frequency: most common cleaned words
//   - phrases:   repeated multi-word n-grams, longer phrases weighted up
//   - tfidf:     the `keyword_extraction` TF-IDF ranking, one text per document

use std::collections::HashMap;

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

use super::traits::{KeywordExtractor, Keywords, TermScore};

/// How many ranked terms the detailed reports keep.
const TOP_TERMS: usize = 20;

/// Selectable keyword strategy, as stored in run summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KeywordStrategy {
    Frequency {
        n_terms: usize,
        min_word_length: usize,
    },
    Phrases {
        n_keywords: usize,
        min_n: usize,
        max_n: usize,
    },
    TfIdf {
        n_terms: usize,
    },
}

impl Default for KeywordStrategy {
    fn default() -> Self {
        KeywordStrategy::Frequency {
            n_terms: 5,
            min_word_length: 2,
        }
    }
}

impl KeywordStrategy {
    /// Default phrase settings: nine phrases of two to six words.
    pub fn phrases() -> Self {
        KeywordStrategy::Phrases {
            n_keywords: 9,
            min_n: 2,
            max_n: 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeywordStrategy::Frequency { .. } => "frequency",
            KeywordStrategy::Phrases { .. } => "phrases",
            KeywordStrategy::TfIdf { .. } => "tfidf",
        }
    }

    pub fn extractor(&self) -> Box<dyn KeywordExtractor + Send + Sync> {
        match *self {
            KeywordStrategy::Frequency {
                n_terms,
                min_word_length,
            } => Box::new(FrequencyExtractor {
                n_terms,
                min_word_length,
            }),
            KeywordStrategy::Phrases {
                n_keywords,
                min_n,
                max_n,
            } => Box::new(PhraseExtractor {
                n_keywords,
                min_n,
                max_n,
            }),
            KeywordStrategy::TfIdf { n_terms } => Box::new(TfIdfExtractor { n_terms }),
        }
    }
}

/// Counts in first-seen order, so ties rank by first occurrence.
#[derive(Default)]
struct OrderedCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl OrderedCounter {
    fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    /// Highest counts first; the sort is stable so ties keep insertion order.
    fn most_common(mut self) -> Vec<(String, usize)> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
    }

    /// Entries in first-seen order.
    fn into_entries(self) -> Vec<(String, usize)> {
        self.counts
    }
}

/// Lowercase and blank out anything that is not a word character, whitespace,
/// or a CJK ideograph.
pub fn clean_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_cjk(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Most frequent cleaned words.
#[derive(Debug, Clone)]
pub struct FrequencyExtractor {
    pub n_terms: usize,
    /// Words must be strictly longer than this (in characters).
    pub min_word_length: usize,
}

impl KeywordExtractor for FrequencyExtractor {
    fn extract(&self, texts: &[String]) -> Result<Keywords> {
        let mut counter = OrderedCounter::default();
        for text in texts {
            for word in clean_text(text).split_whitespace() {
                if word.chars().count() > self.min_word_length
                    && !word.chars().all(|c| c.is_ascii_digit())
                {
                    counter.add(word.to_string());
                }
            }
        }
        let ranked = counter.most_common();
        Ok(Keywords {
            keywords: ranked
                .iter()
                .take(self.n_terms)
                .map(|(w, _)| w.clone())
                .collect(),
            top_terms: ranked
                .into_iter()
                .take(TOP_TERMS)
                .map(|(term, count)| TermScore {
                    term,
                    score: count as f64,
                })
                .collect(),
        })
    }
}

/// Repeated n-grams scored by `count * n^2`.
#[derive(Debug, Clone)]
pub struct PhraseExtractor {
    pub n_keywords: usize,
    pub min_n: usize,
    pub max_n: usize,
}

impl KeywordExtractor for PhraseExtractor {
    fn extract(&self, texts: &[String]) -> Result<Keywords> {
        let min_n = self.min_n.max(1);
        let tokenized: Vec<Vec<String>> = texts
            .iter()
            .map(|t| t.trim().to_lowercase().split_whitespace().map(String::from).collect())
            .collect();

        let mut counter = OrderedCounter::default();
        for words in &tokenized {
            let upper = self.max_n.min(words.len());
            for n in min_n..=upper {
                for window in words.windows(n) {
                    counter.add(window.join(" "));
                }
            }
        }

        // Equal scores keep first-seen order.
        let mut scored: Vec<(String, usize)> = counter
            .into_entries()
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(phrase, count)| {
                let n = phrase.split(' ').count();
                (phrase, count * n * n)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let mut keywords: Vec<String> = Vec::new();
        for (phrase, _) in &scored {
            if keywords.len() >= self.n_keywords {
                break;
            }
            if !keywords.iter().any(|chosen| chosen.contains(phrase.as_str())) {
                keywords.push(phrase.clone());
            }
        }

        if keywords.is_empty() {
            // Nothing repeats; fall back to plain word counts.
            let mut words = OrderedCounter::default();
            for w in tokenized.into_iter().flatten() {
                words.add(w);
            }
            keywords = words
                .most_common()
                .into_iter()
                .take(self.n_keywords)
                .map(|(w, _)| w)
                .collect();
        }

        Ok(Keywords {
            keywords,
            top_terms: scored
                .into_iter()
                .take(TOP_TERMS)
                .map(|(term, score)| TermScore {
                    term,
                    score: score as f64,
                })
                .collect(),
        })
    }
}

/// TF-IDF ranking with each text treated as its own document.
#[derive(Debug, Clone)]
pub struct TfIdfExtractor {
    pub n_terms: usize,
}

impl KeywordExtractor for TfIdfExtractor {
    fn extract(&self, texts: &[String]) -> Result<Keywords> {
        if texts.is_empty() {
            return Ok(Keywords::default());
        }
        let stop_words: Vec<String> = get(LANGUAGE::English);
        let params = TfIdfParams::UnprocessedDocuments(texts, &stop_words, None);
        let tfidf = TfIdf::new(params);
        let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(TOP_TERMS.max(self.n_terms));

        Ok(Keywords {
            keywords: ranked
                .iter()
                .take(self.n_terms)
                .map(|(w, _)| w.clone())
                .collect(),
            top_terms: ranked
                .into_iter()
                .take(TOP_TERMS)
                .map(|(term, score)| TermScore {
                    term,
                    score: score as f64,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn frequency_counts_cleaned_words() {
        let ex = FrequencyExtractor {
            n_terms: 2,
            min_word_length: 2,
        };
        let kw = ex
            .extract(&texts(&[
                "Digital humanities, digital archives!",
                "Archives of 1984 and digital tools",
            ]))
            .unwrap();
        assert_eq!(kw.keywords, vec!["digital", "archives"]);
        assert_eq!(kw.top_terms[0].score, 3.0);
        // "of" is too short, "1984" is all digits
        assert!(kw.top_terms.iter().all(|t| t.term != "of" && t.term != "1984"));
    }

    #[test]
    fn frequency_ties_keep_first_occurrence() {
        let ex = FrequencyExtractor {
            n_terms: 3,
            min_word_length: 0,
        };
        let kw = ex.extract(&texts(&["beta alpha gamma"])).unwrap();
        assert_eq!(kw.keywords, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn clean_text_keeps_cjk_and_accents() {
        assert_eq!(clean_text("Café—数字!"), "café 数字 ");
    }

    #[test]
    fn phrases_prefer_long_repeats() {
        let ex = PhraseExtractor {
            n_keywords: 3,
            min_n: 2,
            max_n: 4,
        };
        let kw = ex
            .extract(&texts(&[
                "worked on the project",
                "worked on the project",
                "talked about funding",
            ]))
            .unwrap();
        // The 4-gram wins and swallows its sub-phrases.
        assert_eq!(kw.keywords, vec!["worked on the project"]);
        assert_eq!(kw.top_terms[0].score, 32.0);
    }

    #[test]
    fn phrases_fall_back_to_words() {
        let ex = PhraseExtractor {
            n_keywords: 2,
            min_n: 2,
            max_n: 3,
        };
        let kw = ex.extract(&texts(&["built a lab", "built tools"])).unwrap();
        assert_eq!(kw.keywords, vec!["built", "a"]);
        assert!(kw.top_terms.is_empty());
    }

    #[test]
    fn tfidf_skips_stop_words() {
        let ex = TfIdfExtractor { n_terms: 5 };
        let kw = ex
            .extract(&texts(&[
                "the computer lab opened in the library",
                "the computer centre ran punch cards",
                "literary scholars used the computer",
            ]))
            .unwrap();
        assert!(!kw.keywords.is_empty());
        assert!(!kw.keywords.iter().any(|k| k == "the"));
    }

    #[test]
    fn strategy_round_trips_through_json() {
        let json = serde_json::to_string(&KeywordStrategy::phrases()).unwrap();
        assert!(json.contains("\"kind\":\"phrases\""));
        let back: KeywordStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KeywordStrategy::phrases());
    }
}
