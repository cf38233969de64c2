// Transcript preprocessing: sentence splitting and utterance pairing.

pub mod pairs;
pub mod sentences;

pub use pairs::{build_pairs, pairs_file, write_pairs, PreviousCurrentPair};
pub use sentences::{transform_file, transform_utterances, SentenceSplitter, SentenceUtterance};
