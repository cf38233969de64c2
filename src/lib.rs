// Claimscape: cluster, map, and report on claim and predicate embeddings
//
// This is the library root. Each module corresponds to a major subsystem
// of the analysis pipeline, from transcript preprocessing through to the
// HTML reports.

pub mod assess;
pub mod cluster;
pub mod config;
pub mod hierarchy;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod reduce;
pub mod table;
pub mod topics;
