// Cluster topics: keyword strategies, verb hypernyms and cluster descriptors.

pub mod descriptor;
pub mod hypernyms;
pub mod keywords;
pub mod traits;

pub use descriptor::{describe_clusters, ClusterDescriptor, DescribeOptions, SampleRow};
pub use hypernyms::{verb_hypernyms_for, HypernymSource, Lexicon};
pub use keywords::KeywordStrategy;
pub use traits::{KeywordExtractor, Keywords, TermScore};
