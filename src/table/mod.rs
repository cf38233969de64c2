// Embedding table: row model and loaders.

pub mod loader;
pub mod models;

pub use loader::{embedding_matrix, load_table};
pub use models::{EmbeddingRow, TableSchema, TextKind};
