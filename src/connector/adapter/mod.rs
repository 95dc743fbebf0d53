mod anthropic_client;
mod duckdb_chunk_repository;
mod duckdb_file_hash_repository;
mod duckdb_graph_store;
mod duckdb_metadata_repository;
mod duckdb_vector_repository;
mod mock_embedding;
mod ort_embedding;
mod treesitter_parser;

pub use anthropic_client::*;
pub use duckdb_chunk_repository::*;
pub use duckdb_file_hash_repository::*;
pub use duckdb_graph_store::*;
pub use duckdb_metadata_repository::*;
pub use duckdb_vector_repository::*;
pub use mock_embedding::*;
pub use ort_embedding::*;
pub use treesitter_parser::*;
