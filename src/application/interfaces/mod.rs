mod chat_service;
mod chunk_repository;
mod embedding_service;
mod file_hash_repository;
mod graph_store;
mod repository_repository;
mod vector_repository;

pub use chat_service::*;
pub use chunk_repository::*;
pub use embedding_service::*;
pub use file_hash_repository::*;
pub use graph_store::*;
pub use repository_repository::*;
pub use vector_repository::*;
