use async_trait::async_trait;

use crate::domain::{DomainError, SearchResponse, VectorPurpose};

/// One row inserted into a purpose's vector space: the embedding plus enough
/// sidecar fields to answer a search without a second round-trip to the
/// owning chunk table (mirrors the teacher's `records` dict shape).
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub repository_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub summary: Option<String>,
    pub vector: Vec<f32>,
}

/// Dense-vector storage and search, one physical space per
/// `(purpose, dimension)` pair, filtered logically by `repository_id` (§6,
/// §9 open question decision).
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Inserts a batch of records. Returns the ids of rows that failed to
    /// insert; an empty vec means full success (§9's "empty ⇒ success"
    /// convention).
    async fn insert_records(
        &self,
        purpose: VectorPurpose,
        records: Vec<VectorRecord>,
    ) -> Result<Vec<String>, DomainError>;

    async fn delete_record(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        id: &str,
    ) -> Result<u64, DomainError>;

    /// Deletes every vector row for a repository under this purpose —
    /// logically a `delete_space`, since spaces are shared physical tables.
    async fn delete_by_repository(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
    ) -> Result<u64, DomainError>;

    async fn delete_by_file_path(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError>;

    async fn search(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        query_vector: &[f32],
        top_k: usize,
        file_path: Option<&str>,
    ) -> Result<SearchResponse, DomainError>;

    async fn count(&self, purpose: VectorPurpose, repository_id: &str) -> Result<u64, DomainError>;
}
