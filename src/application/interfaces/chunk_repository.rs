use async_trait::async_trait;

use crate::domain::{DomainError, RepoClassRow, RepoCodeChunk, RepoFunctionRow};

/// CRUD plus the summarization/vectorization scan operations shared by all
/// three chunk tables (§4.4). One trait per table rather than a single
/// generic trait: each table's update payload and scan predicates differ
/// slightly (chunks have two vectorized flags, functions/classes have one),
/// mirroring the teacher's separate `*Mgmt` classes in the original system.
#[async_trait]
pub trait CodeChunkRepository: Send + Sync {
    async fn create(&self, chunk: RepoCodeChunk) -> Result<RepoCodeChunk, DomainError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<RepoCodeChunk>, DomainError>;
    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError>;
    async fn update(&self, chunk: &RepoCodeChunk) -> Result<(), DomainError>;
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError>;

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoCodeChunk>, DomainError>;
    async fn get_source_unvectorized(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError>;
    async fn get_summary_unvectorized(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError>;
}

#[async_trait]
pub trait FunctionRowRepository: Send + Sync {
    async fn create(&self, row: RepoFunctionRow) -> Result<RepoFunctionRow, DomainError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<RepoFunctionRow>, DomainError>;
    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoFunctionRow>, DomainError>;
    async fn update(&self, row: &RepoFunctionRow) -> Result<(), DomainError>;
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError>;

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoFunctionRow>, DomainError>;
    async fn get_unvectorized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoFunctionRow>, DomainError>;

    /// Single-entity lookup by `(file_path, function_name)` (§4.3).
    async fn get_by_file_and_name(
        &self,
        repo_id: &str,
        file_path: &str,
        name: &str,
    ) -> Result<Option<RepoFunctionRow>, DomainError>;
}

#[async_trait]
pub trait ClassRowRepository: Send + Sync {
    async fn create(&self, row: RepoClassRow) -> Result<RepoClassRow, DomainError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<RepoClassRow>, DomainError>;
    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoClassRow>, DomainError>;
    async fn update(&self, row: &RepoClassRow) -> Result<(), DomainError>;
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError>;
    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError>;

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoClassRow>, DomainError>;
    async fn get_unvectorized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoClassRow>, DomainError>;

    /// Single-entity lookup by `(file_path, class_name)` (§4.3).
    async fn get_by_file_and_name(
        &self,
        repo_id: &str,
        file_path: &str,
        name: &str,
    ) -> Result<Option<RepoClassRow>, DomainError>;
}
