use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::application::{
    ClassRowRepository, CodeChunkRepository, FunctionRowRepository, GraphStore, RepositoryRepository,
    VectorRepository,
};
use crate::domain::{DomainError, NodeLabel, VectorPurpose};

const ALL_PURPOSES: [VectorPurpose; 4] = [
    VectorPurpose::ChunkSource,
    VectorPurpose::ChunkSummary,
    VectorPurpose::FunctionSummary,
    VectorPurpose::ClassSummary,
];

/// Repository housekeeping: tears down a repository's graph nodes, chunk
/// rows, and vector spaces together (§4.3/§4.4 delete semantics applied at
/// the whole-repository scope).
pub struct DeleteRepositoryUseCase {
    repository_repo: Arc<dyn RepositoryRepository>,
    graph_store: Arc<dyn GraphStore>,
    chunk_repo: Arc<dyn CodeChunkRepository>,
    function_repo: Arc<dyn FunctionRowRepository>,
    class_repo: Arc<dyn ClassRowRepository>,
    vector_repo: Arc<dyn VectorRepository>,
}

impl DeleteRepositoryUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository_repo: Arc<dyn RepositoryRepository>,
        graph_store: Arc<dyn GraphStore>,
        chunk_repo: Arc<dyn CodeChunkRepository>,
        function_repo: Arc<dyn FunctionRowRepository>,
        class_repo: Arc<dyn ClassRowRepository>,
        vector_repo: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            repository_repo,
            graph_store,
            chunk_repo,
            function_repo,
            class_repo,
            vector_repo,
        }
    }

    pub async fn execute(&self, id: &str) -> Result<(), DomainError> {
        let repo = self
            .repository_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Repository not found: {}", id)))?;

        info!("Deleting repository: {} ({})", repo.name(), repo.path());

        for purpose in ALL_PURPOSES {
            self.vector_repo.delete_by_repository(purpose, id).await?;
        }

        self.chunk_repo.delete_by_repo_id(id).await?;
        self.function_repo.delete_by_repo_id(id).await?;
        self.class_repo.delete_by_repo_id(id).await?;

        for label in [
            NodeLabel::Function,
            NodeLabel::Class,
            NodeLabel::File,
            NodeLabel::Folder,
            NodeLabel::Project,
        ] {
            let mut key = std::collections::HashMap::new();
            key.insert("project_id".to_string(), id.to_string());
            self.graph_store.detach_delete_by_match(label, key).await?;
        }

        self.repository_repo.delete(id).await?;

        info!("Repository deleted successfully");
        Ok(())
    }

    pub async fn delete_by_path(&self, path: &str) -> Result<(), DomainError> {
        let canonical_path = Path::new(path)
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("Invalid path '{}': {}", path, e)))?
            .to_string_lossy()
            .to_string();

        let repo = self
            .repository_repo
            .find_by_path(&canonical_path)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Repository not found at path: {}", path)))?;

        self.execute(repo.id()).await
    }
}
