use std::sync::Arc;

use crate::application::{
    ClassRowRepository, CodeChunkRepository, EmbeddingService, FunctionRowRepository,
    VectorRepository,
};
use crate::domain::{DomainError, SearchRequest, SearchResponse, SearchResultRow, VectorPurpose};

/// Which relational table a summary-space search targets (§4.7). Chunk
/// summaries, function summaries, and class summaries each live in their
/// own purpose, so the use case needs to know which table to re-hydrate
/// `source_code` from after the vector match comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySearchTarget {
    Chunk,
    Function,
    Class,
}

impl SummarySearchTarget {
    fn purpose(&self) -> VectorPurpose {
        match self {
            SummarySearchTarget::Chunk => VectorPurpose::ChunkSummary,
            SummarySearchTarget::Function => VectorPurpose::FunctionSummary,
            SummarySearchTarget::Class => VectorPurpose::ClassSummary,
        }
    }
}

/// Dense-vector search over a repository's chunk/function/class spaces
/// (§4.7). The vector store itself carries no `source_code` column (§9
/// decision keeps the embeddings table purely numeric plus locator fields),
/// so every result is re-hydrated against the owning relational table
/// before it reaches a caller.
pub struct SearchUseCase {
    chunk_repo: Arc<dyn CodeChunkRepository>,
    function_repo: Arc<dyn FunctionRowRepository>,
    class_repo: Arc<dyn ClassRowRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SearchUseCase {
    pub fn new(
        chunk_repo: Arc<dyn CodeChunkRepository>,
        function_repo: Arc<dyn FunctionRowRepository>,
        class_repo: Arc<dyn ClassRowRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            chunk_repo,
            function_repo,
            class_repo,
            vector_repo,
            embedding_service,
        }
    }

    /// Searches the raw-source-text space. Always backed by the chunk
    /// table — functions/classes are only embedded from their summaries.
    pub async fn search_by_source_vector(
        &self,
        req: &SearchRequest,
    ) -> Result<SearchResponse, DomainError> {
        let response = self.run_search(VectorPurpose::ChunkSource, req).await?;
        self.rehydrate(response, |id| {
            let chunk_repo = Arc::clone(&self.chunk_repo);
            let id = id.to_string();
            Box::pin(async move { chunk_repo.get_by_id(&id).await.map(|r| r.map(|c| c.source_code().to_string())) })
        })
        .await
    }

    /// Searches a summary space, re-hydrating `source_code` from whichever
    /// relational table owns that `target`.
    pub async fn search_by_summary_vector(
        &self,
        req: &SearchRequest,
        target: SummarySearchTarget,
    ) -> Result<SearchResponse, DomainError> {
        let response = self.run_search(target.purpose(), req).await?;
        match target {
            SummarySearchTarget::Chunk => {
                self.rehydrate(response, |id| {
                    let chunk_repo = Arc::clone(&self.chunk_repo);
                    let id = id.to_string();
                    Box::pin(async move {
                        chunk_repo.get_by_id(&id).await.map(|r| r.map(|c| c.source_code().to_string()))
                    })
                })
                .await
            }
            SummarySearchTarget::Function => {
                self.rehydrate(response, |id| {
                    let function_repo = Arc::clone(&self.function_repo);
                    let id = id.to_string();
                    Box::pin(async move {
                        function_repo
                            .get_by_id(&id)
                            .await
                            .map(|r| r.map(|f| f.source_code().to_string()))
                    })
                })
                .await
            }
            SummarySearchTarget::Class => {
                self.rehydrate(response, |id| {
                    let class_repo = Arc::clone(&self.class_repo);
                    let id = id.to_string();
                    Box::pin(async move {
                        class_repo.get_by_id(&id).await.map(|r| r.map(|c| c.source_code().to_string()))
                    })
                })
                .await
            }
        }
    }

    async fn run_search(
        &self,
        purpose: VectorPurpose,
        req: &SearchRequest,
    ) -> Result<SearchResponse, DomainError> {
        let (query_vector, _tokens) = self.embedding_service.encode_queries(req.query()).await?;
        self.vector_repo
            .search(
                purpose,
                req.repository_id(),
                &query_vector,
                req.top_k(),
                req.file_path(),
            )
            .await
    }

    async fn rehydrate<F>(&self, response: SearchResponse, fetch: F) -> Result<SearchResponse, DomainError>
    where
        F: Fn(
            &str,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<Option<String>, DomainError>> + Send>,
        >,
    {
        let total = response.total();
        let mut rows = Vec::with_capacity(response.results().len());
        for row in response.results() {
            let source_code = fetch(row.id()).await?.unwrap_or_default();
            rows.push(SearchResultRow::new(
                row.id(),
                source_code,
                row.file_path(),
                row.start_line(),
                row.end_line(),
                row.summary().map(str::to_string),
                row.score(),
            ));
        }
        Ok(SearchResponse::new(rows, total))
    }
}
