use std::sync::Arc;

use tracing::warn;

use crate::application::{
    ChatService, ClassRowRepository, CodeChunkRepository, EmbeddingService, FunctionRowRepository,
    SummaryKind, Summarizer, VectorRecord, VectorRepository,
};
use crate::domain::{ClassNodeType, DomainError, VectorPurpose};

/// Rows per embedding call (§4.6).
const EMBEDDING_BATCH_SIZE: usize = 16;
/// Rows scanned per batch-worker invocation unless the caller overrides it.
pub const DEFAULT_SCAN_LIMIT: u32 = 100;

fn truncate_for_model(text: &str, max_tokens: usize) -> &str {
    let limit = max_tokens.saturating_sub(10).max(1);
    // Token budget approximated by whitespace-split word count, matching
    // the mock/ORT embedding providers' own truncation heuristic.
    match text.split_whitespace().nth(limit) {
        Some(_) => {
            let mut count = 0;
            for (idx, ch) in text.char_indices() {
                if ch.is_whitespace() {
                    count += 1;
                    if count >= limit {
                        return &text[..idx];
                    }
                }
            }
            text
        }
        None => text,
    }
}

/// Pending record inputs to the embed-then-insert pipeline, before a vector
/// is attached.
struct PendingRecord {
    id: String,
    repository_id: String,
    file_path: String,
    start_line: u32,
    end_line: u32,
    summary: Option<String>,
    text: String,
}

/// Batch pipeline turning chunk-table rows into summaries and vectors
/// (§4.6). One instance serves all three tables since the pipeline shape is
/// identical; only the row accessor closures differ per call site.
pub struct Vectorizer {
    chunk_repo: Arc<dyn CodeChunkRepository>,
    function_repo: Arc<dyn FunctionRowRepository>,
    class_repo: Arc<dyn ClassRowRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    summarizer: Summarizer,
}

impl Vectorizer {
    pub fn new(
        chunk_repo: Arc<dyn CodeChunkRepository>,
        function_repo: Arc<dyn FunctionRowRepository>,
        class_repo: Arc<dyn ClassRowRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
        chat_service: Arc<dyn ChatService>,
    ) -> Self {
        Self {
            chunk_repo,
            function_repo,
            class_repo,
            vector_repo,
            embedding_service,
            summarizer: Summarizer::new(chat_service),
        }
    }

    // ---- summary pipeline (§4.6 "Summary pipeline") ----

    pub async fn scan_and_generate_summary_chunks(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.chunk_repo.get_unsummarized(repository_id, limit).await?;
        let mut updated = 0;
        for mut row in rows {
            let summary = self
                .summarizer
                .llm_summarize(row.source_code(), SummaryKind::CodeChunk)
                .await;
            if summary.is_empty() {
                continue;
            }
            row.set_summary(summary);
            if let Err(e) = self.chunk_repo.update(&row).await {
                warn!("scan_and_generate_summary_chunks: update failed for {}: {}", row.id(), e);
                continue;
            }
            updated += 1;
        }
        Ok(updated)
    }

    pub async fn scan_and_generate_summary_functions(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.function_repo.get_unsummarized(repository_id, limit).await?;
        let mut updated = 0;
        for mut row in rows {
            let summary = self
                .summarizer
                .llm_summarize(row.source_code(), SummaryKind::Function)
                .await;
            if summary.is_empty() {
                continue;
            }
            row.set_summary(summary);
            if let Err(e) = self.function_repo.update(&row).await {
                warn!("scan_and_generate_summary_functions: update failed for {}: {}", row.id(), e);
                continue;
            }
            updated += 1;
        }
        Ok(updated)
    }

    pub async fn scan_and_generate_summary_classes(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.class_repo.get_unsummarized(repository_id, limit).await?;
        let mut updated = 0;
        for mut row in rows {
            let kind = match row.class_type() {
                ClassNodeType::Struct => SummaryKind::Struct,
                ClassNodeType::Interface => SummaryKind::Interface,
                ClassNodeType::Class => SummaryKind::Class,
            };
            let summary = self.summarizer.llm_summarize(row.source_code(), kind).await;
            if summary.is_empty() {
                continue;
            }
            row.set_summary(summary);
            if let Err(e) = self.class_repo.update(&row).await {
                warn!("scan_and_generate_summary_classes: update failed for {}: {}", row.id(), e);
                continue;
            }
            updated += 1;
        }
        Ok(updated)
    }

    // ---- vectorize pipeline (§4.6 "Vectorize pipeline") ----

    /// Embeds `pending` in batches of [`EMBEDDING_BATCH_SIZE`], inserts into
    /// `purpose`'s space, and returns the ids that were **fully** vectorized
    /// (summary/source flag may be flipped for those, and only those).
    async fn vectorize(
        &self,
        purpose: VectorPurpose,
        pending: Vec<PendingRecord>,
    ) -> Result<Vec<String>, DomainError> {
        let mut succeeded = Vec::new();
        let max_tokens = self.embedding_service.config().max_sequence_length();

        for chunk in pending.chunks(EMBEDDING_BATCH_SIZE) {
            let texts: Vec<String> = chunk
                .iter()
                .map(|r| truncate_for_model(&r.text, max_tokens).to_string())
                .collect();

            let (vectors, _tokens) = match self.embedding_service.encode(&texts).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Vectorizer: embedding batch failed: {}", e);
                    continue;
                }
            };

            let records: Vec<VectorRecord> = chunk
                .iter()
                .zip(vectors)
                .map(|(r, vector)| VectorRecord {
                    id: r.id.clone(),
                    repository_id: r.repository_id.clone(),
                    file_path: r.file_path.clone(),
                    start_line: r.start_line,
                    end_line: r.end_line,
                    summary: r.summary.clone(),
                    vector,
                })
                .collect();

            let record_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
            match self.vector_repo.insert_records(purpose, records).await {
                Ok(failed) if failed.is_empty() => succeeded.extend(record_ids),
                Ok(failed) => {
                    let failed_set: std::collections::HashSet<_> = failed.into_iter().collect();
                    succeeded.extend(record_ids.into_iter().filter(|id| !failed_set.contains(id)));
                }
                Err(e) => warn!("Vectorizer: insert_records failed for {}: {}", purpose, e),
            }
        }

        Ok(succeeded)
    }

    pub async fn scan_and_vectorize_chunk_source(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.chunk_repo.get_source_unvectorized(repository_id, limit).await?;
        let mut by_id = std::collections::HashMap::new();
        let pending = rows
            .iter()
            .map(|r| {
                by_id.insert(r.id().to_string(), r.clone());
                PendingRecord {
                    id: r.id().to_string(),
                    repository_id: r.repository_id().to_string(),
                    file_path: r.file_path().to_string(),
                    start_line: r.start_line(),
                    end_line: r.end_line(),
                    summary: None,
                    text: r.source_code().to_string(),
                }
            })
            .collect();

        let succeeded = self.vectorize(VectorPurpose::ChunkSource, pending).await?;
        for id in &succeeded {
            if let Some(mut row) = by_id.remove(id) {
                row.mark_source_vectorized();
                if let Err(e) = self.chunk_repo.update(&row).await {
                    warn!("scan_and_vectorize_chunk_source: update failed for {}: {}", id, e);
                }
            }
        }
        Ok(succeeded.len())
    }

    pub async fn scan_and_vectorize_chunk_summary(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.chunk_repo.get_summary_unvectorized(repository_id, limit).await?;
        let mut by_id = std::collections::HashMap::new();
        let pending = rows
            .iter()
            .filter(|r| r.summary().is_some())
            .map(|r| {
                by_id.insert(r.id().to_string(), r.clone());
                PendingRecord {
                    id: r.id().to_string(),
                    repository_id: r.repository_id().to_string(),
                    file_path: r.file_path().to_string(),
                    start_line: r.start_line(),
                    end_line: r.end_line(),
                    summary: r.summary().map(str::to_string),
                    text: r.summary().unwrap_or_default().to_string(),
                }
            })
            .collect();

        let succeeded = self.vectorize(VectorPurpose::ChunkSummary, pending).await?;
        for id in &succeeded {
            if let Some(mut row) = by_id.remove(id) {
                row.mark_summary_vectorized();
                if let Err(e) = self.chunk_repo.update(&row).await {
                    warn!("scan_and_vectorize_chunk_summary: update failed for {}: {}", id, e);
                }
            }
        }
        Ok(succeeded.len())
    }

    pub async fn scan_and_vectorize_functions(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.function_repo.get_unvectorized(repository_id, limit).await?;
        let mut by_id = std::collections::HashMap::new();
        let pending = rows
            .iter()
            .filter(|r| r.summary().is_some())
            .map(|r| {
                by_id.insert(r.id().to_string(), r.clone());
                PendingRecord {
                    id: r.id().to_string(),
                    repository_id: r.repository_id().to_string(),
                    file_path: r.file_path().to_string(),
                    start_line: r.start_line(),
                    end_line: r.end_line(),
                    summary: r.summary().map(str::to_string),
                    text: r.summary().unwrap_or_default().to_string(),
                }
            })
            .collect();

        let succeeded = self.vectorize(VectorPurpose::FunctionSummary, pending).await?;
        for id in &succeeded {
            if let Some(mut row) = by_id.remove(id) {
                row.mark_vectorized();
                if let Err(e) = self.function_repo.update(&row).await {
                    warn!("scan_and_vectorize_functions: update failed for {}: {}", id, e);
                }
            }
        }
        Ok(succeeded.len())
    }

    pub async fn scan_and_vectorize_classes(
        &self,
        repository_id: &str,
        limit: u32,
    ) -> Result<usize, DomainError> {
        let rows = self.class_repo.get_unvectorized(repository_id, limit).await?;
        let mut by_id = std::collections::HashMap::new();
        let pending = rows
            .iter()
            .filter(|r| r.summary().is_some())
            .map(|r| {
                by_id.insert(r.id().to_string(), r.clone());
                PendingRecord {
                    id: r.id().to_string(),
                    repository_id: r.repository_id().to_string(),
                    file_path: r.file_path().to_string(),
                    start_line: r.start_line(),
                    end_line: r.end_line(),
                    summary: r.summary().map(str::to_string),
                    text: r.summary().unwrap_or_default().to_string(),
                }
            })
            .collect();

        let succeeded = self.vectorize(VectorPurpose::ClassSummary, pending).await?;
        for id in &succeeded {
            if let Some(mut row) = by_id.remove(id) {
                row.mark_vectorized();
                if let Err(e) = self.class_repo.update(&row).await {
                    warn!("scan_and_vectorize_classes: update failed for {}: {}", id, e);
                }
            }
        }
        Ok(succeeded.len())
    }

    // ---- delete helpers (§4.6 "Delete helpers") ----

    pub async fn delete_vector_record(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        id: &str,
    ) -> Result<(), DomainError> {
        self.vector_repo.delete_record(purpose, repository_id, id).await?;
        Ok(())
    }

    pub async fn delete_vectors_by_file_path(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError> {
        self.vector_repo
            .delete_by_file_path(purpose, repository_id, file_path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_untouched() {
        let text = "one two three";
        assert_eq!(truncate_for_model(text, 256), text);
    }

    #[test]
    fn truncate_cuts_at_word_boundary_past_budget() {
        let text = (0..20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let truncated = truncate_for_model(&text, 10);
        assert!(truncated.split_whitespace().count() <= 10);
        assert!(text.starts_with(truncated));
    }
}
