//! Search request/response shapes for the Vector Store's dense-vector search
//! (§4.7, §6). One physical vector space exists per `(purpose, dimension)`
//! pair; `repo_id` is a filter column inside that shared space rather than a
//! separate schema (§9 open question decision).

use serde::{Deserialize, Serialize};

/// Which chunk-table text was embedded into a given vector row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorPurpose {
    ChunkSource,
    ChunkSummary,
    FunctionSummary,
    ClassSummary,
}

impl VectorPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorPurpose::ChunkSource => "chunk_source",
            VectorPurpose::ChunkSummary => "chunk_summary",
            VectorPurpose::FunctionSummary => "function_summary",
            VectorPurpose::ClassSummary => "class_summary",
        }
    }
}

impl std::fmt::Display for VectorPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dense-vector search request against one purpose's space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    repository_id: String,
    query: String,
    top_k: usize,
    file_path: Option<String>,
}

impl SearchRequest {
    pub fn new(repository_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            repository_id: repository_id.into(),
            query: query.into(),
            top_k: 10,
            file_path: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }
}

/// One row of a search response, denormalized back from the owning chunk
/// table after the vector space match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultRow {
    id: String,
    source_code: String,
    file_path: String,
    start_line: u32,
    end_line: u32,
    summary: Option<String>,
    score: Option<f32>,
}

impl SearchResultRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        source_code: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        summary: Option<String>,
        score: Option<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            source_code: source_code.into(),
            file_path: file_path.into(),
            start_line,
            end_line,
            summary,
            score,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    pub fn is_relevant(&self, threshold: f32) -> bool {
        self.score.is_some_and(|s| s >= threshold)
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    results: Vec<SearchResultRow>,
    total: usize,
}

impl SearchResponse {
    pub fn new(results: Vec<SearchResultRow>, total: usize) -> Self {
        Self { results, total }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
        }
    }

    pub fn results(&self) -> &[SearchResultRow] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_builder() {
        let req = SearchRequest::new("repo-1", "parse config")
            .with_top_k(5)
            .with_file_path("src/config.py");

        assert_eq!(req.repository_id(), "repo-1");
        assert_eq!(req.top_k(), 5);
        assert_eq!(req.file_path(), Some("src/config.py"));
    }

    #[test]
    fn test_top_k_floor_is_one() {
        let req = SearchRequest::new("repo-1", "q").with_top_k(0);
        assert_eq!(req.top_k(), 1);
    }

    #[test]
    fn test_result_relevance_threshold() {
        let row = SearchResultRow::new("id", "code", "f.py", 1, 2, None, Some(0.9));
        assert!(row.is_relevant(0.5));
        assert!(!row.is_relevant(0.95));
    }

    #[test]
    fn test_empty_response() {
        let resp = SearchResponse::empty();
        assert!(resp.is_empty());
        assert_eq!(resp.total(), 0);
    }
}
