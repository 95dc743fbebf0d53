//! Rows of the three relational chunk tables (§3, §4.4): raw code chunks,
//! function rows, and class/struct/interface rows. Each carries its own
//! summarization/vectorization flag pair so the Vectorizer can scan for
//! unsummarized or unvectorized rows independently per table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClassNodeType, Language};

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A raw source-code chunk belonging to one file. Unlike functions/classes,
/// a chunk has two independent vectorization flags: one for its own source
/// text, one for its generated summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCodeChunk {
    id: String,
    repository_id: String,
    file_path: String,
    language: Language,
    source_code: String,
    start_line: u32,
    end_line: u32,
    summary: Option<String>,
    is_summarized: bool,
    is_source_vectorized: bool,
    is_summary_vectorized: bool,
    created_at: i64,
    updated_at: i64,
}

impl RepoCodeChunk {
    pub fn new(
        repository_id: impl Into<String>,
        file_path: impl Into<String>,
        language: Language,
        source_code: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            repository_id: repository_id.into(),
            file_path: file_path.into(),
            language,
            source_code: source_code.into(),
            start_line,
            end_line,
            summary: None,
            is_summarized: false,
            is_source_vectorized: false,
            is_summary_vectorized: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        repository_id: String,
        file_path: String,
        language: Language,
        source_code: String,
        start_line: u32,
        end_line: u32,
        summary: Option<String>,
        is_summarized: bool,
        is_source_vectorized: bool,
        is_summary_vectorized: bool,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            repository_id,
            file_path,
            language,
            source_code,
            start_line,
            end_line,
            summary,
            is_summarized,
            is_source_vectorized,
            is_summary_vectorized,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
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

    pub fn is_summarized(&self) -> bool {
        self.is_summarized
    }

    pub fn is_source_vectorized(&self) -> bool {
        self.is_source_vectorized
    }

    pub fn is_summary_vectorized(&self) -> bool {
        self.is_summary_vectorized
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
        self.is_summarized = true;
        self.updated_at = current_timestamp();
    }

    pub fn mark_source_vectorized(&mut self) {
        self.is_source_vectorized = true;
        self.updated_at = current_timestamp();
    }

    pub fn mark_summary_vectorized(&mut self) {
        self.is_summary_vectorized = true;
        self.updated_at = current_timestamp();
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }

    pub fn belongs_to_repository(&self, repository_id: &str) -> bool {
        self.repository_id == repository_id
    }
}

/// A function-table row, one per top-level function or method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFunctionRow {
    id: String,
    repository_id: String,
    file_path: String,
    source_code: String,
    start_line: u32,
    end_line: u32,
    function_name: String,
    function_signature: String,
    summary: Option<String>,
    is_summarized: bool,
    is_vectorized: bool,
    created_at: i64,
    updated_at: i64,
}

impl RepoFunctionRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository_id: impl Into<String>,
        file_path: impl Into<String>,
        source_code: impl Into<String>,
        start_line: u32,
        end_line: u32,
        function_name: impl Into<String>,
        function_signature: impl Into<String>,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            repository_id: repository_id.into(),
            file_path: file_path.into(),
            source_code: source_code.into(),
            start_line,
            end_line,
            function_name: function_name.into(),
            function_signature: function_signature.into(),
            summary: None,
            is_summarized: false,
            is_vectorized: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        repository_id: String,
        file_path: String,
        source_code: String,
        start_line: u32,
        end_line: u32,
        function_name: String,
        function_signature: String,
        summary: Option<String>,
        is_summarized: bool,
        is_vectorized: bool,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            repository_id,
            file_path,
            source_code,
            start_line,
            end_line,
            function_name,
            function_signature,
            summary,
            is_summarized,
            is_vectorized,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn function_signature(&self) -> &str {
        &self.function_signature
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn is_summarized(&self) -> bool {
        self.is_summarized
    }

    pub fn is_vectorized(&self) -> bool {
        self.is_vectorized
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
        self.is_summarized = true;
        self.updated_at = current_timestamp();
    }

    pub fn mark_vectorized(&mut self) {
        self.is_vectorized = true;
        self.updated_at = current_timestamp();
    }
}

/// A class/struct/interface-table row, one per [`ClassInfo`](super::ClassInfo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoClassRow {
    id: String,
    repository_id: String,
    file_path: String,
    source_code: String,
    start_line: u32,
    end_line: u32,
    class_name: String,
    class_type: ClassNodeType,
    summary: Option<String>,
    is_summarized: bool,
    is_vectorized: bool,
    created_at: i64,
    updated_at: i64,
}

impl RepoClassRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository_id: impl Into<String>,
        file_path: impl Into<String>,
        source_code: impl Into<String>,
        start_line: u32,
        end_line: u32,
        class_name: impl Into<String>,
        class_type: ClassNodeType,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            repository_id: repository_id.into(),
            file_path: file_path.into(),
            source_code: source_code.into(),
            start_line,
            end_line,
            class_name: class_name.into(),
            class_type,
            summary: None,
            is_summarized: false,
            is_vectorized: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        repository_id: String,
        file_path: String,
        source_code: String,
        start_line: u32,
        end_line: u32,
        class_name: String,
        class_type: ClassNodeType,
        summary: Option<String>,
        is_summarized: bool,
        is_vectorized: bool,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            repository_id,
            file_path,
            source_code,
            start_line,
            end_line,
            class_name,
            class_type,
            summary,
            is_summarized,
            is_vectorized,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn class_type(&self) -> ClassNodeType {
        self.class_type
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn is_summarized(&self) -> bool {
        self.is_summarized
    }

    pub fn is_vectorized(&self) -> bool {
        self.is_vectorized
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
        self.is_summarized = true;
        self.updated_at = current_timestamp();
    }

    pub fn mark_vectorized(&mut self) {
        self.is_vectorized = true;
        self.updated_at = current_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_chunk_creation() {
        let chunk = RepoCodeChunk::new(
            "repo-123",
            "pkg/mod.py",
            Language::Python,
            "def add(a, b): return a + b",
            10,
            12,
        );

        assert_eq!(chunk.file_path(), "pkg/mod.py");
        assert!(!chunk.is_summarized());
        assert!(!chunk.is_source_vectorized());
        assert!(!chunk.is_summary_vectorized());
        assert_eq!(chunk.location(), "pkg/mod.py:10-12");
        assert_eq!(chunk.created_at(), chunk.updated_at());
    }

    #[test]
    fn test_chunk_summary_flips_flag() {
        let mut chunk = RepoCodeChunk::new("r", "f.py", Language::Python, "x", 1, 1);
        chunk.set_summary("adds two numbers");
        assert!(chunk.is_summarized());
        assert_eq!(chunk.summary(), Some("adds two numbers"));
    }

    #[test]
    fn test_function_row_flags_independent_of_vectorization() {
        let mut row = RepoFunctionRow::new("r", "f.py", "def f(): ...", 1, 2, "f", "f() -> Any");
        assert!(!row.is_vectorized());
        row.mark_vectorized();
        assert!(row.is_vectorized());
    }

    #[test]
    fn test_class_row_type() {
        let row = RepoClassRow::new("r", "f.go", "type T struct{}", 1, 1, "T", ClassNodeType::Struct);
        assert_eq!(row.class_type(), ClassNodeType::Struct);
    }
}
