use async_trait::async_trait;

use crate::domain::{DomainError, FileInfo, Language};

/// A per-language source analyzer (§4.1). One implementation per supported
/// language; the Folder Walker dispatches on [`Language::from_path`] and
/// skips files whose language has no registered analyzer.
#[async_trait]
pub trait LanguageAnalyzer: Send + Sync {
    fn language(&self) -> Language;

    /// Parses one file into its [`FileInfo`] IR. Returns `Ok(None)` when the
    /// file parses but yields no functions, classes, or imports worth
    /// recording (e.g. an empty `__init__.py`); returns `Err` only when the
    /// file could not be parsed at all, in which case the caller logs and
    /// continues with the next file rather than aborting the walk.
    async fn analyze_file(
        &self,
        base_path: &str,
        file_path: &str,
    ) -> Result<Option<FileInfo>, DomainError>;
}
