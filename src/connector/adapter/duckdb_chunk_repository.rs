use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{ClassRowRepository, CodeChunkRepository, FunctionRowRepository};
use crate::domain::{ClassNodeType, DomainError, Language, RepoClassRow, RepoCodeChunk, RepoFunctionRow};

/// Relational store for the three chunk tables (`code_chunks`, `functions`,
/// `classes`). One struct implements all three repository traits since the
/// tables share a connection and near-identical CRUD/scan shape — mirroring
/// how the original system keeps its three `*Mgmt` services next to each
/// other against one database handle.
pub struct DuckdbChunkRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbChunkRepository {
    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        Ok(Self { conn })
    }

    pub async fn initialize(&self) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS code_chunks (
                id TEXT PRIMARY KEY,
                repo_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                language TEXT NOT NULL,
                source_code TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                summary TEXT,
                is_summarized BOOLEAN NOT NULL DEFAULT FALSE,
                is_source_vectorized BOOLEAN NOT NULL DEFAULT FALSE,
                is_summary_vectorized BOOLEAN NOT NULL DEFAULT FALSE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_code_chunks_repo ON code_chunks(repo_id);
            CREATE INDEX IF NOT EXISTS idx_code_chunks_file ON code_chunks(repo_id, file_path);
            CREATE INDEX IF NOT EXISTS idx_code_chunks_summarized ON code_chunks(is_summarized);
            CREATE INDEX IF NOT EXISTS idx_code_chunks_source_vectorized ON code_chunks(is_source_vectorized);
            CREATE INDEX IF NOT EXISTS idx_code_chunks_summary_vectorized ON code_chunks(is_summary_vectorized);

            CREATE TABLE IF NOT EXISTS functions (
                id TEXT PRIMARY KEY,
                repo_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                source_code TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                function_name TEXT NOT NULL,
                function_signature TEXT NOT NULL,
                summary TEXT,
                is_summarized BOOLEAN NOT NULL DEFAULT FALSE,
                is_vectorized BOOLEAN NOT NULL DEFAULT FALSE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_functions_repo ON functions(repo_id);
            CREATE INDEX IF NOT EXISTS idx_functions_file ON functions(repo_id, file_path);
            CREATE INDEX IF NOT EXISTS idx_functions_vectorized ON functions(is_vectorized);

            CREATE TABLE IF NOT EXISTS classes (
                id TEXT PRIMARY KEY,
                repo_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                source_code TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                class_name TEXT NOT NULL,
                class_type TEXT NOT NULL,
                summary TEXT,
                is_summarized BOOLEAN NOT NULL DEFAULT FALSE,
                is_vectorized BOOLEAN NOT NULL DEFAULT FALSE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_classes_repo ON classes(repo_id);
            CREATE INDEX IF NOT EXISTS idx_classes_file ON classes(repo_id, file_path);
            CREATE INDEX IF NOT EXISTS idx_classes_vectorized ON classes(is_vectorized);
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize chunk schema: {}", e)))?;

        debug!("DuckDB chunk-table schema initialized");
        Ok(())
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn row_to_chunk(row: &duckdb::Row) -> duckdb::Result<RepoCodeChunk> {
    Ok(RepoCodeChunk::reconstitute(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        Language::parse(&row.get::<_, String>(3)?),
        row.get(4)?,
        u32::try_from(row.get::<_, i64>(5)?).unwrap_or(0),
        u32::try_from(row.get::<_, i64>(6)?).unwrap_or(0),
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

const CHUNK_COLUMNS: &str = "id, repo_id, file_path, language, source_code, start_line, end_line, summary, is_summarized, is_source_vectorized, is_summary_vectorized, created_at, updated_at";

#[async_trait]
impl CodeChunkRepository for DuckdbChunkRepository {
    async fn create(&self, chunk: RepoCodeChunk) -> Result<RepoCodeChunk, DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO code_chunks (id, repo_id, file_path, language, source_code, start_line, end_line, summary, is_summarized, is_source_vectorized, is_summary_vectorized, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                chunk.id(),
                chunk.repository_id(),
                chunk.file_path(),
                chunk.language().as_str(),
                chunk.source_code(),
                chunk.start_line() as i64,
                chunk.end_line() as i64,
                chunk.summary(),
                chunk.is_summarized(),
                chunk.is_source_vectorized(),
                chunk.is_summary_vectorized(),
                chunk.created_at(),
                chunk.updated_at(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to insert chunk: {}", e)))?;
        Ok(chunk)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<RepoCodeChunk>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM code_chunks WHERE id = ?", CHUNK_COLUMNS))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        match stmt.query_row(params![id], row_to_chunk) {
            Ok(c) => Ok(Some(c)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query chunk: {}", e))),
        }
    }

    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM code_chunks WHERE repo_id = ? ORDER BY file_path, start_line LIMIT ? OFFSET ?",
                CHUNK_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64, offset as i64], row_to_chunk)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn update(&self, chunk: &RepoCodeChunk) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE code_chunks SET summary = ?, is_summarized = ?, is_source_vectorized = ?, is_summary_vectorized = ?, updated_at = ? WHERE id = ?",
            params![
                chunk.summary(),
                chunk.is_summarized(),
                chunk.is_source_vectorized(),
                chunk.is_summary_vectorized(),
                current_timestamp(),
                chunk.id(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to update chunk: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM code_chunks WHERE id = ?", params![id])
            .map_err(|e| DomainError::storage(format!("Failed to delete chunk: {}", e)))?;
        Ok(deleted > 0)
    }

    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM code_chunks WHERE repo_id = ?", params![repo_id])
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let prefix = format!("{}%", folder_path.trim_end_matches('/'));
        let deleted = conn
            .execute(
                "DELETE FROM code_chunks WHERE repo_id = ? AND file_path LIKE ?",
                params![repo_id, prefix],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM code_chunks WHERE repo_id = ? AND file_path = ?",
                params![repo_id, file_path],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete chunks: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoCodeChunk>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM code_chunks WHERE repo_id = ? AND is_summarized = FALSE LIMIT ?",
                CHUNK_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_chunk)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_source_unvectorized(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM code_chunks WHERE repo_id = ? AND is_source_vectorized = FALSE LIMIT ?",
                CHUNK_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_chunk)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_summary_unvectorized(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<RepoCodeChunk>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM code_chunks WHERE repo_id = ? AND is_summarized = TRUE AND is_summary_vectorized = FALSE LIMIT ?",
                CHUNK_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_chunk)
            .map_err(|e| DomainError::storage(format!("Failed to query chunks: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }
}

fn row_to_function(row: &duckdb::Row) -> duckdb::Result<RepoFunctionRow> {
    Ok(RepoFunctionRow::reconstitute(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        u32::try_from(row.get::<_, i64>(4)?).unwrap_or(0),
        u32::try_from(row.get::<_, i64>(5)?).unwrap_or(0),
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

const FUNCTION_COLUMNS: &str = "id, repo_id, file_path, source_code, start_line, end_line, function_name, function_signature, summary, is_summarized, is_vectorized, created_at, updated_at";

#[async_trait]
impl FunctionRowRepository for DuckdbChunkRepository {
    async fn create(&self, row: RepoFunctionRow) -> Result<RepoFunctionRow, DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO functions (id, repo_id, file_path, source_code, start_line, end_line, function_name, function_signature, summary, is_summarized, is_vectorized, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                row.id(),
                row.repository_id(),
                row.file_path(),
                row.source_code(),
                row.start_line() as i64,
                row.end_line() as i64,
                row.function_name(),
                row.function_signature(),
                row.summary(),
                row.is_summarized(),
                row.is_vectorized(),
                row.created_at(),
                row.updated_at(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to insert function: {}", e)))?;
        Ok(row)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<RepoFunctionRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM functions WHERE id = ?", FUNCTION_COLUMNS))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        match stmt.query_row(params![id], row_to_function) {
            Ok(f) => Ok(Some(f)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query function: {}", e))),
        }
    }

    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoFunctionRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM functions WHERE repo_id = ? ORDER BY file_path, start_line LIMIT ? OFFSET ?",
                FUNCTION_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64, offset as i64], row_to_function)
            .map_err(|e| DomainError::storage(format!("Failed to query functions: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn update(&self, row: &RepoFunctionRow) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE functions SET summary = ?, is_summarized = ?, is_vectorized = ?, updated_at = ? WHERE id = ?",
            params![
                row.summary(),
                row.is_summarized(),
                row.is_vectorized(),
                current_timestamp(),
                row.id(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to update function: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM functions WHERE id = ?", params![id])
            .map_err(|e| DomainError::storage(format!("Failed to delete function: {}", e)))?;
        Ok(deleted > 0)
    }

    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM functions WHERE repo_id = ?", params![repo_id])
            .map_err(|e| DomainError::storage(format!("Failed to delete functions: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let prefix = format!("{}%", folder_path.trim_end_matches('/'));
        let deleted = conn
            .execute(
                "DELETE FROM functions WHERE repo_id = ? AND file_path LIKE ?",
                params![repo_id, prefix],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete functions: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM functions WHERE repo_id = ? AND file_path = ?",
                params![repo_id, file_path],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete functions: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoFunctionRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM functions WHERE repo_id = ? AND is_summarized = FALSE LIMIT ?",
                FUNCTION_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_function)
            .map_err(|e| DomainError::storage(format!("Failed to query functions: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_unvectorized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoFunctionRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM functions WHERE repo_id = ? AND is_vectorized = FALSE AND is_summarized = TRUE LIMIT ?",
                FUNCTION_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_function)
            .map_err(|e| DomainError::storage(format!("Failed to query functions: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_by_file_and_name(
        &self,
        repo_id: &str,
        file_path: &str,
        name: &str,
    ) -> Result<Option<RepoFunctionRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM functions WHERE repo_id = ? AND file_path = ? AND function_name = ? LIMIT 1",
                FUNCTION_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        match stmt.query_row(params![repo_id, file_path, name], row_to_function) {
            Ok(f) => Ok(Some(f)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query function: {}", e))),
        }
    }
}

fn row_to_class(row: &duckdb::Row) -> duckdb::Result<RepoClassRow> {
    Ok(RepoClassRow::reconstitute(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        u32::try_from(row.get::<_, i64>(4)?).unwrap_or(0),
        u32::try_from(row.get::<_, i64>(5)?).unwrap_or(0),
        row.get(6)?,
        ClassNodeType::parse(&row.get::<_, String>(7)?),
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

const CLASS_COLUMNS: &str = "id, repo_id, file_path, source_code, start_line, end_line, class_name, class_type, summary, is_summarized, is_vectorized, created_at, updated_at";

#[async_trait]
impl ClassRowRepository for DuckdbChunkRepository {
    async fn create(&self, row: RepoClassRow) -> Result<RepoClassRow, DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO classes (id, repo_id, file_path, source_code, start_line, end_line, class_name, class_type, summary, is_summarized, is_vectorized, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                row.id(),
                row.repository_id(),
                row.file_path(),
                row.source_code(),
                row.start_line() as i64,
                row.end_line() as i64,
                row.class_name(),
                row.class_type().as_str(),
                row.summary(),
                row.is_summarized(),
                row.is_vectorized(),
                row.created_at(),
                row.updated_at(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to insert class: {}", e)))?;
        Ok(row)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<RepoClassRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM classes WHERE id = ?", CLASS_COLUMNS))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        match stmt.query_row(params![id], row_to_class) {
            Ok(c) => Ok(Some(c)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query class: {}", e))),
        }
    }

    async fn get_by_repo_id(
        &self,
        repo_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RepoClassRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM classes WHERE repo_id = ? ORDER BY file_path, start_line LIMIT ? OFFSET ?",
                CLASS_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64, offset as i64], row_to_class)
            .map_err(|e| DomainError::storage(format!("Failed to query classes: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn update(&self, row: &RepoClassRow) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE classes SET summary = ?, is_summarized = ?, is_vectorized = ?, updated_at = ? WHERE id = ?",
            params![
                row.summary(),
                row.is_summarized(),
                row.is_vectorized(),
                current_timestamp(),
                row.id(),
            ],
        )
        .map_err(|e| DomainError::storage(format!("Failed to update class: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM classes WHERE id = ?", params![id])
            .map_err(|e| DomainError::storage(format!("Failed to delete class: {}", e)))?;
        Ok(deleted > 0)
    }

    async fn delete_by_repo_id(&self, repo_id: &str) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM classes WHERE repo_id = ?", params![repo_id])
            .map_err(|e| DomainError::storage(format!("Failed to delete classes: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_folder_path(
        &self,
        repo_id: &str,
        folder_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let prefix = format!("{}%", folder_path.trim_end_matches('/'));
        let deleted = conn
            .execute(
                "DELETE FROM classes WHERE repo_id = ? AND file_path LIKE ?",
                params![repo_id, prefix],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete classes: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repo_id_and_file_path(
        &self,
        repo_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM classes WHERE repo_id = ? AND file_path = ?",
                params![repo_id, file_path],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete classes: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn get_unsummarized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoClassRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM classes WHERE repo_id = ? AND is_summarized = FALSE LIMIT ?",
                CLASS_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_class)
            .map_err(|e| DomainError::storage(format!("Failed to query classes: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_unvectorized(&self, repo_id: &str, limit: u32) -> Result<Vec<RepoClassRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM classes WHERE repo_id = ? AND is_vectorized = FALSE AND is_summarized = TRUE LIMIT ?",
                CLASS_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        let rows = stmt
            .query_map(params![repo_id, limit as i64], row_to_class)
            .map_err(|e| DomainError::storage(format!("Failed to query classes: {}", e)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(out)
    }

    async fn get_by_file_and_name(
        &self,
        repo_id: &str,
        file_path: &str,
        name: &str,
    ) -> Result<Option<RepoClassRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM classes WHERE repo_id = ? AND file_path = ? AND class_name = ? LIMIT 1",
                CLASS_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
        match stmt.query_row(params![repo_id, file_path, name], row_to_class) {
            Ok(c) => Ok(Some(c)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to query class: {}", e))),
        }
    }
}
