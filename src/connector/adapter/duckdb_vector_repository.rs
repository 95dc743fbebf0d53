use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{VectorRecord, VectorRepository};
use crate::domain::{DomainError, SearchResponse, SearchResultRow, VectorPurpose};

/// Fixed embedding width. DuckDB's `vss` HNSW index requires a statically
/// sized `FLOAT[N]` column, so every embedding provider wired into this
/// adapter must emit vectors of this length.
const VECTOR_DIMENSIONS: usize = 384;

/// DuckDB-backed vector store. All four vector spaces named in the
/// persisted state layout (`repo_{id}_function`, `_class`, `_chunk_source`,
/// `_chunk_summary`) live as rows in one physical `embeddings` table,
/// distinguished by a `purpose` column — `create_space`/`delete_space` are
/// therefore logical (filtered insert/delete), not DDL per repository.
pub struct DuckdbVectorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbVectorRepository {
    pub fn new(path: &Path) -> Result<Self, DomainError> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new adapter using an existing shared connection, running the
    /// `embeddings` schema/extension setup against it.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, DomainError> {
        let guard = conn.lock().await;
        Self::initialize(&guard)?;
        drop(guard);
        Ok(Self { conn })
    }

    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch("INSTALL vss; LOAD vss; SET hnsw_enable_experimental_persistence = true;")
            .map_err(|e| DomainError::storage(format!("Failed to initialize VSS extension: {}", e)))?;

        let schema_sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS embeddings (
                purpose TEXT NOT NULL,
                repo_id TEXT NOT NULL,
                id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                summary TEXT,
                vector FLOAT[{dim}] NOT NULL,
                PRIMARY KEY (purpose, repo_id, id)
            );

            CREATE INDEX IF NOT EXISTS embedding_hnsw_idx ON embeddings USING HNSW (vector) WITH (metric = 'cosine');
            "#,
            dim = VECTOR_DIMENSIONS,
        );

        conn.execute_batch(&schema_sql)
            .map_err(|e| DomainError::storage(format!("Failed to initialize DuckDB schema: {}", e)))?;

        debug!("DuckDB embeddings schema initialized");
        Ok(())
    }

    fn vector_to_array_literal(vector: &[f32]) -> Result<String, DomainError> {
        if vector.len() != VECTOR_DIMENSIONS {
            return Err(DomainError::invalid_input(format!(
                "Expected embedding dimension {}, got {}",
                VECTOR_DIMENSIONS,
                vector.len()
            )));
        }
        let mut s = String::with_capacity(vector.len() * 8);
        s.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&format!("{}", v));
        }
        s.push(']');
        s.push_str(&format!("::FLOAT[{}]", VECTOR_DIMENSIONS));
        Ok(s)
    }

}

#[async_trait]
impl VectorRepository for DuckdbVectorRepository {
    async fn insert_records(
        &self,
        purpose: VectorPurpose,
        records: Vec<VectorRecord>,
    ) -> Result<Vec<String>, DomainError> {
        if records.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        // Any entry in the returned list signals a partial failure; an
        // empty list (the success convention used throughout the batch
        // workers) means every record was written.
        let mut failed = Vec::new();

        for record in &records {
            let array_lit = match Self::vector_to_array_literal(&record.vector) {
                Ok(lit) => lit,
                Err(_) => {
                    failed.push(record.id.clone());
                    continue;
                }
            };
            let sql = format!(
                "INSERT OR REPLACE INTO embeddings \
                 (purpose, repo_id, id, file_path, start_line, end_line, summary, vector) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, {array_lit})",
                array_lit = array_lit
            );
            if tx
                .execute(
                    &sql,
                    params![
                        purpose.as_str(),
                        record.repository_id,
                        record.id,
                        record.file_path,
                        record.start_line as i64,
                        record.end_line as i64,
                        record.summary,
                    ],
                )
                .is_err()
            {
                failed.push(record.id.clone());
            }
        }

        tx.commit()
            .map_err(|e| DomainError::storage(format!("Failed to commit: {}", e)))?;

        debug!(
            "Inserted {} / {} records into vector space {}",
            records.len() - failed.len(),
            records.len(),
            purpose
        );
        Ok(failed)
    }

    async fn delete_record(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        id: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM embeddings WHERE purpose = ? AND repo_id = ? AND id = ?",
                params![purpose.as_str(), repository_id, id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete record: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_repository(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM embeddings WHERE purpose = ? AND repo_id = ?",
                params![purpose.as_str(), repository_id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete space: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn delete_by_file_path(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        file_path: &str,
    ) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM embeddings WHERE purpose = ? AND repo_id = ? AND file_path = ?",
                params![purpose.as_str(), repository_id, file_path],
            )
            .map_err(|e| DomainError::storage(format!("Failed to delete records: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn search(
        &self,
        purpose: VectorPurpose,
        repository_id: &str,
        query_vector: &[f32],
        top_k: usize,
        file_path: Option<&str>,
    ) -> Result<SearchResponse, DomainError> {
        let array_lit = Self::vector_to_array_literal(query_vector)?;

        let mut sql = format!(
            "SELECT id, file_path, start_line, end_line, summary, \
                1.0 - array_cosine_distance(vector, {array_lit}) AS score \
             FROM embeddings \
             WHERE purpose = ? AND repo_id = ?",
            array_lit = array_lit
        );
        if file_path.is_some() {
            sql.push_str(" AND file_path = ?");
        }
        sql.push_str(&format!(
            " ORDER BY array_cosine_distance(vector, {array_lit}) LIMIT ?",
            array_lit = array_lit
        ));

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare search: {}", e)))?;

        let mut rows = if let Some(fp) = file_path {
            stmt.query(params![
                purpose.as_str(),
                repository_id,
                fp,
                top_k as i64
            ])
        } else {
            stmt.query(params![purpose.as_str(), repository_id, top_k as i64])
        }
        .map_err(|e| DomainError::storage(format!("Failed to run search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        {
            let (id, fp, start, end, summary, score): (String, String, i64, i64, Option<String>, f64) = (
                row.get(0)
                    .map_err(|e| DomainError::storage(format!("Failed to read id: {}", e)))?,
                row.get(1)
                    .map_err(|e| DomainError::storage(format!("Failed to read file_path: {}", e)))?,
                row.get(2)
                    .map_err(|e| DomainError::storage(format!("Failed to read start_line: {}", e)))?,
                row.get(3)
                    .map_err(|e| DomainError::storage(format!("Failed to read end_line: {}", e)))?,
                row.get(4)
                    .map_err(|e| DomainError::storage(format!("Failed to read summary: {}", e)))?,
                row.get(5)
                    .map_err(|e| DomainError::storage(format!("Failed to read score: {}", e)))?,
            );
            results.push(SearchResultRow::new(
                id,
                String::new(),
                fp,
                u32::try_from(start).unwrap_or(0),
                u32::try_from(end).unwrap_or(0),
                summary,
                Some(score as f32),
            ));
        }

        let total = results.len();
        Ok(SearchResponse::new(results, total))
    }

    async fn count(&self, purpose: VectorPurpose, repository_id: &str) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM embeddings WHERE purpose = ? AND repo_id = ?",
                params![purpose.as_str(), repository_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count records: {}", e)))?;
        Ok(count as u64)
    }
}
