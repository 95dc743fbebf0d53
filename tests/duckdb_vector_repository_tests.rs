use std::sync::Arc;

use codekg::{DuckdbVectorRepository, VectorPurpose, VectorRecord, VectorRepository};
use tempfile::tempdir;

fn unit_vector(dim: usize, hot_index: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot_index] = 1.0;
    v
}

fn record(id: &str, repository_id: &str, file_path: &str, vector: Vec<f32>) -> VectorRecord {
    VectorRecord {
        id: id.to_string(),
        repository_id: repository_id.to_string(),
        file_path: file_path.to_string(),
        start_line: 1,
        end_line: 1,
        summary: None,
        vector,
    }
}

#[tokio::test]
async fn duckdb_vector_repository_can_save_and_search() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = Arc::new(DuckdbVectorRepository::new(&db_path).expect("duckdb init"));

    let embedding_vec = unit_vector(384, 0);
    let rec = record("chunk-1", "repo-1", "src/lib.rs", embedding_vec.clone());

    let failed = repo
        .insert_records(VectorPurpose::ChunkSource, vec![rec])
        .await
        .expect("insert_records");
    assert!(failed.is_empty(), "expected full success, got failures: {:?}", failed);

    let response = repo
        .search(VectorPurpose::ChunkSource, "repo-1", &embedding_vec, 3, None)
        .await
        .expect("search");

    assert!(!response.is_empty(), "expected at least one result");
    assert_eq!(response.results()[0].id(), "chunk-1");
    assert!(
        response.results()[0].score().unwrap() > 0.99,
        "expected near-identical score"
    );
}

#[tokio::test]
async fn duckdb_vector_repository_delete_by_repository_removes_all() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = Arc::new(DuckdbVectorRepository::new(&db_path).expect("duckdb init"));

    let r1 = record("a", "repo-del", "src/a.rs", unit_vector(384, 1));
    let r2 = record("b", "repo-del", "src/b.rs", unit_vector(384, 2));

    repo.insert_records(VectorPurpose::ChunkSource, vec![r1, r2])
        .await
        .expect("insert_records");
    assert_eq!(
        repo.count(VectorPurpose::ChunkSource, "repo-del")
            .await
            .expect("count"),
        2
    );

    repo.delete_by_repository(VectorPurpose::ChunkSource, "repo-del")
        .await
        .expect("delete_by_repository");

    assert_eq!(
        repo.count(VectorPurpose::ChunkSource, "repo-del")
            .await
            .expect("count"),
        0
    );
}

#[tokio::test]
async fn duckdb_vector_repository_delete_by_file_path_scopes_to_one_file() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = Arc::new(DuckdbVectorRepository::new(&db_path).expect("duckdb init"));

    let r1 = record("a", "repo-1", "src/a.rs", unit_vector(384, 1));
    let r2 = record("b", "repo-1", "src/b.rs", unit_vector(384, 2));
    repo.insert_records(VectorPurpose::ChunkSource, vec![r1, r2])
        .await
        .expect("insert_records");

    let deleted = repo
        .delete_by_file_path(VectorPurpose::ChunkSource, "repo-1", "src/a.rs")
        .await
        .expect("delete_by_file_path");
    assert_eq!(deleted, 1);
    assert_eq!(
        repo.count(VectorPurpose::ChunkSource, "repo-1")
            .await
            .expect("count"),
        1
    );
}

#[tokio::test]
async fn duckdb_vector_repository_search_filters_by_file_path() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = Arc::new(DuckdbVectorRepository::new(&db_path).expect("duckdb init"));

    let query_vec = unit_vector(384, 7);
    let matching = record("match", "repo-1", "src/auth.rs", query_vec.clone());
    let other = record("other", "repo-1", "src/math.rs", unit_vector(384, 8));
    repo.insert_records(VectorPurpose::ChunkSource, vec![matching, other])
        .await
        .expect("insert_records");

    let response = repo
        .search(
            VectorPurpose::ChunkSource,
            "repo-1",
            &query_vec,
            10,
            Some("src/auth.rs"),
        )
        .await
        .expect("search");

    assert_eq!(response.results().len(), 1);
    assert_eq!(response.results()[0].id(), "match");
}

#[tokio::test]
async fn duckdb_vector_repository_namespaces_by_purpose() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("vectors.duckdb");
    let repo = Arc::new(DuckdbVectorRepository::new(&db_path).expect("duckdb init"));

    let vector = unit_vector(384, 3);
    let chunk_rec = record("same-id", "repo-1", "src/lib.rs", vector.clone());
    let summary_rec = record("same-id", "repo-1", "src/lib.rs", vector.clone());

    repo.insert_records(VectorPurpose::ChunkSource, vec![chunk_rec])
        .await
        .expect("insert chunk source");
    repo.insert_records(VectorPurpose::ChunkSummary, vec![summary_rec])
        .await
        .expect("insert chunk summary");

    assert_eq!(
        repo.count(VectorPurpose::ChunkSource, "repo-1")
            .await
            .expect("count source"),
        1
    );
    assert_eq!(
        repo.count(VectorPurpose::ChunkSummary, "repo-1")
            .await
            .expect("count summary"),
        1
    );
}
