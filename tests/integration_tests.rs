//! Integration tests exercising the graph/chunk pipeline end to end against
//! in-memory DuckDB connections.

use std::path::Path;
use std::sync::Arc;

use codekg::{
    collect_chunk_rows, CodeChunkRepository, DuckdbChunkRepository, DuckdbGraphStore,
    DuckdbMetadataRepository, FunctionRowRepository, GraphIndexUseCase, GraphStore, Language,
    LanguageAnalyzer, ListRepositoriesUseCase, RepositoryRepository, TreeSitterAnalyzer,
};
use duckdb::Connection;
use tokio::sync::Mutex;

async fn open_graph_store() -> Arc<DuckdbGraphStore> {
    let conn = Arc::new(Mutex::new(Connection::open_in_memory().expect("open in-memory duckdb")));
    let store = Arc::new(DuckdbGraphStore::with_connection(conn).expect("graph store init"));
    store.initialize().await.expect("graph schema init");
    store
}

async fn open_chunk_store() -> Arc<DuckdbChunkRepository> {
    let conn = Arc::new(Mutex::new(Connection::open_in_memory().expect("open in-memory duckdb")));
    let store = Arc::new(DuckdbChunkRepository::with_connection(conn).expect("chunk store init"));
    store.initialize().await.expect("chunk schema init");
    store
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_empty_repositories() {
    let repo_store = Arc::new(DuckdbMetadataRepository::in_memory().expect("in-memory metadata store"));
    let use_case = ListRepositoriesUseCase::new(repo_store as Arc<dyn RepositoryRepository>);

    let repos = use_case.execute().await.expect("failed to list repositories");
    assert!(repos.is_empty(), "should have no repositories initially");
}

#[tokio::test]
async fn test_python_analyzer_extracts_functions_and_classes() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("helpers.py"),
        "class Calculator:\n    def __init__(self):\n        self.value = 0\n\n    def add(self, x):\n        self.value += x\n        return self\n\nclass StringHelper:\n    @staticmethod\n    def reverse(s):\n        return s[::-1]\n",
    )
    .expect("write fixture");

    let analyzer = TreeSitterAnalyzer::python();
    let file = analyzer
        .analyze_file(dir.path().to_str().unwrap(), "helpers.py")
        .await
        .expect("analyze")
        .expect("non-empty file");

    assert_eq!(file.classes.len(), 2, "should extract 2 classes");
    assert_eq!(file.classes[0].methods.len(), 2);
}

#[tokio::test]
async fn test_go_analyzer_extracts_functions() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("main.go"),
        "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
    )
    .expect("write fixture");

    let analyzer = TreeSitterAnalyzer::go();
    let file = analyzer
        .analyze_file(dir.path().to_str().unwrap(), "main.go")
        .await
        .expect("analyze")
        .expect("non-empty file");

    assert_eq!(file.functions.len(), 1);
    assert!(file.imports.iter().any(|i| i == "fmt"));
}

#[tokio::test]
async fn test_language_detection() {
    assert_eq!(Language::from_path(Path::new("main.go")), Language::Go);
    assert_eq!(Language::from_path(Path::new("app.py")), Language::Python);
    assert_eq!(Language::from_path(Path::new("Main.java")), Language::Java);
    assert_eq!(Language::from_path(Path::new("lib.c")), Language::C);
    assert_eq!(Language::from_path(Path::new("lib.cpp")), Language::Cpp);
    assert_eq!(Language::from_path(Path::new("readme.md")), Language::Unknown);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_graph_populates_chunk_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("math.py"),
        "def add(a, b):\n    return a + b\n\nclass Calculator:\n    def multiply(self, a, b):\n        return a * b\n",
    )
    .expect("write fixture");

    let graph_store = open_graph_store().await;
    let chunk_store = open_chunk_store().await;

    let analyzers: Vec<Arc<dyn LanguageAnalyzer>> = vec![Arc::new(TreeSitterAnalyzer::python())];
    let use_case = GraphIndexUseCase::new(graph_store.clone() as Arc<dyn GraphStore>, analyzers);

    let project_dir = dir.path().to_str().unwrap().to_string();
    let result = use_case
        .generate_graph("repo-1", &project_dir, false, 0)
        .await
        .expect("generate_graph");

    assert_eq!(result.root_folder.total_files(), 1);

    let (chunks, functions, classes) = collect_chunk_rows("repo-1", &result.root_folder);
    assert_eq!(functions.len(), 2, "top-level add() and Calculator::multiply()");
    assert_eq!(classes.len(), 1);
    assert_eq!(chunks.len(), functions.len() + classes.len());

    for chunk in chunks {
        CodeChunkRepository::create(chunk_store.as_ref(), chunk)
            .await
            .expect("create chunk row");
    }
    for function in functions {
        FunctionRowRepository::create(chunk_store.as_ref(), function)
            .await
            .expect("create function row");
    }

    let stored = FunctionRowRepository::get_by_repo_id(chunk_store.as_ref(), "repo-1", 10, 0)
        .await
        .expect("get_by_repo_id");
    assert_eq!(stored.len(), 2);

    let project_nodes = graph_store
        .query_nodes(
            codekg::NodeLabel::Project,
            [("project_id".to_string(), "repo-1".to_string())]
                .into_iter()
                .collect(),
        )
        .await
        .expect("query project node");
    assert_eq!(project_nodes.len(), 1);
}
