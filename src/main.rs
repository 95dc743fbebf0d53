//! `codekg` CLI — code knowledge graph and semantic chunk index builder.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cli::{Commands, QueryCommands};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use codekg::{
    collect_chunk_rows, AnthropicClient, ClassRowRepository, CodeChunkRepository,
    DeleteRepositoryUseCase, DomainError, DuckdbChunkRepository, DuckdbFileHashRepository,
    DuckdbGraphStore, DuckdbMetadataRepository, DuckdbVectorRepository, FunctionRowRepository,
    GraphIndexUseCase, GraphStore, ListRepositoriesUseCase, MockEmbedding, NodeLabel,
    Repository, RepositoryRepository, SearchRequest, SearchUseCase, SummarySearchTarget,
    TreeSitterAnalyzer, Vectorizer,
};

#[derive(Parser)]
#[command(name = "codekg")]
#[command(author, version, about = "Code knowledge graph and semantic chunk index", long_about = None)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the DuckDB database file.
    #[arg(short, long, global = true, default_value = "~/.codekg")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging already initialized");
    }

    match run(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}

struct App {
    repository_repo: Arc<DuckdbMetadataRepository>,
    graph_store: Arc<DuckdbGraphStore>,
    chunk_store: Arc<DuckdbChunkRepository>,
    vector_repo: Arc<DuckdbVectorRepository>,
}

impl App {
    async fn open(data_dir: &str) -> Result<Self, DomainError> {
        let data_dir = expand_tilde(data_dir);
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| DomainError::io_failure(data_dir.clone(), e))?;
        let db_path = PathBuf::from(&data_dir).join("codekg.db");

        let repository_repo = Arc::new(DuckdbMetadataRepository::new(&db_path)?);
        let shared = repository_repo.shared_connection();

        let graph_store = Arc::new(DuckdbGraphStore::with_connection(shared.clone())?);
        graph_store.initialize().await?;

        let chunk_store = Arc::new(DuckdbChunkRepository::with_connection(shared.clone())?);
        chunk_store.initialize().await?;

        let vector_repo = Arc::new(DuckdbVectorRepository::with_connection(shared.clone()).await?);
        let _file_hash_repo = DuckdbFileHashRepository::with_connection(shared.clone()).await?;

        Ok(Self {
            repository_repo,
            graph_store,
            chunk_store,
            vector_repo,
        })
    }

    fn analyzers(&self) -> Vec<Arc<dyn codekg::LanguageAnalyzer>> {
        vec![
            Arc::new(TreeSitterAnalyzer::python()),
            Arc::new(TreeSitterAnalyzer::java()),
            Arc::new(TreeSitterAnalyzer::go()),
            Arc::new(TreeSitterAnalyzer::c()),
            Arc::new(TreeSitterAnalyzer::cpp()),
        ]
    }

    async fn resolve_repository(&self, id_or_path: &str) -> Result<Repository, DomainError> {
        if let Some(repo) = self.repository_repo.find_by_id(id_or_path).await? {
            return Ok(repo);
        }
        let canonical = std::path::Path::new(id_or_path)
            .canonicalize()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| id_or_path.to_string());
        self.repository_repo
            .find_by_path(&canonical)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no repository matches '{}'", id_or_path)))
    }
}

async fn run(cli: Cli) -> Result<(), DomainError> {
    let app = App::open(&cli.data_dir).await?;

    match cli.command {
        Commands::Generate { path, name, clean_stale } => cmd_generate(&app, path, name, clean_stale).await,
        Commands::UpdateFiles { repository, paths } => cmd_update_files(&app, repository, paths).await,
        Commands::UpdateFolders { repository, paths } => cmd_update_folders(&app, repository, paths).await,
        Commands::Process { repository, limit } => cmd_process(&app, repository, limit).await,
        Commands::Query(q) => cmd_query(&app, q).await,
        Commands::ChunkSearch { repository, query, summary, top_k, file_path } => {
            cmd_chunk_search(&app, repository, query, summary, top_k, file_path).await
        }
        Commands::RepoList => cmd_repo_list(&app).await,
        Commands::RepoDelete { id_or_path } => cmd_repo_delete(&app, id_or_path).await,
    }
}

async fn cmd_generate(app: &App, path: String, name: Option<String>, clean_stale: bool) -> Result<(), DomainError> {
    let canonical_path = std::path::Path::new(&path)
        .canonicalize()
        .map_err(|e| DomainError::invalid_input(format!("invalid path '{}': {}", path, e)))?
        .to_string_lossy()
        .to_string();

    let repo_name = name.unwrap_or_else(|| {
        std::path::Path::new(&canonical_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| canonical_path.clone())
    });

    let repo = match app.repository_repo.find_by_path(&canonical_path).await? {
        Some(existing) => existing,
        None => {
            let repo = Repository::new(repo_name, canonical_path.clone());
            app.repository_repo.save(&repo).await?;
            repo
        }
    };

    let use_case = GraphIndexUseCase::new(Arc::clone(&app.graph_store) as Arc<dyn GraphStore>, app.analyzers());
    let started_at = repo.created_at();
    let result = use_case.generate_graph(repo.id(), &canonical_path, clean_stale, started_at).await?;

    let (chunks, functions, classes) = collect_chunk_rows(repo.id(), &result.root_folder);
    let chunk_count = chunks.len() as u64;
    for chunk in chunks {
        CodeChunkRepository::create(app.chunk_store.as_ref(), chunk).await?;
    }
    for function in functions {
        FunctionRowRepository::create(app.chunk_store.as_ref(), function).await?;
    }
    for class in classes {
        ClassRowRepository::create(app.chunk_store.as_ref(), class).await?;
    }

    app.repository_repo
        .update_stats(repo.id(), chunk_count, result.root_folder.total_files() as u64)
        .await?;

    println!(
        "Indexed {} ({} files, {} chunks, {} stale nodes removed)",
        repo.name(),
        result.root_folder.total_files(),
        chunk_count,
        result.stale_deleted,
    );
    Ok(())
}

async fn cmd_update_files(app: &App, repository: String, paths: Vec<String>) -> Result<(), DomainError> {
    let repo = app.resolve_repository(&repository).await?;
    let use_case = GraphIndexUseCase::new(Arc::clone(&app.graph_store) as Arc<dyn GraphStore>, app.analyzers());
    let updated = use_case.update_files(repo.id(), repo.path(), &paths).await?;
    println!("Updated {} of {} files", updated.len(), paths.len());
    Ok(())
}

async fn cmd_update_folders(app: &App, repository: String, paths: Vec<String>) -> Result<(), DomainError> {
    let repo = app.resolve_repository(&repository).await?;
    let use_case = GraphIndexUseCase::new(Arc::clone(&app.graph_store) as Arc<dyn GraphStore>, app.analyzers());
    let updated = use_case.update_folders(repo.id(), repo.path(), &paths).await?;
    println!("Updated {} of {} folders", updated.len(), paths.len());
    Ok(())
}

async fn cmd_process(app: &App, repository: String, limit: u32) -> Result<(), DomainError> {
    let repo = app.resolve_repository(&repository).await?;
    let chunk_repo = Arc::clone(&app.chunk_store) as Arc<dyn CodeChunkRepository>;
    let function_repo = Arc::clone(&app.chunk_store) as Arc<dyn FunctionRowRepository>;
    let class_repo = Arc::clone(&app.chunk_store) as Arc<dyn ClassRowRepository>;
    let vector_repo = Arc::clone(&app.vector_repo) as Arc<dyn codekg::VectorRepository>;
    let embedding_service = Arc::new(MockEmbedding::new()) as Arc<dyn codekg::EmbeddingService>;
    let chat_service = Arc::new(AnthropicClient::from_env()) as Arc<dyn codekg::ChatService>;

    let vectorizer = Vectorizer::new(chunk_repo, function_repo, class_repo, vector_repo, embedding_service, chat_service);

    let summarized_chunks = vectorizer.scan_and_generate_summary_chunks(repo.id(), limit).await?;
    let summarized_functions = vectorizer.scan_and_generate_summary_functions(repo.id(), limit).await?;
    let summarized_classes = vectorizer.scan_and_generate_summary_classes(repo.id(), limit).await?;
    let vectorized_source = vectorizer.scan_and_vectorize_chunk_source(repo.id(), limit).await?;
    let vectorized_summary = vectorizer.scan_and_vectorize_chunk_summary(repo.id(), limit).await?;
    let vectorized_functions = vectorizer.scan_and_vectorize_functions(repo.id(), limit).await?;
    let vectorized_classes = vectorizer.scan_and_vectorize_classes(repo.id(), limit).await?;

    println!(
        "Summarized {}/{}/{} (chunks/functions/classes); vectorized {}/{}/{}/{} (source/summary/functions/classes)",
        summarized_chunks,
        summarized_functions,
        summarized_classes,
        vectorized_source,
        vectorized_summary,
        vectorized_functions,
        vectorized_classes,
    );
    Ok(())
}

async fn cmd_query(app: &App, query: QueryCommands) -> Result<(), DomainError> {
    match query {
        QueryCommands::ProjectSummary { repository } => {
            let repo = app.resolve_repository(&repository).await?;
            let mut key = std::collections::HashMap::new();
            key.insert("project_id".to_string(), repo.id().to_string());
            let nodes = app.graph_store.query_nodes(NodeLabel::Project, key).await?;
            match nodes.first() {
                Some(node) => println!("{}", node.set_props.get("name").map(String::as_str).unwrap_or("")),
                None => println!("(no project node)"),
            }
        }
        QueryCommands::FileSummary { repository, file_path } => {
            let repo = app.resolve_repository(&repository).await?;
            let mut key = std::collections::HashMap::new();
            key.insert("project_id".to_string(), repo.id().to_string());
            key.insert("file_path".to_string(), file_path);
            let nodes = app.graph_store.query_nodes(NodeLabel::File, key).await?;
            match nodes.first() {
                Some(node) => println!("{}", node.set_props.get("summary").map(String::as_str).unwrap_or("")),
                None => println!("(file not found)"),
            }
        }
        QueryCommands::Functions { repository, file_path, function } => {
            let repo = app.resolve_repository(&repository).await?;
            if let Some(name) = function {
                let Some(fp) = file_path else {
                    println!("--function requires --file-path");
                    return Ok(());
                };
                match FunctionRowRepository::get_by_file_and_name(app.chunk_store.as_ref(), repo.id(), &fp, &name)
                    .await?
                {
                    Some(row) => println!("{} {}", row.function_name(), row.function_signature()),
                    None => println!("(function not found)"),
                }
                return Ok(());
            }
            let rows = FunctionRowRepository::get_by_repo_id(app.chunk_store.as_ref(), repo.id(), 1000, 0).await?;
            for row in rows.iter().filter(|r| file_path.as_deref().map_or(true, |fp| fp == r.file_path())) {
                println!("{} {}", row.function_name(), row.function_signature());
            }
        }
        QueryCommands::Classes { repository, file_path, class } => {
            let repo = app.resolve_repository(&repository).await?;
            if let Some(name) = class {
                let Some(fp) = file_path else {
                    println!("--class requires --file-path");
                    return Ok(());
                };
                match ClassRowRepository::get_by_file_and_name(app.chunk_store.as_ref(), repo.id(), &fp, &name).await?
                {
                    Some(row) => println!("{} ({})", row.class_name(), row.class_type().as_str()),
                    None => println!("(class not found)"),
                }
                return Ok(());
            }
            let rows: Vec<_> = ClassRowRepository::get_by_repo_id(app.chunk_store.as_ref(), repo.id(), 1000, 0).await?;
            for row in rows.iter().filter(|r| file_path.as_deref().map_or(true, |fp| fp == r.file_path())) {
                println!("{} ({})", row.class_name(), row.class_type().as_str());
            }
        }
    }
    Ok(())
}

async fn cmd_chunk_search(
    app: &App,
    repository: String,
    query: String,
    summary: bool,
    top_k: usize,
    file_path: Option<String>,
) -> Result<(), DomainError> {
    let repo = app.resolve_repository(&repository).await?;
    let chunk_repo = Arc::clone(&app.chunk_store) as Arc<dyn CodeChunkRepository>;
    let function_repo = Arc::clone(&app.chunk_store) as Arc<dyn FunctionRowRepository>;
    let class_repo = Arc::clone(&app.chunk_store) as Arc<dyn ClassRowRepository>;
    let vector_repo = Arc::clone(&app.vector_repo) as Arc<dyn codekg::VectorRepository>;
    let embedding_service = Arc::new(MockEmbedding::new()) as Arc<dyn codekg::EmbeddingService>;

    let search = SearchUseCase::new(chunk_repo, function_repo, class_repo, vector_repo, embedding_service);

    let mut req = SearchRequest::new(repo.id(), query).with_top_k(top_k);
    if let Some(fp) = file_path {
        req = req.with_file_path(fp);
    }

    let response = if summary {
        search.search_by_summary_vector(&req, SummarySearchTarget::Chunk).await?
    } else {
        search.search_by_source_vector(&req).await?
    };

    if response.is_empty() {
        println!("No results found.");
    } else {
        for (i, row) in response.results().iter().enumerate() {
            println!("{}. {} (score: {:.3})", i + 1, row.location(), row.score().unwrap_or(0.0));
            for line in row.source_code().lines().take(3) {
                println!("   | {}", line);
            }
        }
    }
    Ok(())
}

async fn cmd_repo_list(app: &App) -> Result<(), DomainError> {
    let use_case = ListRepositoriesUseCase::new(Arc::clone(&app.repository_repo) as Arc<dyn RepositoryRepository>);
    let repos = use_case.execute().await?;
    if repos.is_empty() {
        println!("No repositories indexed.");
    } else {
        for repo in repos {
            println!("{} ({})", repo.name(), repo.id());
            println!("  path: {}", repo.path());
            println!("  files: {}, chunks: {}", repo.file_count(), repo.chunk_count());
        }
    }
    Ok(())
}

async fn cmd_repo_delete(app: &App, id_or_path: String) -> Result<(), DomainError> {
    let repo = app.resolve_repository(&id_or_path).await?;
    let use_case = DeleteRepositoryUseCase::new(
        Arc::clone(&app.repository_repo) as Arc<dyn RepositoryRepository>,
        Arc::clone(&app.graph_store) as Arc<dyn GraphStore>,
        Arc::clone(&app.chunk_store) as Arc<dyn CodeChunkRepository>,
        Arc::clone(&app.chunk_store) as Arc<dyn FunctionRowRepository>,
        Arc::clone(&app.chunk_store) as Arc<dyn ClassRowRepository>,
        Arc::clone(&app.vector_repo) as Arc<dyn codekg::VectorRepository>,
    );
    use_case.execute(repo.id()).await?;
    println!("Repository deleted: {}", repo.name());
    Ok(())
}
