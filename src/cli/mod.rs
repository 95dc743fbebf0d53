use clap::Subcommand;

/// Top-level `codekg` subcommands (§6 External Interfaces). Graph and chunk
/// operations are grouped the way the teacher groups its own index/search
/// surface; the exit-code mapping from [`crate::domain::DomainError`] lives
/// in `main.rs`.
#[derive(Subcommand)]
pub enum Commands {
    /// Walk a repository and materialize its graph and chunk tables from
    /// scratch.
    Generate {
        /// Path to the repository to index.
        path: String,

        /// Optional name for the repository (defaults to the directory name).
        #[arg(short, long)]
        name: Option<String>,

        /// Delete graph nodes that weren't touched by this run.
        #[arg(long)]
        clean_stale: bool,
    },

    /// Re-analyze specific files within an already-indexed repository.
    UpdateFiles {
        /// Repository id or path.
        repository: String,

        /// Paths to re-analyze, relative to the repository root.
        paths: Vec<String>,
    },

    /// Re-analyze specific folders within an already-indexed repository.
    UpdateFolders {
        /// Repository id or path.
        repository: String,

        /// Paths to re-analyze, relative to the repository root.
        paths: Vec<String>,
    },

    /// Run the Summarizer and Vectorizer scan-and-process batch workers.
    Process {
        /// Repository id or path.
        repository: String,

        /// Rows to scan per table per pass.
        #[arg(long, default_value = "100")]
        limit: u32,
    },

    /// Read back materialized graph/chunk content.
    #[command(subcommand)]
    Query(QueryCommands),

    /// Dense-vector search over a repository's chunk tables.
    ChunkSearch {
        /// Repository id or path.
        repository: String,

        /// The search query.
        query: String,

        /// Search the summary space instead of the raw-source space.
        #[arg(long)]
        summary: bool,

        /// Maximum number of results.
        #[arg(long, default_value = "10")]
        top_k: usize,

        /// Restrict results to one file path.
        #[arg(long)]
        file_path: Option<String>,
    },

    /// List indexed repositories.
    RepoList,

    /// Delete an indexed repository and everything derived from it.
    RepoDelete {
        /// Repository id or path.
        id_or_path: String,
    },
}

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Print a project's root-folder summary.
    ProjectSummary { repository: String },
    /// Print one file's summary.
    FileSummary { repository: String, file_path: String },
    /// List a file's (or the whole repository's) functions, or look up one
    /// function by name within a file.
    Functions {
        repository: String,
        #[arg(long)]
        file_path: Option<String>,
        /// Look up a single function by name (requires `--file-path`).
        #[arg(long)]
        function: Option<String>,
    },
    /// List a file's (or the whole repository's) classes, or look up one
    /// class by name within a file.
    Classes {
        repository: String,
        #[arg(long)]
        file_path: Option<String>,
        /// Look up a single class by name (requires `--file-path`).
        #[arg(long)]
        class: Option<String>,
    },
}
