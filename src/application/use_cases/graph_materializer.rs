use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::GraphStore;
use crate::domain::services::LanguageAnalyzer;
use crate::domain::{
    is_excluded_dir_name, ClassInfo, DomainError, EdgeType, FileInfo, FolderInfo, FunctionInfo,
    FunctionKind, Language, NodeLabel, PropertyMap, RepoClassRow, RepoCodeChunk, RepoFunctionRow,
};

fn prop(pairs: &[(&str, &str)]) -> PropertyMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Walks a project directory into a [`FolderInfo`] tree, dispatching each
/// recognized file to its [`LanguageAnalyzer`] (§4.1, §4.2). Skips the fixed
/// exclusion set and dot-prefixed entries; analyzer failures are logged and
/// swallowed so one bad file never aborts the walk.
pub struct FolderWalker {
    analyzers: HashMap<Language, Arc<dyn LanguageAnalyzer>>,
}

impl FolderWalker {
    pub fn new(analyzers: Vec<Arc<dyn LanguageAnalyzer>>) -> Self {
        let analyzers = analyzers.into_iter().map(|a| (a.language(), a)).collect();
        Self { analyzers }
    }

    pub async fn walk(&self, base_path: &str, relative: &str) -> Result<FolderInfo, DomainError> {
        let name = if relative == "." {
            Path::new(base_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| ".".to_string())
        } else {
            Path::new(relative)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        };

        let mut folder = FolderInfo::new(relative, name);
        let dir_path = Path::new(base_path).join(relative);

        let mut entries: Vec<_> = std::fs::read_dir(&dir_path)
            .map_err(|e| DomainError::io_failure(dir_path.to_string_lossy().to_string(), e))?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let entry_name = entry.file_name().to_string_lossy().to_string();
            if is_excluded_dir_name(&entry_name) {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            let child_relative = if relative == "." {
                entry_name.clone()
            } else {
                format!("{relative}/{entry_name}")
            };

            if file_type.is_dir() {
                let child = Box::pin(self.walk(base_path, &child_relative)).await?;
                folder.subfolders.push(child);
                continue;
            }

            let language = Language::from_path(Path::new(&entry_name));
            let Some(analyzer) = self.analyzers.get(&language) else {
                continue;
            };

            match analyzer.analyze_file(base_path, &child_relative).await {
                Ok(Some(file_info)) => folder.files.push(file_info),
                Ok(None) => {}
                Err(e) => warn!("Analyzer failed for {}: {}", child_relative, e),
            }
        }

        Ok(folder)
    }
}

/// Materializes the IR produced by analyzers into the Graph Store (§4.3).
/// Every operation is idempotent: re-running a generate/update pass over
/// unchanged source produces the same graph.
pub struct GraphMaterializer {
    graph_store: Arc<dyn GraphStore>,
}

impl GraphMaterializer {
    pub fn new(graph_store: Arc<dyn GraphStore>) -> Self {
        Self { graph_store }
    }

    pub async fn save_project(
        &self,
        project_id: &str,
        name: &str,
        root_path: &str,
    ) -> Result<(), DomainError> {
        let key = prop(&[("project_id", project_id)]);
        let set = prop(&[("name", name), ("root_path", root_path)]);
        self.graph_store
            .upsert_node(NodeLabel::Project, key, set, PropertyMap::new())
            .await
    }

    pub async fn save_folder_tree(
        &self,
        project_id: &str,
        root: &FolderInfo,
    ) -> Result<(), DomainError> {
        self.save_folder_recursive(project_id, root, None).await
    }

    async fn save_folder_recursive(
        &self,
        project_id: &str,
        folder: &FolderInfo,
        parent_path: Option<&str>,
    ) -> Result<(), DomainError> {
        let key = prop(&[("project_id", project_id), ("path", &folder.path)]);
        let set = prop(&[("name", &folder.name), ("summary", &folder.summary)]);
        self.graph_store
            .upsert_node(NodeLabel::Folder, key.clone(), set, PropertyMap::new())
            .await?;

        match parent_path {
            Some(parent) => {
                let parent_key = prop(&[("project_id", project_id), ("path", parent)]);
                self.graph_store
                    .upsert_edge(EdgeType::Contains, NodeLabel::Folder, parent_key, NodeLabel::Folder, key.clone())
                    .await?;
            }
            None => {
                let project_key = prop(&[("project_id", project_id)]);
                self.graph_store
                    .upsert_edge(EdgeType::Contains, NodeLabel::Project, project_key, NodeLabel::Folder, key.clone())
                    .await?;
            }
        }

        for file in &folder.files {
            self.save_file_node(project_id, file).await?;
            let file_key = prop(&[("project_id", project_id), ("file_path", &file.file_path)]);
            self.graph_store
                .upsert_edge(EdgeType::Contains, NodeLabel::Folder, key.clone(), NodeLabel::File, file_key)
                .await?;
        }

        for sub in &folder.subfolders {
            Box::pin(self.save_folder_recursive(project_id, sub, Some(&folder.path))).await?;
        }

        Ok(())
    }

    pub async fn save_file_node(&self, project_id: &str, file: &FileInfo) -> Result<(), DomainError> {
        let key = prop(&[("project_id", project_id), ("file_path", &file.file_path)]);
        let set = prop(&[
            ("language", file.language.as_str()),
            ("summary", &file.summary),
        ]);
        self.graph_store
            .upsert_node(NodeLabel::File, key, set, PropertyMap::new())
            .await?;

        for class in &file.classes {
            self.save_class_node(project_id, file, class).await?;
        }
        for function in &file.functions {
            self.save_function_node(project_id, file, function).await?;
        }
        Ok(())
    }

    pub async fn save_class_node(
        &self,
        project_id: &str,
        file: &FileInfo,
        class: &ClassInfo,
    ) -> Result<(), DomainError> {
        let key = prop(&[("project_id", project_id), ("full_name", &class.full_name)]);
        let set = prop(&[
            ("name", &class.name),
            ("file_path", &class.file_path),
            ("node_type", class.node_type.as_str()),
            ("summary", class.docstring.as_deref().unwrap_or("")),
        ]);
        self.graph_store
            .upsert_node(NodeLabel::Class, key.clone(), set, PropertyMap::new())
            .await?;

        let file_key = prop(&[("project_id", project_id), ("file_path", &file.file_path)]);
        self.graph_store
            .upsert_edge(EdgeType::Contains, NodeLabel::File, file_key, NodeLabel::Class, key.clone())
            .await?;

        for base in &class.base_classes {
            let base_key = prop(&[("project_id", project_id), ("full_name", &base.full_name)]);
            let base_set = prop(&[("name", &base.name), ("node_type", base.node_type.as_str())]);
            self.graph_store
                .upsert_node(NodeLabel::Class, base_key.clone(), base_set, PropertyMap::new())
                .await?;

            let edge_type = if matches!(base.node_type, crate::domain::ClassNodeType::Interface) {
                EdgeType::Implements
            } else {
                EdgeType::Inherits
            };
            self.graph_store
                .upsert_edge(edge_type, NodeLabel::Class, key.clone(), NodeLabel::Class, base_key)
                .await?;
        }

        for method in &class.methods {
            self.save_method_node(project_id, class, method).await?;
        }
        Ok(())
    }

    pub async fn save_function_node(
        &self,
        project_id: &str,
        file: &FileInfo,
        function: &FunctionInfo,
    ) -> Result<(), DomainError> {
        let file_key = prop(&[("project_id", project_id), ("file_path", &file.file_path)]);
        self.upsert_function_and_calls(project_id, function, NodeLabel::File, file_key).await
    }

    pub async fn save_method_node(
        &self,
        project_id: &str,
        class: &ClassInfo,
        function: &FunctionInfo,
    ) -> Result<(), DomainError> {
        let class_key = prop(&[("project_id", project_id), ("full_name", &class.full_name)]);
        self.upsert_function_and_calls(project_id, function, NodeLabel::Class, class_key).await
    }

    async fn upsert_function_and_calls(
        &self,
        project_id: &str,
        function: &FunctionInfo,
        container_label: NodeLabel,
        container_key: PropertyMap,
    ) -> Result<(), DomainError> {
        let key = prop(&[
            ("project_id", project_id),
            ("full_name", &function.full_name),
            ("signature", &function.signature),
        ]);
        let set = prop(&[
            ("name", &function.name),
            ("file_path", &function.file_path),
            ("kind", function.kind.as_str()),
            ("summary", function.docstring.as_deref().unwrap_or("")),
        ]);
        self.graph_store
            .upsert_node(NodeLabel::Function, key.clone(), set, PropertyMap::new())
            .await?;

        self.graph_store
            .upsert_edge(EdgeType::Contains, container_label, container_key, NodeLabel::Function, key.clone())
            .await?;

        for call in &function.calls {
            let callee_key = prop(&[
                ("project_id", project_id),
                ("full_name", &call.full_name),
                ("signature", &call.signature),
            ]);
            self.graph_store
                .upsert_node(
                    NodeLabel::Function,
                    callee_key.clone(),
                    PropertyMap::new(),
                    prop(&[("name", &call.name), ("kind", FunctionKind::Api.as_str())]),
                )
                .await?;
            self.graph_store
                .upsert_edge(EdgeType::Calls, NodeLabel::Function, key.clone(), NodeLabel::Function, callee_key)
                .await?;
        }

        Ok(())
    }

    pub async fn delete_file_nodes(&self, project_id: &str, file_path: &str) -> Result<u64, DomainError> {
        let mut total = 0;
        for label in [NodeLabel::Function, NodeLabel::Class] {
            let key = prop(&[("project_id", project_id), ("file_path", file_path)]);
            total += self.graph_store.detach_delete_by_match(label, key).await?;
        }
        let file_key = prop(&[("project_id", project_id), ("file_path", file_path)]);
        total += self.graph_store.detach_delete_by_match(NodeLabel::File, file_key).await?;
        Ok(total)
    }

    pub async fn delete_folder_nodes(&self, project_id: &str, folder_path: &str) -> Result<u64, DomainError> {
        let mut total = 0;
        let folders = self
            .graph_store
            .query_nodes(NodeLabel::Folder, prop(&[("project_id", project_id)]))
            .await?;
        for folder in folders {
            let Some(path) = folder.key_value("path") else { continue };
            if path == folder_path || path.starts_with(&format!("{folder_path}/")) {
                let key = prop(&[("project_id", project_id), ("path", path)]);
                total += self.graph_store.detach_delete_by_match(NodeLabel::Folder, key).await?;
            }
        }

        let files = self
            .graph_store
            .query_nodes(NodeLabel::File, prop(&[("project_id", project_id)]))
            .await?;
        for file in files {
            let Some(file_path) = file.key_value("file_path") else { continue };
            if file_path.starts_with(&format!("{folder_path}/")) || folder_path == "." {
                total += self.delete_file_nodes(project_id, file_path).await?;
            }
        }
        Ok(total)
    }

    pub async fn delete_stale_nodes(&self, project_id: &str, before: i64) -> Result<u64, DomainError> {
        let mut total = 0;
        for label in [NodeLabel::Function, NodeLabel::Class, NodeLabel::File, NodeLabel::Folder] {
            let nodes = self
                .graph_store
                .query_nodes(label, prop(&[("project_id", project_id)]))
                .await?;
            for node in nodes {
                if node.updated_at < before {
                    let key = node.key_props.clone();
                    total += self.graph_store.detach_delete_by_match(label, key).await?;
                }
            }
        }
        Ok(total)
    }
}

/// Flattens a walked [`FolderInfo`] tree into rows for the three relational
/// chunk tables (§4.4), one `RepoCodeChunk`/`RepoFunctionRow` per function or
/// method and one `RepoCodeChunk`/`RepoClassRow` per class, mirroring the
/// node granularity the Graph Materializer asserts into the graph.
pub fn collect_chunk_rows(
    repository_id: &str,
    folder: &FolderInfo,
) -> (Vec<RepoCodeChunk>, Vec<RepoFunctionRow>, Vec<RepoClassRow>) {
    let mut chunks = Vec::new();
    let mut functions = Vec::new();
    let mut classes = Vec::new();
    collect_from_folder(repository_id, folder, &mut chunks, &mut functions, &mut classes);
    (chunks, functions, classes)
}

fn push_function_rows(
    repository_id: &str,
    language: Language,
    function: &FunctionInfo,
    chunks: &mut Vec<RepoCodeChunk>,
    functions: &mut Vec<RepoFunctionRow>,
) {
    chunks.push(RepoCodeChunk::new(
        repository_id,
        &function.file_path,
        language,
        &function.source_code,
        function.start_line,
        function.end_line,
    ));
    functions.push(RepoFunctionRow::new(
        repository_id,
        &function.file_path,
        &function.source_code,
        function.start_line,
        function.end_line,
        &function.name,
        &function.signature,
    ));
}

fn collect_from_folder(
    repository_id: &str,
    folder: &FolderInfo,
    chunks: &mut Vec<RepoCodeChunk>,
    functions: &mut Vec<RepoFunctionRow>,
    classes: &mut Vec<RepoClassRow>,
) {
    for file in &folder.files {
        for function in &file.functions {
            push_function_rows(repository_id, file.language, function, chunks, functions);
        }
        for class in &file.classes {
            chunks.push(RepoCodeChunk::new(
                repository_id,
                &class.file_path,
                file.language,
                &class.source_code,
                class.start_line,
                class.end_line,
            ));
            classes.push(RepoClassRow::new(
                repository_id,
                &class.file_path,
                &class.source_code,
                class.start_line,
                class.end_line,
                &class.name,
                class.node_type,
            ));
            for method in &class.methods {
                push_function_rows(repository_id, file.language, method, chunks, functions);
            }
        }
    }
    for sub in &folder.subfolders {
        collect_from_folder(repository_id, sub, chunks, functions, classes);
    }
}

/// Orchestration entry points (§4.3): `generate_graph` performs a full walk
/// and materialization; `update_files`/`update_folders` re-analyze specific
/// paths, skipping ones no longer on disk and logging per-path failures
/// without aborting the batch — mirrors the teacher's `index`/
/// `incremental_index` continue-on-error loop.
pub struct GraphIndexUseCase {
    materializer: GraphMaterializer,
    walker: FolderWalker,
}

pub struct GenerateGraphResult {
    pub root_folder: FolderInfo,
    pub stale_deleted: u64,
}

impl GraphIndexUseCase {
    pub fn new(graph_store: Arc<dyn GraphStore>, analyzers: Vec<Arc<dyn LanguageAnalyzer>>) -> Self {
        Self {
            materializer: GraphMaterializer::new(graph_store),
            walker: FolderWalker::new(analyzers),
        }
    }

    pub async fn generate_graph(
        &self,
        project_id: &str,
        project_dir: &str,
        clean_stale: bool,
        run_started_at: i64,
    ) -> Result<GenerateGraphResult, DomainError> {
        let name = Path::new(project_dir)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| project_dir.to_string());

        self.materializer.save_project(project_id, &name, project_dir).await?;

        let root = self.walker.walk(project_dir, ".").await?;
        self.materializer.save_folder_tree(project_id, &root).await?;

        let stale_deleted = if clean_stale {
            self.materializer.delete_stale_nodes(project_id, run_started_at).await?
        } else {
            0
        };

        debug!(
            "generate_graph: project={} files={} stale_deleted={}",
            project_id,
            root.total_files(),
            stale_deleted
        );

        Ok(GenerateGraphResult {
            root_folder: root,
            stale_deleted,
        })
    }

    pub async fn update_files(
        &self,
        project_id: &str,
        project_dir: &str,
        paths: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let mut updated = Vec::new();
        for path in paths {
            let full_path = Path::new(project_dir).join(path);
            if !full_path.exists() {
                continue;
            }
            if let Err(e) = self.materializer.delete_file_nodes(project_id, path).await {
                warn!("update_files: failed to delete stale nodes for {}: {}", path, e);
                continue;
            }
            let language = Language::from_path(Path::new(path));
            let Some(analyzer) = self.walker.analyzers.get(&language) else {
                continue;
            };
            match analyzer.analyze_file(project_dir, path).await {
                Ok(Some(file_info)) => {
                    if let Err(e) = self.materializer.save_file_node(project_id, &file_info).await {
                        warn!("update_files: failed to save {}: {}", path, e);
                        continue;
                    }
                    updated.push(path.clone());
                }
                Ok(None) => updated.push(path.clone()),
                Err(e) => warn!("update_files: analyzer failed for {}: {}", path, e),
            }
        }
        Ok(updated)
    }

    pub async fn update_folders(
        &self,
        project_id: &str,
        project_dir: &str,
        paths: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let mut updated = Vec::new();
        for path in paths {
            let full_path = Path::new(project_dir).join(path);
            if !full_path.exists() {
                continue;
            }
            if let Err(e) = self.materializer.delete_folder_nodes(project_id, path).await {
                warn!("update_folders: failed to delete stale nodes for {}: {}", path, e);
                continue;
            }
            match self.walker.walk(project_dir, path).await {
                Ok(folder) => {
                    if let Err(e) = self.materializer.save_folder_tree(project_id, &folder).await {
                        warn!("update_folders: failed to save {}: {}", path, e);
                        continue;
                    }
                    updated.push(path.clone());
                }
                Err(e) => warn!("update_folders: walk failed for {}: {}", path, e),
            }
        }
        Ok(updated)
    }
}
