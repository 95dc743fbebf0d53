//! Intermediate representation produced by language analyzers (§3, §4.1).
//!
//! Every analyzer, regardless of source language, normalizes a file into a
//! [`FileInfo`] tree: classes, top-level functions, imports, and the call
//! sites observed inside function bodies. The Graph Materializer and Chunk
//! Repository consume this tree; neither ever looks at source text again.

use serde::{Deserialize, Serialize};

use super::Language;

/// One observed call site inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    pub name: String,
    /// Best-effort fully qualified name of the callee.
    pub full_name: String,
    /// Call-site shape: `name(argType1, ...) -> retType`.
    pub signature: String,
}

impl CallInfo {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            signature: signature.into(),
        }
    }
}

/// A function, method, or external API reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Method,
    Api,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Method => "method",
            FunctionKind::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Module-qualified; for methods includes the class.
    pub full_name: String,
    /// Definition-site signature: `name(paramTypes) -> returnType`.
    pub signature: String,
    pub kind: FunctionKind,
    pub source_code: String,
    pub params: Vec<String>,
    pub param_types: Vec<String>,
    pub returns: Vec<String>,
    pub return_types: Vec<String>,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub docstring: Option<String>,
    /// Set only for methods.
    pub class_name: Option<String>,
    pub calls: Vec<CallInfo>,
}

impl FunctionInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        signature: impl Into<String>,
        kind: FunctionKind,
        file_path: impl Into<String>,
        source_code: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            signature: signature.into(),
            kind,
            source_code: source_code.into(),
            params: Vec::new(),
            param_types: Vec::new(),
            returns: Vec::new(),
            return_types: Vec::new(),
            file_path: file_path.into(),
            start_line,
            end_line,
            docstring: None,
            class_name: None,
            calls: Vec::new(),
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, FunctionKind::Method)
    }
}

/// A class/struct/interface node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassNodeType {
    Class,
    Struct,
    Interface,
}

impl ClassNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassNodeType::Class => "class",
            ClassNodeType::Struct => "struct",
            ClassNodeType::Interface => "interface",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "struct" => ClassNodeType::Struct,
            "interface" => ClassNodeType::Interface,
            _ => ClassNodeType::Class,
        }
    }
}

/// A lightweight reference to a base class: `{name, full_name, node_type}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseClassRef {
    pub name: String,
    pub full_name: String,
    pub node_type: ClassNodeType,
}

impl BaseClassRef {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>, node_type: ClassNodeType) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            node_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub full_name: String,
    pub file_path: String,
    pub node_type: ClassNodeType,
    pub source_code: String,
    pub start_line: u32,
    pub end_line: u32,
    pub methods: Vec<FunctionInfo>,
    /// For structs, formatted `field:Type`.
    pub attributes: Vec<String>,
    pub base_classes: Vec<BaseClassRef>,
    pub docstring: Option<String>,
}

impl ClassInfo {
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        file_path: impl Into<String>,
        node_type: ClassNodeType,
        source_code: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            file_path: file_path.into(),
            node_type,
            source_code: source_code.into(),
            start_line,
            end_line,
            methods: Vec::new(),
            attributes: Vec::new(),
            base_classes: Vec::new(),
            docstring: None,
        }
    }
}

/// A fully analyzed source file: `{file_path, language, summary, functions, classes, imports}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// POSIX-normalized, relative to the project root.
    pub file_path: String,
    pub language: Language,
    pub summary: String,
    /// Top-level functions only; methods live inside their class.
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
}

impl FileInfo {
    pub fn new(file_path: impl Into<String>, language: Language) -> Self {
        Self {
            file_path: file_path.into(),
            language,
            summary: String::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Project-relative file path with extension stripped and separators
    /// replaced by dots — the module path every `full_name` is anchored to.
    pub fn module_path(&self) -> String {
        module_path_from_relative(&self.file_path)
    }
}

/// Computes the module path from a project-relative file path: strip the
/// extension, replace path separators with dots.
pub fn module_path_from_relative(relative_path: &str) -> String {
    let normalized = relative_path.replace('\\', "/");
    let without_ext = match normalized.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => normalized.trim_end_matches('/'),
    };
    without_ext.replace('/', ".")
}

/// A directory tree node produced by the Folder Walker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderInfo {
    /// Relative to `base_path`; the root folder uses `"."`.
    pub path: String,
    pub name: String,
    pub summary: String,
    pub files: Vec<FileInfo>,
    pub subfolders: Vec<FolderInfo>,
}

impl FolderInfo {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            summary: String::new(),
            files: Vec::new(),
            subfolders: Vec::new(),
        }
    }

    /// Counts files across this folder and all subfolders.
    pub fn total_files(&self) -> usize {
        self.files.len() + self.subfolders.iter().map(FolderInfo::total_files).sum::<usize>()
    }
}

/// Directory names excluded from the walk, regardless of depth (§3).
pub const EXCLUDED_DIR_NAMES: &[&str] = &[
    "__pycache__",
    ".git",
    ".idea",
    ".vscode",
    "venv",
    "node_modules",
    "dist",
    "build",
    "target",
    ".pytest_cache",
    ".mypy_cache",
    ".coverage",
    "__tests__",
    "tests",
];

/// True if `name` should be skipped by the Folder Walker: in the fixed
/// exclusion set, or dot-prefixed.
pub fn is_excluded_dir_name(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIR_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_path_strips_extension_and_replaces_separators() {
        assert_eq!(module_path_from_relative("pkg/m.py"), "pkg.m");
        assert_eq!(module_path_from_relative("a/b/c.go"), "a.b.c");
        assert_eq!(module_path_from_relative("top.py"), "top");
    }

    #[test]
    fn excluded_dir_names_cover_the_fixed_set_and_dotfiles() {
        assert!(is_excluded_dir_name("node_modules"));
        assert!(is_excluded_dir_name(".github"));
        assert!(!is_excluded_dir_name("src"));
    }

    #[test]
    fn function_info_defaults_are_empty() {
        let f = FunctionInfo::new("f", "pkg.f", "f() -> Any", FunctionKind::Function, "pkg.py", "def f(): ...", 1, 1);
        assert!(f.calls.is_empty());
        assert!(!f.is_method());
    }
}
