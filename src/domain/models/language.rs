use serde::{Deserialize, Serialize};
use std::path::Path;

/// The languages a Language Analyzer can parse (§2, §4.1). Anything else
/// resolves to `Unknown` and the Folder Walker skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Go,
    Cpp,
    C,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Language::Python,
            "java" => Language::Java,
            "go" => Language::Go,
            "cpp" | "cxx" | "cc" | "hpp" | "hxx" => Language::Cpp,
            "c" | "h" => Language::C,
            _ => Language::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "python" => Language::Python,
            "java" => Language::Java,
            "go" | "golang" => Language::Go,
            "cpp" | "c++" => Language::Cpp,
            "c" => Language::C,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    pub fn primary_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Java => "java",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Unknown => "",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Java => &["java"],
            Language::Go => &["go"],
            Language::Cpp => &["cpp", "cxx", "cc", "hpp", "hxx"],
            Language::C => &["c", "h"],
            Language::Unknown => &[],
        }
    }

    /// C structs never carry methods; every other known language does (§4.1).
    pub fn supports_methods(&self) -> bool {
        !matches!(self, Language::C | Language::Unknown)
    }

    pub fn all_supported() -> Vec<Language> {
        vec![
            Language::Python,
            Language::Java,
            Language::Go,
            Language::Cpp,
            Language::C,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("java"), Language::Java);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("cpp"), Language::Cpp);
        assert_eq!(Language::from_extension("hpp"), Language::Cpp);
        assert_eq!(Language::from_extension("c"), Language::C);
        assert_eq!(Language::from_extension("h"), Language::C);
        assert_eq!(Language::from_extension("rs"), Language::Unknown);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            Language::from_path(Path::new("pkg/main.go")),
            Language::Go
        );
        assert_eq!(
            Language::from_path(Path::new("script.py")),
            Language::Python
        );
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!(Language::parse("python"), Language::Python);
        assert_eq!(Language::parse("JAVA"), Language::Java);
        assert_eq!(Language::parse("unknown_lang"), Language::Unknown);
    }

    #[test]
    fn test_is_known() {
        assert!(Language::Python.is_known());
        assert!(Language::Go.is_known());
        assert!(!Language::Unknown.is_known());
    }

    #[test]
    fn test_c_structs_have_no_methods() {
        assert!(!Language::C.supports_methods());
        assert!(Language::Cpp.supports_methods());
        assert!(Language::Java.supports_methods());
    }

    #[test]
    fn test_all_supported_excludes_unknown() {
        let supported = Language::all_supported();
        assert!(supported.contains(&Language::Python));
        assert!(supported.contains(&Language::C));
        assert!(!supported.contains(&Language::Unknown));
    }
}
