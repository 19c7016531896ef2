use crate::error::{PatternScanError, Result};
use std::path::Path;

/// Source dialect of a scanned file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    /// TypeScript with JSX, which needs its own grammar
    Tsx,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Unknown,
}

/// Name and lowercase extensions of every recognized language
const LANGUAGE_TABLE: &[(Language, &str, &[&str])] = &[
    (Language::Rust, "rust", &["rs"]),
    (Language::Python, "python", &["py", "pyw"]),
    (Language::JavaScript, "javascript", &["js", "mjs", "cjs", "jsx"]),
    (Language::TypeScript, "typescript", &["ts", "mts", "cts"]),
    (Language::Tsx, "tsx", &["tsx"]),
    (Language::Go, "go", &["go"]),
    (Language::Java, "java", &["java"]),
    (Language::C, "c", &["c", "h"]),
    (Language::Cpp, "cpp", &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
    (Language::CSharp, "csharp", &["cs"]),
    (Language::Ruby, "ruby", &["rb"]),
    (Language::Swift, "swift", &["swift"]),
    (Language::Kotlin, "kotlin", &["kt", "kts"]),
];

impl Language {
    /// Case-insensitive lookup; unrecognized extensions are [`Language::Unknown`]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        LANGUAGE_TABLE
            .iter()
            .find(|(_, _, extensions)| extensions.contains(&ext.as_str()))
            .map_or(Language::Unknown, |(language, _, _)| *language)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Language::Unknown, Self::from_extension)
    }

    pub fn as_str(self) -> &'static str {
        LANGUAGE_TABLE
            .iter()
            .find(|(language, _, _)| *language == self)
            .map_or("unknown", |(_, name, _)| *name)
    }

    /// Check if this language gets the structural (syntax tree) pass
    pub fn supports_ast(self) -> bool {
        matches!(
            self,
            Language::Rust
                | Language::Python
                | Language::JavaScript
                | Language::TypeScript
                | Language::Tsx
                | Language::Go
        )
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Go => Ok(tree_sitter_go::LANGUAGE.into()),
            _ => Err(PatternScanError::unsupported_language(self.as_str())),
        }
    }

    /// Line prefixes that mark a comment-only line.
    ///
    /// Unknown dialects get the C-style set.
    pub fn comment_prefixes(self) -> &'static [&'static str] {
        match self {
            Language::Python | Language::Ruby => &["#"],
            _ => &["//", "/*", "*"],
        }
    }

    /// True when `trimmed` (already whitespace-trimmed) is a comment-only line
    pub fn is_comment_line(self, trimmed: &str) -> bool {
        self.comment_prefixes()
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("tsx"), Language::Tsx);
        assert_eq!(Language::from_extension("unknown"), Language::Unknown);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("src/main.rs"), Language::Rust);
        assert_eq!(Language::from_path("pkg/health/registry.go"), Language::Go);
        assert_eq!(Language::from_path("no_extension"), Language::Unknown);
    }

    #[test]
    fn test_supports_ast() {
        assert!(Language::Rust.supports_ast());
        assert!(Language::TypeScript.supports_ast());
        assert!(Language::Tsx.supports_ast());
        assert!(Language::Go.supports_ast());
        assert!(!Language::Java.supports_ast());
        assert!(Language::Java.tree_sitter_language().is_err());
    }

    #[test]
    fn test_comment_lines() {
        assert!(Language::Rust.is_comment_line("// note"));
        assert!(Language::Go.is_comment_line("* continued block"));
        assert!(Language::Python.is_comment_line("# note"));
        assert!(!Language::Python.is_comment_line("x = 1  # trailing"));
        assert!(Language::Unknown.is_comment_line("/* header"));
    }
}
