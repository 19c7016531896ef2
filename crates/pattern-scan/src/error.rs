use thiserror::Error;

/// Result type for pattern scanning operations
pub type Result<T> = std::result::Result<T, PatternScanError>;

/// Errors that can occur while scanning source for judgment patterns
#[derive(Error, Debug)]
pub enum PatternScanError {
    /// The source could not be parsed into a complete syntax tree
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No grammar is available for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl PatternScanError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
