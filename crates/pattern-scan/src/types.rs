use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of code that may encode a judgment call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Comparison against a numeric literal
    MagicNumber,
    /// Regex or pattern compilation
    RegexParsing,
    /// Prefix/suffix/substring text matching
    StringMatching,
    /// Conditional with two or more boolean combinators
    ComplexConditional,
    /// String literal that looks like an absolute filesystem path (line pass only)
    HardcodedPath,
}

impl CandidateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateKind::MagicNumber => "magic_number",
            CandidateKind::RegexParsing => "regex_parsing",
            CandidateKind::StringMatching => "string_matching",
            CandidateKind::ComplexConditional => "complex_conditional",
            CandidateKind::HardcodedPath => "hardcoded_path",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pattern match awaiting judgment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternCandidate {
    /// Source file path as given to the scanner
    pub file_path: String,

    /// Line number (1-indexed)
    pub line: usize,

    /// Raw source line the match starts on
    pub line_content: String,

    pub kind: CandidateKind,

    /// Short human-readable note on why this was collected
    pub rationale: String,
}

/// Which pass produced a file's candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPass {
    Structural,
    LineFallback,
}

/// Candidates collected from a single source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileScan {
    pub pass: ScanPass,
    pub candidates: Vec<PatternCandidate>,
}

impl FileScan {
    /// Count candidates of one kind
    #[must_use]
    pub fn count(&self, kind: CandidateKind) -> usize {
        self.candidates.iter().filter(|c| c.kind == kind).count()
    }
}
