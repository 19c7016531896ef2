//! Line-oriented approximation of the structural pass, used when a file
//! does not parse or has no grammar.

use crate::language::Language;
use crate::types::{CandidateKind, PatternCandidate};
use once_cell::sync::Lazy;
use regex::Regex;

static MAGIC_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.\])]\s*(?:[<>]=?|[!=]==?)\s*-?\d{2,}").expect("valid magic number regex")
});
static REGEX_COMPILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"regexp\.(?:MustCompile|Compile)\b|\bRegex(?:Builder|Set)?::new\b|\bre\.compile\b|\bnew\s+RegExp\b")
        .expect("valid regex compile regex")
});
static STRING_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"strings\.(?:Contains|HasPrefix|HasSuffix|EqualFold)\b|\.(?:starts_with|ends_with|contains|eq_ignore_ascii_case|startswith|endswith|startsWith|endsWith|includes)\s*\(",
    )
    .expect("valid string match regex")
});
static CONDITIONAL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\}\s*)?(?:else\s+)?(?:if|elif)\b").expect("valid conditional regex"));
static LOGICAL_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&&|\|\||\band\b|\bor\b").expect("valid logical operator regex"));
static HARDCODED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[/\\][a-zA-Z0-9_/\\.-]+""#).expect("valid path regex"));

/// Scan `content` line by line, skipping comment-only lines
pub fn scan_lines(language: Language, content: &str, file_path: &str) -> Vec<PatternCandidate> {
    let mut candidates = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || language.is_comment_line(trimmed) {
            continue;
        }

        let mut push = |kind: CandidateKind, rationale: String| {
            candidates.push(PatternCandidate {
                file_path: file_path.to_string(),
                line: idx + 1,
                line_content: line.to_string(),
                kind,
                rationale,
            });
        };

        if MAGIC_NUMBER.is_match(line) {
            push(
                CandidateKind::MagicNumber,
                "Comparison with hardcoded threshold".to_string(),
            );
        }
        if REGEX_COMPILE.is_match(line) {
            push(
                CandidateKind::RegexParsing,
                "Regex pattern compilation".to_string(),
            );
        }
        if STRING_MATCH.is_match(line) {
            push(
                CandidateKind::StringMatching,
                "String matching function".to_string(),
            );
        }
        if CONDITIONAL_START.is_match(trimmed) {
            let combinators = LOGICAL_OPERATOR.find_iter(trimmed).count();
            if combinators >= 2 {
                push(
                    CandidateKind::ComplexConditional,
                    format!("Complex conditional with {combinators} boolean operators"),
                );
            }
        }
        if HARDCODED_PATH.is_match(line) {
            push(
                CandidateKind::HardcodedPath,
                "Hardcoded file path".to_string(),
            );
        }
    }

    candidates
}
