use crate::ast_scanner::AstScanner;
use crate::error::Result;
use crate::fallback;
use crate::language::Language;
use crate::types::{FileScan, PatternCandidate, ScanPass};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

/// Two-tier scanner: syntax tree first, line patterns when that fails.
///
/// Parsers are created lazily and reused per language, so one scanner
/// should be kept for a whole tree walk.
#[derive(Default)]
pub struct PatternScanner {
    parsers: HashMap<Language, AstScanner>,
}

impl PatternScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan in-memory source. The language is taken from `file_path`.
    pub fn scan_source(&mut self, content: &str, file_path: &str) -> FileScan {
        let language = Language::from_path(file_path);

        if language.supports_ast() {
            match self.structural(language, content, file_path) {
                Ok(candidates) => {
                    return FileScan {
                        pass: ScanPass::Structural,
                        candidates,
                    }
                }
                Err(err) => {
                    log::debug!("Structural scan failed for {file_path}, using line patterns: {err}");
                }
            }
        }

        FileScan {
            pass: ScanPass::LineFallback,
            candidates: fallback::scan_lines(language, content, file_path),
        }
    }

    /// Read and scan a file. `display_path` is recorded on each candidate.
    pub fn scan_file(&mut self, path: &Path, display_path: &str) -> Result<FileScan> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.scan_source(&content, display_path))
    }

    fn structural(
        &mut self,
        language: Language,
        content: &str,
        file_path: &str,
    ) -> Result<Vec<PatternCandidate>> {
        let scanner = match self.parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(AstScanner::new(language)?),
        };
        scanner.scan(content, file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CandidateKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parsable_rust_uses_structural_pass() {
        let mut scanner = PatternScanner::new();
        let scan = scanner.scan_source("fn f(n: u32) -> bool { n == 42 }\n", "src/lib.rs");
        assert_eq!(scan.pass, ScanPass::Structural);
        assert_eq!(scan.count(CandidateKind::MagicNumber), 1);
    }

    #[test]
    fn broken_rust_falls_back_to_lines() {
        let mut scanner = PatternScanner::new();
        let scan = scanner.scan_source("fn f( {\n    if n > 42 && a || b {\n", "src/lib.rs");
        assert_eq!(scan.pass, ScanPass::LineFallback);
        assert_eq!(scan.count(CandidateKind::MagicNumber), 1);
        assert_eq!(scan.count(CandidateKind::ComplexConditional), 1);
    }

    #[test]
    fn go_single_digit_comparison_is_structural() {
        let mut scanner = PatternScanner::new();
        let scan = scanner.scan_source(
            "package p\n\nfunc f(n int) bool {\n\treturn n > 5\n}\n",
            "p.go",
        );
        assert_eq!(scan.pass, ScanPass::Structural);
        assert_eq!(scan.count(CandidateKind::MagicNumber), 1);
        assert_eq!(scan.candidates[0].line, 4);
    }

    #[test]
    fn statement_outside_function_falls_back_for_go() {
        let mut scanner = PatternScanner::new();
        let scan = scanner.scan_source("if count > 50 {\n}\n", "main.go");
        assert_eq!(scan.pass, ScanPass::LineFallback);
        assert_eq!(scan.candidates[0].file_path, "main.go");
    }

    #[test]
    fn tsx_with_jsx_uses_structural_pass() {
        let mut scanner = PatternScanner::new();
        let code = "export function A(p: { n: number }) {\n  if (p.n > 50) {\n    return <div />;\n  }\n  return null;\n}\n";
        let scan = scanner.scan_source(code, "a.tsx");
        assert_eq!(scan.pass, ScanPass::Structural);
        assert_eq!(scan.count(CandidateKind::MagicNumber), 1);
    }

    #[test]
    fn scan_file_reads_from_disk() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("rules.py");
        fs::write(&path, "def f(x):\n    return x > 99\n").unwrap();

        let mut scanner = PatternScanner::new();
        let scan = scanner.scan_file(&path, "rules.py").unwrap();
        assert_eq!(scan.pass, ScanPass::Structural);
        assert_eq!(scan.candidates[0].line, 2);
    }
}
