use codehealth_pattern_scan::Language;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;

pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Hex digest length: first 8 bytes of the SHA-256
const DIGEST_BYTES: usize = 8;

/// A scanned file with its raw lines
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the scan root
    pub path: String,
    pub lines: Vec<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: &str) -> Self {
        Self {
            path: path.into(),
            lines: content.lines().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockLocation {
    pub file: String,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
}

/// A window that normalizes to the same content at two or more locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateBlock {
    pub hash: String,
    /// Raw lines of the first occurrence
    pub lines: Vec<String>,
    pub locations: Vec<BlockLocation>,
}

/// Sliding-window duplicate detection over normalized lines
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    window_size: usize,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl DuplicateDetector {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Blocks seen at two or more locations, most repeated first.
    /// Locations are sorted; ties between blocks sort by first location.
    pub fn find_duplicate_blocks(&self, files: &[SourceFile]) -> Vec<DuplicateBlock> {
        let mut by_hash: HashMap<String, DuplicateBlock> = HashMap::new();

        for file in files {
            let prefixes = Language::from_path(&file.path).comment_prefixes();
            for (start, window) in file.lines.windows(self.window_size).enumerate() {
                let normalized = normalize_window(window, prefixes);
                if normalized.is_empty() {
                    continue;
                }

                let location = BlockLocation {
                    file: file.path.clone(),
                    start_line: start + 1,
                    end_line: start + self.window_size,
                };
                let hash = hash_lines(&normalized);
                by_hash
                    .entry(hash.clone())
                    .or_insert_with(|| DuplicateBlock {
                        hash,
                        lines: window.to_vec(),
                        locations: Vec::new(),
                    })
                    .locations
                    .push(location);
            }
        }

        let mut duplicates: Vec<DuplicateBlock> = by_hash
            .into_values()
            .filter(|block| block.locations.len() >= 2)
            .map(|mut block| {
                block.locations.sort();
                block
            })
            .collect();
        duplicates.sort_by(|a, b| {
            b.locations
                .len()
                .cmp(&a.locations.len())
                .then_with(|| a.locations[0].cmp(&b.locations[0]))
        });
        duplicates
    }
}

/// Rough duplication density: every occurrence of every block counts its
/// full window, overlaps included.
pub fn duplication_percentage(blocks: &[DuplicateBlock], total_lines: usize) -> f64 {
    if total_lines == 0 {
        return 0.0;
    }
    let duplicate_lines: usize = blocks
        .iter()
        .map(|block| block.lines.len() * block.locations.len())
        .sum();
    duplicate_lines as f64 / total_lines as f64 * 100.0
}

fn normalize_window<'a>(window: &'a [String], comment_prefixes: &[&str]) -> Vec<&'a str> {
    window
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !comment_prefixes.iter().any(|prefix| line.starts_with(prefix)))
        .collect()
}

fn hash_lines(lines: &[&str]) -> String {
    let digest = Sha256::digest(lines.join("\n").as_bytes());
    let mut hex = String::with_capacity(DIGEST_BYTES * 2);
    for byte in &digest[..DIGEST_BYTES] {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(tag: &str, indent: &str) -> String {
        (0..10)
            .map(|i| format!("{indent}let {tag}_{i} = compute({i});"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn finds_block_shared_by_two_files() {
        let files = vec![
            SourceFile::new("a.rs", &body("x", "")),
            SourceFile::new("b.rs", &body("x", "        ")),
        ];
        let blocks = DuplicateDetector::default().find_duplicate_blocks(&files);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].hash.len(), 16);
        assert_eq!(
            blocks[0].locations,
            vec![
                BlockLocation {
                    file: "a.rs".into(),
                    start_line: 1,
                    end_line: 10
                },
                BlockLocation {
                    file: "b.rs".into(),
                    start_line: 1,
                    end_line: 10
                },
            ]
        );
        assert_eq!(blocks[0].lines.len(), 10);
        assert_eq!(duplication_percentage(&blocks, 20), 100.0);
    }

    fn with_inserted(base: &str, inserts: &[(usize, &str)]) -> String {
        let mut lines: Vec<String> = base.lines().map(str::to_string).collect();
        for (at, line) in inserts {
            lines.insert(*at, line.to_string());
        }
        lines.join("\n")
    }

    #[test]
    fn comments_and_blank_lines_do_not_break_a_match() {
        let base = body("y", "");
        let files = vec![
            SourceFile::new("plain.rs", &with_inserted(&base, &[(2, ""), (8, "// other")])),
            SourceFile::new(
                "commented.rs",
                &with_inserted(&base, &[(3, "    // explain the next step"), (6, "/* and this */")]),
            ),
        ];
        let blocks = DuplicateDetector::new(12).find_duplicate_blocks(&files);

        assert_eq!(blocks.len(), 1);
        let files: Vec<&str> = blocks[0].locations.iter().map(|l| l.file.as_str()).collect();
        assert_eq!(files, vec!["commented.rs", "plain.rs"]);
    }

    #[test]
    fn comment_prefixes_follow_the_language() {
        let base: String = (0..10).map(|i| format!("x{i} = f({i})\n")).collect();
        let spaced = with_inserted(&base, &[(4, "")]);
        let noted = with_inserted(&base, &[(4, "# note")]);

        let python = vec![SourceFile::new("a.py", &spaced), SourceFile::new("b.py", &noted)];
        assert_eq!(DuplicateDetector::new(11).find_duplicate_blocks(&python).len(), 1);

        let rust = vec![SourceFile::new("a.rs", &spaced), SourceFile::new("b.rs", &noted)];
        assert!(DuplicateDetector::new(11).find_duplicate_blocks(&rust).is_empty());
    }

    #[test]
    fn distinct_files_have_no_duplicates() {
        let files = vec![
            SourceFile::new("a.rs", &body("a", "")),
            SourceFile::new("b.rs", &body("b", "")),
        ];
        assert!(DuplicateDetector::default()
            .find_duplicate_blocks(&files)
            .is_empty());
    }

    #[test]
    fn short_files_contribute_nothing() {
        let short = "let a = 1;\nlet b = 2;\n";
        let files = vec![SourceFile::new("a.rs", short), SourceFile::new("b.rs", short)];
        assert!(DuplicateDetector::default()
            .find_duplicate_blocks(&files)
            .is_empty());
    }

    #[test]
    fn blank_windows_are_skipped() {
        let blank = "\n".repeat(12);
        let files = vec![SourceFile::new("a.rs", &blank), SourceFile::new("b.rs", &blank)];
        assert!(DuplicateDetector::default()
            .find_duplicate_blocks(&files)
            .is_empty());
    }

    #[test]
    fn result_does_not_depend_on_file_order() {
        let files = vec![
            SourceFile::new("a.rs", &body("x", "")),
            SourceFile::new("b.rs", &body("x", "")),
            SourceFile::new("c.rs", &format!("{}\n{}", body("z", ""), body("z", ""))),
        ];
        let mut reversed = files.clone();
        reversed.reverse();

        let detector = DuplicateDetector::default();
        let forward = detector.find_duplicate_blocks(&files);
        let backward = detector.find_duplicate_blocks(&reversed);

        let summarize = |blocks: &[DuplicateBlock]| {
            blocks
                .iter()
                .map(|b| {
                    let mut locations = b.locations.clone();
                    locations.sort();
                    (b.hash.clone(), locations)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(summarize(&forward), summarize(&backward));
    }

    #[test]
    fn most_repeated_block_sorts_first() {
        let files = vec![
            SourceFile::new("a.rs", &body("pair", "")),
            SourceFile::new("b.rs", &body("pair", "")),
            SourceFile::new("c.rs", &body("triple", "")),
            SourceFile::new("d.rs", &body("triple", "")),
            SourceFile::new("e.rs", &body("triple", "")),
        ];
        let blocks = DuplicateDetector::default().find_duplicate_blocks(&files);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].locations.len(), 3);
        assert_eq!(blocks[1].locations.len(), 2);
        assert_eq!(duplication_percentage(&blocks, 50), 100.0);
    }

    #[test]
    fn percentage_of_empty_corpus_is_zero() {
        assert_eq!(duplication_percentage(&[], 0), 0.0);
    }
}
