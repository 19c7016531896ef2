//! # Codehealth Pattern Scan
//!
//! Collects places where source code may hard-code a judgment call:
//! numeric thresholds, regex parsing, text classification by prefix or
//! substring, and multi-term boolean conditions.
//!
//! Nothing here decides whether a match is a problem. Every match is a
//! candidate for a later review step.
//!
//! ## Architecture
//!
//! ```text
//! Source File
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → syntax tree
//!     │      └─> walk every node, match four shapes
//!     │
//!     └──> (parse failed / no grammar)
//!            └─> line-by-line regex approximation
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codehealth_pattern_scan::{CandidateKind, PatternScanner};
//!
//! let mut scanner = PatternScanner::new();
//! let scan = scanner.scan_source("fn big(n: usize) -> bool { n > 500 }\n", "size.rs");
//!
//! assert_eq!(scan.count(CandidateKind::MagicNumber), 1);
//! ```

mod ast_scanner;
mod error;
mod fallback;
mod language;
mod scanner;
mod types;

pub use ast_scanner::AstScanner;
pub use error::{PatternScanError, Result};
pub use fallback::scan_lines;
pub use language::Language;
pub use scanner::PatternScanner;
pub use types::{CandidateKind, FileScan, PatternCandidate, ScanPass};
