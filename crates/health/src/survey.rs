use crate::distribution::Distribution;
use crate::types::CodebaseContext;
use crate::walk::{SourceWalker, WalkConfig};
use crate::Result;
use codehealth_pattern_scan::Language;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Collect the shared codebase facts handed to every check.
///
/// Complexity and duplication are left unset; they are owned by the
/// monitors that measure them.
pub fn survey_codebase(
    root: &Path,
    walk: WalkConfig,
    cancel: &CancellationToken,
) -> Result<CodebaseContext> {
    let outcome = SourceWalker::new(root, walk)?.read_sources(cancel)?;
    let mut context = CodebaseContext::new(root);

    let mut line_counts = Vec::with_capacity(outcome.files.len());
    for file in &outcome.files {
        let lines = file.content.lines().count();
        line_counts.push(lines);
        *context
            .language_breakdown
            .entry(Language::from_path(&file.relative_path).as_str().to_string())
            .or_default() += 1;
    }

    context.total_files = outcome.files.len();
    context.total_lines = line_counts.iter().sum();
    if !line_counts.is_empty() {
        context.file_size_distribution = Some(Distribution::from_counts(&line_counts));
    }
    Ok(context)
}
