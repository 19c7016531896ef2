use crate::{HealthError, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Paths every monitor skips unless configured otherwise
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "vendor/",
    ".git/",
    "_test.go",
    ".pb.go",
    ".gen.go",
    "testdata/",
];

/// Source extensions scanned by default
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".go", ".rs", ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".c", ".h", ".cpp", ".hpp",
    ".cs", ".rb", ".swift", ".kt",
];

#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Suffixes such as ".rs"; empty accepts every file
    pub extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            respect_gitignore: true,
        }
    }
}

impl WalkConfig {
    #[must_use]
    pub fn with_extra_excludes(mut self, patterns: &[&str]) -> Self {
        self.exclude_patterns
            .extend(patterns.iter().map(|s| s.to_string()));
        self
    }
}

/// A readable source file
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Slash-separated path relative to the walk root
    pub relative_path: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub relative_path: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<SourceText>,
    /// Files that matched but could not be read
    pub skipped: Vec<SkippedFile>,
}

impl WalkOutcome {
    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|file| file.content.lines().count()).sum()
    }
}

/// True when `relative_path` starts with, ends with, or contains
/// `"/" + pattern` for any pattern.
pub fn should_exclude_path(relative_path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        relative_path.starts_with(pattern.as_str())
            || relative_path.contains(&format!("/{pattern}"))
            || relative_path.ends_with(pattern.as_str())
    })
}

/// Cancellable walk over the source files under a root
pub struct SourceWalker {
    root: PathBuf,
    config: WalkConfig,
}

impl SourceWalker {
    pub fn new(root: impl AsRef<Path>, config: WalkConfig) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HealthError::InvalidPath(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every matching file in sorted order.
    ///
    /// `cancel` is checked before each entry. Walk errors abort; unreadable
    /// files are recorded in [`WalkOutcome::skipped`].
    pub fn read_sources(&self, cancel: &CancellationToken) -> Result<WalkOutcome> {
        let mut outcome = WalkOutcome::default();

        let root = self.root.clone();
        let excludes = self.config.exclude_patterns.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            match relative_to(&root, entry.path()) {
                // directories are matched as "name/" so "vendor/" prunes the tree
                Some(rel) if is_dir => !should_exclude_path(&format!("{rel}/"), &excludes),
                Some(rel) => !should_exclude_path(&rel, &excludes),
                None => true,
            }
        });

        for result in builder.build() {
            if cancel.is_cancelled() {
                log::debug!("Walk of {} cancelled", self.root.display());
                return Err(HealthError::Cancelled);
            }

            let entry = result.map_err(|err| HealthError::Walk {
                path: self.root.clone(),
                message: err.to_string(),
            })?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(relative_path) = relative_to(&self.root, entry.path()) else {
                continue;
            };
            if !self.matches_extension(&relative_path) {
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(content) => outcome.files.push(SourceText {
                    relative_path,
                    content,
                }),
                Err(err) => {
                    log::debug!("Skipping unreadable file {relative_path}: {err}");
                    outcome.skipped.push(SkippedFile {
                        relative_path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Read {} source files under {} ({} skipped)",
            outcome.files.len(),
            self.root.display(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    fn matches_extension(&self, relative_path: &str) -> bool {
        self.config.extensions.is_empty()
            || self
                .config
                .extensions
                .iter()
                .any(|ext| relative_path.ends_with(ext.as_str()))
    }
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_string_lossy().replace('\\', "/"))
}
