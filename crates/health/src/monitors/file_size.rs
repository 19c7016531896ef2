use super::{resolve_root, FILE_SIZE_MONITOR, HOUR};
use crate::distribution::Distribution;
use crate::schedule::ScheduleConfig;
use crate::types::{
    CheckStats, CodebaseContext, CostCategory, CostEstimate, DiscoveredIssue, HealthMonitor,
    MonitorResult,
};
use crate::walk::{SourceWalker, WalkConfig};
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Standard deviations above the mean before a file is reported
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.5;

/// Largest outliers reported per check
const MAX_REPORTED_OUTLIERS: usize = 50;

/// Flags files whose line count is a statistical outlier for this codebase
pub struct FileSizeMonitor {
    root: PathBuf,
    outlier_threshold: f64,
    walk: WalkConfig,
    schedule: ScheduleConfig,
}

impl FileSizeMonitor {
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: resolve_root(root)?,
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD,
            walk: WalkConfig::default(),
            schedule: Self::default_schedule(),
        })
    }

    pub fn default_schedule() -> ScheduleConfig {
        ScheduleConfig::TimeBased {
            interval: 24 * HOUR,
        }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_walk_config(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }

    fn describe(&self, path: &str, lines: usize, dist: &Distribution) -> DiscoveredIssue {
        let value = lines as f64;
        let z = dist.z_score(value).unwrap_or(0.0);
        DiscoveredIssue::new(
            path,
            "size",
            dist.outlier_severity(value, self.outlier_threshold),
            format!(
                "{path} has {lines} lines, {z:.1} standard deviations above the mean of {:.0}",
                dist.mean
            ),
        )
        .with_lines(1, lines)
        .with_evidence("lines", lines)
        .with_evidence("z_score", z)
        .with_evidence("mean", dist.mean)
        .with_evidence("median", dist.median)
        .with_evidence("std_dev", dist.std_dev)
        .with_evidence("p95", dist.p95)
        .with_evidence("p99", dist.p99)
    }
}

impl HealthMonitor for FileSizeMonitor {
    fn name(&self) -> &str {
        FILE_SIZE_MONITOR
    }

    fn philosophy(&self) -> &str {
        "Files should be focused on a single responsibility. \
         Oversized files often indicate missing abstractions or unclear boundaries."
    }

    fn schedule(&self) -> ScheduleConfig {
        self.schedule.clone()
    }

    fn cost(&self) -> CostEstimate {
        CostEstimate {
            estimated_duration: Duration::from_secs(5),
            ai_calls_estimated: 0,
            requires_full_scan: true,
            category: CostCategory::Moderate,
        }
    }

    fn check(&self, cancel: &CancellationToken, _codebase: &CodebaseContext) -> Result<MonitorResult> {
        let started = Instant::now();
        let checked_at = Utc::now();

        let outcome = SourceWalker::new(&self.root, self.walk.clone())?.read_sources(cancel)?;
        let sizes: Vec<(&str, usize)> = outcome
            .files
            .iter()
            .map(|file| (file.relative_path.as_str(), file.content.lines().count()))
            .collect();

        let mut stats = CheckStats {
            files_scanned: sizes.len(),
            errors_ignored: outcome.skipped.len(),
            ..CheckStats::default()
        };
        if sizes.is_empty() {
            stats.duration = started.elapsed();
            return Ok(MonitorResult::empty(
                checked_at,
                "No files found matching criteria",
                stats,
            ));
        }

        let counts: Vec<usize> = sizes.iter().map(|(_, lines)| *lines).collect();
        let dist = Distribution::from_counts(&counts);

        let mut outliers: Vec<(&str, usize)> = sizes
            .iter()
            .copied()
            .filter(|(_, lines)| dist.is_upper_outlier(*lines as f64, self.outlier_threshold))
            .collect();
        outliers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let context = format!(
            "Scanned {} files. Mean: {:.0} lines, Median: {:.0}, P95: {:.0}, P99: {:.0}. \
             Found {} outliers (>{:.1}σ)",
            dist.count,
            dist.mean,
            dist.median,
            dist.p95,
            dist.p99,
            outliers.len(),
            self.outlier_threshold
        );

        let issues: Vec<DiscoveredIssue> = outliers
            .iter()
            .take(MAX_REPORTED_OUTLIERS)
            .map(|(path, lines)| self.describe(path, *lines, &dist))
            .collect();
        log::info!(
            "{FILE_SIZE_MONITOR}: {} files, {} outliers",
            sizes.len(),
            outliers.len()
        );

        stats.issues_found = issues.len();
        stats.duration = started.elapsed();
        Ok(MonitorResult {
            reasoning: if issues.is_empty() {
                String::new()
            } else {
                "These files are far larger than is typical for this codebase; \
                 each is a candidate for splitting, pending review."
                    .to_string()
            },
            issues_found: issues,
            context,
            checked_at,
            stats,
        })
    }
}
