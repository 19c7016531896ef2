use super::{resolve_root, DAY, DUPLICATION_MONITOR};
use crate::duplication::{duplication_percentage, DuplicateBlock, DuplicateDetector, SourceFile};
use crate::schedule::{EventTrigger, ScheduleConfig};
use crate::types::{
    CheckStats, CodebaseContext, CostCategory, CostEstimate, DiscoveredIssue, HealthMonitor,
    MonitorResult, Severity,
};
use crate::walk::{SourceWalker, WalkConfig};
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Blocks reported per check, most repeated first
const MAX_REPORTED_BLOCKS: usize = 10;

/// Flags code blocks repeated across the codebase
pub struct DuplicationMonitor {
    root: PathBuf,
    detector: DuplicateDetector,
    walk: WalkConfig,
    schedule: ScheduleConfig,
}

impl DuplicationMonitor {
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: resolve_root(root)?,
            detector: DuplicateDetector::default(),
            walk: WalkConfig::default(),
            schedule: Self::default_schedule(),
        })
    }

    pub fn default_schedule() -> ScheduleConfig {
        ScheduleConfig::Hybrid {
            min_interval: DAY,
            max_interval: 7 * DAY,
            trigger: EventTrigger::IssuesClosed(20).to_string(),
        }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.detector = DuplicateDetector::new(window_size);
        self
    }

    #[must_use]
    pub fn with_walk_config(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }
}

fn block_severity(occurrences: usize) -> Severity {
    match occurrences {
        0..=2 => Severity::Low,
        3..=4 => Severity::Medium,
        _ => Severity::High,
    }
}

fn describe(block: &DuplicateBlock, percentage: f64) -> DiscoveredIssue {
    let first = &block.locations[0];
    let locations: Vec<String> = block
        .locations
        .iter()
        .map(|loc| format!("{}:{}-{}", loc.file, loc.start_line, loc.end_line))
        .collect();

    DiscoveredIssue::new(
        first.file.as_str(),
        "duplication",
        block_severity(block.locations.len()),
        format!(
            "{}-line block repeated {} times; candidate for a shared utility",
            block.lines.len(),
            block.locations.len()
        ),
    )
    .with_lines(first.start_line, first.end_line)
    .with_evidence("hash", block.hash.as_str())
    .with_evidence("occurrences", block.locations.len())
    .with_evidence("locations", locations)
    .with_evidence("lines", block.lines.clone())
    .with_evidence("duplication_percentage", percentage)
}

impl HealthMonitor for DuplicationMonitor {
    fn name(&self) -> &str {
        DUPLICATION_MONITOR
    }

    fn philosophy(&self) -> &str {
        "Code duplication is a missed abstraction. \
         Repeated blocks should live in one shared place."
    }

    fn schedule(&self) -> ScheduleConfig {
        self.schedule.clone()
    }

    fn cost(&self) -> CostEstimate {
        CostEstimate {
            estimated_duration: Duration::from_secs(30),
            ai_calls_estimated: 0,
            requires_full_scan: true,
            category: CostCategory::Expensive,
        }
    }

    fn check(&self, cancel: &CancellationToken, _codebase: &CodebaseContext) -> Result<MonitorResult> {
        let started = Instant::now();
        let checked_at = Utc::now();

        let outcome = SourceWalker::new(&self.root, self.walk.clone())?.read_sources(cancel)?;
        let total_lines = outcome.total_lines();
        let files: Vec<SourceFile> = outcome
            .files
            .iter()
            .map(|file| SourceFile::new(file.relative_path.as_str(), &file.content))
            .collect();

        let mut stats = CheckStats {
            files_scanned: files.len(),
            errors_ignored: outcome.skipped.len(),
            ..CheckStats::default()
        };
        if files.is_empty() {
            stats.duration = started.elapsed();
            return Ok(MonitorResult::empty(
                checked_at,
                "No files found matching criteria",
                stats,
            ));
        }

        let blocks = self.detector.find_duplicate_blocks(&files);
        let percentage = duplication_percentage(&blocks, total_lines);
        log::info!(
            "{DUPLICATION_MONITOR}: {} blocks, {percentage:.1}% duplication over {total_lines} lines",
            blocks.len()
        );

        if blocks.is_empty() {
            stats.duration = started.elapsed();
            return Ok(MonitorResult::empty(
                checked_at,
                format!(
                    "Scanned {} files ({total_lines} lines), no duplicates found",
                    files.len()
                ),
                stats,
            ));
        }

        let issues: Vec<DiscoveredIssue> = blocks
            .iter()
            .take(MAX_REPORTED_BLOCKS)
            .map(|block| describe(block, percentage))
            .collect();

        stats.issues_found = issues.len();
        stats.duration = started.elapsed();
        Ok(MonitorResult {
            issues_found: issues,
            context: format!(
                "Scanned {} files ({total_lines} lines). Found {} duplicate blocks. \
                 Overall duplication: {percentage:.1}%.",
                files.len(),
                blocks.len()
            ),
            reasoning: format!(
                "Reporting the {} most repeated of {} blocks; some duplication is \
                 acceptable and each block needs review before extraction.",
                stats.issues_found,
                blocks.len()
            ),
            checked_at,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn shared_block() -> String {
        (0..12)
            .map(|i| format!("    total += weights[{i}] * values[{i}];\n"))
            .collect()
    }

    #[test]
    fn reports_block_shared_between_files() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("a.go"),
            format!("func A() {{\n{}}}\n", shared_block()),
        )
        .unwrap();
        fs::write(
            temp.path().join("b.go"),
            format!("func B() {{\n// same math\n{}}}\n", shared_block()),
        )
        .unwrap();

        let result = DuplicationMonitor::new(temp.path())
            .unwrap()
            .check(&CancellationToken::new(), &CodebaseContext::default())
            .unwrap();

        assert_eq!(result.stats.files_scanned, 2);
        assert!(!result.issues_found.is_empty());
        assert!(result.issues_found.len() <= MAX_REPORTED_BLOCKS);
        let issue = &result.issues_found[0];
        assert_eq!(issue.category, "duplication");
        assert_eq!(issue.evidence["occurrences"], serde_json::json!(2));
        assert!(result.context.contains("Overall duplication"));
    }

    #[test]
    fn unique_files_report_nothing() {
        let temp = tempdir().unwrap();
        let unique = |tag: &str| -> String {
            (0..15).map(|i| format!("x_{tag}_{i} := {i}\n")).collect()
        };
        fs::write(temp.path().join("a.go"), unique("a")).unwrap();
        fs::write(temp.path().join("b.go"), unique("b")).unwrap();

        let result = DuplicationMonitor::new(temp.path())
            .unwrap()
            .check(&CancellationToken::new(), &CodebaseContext::default())
            .unwrap();
        assert!(result.issues_found.is_empty());
        assert!(result.context.contains("no duplicates found"));
    }

    #[test]
    fn severity_grows_with_repetition() {
        assert_eq!(block_severity(2), Severity::Low);
        assert_eq!(block_severity(3), Severity::Medium);
        assert_eq!(block_severity(9), Severity::High);
    }

    #[test]
    fn default_schedule_is_daily_hybrid_on_twenty_issues() {
        assert_eq!(
            DuplicationMonitor::default_schedule(),
            ScheduleConfig::Hybrid {
                min_interval: DAY,
                max_interval: 7 * DAY,
                trigger: "every_20_issues".into(),
            }
        );
    }
}
