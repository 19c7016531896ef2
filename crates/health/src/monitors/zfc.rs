use super::{resolve_root, DAY, ZFC_MONITOR};
use crate::schedule::ScheduleConfig;
use crate::types::{
    CheckStats, CodebaseContext, CostCategory, CostEstimate, DiscoveredIssue, HealthMonitor,
    MonitorResult, Severity,
};
use crate::walk::{SourceWalker, WalkConfig};
use crate::{HealthError, Result};
use chrono::Utc;
use codehealth_pattern_scan::{PatternCandidate, PatternScanner, ScanPass};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Fewer candidates than this and the check reports nothing
pub const DEFAULT_MINIMUM_CANDIDATES: usize = 3;

/// Candidates reported per check
const MAX_REPORTED_CANDIDATES: usize = 30;

const EXTRA_EXCLUDES: &[&str] = &["node_modules/", ".beads/", "migrations/"];

/// Collects code that hard-codes a judgment call: thresholds, regex parsing,
/// keyword matching, and compound conditionals
pub struct ZfcMonitor {
    root: PathBuf,
    minimum_candidates: usize,
    walk: WalkConfig,
    schedule: ScheduleConfig,
}

impl ZfcMonitor {
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: resolve_root(root)?,
            minimum_candidates: DEFAULT_MINIMUM_CANDIDATES,
            walk: WalkConfig::default().with_extra_excludes(EXTRA_EXCLUDES),
            schedule: Self::default_schedule(),
        })
    }

    pub fn default_schedule() -> ScheduleConfig {
        ScheduleConfig::TimeBased { interval: 7 * DAY }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_minimum_candidates(mut self, minimum: usize) -> Self {
        self.minimum_candidates = minimum;
        self
    }
}

fn describe(candidate: &PatternCandidate, pass: ScanPass) -> DiscoveredIssue {
    DiscoveredIssue::new(
        candidate.file_path.as_str(),
        "zfc",
        Severity::Low,
        format!("{}: {}", candidate.kind, candidate.rationale),
    )
    .with_lines(candidate.line, candidate.line)
    .with_evidence("kind", candidate.kind.as_str())
    .with_evidence("line_content", candidate.line_content.trim())
    .with_evidence(
        "scan_pass",
        match pass {
            ScanPass::Structural => "structural",
            ScanPass::LineFallback => "line_fallback",
        },
    )
}

impl HealthMonitor for ZfcMonitor {
    fn name(&self) -> &str {
        ZFC_MONITOR
    }

    fn philosophy(&self) -> &str {
        "Decisions belong to judgment, not to hard-coded thresholds, regex patterns, \
         keyword lists or brittle conditional logic."
    }

    fn schedule(&self) -> ScheduleConfig {
        self.schedule.clone()
    }

    fn cost(&self) -> CostEstimate {
        CostEstimate {
            estimated_duration: Duration::from_secs(10),
            ai_calls_estimated: 0,
            requires_full_scan: true,
            category: CostCategory::Moderate,
        }
    }

    fn check(&self, cancel: &CancellationToken, _codebase: &CodebaseContext) -> Result<MonitorResult> {
        let started = Instant::now();
        let checked_at = Utc::now();

        let outcome = SourceWalker::new(&self.root, self.walk.clone())?.read_sources(cancel)?;
        let mut scanner = PatternScanner::new();
        let mut found: Vec<(PatternCandidate, ScanPass)> = Vec::new();
        for file in &outcome.files {
            if cancel.is_cancelled() {
                return Err(HealthError::Cancelled);
            }
            let scan = scanner.scan_source(&file.content, &file.relative_path);
            let pass = scan.pass;
            found.extend(scan.candidates.into_iter().map(|c| (c, pass)));
        }

        let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (candidate, _) in &found {
            *by_kind.entry(candidate.kind.as_str()).or_default() += 1;
        }
        log::info!(
            "{ZFC_MONITOR}: {} candidates in {} files",
            found.len(),
            outcome.files.len()
        );

        let mut stats = CheckStats {
            files_scanned: outcome.files.len(),
            errors_ignored: outcome.skipped.len(),
            ..CheckStats::default()
        };
        if found.len() < self.minimum_candidates {
            stats.duration = started.elapsed();
            return Ok(MonitorResult::empty(
                checked_at,
                format!(
                    "Found {} candidate patterns (below threshold of {})",
                    found.len(),
                    self.minimum_candidates
                ),
                stats,
            ));
        }

        let breakdown = by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let issues: Vec<DiscoveredIssue> = found
            .iter()
            .take(MAX_REPORTED_CANDIDATES)
            .map(|(candidate, pass)| describe(candidate, *pass))
            .collect();

        stats.issues_found = issues.len();
        stats.duration = started.elapsed();
        Ok(MonitorResult {
            issues_found: issues,
            context: format!(
                "Scanned {} files. Found {} candidate patterns ({breakdown}).",
                outcome.files.len(),
                found.len()
            ),
            reasoning: format!(
                "Each of these encodes a decision in code ({} of {} shown); \
                 many are legitimate and need review before filing.",
                stats.issues_found,
                found.len()
            ),
            checked_at,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codehealth_pattern_scan::CandidateKind;
    use std::fs;
    use tempfile::tempdir;

    fn count_kind(result: &MonitorResult, kind: CandidateKind) -> usize {
        result
            .issues_found
            .iter()
            .filter(|issue| issue.evidence.get("kind").and_then(|v| v.as_str()) == Some(kind.as_str()))
            .count()
    }

    const JUDGMENTAL: &str = r#"
fn triage(score: u32, title: &str, urgent: bool, blocked: bool, stale: bool) -> bool {
    if urgent && blocked || stale {
        return true;
    }
    if title.starts_with("WIP") {
        return false;
    }
    score > 75
}
"#;

    #[test]
    fn reports_candidates_above_minimum() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("triage.rs"), JUDGMENTAL).unwrap();

        let result = ZfcMonitor::new(temp.path())
            .unwrap()
            .check(&CancellationToken::new(), &CodebaseContext::default())
            .unwrap();

        assert_eq!(result.stats.files_scanned, 1);
        assert_eq!(result.issues_found.len(), 3);
        assert_eq!(count_kind(&result, CandidateKind::MagicNumber), 1);
        assert_eq!(count_kind(&result, CandidateKind::StringMatching), 1);
        assert_eq!(count_kind(&result, CandidateKind::ComplexConditional), 1);
        assert!(result.issues_found.iter().all(|i| i.category == "zfc"));
    }

    #[test]
    fn below_minimum_reports_nothing() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("one.rs"), "fn f(n: u32) -> bool { n > 10 }\n").unwrap();

        let result = ZfcMonitor::new(temp.path())
            .unwrap()
            .check(&CancellationToken::new(), &CodebaseContext::default())
            .unwrap();
        assert!(result.issues_found.is_empty());
        assert!(result.context.contains("below threshold of 3"));
    }

    #[test]
    fn migrations_are_excluded() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("migrations")).unwrap();
        fs::write(temp.path().join("migrations/001.rs"), JUDGMENTAL).unwrap();

        let result = ZfcMonitor::new(temp.path())
            .unwrap()
            .check(&CancellationToken::new(), &CodebaseContext::default())
            .unwrap();
        assert_eq!(result.stats.files_scanned, 0);
        assert!(result.issues_found.is_empty());
    }
}
