use crate::distribution::Distribution;
use crate::schedule::ScheduleConfig;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A code health check.
///
/// Monitors collect facts and return candidate issues; they keep no state
/// between calls. Run history lives in the [`crate::MonitorRegistry`].
pub trait HealthMonitor: Send + Sync {
    /// Unique identifier, used as the registry key
    fn name(&self) -> &str;

    /// The principle this monitor checks for, in plain words
    fn philosophy(&self) -> &str;

    /// When this monitor should run
    fn schedule(&self) -> ScheduleConfig;

    /// Expected resource usage of one check
    fn cost(&self) -> CostEstimate;

    /// Examine the codebase.
    ///
    /// Long walks must poll `cancel` and return [`crate::HealthError::Cancelled`]
    /// once it fires.
    fn check(&self, cancel: &CancellationToken, codebase: &CodebaseContext)
        -> Result<MonitorResult>;
}

/// Shared facts about the codebase handed to every check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodebaseContext {
    pub root_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_distribution: Option<Distribution>,
    /// File count per language
    #[serde(default)]
    pub language_breakdown: BTreeMap<String, usize>,
    pub total_files: usize,
    pub total_lines: usize,
}

impl CodebaseContext {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }
}

/// Output of one [`HealthMonitor::check`] call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorResult {
    pub issues_found: Vec<DiscoveredIssue>,

    /// What was examined and which patterns were seen
    pub context: String,

    /// Why the issues are potential problems
    pub reasoning: String,

    pub checked_at: DateTime<Utc>,

    pub stats: CheckStats,
}

impl MonitorResult {
    /// A result with no issues
    pub fn empty(checked_at: DateTime<Utc>, context: impl Into<String>, stats: CheckStats) -> Self {
        Self {
            issues_found: Vec::new(),
            context: context.into(),
            reasoning: String::new(),
            checked_at,
            stats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A potential code health problem, produced only by monitors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredIssue {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,

    /// e.g. "size", "duplication", "zfc"
    pub category: String,
    pub severity: Severity,
    pub description: String,

    /// Facts for the downstream review step
    #[serde(default)]
    pub evidence: BTreeMap<String, serde_json::Value>,
}

impl DiscoveredIssue {
    pub fn new(
        file_path: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line_start: None,
            line_end: None,
            category: category.into(),
            severity,
            description: description.into(),
            evidence: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.line_start = Some(start);
        self.line_end = Some(end);
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.evidence.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    /// Under a second, no AI
    Cheap,
    /// 1-10 seconds, minimal AI
    Moderate,
    /// Over 10 seconds or heavy AI usage
    Expensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    #[serde(rename = "estimated_duration_ms", with = "duration_ms")]
    pub estimated_duration: Duration,
    pub ai_calls_estimated: u32,
    pub requires_full_scan: bool,
    pub category: CostCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStats {
    pub files_scanned: usize,
    pub issues_found: usize,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub ai_calls_made: u32,
    /// Files skipped after a recoverable read error
    pub errors_ignored: usize,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
