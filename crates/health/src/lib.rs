//! # Codehealth Monitor
//!
//! Scheduled code health checks with durable run history.
//!
//! ## Flow
//!
//! ```text
//! MonitorRegistry
//!     │
//!     ├──> scheduled_monitors(now)   time elapsed + event counters
//!     │      └─> due monitors
//!     │
//!     ├──> HealthMonitor::check      walk, statistics, hashing, pattern scan
//!     │      └─> MonitorResult (candidate issues only)
//!     │
//!     └──> record_run                state.json, written atomically
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use chrono::Utc;
//! use codehealth_monitor::{builtin_monitors, CodebaseContext, HealthConfig, MonitorRegistry};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! fn main() -> codehealth_monitor::Result<()> {
//!     let root = Path::new(".");
//!     let registry = MonitorRegistry::open(root.join(".codehealth/health_state.json"))?;
//!     for monitor in builtin_monitors(root, &HealthConfig::default())? {
//!         registry.register(monitor)?;
//!     }
//!
//!     let cancel = CancellationToken::new();
//!     for monitor in registry.scheduled_monitors(Utc::now()) {
//!         let result = monitor.check(&cancel, &CodebaseContext::new(root))?;
//!         registry.record_run(monitor.name(), &result, Vec::new())?;
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod distribution;
mod duplication;
mod error;
pub mod monitors;
mod registry;
mod schedule;
mod state;
mod survey;
mod types;
mod walk;

pub use config::{HealthConfig, MonitorConfig, ScheduleSpec};
pub use distribution::Distribution;
pub use duplication::{
    duplication_percentage, BlockLocation, DuplicateBlock, DuplicateDetector, SourceFile,
    DEFAULT_WINDOW_SIZE,
};
pub use error::{HealthError, Result};
pub use monitors::builtin_monitors;
pub use registry::{EventRecorder, MonitorRegistry};
pub use schedule::{format_duration, parse_duration, EventTrigger, ScheduleConfig};
pub use state::{load_state, save_state, MonitorRunState, MonitorState};
pub use survey::survey_codebase;
pub use types::{
    CheckStats, CodebaseContext, CostCategory, CostEstimate, DiscoveredIssue, HealthMonitor,
    MonitorResult, Severity,
};
pub use walk::{
    should_exclude_path, SkippedFile, SourceText, SourceWalker, WalkConfig, WalkOutcome,
    DEFAULT_EXCLUDE_PATTERNS, DEFAULT_EXTENSIONS,
};
