//! Built-in monitors.
//!
//! Each one collects facts and reports candidates; none of them decides
//! whether a finding is worth acting on.

mod duplication;
mod file_size;
mod zfc;

pub use duplication::DuplicationMonitor;
pub use file_size::{FileSizeMonitor, DEFAULT_OUTLIER_THRESHOLD};
pub use zfc::{ZfcMonitor, DEFAULT_MINIMUM_CANDIDATES};

use crate::config::HealthConfig;
use crate::schedule::ScheduleConfig;
use crate::types::HealthMonitor;
use crate::{HealthError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const FILE_SIZE_MONITOR: &str = "file_size_monitor";
pub const DUPLICATION_MONITOR: &str = "duplication_detector";
pub const ZFC_MONITOR: &str = "zfc_detector";

const HOUR: Duration = Duration::from_secs(3_600);
const DAY: Duration = Duration::from_secs(86_400);

/// Default schedules of the built-in monitors, by name
pub fn builtin_schedules() -> Vec<(&'static str, ScheduleConfig)> {
    vec![
        (FILE_SIZE_MONITOR, FileSizeMonitor::default_schedule()),
        (DUPLICATION_MONITOR, DuplicationMonitor::default_schedule()),
        (ZFC_MONITOR, ZfcMonitor::default_schedule()),
    ]
}

/// Build the enabled built-in monitors for `root`, applying configured
/// schedule overrides
pub fn builtin_monitors(root: &Path, config: &HealthConfig) -> Result<Vec<Arc<dyn HealthMonitor>>> {
    let root = resolve_root(root)?;
    let mut monitors: Vec<Arc<dyn HealthMonitor>> = Vec::new();

    if config.is_monitor_enabled(FILE_SIZE_MONITOR) {
        let mut monitor = FileSizeMonitor::new(&root)?;
        if let Some(schedule) = config.schedule_override(FILE_SIZE_MONITOR)? {
            monitor = monitor.with_schedule(schedule);
        }
        monitors.push(Arc::new(monitor));
    }
    if config.is_monitor_enabled(DUPLICATION_MONITOR) {
        let mut monitor = DuplicationMonitor::new(&root)?;
        if let Some(schedule) = config.schedule_override(DUPLICATION_MONITOR)? {
            monitor = monitor.with_schedule(schedule);
        }
        monitors.push(Arc::new(monitor));
    }
    if config.is_monitor_enabled(ZFC_MONITOR) {
        let mut monitor = ZfcMonitor::new(&root)?;
        if let Some(schedule) = config.schedule_override(ZFC_MONITOR)? {
            monitor = monitor.with_schedule(schedule);
        }
        monitors.push(Arc::new(monitor));
    }

    log::debug!("Built {} monitors for {}", monitors.len(), root.display());
    Ok(monitors)
}

/// Absolute, existing directory
pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf> {
    let resolved = root
        .canonicalize()
        .map_err(|err| HealthError::InvalidPath(format!("{}: {err}", root.display())))?;
    if !resolved.is_dir() {
        return Err(HealthError::InvalidPath(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }
    Ok(resolved)
}
