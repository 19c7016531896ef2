use crate::state::{load_state, save_state, MonitorRunState, MonitorState};
use crate::types::{CodebaseContext, HealthMonitor, MonitorResult};
use crate::{HealthError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

/// Owns the registered monitors and their persisted run history.
///
/// Every public method takes the lock for the duration of the call and
/// never calls back into the registry while holding it. Monitor checks run
/// outside the lock.
pub struct MonitorRegistry {
    state_path: PathBuf,
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    monitors: BTreeMap<String, Arc<dyn HealthMonitor>>,
    state: MonitorState,
}

impl MonitorRegistry {
    /// Open a registry backed by `state_path`, creating its parent directory.
    ///
    /// A missing state file yields an empty state; any other read or parse
    /// failure is returned.
    pub fn open(state_path: impl Into<PathBuf>) -> Result<Self> {
        let state_path = state_path.into();
        if state_path.as_os_str().is_empty() {
            return Err(HealthError::InvalidPath("empty state path".to_string()));
        }
        if let Some(parent) = state_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let state = load_state(&state_path)?;
        log::debug!(
            "Loaded state for {} monitors from {}",
            state.monitors.len(),
            state_path.display()
        );

        Ok(Self {
            state_path,
            inner: RwLock::new(RegistryInner {
                monitors: BTreeMap::new(),
                state,
            }),
        })
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Add a monitor. Names are unique; a duplicate leaves the registry unchanged.
    pub fn register(&self, monitor: Arc<dyn HealthMonitor>) -> Result<()> {
        let name = monitor.name().to_string();
        let mut inner = self.write();
        if inner.monitors.contains_key(&name) {
            return Err(HealthError::DuplicateMonitor(name));
        }

        inner.state.monitors.entry(name.clone()).or_default();
        log::debug!("Registered monitor {name} ({})", monitor.schedule());
        inner.monitors.insert(name, monitor);
        Ok(())
    }

    pub fn get_monitor(&self, name: &str) -> Option<Arc<dyn HealthMonitor>> {
        self.read().monitors.get(name).cloned()
    }

    /// Registered monitor names in sorted order
    pub fn list_monitors(&self) -> Vec<String> {
        self.read().monitors.keys().cloned().collect()
    }

    /// Monitors whose schedule is due at `now`, sorted by name.
    ///
    /// Event triggers are evaluated against each monitor's own counters.
    pub fn scheduled_monitors(&self, now: DateTime<Utc>) -> Vec<Arc<dyn HealthMonitor>> {
        let inner = self.read();
        let never_run = MonitorRunState::default();

        inner
            .monitors
            .iter()
            .filter(|(name, monitor)| {
                let run_state = inner.state.monitors.get(name.as_str()).unwrap_or(&never_run);
                monitor.schedule().is_due(run_state, now)
            })
            .map(|(_, monitor)| Arc::clone(monitor))
            .collect()
    }

    /// Record a completed run and persist.
    ///
    /// On a persistence error the in-memory update has already happened.
    pub fn record_run(
        &self,
        name: &str,
        result: &MonitorResult,
        issues_filed: Vec<String>,
    ) -> Result<()> {
        let mut inner = self.write();
        let run_state = inner.state.monitors.entry(name.to_string()).or_default();

        run_state.last_run = Some(result.checked_at);
        run_state.last_issue_count = issues_filed.len();
        run_state.last_issues_filed = issues_filed;
        run_state.runs_since_epoch += 1;
        run_state.issues_closed_since = 0;
        run_state.commits_since = 0;

        log::info!(
            "Recorded run of {name} at {} ({} issues filed)",
            result.checked_at,
            run_state.last_issue_count
        );
        save_state(&self.state_path, &inner.state)
    }

    /// Add `count` closed issues to every monitor's counter and persist
    pub fn increment_issues_closed(&self, count: u64) -> Result<()> {
        let mut inner = self.write();
        for run_state in inner.state.monitors.values_mut() {
            run_state.issues_closed_since = run_state.issues_closed_since.saturating_add(count);
        }
        log::debug!("Counted {count} closed issues");
        save_state(&self.state_path, &inner.state)
    }

    /// Add `count` commits to every monitor's counter and persist
    pub fn increment_commits(&self, count: u64) -> Result<()> {
        let mut inner = self.write();
        for run_state in inner.state.monitors.values_mut() {
            run_state.commits_since = run_state.commits_since.saturating_add(count);
        }
        log::debug!("Counted {count} commits");
        save_state(&self.state_path, &inner.state)
    }

    /// Snapshot of a monitor's run state
    pub fn monitor_state(&self, name: &str) -> Option<MonitorRunState> {
        self.read().state.monitors.get(name).cloned()
    }

    /// Snapshot of the whole persisted state
    pub fn state(&self) -> MonitorState {
        self.read().state.clone()
    }

    /// Run the named monitor's check. Does not record the run.
    pub fn run_monitor(
        &self,
        name: &str,
        cancel: &CancellationToken,
        codebase: &CodebaseContext,
    ) -> Result<MonitorResult> {
        let monitor = self
            .get_monitor(name)
            .ok_or_else(|| HealthError::UnknownMonitor(name.to_string()))?;

        log::info!("Running monitor {name}");
        monitor.check(cancel, codebase)
    }

    /// A handle that can only feed event counters
    pub fn event_recorder(self: &Arc<Self>) -> EventRecorder {
        EventRecorder {
            registry: Arc::clone(self),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Narrow capability for components that observe issue closures and commits
#[derive(Clone)]
pub struct EventRecorder {
    registry: Arc<MonitorRegistry>,
}

impl EventRecorder {
    pub fn issues_closed(&self, count: u64) -> Result<()> {
        self.registry.increment_issues_closed(count)
    }

    pub fn commits(&self, count: u64) -> Result<()> {
        self.registry.increment_commits(count)
    }
}
