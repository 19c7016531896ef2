use anyhow::{anyhow, Context as AnyhowContext, Result};
use chrono::{DateTime, Utc};
use codehealth_monitor::{
    survey_codebase, CostEstimate, HealthConfig, MonitorRegistry, MonitorResult, MonitorRunState,
    MonitorState, ScheduleSpec, WalkConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
pub struct MonitorSummary {
    pub name: String,
    pub philosophy: String,
    pub schedule: ScheduleSpec,
    pub schedule_description: String,
    pub cost: CostEstimate,
    pub state: Option<MonitorRunState>,
}

#[derive(Debug, Serialize)]
pub struct DueReport {
    pub at: DateTime<Utc>,
    pub due: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub monitor: String,
    pub recorded: bool,
    pub result: MonitorResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MonitorRunState>,
}

#[derive(Debug, Serialize)]
pub struct RunFailure {
    pub monitor: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RunDueReport {
    pub at: DateTime<Utc>,
    pub runs: Vec<RunReport>,
    pub failures: Vec<RunFailure>,
}

#[derive(Debug, Serialize)]
pub struct InitConfigReport {
    pub written: PathBuf,
}

pub fn list(registry: &MonitorRegistry) -> Vec<MonitorSummary> {
    registry
        .list_monitors()
        .into_iter()
        .filter_map(|name| registry.get_monitor(&name))
        .map(|monitor| {
            let schedule = monitor.schedule();
            MonitorSummary {
                name: monitor.name().to_string(),
                philosophy: monitor.philosophy().to_string(),
                schedule_description: schedule.to_string(),
                schedule: ScheduleSpec::from_schedule(&schedule),
                cost: monitor.cost(),
                state: registry.monitor_state(monitor.name()),
            }
        })
        .collect()
}

pub fn due(registry: &MonitorRegistry, at: DateTime<Utc>) -> DueReport {
    DueReport {
        at,
        due: registry
            .scheduled_monitors(at)
            .iter()
            .map(|monitor| monitor.name().to_string())
            .collect(),
    }
}

pub fn run(
    registry: &MonitorRegistry,
    root: &Path,
    cancel: &CancellationToken,
    name: &str,
    record: bool,
    issues_filed: Vec<String>,
) -> Result<RunReport> {
    let codebase = survey_codebase(root, WalkConfig::default(), cancel)?;
    let result = registry.run_monitor(name, cancel, &codebase)?;

    if record {
        registry
            .record_run(name, &result, issues_filed)
            .with_context(|| format!("Failed to record run of {name}"))?;
    }

    Ok(RunReport {
        monitor: name.to_string(),
        recorded: record,
        state: record.then(|| registry.monitor_state(name)).flatten(),
        result,
    })
}

/// Run and record every monitor due at `now`. A failed check is reported
/// and the rest still run; cancellation stops everything.
pub fn run_due(
    registry: &MonitorRegistry,
    root: &Path,
    cancel: &CancellationToken,
    now: DateTime<Utc>,
) -> Result<RunDueReport> {
    let mut report = RunDueReport {
        at: now,
        runs: Vec::new(),
        failures: Vec::new(),
    };

    let due = registry.scheduled_monitors(now);
    if due.is_empty() {
        log::info!("No monitors due at {now}");
        return Ok(report);
    }

    let codebase = survey_codebase(root, WalkConfig::default(), cancel)?;
    for monitor in due {
        let name = monitor.name().to_string();
        match monitor.check(cancel, &codebase) {
            Ok(result) => {
                registry
                    .record_run(&name, &result, Vec::new())
                    .with_context(|| format!("Failed to record run of {name}"))?;
                report.runs.push(RunReport {
                    state: registry.monitor_state(&name),
                    monitor: name,
                    recorded: true,
                    result,
                });
            }
            Err(err) if err.is_cancelled() => return Err(err.into()),
            Err(err) => {
                log::warn!("Monitor {name} failed: {err}");
                report.failures.push(RunFailure {
                    monitor: name,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

pub fn events(registry: &MonitorRegistry, issues_closed: u64, commits: u64) -> Result<MonitorState> {
    if issues_closed > 0 {
        registry.increment_issues_closed(issues_closed)?;
    }
    if commits > 0 {
        registry.increment_commits(commits)?;
    }
    Ok(registry.state())
}

pub fn state(registry: &MonitorRegistry, name: Option<&str>) -> Result<serde_json::Value> {
    match name {
        Some(name) => {
            let run_state = registry
                .monitor_state(name)
                .ok_or_else(|| anyhow!("No state recorded for monitor {name:?}"))?;
            Ok(serde_json::to_value(run_state)?)
        }
        None => Ok(serde_json::to_value(registry.state())?),
    }
}

pub fn init_config(path: &Path) -> Result<InitConfigReport> {
    HealthConfig::save_default_config(path)
        .with_context(|| format!("Failed to write config {}", path.display()))?;
    log::info!("Wrote default config to {}", path.display());
    Ok(InitConfigReport {
        written: path.to_path_buf(),
    })
}
