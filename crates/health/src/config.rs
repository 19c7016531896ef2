use crate::monitors::builtin_schedules;
use crate::schedule::{format_duration, parse_duration, EventTrigger, ScheduleConfig};
use crate::{HealthError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level health configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub monitors: BTreeMap<String, MonitorConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the monitor's built-in schedule when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSpec>,
}

/// Schedule as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_n_issues: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_n_commits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_interval: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for HealthConfig {
    fn default() -> Self {
        let monitors = builtin_schedules()
            .into_iter()
            .map(|(name, schedule)| {
                (
                    name.to_string(),
                    MonitorConfig {
                        enabled: true,
                        schedule: Some(ScheduleSpec::from_schedule(&schedule)),
                    },
                )
            })
            .collect();
        Self {
            enabled: true,
            monitors,
        }
    }
}

impl HealthConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: HealthConfig = toml::from_str(&raw)?;
        config.validate()?;
        log::debug!(
            "Loaded health config from {} ({} monitors configured)",
            path.display(),
            config.monitors.len()
        );
        Ok(config)
    }

    /// Write the default configuration to `path`. An existing file is left untouched.
    pub fn save_default_config(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(HealthError::config(format!(
                "{} already exists",
                path.display()
            )));
        }
        let rendered = toml::to_string_pretty(&Self::default())
            .map_err(|err| HealthError::config(err.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, monitor) in &self.monitors {
            if let Some(spec) = &monitor.schedule {
                spec.to_schedule()
                    .map_err(|err| HealthError::config(format!("monitor {name}: {err}")))?;
            }
        }
        Ok(())
    }

    pub fn is_monitor_enabled(&self, name: &str) -> bool {
        self.enabled && self.monitors.get(name).map_or(true, |m| m.enabled)
    }

    /// Configured schedule for `name`, if any
    pub fn schedule_override(&self, name: &str) -> Result<Option<ScheduleConfig>> {
        self.monitors
            .get(name)
            .and_then(|m| m.schedule.as_ref())
            .map(ScheduleSpec::to_schedule)
            .transpose()
    }
}

impl ScheduleSpec {
    pub fn to_schedule(&self) -> Result<ScheduleConfig> {
        match self.kind.as_str() {
            "time_based" => Ok(ScheduleConfig::TimeBased {
                interval: required_duration("interval", self.interval.as_deref())?,
            }),
            "event_based" => Ok(ScheduleConfig::EventBased {
                trigger: self.trigger()?,
            }),
            "hybrid" => {
                let min_interval = required_duration("min_interval", self.min_interval.as_deref())?;
                let max_interval = required_duration("max_interval", self.max_interval.as_deref())?;
                if max_interval < min_interval {
                    return Err(HealthError::config(format!(
                        "max_interval {} is shorter than min_interval {}",
                        format_duration(max_interval),
                        format_duration(min_interval)
                    )));
                }
                Ok(ScheduleConfig::Hybrid {
                    min_interval,
                    max_interval,
                    trigger: self.trigger()?,
                })
            }
            "manual" => Ok(ScheduleConfig::Manual),
            other => Err(HealthError::config(format!(
                "unknown schedule type {other:?}"
            ))),
        }
    }

    pub fn from_schedule(schedule: &ScheduleConfig) -> Self {
        let mut spec = ScheduleSpec {
            kind: schedule.kind().to_string(),
            ..ScheduleSpec::default()
        };
        match schedule {
            ScheduleConfig::TimeBased { interval } => {
                spec.interval = Some(format_duration(*interval));
            }
            ScheduleConfig::EventBased { trigger } => spec.set_trigger(trigger),
            ScheduleConfig::Hybrid {
                min_interval,
                max_interval,
                trigger,
            } => {
                spec.min_interval = Some(format_duration(*min_interval));
                spec.max_interval = Some(format_duration(*max_interval));
                spec.set_trigger(trigger);
            }
            ScheduleConfig::Manual => {}
        }
        spec
    }

    fn trigger(&self) -> Result<String> {
        let trigger = match (self.every_n_issues, self.every_n_commits) {
            (Some(n), _) => EventTrigger::IssuesClosed(n),
            (None, Some(n)) => EventTrigger::Commits(n),
            (None, None) => {
                return Err(HealthError::config(format!(
                    "{} schedule needs every_n_issues or every_n_commits",
                    self.kind
                )))
            }
        };
        if trigger.threshold() == 0 {
            return Err(HealthError::config("event threshold must be positive"));
        }
        Ok(trigger.to_string())
    }

    fn set_trigger(&mut self, trigger: &str) {
        match EventTrigger::parse(trigger) {
            Some(EventTrigger::IssuesClosed(n)) => self.every_n_issues = Some(n),
            Some(EventTrigger::Commits(n)) => self.every_n_commits = Some(n),
            None => log::warn!("Cannot express trigger {trigger:?} in config"),
        }
    }
}

fn required_duration(field: &str, value: Option<&str>) -> Result<std::time::Duration> {
    let raw = value.ok_or_else(|| HealthError::config(format!("missing {field}")))?;
    parse_duration(raw)
}
