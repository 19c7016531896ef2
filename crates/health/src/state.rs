use crate::{HealthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Execution history of every known monitor; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub monitors: BTreeMap<String, MonitorRunState>,
}

/// Execution history for a single monitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRunState {
    /// `None` exactly when the monitor has never run
    #[serde(default, with = "zero_time")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_issues_filed: Vec<String>,
    #[serde(default)]
    pub last_issue_count: usize,
    #[serde(default)]
    pub runs_since_epoch: u64,
    /// Event counters, reset on every recorded run
    #[serde(default)]
    pub issues_closed_since: u64,
    #[serde(default)]
    pub commits_since: u64,
}

impl MonitorRunState {
    pub fn has_run(&self) -> bool {
        self.last_run.is_some()
    }
}

/// Load persisted state. A missing file is an empty state.
pub fn load_state(path: &Path) -> Result<MonitorState> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| HealthError::StateParse {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(MonitorState::default()),
        Err(err) => Err(err.into()),
    }
}

/// Write `state` to `path` atomically: temp file in the same directory,
/// fsync, rename over the destination. The temp file is removed on every
/// failure path.
pub fn save_state(path: &Path, state: &MonitorState) -> Result<()> {
    let data = serde_json::to_vec_pretty(state)?;
    let tmp = temp_path_for(path);
    let guard = TempFileGuard::new(tmp.clone());

    write_synced(&tmp, &data).map_err(|source| HealthError::Persist {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| HealthError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    guard.disarm();
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("health_state.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Removes the temp file on drop unless disarmed
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove temp state file {}: {err}", self.path.display());
            }
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// RFC3339 timestamps where the zero instant `0001-01-01T00:00:00Z` means
/// "never".
mod zero_time {
    use chrono::{DateTime, Datelike, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const ZERO: &str = "0001-01-01T00:00:00Z";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_str(ZERO),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let parsed = DateTime::parse_from_rfc3339(&raw)
            .map_err(serde::de::Error::custom)?
            .with_timezone(&Utc);
        if parsed.year() <= 1 && parsed.timestamp() <= zero_timestamp() {
            return Ok(None);
        }
        Ok(Some(parsed))
    }

    fn zero_timestamp() -> i64 {
        DateTime::parse_from_rfc3339(ZERO)
            .map(|ts| ts.timestamp())
            .unwrap_or(i64::MIN)
    }
}
