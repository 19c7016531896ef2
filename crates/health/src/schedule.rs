use crate::state::MonitorRunState;
use crate::{HealthError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// When a monitor becomes due
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleConfig {
    /// Due once `interval` has passed since the last run, or if never run
    TimeBased { interval: Duration },

    /// Due once the trigger's event counter reaches its threshold
    EventBased { trigger: String },

    /// Due when `min_interval` has passed and the trigger fires, or
    /// unconditionally after `max_interval`
    Hybrid {
        min_interval: Duration,
        max_interval: Duration,
        trigger: String,
    },

    /// Never scheduled automatically
    Manual,
}

impl ScheduleConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleConfig::TimeBased { .. } => "time_based",
            ScheduleConfig::EventBased { .. } => "event_based",
            ScheduleConfig::Hybrid { .. } => "hybrid",
            ScheduleConfig::Manual => "manual",
        }
    }

    /// Evaluate this schedule against a monitor's run state at `now`
    pub fn is_due(&self, state: &MonitorRunState, now: DateTime<Utc>) -> bool {
        match self {
            ScheduleConfig::Manual => false,
            ScheduleConfig::TimeBased { interval } => match elapsed_since_last_run(state, now) {
                None => true,
                Some(elapsed) => elapsed >= *interval,
            },
            ScheduleConfig::EventBased { trigger } => trigger_fires(trigger, state),
            ScheduleConfig::Hybrid {
                min_interval,
                max_interval,
                trigger,
            } => match elapsed_since_last_run(state, now) {
                // never run: nothing to wait for
                None => true,
                Some(elapsed) if elapsed >= *max_interval => true,
                Some(elapsed) if elapsed < *min_interval => false,
                Some(_) => trigger_fires(trigger, state),
            },
        }
    }
}

impl fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleConfig::TimeBased { interval } => {
                write!(f, "every {}", format_duration(*interval))
            }
            ScheduleConfig::EventBased { trigger } => write!(f, "on {trigger}"),
            ScheduleConfig::Hybrid {
                min_interval,
                max_interval,
                trigger,
            } => write!(
                f,
                "on {trigger} after {}, at least every {}",
                format_duration(*min_interval),
                format_duration(*max_interval)
            ),
            ScheduleConfig::Manual => f.write_str("manual"),
        }
    }
}

/// A parsed `every_N_issues` / `every_N_commits` trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTrigger {
    IssuesClosed(u64),
    Commits(u64),
}

impl EventTrigger {
    /// Strict parse; anything else is `None` and never fires.
    ///
    /// A zero threshold is accepted and fires on every evaluation.
    pub fn parse(trigger: &str) -> Option<Self> {
        let rest = trigger.strip_prefix("every_")?;
        if let Some(count) = rest.strip_suffix("_issues") {
            return parse_threshold(count).map(EventTrigger::IssuesClosed);
        }
        if let Some(count) = rest.strip_suffix("_commits") {
            return parse_threshold(count).map(EventTrigger::Commits);
        }
        None
    }

    pub fn threshold(self) -> u64 {
        match self {
            EventTrigger::IssuesClosed(n) | EventTrigger::Commits(n) => n,
        }
    }

    pub fn fires(self, state: &MonitorRunState) -> bool {
        match self {
            EventTrigger::IssuesClosed(threshold) => state.issues_closed_since >= threshold,
            EventTrigger::Commits(threshold) => state.commits_since >= threshold,
        }
    }
}

impl fmt::Display for EventTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTrigger::IssuesClosed(n) => write!(f, "every_{n}_issues"),
            EventTrigger::Commits(n) => write!(f, "every_{n}_commits"),
        }
    }
}

fn parse_threshold(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn trigger_fires(trigger: &str, state: &MonitorRunState) -> bool {
    match EventTrigger::parse(trigger) {
        Some(parsed) => parsed.fires(state),
        None => {
            log::trace!("Ignoring unrecognized event trigger {trigger:?}");
            false
        }
    }
}

/// `None` when the monitor never ran. A clock that moved backwards counts as
/// zero elapsed time.
fn elapsed_since_last_run(state: &MonitorRunState, now: DateTime<Utc>) -> Option<Duration> {
    let last_run = state.last_run?;
    Some(
        now.signed_duration_since(last_run)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

/// Parse durations such as `24h`, `7d`, `2w`, `1h30m`, `500ms`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let text = input.trim();
    if text.is_empty() {
        return Err(HealthError::config("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| HealthError::config(format!("missing unit in duration {input:?}")))?;
        if digits_end == 0 {
            return Err(HealthError::config(format!("invalid duration {input:?}")));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| HealthError::config(format!("invalid duration {input:?}")))?;

        let unit_part = &rest[digits_end..];
        let unit_end = unit_part
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(unit_part.len());
        let unit = &unit_part[..unit_end];
        let step = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3_600)),
            "d" => Duration::from_secs(value.saturating_mul(86_400)),
            "w" => Duration::from_secs(value.saturating_mul(604_800)),
            other => {
                return Err(HealthError::config(format!(
                    "unknown duration unit {other:?} in {input:?}"
                )))
            }
        };
        total = total.saturating_add(step);
        rest = &unit_part[unit_end..];
    }

    Ok(total)
}

/// Render a duration in the largest whole unit that fits
pub fn format_duration(duration: Duration) -> String {
    const UNITS: &[(u64, &str)] = &[(604_800, "w"), (86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let secs = duration.as_secs();
    if secs == 0 {
        return format!("{}ms", duration.as_millis());
    }
    for (unit_secs, suffix) in UNITS {
        if secs % unit_secs == 0 {
            return format!("{}{suffix}", secs / unit_secs);
        }
    }
    format!("{secs}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HOUR: Duration = Duration::from_secs(3_600);

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn ran_at(hour: u32) -> MonitorRunState {
        MonitorRunState {
            last_run: Some(at(hour)),
            ..MonitorRunState::default()
        }
    }

    fn hybrid() -> ScheduleConfig {
        ScheduleConfig::Hybrid {
            min_interval: 2 * HOUR,
            max_interval: 10 * HOUR,
            trigger: "every_5_issues".to_string(),
        }
    }

    #[test]
    fn never_run_state_is_due_except_manual() {
        let fresh = MonitorRunState::default();
        let now = at(12);
        assert!(ScheduleConfig::TimeBased { interval: HOUR }.is_due(&fresh, now));
        assert!(hybrid().is_due(&fresh, now));
        assert!(!ScheduleConfig::Manual.is_due(&fresh, now));
    }

    #[test]
    fn time_based_waits_for_interval() {
        let schedule = ScheduleConfig::TimeBased { interval: 3 * HOUR };
        let state = ran_at(1);
        assert!(!schedule.is_due(&state, at(1)));
        assert!(!schedule.is_due(&state, at(3)));
        assert!(schedule.is_due(&state, at(4)));
    }

    #[test]
    fn clock_skew_counts_as_no_time_elapsed() {
        let schedule = ScheduleConfig::TimeBased { interval: HOUR };
        assert!(!schedule.is_due(&ran_at(10), at(8)));
    }

    #[test]
    fn event_based_fires_at_threshold() {
        let schedule = ScheduleConfig::EventBased {
            trigger: "every_3_commits".to_string(),
        };
        let mut state = ran_at(0);
        state.commits_since = 2;
        assert!(!schedule.is_due(&state, at(0)));
        state.commits_since = 3;
        assert!(schedule.is_due(&state, at(0)));
    }

    #[test]
    fn hybrid_min_interval_blocks_events() {
        let mut state = ran_at(5);
        state.issues_closed_since = 1_000;
        assert!(!hybrid().is_due(&state, at(6)));
        assert!(hybrid().is_due(&state, at(7)));
    }

    #[test]
    fn hybrid_needs_trigger_between_min_and_max() {
        let mut state = ran_at(0);
        assert!(!hybrid().is_due(&state, at(5)));
        state.issues_closed_since = 5;
        assert!(hybrid().is_due(&state, at(5)));
    }

    #[test]
    fn hybrid_max_interval_forces_run() {
        let state = ran_at(0);
        assert!(hybrid().is_due(&state, at(10)));
        assert!(hybrid().is_due(&state, at(23)));
    }

    #[test]
    fn trigger_parsing_is_strict() {
        assert_eq!(
            EventTrigger::parse("every_10_issues"),
            Some(EventTrigger::IssuesClosed(10))
        );
        assert_eq!(
            EventTrigger::parse("every_3_commits"),
            Some(EventTrigger::Commits(3))
        );
        for bad in [
            "",
            "after_git_push",
            "every__issues",
            "every_-5_issues",
            "every_5_issue",
            "every_5_issues_now",
            "every_+5_commits",
        ] {
            assert_eq!(EventTrigger::parse(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn zero_threshold_fires_without_events() {
        assert_eq!(
            EventTrigger::parse("every_0_issues"),
            Some(EventTrigger::IssuesClosed(0))
        );
        let schedule = ScheduleConfig::EventBased {
            trigger: "every_0_commits".to_string(),
        };
        assert!(schedule.is_due(&ran_at(0), at(0)));
    }

    #[test]
    fn malformed_trigger_never_fires() {
        let schedule = ScheduleConfig::EventBased {
            trigger: "whenever".to_string(),
        };
        let mut state = ran_at(0);
        state.issues_closed_since = u64::MAX;
        state.commits_since = u64::MAX;
        assert!(!schedule.is_due(&state, at(23)));
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("24h").unwrap(), 24 * HOUR);
        assert_eq!(parse_duration("7d").unwrap(), 168 * HOUR);
        assert_eq!(parse_duration("2w").unwrap(), 336 * HOUR);
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            HOUR + Duration::from_secs(1_800)
        );
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("3y").is_err());
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(24 * HOUR), "1d");
        assert_eq!(format_duration(168 * HOUR), "1w");
        assert_eq!(format_duration(90 * 60 * Duration::from_secs(1)), "90m");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }
}
