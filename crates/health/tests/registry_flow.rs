use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use codehealth_monitor::{
    CheckStats, CodebaseContext, CostCategory, CostEstimate, HealthError, HealthMonitor,
    MonitorRegistry, MonitorResult, Result, ScheduleConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

struct StubMonitor {
    name: &'static str,
    schedule: ScheduleConfig,
}

impl HealthMonitor for StubMonitor {
    fn name(&self) -> &str {
        self.name
    }

    fn philosophy(&self) -> &str {
        "stub"
    }

    fn schedule(&self) -> ScheduleConfig {
        self.schedule.clone()
    }

    fn cost(&self) -> CostEstimate {
        CostEstimate {
            estimated_duration: Duration::from_millis(1),
            ai_calls_estimated: 0,
            requires_full_scan: false,
            category: CostCategory::Cheap,
        }
    }

    fn check(&self, cancel: &CancellationToken, _codebase: &CodebaseContext) -> Result<MonitorResult> {
        if cancel.is_cancelled() {
            return Err(HealthError::Cancelled);
        }
        Ok(MonitorResult::empty(Utc::now(), "stub", CheckStats::default()))
    }
}

fn stub(name: &'static str, schedule: ScheduleConfig) -> Arc<dyn HealthMonitor> {
    Arc::new(StubMonitor { name, schedule })
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap()
}

fn names(monitors: &[Arc<dyn HealthMonitor>]) -> Vec<String> {
    monitors.iter().map(|m| m.name().to_string()).collect()
}

#[test]
fn state_survives_reopening() {
    let temp = tempdir().unwrap();
    let path = temp.path().join(".codehealth/health_state.json");

    let first = MonitorRegistry::open(&path).unwrap();
    first
        .register(stub("alpha", ScheduleConfig::Manual))
        .unwrap();
    first
        .register(stub("beta", ScheduleConfig::Manual))
        .unwrap();
    first
        .record_run(
            "alpha",
            &MonitorResult::empty(noon(), "", CheckStats::default()),
            vec!["vc-7".into()],
        )
        .unwrap();
    first.increment_commits(3).unwrap();
    let before = first.state();
    drop(first);

    let second = MonitorRegistry::open(&path).unwrap();
    assert_eq!(second.state(), before);

    let alpha = second.monitor_state("alpha").unwrap();
    assert_eq!(alpha.last_run, Some(noon()));
    assert_eq!(alpha.last_issues_filed, vec!["vc-7".to_string()]);
    assert_eq!(alpha.commits_since, 3);

    let beta = second.monitor_state("beta").unwrap();
    assert!(beta.last_run.is_none());
    assert_eq!(beta.commits_since, 3);
}

#[test]
fn event_based_monitor_fires_then_resets() {
    let temp = tempdir().unwrap();
    let registry = MonitorRegistry::open(temp.path().join("state.json")).unwrap();
    registry
        .register(stub(
            "closer",
            ScheduleConfig::EventBased {
                trigger: "every_10_issues".into(),
            },
        ))
        .unwrap();

    assert!(registry.scheduled_monitors(noon()).is_empty());

    registry.increment_issues_closed(10).unwrap();
    let due = registry.scheduled_monitors(noon());
    assert_eq!(names(&due), vec!["closer"]);

    let result = registry
        .run_monitor("closer", &CancellationToken::new(), &CodebaseContext::default())
        .unwrap();
    registry.record_run("closer", &result, vec![]).unwrap();

    assert_eq!(registry.monitor_state("closer").unwrap().issues_closed_since, 0);
    assert!(registry.scheduled_monitors(noon()).is_empty());
}

#[test]
fn hybrid_monitor_runs_first_then_waits_for_events() {
    let temp = tempdir().unwrap();
    let registry = MonitorRegistry::open(temp.path().join("state.json")).unwrap();
    registry
        .register(stub(
            "dup",
            ScheduleConfig::Hybrid {
                min_interval: Duration::from_secs(86_400),
                max_interval: Duration::from_secs(7 * 86_400),
                trigger: "every_20_issues".into(),
            },
        ))
        .unwrap();

    assert_eq!(registry.scheduled_monitors(noon()).len(), 1);
    registry
        .record_run("dup", &MonitorResult::empty(noon(), "", CheckStats::default()), vec![])
        .unwrap();

    let two_days = noon() + ChronoDuration::days(2);
    assert!(registry.scheduled_monitors(two_days).is_empty());

    registry.increment_issues_closed(20).unwrap();
    assert_eq!(registry.scheduled_monitors(two_days).len(), 1);

    let twelve_hours = noon() + ChronoDuration::hours(12);
    assert!(registry.scheduled_monitors(twelve_hours).is_empty());

    let eight_days = noon() + ChronoDuration::days(8);
    assert_eq!(registry.scheduled_monitors(eight_days).len(), 1);
}

#[test]
fn scheduled_monitors_come_back_sorted() {
    let temp = tempdir().unwrap();
    let registry = MonitorRegistry::open(temp.path().join("state.json")).unwrap();
    let hourly = ScheduleConfig::TimeBased {
        interval: Duration::from_secs(3_600),
    };
    for name in ["zeta", "alpha", "mid"] {
        registry.register(stub(name, hourly.clone())).unwrap();
    }

    assert_eq!(
        names(&registry.scheduled_monitors(noon())),
        vec!["alpha", "mid", "zeta"]
    );
    assert_eq!(registry.list_monitors(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn corrupt_state_file_fails_construction() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("state.json");
    std::fs::write(&path, "[1, 2").unwrap();

    assert!(matches!(
        MonitorRegistry::open(&path),
        Err(HealthError::StateParse { .. })
    ));
}

#[test]
fn cancelled_run_surfaces_cancellation() {
    let temp = tempdir().unwrap();
    let registry = MonitorRegistry::open(temp.path().join("state.json")).unwrap();
    registry
        .register(stub("alpha", ScheduleConfig::Manual))
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = registry
        .run_monitor("alpha", &cancel, &CodebaseContext::default())
        .unwrap_err();
    assert!(err.is_cancelled());
}
