//! Background jobs: medication reminders and scheduled health reports.
//!
//! Both loops run on `tokio::time::interval` and stop when the shared
//! [`CancellationToken`] fires.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{names, EventBus, LiveEvent};
use crate::services::reports::render_report_text;
use crate::services::{ReminderServiceTrait, ReportServiceTrait, ServiceError, ServiceRegistry};

const DEFAULT_MEDICATION_CHECK_SECONDS: u64 = 300;
const DEFAULT_REPORT_CHECK_SECONDS: u64 = 3600;
const DEFAULT_REPORTS_DIR: &str = "reports";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub medication_check_interval: Duration,
    pub report_check_interval: Duration,
    pub reports_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            medication_check_interval: Duration::from_secs(DEFAULT_MEDICATION_CHECK_SECONDS),
            report_check_interval: Duration::from_secs(DEFAULT_REPORT_CHECK_SECONDS),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
        }
    }
}

fn seconds_from_env(key: &str, default: u64) -> Duration {
    let seconds = env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(seconds)
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            medication_check_interval: seconds_from_env(
                "MEDICATION_CHECK_INTERVAL_SECONDS",
                DEFAULT_MEDICATION_CHECK_SECONDS,
            ),
            report_check_interval: seconds_from_env("REPORT_CHECK_INTERVAL_SECONDS", DEFAULT_REPORT_CHECK_SECONDS),
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORTS_DIR)),
        }
    }
}

/// Schedule frequencies that produce a report on `date`
pub fn due_frequencies(date: NaiveDate) -> Vec<&'static str> {
    let mut due = vec!["daily"];
    if date.weekday() == Weekday::Mon {
        due.push("weekly");
    }
    if date.day() == 1 {
        due.push("monthly");
    }
    due
}

/// One file per user, frequency and day
pub fn report_path(dir: &Path, user_id: &str, frequency: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("report_{}_{}_{}.txt", user_id, frequency, date.format("%Y%m%d")))
}

/// Writes reports for active schedules, at most once per schedule and day
pub struct ReportScheduler {
    reports: Arc<dyn ReportServiceTrait + Send + Sync>,
    bus: EventBus,
    reports_dir: PathBuf,
    last_run: Mutex<HashMap<String, NaiveDate>>,
}

impl ReportScheduler {
    pub fn new(reports: Arc<dyn ReportServiceTrait + Send + Sync>, bus: EventBus, reports_dir: PathBuf) -> Self {
        Self {
            reports,
            bus,
            reports_dir,
            last_run: Mutex::new(HashMap::new()),
        }
    }

    fn already_ran(&self, schedule_id: &str, date: NaiveDate) -> bool {
        self.last_run
            .lock()
            .map(|runs| runs.get(schedule_id) == Some(&date))
            .unwrap_or(false)
    }

    fn mark_ran(&self, schedule_id: &str, date: NaiveDate) {
        if let Ok(mut runs) = self.last_run.lock() {
            runs.insert(schedule_id.to_string(), date);
        }
    }

    /// Generate every report due on `date`; returns how many were written
    pub async fn run_due(&self, date: NaiveDate) -> Result<usize, ServiceError> {
        tokio::fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|e| ServiceError::Internal(format!("Cannot create reports directory: {}", e)))?;

        let mut written = 0;
        for frequency in due_frequencies(date) {
            for schedule in self.reports.active_schedules(frequency).await? {
                if self.already_ran(&schedule.id, date) {
                    continue;
                }

                let report = match self.reports.generate_report(&schedule.user_id, schedule.report_period).await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(schedule_id = %schedule.id, error = %e, "Scheduled report failed");
                        continue;
                    }
                };

                let path = report_path(&self.reports_dir, &schedule.user_id, &schedule.frequency, date);
                if let Err(e) = tokio::fs::write(&path, render_report_text(&report)).await {
                    error!(path = %path.display(), error = %e, "Failed to write scheduled report");
                    continue;
                }
                self.mark_ran(&schedule.id, date);
                written += 1;

                info!(user_id = %schedule.user_id, frequency, path = %path.display(), "Scheduled report written");
                self.bus.publish(
                    LiveEvent::new(&schedule.user_id, names::REPORT_READY).with_payload(json!({
                        "message": format!("Your {} health report is ready.", frequency),
                        "frequency": frequency,
                        "file": path.file_name().map(|n| n.to_string_lossy().into_owned()),
                    })),
                );
            }
        }
        Ok(written)
    }
}

/// Check medication reminders for every user on each tick
pub fn start_reminder_task(
    reminders: Arc<dyn ReminderServiceTrait + Send + Sync>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    match reminders.check_all_users().await {
                        Ok(sent) => debug!("Medication check sent {} reminders", sent),
                        Err(e) => error!("Medication reminder check failed: {}", e),
                    }
                }
            }
        }
        debug!("Medication reminder task stopped");
    })
}

pub fn start_report_task(scheduler: Arc<ReportScheduler>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = scheduler.run_due(Local::now().date_naive()).await {
                        error!("Scheduled report check failed: {}", e);
                    }
                }
            }
        }
        debug!("Report scheduler task stopped");
    })
}

/// Spawn both background jobs over the registry's services
pub fn start(services: &ServiceRegistry, config: SchedulerConfig, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
    info!(
        medication_secs = config.medication_check_interval.as_secs(),
        report_secs = config.report_check_interval.as_secs(),
        reports_dir = %config.reports_dir.display(),
        "Starting background scheduler"
    );
    let reports = Arc::new(ReportScheduler::new(
        services.reports.clone(),
        services.bus.clone(),
        config.reports_dir,
    ));
    vec![
        start_reminder_task(services.reminders.clone(), config.medication_check_interval, cancel.clone()),
        start_report_task(reports, config.report_check_interval, cancel),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CreateScheduleRequest;
    use crate::services::test_support::{repositories, seed_user};
    use crate::services::{ReminderService, ReportService};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_frequencies() {
        // 2024-04-01 is a Monday
        assert_eq!(due_frequencies(date(2024, 4, 1)), vec!["daily", "weekly", "monthly"]);
        assert_eq!(due_frequencies(date(2024, 4, 8)), vec!["daily", "weekly"]);
        assert_eq!(due_frequencies(date(2024, 5, 1)), vec!["daily", "monthly"]);
        assert_eq!(due_frequencies(date(2024, 4, 10)), vec!["daily"]);
    }

    #[test]
    fn test_report_path() {
        let path = report_path(Path::new("reports"), "user-1", "weekly", date(2024, 4, 1));
        assert_eq!(path, PathBuf::from("reports/report_user-1_weekly_20240401.txt"));
    }

    #[tokio::test]
    async fn test_scheduled_reports_run_once_per_day() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "scheduled", None).await;
        let reports = Arc::new(ReportService::new(repos));
        for frequency in ["daily", "weekly"] {
            reports
                .create_schedule(
                    &user_id,
                    CreateScheduleRequest {
                        frequency: frequency.to_string(),
                        report_period: Some(7),
                    },
                )
                .await
                .unwrap();
        }

        let dir = env::temp_dir().join(format!("vital-watch-reports-{}", uuid::Uuid::new_v4()));
        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let scheduler = ReportScheduler::new(reports, bus, dir.clone());

        // Wednesday: only the daily schedule is due
        let wednesday = date(2024, 4, 10);
        assert_eq!(scheduler.run_due(wednesday).await.unwrap(), 1);
        assert_eq!(scheduler.run_due(wednesday).await.unwrap(), 0);

        let event = events.try_recv().unwrap();
        assert_eq!(event.event, names::REPORT_READY);
        assert_eq!(event.payload["message"], "Your daily health report is ready.");

        let text = tokio::fs::read_to_string(report_path(&dir, &user_id, "daily", wednesday)).await.unwrap();
        assert!(text.contains("Period: Last 7 days"));

        // Monday: daily and weekly both run and keep separate files
        let monday = date(2024, 4, 15);
        assert_eq!(scheduler.run_due(monday).await.unwrap(), 2);
        for frequency in ["daily", "weekly"] {
            let path = report_path(&dir, &user_id, frequency, monday);
            assert!(tokio::fs::metadata(&path).await.is_ok(), "missing {}", path.display());
        }
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_tasks_stop_on_cancel() {
        let (_pool, repos) = repositories();
        let cancel = CancellationToken::new();
        let reminders = Arc::new(ReminderService::new(repos.clone(), EventBus::default()));
        let scheduler = Arc::new(ReportScheduler::new(
            Arc::new(ReportService::new(repos)),
            EventBus::default(),
            env::temp_dir().join(format!("vital-watch-reports-{}", uuid::Uuid::new_v4())),
        ));

        let handles = vec![
            start_reminder_task(reminders, Duration::from_secs(60), cancel.clone()),
            start_report_task(scheduler, Duration::from_secs(60), cancel.clone()),
        ];
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
