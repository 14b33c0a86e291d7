//! Dashboard timeframes, health reports and report schedules.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use tracing::info;
use validator::Validate;

use vital_watch_data::models::{NewReportSchedule, ReportSchedule};

use crate::entities::conversions;
use crate::entities::{
    AlertSummary, AlertView, CreateScheduleRequest, DailyInsight, DownloadFile, HealthReport, ReportScheduleView,
    ReportStats, TimeframeReport, UpdateScheduleRequest, VitalSignsReading, VitalStatistics, VitalStatisticsSummary,
};
use crate::services::analysis::{mean, Vital};
use crate::services::{Repositories, ServiceError};

pub const DEFAULT_REPORT_DAYS: u32 = 30;
pub const REPORT_FREQUENCIES: [&str; 3] = ["daily", "weekly", "monthly"];
pub const NO_DATA_MESSAGE: &str = "No data available";

const RECENT_ALERTS: usize = 5;

#[async_trait]
pub trait ReportServiceTrait {
    /// Chart series for `daily`, `weekly` or `monthly`
    async fn timeframe_report(&self, user_id: &str, timeframe: &str) -> Result<TimeframeReport, ServiceError>;

    async fn generate_report(&self, user_id: &str, days: u32) -> Result<HealthReport, ServiceError>;

    /// The health report as a plain-text attachment
    async fn download_report(&self, user_id: &str, days: u32) -> Result<DownloadFile, ServiceError> {
        let report = self.generate_report(user_id, days).await?;
        Ok(DownloadFile {
            filename: format!("health_report_{}.txt", report.generated_at.format("%Y%m%d")),
            content_type: "text/plain; charset=utf-8",
            body: render_report_text(&report),
        })
    }

    async fn stats(&self, user_id: &str, days: u32) -> Result<ReportStats, ServiceError>;

    async fn list_schedules(&self, user_id: &str) -> Result<Vec<ReportScheduleView>, ServiceError>;

    async fn create_schedule(
        &self,
        user_id: &str,
        request: CreateScheduleRequest,
    ) -> Result<ReportScheduleView, ServiceError>;

    async fn update_schedule(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateScheduleRequest,
    ) -> Result<ReportScheduleView, ServiceError>;

    async fn delete_schedule(&self, user_id: &str, id: &str) -> Result<(), ServiceError>;

    /// Active schedules with the given frequency, across all users
    async fn active_schedules(&self, frequency: &str) -> Result<Vec<ReportSchedule>, ServiceError>;
}

/// First local day covered by a timeframe ending today
pub fn timeframe_start(timeframe: &str, today: NaiveDate) -> Result<NaiveDate, ServiceError> {
    let days_back = match timeframe {
        "daily" => 0,
        "weekly" => 7,
        "monthly" => 30,
        other => {
            return Err(ServiceError::Validation(format!(
                "Invalid timeframe '{}'. Use daily, weekly or monthly",
                other
            )))
        }
    };
    Ok(today - Duration::days(days_back))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn check_frequency(frequency: &str) -> Result<String, ServiceError> {
    let frequency = frequency.trim().to_lowercase();
    if REPORT_FREQUENCIES.contains(&frequency.as_str()) {
        Ok(frequency)
    } else {
        Err(ServiceError::Validation(
            "frequency: Frequency must be daily, weekly or monthly".to_string(),
        ))
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Chart series plus per-day averages; readings oldest first
pub fn build_timeframe_report(
    timeframe: &str,
    start: DateTime<Utc>,
    readings: &[VitalSignsReading],
    alerts: &[AlertView],
) -> TimeframeReport {
    let mut by_day: BTreeMap<NaiveDate, Vec<&VitalSignsReading>> = BTreeMap::new();
    for reading in readings {
        by_day
            .entry(reading.timestamp.with_timezone(&Local).date_naive())
            .or_default()
            .push(reading);
    }

    let mut alerts_by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for alert in alerts {
        *alerts_by_day
            .entry(alert.timestamp.with_timezone(&Local).date_naive())
            .or_default() += 1;
    }

    let insights = by_day
        .iter()
        .map(|(date, day)| {
            let avg = |vital: Vital| round1(mean(&day.iter().map(|r| vital.value(r)).collect::<Vec<_>>()));
            DailyInsight {
                date: *date,
                avg_heart_rate: avg(Vital::HeartRate),
                avg_spo2: avg(Vital::OxygenSaturation),
                avg_temperature: avg(Vital::Temperature),
                alerts: alerts_by_day.get(date).copied().unwrap_or(0),
            }
        })
        .collect();

    TimeframeReport {
        timeframe: timeframe.to_string(),
        start,
        timestamps: readings
            .iter()
            .map(|r| r.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .collect(),
        heart_rate: Vital::HeartRate.series(readings),
        blood_pressure_systolic: Vital::Systolic.series(readings),
        blood_pressure_diastolic: Vital::Diastolic.series(readings),
        temperature: Vital::Temperature.series(readings),
        oxygen_saturation: Vital::OxygenSaturation.series(readings),
        insights,
    }
}

fn statistics(values: &[f64]) -> VitalStatistics {
    VitalStatistics {
        count: values.len(),
        min: round1(values.iter().copied().fold(f64::INFINITY, f64::min)),
        max: round1(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        mean: round1(mean(values)),
    }
}

/// Count, min, max and mean per vital; `None` without readings
pub fn vital_statistics(readings: &[VitalSignsReading]) -> Option<VitalStatisticsSummary> {
    if readings.is_empty() {
        return None;
    }
    Some(VitalStatisticsSummary {
        heart_rate: statistics(&Vital::HeartRate.series(readings)),
        blood_pressure_systolic: statistics(&Vital::Systolic.series(readings)),
        blood_pressure_diastolic: statistics(&Vital::Diastolic.series(readings)),
        temperature: statistics(&Vital::Temperature.series(readings)),
        oxygen_saturation: statistics(&Vital::OxygenSaturation.series(readings)),
    })
}

/// Totals by severity and the most recent alerts; `alerts` newest first
pub fn alert_summary(alerts: &[AlertView]) -> AlertSummary {
    AlertSummary {
        total: alerts.len(),
        warning: alerts.iter().filter(|a| a.is_warning()).count(),
        danger: alerts.iter().filter(|a| a.is_danger()).count(),
        recent: alerts.iter().take(RECENT_ALERTS).cloned().collect(),
    }
}

pub fn render_report_text(report: &HealthReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HEALTH REPORT");
    let _ = writeln!(out, "=============");
    let _ = writeln!(out, "Patient: {}", report.patient_name);
    let _ = writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out, "Period: Last {} days", report.period_days);
    let _ = writeln!(out);

    let _ = writeln!(out, "VITAL SIGNS SUMMARY");
    let _ = writeln!(out, "-------------------");
    match &report.vital_statistics {
        Some(stats) => {
            let rows = [
                ("Heart Rate (bpm)", &stats.heart_rate),
                ("Systolic Pressure (mmHg)", &stats.blood_pressure_systolic),
                ("Diastolic Pressure (mmHg)", &stats.blood_pressure_diastolic),
                ("Temperature (°C)", &stats.temperature),
                ("Oxygen Saturation (%)", &stats.oxygen_saturation),
            ];
            for (label, s) in rows {
                let _ = writeln!(
                    out,
                    "{}: avg {:.1}, min {:.1}, max {:.1} ({} readings)",
                    label, s.mean, s.min, s.max, s.count
                );
            }
        }
        None => {
            let _ = writeln!(out, "No vital sign readings in this period.");
        }
    }
    let _ = writeln!(out);

    let summary = &report.alert_summary;
    let _ = writeln!(out, "ALERTS");
    let _ = writeln!(out, "------");
    let _ = writeln!(
        out,
        "Total: {} (warning: {}, danger: {})",
        summary.total, summary.warning, summary.danger
    );
    for alert in &summary.recent {
        let _ = writeln!(
            out,
            "- {} [{}] {}",
            alert.timestamp.format("%Y-%m-%d %H:%M"),
            alert.severity.as_deref().unwrap_or("-"),
            alert.message.lines().next().unwrap_or_default()
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "MEDICATIONS");
    let _ = writeln!(out, "-----------");
    if report.medications.is_empty() {
        let _ = writeln!(out, "No active medications.");
    }
    for medication in &report.medications {
        let _ = writeln!(out, "- {} {}, {}", medication.name, medication.dosage, medication.frequency);
    }

    out
}

pub struct ReportService {
    repos: Repositories,
}

impl ReportService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn owned_schedule(&self, user_id: &str, id: &str) -> Result<ReportSchedule, ServiceError> {
        let schedule = self
            .repos
            .schedules
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Schedule not found".to_string()))?;
        if schedule.user_id != user_id {
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }
        Ok(schedule)
    }

    async fn period(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<(Vec<VitalSignsReading>, Vec<AlertView>), ServiceError> {
        let readings = self.repos.vitals.get_since(user_id, since).await?;
        let alerts = self.repos.alerts.list_since(user_id, since).await?;
        Ok((
            readings.into_iter().map(conversions::convert_to_domain_reading).collect(),
            alerts.into_iter().map(conversions::convert_to_domain_alert).collect(),
        ))
    }
}

#[async_trait]
impl ReportServiceTrait for ReportService {
    async fn timeframe_report(&self, user_id: &str, timeframe: &str) -> Result<TimeframeReport, ServiceError> {
        let start = local_midnight(timeframe_start(timeframe, Local::now().date_naive())?);
        let (readings, alerts) = self.period(user_id, start).await?;
        Ok(build_timeframe_report(timeframe, start, &readings, &alerts))
    }

    async fn generate_report(&self, user_id: &str, days: u32) -> Result<HealthReport, ServiceError> {
        let user = self
            .repos
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let days = days.max(1);
        let generated_at = Utc::now();
        let (readings, alerts) = self.period(user_id, generated_at - Duration::days(days as i64)).await?;
        let medications = self
            .repos
            .medications
            .list_active_on(user_id, Local::now().date_naive())
            .await?;

        Ok(HealthReport {
            patient_name: user.full_name(),
            generated_at,
            period_days: days,
            vital_statistics: vital_statistics(&readings),
            alert_summary: alert_summary(&alerts),
            medications: medications.into_iter().map(conversions::convert_to_domain_medication).collect(),
        })
    }

    async fn stats(&self, user_id: &str, days: u32) -> Result<ReportStats, ServiceError> {
        let days = days.max(1);
        let (readings, alerts) = self.period(user_id, Utc::now() - Duration::days(days as i64)).await?;
        if readings.is_empty() && alerts.is_empty() {
            return Err(ServiceError::NotFound(NO_DATA_MESSAGE.to_string()));
        }
        Ok(ReportStats {
            period_days: days,
            vital_statistics: vital_statistics(&readings),
            alert_summary: alert_summary(&alerts),
        })
    }

    async fn list_schedules(&self, user_id: &str) -> Result<Vec<ReportScheduleView>, ServiceError> {
        let schedules = self.repos.schedules.list_by_user(user_id).await?;
        Ok(schedules.into_iter().map(conversions::convert_to_domain_schedule).collect())
    }

    async fn create_schedule(
        &self,
        user_id: &str,
        request: CreateScheduleRequest,
    ) -> Result<ReportScheduleView, ServiceError> {
        request.validate()?;
        let frequency = check_frequency(&request.frequency)?;

        let schedule = self
            .repos
            .schedules
            .create(NewReportSchedule {
                user_id: user_id.to_string(),
                frequency,
                report_period: request.report_period.unwrap_or(DEFAULT_REPORT_DAYS),
            })
            .await?;

        info!(user_id, schedule_id = %schedule.id, frequency = %schedule.frequency, "Report schedule created");
        Ok(conversions::convert_to_domain_schedule(schedule))
    }

    async fn update_schedule(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateScheduleRequest,
    ) -> Result<ReportScheduleView, ServiceError> {
        request.validate()?;
        let mut schedule = self.owned_schedule(user_id, id).await?;

        if let Some(frequency) = request.frequency {
            schedule.frequency = check_frequency(&frequency)?;
        }
        if let Some(period) = request.report_period {
            schedule.report_period = period;
        }
        if let Some(active) = request.active {
            schedule.active = active;
        }
        schedule.updated_at = Utc::now();

        self.repos.schedules.update(&schedule).await?;
        Ok(conversions::convert_to_domain_schedule(schedule))
    }

    async fn delete_schedule(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        self.owned_schedule(user_id, id).await?;
        self.repos.schedules.delete(id).await?;
        Ok(())
    }

    async fn active_schedules(&self, frequency: &str) -> Result<Vec<ReportSchedule>, ServiceError> {
        Ok(self.repos.schedules.list_active_by_frequency(frequency).await?)
    }
}
