//! CSV and JSON exports of a user's readings and alerts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

use crate::entities::conversions;
use crate::entities::{AlertView, DownloadFile, VitalSignsReading};
use crate::services::{Repositories, ServiceError};

pub const DEFAULT_EXPORT_DAYS: u32 = 30;
/// Longest window an export covers
pub const MAX_EXPORT_DAYS: u32 = 365;
pub const CSV_TYPE_REQUIRED: &str = "CSV export requires specifying data type (vitals or alerts)";
pub const UNSUPPORTED_FORMAT: &str = "Unsupported export format";

#[async_trait]
pub trait ExportServiceTrait {
    /// Render `format` (`csv` or `json`) over the last `days` days
    async fn export(
        &self,
        user_id: &str,
        format: &str,
        data_type: Option<&str>,
        days: u32,
    ) -> Result<DownloadFile, ServiceError>;
}

#[derive(Serialize)]
struct VitalsRow {
    timestamp: String,
    heart_rate: f64,
    blood_pressure_systolic: f64,
    blood_pressure_diastolic: f64,
    temperature: f64,
    oxygen_saturation: f64,
}

#[derive(Serialize)]
struct AlertRow<'a> {
    timestamp: String,
    alert_type: &'a str,
    message: &'a str,
    vital_sign: &'a str,
    value: Option<f64>,
    severity: &'a str,
    acknowledged: bool,
}

fn csv_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ServiceError::Internal(format!("CSV write failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Readings oldest first, one row each
pub fn vitals_csv(readings: &[VitalSignsReading]) -> Result<String, ServiceError> {
    write_csv(readings.iter().map(|r| VitalsRow {
        timestamp: csv_timestamp(r.timestamp),
        heart_rate: r.heart_rate,
        blood_pressure_systolic: r.blood_pressure_systolic,
        blood_pressure_diastolic: r.blood_pressure_diastolic,
        temperature: r.temperature,
        oxygen_saturation: r.oxygen_saturation,
    }))
}

pub fn alerts_csv(alerts: &[AlertView]) -> Result<String, ServiceError> {
    write_csv(alerts.iter().map(|a| AlertRow {
        timestamp: csv_timestamp(a.timestamp),
        alert_type: &a.alert_type,
        message: &a.message,
        vital_sign: a.vital_sign.as_deref().unwrap_or_default(),
        value: a.value,
        severity: a.severity.as_deref().unwrap_or_default(),
        acknowledged: a.acknowledged,
    }))
}

pub struct ExportService {
    repos: Repositories,
}

impl ExportService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn readings(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<VitalSignsReading>, ServiceError> {
        let readings = self.repos.vitals.get_since(user_id, since).await?;
        Ok(readings.into_iter().map(conversions::convert_to_domain_reading).collect())
    }

    async fn alerts(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<AlertView>, ServiceError> {
        let alerts = self.repos.alerts.list_since(user_id, since).await?;
        Ok(alerts.into_iter().map(conversions::convert_to_domain_alert).collect())
    }
}

#[async_trait]
impl ExportServiceTrait for ExportService {
    async fn export(
        &self,
        user_id: &str,
        format: &str,
        data_type: Option<&str>,
        days: u32,
    ) -> Result<DownloadFile, ServiceError> {
        let now = Utc::now();
        let days = days.clamp(1, MAX_EXPORT_DAYS);
        let since = now - Duration::days(days as i64);
        let stamp = now.format("%Y%m%d");

        match format.to_lowercase().as_str() {
            "csv" => match data_type.map(str::to_lowercase).as_deref() {
                Some("vitals") => Ok(DownloadFile {
                    filename: format!("vital_signs_{}.csv", stamp),
                    content_type: "text/csv",
                    body: vitals_csv(&self.readings(user_id, since).await?)?,
                }),
                Some("alerts") => Ok(DownloadFile {
                    filename: format!("alerts_{}.csv", stamp),
                    content_type: "text/csv",
                    body: alerts_csv(&self.alerts(user_id, since).await?)?,
                }),
                _ => Err(ServiceError::Validation(CSV_TYPE_REQUIRED.to_string())),
            },
            "json" => {
                let document = json!({
                    "vital_signs": self.readings(user_id, since).await?,
                    "alerts": self.alerts(user_id, since).await?,
                    "metadata": {
                        "user_id": user_id,
                        "export_date": now,
                        "period_days": days,
                    },
                });
                let body = serde_json::to_string_pretty(&document)
                    .map_err(|e| ServiceError::Internal(e.to_string()))?;
                Ok(DownloadFile {
                    filename: format!("health_data_{}.json", stamp),
                    content_type: "application/json",
                    body,
                })
            }
            _ => Err(ServiceError::Validation(UNSUPPORTED_FORMAT.to_string())),
        }
    }
}
