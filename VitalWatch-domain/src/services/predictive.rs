//! Predictive insights over a window of readings.
//!
//! Anomalies are readings more than two standard deviations from the window
//! mean; forecasts extrapolate a least-squares line fitted over the reading
//! index. Both need at least ten readings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use vital_watch_data::models::NewAlert;

use crate::entities::alert::ALERT_TYPE_AI_PREDICTION;
use crate::entities::conversions;
use crate::entities::{AnomalyPoint, ForecastPoint, Insight, Prediction, TrendForecast, VitalSignsReading};
use crate::services::analysis::{is_outlier, linear_regression, mean, std_dev, Vital, MIN_ANOMALY_HISTORY};
use crate::services::{NotificationServiceTrait, Repositories, ServiceError};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_FORECAST_HOURS: u32 = 4;

/// Anomalous readings reported, most recent last
const MAX_ANOMALOUS_READINGS: usize = 3;

/// Forecast change, in percent, that becomes a trend insight
const TREND_CHANGE_PERCENT: f64 = 10.0;

#[async_trait]
pub trait InsightServiceTrait {
    async fn detect_anomalies(&self, user_id: &str, hours: i64) -> Result<Vec<AnomalyPoint>, ServiceError>;

    async fn predict_trends(
        &self,
        user_id: &str,
        hours: i64,
        forecast_hours: u32,
    ) -> Result<TrendForecast, ServiceError>;

    /// Build insights, dispatch them and store warnings as alerts
    async fn generate_insights(&self, user_id: &str) -> Result<Vec<Insight>, ServiceError>;
}

/// Readings that deviate from the window, limited to the last three
/// anomalous readings
pub fn detect_anomalies(readings: &[VitalSignsReading]) -> Vec<AnomalyPoint> {
    if readings.len() < MIN_ANOMALY_HISTORY {
        return Vec::new();
    }

    let stats: Vec<(Vital, f64, f64)> = Vital::ALL
        .iter()
        .map(|vital| {
            let values = vital.series(readings);
            (*vital, mean(&values), std_dev(&values))
        })
        .collect();

    let anomalous: Vec<Vec<AnomalyPoint>> = readings
        .iter()
        .map(|reading| {
            stats
                .iter()
                .filter(|(vital, m, s)| is_outlier(vital.value(reading), *m, *s))
                .map(|(vital, m, s)| AnomalyPoint {
                    timestamp: reading.timestamp,
                    vital_sign: vital.key().to_string(),
                    value: vital.value(reading),
                    expected_range: format!("{:.1} - {:.1}", m - s, m + s),
                })
                .collect::<Vec<_>>()
        })
        .filter(|points| !points.is_empty())
        .collect();

    let skip = anomalous.len().saturating_sub(MAX_ANOMALOUS_READINGS);
    anomalous.into_iter().skip(skip).flatten().collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Hourly forecast per vital, extrapolated after the last reading
pub fn predict_trends(readings: &[VitalSignsReading], forecast_hours: u32) -> TrendForecast {
    let mut forecast = TrendForecast::new();
    let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
        return forecast;
    };
    if readings.len() < MIN_ANOMALY_HISTORY {
        return forecast;
    }

    // Readings per hour, from the mean spacing of the window
    let span_secs = (last.timestamp - first.timestamp).num_seconds() as f64;
    let interval_secs = span_secs / (readings.len() - 1) as f64;
    let steps_per_hour = if interval_secs > 0.0 { 3600.0 / interval_secs } else { 1.0 };
    let last_index = (readings.len() - 1) as f64;

    for vital in Vital::ALL {
        let (slope, intercept) = linear_regression(&vital.series(readings));
        let points = (1..=forecast_hours)
            .map(|hour| ForecastPoint {
                timestamp: last.timestamp + Duration::hours(hour as i64),
                value: round1(slope * (last_index + hour as f64 * steps_per_hour) + intercept),
            })
            .collect();
        forecast.insert(vital.key().to_string(), points);
    }
    forecast
}

fn label_for_key(key: &str) -> &str {
    Vital::ALL
        .iter()
        .find(|vital| vital.key() == key)
        .map(|vital| vital.label())
        .unwrap_or(key)
}

/// Turn anomalies and forecasts into human-readable insights
pub fn build_insights(anomalies: &[AnomalyPoint], forecast: &TrendForecast, forecast_hours: u32) -> Vec<Insight> {
    let mut insights: Vec<Insight> = anomalies
        .iter()
        .map(|anomaly| Insight {
            insight_type: "anomaly".to_string(),
            severity: "warning".to_string(),
            message: format!(
                "Unusual {} detected: {:.1} (Expected range: {})",
                label_for_key(&anomaly.vital_sign),
                anomaly.value,
                anomaly.expected_range
            ),
        })
        .collect();

    for (key, points) in forecast {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            continue;
        };
        if first.value == 0.0 {
            continue;
        }
        let change = (last.value - first.value) / first.value * 100.0;
        if change.abs() > TREND_CHANGE_PERCENT {
            let direction = if change > 0.0 { "increase" } else { "decrease" };
            insights.push(Insight {
                insight_type: "trend".to_string(),
                severity: "info".to_string(),
                message: format!(
                    "Predicted {:.1}% {} in {} over next {} hours",
                    change.abs(),
                    direction,
                    label_for_key(key),
                    forecast_hours
                ),
            });
        }
    }

    insights
}

pub struct InsightService {
    repos: Repositories,
    notifications: Arc<dyn NotificationServiceTrait + Send + Sync>,
}

impl InsightService {
    pub fn new(repos: Repositories, notifications: Arc<dyn NotificationServiceTrait + Send + Sync>) -> Self {
        Self { repos, notifications }
    }

    async fn window(&self, user_id: &str, hours: i64) -> Result<Vec<VitalSignsReading>, ServiceError> {
        let since: DateTime<Utc> = Utc::now() - Duration::hours(hours.max(1));
        let readings = self.repos.vitals.get_since(user_id, since).await?;
        Ok(readings.into_iter().map(conversions::convert_to_domain_reading).collect())
    }
}

#[async_trait]
impl InsightServiceTrait for InsightService {
    async fn detect_anomalies(&self, user_id: &str, hours: i64) -> Result<Vec<AnomalyPoint>, ServiceError> {
        let readings = self.window(user_id, hours).await?;
        Ok(detect_anomalies(&readings))
    }

    async fn predict_trends(
        &self,
        user_id: &str,
        hours: i64,
        forecast_hours: u32,
    ) -> Result<TrendForecast, ServiceError> {
        let readings = self.window(user_id, hours).await?;
        Ok(predict_trends(&readings, forecast_hours))
    }

    #[instrument(skip(self))]
    async fn generate_insights(&self, user_id: &str) -> Result<Vec<Insight>, ServiceError> {
        let readings = self.window(user_id, DEFAULT_WINDOW_HOURS).await?;
        let anomalies = detect_anomalies(&readings);
        let forecast = predict_trends(&readings, DEFAULT_FORECAST_HOURS);
        let insights = build_insights(&anomalies, &forecast, DEFAULT_FORECAST_HOURS);

        for insight in &insights {
            let prediction = Prediction::new(insight.insight_type.clone(), insight.message.clone());
            if let Err(e) = self.notifications.handle_prediction(user_id, &prediction).await {
                warn!(user_id, error = %e, "Failed to dispatch insight");
            }

            if insight.severity == "warning" || insight.severity == "danger" {
                self.repos
                    .alerts
                    .create(NewAlert {
                        user_id: user_id.to_string(),
                        alert_type: ALERT_TYPE_AI_PREDICTION.to_string(),
                        message: insight.message.clone(),
                        vital_sign: None,
                        value: None,
                        severity: Some(insight.severity.clone()),
                    })
                    .await?;
            }
        }

        info!(user_id, count = insights.len(), "Insights generated");
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryChannels;
    use crate::events::EventBus;
    use crate::services::analysis::tests::reading;
    use crate::services::test_support::{repositories, seed_user};
    use crate::services::NotificationService;
    use vital_watch_data::models::NewVitalSigns;

    fn hourly(values: &[f64]) -> Vec<VitalSignsReading> {
        let start = Utc::now() - Duration::hours(values.len() as i64);
        values
            .iter()
            .enumerate()
            .map(|(i, hr)| {
                let mut r = reading(*hr, 115.0, 75.0, 36.7, 98.0);
                r.timestamp = start + Duration::hours(i as i64);
                r
            })
            .collect()
    }

    #[test]
    fn test_too_few_readings_yield_nothing() {
        let readings = hourly(&[70.0; 9]);
        assert!(detect_anomalies(&readings).is_empty());
        assert!(predict_trends(&readings, 4).is_empty());
    }

    #[test]
    fn test_detect_anomalies_reports_outliers() {
        let mut values = vec![70.0, 72.0, 71.0, 69.0, 70.0, 71.0, 72.0, 70.0, 69.0, 71.0];
        values.push(130.0);
        let anomalies = detect_anomalies(&hourly(&values));

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].vital_sign, "heart_rate");
        assert_eq!(anomalies[0].value, 130.0);
        assert!(anomalies[0].expected_range.contains(" - "));
    }

    #[test]
    fn test_predict_trends_extrapolates_hourly() {
        let values: Vec<f64> = (0..10).map(|i| 60.0 + 2.0 * i as f64).collect();
        let readings = hourly(&values);
        let forecast = predict_trends(&readings, 4);

        let heart_rate = &forecast["heart_rate"];
        assert_eq!(heart_rate.len(), 4);
        assert_eq!(heart_rate[0].value, 80.0);
        assert_eq!(heart_rate[3].value, 86.0);
        assert_eq!(heart_rate[0].timestamp, readings[9].timestamp + Duration::hours(1));

        assert_eq!(forecast["temperature"][0].value, 36.7);
    }

    #[test]
    fn test_build_insights_messages() {
        let anomaly = AnomalyPoint {
            timestamp: Utc::now(),
            vital_sign: "oxygen_saturation".to_string(),
            value: 88.0,
            expected_range: "96.0 - 99.0".to_string(),
        };
        let mut forecast = TrendForecast::new();
        let now = Utc::now();
        forecast.insert(
            "heart_rate".to_string(),
            vec![
                ForecastPoint { timestamp: now, value: 100.0 },
                ForecastPoint { timestamp: now, value: 85.0 },
            ],
        );

        let insights = build_insights(&[anomaly], &forecast, 4);
        assert_eq!(insights.len(), 2);
        assert_eq!(
            insights[0].message,
            "Unusual oxygen saturation detected: 88.0 (Expected range: 96.0 - 99.0)"
        );
        assert_eq!(insights[0].severity, "warning");
        assert_eq!(
            insights[1].message,
            "Predicted 15.0% decrease in heart rate over next 4 hours"
        );
        assert_eq!(insights[1].insight_type, "trend");
    }

    #[tokio::test]
    async fn test_generate_insights_stores_warning_alerts() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "insights", None).await;

        let start = Utc::now() - Duration::hours(12);
        for i in 0..11 {
            let hr = if i == 10 { 140.0 } else { 70.0 + (i % 3) as f64 };
            repos
                .vitals
                .create(NewVitalSigns {
                    user_id: user_id.clone(),
                    timestamp: Some(start + Duration::hours(i)),
                    heart_rate: hr,
                    blood_pressure_systolic: 115.0,
                    blood_pressure_diastolic: 75.0,
                    temperature: 36.7,
                    oxygen_saturation: 98.0,
                })
                .await
                .unwrap();
        }

        let notifications = Arc::new(NotificationService::new(
            repos.clone(),
            DeliveryChannels::new(EventBus::default()),
        ));
        let service = InsightService::new(repos.clone(), notifications);

        let insights = service.generate_insights(&user_id).await.unwrap();
        assert!(insights.iter().any(|i| i.insight_type == "anomaly"));

        let alerts = repos.alerts.list_unacknowledged(&user_id).await.unwrap();
        assert!(alerts.iter().all(|a| a.alert_type == ALERT_TYPE_AI_PREDICTION));
        assert_eq!(
            alerts.len(),
            insights.iter().filter(|i| i.severity == "warning").count()
        );

        let logs = repos.notifications.list_logs(&user_id, 50).await.unwrap();
        assert_eq!(logs.len(), insights.len());
    }
}
