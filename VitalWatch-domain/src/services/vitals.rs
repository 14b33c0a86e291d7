use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use vital_watch_data::models::{NewAlert, NewVitalSigns};

use crate::entities::alert::{ALERT_TYPE_AI_PREDICTION, SEVERITY_HIGH, SEVERITY_MEDIUM};
use crate::entities::conversions;
use crate::entities::{
    AlertView, ReadingSource, RecordVitalSignsRequest, RecordVitalsResponse, SosRequest, VitalSignsAnalysis,
    VitalSignsReading,
};
use crate::events::{names, EventBus, LiveEvent};
use crate::services::analysis::{analyze_vital_signs, HISTORY_WINDOW};
use crate::services::{EmergencyServiceTrait, Repositories, ServiceError};
use crate::simulator;

pub const DEFAULT_HISTORY_HOURS: i64 = 24;

pub const NO_DATA_MESSAGE: &str = "No vital signs data available";

/// Trait for vital-sign operations
#[async_trait]
pub trait VitalsServiceTrait {
    /// Validate, store and analyse a reading
    async fn record(
        &self,
        user_id: &str,
        request: RecordVitalSignsRequest,
        source: ReadingSource,
    ) -> Result<RecordVitalsResponse, ServiceError>;

    async fn latest(&self, user_id: &str) -> Result<VitalSignsReading, ServiceError>;

    /// Readings from the last `hours` hours, oldest first
    async fn history(&self, user_id: &str, hours: i64) -> Result<Vec<VitalSignsReading>, ServiceError>;

    /// Analyse the latest reading and store an AI_PREDICTION alert when it needs one
    async fn analyze(&self, user_id: &str) -> Result<VitalSignsAnalysis, ServiceError>;

    /// Record a generated reading
    async fn simulate(&self, user_id: &str, abnormal: bool) -> Result<RecordVitalsResponse, ServiceError>;
}

/// Request fields as an unsaved reading, for range checks
pub(crate) fn request_to_reading(request: &RecordVitalSignsRequest) -> VitalSignsReading {
    VitalSignsReading {
        id: String::new(),
        user_id: String::new(),
        timestamp: request.timestamp.unwrap_or_else(Utc::now),
        heart_rate: request.heart_rate,
        blood_pressure_systolic: request.blood_pressure_systolic,
        blood_pressure_diastolic: request.blood_pressure_diastolic,
        temperature: request.temperature,
        oxygen_saturation: request.oxygen_saturation,
    }
}

/// Severity of the alert raised for an analysis
pub fn alert_severity(analysis: &VitalSignsAnalysis) -> &'static str {
    if !analysis.anomalies.is_empty() || analysis.is_critical() {
        SEVERITY_HIGH
    } else {
        SEVERITY_MEDIUM
    }
}

fn concerns(analysis: &VitalSignsAnalysis) -> String {
    analysis
        .alerts
        .iter()
        .chain(analysis.anomalies.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct VitalsService {
    repos: Repositories,
    emergency: Arc<dyn EmergencyServiceTrait + Send + Sync>,
    bus: EventBus,
}

impl VitalsService {
    pub fn new(repos: Repositories, emergency: Arc<dyn EmergencyServiceTrait + Send + Sync>, bus: EventBus) -> Self {
        Self { repos, emergency, bus }
    }

    fn validate_request(&self, request: &RecordVitalSignsRequest) -> Result<(), ServiceError> {
        request.validate()?;

        if request.blood_pressure_systolic <= request.blood_pressure_diastolic {
            return Err(ServiceError::Validation(
                "Systolic pressure must be greater than diastolic pressure".to_string(),
            ));
        }
        Ok(())
    }

    async fn store_alert(
        &self,
        user_id: &str,
        alert_type: &str,
        message: String,
        severity: &str,
    ) -> Result<AlertView, ServiceError> {
        let alert = self
            .repos
            .alerts
            .create(NewAlert {
                user_id: user_id.to_string(),
                alert_type: alert_type.to_string(),
                message,
                vital_sign: Some("multiple".to_string()),
                value: None,
                severity: Some(severity.to_string()),
            })
            .await?;
        Ok(conversions::convert_to_domain_alert(alert))
    }

    async fn recent_history(&self, user_id: &str) -> Result<Vec<VitalSignsReading>, ServiceError> {
        let history = self.repos.vitals.get_recent(user_id, HISTORY_WINDOW).await?;
        Ok(history.into_iter().map(conversions::convert_to_domain_reading).collect())
    }
}

#[async_trait]
impl VitalsServiceTrait for VitalsService {
    #[instrument(skip(self, request))]
    async fn record(
        &self,
        user_id: &str,
        request: RecordVitalSignsRequest,
        source: ReadingSource,
    ) -> Result<RecordVitalsResponse, ServiceError> {
        self.validate_request(&request)?;

        let stored = self
            .repos
            .vitals
            .create(NewVitalSigns {
                user_id: user_id.to_string(),
                timestamp: request.timestamp,
                heart_rate: request.heart_rate,
                blood_pressure_systolic: request.blood_pressure_systolic,
                blood_pressure_diastolic: request.blood_pressure_diastolic,
                temperature: request.temperature,
                oxygen_saturation: request.oxygen_saturation,
            })
            .await?;
        let reading = conversions::convert_to_domain_reading(stored);

        // A back-dated reading is analysed on its own rather than as the newest one
        let mut history = self.recent_history(user_id).await?;
        if history.last().map(|r| r.id.as_str()) != Some(reading.id.as_str()) {
            history.retain(|r| r.id != reading.id);
            history.push(reading.clone());
        }
        let analysis = analyze_vital_signs(&history);

        let alert = if analysis.needs_alert() {
            let message = format!("{}{}", source.alert_prefix(), concerns(&analysis));
            Some(
                self.store_alert(user_id, source.alert_type(), message, alert_severity(&analysis))
                    .await?,
            )
        } else {
            None
        };

        let mut emergency_triggered = false;
        if analysis.is_critical() {
            let request = SosRequest {
                message: Some(format!(
                    "Critical vital signs detected: {}",
                    analysis.critical_concerns.join(", ")
                )),
                location: None,
                vital_signs: Some(conversions::convert_to_snapshot(&reading)),
            };
            match self.emergency.handle_emergency(user_id, request).await {
                Ok(result) => emergency_triggered = result.success,
                Err(e) => warn!(user_id, error = %e, "Emergency workflow for critical vitals failed"),
            }
        }

        self.bus.publish(LiveEvent::new(user_id, names::VITAL_SIGNS_UPDATE).with_payload(json!({
            "vital_signs": reading,
            "alerts": analysis.alerts,
        })));

        info!(user_id, status = %analysis.status, ?source, "Vital signs recorded");

        Ok(RecordVitalsResponse {
            reading,
            analysis,
            alert,
            emergency_triggered,
        })
    }

    async fn latest(&self, user_id: &str) -> Result<VitalSignsReading, ServiceError> {
        self.repos
            .vitals
            .get_latest(user_id)
            .await?
            .map(conversions::convert_to_domain_reading)
            .ok_or_else(|| ServiceError::NotFound(NO_DATA_MESSAGE.to_string()))
    }

    async fn history(&self, user_id: &str, hours: i64) -> Result<Vec<VitalSignsReading>, ServiceError> {
        if hours <= 0 {
            return Err(ServiceError::Validation("hours: Must be a positive number".to_string()));
        }
        let since = Utc::now() - Duration::hours(hours);
        let readings = self.repos.vitals.get_since(user_id, since).await?;
        Ok(readings.into_iter().map(conversions::convert_to_domain_reading).collect())
    }

    #[instrument(skip(self))]
    async fn analyze(&self, user_id: &str) -> Result<VitalSignsAnalysis, ServiceError> {
        let history = self.recent_history(user_id).await?;
        if history.is_empty() {
            return Err(ServiceError::NotFound(NO_DATA_MESSAGE.to_string()));
        }

        let analysis = analyze_vital_signs(&history);
        if analysis.needs_alert() {
            let message = format!("AI Analysis: {}", concerns(&analysis));
            self.store_alert(user_id, ALERT_TYPE_AI_PREDICTION, message, alert_severity(&analysis))
                .await?;
        }
        Ok(analysis)
    }

    async fn simulate(&self, user_id: &str, abnormal: bool) -> Result<RecordVitalsResponse, ServiceError> {
        let request = simulator::generate_reading(&mut rand::thread_rng(), abnormal);
        self.record(user_id, request, ReadingSource::Simulated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryChannels;
    use crate::entities::alert::ALERT_TYPE_EMERGENCY;
    use crate::services::test_support::{repositories, seed_user, vitals_request};
    use crate::services::EmergencyService;
    use vital_watch_data::models::NewEmergencyContact;

    fn service(repos: &Repositories, bus: EventBus) -> VitalsService {
        let emergency = Arc::new(EmergencyService::new(repos.clone(), DeliveryChannels::new(bus.clone())));
        VitalsService::new(repos.clone(), emergency, bus)
    }

    #[tokio::test]
    async fn test_normal_reading_is_stored_without_alert() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "normal", None).await;
        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let service = service(&repos, bus);

        let response = service
            .record(&user_id, vitals_request(72.0, 118.0, 76.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap();

        assert_eq!(response.analysis.status, "normal");
        assert!(response.alert.is_none());
        assert!(!response.emergency_triggered);

        let latest = service.latest(&user_id).await.unwrap();
        assert_eq!(latest.id, response.reading.id);

        let event = events.try_recv().unwrap();
        assert_eq!(event.event, names::VITAL_SIGNS_UPDATE);
        assert_eq!(event.payload["vital_signs"]["heart_rate"], 72.0);
    }

    #[tokio::test]
    async fn test_out_of_range_reading_raises_medium_alert() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "high", None).await;
        let service = service(&repos, EventBus::default());

        let response = service
            .record(&user_id, vitals_request(120.0, 118.0, 76.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap();

        let alert = response.alert.unwrap();
        assert_eq!(alert.alert_type, "vital_signs");
        assert_eq!(alert.vital_sign.as_deref(), Some("multiple"));
        assert_eq!(alert.severity.as_deref(), Some(SEVERITY_MEDIUM));
        assert_eq!(alert.message, "Health concerns detected: High heart rate: 120.0");
    }

    #[tokio::test]
    async fn test_watch_reading_uses_watch_alert() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "watch", None).await;
        let service = service(&repos, EventBus::default());

        let response = service
            .record(&user_id, vitals_request(72.0, 118.0, 76.0, 36.7, 93.0), ReadingSource::Watch)
            .await
            .unwrap();

        let alert = response.alert.unwrap();
        assert_eq!(alert.alert_type, "WATCH_ALERT");
        assert!(alert.message.starts_with("Health concerns detected via watch: "));
    }

    #[tokio::test]
    async fn test_critical_reading_triggers_emergency() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "critical", None).await;
        repos
            .contacts
            .create(NewEmergencyContact {
                user_id: user_id.clone(),
                name: "Bob".to_string(),
                relationship: None,
                phone: "+15550009".to_string(),
                email: None,
            })
            .await
            .unwrap();
        let service = service(&repos, EventBus::default());

        let response = service
            .record(&user_id, vitals_request(160.0, 118.0, 76.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap();

        assert!(response.emergency_triggered);
        assert_eq!(response.alert.unwrap().severity.as_deref(), Some(SEVERITY_HIGH));

        let alerts = repos.alerts.list_unacknowledged(&user_id).await.unwrap();
        let emergency = alerts.iter().find(|a| a.alert_type == ALERT_TYPE_EMERGENCY).unwrap();
        assert!(emergency.message.contains("Critical vital signs detected: Critical heart rate: 160.0"));
    }

    #[tokio::test]
    async fn test_critical_reading_without_contacts_still_records() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "alone", None).await;
        let service = service(&repos, EventBus::default());

        let response = service
            .record(&user_id, vitals_request(35.0, 118.0, 76.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap();

        assert!(!response.emergency_triggered);
        assert!(response.alert.is_some());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "invalid", None).await;
        let service = service(&repos, EventBus::default());

        let err = service
            .record(&user_id, vitals_request(300.0, 118.0, 76.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "heart_rate: Heart rate must be between 20 and 250");

        let err = service
            .record(&user_id, vitals_request(72.0, 80.0, 90.0, 36.7, 98.0), ReadingSource::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_analyze_without_data_is_not_found() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "empty", None).await;
        let service = service(&repos, EventBus::default());

        let err = service.analyze(&user_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.message(), NO_DATA_MESSAGE);
        assert!(matches!(service.latest(&user_id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_analyze_stores_prediction_alert() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "analyze", None).await;
        let service = service(&repos, EventBus::default());
        service
            .record(&user_id, vitals_request(72.0, 118.0, 76.0, 38.0, 98.0), ReadingSource::Manual)
            .await
            .unwrap();

        let analysis = service.analyze(&user_id).await.unwrap();
        assert_eq!(analysis.alerts, vec!["High temperature: 38.0"]);

        let alerts = repos.alerts.list_unacknowledged(&user_id).await.unwrap();
        assert!(alerts.iter().any(|a| a.alert_type == ALERT_TYPE_AI_PREDICTION));
    }

    #[tokio::test]
    async fn test_history_and_simulation() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "sim", None).await;
        let service = service(&repos, EventBus::default());

        let normal = service.simulate(&user_id, false).await.unwrap();
        assert!(normal.alert.is_none());
        let abnormal = service.simulate(&user_id, true).await.unwrap();
        assert!(!abnormal.emergency_triggered);

        let history = service.history(&user_id, DEFAULT_HISTORY_HOURS).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp <= history[1].timestamp);
    }
}
