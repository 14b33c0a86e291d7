use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use vital_watch_data::repository::AlertRepositoryTrait;

use crate::entities::conversions;
use crate::entities::AlertView;
use crate::services::ServiceError;

/// Trait for alert operations
#[async_trait]
pub trait AlertServiceTrait {
    /// Unacknowledged alerts, newest first
    async fn list_active(&self, user_id: &str) -> Result<Vec<AlertView>, ServiceError>;

    async fn acknowledge(&self, user_id: &str, id: &str) -> Result<AlertView, ServiceError>;
}

pub struct AlertService<R: AlertRepositoryTrait> {
    repository: R,
}

impl<R: AlertRepositoryTrait + Send + Sync> AlertService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: AlertRepositoryTrait + Send + Sync> AlertServiceTrait for AlertService<R> {
    async fn list_active(&self, user_id: &str) -> Result<Vec<AlertView>, ServiceError> {
        let alerts = self.repository.list_unacknowledged(user_id).await?;
        Ok(alerts.into_iter().map(conversions::convert_to_domain_alert).collect())
    }

    async fn acknowledge(&self, user_id: &str, id: &str) -> Result<AlertView, ServiceError> {
        let mut alert = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Alert not found".to_string()))?;
        if alert.user_id != user_id {
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }

        let now = Utc::now();
        self.repository.acknowledge(id, now).await?;
        alert.acknowledged = true;
        alert.acknowledged_at = Some(now);

        info!(user_id, alert_id = id, "Alert acknowledged");
        Ok(conversions::convert_to_domain_alert(alert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{repositories, seed_user};
    use vital_watch_data::models::NewAlert;
    use vital_watch_data::repository::AlertRepository;

    #[tokio::test]
    async fn test_acknowledge_flow() {
        let (pool, repos) = repositories();
        let owner = seed_user(&repos, "alert-owner", None).await;
        let stranger = seed_user(&repos, "alert-stranger", None).await;
        let service = AlertService::new(AlertRepository::new(pool));

        let alert = repos
            .alerts
            .create(NewAlert {
                user_id: owner.clone(),
                alert_type: "vital_signs".to_string(),
                message: "Health concerns detected: High heart rate: 120.0".to_string(),
                vital_sign: Some("multiple".to_string()),
                value: None,
                severity: Some("MEDIUM".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(service.list_active(&owner).await.unwrap().len(), 1);
        assert!(matches!(
            service.acknowledge(&stranger, &alert.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.acknowledge(&owner, "missing").await,
            Err(ServiceError::NotFound(_))
        ));

        let acknowledged = service.acknowledge(&owner, &alert.id).await.unwrap();
        assert!(acknowledged.acknowledged);
        assert!(acknowledged.acknowledged_at.is_some());
        assert!(service.list_active(&owner).await.unwrap().is_empty());
    }
}
