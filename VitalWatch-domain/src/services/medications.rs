use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::info;
use validator::Validate;

use vital_watch_data::models::{Medication, NewMedication};
use vital_watch_data::repository::MedicationRepositoryTrait;

use crate::entities::conversions;
use crate::entities::{CreateMedicationRequest, MedicationView, UpdateMedicationRequest};
use crate::services::ServiceError;

/// Trait for medication operations
#[async_trait]
pub trait MedicationServiceTrait {
    async fn list(&self, user_id: &str) -> Result<Vec<MedicationView>, ServiceError>;

    async fn create(&self, user_id: &str, request: CreateMedicationRequest) -> Result<MedicationView, ServiceError>;

    async fn get(&self, user_id: &str, id: &str) -> Result<MedicationView, ServiceError>;

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateMedicationRequest,
    ) -> Result<MedicationView, ServiceError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), ServiceError>;

    /// Medications whose date range includes `date`
    async fn active_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<MedicationView>, ServiceError>;

    async fn active_today(&self, user_id: &str) -> Result<Vec<MedicationView>, ServiceError> {
        self.active_on(user_id, Local::now().date_naive()).await
    }
}

fn check_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match end {
        Some(end) if end < start => Err(ServiceError::Validation(
            "end_date: End date cannot be before start date".to_string(),
        )),
        _ => Ok(()),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct MedicationService<R: MedicationRepositoryTrait> {
    repository: R,
}

impl<R: MedicationRepositoryTrait + Send + Sync> MedicationService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    async fn owned(&self, user_id: &str, id: &str) -> Result<Medication, ServiceError> {
        let medication = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Medication not found".to_string()))?;
        if medication.user_id != user_id {
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }
        Ok(medication)
    }
}

#[async_trait]
impl<R: MedicationRepositoryTrait + Send + Sync> MedicationServiceTrait for MedicationService<R> {
    async fn list(&self, user_id: &str) -> Result<Vec<MedicationView>, ServiceError> {
        let medications = self.repository.list_by_user(user_id).await?;
        Ok(medications.into_iter().map(conversions::convert_to_domain_medication).collect())
    }

    async fn create(&self, user_id: &str, request: CreateMedicationRequest) -> Result<MedicationView, ServiceError> {
        request.validate()?;
        check_dates(request.start_date, request.end_date)?;

        let medication = self
            .repository
            .create(NewMedication {
                user_id: user_id.to_string(),
                name: request.name.trim().to_string(),
                dosage: request.dosage.trim().to_string(),
                frequency: request.frequency.trim().to_string(),
                start_date: request.start_date,
                end_date: request.end_date,
                instructions: optional(request.instructions),
            })
            .await?;

        info!(user_id, medication_id = %medication.id, "Medication added");
        Ok(conversions::convert_to_domain_medication(medication))
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<MedicationView, ServiceError> {
        self.owned(user_id, id).await.map(conversions::convert_to_domain_medication)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateMedicationRequest,
    ) -> Result<MedicationView, ServiceError> {
        request.validate()?;
        let mut medication = self.owned(user_id, id).await?;

        if let Some(name) = request.name {
            medication.name = name.trim().to_string();
        }
        if let Some(dosage) = request.dosage {
            medication.dosage = dosage.trim().to_string();
        }
        if let Some(frequency) = request.frequency {
            medication.frequency = frequency.trim().to_string();
        }
        if let Some(start_date) = request.start_date {
            medication.start_date = start_date;
        }
        if request.end_date.is_some() {
            medication.end_date = request.end_date;
        }
        if request.instructions.is_some() {
            medication.instructions = optional(request.instructions);
        }
        check_dates(medication.start_date, medication.end_date)?;

        self.repository.update(&medication).await?;
        Ok(conversions::convert_to_domain_medication(medication))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        self.owned(user_id, id).await?;
        self.repository.delete(id).await?;
        info!(user_id, medication_id = id, "Medication deleted");
        Ok(())
    }

    async fn active_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<MedicationView>, ServiceError> {
        let medications = self.repository.list_active_on(user_id, date).await?;
        Ok(medications.into_iter().map(conversions::convert_to_domain_medication).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{repositories, seed_user};
    use vital_watch_data::repository::MedicationRepository;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(name: &str, start: NaiveDate, end: Option<NaiveDate>) -> CreateMedicationRequest {
        CreateMedicationRequest {
            name: name.to_string(),
            dosage: "10mg".to_string(),
            frequency: "Twice daily".to_string(),
            start_date: start,
            end_date: end,
            instructions: Some("With food".to_string()),
        }
    }

    #[tokio::test]
    async fn test_medication_crud_and_active_window() {
        let (pool, repos) = repositories();
        let owner = seed_user(&repos, "meds", None).await;
        let stranger = seed_user(&repos, "not-meds", None).await;
        let service = MedicationService::new(MedicationRepository::new(pool));

        let lisinopril = service
            .create(&owner, request("Lisinopril", date(2024, 1, 1), None))
            .await
            .unwrap();
        service
            .create(&owner, request("Amoxicillin", date(2024, 1, 1), Some(date(2024, 1, 10))))
            .await
            .unwrap();

        let active = service.active_on(&owner, date(2024, 1, 10)).await.unwrap();
        assert_eq!(active.len(), 2);
        let active = service.active_on(&owner, date(2024, 1, 11)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Lisinopril");
        assert!(service.active_on(&owner, date(2023, 12, 31)).await.unwrap().is_empty());

        assert!(matches!(
            service.get(&stranger, &lisinopril.id).await,
            Err(ServiceError::Forbidden(_))
        ));

        let updated = service
            .update(
                &owner,
                &lisinopril.id,
                UpdateMedicationRequest {
                    dosage: Some("20mg".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.dosage, "20mg");
        assert_eq!(updated.frequency, "Twice daily");

        service.delete(&owner, &lisinopril.id).await.unwrap();
        assert_eq!(service.list(&owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_end_date_before_start_is_rejected() {
        let (pool, repos) = repositories();
        let owner = seed_user(&repos, "dates", None).await;
        let service = MedicationService::new(MedicationRepository::new(pool));

        let err = service
            .create(&owner, request("Aspirin", date(2024, 2, 1), Some(date(2024, 1, 1))))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let created = service.create(&owner, request("Aspirin", date(2024, 2, 1), None)).await.unwrap();
        let err = service
            .update(
                &owner,
                &created.id,
                UpdateMedicationRequest {
                    end_date: Some(date(2024, 1, 15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
