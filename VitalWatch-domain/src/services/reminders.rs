//! Medication reminders.
//!
//! Each frequency maps to the local hours a dose is due. A check at a given
//! time reminds the user of every active medication due in the current hour,
//! once per medication and hour.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use serde_json::json;
use tracing::{info, warn};

use vital_watch_data::models::{Medication, NewNotificationLog};

use crate::entities::alert::SEVERITY_MEDIUM;
use crate::entities::MedicationReminder;
use crate::events::{names, EventBus, LiveEvent};
use crate::services::{Repositories, ServiceError};

pub const NOTIFICATION_TYPE_REMINDER: &str = "MEDICATION_REMINDER";
const CHANNEL_APP_NOTIFICATION: &str = "APP_NOTIFICATION";

#[async_trait]
pub trait ReminderServiceTrait {
    /// Send the reminders due for one user at `now`
    async fn check_reminders_at(
        &self,
        user_id: &str,
        now: DateTime<Local>,
    ) -> Result<Vec<MedicationReminder>, ServiceError>;

    async fn check_reminders(&self, user_id: &str) -> Result<Vec<MedicationReminder>, ServiceError> {
        self.check_reminders_at(user_id, Local::now()).await
    }

    /// Run the check for every user; returns the number of reminders sent
    async fn check_all_users(&self) -> Result<usize, ServiceError>;
}

/// `"Twice daily"` -> `"twice_daily"`
pub fn normalize_frequency(frequency: &str) -> String {
    frequency.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Local hours at which a dose is due; unknown frequencies have none
pub fn schedule_hours(frequency: &str) -> &'static [u32] {
    match normalize_frequency(frequency).as_str() {
        "once_daily" | "daily" | "weekly" | "monthly" => &[9],
        "twice_daily" => &[9, 21],
        "three_times_daily" => &[9, 14, 21],
        "four_times_daily" => &[8, 12, 16, 20],
        _ => &[],
    }
}

pub fn reminder_message(medication: &Medication) -> String {
    format!("Time to take {} - {}", medication.name, medication.dosage)
}

/// Start of the local hour containing `now`, in UTC
fn hour_start(now: DateTime<Local>) -> DateTime<Utc> {
    let naive = now
        .date_naive()
        .and_hms_opt(now.hour(), 0, 0)
        .unwrap_or_else(|| now.naive_local());
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

pub struct ReminderService {
    repos: Repositories,
    bus: EventBus,
}

impl ReminderService {
    pub fn new(repos: Repositories, bus: EventBus) -> Self {
        Self { repos, bus }
    }
}

#[async_trait]
impl ReminderServiceTrait for ReminderService {
    async fn check_reminders_at(
        &self,
        user_id: &str,
        now: DateTime<Local>,
    ) -> Result<Vec<MedicationReminder>, ServiceError> {
        let hour = now.hour();
        let since = hour_start(now);
        let medications = self.repos.medications.list_active_on(user_id, now.date_naive()).await?;

        let mut reminders = Vec::new();
        for medication in medications {
            if !schedule_hours(&medication.frequency).contains(&hour) {
                continue;
            }

            let already_sent = self
                .repos
                .notifications
                .has_log_since(user_id, NOTIFICATION_TYPE_REMINDER, &medication.id, since)
                .await?;
            if already_sent {
                continue;
            }

            let message = reminder_message(&medication);
            self.repos
                .notifications
                .create_log(NewNotificationLog {
                    user_id: user_id.to_string(),
                    notification_type: NOTIFICATION_TYPE_REMINDER.to_string(),
                    severity: SEVERITY_MEDIUM.to_string(),
                    message: message.clone(),
                    channels: vec![CHANNEL_APP_NOTIFICATION.to_string()],
                    reference_id: Some(medication.id.clone()),
                })
                .await?;

            let reminder = MedicationReminder {
                medication_id: medication.id.clone(),
                name: medication.name.clone(),
                dosage: medication.dosage.clone(),
                scheduled_hour: hour,
                message,
            };
            self.bus.publish(
                LiveEvent::new(user_id, names::MEDICATION_REMINDER).with_payload(json!({
                    "medication_id": reminder.medication_id,
                    "name": reminder.name,
                    "dosage": reminder.dosage,
                    "message": reminder.message,
                })),
            );
            reminders.push(reminder);
        }

        if !reminders.is_empty() {
            info!(user_id, count = reminders.len(), "Medication reminders sent");
        }
        Ok(reminders)
    }

    async fn check_all_users(&self) -> Result<usize, ServiceError> {
        let now = Local::now();
        let mut sent = 0;
        for user in self.repos.users.list().await? {
            match self.check_reminders_at(&user.id, now).await {
                Ok(reminders) => sent += reminders.len(),
                Err(e) => warn!(user_id = %user.id, error = %e, "Medication reminder check failed"),
            }
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{repositories, seed_user};
    use chrono::NaiveDate;
    use vital_watch_data::models::NewMedication;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap())
            .earliest()
            .unwrap()
    }

    async fn add_medication(repos: &Repositories, user_id: &str, name: &str, frequency: &str) {
        repos
            .medications
            .create(NewMedication {
                user_id: user_id.to_string(),
                name: name.to_string(),
                dosage: "5mg".to_string(),
                frequency: frequency.to_string(),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: None,
                instructions: None,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_schedule_hours() {
        assert_eq!(schedule_hours("Once daily"), &[9]);
        assert_eq!(schedule_hours("twice-daily"), &[9, 21]);
        assert_eq!(schedule_hours("THREE TIMES DAILY"), &[9, 14, 21]);
        assert_eq!(schedule_hours("four_times_daily"), &[8, 12, 16, 20]);
        assert_eq!(schedule_hours("weekly"), &[9]);
        assert!(schedule_hours("as needed").is_empty());
    }

    #[tokio::test]
    async fn test_due_medications_are_reminded_once_per_hour() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "reminded", None).await;
        add_medication(&repos, &user_id, "Metformin", "twice daily").await;
        add_medication(&repos, &user_id, "Vitamin D", "four times daily").await;

        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let service = ReminderService::new(repos.clone(), bus);

        let evening = local(2024, 3, 5, 21, 15);
        let reminders = service.check_reminders_at(&user_id, evening).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].name, "Metformin");
        assert_eq!(events.try_recv().unwrap().event, names::MEDICATION_REMINDER);

        // Logs written by the first check are newer than the start of that hour
        let again = service.check_reminders_at(&user_id, local(2024, 3, 5, 21, 45)).await.unwrap();
        assert!(again.is_empty());

        let noon = service.check_reminders_at(&user_id, local(2024, 3, 5, 12, 0)).await.unwrap();
        assert_eq!(noon.len(), 1);
        assert_eq!(noon[0].name, "Vitamin D");
    }

    #[tokio::test]
    async fn test_reminder_log_and_message() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "logged", None).await;
        add_medication(&repos, &user_id, "Atorvastatin", "once daily").await;
        let service = ReminderService::new(repos.clone(), EventBus::default());

        let reminders = service.check_reminders_at(&user_id, local(2024, 6, 1, 9, 30)).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].message, "Time to take Atorvastatin - 5mg");
        assert_eq!(reminders[0].scheduled_hour, 9);

        let logs = repos.notifications.list_logs(&user_id, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].notification_type, NOTIFICATION_TYPE_REMINDER);
        assert_eq!(logs[0].severity, SEVERITY_MEDIUM);
        assert_eq!(logs[0].channels, vec![CHANNEL_APP_NOTIFICATION]);
        assert_eq!(logs[0].reference_id.as_deref(), Some(reminders[0].medication_id.as_str()));

        assert!(service
            .check_reminders_at(&user_id, local(2024, 6, 1, 10, 0))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_identical_medications_are_reminded_separately() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "twins", None).await;
        add_medication(&repos, &user_id, "Insulin", "once daily").await;
        add_medication(&repos, &user_id, "Insulin", "once daily").await;
        let service = ReminderService::new(repos, EventBus::default());

        let reminders = service.check_reminders_at(&user_id, local(2024, 6, 1, 9, 10)).await.unwrap();
        assert_eq!(reminders.len(), 2);
        assert_ne!(reminders[0].medication_id, reminders[1].medication_id);
        assert_eq!(reminders[0].message, reminders[1].message);

        let again = service.check_reminders_at(&user_id, local(2024, 6, 1, 9, 40)).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_medication_outside_its_dates_is_skipped() {
        let (_pool, repos) = repositories();
        let user_id = seed_user(&repos, "ended", None).await;
        add_medication(&repos, &user_id, "Old", "once daily").await;
        let service = ReminderService::new(repos, EventBus::default());

        let before_start = local(2019, 12, 31, 9, 0);
        assert!(service.check_reminders_at(&user_id, before_start).await.unwrap().is_empty());
    }
}
