//! Conversion functions between storage models and domain entities.
//!
//! Functions follow the `convert_to_[target]_[model]` naming used across
//! the domain layer.

use vital_watch_data::models;

use super::account::UserProfile;
use super::alert::AlertView;
use super::contact::EmergencyContactView;
use super::emergency::VitalSnapshot;
use super::medication::MedicationView;
use super::notification::{NotificationLogView, NotificationPreferences};
use super::report::ReportScheduleView;
use super::vitals::VitalSignsReading;

pub fn convert_to_domain_profile(user: &models::User) -> UserProfile {
    UserProfile {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        phone: user.phone.clone(),
        medical_conditions: user.medical_conditions.clone(),
        allergies: user.allergies.clone(),
        blood_type: user.blood_type.clone(),
        date_of_birth: user.date_of_birth,
        gender: user.gender.clone(),
        created_at: user.created_at,
    }
}

pub fn convert_to_domain_reading(reading: models::VitalSigns) -> VitalSignsReading {
    VitalSignsReading {
        id: reading.id,
        user_id: reading.user_id,
        timestamp: reading.timestamp,
        heart_rate: reading.heart_rate,
        blood_pressure_systolic: reading.blood_pressure_systolic,
        blood_pressure_diastolic: reading.blood_pressure_diastolic,
        temperature: reading.temperature,
        oxygen_saturation: reading.oxygen_saturation,
    }
}

pub fn convert_to_snapshot(reading: &VitalSignsReading) -> VitalSnapshot {
    VitalSnapshot {
        heart_rate: reading.heart_rate,
        blood_pressure_systolic: reading.blood_pressure_systolic,
        blood_pressure_diastolic: reading.blood_pressure_diastolic,
        temperature: reading.temperature,
        oxygen_saturation: reading.oxygen_saturation,
    }
}

pub fn convert_to_domain_alert(alert: models::Alert) -> AlertView {
    AlertView {
        id: alert.id,
        timestamp: alert.timestamp,
        alert_type: alert.alert_type,
        message: alert.message,
        vital_sign: alert.vital_sign,
        value: alert.value,
        severity: alert.severity,
        acknowledged: alert.acknowledged,
        acknowledged_at: alert.acknowledged_at,
    }
}

pub fn convert_to_domain_contact(contact: models::EmergencyContact) -> EmergencyContactView {
    EmergencyContactView {
        id: contact.id,
        name: contact.name,
        relationship: contact.relationship,
        phone: contact.phone,
        email: contact.email,
    }
}

pub fn convert_to_domain_medication(medication: models::Medication) -> MedicationView {
    MedicationView {
        id: medication.id,
        name: medication.name,
        dosage: medication.dosage,
        frequency: medication.frequency,
        start_date: medication.start_date,
        end_date: medication.end_date,
        instructions: medication.instructions,
        created_at: medication.created_at,
    }
}

pub fn convert_to_domain_preferences(preferences: models::NotificationPreference) -> NotificationPreferences {
    NotificationPreferences {
        email_enabled: preferences.email_enabled,
        sms_enabled: preferences.sms_enabled,
        quiet_hours_start: preferences.quiet_hours_start,
        quiet_hours_end: preferences.quiet_hours_end,
        updated_at: preferences.updated_at,
    }
}

pub fn convert_to_domain_log(log: models::NotificationLog) -> NotificationLogView {
    NotificationLogView {
        id: log.id,
        notification_type: log.notification_type,
        severity: log.severity,
        message: log.message,
        channels: log.channels,
        timestamp: log.timestamp,
    }
}

pub fn convert_to_domain_schedule(schedule: models::ReportSchedule) -> ReportScheduleView {
    ReportScheduleView {
        id: schedule.id,
        frequency: schedule.frequency,
        report_period: schedule.report_period,
        active: schedule.active,
        created_at: schedule.created_at,
        updated_at: schedule.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_convert_to_domain_reading_keeps_values() {
        let data = models::VitalSigns {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            timestamp: Utc::now(),
            heart_rate: 72.0,
            blood_pressure_systolic: 118.0,
            blood_pressure_diastolic: 76.0,
            temperature: 36.7,
            oxygen_saturation: 98.0,
        };

        let reading = convert_to_domain_reading(data.clone());
        assert_eq!(reading.id, data.id);
        assert_eq!(reading.timestamp, data.timestamp);
        assert_eq!(reading.temperature, 36.7);

        let snapshot = convert_to_snapshot(&reading);
        assert_eq!(snapshot.blood_pressure_systolic, 118.0);
    }

    #[test]
    fn test_convert_to_domain_log_keeps_channels() {
        let log = models::NotificationLog {
            id: "l1".to_string(),
            user_id: "u1".to_string(),
            notification_type: "EMERGENCY".to_string(),
            severity: "HIGH".to_string(),
            message: "Emergency alert sent to Bob".to_string(),
            channels: vec!["sms".to_string(), "email".to_string()],
            reference_id: Some("c1".to_string()),
            timestamp: Utc::now(),
        };

        let view = convert_to_domain_log(log);
        assert_eq!(view.channels, vec!["sms", "email"]);
    }
}
