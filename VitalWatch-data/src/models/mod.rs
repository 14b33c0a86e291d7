// Storage models, one module per table

pub mod alert;
pub mod contact;
pub mod medication;
pub mod notification;
pub mod report_schedule;
pub mod user;
pub mod vital_signs;

pub use alert::{Alert, NewAlert};
pub use contact::{EmergencyContact, NewEmergencyContact};
pub use medication::{Medication, NewMedication};
pub use notification::{NewNotificationLog, NotificationLog, NotificationPreference};
pub use report_schedule::{NewReportSchedule, ReportSchedule};
pub use user::{NewUser, User};
pub use vital_signs::{NewVitalSigns, VitalSigns};
