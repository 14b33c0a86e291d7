// Domain entities and request payloads
pub mod account;
pub mod alert;
pub mod contact;
pub mod conversions;
pub mod emergency;
pub mod medication;
pub mod notification;
pub mod report;
pub mod vitals;

// Re-export common types for easier imports
pub use account::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, ProfileStats,
    RegisterRequest, UpdateMedicalInfoRequest, UpdateProfileRequest, UserProfile,
};
pub use alert::AlertView;
pub use contact::{CreateContactRequest, EmergencyContactView, UpdateContactRequest};
pub use emergency::{EmergencyResult, SosRequest, VitalSnapshot};
pub use medication::{CreateMedicationRequest, MedicationReminder, MedicationView, UpdateMedicationRequest};
pub use notification::{
    DispatchOutcome, NotificationLogView, NotificationPreferences, Prediction, UpdatePreferencesRequest,
};
pub use report::{
    AlertSummary, CreateScheduleRequest, DailyInsight, DownloadFile, HealthReport, ReportScheduleView,
    ReportStats, TimeframeReport, UpdateScheduleRequest, VitalStatistics, VitalStatisticsSummary,
};
pub use vitals::{
    AnomalyPoint, ForecastPoint, Insight, ReadingSource, RecordVitalSignsRequest, RecordVitalsResponse,
    TrendForecast, VitalSignsAnalysis, VitalSignsReading,
};
