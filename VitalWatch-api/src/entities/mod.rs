// Public entities for the VitalWatch API
// Query parameters and small response bodies that only exist at the HTTP boundary;
// request and response payloads otherwise come from the domain crate

// Query parameters and common responses
pub mod common;

pub use common::{
    DaysQuery, ExportQuery, HistoryQuery, MessageResponse, PredictionQuery, ReportQuery, SimulateQuery,
    WindowQuery,
};
