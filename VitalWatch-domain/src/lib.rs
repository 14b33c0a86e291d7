// VitalWatch Domain
// This crate contains the business logic for patient monitoring: readings,
// alerts, notifications, reports and the background scheduler

// Authentication
pub mod auth;

// Outbound email and SMS
pub mod delivery;

// Domain entities
pub mod entities;

// Live event bus consumed by WebSocket connections
pub mod events;

// Health checks and system status
pub mod health;

// Background reminder and report jobs
pub mod scheduler;

// Services that implement business logic
pub mod services;

// Random readings for demos and the watch companion
pub mod simulator;

// Re-export the database module from the data crate for convenience
pub use vital_watch_data::database;
