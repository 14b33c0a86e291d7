// VitalWatch Data
// This crate owns the SQLite storage for patients, readings and notifications

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
