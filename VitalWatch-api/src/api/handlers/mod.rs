pub mod accounts;
pub mod alerts;
pub mod contacts;
pub mod emergency;
pub mod export;
pub mod health;
pub mod insights;
pub mod medications;
pub mod notifications;
pub mod reports;
pub mod vitals;
pub mod watch;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use health::{health_check, initialize_server_start_time};
