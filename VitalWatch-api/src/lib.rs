// VitalWatch-api lib.rs
//
// HTTP and WebSocket surface of VitalWatch: the axum router, its handlers
// and the OpenAPI document. The server binary lives in src/bin/main.rs.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
