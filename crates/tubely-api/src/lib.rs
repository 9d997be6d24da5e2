//! Tubely API
//!
//! HTTP surface of the upload service: bearer-authenticated video and thumbnail uploads,
//! plus asset serving for the local storage backend.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
