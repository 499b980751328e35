//! Guardián Financiero
//!
//! Application core of an elder-focused financial-safety prototype:
//! - Screen router with a closed transition table and a session gate
//! - One deferred-action primitive behind every simulated delay
//! - PIN / biometric login stub over a key-value store
//! - In-memory stores for contacts, documents, goals, services and the ledger
//! - Serialisable view models per screen, served over a REST API
//!
//! FLOW:
//! ACTION → VALIDATE → SCHEDULE → (delay) → EVENT → STATE → VIEW

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod deferred;
pub mod error;
pub mod models;
pub mod navigation;
pub mod security;
pub mod state;
pub mod stores;
pub mod views;
pub mod voice;

pub use error::Result;

// Re-export common types
pub use app::{ActionHandle, GuardianApp};
pub use config::AppConfig;
pub use error::GuardianError;
pub use models::*;
