//! Visitor Tracker
//!
//! REST JSON server for a front-desk visitor log: check-ins, check-outs,
//! CSV reports and dashboard analytics derived from the visit records.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
