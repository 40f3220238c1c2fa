//! Business logic services

pub mod analytics;
pub mod export;
pub mod visitors;

use crate::{config::ReportingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, reporting: &ReportingConfig) -> Self {
        Self {
            visitors: visitors::VisitorsService::new(repository, reporting.utc_offset()),
        }
    }
}
