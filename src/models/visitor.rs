//! Visitor visit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Open/closed state of a visit, derived from `check_out_time`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    /// Visitor presumed on premises
    Open,
    /// Visitor checked out
    Closed,
}

/// One row per check-in event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    /// Reason for the visit
    pub purpose: String,
    /// Person being visited
    pub host_name: Option<String>,
    pub company: Option<String>,
    /// Visitor category (Parent, Donor, Trustee, ...)
    pub visitor_type: Option<String>,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Visit {
    pub fn status(&self) -> VisitStatus {
        if self.check_out_time.is_some() {
            VisitStatus::Closed
        } else {
            VisitStatus::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == VisitStatus::Open
    }

    /// Visit length in minutes (fractional), closed visits only
    pub fn duration_minutes(&self) -> Option<f64> {
        self.check_out_time
            .map(|out| (out - self.check_in_time).num_seconds() as f64 / 60.0)
    }
}

/// Check-in request
///
/// Required fields default to empty so a missing key is reported per field
/// rather than as a body parse failure.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateVisit {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "Phone is required (max 20 characters)"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Purpose is required (max 255 characters)"))]
    pub purpose: String,
    #[validate(length(max = 255, message = "Host name must be at most 255 characters"))]
    pub host_name: Option<String>,
    #[validate(length(max = 255, message = "Company must be at most 255 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 255, message = "Visitor type must be at most 255 characters"))]
    pub visitor_type: Option<String>,
}

impl CreateVisit {
    /// Trim every field; blank optional fields become absent
    pub fn normalized(self) -> Self {
        fn opt(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.trim().to_string(),
            email: opt(self.email),
            phone: self.phone.trim().to_string(),
            purpose: self.purpose.trim().to_string(),
            host_name: opt(self.host_name),
            company: opt(self.company),
            visitor_type: opt(self.visitor_type),
        }
    }
}

/// Check-out request; the exit time defaults to now
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutVisit {
    pub check_out_time: Option<DateTime<Utc>>,
}

/// Store-level list filter. The default filter returns every live visit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    /// Inclusive lower bound on check-in time
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on check-in time
    pub to: Option<DateTime<Utc>>,
}

impl VisitFilter {
    pub fn matches(&self, visit: &Visit) -> bool {
        self.status.map_or(true, |s| visit.status() == s)
            && self.from.map_or(true, |from| visit.check_in_time >= from)
            && self.to.map_or(true, |to| visit.check_in_time < to)
    }
}

/// Query parameters for listing visits
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    /// open or closed
    pub status: Option<VisitStatus>,
}
