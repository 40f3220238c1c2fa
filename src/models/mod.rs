//! Data models for the visitor tracker

pub mod session;
pub mod visitor;

// Re-export commonly used types
pub use session::{Capability, Role, SessionClaims};
pub use visitor::{CheckoutVisit, CreateVisit, Visit, VisitFilter, VisitStatus};
