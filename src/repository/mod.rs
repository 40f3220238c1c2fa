//! Repository layer for database operations

#[cfg(test)]
pub mod memory;
pub mod visitors;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use visitors::{PgVisitorStore, VisitorStore};

/// Main repository struct holding the record stores
#[derive(Clone)]
pub struct Repository {
    pub visitors: Arc<dyn VisitorStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visitors: Arc::new(PgVisitorStore::new(pool)),
        }
    }

    /// Repository over an arbitrary visitor store
    pub fn with_store(visitors: Arc<dyn VisitorStore>) -> Self {
        Self { visitors }
    }
}
