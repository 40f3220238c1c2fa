//! Visitors repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::visitor::{CreateVisit, Visit, VisitFilter, VisitStatus},
};

/// Durable storage of visit records.
///
/// Every read path hides soft-deleted rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Insert a new open visit
    async fn create(&self, data: &CreateVisit, check_in_time: DateTime<Utc>) -> AppResult<Visit>;

    /// Fetch a live visit
    async fn get(&self, id: i32) -> AppResult<Visit>;

    /// Live visits matching `filter`, newest check-in first
    async fn list(&self, filter: &VisitFilter) -> AppResult<Vec<Visit>>;

    /// Stamp the exit time. Re-closing overwrites the previous timestamp.
    async fn close(&self, id: i32, at: DateTime<Utc>) -> AppResult<Visit>;

    /// Hide a visit from every query without erasing it
    async fn soft_delete(&self, id: i32) -> AppResult<()>;

    /// Check that the backing store answers
    async fn ping(&self) -> AppResult<()>;
}

pub(crate) fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Visitor with id {} not found", id))
}

#[derive(Clone)]
pub struct PgVisitorStore {
    pool: Pool<Postgres>,
}

impl PgVisitorStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitorStore for PgVisitorStore {
    async fn create(&self, data: &CreateVisit, check_in_time: DateTime<Utc>) -> AppResult<Visit> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visitors (name, email, phone, purpose, host_name, company, visitor_type,
                                  check_in_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.purpose)
        .bind(&data.host_name)
        .bind(&data.company)
        .bind(&data.visitor_type)
        .bind(check_in_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i32) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visitors WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn list(&self, filter: &VisitFilter) -> AppResult<Vec<Visit>> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut idx = 1;

        match filter.status {
            Some(VisitStatus::Open) => conditions.push("check_out_time IS NULL".to_string()),
            Some(VisitStatus::Closed) => conditions.push("check_out_time IS NOT NULL".to_string()),
            None => {}
        }
        if filter.from.is_some() {
            conditions.push(format!("check_in_time >= ${}", idx));
            idx += 1;
        }
        if filter.to.is_some() {
            conditions.push(format!("check_in_time < ${}", idx));
        }

        let query = format!(
            "SELECT * FROM visitors WHERE {} ORDER BY check_in_time DESC, id DESC",
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Visit>(&query);
        if let Some(from) = filter.from {
            builder = builder.bind(from);
        }
        if let Some(to) = filter.to {
            builder = builder.bind(to);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn close(&self, id: i32, at: DateTime<Utc>) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visitors
            SET check_out_time = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE visitors SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
