//! Visitor lifecycle service

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use validator::Validate;

use crate::{
    api::{
        analytics::{AnalyticsResponse, Window},
        visitors::DailyLogResponse,
    },
    error::{AppError, AppResult},
    models::visitor::{CreateVisit, Visit, VisitFilter, VisitStatus},
    repository::Repository,
};

use super::{analytics, export};

#[derive(Clone)]
pub struct VisitorsService {
    repository: Repository,
    offset: FixedOffset,
}

impl VisitorsService {
    pub fn new(repository: Repository, offset: FixedOffset) -> Self {
        Self { repository, offset }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Check a visitor in, stamping the entry time
    pub async fn create(&self, data: CreateVisit) -> AppResult<Visit> {
        let data = data.normalized();
        data.validate()?;

        let visit = self.repository.visitors.create(&data, Utc::now()).await?;
        tracing::info!(visit_id = visit.id, purpose = %visit.purpose, "Visitor checked in");
        Ok(visit)
    }

    /// Get a live visit
    pub async fn get(&self, id: i32) -> AppResult<Visit> {
        self.repository.visitors.get(id).await
    }

    /// List live visits, optionally by status
    pub async fn list(&self, status: Option<VisitStatus>) -> AppResult<Vec<Visit>> {
        self.repository
            .visitors
            .list(&VisitFilter {
                status,
                ..Default::default()
            })
            .await
    }

    /// Visitors still on premises
    pub async fn active(&self) -> AppResult<Vec<Visit>> {
        self.list(Some(VisitStatus::Open)).await
    }

    /// Close a visit at `at` (default now).
    ///
    /// An already closed visit is closed again with the new time.
    pub async fn check_out(&self, id: i32, at: Option<DateTime<Utc>>) -> AppResult<Visit> {
        let visit = self.repository.visitors.get(id).await?;
        let at = at.unwrap_or_else(Utc::now);

        if at < visit.check_in_time {
            return Err(AppError::invalid_field(
                "check_out_time",
                "Check-out time cannot be before check-in time",
            ));
        }
        if !visit.is_open() {
            tracing::warn!(visit_id = id, "Visit was already checked out, overwriting exit time");
        }

        let visit = self.repository.visitors.close(id, at).await?;
        tracing::info!(visit_id = id, "Visitor checked out");
        Ok(visit)
    }

    /// Soft-delete a visit
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.visitors.soft_delete(id).await?;
        tracing::info!(visit_id = id, "Visit deleted");
        Ok(())
    }

    fn day_start(&self, date: NaiveDate) -> AppResult<DateTime<Utc>> {
        analytics::local_day_start(date, self.offset)
            .ok_or_else(|| AppError::Validation(format!("Date {} is out of range", date)))
    }

    /// Start of the local day after `date`
    fn day_end(&self, date: NaiveDate) -> AppResult<DateTime<Utc>> {
        let next = date
            .succ_opt()
            .ok_or_else(|| AppError::Validation(format!("Date {} is out of range", date)))?;
        self.day_start(next)
    }

    /// CSV of live visits, optionally limited to local days `start..=end`
    pub async fn export_csv(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<u8>> {
        let filter = VisitFilter {
            status: None,
            from: start.map(|d| self.day_start(d)).transpose()?,
            to: end.map(|d| self.day_end(d)).transpose()?,
        };
        let visits = self.repository.visitors.list(&filter).await?;
        tracing::debug!(rows = visits.len(), "Exporting visitors report");

        export::write_csv(&visits, self.offset)
    }

    /// Dashboard statistics for a window, evaluated now
    pub async fn analytics(&self, window: Window) -> AppResult<AnalyticsResponse> {
        let visits = self.list(None).await?;
        Ok(analytics::analyze(&visits, window, self.now()))
    }

    /// Visits of a local day (default today) with the day's counts
    pub async fn daily_log(
        &self,
        date: Option<NaiveDate>,
        status: Option<VisitStatus>,
    ) -> AppResult<DailyLogResponse> {
        let date = date.unwrap_or_else(|| self.now().date_naive());
        let filter = VisitFilter {
            status: None,
            from: Some(self.day_start(date)?),
            to: Some(self.day_end(date)?),
        };
        let visits = self.repository.visitors.list(&filter).await?;

        Ok(analytics::daily_log(visits, date, status, self.offset))
    }

    /// Readiness of the backing store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.visitors.ping().await
    }
}
