//! In-memory visitor store used by service and router tests

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::visitor::{CreateVisit, Visit, VisitFilter},
};

use super::visitors::{not_found, VisitorStore};

#[derive(Default)]
pub struct MemoryVisitorStore {
    rows: Mutex<Vec<Visit>>,
}

impl MemoryVisitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, deleted ones included
    pub fn raw_rows(&self) -> Vec<Visit> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisitorStore for MemoryVisitorStore {
    async fn create(&self, data: &CreateVisit, check_in_time: DateTime<Utc>) -> AppResult<Visit> {
        let mut rows = self.rows.lock().unwrap();
        let visit = Visit {
            id: rows.len() as i32 + 1,
            name: data.name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            purpose: data.purpose.clone(),
            host_name: data.host_name.clone(),
            company: data.company.clone(),
            visitor_type: data.visitor_type.clone(),
            check_in_time,
            check_out_time: None,
            created_at: check_in_time,
            updated_at: check_in_time,
            deleted_at: None,
        };
        rows.push(visit.clone());
        Ok(visit)
    }

    async fn get(&self, id: i32) -> AppResult<Visit> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id && v.deleted_at.is_none())
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list(&self, filter: &VisitFilter) -> AppResult<Vec<Visit>> {
        let mut visits: Vec<Visit> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.deleted_at.is_none() && filter.matches(v))
            .cloned()
            .collect();
        visits.sort_by(|a, b| {
            b.check_in_time
                .cmp(&a.check_in_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(visits)
    }

    async fn close(&self, id: i32, at: DateTime<Utc>) -> AppResult<Visit> {
        let mut rows = self.rows.lock().unwrap();
        let visit = rows
            .iter_mut()
            .find(|v| v.id == id && v.deleted_at.is_none())
            .ok_or_else(|| not_found(id))?;
        visit.check_out_time = Some(at);
        visit.updated_at = Utc::now();
        Ok(visit.clone())
    }

    async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let visit = rows
            .iter_mut()
            .find(|v| v.id == id && v.deleted_at.is_none())
            .ok_or_else(|| not_found(id))?;
        visit.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
