//! Job and resource repository abstraction.
//!
//! The scheduling core never talks to the hosted database directly; it reads
//! raw job records and resources through this trait. Production wires in a
//! data-access adapter, tests supply [`InMemoryJobRepository`] fixtures —
//! there is no module-level sample data acting as implicit global state.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::schedule::materialize::{parse_date, RawJobRecord};
use crate::schedule::types::Resource;

// ============================================================================
// JobRepository Trait
// ============================================================================

/// Read-only access to job records and resources.
///
/// All writes happen through external CRUD flows; the core only queries.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Raw job records scheduled within `[start, end]` (inclusive).
    ///
    /// Records whose scheduled date cannot be parsed belong to no day;
    /// implementations should still return them so the materializer can
    /// flag them instead of silently losing them.
    async fn jobs_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawJobRecord>>;

    /// Raw job records on `date` with `resource_id` in their assignment list.
    async fn jobs_for_resource_on(
        &self,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<RawJobRecord>>;

    /// All known resources.
    async fn resources(&self) -> Result<Vec<Resource>>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// In-memory repository used as a test fixture and for local development.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<Vec<RawJobRecord>>,
    resources: RwLock<Vec<Resource>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job record.
    pub async fn add_job(&self, record: RawJobRecord) {
        self.jobs.write().await.push(record);
    }

    /// Add a resource.
    pub async fn add_resource(&self, resource: Resource) {
        self.resources.write().await.push(resource);
    }

    /// Remove a job by id. Returns whether a record was removed.
    pub async fn remove_job(&self, id: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        jobs.len() != before
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn jobs_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawJobRecord>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .iter()
            .filter(|record| {
                match record.scheduled_date.as_deref().and_then(parse_date) {
                    Some(date) => date >= start && date <= end,
                    // Unparseable dates pass through for the materializer to flag.
                    None => true,
                }
            })
            .cloned()
            .collect())
    }

    async fn jobs_for_resource_on(
        &self,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<RawJobRecord>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .iter()
            .filter(|record| {
                record.scheduled_date.as_deref().and_then(parse_date) == Some(date)
                    && record
                        .assignments
                        .iter()
                        .any(|a| a.resource_id == resource_id)
            })
            .cloned()
            .collect())
    }

    async fn resources(&self) -> Result<Vec<Resource>> {
        Ok(self.resources.read().await.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
