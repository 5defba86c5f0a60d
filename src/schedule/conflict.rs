//! Double-booking detection for candidate bookings.
//!
//! The detector is advisory and read-only: it reports overlapping
//! assignments but never blocks a save. Whether to warn, require an
//! acknowledgment or refuse is the caller's decision. Two callers racing
//! the same check can still double-book; preventing that needs an
//! optimistic version check or advisory lock in the persistence layer.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::error::Result;
use crate::repository::JobRepository;

use super::materialize::{parse_clock_time, parse_date, RawJobRecord};
use super::types::{BookingCandidate, Conflict};

/// Detects overlapping assignments for a candidate booking.
pub struct ConflictDetector<R: JobRepository> {
    repo: Arc<R>,
    default_duration_minutes: i64,
}

impl<R: JobRepository> ConflictDetector<R> {
    /// Create a detector over the given repository.
    pub fn new(repo: Arc<R>, default_duration_minutes: i64) -> Self {
        Self {
            repo,
            default_duration_minutes: default_duration_minutes.max(1),
        }
    }

    /// Check a candidate against every assigned resource's existing jobs on
    /// the candidate date.
    ///
    /// Overlap rule: `[s1,e1)` and `[s2,e2)` conflict iff `s1 < e2 && s2 <
    /// e1` — back-to-back bookings do not conflict. The candidate's
    /// `exclude_job_id` is skipped so an edited job never conflicts with its
    /// own prior booking. A repository failure propagates as an error;
    /// callers must treat it as "conflict status unknown", not as clear.
    pub async fn check(&self, candidate: &BookingCandidate) -> Result<Vec<Conflict>> {
        let duration = candidate
            .duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(self.default_duration_minutes);
        let candidate_start = candidate.date.and_time(candidate.start_time);
        let candidate_end = candidate_start + Duration::minutes(duration);

        let mut conflicts = Vec::new();
        for resource_id in &candidate.resource_ids {
            let existing = self
                .repo
                .jobs_for_resource_on(resource_id, candidate.date)
                .await?;

            for record in &existing {
                if candidate.exclude_job_id.as_deref() == Some(record.id.as_str()) {
                    continue;
                }
                // A record without a parseable schedule occupies no time range.
                let Some((date, time)) = record_schedule(record) else {
                    continue;
                };
                let existing_duration = record
                    .duration_minutes
                    .filter(|d| *d > 0)
                    .unwrap_or(self.default_duration_minutes);
                let existing_start = date.and_time(time);
                let existing_end = existing_start + Duration::minutes(existing_duration);

                if candidate_start < existing_end && existing_start < candidate_end {
                    debug!(
                        resource_id = %resource_id,
                        conflicting_job_id = %record.id,
                        "candidate booking overlaps an existing assignment"
                    );
                    conflicts.push(Conflict {
                        resource_id: resource_id.clone(),
                        candidate_job_id: candidate.exclude_job_id.clone(),
                        conflicting_job_id: record.id.clone(),
                        conflicting_date: date,
                        conflicting_time: time,
                    });
                }
            }
        }

        Ok(conflicts)
    }
}

fn record_schedule(record: &RawJobRecord) -> Option<(chrono::NaiveDate, chrono::NaiveTime)> {
    let date = record.scheduled_date.as_deref().and_then(parse_date)?;
    let time = record.scheduled_time.as_deref().and_then(parse_clock_time)?;
    Some((date, time))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryJobRepository;
    use crate::schedule::types::Assignment;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn detector_with(
        records: Vec<RawJobRecord>,
    ) -> ConflictDetector<InMemoryJobRepository> {
        let repo = InMemoryJobRepository::new();
        for record in records {
            repo.add_job(record).await;
        }
        ConflictDetector::new(Arc::new(repo), 60)
    }

    fn booked(id: &str, time_text: &str, duration: i64, resource: &str) -> RawJobRecord {
        RawJobRecord::new(id)
            .with_date("2026-05-04")
            .with_time(time_text)
            .with_duration(duration)
            .with_assignment(Assignment::new(resource).primary())
    }

    #[tokio::test]
    async fn test_overlapping_booking_conflicts() {
        let detector = detector_with(vec![booked("j1", "10:00", 60, "r1")]).await;

        // [10:30, 11:30) vs [10:00, 11:00) overlaps.
        let candidate = BookingCandidate::new(date(), time(10, 30))
            .with_duration(60)
            .with_resource("r1");
        let conflicts = detector.check(&candidate).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflicting_job_id, "j1");
        assert_eq!(conflicts[0].resource_id, "r1");
        assert_eq!(conflicts[0].conflicting_time, time(10, 0));
    }

    #[tokio::test]
    async fn test_back_to_back_is_not_a_conflict() {
        let detector = detector_with(vec![booked("j1", "10:00", 60, "r1")]).await;

        // [11:00, 12:00) starts exactly when j1 ends.
        let candidate = BookingCandidate::new(date(), time(11, 0))
            .with_duration(60)
            .with_resource("r1");
        let conflicts = detector.check(&candidate).await.unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_different_resource_does_not_conflict() {
        let detector = detector_with(vec![booked("j1", "10:00", 60, "r1")]).await;

        let candidate = BookingCandidate::new(date(), time(10, 0))
            .with_duration(60)
            .with_resource("r2");
        let conflicts = detector.check(&candidate).await.unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_edit_excludes_own_prior_booking() {
        let detector = detector_with(vec![
            booked("editing", "10:00", 60, "r1"),
            booked("other", "10:30", 60, "r1"),
        ])
        .await;

        let candidate = BookingCandidate::new(date(), time(10, 0))
            .with_duration(60)
            .with_resource("r1")
            .excluding("editing");
        let conflicts = detector.check(&candidate).await.unwrap();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflicting_job_id, "other");
        assert_eq!(conflicts[0].candidate_job_id.as_deref(), Some("editing"));
    }

    #[tokio::test]
    async fn test_multiple_resources_each_reported() {
        let detector = detector_with(vec![
            booked("j1", "10:00", 60, "r1"),
            booked("j2", "10:15", 60, "r2"),
        ])
        .await;

        let candidate = BookingCandidate::new(date(), time(10, 30))
            .with_duration(30)
            .with_resource("r1")
            .with_resource("r2");
        let conflicts = detector.check(&candidate).await.unwrap();
        assert_eq!(conflicts.len(), 2);
    }

    #[tokio::test]
    async fn test_candidate_duration_defaults() {
        let detector = detector_with(vec![booked("j1", "10:45", 30, "r1")]).await;

        // No duration: defaults to 60, so [10:00, 11:00) reaches j1.
        let candidate = BookingCandidate::new(date(), time(10, 0)).with_resource("r1");
        let conflicts = detector.check(&candidate).await.unwrap();
        assert_eq!(conflicts.len(), 1);
    }
}
