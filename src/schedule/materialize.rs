//! Event materialization: raw job records to canonical calendar events.
//!
//! Upstream job records arrive with inconsistent field naming (snake_case
//! and camelCase) and free-text date/time fields. This module is the single
//! normalization boundary: [`RawJobRecord`] accepts both conventions via
//! serde aliases, and the [`Materializer`] resolves each record into a
//! [`CalendarEvent`] or rejects it with a typed reason. A malformed record
//! is dropped and flagged, never zero-filled.

use chrono::{NaiveDate, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::types::{Assignment, CalendarEvent, GeoPoint};

// ============================================================================
// Raw Records
// ============================================================================

/// A job record as returned by the data-access collaborator.
///
/// Every field that exists under two naming conventions carries a serde
/// alias, so both shapes deserialize into this one struct and downstream
/// components never see the discrepancy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawJobRecord {
    /// Job identifier.
    #[serde(alias = "jobId")]
    pub id: String,
    /// Scheduled calendar date, as text (`2026-05-04` or `05/04/2026`).
    #[serde(default, alias = "scheduledDate")]
    pub scheduled_date: Option<String>,
    /// Scheduled clock time, as text (`14:30` or `2:30 PM`).
    #[serde(default, alias = "scheduledTime")]
    pub scheduled_time: Option<String>,
    /// Duration in minutes; missing or non-positive falls back to the
    /// configured default.
    #[serde(default, alias = "durationMinutes")]
    pub duration_minutes: Option<i64>,
    /// Job title.
    #[serde(default)]
    pub title: Option<String>,
    /// Client display name, used as a title fallback.
    #[serde(default, alias = "clientName")]
    pub client_name: Option<String>,
    /// Job status (external vocabulary, passed through untouched).
    #[serde(default)]
    pub status: Option<String>,
    /// Property latitude.
    #[serde(default, alias = "propertyLat")]
    pub property_lat: Option<f64>,
    /// Property longitude.
    #[serde(default, alias = "propertyLng")]
    pub property_lng: Option<f64>,
    /// Declared drive-time estimate from home base, in minutes.
    #[serde(default, alias = "driveMinutes")]
    pub drive_minutes: Option<i64>,
    /// Assigned resources.
    #[serde(default, alias = "assignedResources", alias = "assigned_resources")]
    pub assignments: Vec<Assignment>,
}

impl RawJobRecord {
    /// Create a record with the fields every job carries.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scheduled_date: None,
            scheduled_time: None,
            duration_minutes: None,
            title: None,
            client_name: None,
            status: None,
            property_lat: None,
            property_lng: None,
            drive_minutes: None,
            assignments: Vec::new(),
        }
    }

    /// Set the scheduled date text.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.scheduled_date = Some(date.into());
        self
    }

    /// Set the scheduled time text.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.scheduled_time = Some(time.into());
        self
    }

    /// Set the duration in minutes.
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the property coordinates.
    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.property_lat = Some(lat);
        self.property_lng = Some(lng);
        self
    }

    /// Set the declared drive-time estimate.
    pub fn with_drive_minutes(mut self, minutes: i64) -> Self {
        self.drive_minutes = Some(minutes);
        self
    }

    /// Add an assignment.
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// The property coordinates, when both components are present.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.property_lat, self.property_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    /// The primary assignment, falling back to the first listed.
    pub fn primary_assignment(&self) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.primary)
            .or_else(|| self.assignments.first())
    }
}

// ============================================================================
// Rejection Reporting
// ============================================================================

/// Why a record could not be materialized.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RejectReason {
    #[error("scheduled date is missing")]
    MissingDate,

    #[error("scheduled date is unparseable: {0}")]
    InvalidDate(String),

    #[error("scheduled time is missing")]
    MissingTime,

    #[error("scheduled time is unparseable: {0}")]
    InvalidTime(String),

    #[error("no assigned resources")]
    NoAssignments,
}

/// A record dropped during materialization, flagged for the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RejectedRecord {
    /// Id of the dropped job record.
    pub job_id: String,
    /// Why it was dropped.
    pub reason: RejectReason,
}

/// Result of one materialization pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MaterializeOutcome {
    /// Events derived from parseable records, in input order.
    pub events: Vec<CalendarEvent>,
    /// Records dropped with their reasons.
    pub rejected: Vec<RejectedRecord>,
}

impl MaterializeOutcome {
    /// Whether any record was dropped.
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

// ============================================================================
// Materializer
// ============================================================================

/// Pure transform from raw job records to calendar events.
#[derive(Debug, Clone)]
pub struct Materializer {
    default_duration_minutes: i64,
}

impl Materializer {
    /// Create a materializer with the configured default duration.
    pub fn new(default_duration_minutes: i64) -> Self {
        Self {
            default_duration_minutes: default_duration_minutes.max(1),
        }
    }

    /// Materialize a batch of records, attributing each event to its
    /// primary assignment. One bad record never aborts the pass.
    pub fn materialize<'a>(
        &self,
        records: impl IntoIterator<Item = &'a RawJobRecord>,
    ) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();

        for record in records {
            let resource_id = match record.primary_assignment() {
                Some(assignment) => assignment.resource_id.clone(),
                None => {
                    outcome.rejected.push(self.reject(record, RejectReason::NoAssignments));
                    continue;
                }
            };
            match self.resolve(record, resource_id) {
                Ok(event) => outcome.events.push(event),
                Err(reason) => outcome.rejected.push(self.reject(record, reason)),
            }
        }

        outcome
    }

    /// Materialize only the events a given resource is assigned to, in any
    /// assignment slot, attributing them to that resource.
    pub fn materialize_for_resource<'a>(
        &self,
        records: impl IntoIterator<Item = &'a RawJobRecord>,
        resource_id: &str,
    ) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();

        for record in records {
            if !record
                .assignments
                .iter()
                .any(|a| a.resource_id == resource_id)
            {
                continue;
            }
            match self.resolve(record, resource_id.to_string()) {
                Ok(event) => outcome.events.push(event),
                Err(reason) => outcome.rejected.push(self.reject(record, reason)),
            }
        }

        outcome
    }

    fn resolve(
        &self,
        record: &RawJobRecord,
        resource_id: String,
    ) -> std::result::Result<CalendarEvent, RejectReason> {
        let date_text = record
            .scheduled_date
            .as_deref()
            .ok_or(RejectReason::MissingDate)?;
        let date = parse_date(date_text)
            .ok_or_else(|| RejectReason::InvalidDate(date_text.to_string()))?;

        let time_text = record
            .scheduled_time
            .as_deref()
            .ok_or(RejectReason::MissingTime)?;
        let time = parse_clock_time(time_text)
            .ok_or_else(|| RejectReason::InvalidTime(time_text.to_string()))?;

        let duration = record
            .duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(self.default_duration_minutes);

        let title = record
            .title
            .clone()
            .or_else(|| record.client_name.clone())
            .unwrap_or_else(|| format!("Job {}", record.id));

        let mut event =
            CalendarEvent::new(&record.id, title, resource_id, date.and_time(time), duration);
        if let Some(point) = record.location() {
            event = event.with_location(point);
        }
        if let Some(minutes) = record.drive_minutes {
            event = event.with_drive_minutes(minutes);
        }
        Ok(event)
    }

    fn reject(&self, record: &RawJobRecord, reason: RejectReason) -> RejectedRecord {
        warn!(job_id = %record.id, %reason, "dropping unparseable job record");
        RejectedRecord {
            job_id: record.id.clone(),
            reason,
        }
    }
}

// ============================================================================
// Text Parsing
// ============================================================================

/// Parse a scheduled date in either accepted textual form.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .ok()
}

/// Parse a clock time in 24-hour (`HH:MM`) or 12-hour (`h:mm AM/PM`) form,
/// case-insensitively.
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M") {
        return Some(time);
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S") {
        return Some(time);
    }
    let upper = text.to_uppercase();
    NaiveTime::parse_from_str(&upper, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(&upper, "%I:%M%p"))
        .ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn materializer() -> Materializer {
        Materializer::new(60)
    }

    fn record(id: &str) -> RawJobRecord {
        RawJobRecord::new(id)
            .with_date("2026-05-04")
            .with_time("09:00")
            .with_assignment(Assignment::new("r1").primary())
    }

    #[test]
    fn test_accepts_both_naming_conventions() {
        let camel: RawJobRecord = serde_json::from_str(
            r#"{
                "jobId": "j1",
                "scheduledDate": "2026-05-04",
                "scheduledTime": "2:30 PM",
                "durationMinutes": 90,
                "clientName": "Acme Realty",
                "propertyLat": 37.77,
                "propertyLng": -122.42,
                "assignedResources": [{"resourceId": "r1", "isPrimary": true}]
            }"#,
        )
        .unwrap();
        let snake: RawJobRecord = serde_json::from_str(
            r#"{
                "id": "j1",
                "scheduled_date": "2026-05-04",
                "scheduled_time": "2:30 PM",
                "duration_minutes": 90,
                "client_name": "Acme Realty",
                "property_lat": 37.77,
                "property_lng": -122.42,
                "assignments": [{"resource_id": "r1", "is_primary": true}]
            }"#,
        )
        .unwrap();

        for raw in [&camel, &snake] {
            let outcome = materializer().materialize([raw]);
            assert_eq!(outcome.events.len(), 1);
            let event = &outcome.events[0];
            assert_eq!(event.id, "j1");
            assert_eq!(event.resource_id, "r1");
            assert_eq!(event.start.time(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
            assert_eq!(event.duration_minutes(), 90);
            assert!(event.location.is_some());
        }
    }

    #[test]
    fn test_parses_12_and_24_hour_times() {
        assert_eq!(
            parse_clock_time("14:30"),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_clock_time("2:30 PM"),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_clock_time("2:30 pm"),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_clock_time("12:05 AM"),
            NaiveTime::from_hms_opt(0, 5, 0)
        );
        assert_eq!(parse_clock_time("not a time"), None);
    }

    #[test]
    fn test_duration_defaults_when_missing_or_non_positive() {
        let missing = record("j1");
        let zero = record("j2").with_duration(0);
        let negative = record("j3").with_duration(-15);

        let outcome = materializer().materialize([&missing, &zero, &negative]);
        assert_eq!(outcome.events.len(), 3);
        for event in &outcome.events {
            assert_eq!(event.duration_minutes(), 60);
        }
    }

    #[test]
    fn test_all_events_start_before_end() {
        let records = vec![
            record("j1"),
            record("j2").with_duration(15),
            record("j3").with_duration(480),
        ];
        let outcome = materializer().materialize(&records);
        assert!(outcome.events.iter().all(|e| e.start < e.end));
    }

    #[test]
    fn test_unparseable_record_dropped_not_aborting() {
        let good = record("good");
        let no_date = RawJobRecord::new("no-date")
            .with_time("09:00")
            .with_assignment(Assignment::new("r1"));
        let bad_time = record("bad-time").with_time("25:99");
        let also_good = record("also-good").with_time("4:15 pm");

        let outcome = materializer().materialize([&good, &no_date, &bad_time, &also_good]);

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.rejected.len(), 2);
        assert!(outcome.has_rejections());
        assert_eq!(outcome.rejected[0].job_id, "no-date");
        assert_eq!(outcome.rejected[0].reason, RejectReason::MissingDate);
        assert!(matches!(
            outcome.rejected[1].reason,
            RejectReason::InvalidTime(_)
        ));
    }

    #[test]
    fn test_primary_assignment_wins() {
        let raw = RawJobRecord::new("j1")
            .with_date("2026-05-04")
            .with_time("09:00")
            .with_assignment(Assignment::new("second").with_role("assistant"))
            .with_assignment(Assignment::new("lead").with_role("photographer").primary());

        let outcome = materializer().materialize([&raw]);
        assert_eq!(outcome.events[0].resource_id, "lead");
    }

    #[test]
    fn test_materialize_for_resource_matches_any_slot() {
        let raw = record("j1").with_assignment(Assignment::new("r2").with_role("drone"));

        let for_r2 = materializer().materialize_for_resource([&raw], "r2");
        assert_eq!(for_r2.events.len(), 1);
        assert_eq!(for_r2.events[0].resource_id, "r2");

        let for_r3 = materializer().materialize_for_resource([&raw], "r3");
        assert!(for_r3.events.is_empty());
    }
}
