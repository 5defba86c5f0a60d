//! Core types for the scheduling engine.
//!
//! This module defines the canonical shapes shared by the materializer,
//! layout engine, travel estimator and conflict detector.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Geometry
// ============================================================================

/// A latitude/longitude pair (decimal degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another point, in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

// ============================================================================
// Resources and Assignments
// ============================================================================

/// A crew member (photographer, drone pilot, editor) assignable to jobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Color tag used by the UI; carries no scheduling meaning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Home-base coordinates, the starting point for a day's travel plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_base: Option<GeoPoint>,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
            home_base: None,
        }
    }

    /// Set the color tag.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the home-base coordinates.
    pub fn with_home_base(mut self, point: GeoPoint) -> Self {
        self.home_base = Some(point);
        self
    }
}

/// A resource's assignment slot on a job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Assignment {
    /// Assigned resource id.
    #[serde(alias = "resourceId")]
    pub resource_id: String,
    /// Role on the job (e.g. "photographer", "drone").
    #[serde(default)]
    pub role: Option<String>,
    /// Whether this is the primary assignment.
    #[serde(default, alias = "isPrimary", alias = "is_primary")]
    pub primary: bool,
}

impl Assignment {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            role: None,
            primary: false,
        }
    }

    /// Mark as the primary assignment.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

// ============================================================================
// Calendar Events
// ============================================================================

/// A time-bounded calendar event derived from a job record.
///
/// Invariant: `start < end`. The materializer never emits an event with a
/// zero or negative span; unparseable records are rejected instead.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CalendarEvent {
    /// Identifier, equal to the source job's id.
    pub id: String,
    /// Event title.
    pub title: String,
    /// Start instant (wall-clock local; job records carry no timezone).
    pub start: NaiveDateTime,
    /// End instant, always after `start`.
    pub end: NaiveDateTime,
    /// Resource the event is attributed to.
    pub resource_id: String,
    /// Color tag inherited from the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Property coordinates, when the job carries them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Drive-time estimate declared on the job itself (home base to the
    /// property), used for the first leg of a travel plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_minutes: Option<i64>,
}

impl CalendarEvent {
    /// Create an event from a start instant and a positive duration.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        resource_id: impl Into<String>,
        start: NaiveDateTime,
        duration_minutes: i64,
    ) -> Self {
        let duration = duration_minutes.max(1);
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end: start + chrono::Duration::minutes(duration),
            resource_id: resource_id.into(),
            color: None,
            location: None,
            drive_minutes: None,
        }
    }

    /// Set the color tag.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the property coordinates.
    pub fn with_location(mut self, point: GeoPoint) -> Self {
        self.location = Some(point);
        self
    }

    /// Set the declared drive-time estimate.
    pub fn with_drive_minutes(mut self, minutes: i64) -> Self {
        self.drive_minutes = Some(minutes);
        self
    }

    /// Duration of the event in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The calendar day the event starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Half-open overlap test: `[s1,e1)` overlaps `[s2,e2)` iff
    /// `s1 < e2 && s2 < e1`. Back-to-back events do not overlap.
    pub fn overlaps(&self, other: &CalendarEvent) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ============================================================================
// Conflict Detection Types
// ============================================================================

/// A candidate booking to check for double-booking conflicts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookingCandidate {
    /// Scheduled date of the candidate job.
    pub date: NaiveDate,
    /// Scheduled start time.
    pub start_time: NaiveTime,
    /// Duration in minutes; falls back to the configured default when
    /// missing or non-positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    /// Resources being assigned.
    pub resource_ids: Vec<String>,
    /// Id of the job under edit, excluded so a job never conflicts with
    /// its own prior booking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_job_id: Option<String>,
}

impl BookingCandidate {
    pub fn new(date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            duration_minutes: None,
            resource_ids: Vec::new(),
            exclude_job_id: None,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Add an assigned resource.
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_ids.push(resource_id.into());
        self
    }

    /// Exclude a job id (the job under edit).
    pub fn excluding(mut self, job_id: impl Into<String>) -> Self {
        self.exclude_job_id = Some(job_id.into());
        self
    }
}

/// An overlapping assignment for one resource, reported against a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Conflict {
    /// Resource with the double booking.
    pub resource_id: String,
    /// Candidate job id, when the candidate is an existing job under edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_job_id: Option<String>,
    /// The conflicting existing job.
    pub conflicting_job_id: String,
    /// Date of the conflicting job.
    pub conflicting_date: NaiveDate,
    /// Start time of the conflicting job.
    pub conflicting_time: NaiveTime,
}

/// Outcome of a conflict check.
///
/// `Unknown` is distinct from `Clear`: a failed repository query must never
/// be reported as "no conflicts found".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum ConflictStatus {
    /// No overlapping assignments found.
    Clear,
    /// One or more overlapping assignments.
    Conflicts(Vec<Conflict>),
    /// The conflict query failed; booking state could not be verified.
    Unknown(String),
}

impl ConflictStatus {
    /// Whether the check completed and found no conflicts.
    pub fn is_clear(&self) -> bool {
        matches!(self, ConflictStatus::Clear)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_event_duration_and_invariant() {
        let event = CalendarEvent::new("j1", "Shoot", "r1", dt(9, 0), 90);
        assert_eq!(event.duration_minutes(), 90);
        assert!(event.start < event.end);

        // Non-positive durations are clamped so the invariant holds.
        let degenerate = CalendarEvent::new("j2", "Shoot", "r1", dt(9, 0), 0);
        assert!(degenerate.start < degenerate.end);
    }

    #[test]
    fn test_half_open_overlap() {
        let a = CalendarEvent::new("a", "A", "r1", dt(10, 0), 60);
        let b = CalendarEvent::new("b", "B", "r1", dt(10, 30), 60);
        let c = CalendarEvent::new("c", "C", "r1", dt(11, 0), 60);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Back-to-back: a ends exactly when c starts.
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_distance_is_symmetric() {
        let sf = GeoPoint::new(37.7749, -122.4194);
        let oak = GeoPoint::new(37.8044, -122.2712);
        let d1 = sf.distance_km(&oak);
        let d2 = oak.distance_km(&sf);
        assert!((d1 - d2).abs() < 1e-9);
        assert!(d1 > 10.0 && d1 < 20.0);
    }

    #[test]
    fn test_booking_candidate_builder() {
        let candidate = BookingCandidate::new(
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        )
        .with_duration(45)
        .with_resource("r1")
        .with_resource("r2")
        .excluding("job-9");

        assert_eq!(candidate.resource_ids.len(), 2);
        assert_eq!(candidate.exclude_job_id.as_deref(), Some("job-9"));
    }
}
