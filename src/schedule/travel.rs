//! Travel-time estimation for a resource's day.
//!
//! The estimate is a straight-line heuristic (great-circle distance scaled
//! by a configured minutes-per-km constant), isolated behind the
//! [`TravelTimeProvider`] trait so a real routing API can be substituted
//! without touching the layout engine or conflict detector.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TravelConfig;

use super::types::{CalendarEvent, GeoPoint, Resource};

// ============================================================================
// Provider Trait
// ============================================================================

/// Capability for estimating travel time between two points.
pub trait TravelTimeProvider: Send + Sync {
    /// Estimated travel minutes from one point to another. Never negative.
    fn estimate_minutes(&self, from: GeoPoint, to: GeoPoint) -> i64;
}

/// Straight-line distance estimator: haversine kilometres scaled by a fixed
/// minutes-per-km constant. A placeholder for real routing.
#[derive(Debug, Clone)]
pub struct StraightLineEstimator {
    minutes_per_km: f64,
}

impl StraightLineEstimator {
    pub fn new(minutes_per_km: f64) -> Self {
        Self { minutes_per_km }
    }

    pub fn from_config(config: &TravelConfig) -> Self {
        Self::new(config.minutes_per_km)
    }
}

impl TravelTimeProvider for StraightLineEstimator {
    fn estimate_minutes(&self, from: GeoPoint, to: GeoPoint) -> i64 {
        (from.distance_km(&to) * self.minutes_per_km).round().max(0.0) as i64
    }
}

// ============================================================================
// Travel Plan Types
// ============================================================================

/// Where a travel leg begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LegStart {
    /// The resource's home base.
    HomeBase,
    /// A preceding event, by event id.
    Event(String),
}

/// One travel segment between consecutive locations in a resource's day.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TravelLeg {
    /// Leg origin.
    pub from: LegStart,
    /// Destination event id.
    pub to: String,
    /// Estimated minutes; `None` when either endpoint lacks coordinates.
    /// Unknown legs are excluded from the plan total, never counted as 0.
    pub minutes: Option<i64>,
}

/// A resource's travel summary for one day.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayTravelPlan {
    /// The resource the plan belongs to.
    pub resource_id: String,
    /// Legs in visit order.
    pub legs: Vec<TravelLeg>,
    /// Sum of all known legs.
    pub total_minutes: i64,
    /// Whether any leg could not be estimated.
    pub incomplete: bool,
}

// ============================================================================
// Plan Computation
// ============================================================================

/// Compute the day's travel plan for a resource.
///
/// Events are visited in (start, id) order; the tie-break makes the plan
/// deterministic across runs. The first leg runs from the resource's home
/// base and prefers the job's own declared drive-time estimate over the
/// provider.
///
/// Adding an event never decreases the total of the other legs. The one
/// exception to overall monotonicity: a new earliest event redefines the
/// home leg, and its declared drive-time estimate (which always wins over
/// the provider) may be smaller than the home leg it replaces.
pub fn day_travel_plan(
    resource: &Resource,
    events: &[CalendarEvent],
    provider: &dyn TravelTimeProvider,
) -> DayTravelPlan {
    let mut ordered: Vec<&CalendarEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut legs = Vec::with_capacity(ordered.len());
    let mut previous: Option<&CalendarEvent> = None;

    for event in ordered {
        let leg = match previous {
            None => TravelLeg {
                from: LegStart::HomeBase,
                to: event.id.clone(),
                minutes: first_leg_minutes(resource, event, provider),
            },
            Some(prev) => TravelLeg {
                from: LegStart::Event(prev.id.clone()),
                to: event.id.clone(),
                minutes: match (prev.location, event.location) {
                    (Some(from), Some(to)) => Some(provider.estimate_minutes(from, to)),
                    _ => None,
                },
            },
        };
        legs.push(leg);
        previous = Some(event);
    }

    let total_minutes = legs.iter().filter_map(|l| l.minutes).sum();
    let incomplete = legs.iter().any(|l| l.minutes.is_none());
    debug!(
        resource_id = %resource.id,
        legs = legs.len(),
        total_minutes,
        incomplete,
        "computed day travel plan"
    );

    DayTravelPlan {
        resource_id: resource.id.clone(),
        legs,
        total_minutes,
        incomplete,
    }
}

fn first_leg_minutes(
    resource: &Resource,
    event: &CalendarEvent,
    provider: &dyn TravelTimeProvider,
) -> Option<i64> {
    if let Some(declared) = event.drive_minutes {
        return Some(declared.max(0));
    }
    match (resource.home_base, event.location) {
        (Some(home), Some(to)) => Some(provider.estimate_minutes(home, to)),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: &str, hour: u32, minute: u32) -> CalendarEvent {
        let start = NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        CalendarEvent::new(id, format!("Shoot {id}"), "r1", start, 60)
    }

    fn crew() -> Resource {
        Resource::new("r1", "Alex").with_home_base(GeoPoint::new(37.70, -122.40))
    }

    fn estimator() -> StraightLineEstimator {
        StraightLineEstimator::new(2.0)
    }

    #[test]
    fn test_three_job_day_sums_known_legs() {
        let resource = crew();
        let events = vec![
            event("j1", 9, 0).with_location(GeoPoint::new(37.72, -122.40)),
            event("j2", 10, 30).with_location(GeoPoint::new(37.75, -122.41)),
            event("j3", 13, 0).with_location(GeoPoint::new(37.80, -122.43)),
        ];

        let plan = day_travel_plan(&resource, &events, &estimator());

        assert_eq!(plan.legs.len(), 3);
        assert!(!plan.incomplete);
        assert_eq!(plan.legs[0].from, LegStart::HomeBase);
        assert_eq!(plan.legs[1].from, LegStart::Event("j1".to_string()));
        assert_eq!(plan.legs[2].from, LegStart::Event("j2".to_string()));
        assert!(plan.legs.iter().all(|l| l.minutes.unwrap() >= 0));
        let expected: i64 = plan.legs.iter().map(|l| l.minutes.unwrap()).sum();
        assert_eq!(plan.total_minutes, expected);
    }

    #[test]
    fn test_declared_drive_minutes_wins_for_first_leg() {
        let resource = crew();
        let events = vec![event("j1", 9, 0)
            .with_location(GeoPoint::new(37.72, -122.40))
            .with_drive_minutes(25)];

        let plan = day_travel_plan(&resource, &events, &estimator());
        assert_eq!(plan.legs[0].minutes, Some(25));
    }

    #[test]
    fn test_missing_coordinates_give_unknown_leg_not_zero() {
        let resource = crew();
        let events = vec![
            event("j1", 9, 0).with_location(GeoPoint::new(37.72, -122.40)),
            // No coordinates: the leg into and out of this job are unknown.
            event("j2", 10, 30),
            event("j3", 13, 0).with_location(GeoPoint::new(37.80, -122.43)),
        ];

        let plan = day_travel_plan(&resource, &events, &estimator());

        assert!(plan.incomplete);
        assert_eq!(plan.legs[1].minutes, None);
        assert_eq!(plan.legs[2].minutes, None);
        // The total is exactly the first (known) leg.
        assert_eq!(plan.total_minutes, plan.legs[0].minutes.unwrap());
    }

    #[test]
    fn test_total_is_monotonic_in_added_events() {
        let resource = crew();
        let mut events = vec![event("j1", 9, 0).with_location(GeoPoint::new(37.72, -122.40))];
        let mut last_total = day_travel_plan(&resource, &events, &estimator()).total_minutes;

        for (i, (lat, lng)) in [(37.74, -122.41), (37.76, -122.42), (37.78, -122.44)]
            .iter()
            .enumerate()
        {
            events.push(
                event(&format!("extra-{i}"), 11 + i as u32, 0)
                    .with_location(GeoPoint::new(*lat, *lng)),
            );
            let total = day_travel_plan(&resource, &events, &estimator()).total_minutes;
            assert!(total >= last_total);
            last_total = total;
        }
    }

    #[test]
    fn test_new_earliest_event_redefines_home_leg() {
        let resource = crew();
        let mut events = vec![event("j2", 10, 0).with_location(GeoPoint::new(37.80, -122.43))];
        let plan = day_travel_plan(&resource, &events, &estimator());
        let estimated_home_leg = plan.legs[0].minutes.unwrap();
        assert!(estimated_home_leg > 5);

        // An earlier job with a tiny declared estimate becomes the home leg.
        events.push(
            event("j1", 8, 0)
                .with_location(GeoPoint::new(37.71, -122.40))
                .with_drive_minutes(5),
        );
        let plan = day_travel_plan(&resource, &events, &estimator());
        assert_eq!(plan.legs[0].to, "j1");
        assert_eq!(plan.legs[0].minutes, Some(5));
        assert_eq!(plan.legs[1].from, LegStart::Event("j1".to_string()));
    }

    #[test]
    fn test_identical_starts_order_by_id() {
        let resource = crew();
        let events = vec![
            event("b", 9, 0).with_location(GeoPoint::new(37.75, -122.41)),
            event("a", 9, 0).with_location(GeoPoint::new(37.72, -122.40)),
        ];

        let plan = day_travel_plan(&resource, &events, &estimator());
        assert_eq!(plan.legs[0].to, "a");
        assert_eq!(plan.legs[1].to, "b");

        // Same input in the other order gives the same plan.
        let reversed: Vec<_> = events.into_iter().rev().collect();
        let plan2 = day_travel_plan(&resource, &reversed, &estimator());
        assert_eq!(plan.total_minutes, plan2.total_minutes);
        assert_eq!(plan2.legs[0].to, "a");
    }

    #[test]
    fn test_no_home_base_first_leg_unknown() {
        let resource = Resource::new("r1", "Alex");
        let events = vec![event("j1", 9, 0).with_location(GeoPoint::new(37.72, -122.40))];

        let plan = day_travel_plan(&resource, &events, &estimator());
        assert_eq!(plan.legs[0].minutes, None);
        assert!(plan.incomplete);
        assert_eq!(plan.total_minutes, 0);
    }
}
