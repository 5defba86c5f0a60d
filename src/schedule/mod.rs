//! Scheduling and calendar engine.
//!
//! This module provides the scheduling core of the operations dashboard:
//!
//! - **Event Materialization**: normalize raw job records into calendar events
//! - **Time-Grid Layout**: month, week/day and agenda view structures
//! - **Travel Estimation**: per-leg and total travel minutes for a crew day
//! - **Conflict Detection**: advisory double-booking checks
//! - **View Control**: active view state with stale-fetch protection
//!
//! # Architecture
//!
//! ```text
//! raw job records ──▶ Materializer ──▶ CalendarEvent snapshot
//!                                          │
//!                          ┌───────────────┼────────────────┐
//!                          ▼               ▼                ▼
//!                    LayoutEngine   day_travel_plan  ConflictDetector
//!                          └───────────────┴────────────────┘
//!                                  ViewController
//! ```
//!
//! Data flows one way; every derivation is a pure function of the snapshot
//! plus explicit parameters.

pub mod conflict;
pub mod grid;
pub mod materialize;
pub mod travel;
pub mod types;
pub mod view;

pub use conflict::ConflictDetector;
pub use grid::{
    AgendaGroup, AgendaView, DayCell, DayColumn, LayoutEngine, MonthGrid, MonthWeek, SlotEntry,
    TimeGrid, TimeSlot,
};
pub use materialize::{
    parse_clock_time, parse_date, MaterializeOutcome, Materializer, RawJobRecord, RejectReason,
    RejectedRecord,
};
pub use travel::{
    day_travel_plan, DayTravelPlan, LegStart, StraightLineEstimator, TravelLeg, TravelTimeProvider,
};
pub use types::{
    Assignment, BookingCandidate, CalendarEvent, Conflict, ConflictStatus, GeoPoint, Resource,
};
pub use view::{ViewController, ViewMode};
