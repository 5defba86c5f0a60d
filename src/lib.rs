//! Shutterplan: job scheduling and calendar engine
//!
//! The computation core behind a photography-operations dashboard: it turns
//! heterogeneous job records into canonical calendar events, lays them out
//! into month/week/day/agenda grids, estimates a crew member's daily travel
//! time, and detects double-booking conflicts. Persistence and presentation
//! are external collaborators behind the [`repository::JobRepository`]
//! boundary.

pub mod config;
pub mod error;
pub mod repository;
pub mod schedule;

pub use config::{GridConfig, ScheduleConfig, TravelConfig};
pub use error::{ConfigError, RepositoryError, Result, ScheduleError};
pub use repository::{InMemoryJobRepository, JobRepository};
pub use schedule::{
    day_travel_plan, AgendaGroup, AgendaView, Assignment, BookingCandidate, CalendarEvent,
    Conflict, ConflictDetector, ConflictStatus, DayCell, DayColumn, DayTravelPlan, GeoPoint,
    LayoutEngine, LegStart, MaterializeOutcome, Materializer, MonthGrid, MonthWeek, RawJobRecord,
    RejectReason, RejectedRecord, Resource, SlotEntry, StraightLineEstimator, TimeGrid, TimeSlot,
    TravelLeg, TravelTimeProvider, ViewController, ViewMode,
};
