//! View controller: active view state and derivation orchestration.
//!
//! The controller owns the current view selection (mode, reference date,
//! optional resource filter) and the last materialized snapshot, and wires
//! the repository, materializer, layout engine, travel estimator and
//! conflict detector together. Derivations are pure functions of the
//! snapshot, so recomputing over an unchanged snapshot is idempotent.
//!
//! Fetches are guarded by a monotonically increasing request generation:
//! every selection change bumps it, and a completing fetch whose generation
//! is no longer current is discarded instead of overwriting the newer
//! selection's results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::ScheduleConfig;
use crate::error::{RepositoryError, Result};
use crate::repository::JobRepository;

use super::conflict::ConflictDetector;
use super::grid::{
    last_day_of_month, monday_on_or_before, sunday_on_or_after, AgendaView, LayoutEngine,
    MonthGrid, TimeGrid,
};
use super::materialize::{Materializer, RejectedRecord};
use super::travel::{day_travel_plan, DayTravelPlan, StraightLineEstimator};
use super::types::{BookingCandidate, CalendarEvent, ConflictStatus, Resource};

// ============================================================================
// View Mode
// ============================================================================

/// The active calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    Day,
    Agenda,
}

// ============================================================================
// View Controller
// ============================================================================

struct ViewState {
    mode: ViewMode,
    reference_date: NaiveDate,
    resource_filter: Option<String>,
    events: Vec<CalendarEvent>,
    rejected: Vec<RejectedRecord>,
    resources: Vec<Resource>,
}

/// Holds the active view selection and derives display structures from it.
pub struct ViewController<R: JobRepository> {
    repo: Arc<R>,
    config: ScheduleConfig,
    materializer: Materializer,
    layout: LayoutEngine,
    detector: ConflictDetector<R>,
    state: RwLock<ViewState>,
    generation: AtomicU64,
}

impl<R: JobRepository> ViewController<R> {
    /// Create a controller over a repository.
    ///
    /// The reference date is explicit; the controller never reads the wall
    /// clock on its own.
    pub fn new(repo: Arc<R>, config: ScheduleConfig, reference_date: NaiveDate) -> Self {
        let materializer = Materializer::new(config.default_duration_minutes);
        let layout = LayoutEngine::new(config.grid.clone());
        let detector = ConflictDetector::new(repo.clone(), config.default_duration_minutes);
        Self {
            repo,
            config,
            materializer,
            layout,
            detector,
            state: RwLock::new(ViewState {
                mode: ViewMode::default(),
                reference_date,
                resource_filter: None,
                events: Vec::new(),
                rejected: Vec::new(),
                resources: Vec::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Switch the active view mode.
    pub async fn set_mode(&self, mode: ViewMode) {
        let mut state = self.state.write().await;
        state.mode = mode;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Move the reference date.
    pub async fn set_reference_date(&self, date: NaiveDate) {
        let mut state = self.state.write().await;
        state.reference_date = date;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Set or clear the resource filter.
    pub async fn set_resource_filter(&self, resource_id: Option<String>) {
        let mut state = self.state.write().await;
        state.resource_filter = resource_id;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// The active view mode.
    pub async fn mode(&self) -> ViewMode {
        self.state.read().await.mode
    }

    /// The active reference date.
    pub async fn reference_date(&self) -> NaiveDate {
        self.state.read().await.reference_date
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Fetch the active window's records and rebuild the snapshot.
    ///
    /// Returns `false` when the result was discarded because the selection
    /// changed while the fetch was in flight.
    pub async fn refresh(&self) -> Result<bool> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (mode, reference_date, filter) = {
            let state = self.state.read().await;
            (
                state.mode,
                state.reference_date,
                state.resource_filter.clone(),
            )
        };

        let (start, end) = fetch_window(mode, reference_date);
        let records = self.repo.jobs_in_range(start, end).await?;
        let resources = self.repo.resources().await?;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(generation, "discarding stale fetch result");
            return Ok(false);
        }

        let mut outcome = match &filter {
            Some(resource_id) => self
                .materializer
                .materialize_for_resource(&records, resource_id),
            None => self.materializer.materialize(&records),
        };
        for event in &mut outcome.events {
            if event.color.is_none() {
                if let Some(color) = resources
                    .iter()
                    .find(|r| r.id == event.resource_id)
                    .and_then(|r| r.color.clone())
                {
                    event.color = Some(color);
                }
            }
        }

        debug!(
            events = outcome.events.len(),
            rejected = outcome.rejected.len(),
            ?mode,
            %reference_date,
            "view snapshot refreshed"
        );
        state.events = outcome.events;
        state.rejected = outcome.rejected;
        state.resources = resources;
        Ok(true)
    }

    /// The current event snapshot.
    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.state.read().await.events.clone()
    }

    /// Records dropped during the last refresh.
    pub async fn rejected(&self) -> Vec<RejectedRecord> {
        self.state.read().await.rejected.clone()
    }

    // ========================================================================
    // Derivations
    // ========================================================================

    /// Month grid for the reference date's month.
    pub async fn month_grid(&self) -> MonthGrid {
        let state = self.state.read().await;
        self.layout.month_grid(
            state.reference_date.year(),
            state.reference_date.month(),
            &state.events,
        )
    }

    /// Week or day time grid, depending on the active mode.
    pub async fn time_grid(&self) -> TimeGrid {
        let state = self.state.read().await;
        match state.mode {
            ViewMode::Day => self.layout.day_grid(state.reference_date, &state.events),
            _ => self.layout.week_grid(state.reference_date, &state.events),
        }
    }

    /// Agenda view from the given instant onward.
    pub async fn agenda(&self, now: NaiveDateTime) -> AgendaView {
        let state = self.state.read().await;
        self.layout.agenda(&state.events, now)
    }

    /// Travel plan for one resource's jobs on the reference date.
    pub async fn travel_plan(&self, resource_id: &str) -> Result<DayTravelPlan> {
        let reference_date = self.reference_date().await;
        let resource = self
            .repo
            .resources()
            .await?
            .into_iter()
            .find(|r| r.id == resource_id)
            .ok_or_else(|| RepositoryError::ResourceNotFound(resource_id.to_string()))?;

        let records = self
            .repo
            .jobs_for_resource_on(resource_id, reference_date)
            .await?;
        let outcome = self
            .materializer
            .materialize_for_resource(&records, resource_id);
        let estimator = StraightLineEstimator::from_config(&self.config.travel);
        Ok(day_travel_plan(&resource, &outcome.events, &estimator))
    }

    /// Check a candidate booking for double-booking conflicts.
    ///
    /// A failed conflict query yields [`ConflictStatus::Unknown`], never a
    /// silent all-clear.
    pub async fn check_booking(&self, candidate: &BookingCandidate) -> ConflictStatus {
        match self.detector.check(candidate).await {
            Ok(conflicts) if conflicts.is_empty() => ConflictStatus::Clear,
            Ok(conflicts) => ConflictStatus::Conflicts(conflicts),
            Err(err) => {
                warn!(%err, "conflict query failed; booking state unknown");
                ConflictStatus::Unknown(err.to_string())
            }
        }
    }
}

/// The date window a view mode needs fetched around a reference date.
fn fetch_window(mode: ViewMode, reference_date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match mode {
        ViewMode::Month => {
            let first = reference_date.with_day(1).unwrap_or(reference_date);
            (
                monday_on_or_before(first),
                sunday_on_or_after(last_day_of_month(first)),
            )
        }
        ViewMode::Week => {
            let start = monday_on_or_before(reference_date);
            (start, start + Duration::days(6))
        }
        ViewMode::Day => (reference_date, reference_date),
        ViewMode::Agenda => (reference_date, reference_date + Duration::days(30)),
    }
}

// ============================================================================
// Tests
// ============================================================================
