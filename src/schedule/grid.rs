//! Time-grid layout: month, week/day and agenda views.
//!
//! The layout engine buckets materialized events into render-ready grid
//! structures. Given the same event set and parameters it always produces
//! the same layout; the only time-dependent inputs (the agenda's "today"
//! boundary and current-time marker) are passed in explicitly.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;

use super::types::CalendarEvent;

// ============================================================================
// Month View
// ============================================================================

/// A month grid: whole calendar weeks from the Monday on/before the 1st
/// through the Sunday on/after the last day (always 35 or 42 cells).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<MonthWeek>,
}

impl MonthGrid {
    /// Total number of day cells (a multiple of 7).
    pub fn cell_count(&self) -> usize {
        self.weeks.iter().map(|w| w.days.len()).sum()
    }
}

/// One Monday-through-Sunday row of a month grid.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonthWeek {
    pub days: Vec<DayCell>,
}

/// A single day cell of the month view.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Whether the date belongs to the displayed month (leading/trailing
    /// cells of complete weeks do not).
    pub in_month: bool,
    /// Events rendered in the cell, sorted by start time; capped at the
    /// configured overflow limit.
    pub events: Vec<CalendarEvent>,
    /// Count of events collapsed beyond the cap. Zero when nothing was cut.
    pub overflow: usize,
}

impl DayCell {
    /// The "+N more" indicator text, present only when events were cut.
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{} more", self.overflow))
    }
}

// ============================================================================
// Week / Day View
// ============================================================================

/// A slot-quantized grid for week and day views.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimeGrid {
    pub slot_minutes: u32,
    pub days: Vec<DayColumn>,
}

/// One day column of a time grid.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// One slot of a day column. An event appears only in its anchor slot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub entries: Vec<SlotEntry>,
}

/// An event anchored to a slot, with the number of slots it visually spans.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlotEntry {
    pub event: CalendarEvent,
    /// `ceil(duration / slot_minutes)`, at least 1.
    pub span: u32,
}

// ============================================================================
// Agenda View
// ============================================================================

/// Agenda/list view: events grouped by calendar day from today onward.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgendaView {
    /// Today's group, absent when today has no events.
    pub today: Option<AgendaGroup>,
    /// Later days with events, ascending by date.
    pub upcoming: Vec<AgendaGroup>,
}

/// One day's worth of agenda entries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgendaGroup {
    pub date: NaiveDate,
    /// Events sorted ascending by start time.
    pub events: Vec<CalendarEvent>,
    /// Relative position of the current time between the group's first
    /// event start and last event end, clamped to `[0, 1]`. Only set on
    /// today's group.
    pub now_marker: Option<f64>,
}

// ============================================================================
// Layout Engine
// ============================================================================

/// Computes grid layouts from an event snapshot.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: GridConfig,
}

impl LayoutEngine {
    /// Create an engine over a grid configuration.
    ///
    /// Degenerate values (a zero slot size, a day window past midnight or
    /// inverted) fall back to the defaults; [`crate::config::ScheduleConfig`]
    /// validation rejects them up front for loaded configs.
    pub fn new(mut config: GridConfig) -> Self {
        let defaults = GridConfig::default();
        if config.slot_minutes == 0 {
            config.slot_minutes = defaults.slot_minutes;
        }
        if config.day_end_hour > 24 || config.day_start_hour >= config.day_end_hour {
            config.day_start_hour = defaults.day_start_hour;
            config.day_end_hour = defaults.day_end_hour;
        }
        Self { config }
    }

    /// Lay out a month view for the given year/month.
    pub fn month_grid(&self, year: i32, month: u32, events: &[CalendarEvent]) -> MonthGrid {
        let month = month.clamp(1, 12);
        let first = NaiveDate::from_ymd_opt(year, month, 1).expect("clamped month is valid");
        let last = last_day_of_month(first);
        let grid_start = monday_on_or_before(first);
        let grid_end = sunday_on_or_after(last);

        let by_date = bucket_by_date(events);
        let limit = self.config.month_overflow_limit;

        let mut weeks = Vec::new();
        let mut cursor = grid_start;
        while cursor <= grid_end {
            let mut days = Vec::with_capacity(7);
            for offset in 0..7 {
                let date = cursor + Duration::days(offset);
                let mut day_events: Vec<CalendarEvent> = by_date
                    .get(&date)
                    .map(|events| events.iter().map(|e| (*e).clone()).collect())
                    .unwrap_or_default();
                let total = day_events.len();
                let overflow = total.saturating_sub(limit);
                if overflow > 0 {
                    day_events.truncate(limit);
                }
                days.push(DayCell {
                    date,
                    in_month: date.month() == month && date.year() == year,
                    events: day_events,
                    overflow,
                });
            }
            weeks.push(MonthWeek { days });
            cursor += Duration::days(7);
        }

        MonthGrid { year, month, weeks }
    }

    /// Lay out a week view for the Monday-started week containing `date`.
    pub fn week_grid(&self, date: NaiveDate, events: &[CalendarEvent]) -> TimeGrid {
        let week_start = monday_on_or_before(date);
        let days = (0..7)
            .map(|offset| self.day_column(week_start + Duration::days(offset), events))
            .collect();
        TimeGrid {
            slot_minutes: self.config.slot_minutes,
            days,
        }
    }

    /// Lay out a single-day view.
    pub fn day_grid(&self, date: NaiveDate, events: &[CalendarEvent]) -> TimeGrid {
        TimeGrid {
            slot_minutes: self.config.slot_minutes,
            days: vec![self.day_column(date, events)],
        }
    }

    /// Group events into an agenda from `now` onward.
    pub fn agenda(&self, events: &[CalendarEvent], now: NaiveDateTime) -> AgendaView {
        let today = now.date();
        let by_date = bucket_by_date(events);

        let mut today_group = None;
        let mut upcoming = Vec::new();
        for (date, day_events) in by_date {
            if date < today {
                continue;
            }
            let events: Vec<CalendarEvent> = day_events.iter().map(|e| (*e).clone()).collect();
            let now_marker = (date == today).then(|| now_marker_position(&events, now)).flatten();
            let group = AgendaGroup {
                date,
                events,
                now_marker,
            };
            if date == today {
                today_group = Some(group);
            } else {
                upcoming.push(group);
            }
        }

        AgendaView {
            today: today_group,
            upcoming,
        }
    }

    fn day_column(&self, date: NaiveDate, events: &[CalendarEvent]) -> DayColumn {
        let slot_minutes = self.config.slot_minutes;
        let window_start = self.config.day_start_hour * 60;
        let window_end = self.config.day_end_hour * 60;

        let mut slots: Vec<TimeSlot> = (window_start..window_end)
            .step_by(slot_minutes as usize)
            .map(|minutes| TimeSlot {
                start: NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
                    .expect("slot time within a day"),
                entries: Vec::new(),
            })
            .collect();

        let mut day_events: Vec<&CalendarEvent> =
            events.iter().filter(|e| e.date() == date).collect();
        day_events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        for event in day_events {
            let start_minutes =
                event.start.time().hour() * 60 + event.start.time().minute();
            if start_minutes >= window_end {
                continue;
            }
            // Anchor slot: floor(start, granularity); events starting before
            // the window clamp to the first slot.
            let anchored = start_minutes.max(window_start);
            let slot_index = ((anchored - window_start) / slot_minutes) as usize;
            let duration = event.duration_minutes().max(1) as u32;
            let span = duration.div_ceil(slot_minutes).max(1);
            if let Some(slot) = slots.get_mut(slot_index) {
                slot.entries.push(SlotEntry {
                    event: event.clone(),
                    span,
                });
            }
        }

        DayColumn { date, slots }
    }
}

// ============================================================================
// Date Helpers
// ============================================================================

pub(crate) fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub(crate) fn sunday_on_or_after(date: NaiveDate) -> NaiveDate {
    date + Duration::days((6 - date.weekday().num_days_from_monday()) as i64)
}

pub(crate) fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = (first.year(), first.month());
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_first.expect("valid first of next month") - Duration::days(1)
}

/// Bucket events by start date, each bucket sorted by (start, id).
fn bucket_by_date(events: &[CalendarEvent]) -> BTreeMap<NaiveDate, Vec<&CalendarEvent>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&CalendarEvent>> = BTreeMap::new();
    for event in events {
        by_date.entry(event.date()).or_default().push(event);
    }
    for bucket in by_date.values_mut() {
        bucket.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    }
    by_date
}

fn now_marker_position(events: &[CalendarEvent], now: NaiveDateTime) -> Option<f64> {
    let first_start = events.first()?.start;
    let last_end = events.iter().map(|e| e.end).max()?;
    let span = (last_end - first_start).num_seconds();
    if span <= 0 {
        return None;
    }
    let elapsed = (now - first_start).num_seconds();
    Some((elapsed as f64 / span as f64).clamp(0.0, 1.0))
}

// ============================================================================
// Tests
// ============================================================================
