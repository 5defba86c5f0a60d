//! Configuration for the scheduling engine.

mod settings;

pub use settings::{GridConfig, ScheduleConfig, TravelConfig};
