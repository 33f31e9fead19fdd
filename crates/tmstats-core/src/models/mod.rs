//! Data models for game statistics payloads.
//!
//! This module contains the row types returned by the collection
//! endpoints and the compact filter options payload:
//!
//! - `CorporationStats`, `PreludeStats`: per-entity win rates and Elo deltas
//! - `CardStats`, `CardMode`: card rows, one collection per mode
//! - `AwardStats`, `MilestoneStats`: funded/claimed outcomes
//! - `FilterOptions`, `NumericRange`: distinct filterable values

pub mod options;
pub mod stats;

pub use options::{FilterOptions, NumericRange};
pub use stats::{AwardStats, CardMode, CardStats, CorporationStats, MilestoneStats, PreludeStats};
