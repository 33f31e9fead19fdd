//! Filter options payload: the distinct values a resource can be filtered by.

use serde::{Deserialize, Serialize};

/// Inclusive numeric range reported by the options endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub maps: Vec<String>,
    #[serde(default)]
    pub game_modes: Vec<String>,
    #[serde(default)]
    pub game_speeds: Vec<String>,
    #[serde(default)]
    pub player_counts: Vec<u8>,
    #[serde(default)]
    pub elo_range: Option<NumericRange>,
    #[serde(default)]
    pub generation_range: Option<NumericRange>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
            && self.game_modes.is_empty()
            && self.game_speeds.is_empty()
            && self.player_counts.is_empty()
            && self.elo_range.is_none()
            && self.generation_range.is_none()
    }
}
