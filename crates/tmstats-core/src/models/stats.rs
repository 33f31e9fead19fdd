use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Aggregated results for one corporation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CorporationStats {
    pub name: String,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub avg_elo_change: f64,
    #[serde(default)]
    pub avg_final_score: f64,
}

/// Which card collection a `CardStats` row was aggregated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum CardMode {
    Played,
    Kept,
    Drawn,
    Bought,
}

impl CardMode {
    pub const ALL: [CardMode; 4] = [
        CardMode::Played,
        CardMode::Kept,
        CardMode::Drawn,
        CardMode::Bought,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardMode::Played => "played",
            CardMode::Kept => "kept",
            CardMode::Drawn => "drawn",
            CardMode::Bought => "bought",
        }
    }
}

impl fmt::Display for CardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "played" => Ok(CardMode::Played),
            "kept" => Ok(CardMode::Kept),
            "drawn" => Ok(CardMode::Drawn),
            "bought" => Ok(CardMode::Bought),
            other => Err(format!("unknown card mode: {}", other)),
        }
    }
}

/// Aggregated results for one project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub name: String,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub avg_elo_change: f64,
    /// Average generation in which the card was played, if known.
    #[serde(default)]
    pub avg_generation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PreludeStats {
    pub name: String,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub avg_elo_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AwardStats {
    pub name: String,
    #[serde(default)]
    pub times_funded: u32,
    /// Share of funded awards won by the player who funded them.
    #[serde(default)]
    pub funder_win_rate: f64,
    #[serde(default)]
    pub avg_elo_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MilestoneStats {
    pub name: String,
    #[serde(default)]
    pub times_claimed: u32,
    #[serde(default)]
    pub claimer_win_rate: f64,
    #[serde(default)]
    pub avg_claim_generation: Option<f64>,
    #[serde(default)]
    pub avg_elo_change: f64,
}

impl CorporationStats {
    /// Win rate as a display percentage, e.g. "42.5%".
    pub fn win_rate_display(&self) -> String {
        format!("{:.1}%", self.win_rate * 100.0)
    }
}
