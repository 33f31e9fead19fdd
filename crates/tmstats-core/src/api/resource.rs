//! The statistics domains served by the API and their fixed endpoint paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::CardMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Corporation,
    Card,
    Prelude,
    Award,
    Milestone,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Corporation,
        Resource::Card,
        Resource::Prelude,
        Resource::Award,
        Resource::Milestone,
    ];

    /// Short domain prefix used in cache keys, e.g. `corp` in `corp:all:v1`.
    pub fn domain(&self) -> &'static str {
        match self {
            Resource::Corporation => "corp",
            Resource::Card => "card",
            Resource::Prelude => "prelude",
            Resource::Award => "award",
            Resource::Milestone => "milestone",
        }
    }

    /// Path of the full collection endpoint. Cards are split per mode.
    pub fn collection_path(&self, mode: Option<CardMode>) -> String {
        match (self, mode) {
            (Resource::Card, Some(mode)) => format!("/api/cards/{}", mode),
            (Resource::Card, None) => format!("/api/cards/{}", CardMode::Played),
            _ => format!("/api/{}", self.plural()),
        }
    }

    /// Path of the filter options endpoint.
    pub fn options_path(&self) -> String {
        format!("/api/{}/options", self.plural())
    }

    fn plural(&self) -> &'static str {
        match self {
            Resource::Corporation => "corporations",
            Resource::Card => "cards",
            Resource::Prelude => "preludes",
            Resource::Award => "awards",
            Resource::Milestone => "milestones",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Corporation => "corporation",
            Resource::Card => "card",
            Resource::Prelude => "prelude",
            Resource::Award => "award",
            Resource::Milestone => "milestone",
        };
        f.write_str(name)
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "corp" | "corporation" | "corporations" => Ok(Resource::Corporation),
            "card" | "cards" => Ok(Resource::Card),
            "prelude" | "preludes" => Ok(Resource::Prelude),
            "award" | "awards" => Ok(Resource::Award),
            "milestone" | "milestones" => Ok(Resource::Milestone),
            other => Err(format!("unknown resource: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Resource::Corporation.collection_path(None), "/api/corporations");
        assert_eq!(Resource::Prelude.options_path(), "/api/preludes/options");
        assert_eq!(
            Resource::Card.collection_path(Some(CardMode::Kept)),
            "/api/cards/kept"
        );
        assert_eq!(Resource::Card.options_path(), "/api/cards/options");
    }

    #[test]
    fn test_parse_resource_names() {
        assert_eq!("corp".parse::<Resource>(), Ok(Resource::Corporation));
        assert_eq!("Milestones".parse::<Resource>(), Ok(Resource::Milestone));
        assert!("colony".parse::<Resource>().is_err());
    }
}
