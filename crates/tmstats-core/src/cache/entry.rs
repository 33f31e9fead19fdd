use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload and the moment it was fetched.
///
/// Persisted as `{"data": ..., "fetchedAt": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    #[serde(rename = "fetchedAt", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self { data, fetched_at }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            data: f(self.data),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> CacheEntry<Arc<T>> {
    /// Borrow the shared payload for serialization.
    pub fn borrowed(&self) -> CacheEntry<&T> {
        CacheEntry {
            data: self.data.as_ref(),
            fetched_at: self.fetched_at,
        }
    }
}

/// Current schema version of every payload shape.
/// Bump when a model changes shape; old entries are then never read.
pub const SCHEMA_VERSION: u32 = 1;

/// Storage key of one cache: `<domain>:<variant>:v<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    domain: String,
    variant: String,
    version: u32,
    rendered: String,
}

impl CacheKey {
    pub fn new(domain: impl Into<String>, variant: impl Into<String>, version: u32) -> Self {
        let domain = domain.into();
        let variant = variant.into();
        let rendered = format!("{}:{}:v{}", domain, variant, version);
        Self {
            domain,
            variant,
            version,
            rendered,
        }
    }

    /// Key of a full collection, e.g. `corp:all:v1`.
    pub fn collection(domain: &str) -> Self {
        Self::new(domain, "all", SCHEMA_VERSION)
    }

    /// Key of a filter options payload, e.g. `prelude:options:v1`.
    pub fn options(domain: &str) -> Self {
        Self::new(domain, "options", SCHEMA_VERSION)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Collection TTL: rows change as new games are scraped.
pub const COLLECTION_TTL_MINUTES: i64 = 10;

/// Options TTL: the set of maps/modes/speeds rarely changes.
pub const OPTIONS_TTL_MINUTES: i64 = 30;

/// TTLs of the two cache families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub collection: Duration,
    pub options: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            collection: Duration::minutes(COLLECTION_TTL_MINUTES),
            options: Duration::minutes(OPTIONS_TTL_MINUTES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(CacheKey::collection("corp").as_str(), "corp:all:v1");
        assert_eq!(CacheKey::options("prelude").to_string(), "prelude:options:v1");
        let key = CacheKey::new("award", "rows", 2);
        assert_eq!(key.as_str(), "award:rows:v2");
        assert_eq!(key.domain(), "award");
        assert_eq!(key.variant(), "rows");
        assert_eq!(key.version(), 2);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = CacheEntry::new(
            vec![1, 2],
            DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"data":[1,2],"fetchedAt":1700000000123}"#);

        let parsed: CacheEntry<Vec<i32>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_borrowed_serializes_like_owned() {
        let shared = CacheEntry::new(Arc::new("x".to_string()), DateTime::UNIX_EPOCH);
        let owned = CacheEntry::new("x".to_string(), DateTime::UNIX_EPOCH);
        assert_eq!(
            serde_json::to_string(&shared.borrowed()).unwrap(),
            serde_json::to_string(&owned).unwrap()
        );
    }

    #[test]
    fn test_default_ttls() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.collection, Duration::minutes(10));
        assert_eq!(policy.options, Duration::minutes(30));
    }
}
