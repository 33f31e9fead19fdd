//! Two-tier resource cache for statistics payloads.
//!
//! Every resource (corporations, cards per mode, preludes, awards,
//! milestones) and every filter options payload gets its own
//! `ResourceCache`. A read checks the in-process `MemorySlot` first,
//! then the `PersistentStore`, and only then calls the remote fetcher.
//! Freshness is evaluated at read time against the entry's `fetched_at`;
//! nothing is evicted in the background.
//!
//! Storage failures (disabled storage, quota exceeded, corrupt JSON,
//! oversized payloads) never reach the caller. Fetch failures always do.

pub mod entry;
pub mod freshness;
pub mod registry;
pub mod resource;
pub mod slot;
pub mod store;

pub use entry::{CacheEntry, CacheKey, TtlPolicy};
pub use freshness::{is_fresh, Clock, ManualClock, SystemClock};
pub use registry::StatsCaches;
pub use resource::{CacheStatus, ResourceCache};
pub use slot::MemorySlot;
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistentStore, StorageError};
