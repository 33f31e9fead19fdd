//! Core library for tmstats.
//!
//! Provides the typed statistics models, the HTTP client for the stats
//! API, and the two-tier resource cache (process memory, then a
//! persistent key/value store) that sits in front of every endpoint.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, Resource};
pub use cache::{CacheStatus, ResourceCache, StatsCaches};
pub use config::Config;
