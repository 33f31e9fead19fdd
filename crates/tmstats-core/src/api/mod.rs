//! REST API client module for the game statistics service.
//!
//! This module provides the `ApiClient` used as the single network
//! boundary of the resource caches. Each resource has one collection
//! endpoint and one filter options endpoint, both plain GET requests
//! returning JSON.

pub mod client;
pub mod error;
pub mod resource;

pub use client::ApiClient;
pub use error::ApiError;
pub use resource::Resource;
