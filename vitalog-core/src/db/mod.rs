//! Event store layer for vitalog
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Append/query operations over typed, JSON-payload events

pub mod repo;
pub mod schema;

pub use repo::{Database, EventFilter};
