//! Ether Dash - GitHub activity store
//!
//! Rebuilds the SQLite database behind the Ether Dash dashboards from nine
//! CSV exports (users, repositories, issues, comments, commits, events,
//! file commits, files, reactions).
//!
//! # Features
//!
//! - Declarative schema with foreign keys
//! - Lenient CSV normalization with first-wins de-duplication
//! - Full rebuild, one transaction per file, in a fixed order
//! - Read-only summary queries for downstream consumers

/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Typed records
pub mod models;
/// CSV normalization
pub mod normalize;
/// Database schema definitions
pub mod schema;
/// Store rebuild and queries
pub mod store;
/// Input directory inspection
pub mod validation;

// Re-export key components for easier access
pub use error::{ImportError, Result};
pub use schema::Relation;
pub use store::{RebuildReport, Store};
