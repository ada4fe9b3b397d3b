//! SQLite Insight Core - shared types for the database session
//!
//! This crate provides the types every other SQLite Insight crate depends on:
//!
//! - `InsightError` / `Result` - the single error type used across the workspace
//! - `Value` - a typed cell as read from the engine
//! - `Row` - an ordered column-name to string-value mapping, the unit of the grid
//! - `ColumnInfo` - per-column catalog metadata
//! - `InsightConfig` - user configuration loaded from TOML

mod config;
mod error;
mod types;

pub use config::*;
pub use error::*;
pub use types::*;
