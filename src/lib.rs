//! Galileo - survey visualization service
//!
//! Collects two survey variables from a browser form, runs an external
//! visualization script with them, and serves the page the script produces.
//! Reference data (survey questions, boards, examples) is seeded into a
//! document store from JSON fixture files.
//!
//! ## Components
//! - [`seed::SeedLoader`] - clears and reloads the reference collections
//! - [`visualization::VisualizationTrigger`] - locates the script and an
//!   interpreter, runs it with a timeout, checks for the output page
//! - `api` (feature `server`) - the questions page and HTTP endpoints

// Core error handling
pub mod error;

pub mod config;

// Document storage (Postgres with the `database` feature)
pub mod database;

pub mod seed;
pub mod visualization;

// HTTP surface
#[cfg(feature = "server")]
pub mod api;

pub use config::GalileoConfig;
pub use error::{ConfigError, SeedError, StoreError, VisualizationError};
pub use seed::{SeedLoader, SeedReport};
pub use visualization::{VisualizationOutcome, VisualizationTrigger};
