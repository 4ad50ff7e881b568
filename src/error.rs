//! Error types for the Galileo service
//!
//! Library code returns these `thiserror` enums; the binary wraps them in
//! `anyhow` at the top level.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the visualization trigger.
///
/// Every variant is user-facing and returned synchronously to the caller.
/// None of them is retried.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Both variables are required")]
    InvalidParameters,

    #[error("Visualization script not found. Last tried: {}", .last_tried.display())]
    ScriptNotFound { last_tried: PathBuf },

    #[error("No interpreter found. Tried: {}", .tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    #[error("Visualization script execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Script ran but output file was not created: {}", .expected.display())]
    OutputNotProduced { expected: PathBuf },
}

impl VisualizationError {
    /// Stable error code exposed to the browser.
    pub fn code(&self) -> &'static str {
        match self {
            VisualizationError::InvalidParameters => "invalid-params",
            VisualizationError::ScriptNotFound { .. } => "script-not-found",
            VisualizationError::InterpreterNotFound { .. } => "python-not-found",
            VisualizationError::ExecutionFailed(_) => "execution-failed",
            VisualizationError::OutputNotProduced { .. } => "output-not-found",
        }
    }

    /// Whether the caller (rather than the server environment) is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, VisualizationError::InvalidParameters)
    }
}

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors raised while loading a single fixture file into its collection
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read fixture {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fixture {} must contain a JSON array", .path.display())]
    NotAnArray { path: PathBuf },

    #[error("Fixture {} element {index} is not a JSON object", .path.display())]
    NotAnObject { path: PathBuf, index: usize },

    #[error("Fixtures directory {} does not exist or is not a directory", .path.display())]
    MissingFixturesDir { path: PathBuf },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
