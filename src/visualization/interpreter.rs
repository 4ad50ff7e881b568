//! Interpreter selection

use tracing::{debug, info};

use super::runner::ProcessRunner;
use crate::error::VisualizationError;

/// Probed in order when no interpreter is configured
pub const DEFAULT_INTERPRETERS: [&str; 4] =
    ["python3", "python", "/usr/bin/python3", "/usr/bin/python"];

#[derive(Debug, Clone)]
pub struct InterpreterResolver {
    candidates: Vec<String>,
}

impl Default for InterpreterResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETERS.iter().map(|s| s.to_string()).collect())
    }
}

impl InterpreterResolver {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    /// A configured interpreter replaces the probe list entirely
    pub fn from_config(explicit: Option<&str>) -> Self {
        match explicit {
            Some(program) => Self::new(vec![program.to_string()]),
            None => Self::default(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// First candidate whose `--version` probe succeeds
    pub async fn resolve(&self, runner: &dyn ProcessRunner) -> Result<String, VisualizationError> {
        for candidate in &self.candidates {
            if runner.probe(candidate).await {
                info!("Found interpreter: {}", candidate);
                return Ok(candidate.clone());
            }
            debug!("{} not available", candidate);
        }

        Err(VisualizationError::InterpreterNotFound {
            tried: self.candidates.clone(),
        })
    }
}
