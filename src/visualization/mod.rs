//! Visualization trigger
//!
//! Runs the external visualization script with the two survey variables the
//! user picked and reports success only when the script's HTML output file
//! exists afterwards. The call blocks for the whole subprocess run, bounded
//! by the configured timeout.

pub mod interpreter;
pub mod runner;
pub mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::VisualizationError;

pub use interpreter::{InterpreterResolver, DEFAULT_INTERPRETERS};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, RunError, TokioProcessRunner};
pub use script::{ResolvedScript, ScriptLocator};

/// URL prefix under which the script directory is served
pub const STATIC_MOUNT: &str = "/standalone-viz";

pub const DEFAULT_SCRIPT_RELATIVE_PATH: &str = "public/standalone-viz/iMSMS_emperor.py";
pub const DEFAULT_OUTPUT_FILE: &str = "visualization.html";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    /// Explicit script location; disables the parent-directory search
    pub script_path: Option<PathBuf>,
    pub script_relative_path: PathBuf,
    pub primary_depth: usize,
    pub max_search_attempts: usize,
    /// Explicit interpreter; disables probing
    pub interpreter: Option<String>,
    pub timeout: Duration,
    pub output_file: String,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            script_path: None,
            script_relative_path: PathBuf::from(DEFAULT_SCRIPT_RELATIVE_PATH),
            primary_depth: 5,
            max_search_attempts: 10,
            interpreter: None,
            timeout: DEFAULT_TIMEOUT,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl VisualizationConfig {
    pub fn locator(&self) -> ScriptLocator {
        ScriptLocator {
            explicit: self.script_path.clone(),
            relative_path: self.script_relative_path.clone(),
            primary_depth: self.primary_depth,
            max_search_attempts: self.max_search_attempts,
        }
    }

    /// Public URL of the generated page
    pub fn served_output_path(&self) -> String {
        format!("{}/{}", STATIC_MOUNT, self.output_file)
    }
}

/// The two user-chosen variables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationRequest {
    #[serde(default)]
    pub variable1: String,
    #[serde(default)]
    pub variable2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationOutcome {
    pub success: bool,
    pub message: String,
    pub output_path: String,
}

pub struct VisualizationTrigger {
    config: VisualizationConfig,
    locator: ScriptLocator,
    interpreters: InterpreterResolver,
    runner: Arc<dyn ProcessRunner>,
    cwd: PathBuf,
    // Every run writes the same output file.
    run_lock: Mutex<()>,
}

impl VisualizationTrigger {
    pub fn new(config: VisualizationConfig, runner: Arc<dyn ProcessRunner>, cwd: PathBuf) -> Self {
        Self {
            locator: config.locator(),
            interpreters: InterpreterResolver::from_config(config.interpreter.as_deref()),
            config,
            runner,
            cwd,
            run_lock: Mutex::new(()),
        }
    }

    /// Trigger using real subprocesses and the process working directory
    pub fn with_process_runner(config: VisualizationConfig) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(config, Arc::new(TokioProcessRunner), cwd))
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    pub fn locate_script(&self) -> Result<ResolvedScript, VisualizationError> {
        self.locator.locate(&self.cwd)
    }

    /// Whether the output file currently exists next to the script
    pub fn output_ready(&self) -> bool {
        self.locate_script()
            .map(|script| self.output_file_in(&script.working_dir).is_file())
            .unwrap_or(false)
    }

    fn output_file_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.output_file)
    }

    pub async fn generate(
        &self,
        variable1: &str,
        variable2: &str,
    ) -> Result<VisualizationOutcome, VisualizationError> {
        if variable1.is_empty() || variable2.is_empty() {
            return Err(VisualizationError::InvalidParameters);
        }

        info!(
            "Running visualization with variables: {}, {}",
            variable1, variable2
        );
        debug!("Working directory: {}", self.cwd.display());

        let script = self.locate_script()?;
        let interpreter = self.interpreters.resolve(self.runner.as_ref()).await?;

        let invocation = Invocation {
            program: interpreter,
            args: vec![
                script.script_path.to_string_lossy().to_string(),
                variable1.to_string(),
                variable2.to_string(),
            ],
            working_dir: script.working_dir.clone(),
            timeout: self.config.timeout,
        };
        let expected = self.output_file_in(&script.working_dir);

        let _guard = self.run_lock.lock().await;

        // A leftover page from an earlier run must not count as this run's output.
        if expected.is_file() {
            debug!("Removing previous output {}", expected.display());
            if let Err(e) = tokio::fs::remove_file(&expected).await {
                warn!("Could not remove previous output {}: {}", expected.display(), e);
            }
        }

        info!(
            "Executing {} {:?} in {}",
            invocation.program,
            invocation.args,
            invocation.working_dir.display()
        );

        let output = self.runner.run(&invocation).await.map_err(|e| {
            error!("Visualization script failed to run: {}", e);
            VisualizationError::ExecutionFailed(e.to_string())
        })?;

        if !output.stdout.is_empty() {
            debug!("Script output: {}", output.stdout.trim_end());
        }
        if !output.success {
            let status = output
                .exit_code
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
            error!("Visualization script {}: {}", status, output.stderr.trim_end());
            return Err(VisualizationError::ExecutionFailed(format!(
                "{}: {}",
                status,
                output.stderr.trim()
            )));
        }
        if !output.stderr.is_empty() {
            warn!("Script stderr: {}", output.stderr.trim_end());
        }

        if !expected.is_file() {
            return Err(VisualizationError::OutputNotProduced { expected });
        }

        Ok(VisualizationOutcome {
            success: true,
            message: "Visualization generated successfully".to_string(),
            output_path: self.config.served_output_path(),
        })
    }
}
