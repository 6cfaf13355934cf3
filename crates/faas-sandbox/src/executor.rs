//! Interpreter process executor.
//!
//! Every invocation gets its own [`Workspace`] and a single interpreter
//! process:
//!
//! 1. The source is written to `function.js` / `function.py`
//! 2. The process starts with the workspace as working directory and
//!    `HOME`, an environment cleared down to the configured inherit list,
//!    the input in [`INPUT_ENV_VAR`] and stdin closed
//! 3. stdout and stderr are drained by background tasks while the wait is
//!    bounded by the policy timeout
//! 4. On timeout the process is killed
//! 5. The workspace is removed on every path

use crate::limiter::{ResourceLimiter, default_limiter};
use crate::workspace::Workspace;
use async_trait::async_trait;
use faas_core::traits::CodeExecutor;
use faas_core::{
    Enforcement, ExecutionOutcome, ExecutionRequest, ExecutionStatus, INPUT_ENV_VAR, Language,
    SandboxConfig,
};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs functions as interpreter child processes.
///
/// Holds no per-invocation state; one executor serves any number of
/// concurrent invocations.
///
/// # Examples
///
/// ```no_run
/// use faas_core::traits::CodeExecutor;
/// use faas_core::{ExecutionRequest, Language, ResourcePolicy, SandboxConfig};
/// use faas_sandbox::SandboxExecutor;
///
/// # async fn example() {
/// let executor = SandboxExecutor::new(SandboxConfig::default());
/// let outcome = executor
///     .execute(ExecutionRequest {
///         language: Language::Python,
///         source: "print('hello')",
///         input: "{}",
///         policy: ResourcePolicy::default(),
///     })
///     .await;
/// assert_eq!(outcome.stdout, "hello\n");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SandboxExecutor {
    config: SandboxConfig,
    limiter: Arc<dyn ResourceLimiter>,
}

impl SandboxExecutor {
    /// Creates an executor with the limiter selected by `config`.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        let limiter = default_limiter(&config);
        Self::with_limiter(config, limiter)
    }

    /// Creates an executor with a specific limiter.
    #[must_use]
    pub fn with_limiter(config: SandboxConfig, limiter: Arc<dyn ResourceLimiter>) -> Self {
        Self { config, limiter }
    }

    /// Sandbox settings.
    #[must_use]
    pub const fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Resolves the configured interpreter for `language` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be found.
    pub fn locate_interpreter(&self, language: Language) -> Result<PathBuf, which::Error> {
        which::which(self.config.interpreter(language))
    }

    fn command(
        &self,
        request: &ExecutionRequest<'_>,
        workspace: &Workspace,
    ) -> (Command, Enforcement) {
        let mut command = Command::new(self.config.interpreter(request.language));
        let enforcement = self
            .limiter
            .apply(&mut command, request.language, &request.policy);

        command
            .arg(request.language.source_file_name())
            .current_dir(workspace.path())
            .env_clear()
            .envs(
                self.config
                    .inherit_env
                    .iter()
                    .filter_map(|key| std::env::var_os(key).map(|value| (key, value))),
            )
            .env("HOME", workspace.path())
            .env(INPUT_ENV_VAR, request.input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        (command, enforcement)
    }

    async fn run(
        &self,
        request: &ExecutionRequest<'_>,
        workspace: &Workspace,
        start: Instant,
    ) -> ExecutionOutcome {
        if let Err(e) = workspace.write_source(request.language, request.source).await {
            return ExecutionOutcome::infrastructure_error(
                format!("cannot write source: {e}"),
                start.elapsed(),
            );
        }

        let (mut command, enforcement) = self.command(request, workspace);
        let interpreter = self.config.interpreter(request.language);
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(interpreter, error = %e, "failed to start interpreter");
                let mut outcome = ExecutionOutcome::infrastructure_error(
                    format!("cannot start '{interpreter}': {e}"),
                    start.elapsed(),
                );
                outcome.enforcement = enforcement;
                return outcome;
            }
        };
        debug!(pid = ?child.id(), interpreter, %enforcement, "started function process");

        let stdout = child.stdout.take().map(|s| tokio::spawn(read_stream(s)));
        let stderr = child.stderr.take().map(|s| tokio::spawn(read_stream(s)));

        let timeout = request.policy.timeout();
        let (status, exit_code, message) =
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(Ok(exit)) => classify(exit),
                Ok(Err(e)) => {
                    let _ = child.kill().await;
                    (
                        ExecutionStatus::InfrastructureError,
                        None,
                        Some(format!("Execution failed: cannot wait for process: {e}")),
                    )
                }
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill timed out process");
                    }
                    (
                        ExecutionStatus::TimedOut,
                        None,
                        Some(format!(
                            "Execution timed out after {}s",
                            request.policy.timeout_secs
                        )),
                    )
                }
            };

        let grace = self.config.kill_grace();
        let stdout = collect(stdout, grace).await;
        let stderr = collect(stderr, grace).await;

        ExecutionOutcome {
            status,
            stdout,
            stderr,
            exit_code,
            message,
            duration: start.elapsed(),
            enforcement,
        }
    }
}

#[async_trait]
impl CodeExecutor for SandboxExecutor {
    async fn execute(&self, request: ExecutionRequest<'_>) -> ExecutionOutcome {
        let start = Instant::now();

        let workspace = match Workspace::create(self.config.workspace_root.as_deref()) {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(error = %e, "failed to create workspace");
                return ExecutionOutcome::infrastructure_error(
                    format!("cannot create workspace: {e}"),
                    start.elapsed(),
                );
            }
        };

        let outcome = self.run(&request, &workspace, start).await;
        workspace.close();

        info!(
            language = %request.language,
            status = %outcome.status,
            exit_code = ?outcome.exit_code,
            duration = ?outcome.duration,
            "function process finished"
        );
        outcome
    }
}

fn classify(exit: ExitStatus) -> (ExecutionStatus, Option<i32>, Option<String>) {
    match exit.code() {
        Some(0) => (ExecutionStatus::Succeeded, Some(0), None),
        Some(code) => (
            ExecutionStatus::Failed,
            Some(code),
            Some(format!("Process exited with code {code}")),
        ),
        None => (ExecutionStatus::Failed, None, Some(termination_message(exit))),
    }
}

#[cfg(unix)]
fn termination_message(exit: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    exit.signal().map_or_else(
        || "Process terminated abnormally".to_string(),
        |signal| format!("Process terminated by signal {signal}"),
    )
}

#[cfg(not(unix))]
fn termination_message(_exit: ExitStatus) -> String {
    "Process terminated abnormally".to_string()
}

async fn read_stream<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        debug!(error = %e, "output stream closed with error");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Joins a reader task, giving up after `grace`.
async fn collect(handle: Option<JoinHandle<String>>, grace: Duration) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    let abort = handle.abort_handle();
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!(error = %e, "output reader task failed");
            String::new()
        }
        Err(_) => {
            abort.abort();
            debug!("output still open after grace period");
            String::new()
        }
    }
}
