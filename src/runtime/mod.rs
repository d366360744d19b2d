use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Failure of a single runtime operation. The Display form is what ends up
/// verbatim in the sync audit trail.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("{command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
}

/// Seam to the local container runtime. All operations act on the puller's
/// own image cache; nothing here mutates a remote registry.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Authenticate against a registry host.
    async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<(), RuntimeError>;

    /// Fetch a remote-qualified reference into the local cache.
    async fn pull(&self, reference: &str) -> Result<(), RuntimeError>;

    /// Apply `target` as an additional local tag on `source`.
    async fn tag(&self, source: &str, target: &str) -> Result<(), RuntimeError>;

    /// Delete a local image reference.
    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError>;
}

/// Runtime configuration for the CLI-backed implementation.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// CLI binary, normally `docker`.
    pub binary: String,
    /// Deadline for image pulls, which can move gigabytes.
    pub pull_timeout: Duration,
    /// Deadline for every other runtime command.
    pub command_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            pull_timeout: Duration::from_secs(600),
            command_timeout: Duration::from_secs(60),
        }
    }
}

/// Docker CLI implementation. Each call is one bounded subprocess; the
/// CLI itself is safe for concurrent invocation, so no locking here.
pub struct DockerCli {
    config: RuntimeConfig,
}

impl DockerCli {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    async fn run(
        &self,
        args: &[&str],
        stdin_data: Option<&str>,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        // Errors identify the command by its verb, not the full argument list.
        let command = format!("{} {}", self.config.binary, args.first().unwrap_or(&""));

        debug!("Running {} {}", self.config.binary, args.join(" "));

        let mut child = Command::new(&self.config.binary)
            .args(args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                command: command.clone(),
                source,
            })?;

        if let Some(data) = stdin_data
            && let Some(mut stdin) = child.stdin.take()
        {
            // A closed stdin surfaces as a command failure below.
            let _ = stdin.write_all(data.as_bytes()).await;
            drop(stdin);
        }

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(RuntimeError::Spawn { command, source });
            }
            Err(_) => {
                return Err(RuntimeError::Timeout {
                    command,
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            Err(RuntimeError::CommandFailed { command, stderr })
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
    ) -> Result<(), RuntimeError> {
        // An empty registry host means the CLI's default registry.
        let mut args = vec!["login"];
        if !registry.is_empty() {
            args.push(registry);
        }
        args.extend_from_slice(&["--username", username, "--password-stdin"]);

        self.run(&args, Some(password), self.config.command_timeout)
            .await
    }

    async fn pull(&self, reference: &str) -> Result<(), RuntimeError> {
        self.run(&["pull", reference], None, self.config.pull_timeout)
            .await
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), RuntimeError> {
        self.run(&["tag", source, target], None, self.config.command_timeout)
            .await
    }

    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.run(&["rmi", reference], None, self.config.command_timeout)
            .await
    }
}
