use std::{
    fmt,
    path::PathBuf,
    process::{Output, Stdio},
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {after:?}")]
    TimedOut { command: String, after: Duration },
    #[error("`{command}` failed: {detail}")]
    Failed { command: String, detail: String },
}

/// Start, stop and query a named long-running service. Calls block until the
/// manager answers or the timeout elapses.
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// `Ok(false)` means the manager positively reported the service as not
    /// running; `Err` means the state could not be determined.
    async fn query_status(&self, name: &str, timeout: Duration) -> Result<bool, ServiceError>;

    async fn invoke(
        &self,
        action: ServiceAction,
        name: &str,
        timeout: Duration,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct SystemctlManager {
    program: PathBuf,
}

impl Default for SystemctlManager {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl SystemctlManager {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, ServiceError> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ServiceError::Spawn { command, source }),
            Err(_) => Err(ServiceError::TimedOut {
                command,
                after: timeout,
            }),
        }
    }
}

#[async_trait]
impl ServiceManager for SystemctlManager {
    async fn query_status(&self, name: &str, timeout: Duration) -> Result<bool, ServiceError> {
        // is-active exits non-zero for inactive units, so only stdout matters.
        let output = self.run(&["is-active", name], timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim() == "active")
    }

    async fn invoke(
        &self,
        action: ServiceAction,
        name: &str,
        timeout: Duration,
    ) -> Result<(), ServiceError> {
        let output = self.run(&[action.as_str(), name], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        Err(ServiceError::Failed {
            command: format!("{} {action} {name}", self.program.display()),
            detail: failure_detail(&output),
        })
    }
}

fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    output.status.to_string()
}
