//! Async git command executor with semaphore-controlled concurrency
//!
//! Every repository operation funnels through a [`GitRunner`]. The default
//! runner, [`GitExecutor`], spawns the git binary with:
//! - Semaphore to limit concurrent git processes (default: 16)
//! - Optional timeout (the child is killed when the deadline passes)
//! - Per-child working directory and `GIT_DIR`, never touching our own cwd

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::error::{GitError, Result};

/// Default maximum concurrent git processes
pub const DEFAULT_MAX_CONCURRENT: usize = 16;

/// Default git binary
pub const DEFAULT_GIT_BINARY: &str = "git";

/// What to do with the child's stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrMode {
    /// Append stderr to stdout so diagnostics read as one text
    Merge,
    /// Keep stderr apart from stdout
    #[default]
    Separate,
}

/// A single git invocation: argv (without the binary) plus process setup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub git_dir: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
    pub stderr: StderrMode,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn git_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn stderr(mut self, mode: StderrMode) -> Self {
        self.stderr = mode;
        self
    }

    /// The subcommand, e.g. `rev-parse`
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Human readable command line, used in error messages
    pub fn command_line(&self) -> String {
        let mut line = String::from("git");
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Captured result of a finished git process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit code, `-1` if the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    /// Empty when the invocation used [`StderrMode::Merge`]
    pub stderr: String,
}

impl RawOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can run git invocations
///
/// Non-zero exit codes are not errors at this level; callers decide.
#[async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<RawOutput>;
}

/// Async git command executor
///
/// Uses a semaphore to limit concurrent git processes when a handle is
/// shared between many tasks.
#[derive(Clone)]
pub struct GitExecutor {
    /// Git binary name or path
    binary: String,
    /// Semaphore for concurrency control
    semaphore: Arc<Semaphore>,
    /// Command timeout; `None` waits for git to finish
    timeout: Option<Duration>,
}

impl GitExecutor {
    /// Create a new executor with default settings
    pub fn new() -> Self {
        Self::with_max_concurrent(DEFAULT_MAX_CONCURRENT)
    }

    /// Create an executor with custom concurrency limit
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            binary: DEFAULT_GIT_BINARY.to_string(),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout: None,
        }
    }

    /// Kill git commands that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a different git binary
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check if git is installed and return its version line
    pub async fn check_installed(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|_| GitError::NotInstalled)?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            debug!("git version: {}", version);
            Ok(version)
        } else {
            Err(GitError::NotInstalled.into())
        }
    }

    async fn spawn_and_wait(&self, invocation: &Invocation) -> std::io::Result<std::process::Output> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        if let Some(git_dir) = &invocation.git_dir {
            cmd.env("GIT_DIR", git_dir);
        }

        let mut child = cmd.spawn()?;

        // Feed stdin from its own task so stdout is drained at the same time
        let writer = match (&invocation.stdin, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => {
                let input = input.clone();
                Some(tokio::spawn(async move {
                    // git may exit before reading everything; the exit status tells the story
                    if let Err(e) = stdin.write_all(&input).await {
                        debug!("writing git stdin failed: {}", e);
                    }
                }))
            }
            _ => None,
        };

        let output = child.wait_with_output().await;
        if let Some(writer) = writer {
            let _ = writer.await;
        }
        output
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitRunner for GitExecutor {
    #[instrument(skip_all, fields(args = ?invocation.args))]
    async fn run(&self, invocation: &Invocation) -> Result<RawOutput> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| GitError::SpawnFailed(e.to_string()))?;

        let spawned = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.spawn_and_wait(invocation))
                .await
                .map_err(|_| limit),
            None => Ok(self.spawn_and_wait(invocation).await),
        };

        let output = match spawned {
            Ok(Ok(output)) => output,
            Ok(Err(e))
                if e.kind() == ErrorKind::NotFound
                    && invocation.current_dir.as_ref().is_none_or(|d| d.is_dir()) =>
            {
                warn!("git binary '{}' not found", self.binary);
                return Err(GitError::NotInstalled.into());
            }
            Ok(Err(e)) => {
                warn!("{} failed to run: {}", invocation.command_line(), e);
                return Err(GitError::SpawnFailed(e.to_string()).into());
            }
            Err(limit) => {
                warn!("{} timed out", invocation.command_line());
                return Err(GitError::Timeout(limit).into());
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if invocation.stderr == StderrMode::Merge {
            stdout.push_str(&stderr);
            stderr.clear();
        }

        debug!("{} exited with {}", invocation.command_line(), exit_code);

        Ok(RawOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
