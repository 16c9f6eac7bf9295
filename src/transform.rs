//! Transform invoker: runs the external filter tool.
//!
//! The filter expression is handed to the child as exactly one argv element;
//! it never goes through a shell. Input is written on stdin while stdout and
//! stderr are drained, so a tool that blocks on a full output pipe cannot
//! deadlock against us.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::PipelineConfig;

/// Failure of a single transform invocation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The tool ran and exited non-zero.
    #[error("filter exited with {status}: {diagnostic}", status = describe_exit(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    /// The tool did not finish within the configured deadline and was killed.
    #[error("filter timed out after {}ms", .after.as_millis())]
    TimedOut { after: Duration },

    /// The tool could not be started or its pipes failed.
    #[error("failed to run filter: {0}")]
    Unavailable(#[source] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Something that can apply a filter expression to a JSON document.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Apply `filter` to the canonical JSON in `input`, returning the tool's output.
    async fn transform(&self, filter: &str, input: Bytes) -> Result<Bytes, TransformError>;
}

/// [`Transformer`] backed by a subordinate process, `jq` by default.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for CommandTransformer {
    fn default() -> Self {
        Self::jq()
    }
}

impl CommandTransformer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    /// `jq` resolved through `PATH`.
    pub fn jq() -> Self {
        Self::new("jq")
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            program: cfg.jq_path.clone(),
            leading_args: cfg.jq_args.clone(),
            timeout: cfg.transform_timeout(),
        }
    }

    /// Arguments placed before the filter expression.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Transformer for CommandTransformer {
    async fn transform(&self, filter: &str, input: Bytes) -> Result<Bytes, TransformError> {
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(filter)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransformError::Unavailable)?;

        tracing::debug!(
            program = %self.program.display(),
            pid = child.id(),
            input_bytes = input.len(),
            "spawned filter process"
        );

        let mut stdin = child.stdin.take().ok_or_else(|| {
            TransformError::Unavailable(io::Error::other("child stdin was not captured"))
        })?;
        let feed = async move {
            let written = stdin.write_all(&input).await;
            // Dropping stdin closes the pipe so the tool sees EOF.
            drop(stdin);
            written
        };
        let run = async move { tokio::join!(feed, child.wait_with_output()) };

        let (fed, output) = match self.timeout {
            Some(after) => tokio::time::timeout(after, run)
                .await
                .map_err(|_| TransformError::TimedOut { after })?,
            None => run.await,
        };
        let output = output.map_err(TransformError::Unavailable)?;

        check_input_delivered(fed)?;

        if output.status.success() {
            return Ok(Bytes::from(output.stdout));
        }

        let stream = if output.stderr.is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        Err(TransformError::Failed {
            exit_code: output.status.code(),
            diagnostic: String::from_utf8_lossy(stream).into_owned(),
        })
    }
}

/// A tool that exits without reading all of stdin closes the pipe early,
/// which is fine. Any other write failure means the tool saw a truncated
/// document and its output cannot be trusted.
fn check_input_delivered(fed: io::Result<()>) -> Result<(), TransformError> {
    match fed {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
            tracing::warn!(error = %err, "failed to write filter input");
            Err(TransformError::Unavailable(err))
        }
        _ => Ok(()),
    }
}
