//! Process runner port — interface for executing command descriptors.
//!
//! - **Port**: [`ProcessRunnerPort`] - defined here in application layer
//! - **Adapter**: `SystemProcessRunner` - implemented in infrastructure
//!
//! The runner owns spawning, output capture and truncation. A child's
//! nonzero exit status is NOT an error at this boundary: the captured
//! output is the result either way, and only failures to run the process
//! at all surface as errors.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolgate_domain::CommandDescriptor;

/// Error from running a command descriptor.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The process could not be started (missing binary, bad workdir, ...).
    #[error("failed to start command: {0}")]
    SpawnFailed(String),

    /// The descriptor names nothing runnable or its command line is
    /// malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Capturing or collecting output failed.
    #[error("failed to capture command output: {0}")]
    Capture(String),
}

/// Port for executing one command descriptor to completion.
#[async_trait]
pub trait ProcessRunnerPort: Send + Sync {
    /// Run the descriptor and return its captured output.
    ///
    /// stdout and stderr interleave into one buffer in write order unless
    /// the descriptor suppresses a stream; head/tail limits from the
    /// descriptor are applied to the combined capture. Cancellation kills
    /// the child and yields whatever was captured up to that point.
    async fn run(
        &self,
        descriptor: &CommandDescriptor,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, ProcessError>;
}
