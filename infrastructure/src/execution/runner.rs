//! System process runner implementing `ProcessRunnerPort`.
//!
//! Commands are executed directly (argv semantics, no shell). stdout and
//! stderr write to one shared capture file so the child's output stays in
//! true write order; suppressed streams go to the null device instead.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use toolgate_application::{ProcessError, ProcessRunnerPort};
use toolgate_domain::CommandDescriptor;
use tracing::debug;

use super::output;

/// Process runner backed by `tokio::process`.
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// A raw command line wins over an explicit argv when both are present.
fn resolve_argv(descriptor: &CommandDescriptor) -> Result<(String, Vec<String>), ProcessError> {
    if !descriptor.command.is_empty() {
        let mut words = shell_words::split(&descriptor.command)
            .map_err(|e| {
                ProcessError::InvalidCommand(format!("failed to parse command line: {e}"))
            })?
            .into_iter();
        let Some(program) = words.next() else {
            return Err(ProcessError::InvalidCommand("empty command line".to_string()));
        };
        return Ok((program, words.collect()));
    }
    if descriptor.name.is_empty() {
        return Err(ProcessError::InvalidCommand(
            "descriptor names no program".to_string(),
        ));
    }
    Ok((descriptor.name.clone(), descriptor.arguments.clone()))
}

fn stream_target(capture: &std::fs::File, disabled: bool) -> Result<Stdio, ProcessError> {
    if disabled {
        return Ok(Stdio::null());
    }
    let clone = capture
        .try_clone()
        .map_err(|e| ProcessError::Capture(e.to_string()))?;
    Ok(Stdio::from(clone))
}

#[async_trait]
impl ProcessRunnerPort for SystemProcessRunner {
    async fn run(
        &self,
        descriptor: &CommandDescriptor,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, ProcessError> {
        let (program, arguments) = resolve_argv(descriptor)?;
        let limits = descriptor.output;
        debug!(program = %program, args = arguments.len(), "spawning command");

        let mut command = Command::new(&program);
        command.args(&arguments);
        if !descriptor.env.is_empty() {
            command.env_clear();
            command.envs(&descriptor.env);
        }
        command.envs(&descriptor.additional_env);
        if !descriptor.working_dir.is_empty() {
            command.current_dir(&descriptor.working_dir);
        }

        // One shared sink keeps stdout and stderr interleaved in write order.
        let mut capture =
            tempfile::tempfile().map_err(|e| ProcessError::Capture(e.to_string()))?;
        command.stdin(Stdio::null());
        command.stdout(stream_target(
            &capture,
            limits.is_some_and(|o| o.disable_std_out),
        )?);
        command.stderr(stream_target(
            &capture,
            limits.is_some_and(|o| o.disable_std_err),
        )?);
        command.kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            command.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(e.to_string()))?;

        tokio::select! {
            status = child.wait() => {
                // A nonzero exit is a result, not an error.
                status.map_err(|e| ProcessError::Capture(e.to_string()))?;
            }
            _ = cancel.cancelled() => {
                debug!(program = %program, "cancelled, killing child");
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }

        output::collect(&mut capture, limits.as_ref())
            .map_err(|e| ProcessError::Capture(e.to_string()))
    }
}
