//! notify-send (desktop notification with actions) approval backend.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use toolgate_application::{ApprovalBackend, ApprovalError, ApprovalRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySendSettings {
    pub title: String,
    pub urgency: String,
}

impl Default for NotifySendSettings {
    fn default() -> Self {
        Self {
            title: "Tool Approval Required".to_string(),
            urgency: "critical".to_string(),
        }
    }
}

/// Approval via a desktop notification carrying Approve / Deny actions.
///
/// notify-send prints the index of the chosen action to stdout; "0" is the
/// first action, which is Approve. Dismissing the notification or choosing
/// any other action denies.
pub struct NotifySendBackend {
    settings: NotifySendSettings,
}

impl NotifySendBackend {
    pub fn new(settings: NotifySendSettings) -> Self {
        Self { settings }
    }

    fn command(&self, request: &ApprovalRequest) -> Command {
        let mut command = Command::new("notify-send");
        command
            .arg("-u")
            .arg(&self.settings.urgency)
            .arg("-A")
            .arg("Approve")
            .arg("-A")
            .arg("Deny")
            .arg(&self.settings.title)
            .arg(request.message());
        command
    }
}

#[async_trait]
impl ApprovalBackend for NotifySendBackend {
    fn is_available(&self) -> bool {
        which::which("notify-send").is_ok()
    }

    async fn wait_for_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError> {
        let mut command = self.command(request);
        command.stdin(Stdio::null()).kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| ApprovalError::Backend(format!("failed to launch notify-send: {e}")))?;
        if !output.status.success() {
            return Err(ApprovalError::Backend(format!(
                "notify-send exited unexpectedly: {}",
                output.status
            )));
        }
        let choice = String::from_utf8_lossy(&output.stdout);
        Ok(choice.trim() == "0")
    }
}
