//! Zenity (GTK question dialog) approval backend.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use toolgate_application::{ApprovalBackend, ApprovalError, ApprovalRequest};

/// Dialog settings for zenity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenitySettings {
    pub title: String,
    pub width: u32,
    pub ok_label: String,
    pub cancel_label: String,
}

impl Default for ZenitySettings {
    fn default() -> Self {
        Self {
            title: "Tool Approval Required".to_string(),
            width: 500,
            ok_label: "Approve".to_string(),
            cancel_label: "Deny".to_string(),
        }
    }
}

/// Approval dialog via `zenity --question`.
///
/// Exit 0 approves, exit 1 denies, anything else is a backend failure.
pub struct ZenityBackend {
    settings: ZenitySettings,
}

impl ZenityBackend {
    pub fn new(settings: ZenitySettings) -> Self {
        Self { settings }
    }

    fn command(&self, request: &ApprovalRequest) -> Command {
        let mut command = Command::new("zenity");
        command
            .arg("--question")
            .arg("--title")
            .arg(&self.settings.title)
            .arg("--text")
            .arg(request.message())
            .arg("--width")
            .arg(self.settings.width.to_string())
            .arg("--ok-label")
            .arg(&self.settings.ok_label)
            .arg("--cancel-label")
            .arg(&self.settings.cancel_label);
        command
    }
}

#[async_trait]
impl ApprovalBackend for ZenityBackend {
    fn is_available(&self) -> bool {
        which::which("zenity").is_ok()
    }

    async fn wait_for_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError> {
        let mut command = self.command(request);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = command
            .status()
            .await
            .map_err(|e| ApprovalError::Backend(format!("failed to launch zenity: {e}")))?;
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ApprovalError::Backend(format!(
                "zenity exited unexpectedly: {status}"
            ))),
        }
    }
}
