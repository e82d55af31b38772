//! KDialog (KDE question dialog) approval backend.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use toolgate_application::{ApprovalBackend, ApprovalError, ApprovalRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdialogSettings {
    pub title: String,
}

impl Default for KdialogSettings {
    fn default() -> Self {
        Self {
            title: "Tool Approval Required".to_string(),
        }
    }
}

/// Approval dialog via `kdialog --yesno`.
pub struct KdialogBackend {
    settings: KdialogSettings,
}

impl KdialogBackend {
    pub fn new(settings: KdialogSettings) -> Self {
        Self { settings }
    }

    fn command(&self, request: &ApprovalRequest) -> Command {
        let mut command = Command::new("kdialog");
        command
            .arg("--yesno")
            .arg(request.message())
            .arg("--title")
            .arg(&self.settings.title);
        command
    }
}

#[async_trait]
impl ApprovalBackend for KdialogBackend {
    fn is_available(&self) -> bool {
        which::which("kdialog").is_ok()
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
            .map_err(|e| ApprovalError::Backend(format!("failed to launch kdialog: {e}")))?;
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ApprovalError::Backend(format!(
                "kdialog exited unexpectedly: {status}"
            ))),
        }
    }
}
