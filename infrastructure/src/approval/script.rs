//! Custom approval script backend.
//!
//! Runs a user-supplied executable with the tool call parameters appended as
//! the final argument. Exit code 0 approves; any other exit code denies.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use toolgate_application::{ApprovalBackend, ApprovalError, ApprovalRequest};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomScriptSettings {
    pub script: String,
    pub args: Vec<String>,
}

pub struct CustomScriptBackend {
    settings: CustomScriptSettings,
}

impl CustomScriptBackend {
    pub fn new(settings: CustomScriptSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ApprovalBackend for CustomScriptBackend {
    fn is_available(&self) -> bool {
        if self.settings.script.is_empty() {
            return false;
        }
        let Ok(metadata) = std::fs::metadata(&self.settings.script) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode() & 0o111 != 0
        }
        #[cfg(not(unix))]
        true
    }

    async fn wait_for_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError> {
        let mut command = Command::new(&self.settings.script);
        command
            .args(&self.settings.args)
            .arg(request.params_json())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = command.status().await.map_err(|e| {
            ApprovalError::Backend(format!("failed to launch approval script: {e}"))
        })?;
        Ok(status.success())
    }
}
