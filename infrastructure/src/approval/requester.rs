//! Approval requester: backend selection plus the uniform response timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toolgate_application::{ApprovalBackend, ApprovalError, ApprovalRequest, ApprovalRequesterPort};
use tracing::{debug, warn};

use super::kdialog::KdialogBackend;
use super::notify::NotifySendBackend;
use super::script::CustomScriptBackend;
use super::zenity::ZenityBackend;
use crate::config::FileApprovalConfig;

/// Which approval backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequesterKind {
    #[default]
    Auto,
    Zenity,
    Kdialog,
    NotifySend,
    Custom,
}

/// Wraps the selected backend and enforces a single response timeout on
/// every request, whatever the backend.
///
/// Backend selection happens once, at construction. An explicitly configured
/// backend is used only if it is available on this host; otherwise every
/// request fails rather than silently falling back to another mechanism. The
/// `auto` kind probes notify-send, zenity and kdialog in that order and falls
/// back to the custom script as a last resort.
pub struct ApprovalRequester {
    backend: Option<Arc<dyn ApprovalBackend>>,
    timeout: Duration,
}

impl ApprovalRequester {
    pub fn from_config(config: &FileApprovalConfig) -> Self {
        let backend = select_backend(config);
        if backend.is_none() {
            warn!(
                requester = ?config.requester,
                "no approval backend available, approval requests will fail"
            );
        }
        Self {
            backend,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    #[cfg(test)]
    fn with_backend(backend: Option<Arc<dyn ApprovalBackend>>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }
}

fn select_backend(config: &FileApprovalConfig) -> Option<Arc<dyn ApprovalBackend>> {
    match config.requester {
        RequesterKind::Zenity => available_only(ZenityBackend::new(config.zenity.clone())),
        RequesterKind::Kdialog => available_only(KdialogBackend::new(config.kdialog.clone())),
        RequesterKind::NotifySend => {
            available_only(NotifySendBackend::new(config.notify_send.clone()))
        }
        RequesterKind::Custom => available_only(CustomScriptBackend::new(config.custom.clone())),
        RequesterKind::Auto => {
            let notify = NotifySendBackend::new(config.notify_send.clone());
            if notify.is_available() {
                debug!("selected notify-send approval backend");
                return Some(Arc::new(notify));
            }
            let zenity = ZenityBackend::new(config.zenity.clone());
            if zenity.is_available() {
                debug!("selected zenity approval backend");
                return Some(Arc::new(zenity));
            }
            let kdialog = KdialogBackend::new(config.kdialog.clone());
            if kdialog.is_available() {
                debug!("selected kdialog approval backend");
                return Some(Arc::new(kdialog));
            }
            // Last resort. Availability is only known when the script runs.
            debug!("selected custom script approval backend");
            Some(Arc::new(CustomScriptBackend::new(config.custom.clone())))
        }
    }
}

fn available_only<B>(backend: B) -> Option<Arc<dyn ApprovalBackend>>
where
    B: ApprovalBackend + 'static,
{
    if backend.is_available() {
        Some(Arc::new(backend))
    } else {
        None
    }
}

#[async_trait]
impl ApprovalRequesterPort for ApprovalRequester {
    async fn request_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError> {
        let Some(backend) = &self.backend else {
            return Err(ApprovalError::Unavailable);
        };
        debug!(tool = %request.tool_name, "requesting user approval");
        match tokio::time::timeout(self.timeout, backend.wait_for_approval(request)).await {
            Ok(decision) => decision,
            Err(_) => Err(ApprovalError::Timeout(self.timeout)),
        }
    }
}
