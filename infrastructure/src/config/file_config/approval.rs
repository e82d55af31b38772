//! Approval configuration from TOML (`[approval]` section)

use serde::{Deserialize, Serialize};

use crate::approval::{
    CustomScriptSettings, KdialogSettings, NotifySendSettings, RequesterKind, ZenitySettings,
};

/// Raw approval configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileApprovalConfig {
    /// Seconds to wait for the user's decision, whatever the backend
    pub timeout_secs: u64,
    /// Which backend to use (`auto` probes the host)
    pub requester: RequesterKind,
    /// zenity dialog settings
    pub zenity: ZenitySettings,
    /// kdialog dialog settings
    pub kdialog: KdialogSettings,
    /// notify-send notification settings
    pub notify_send: NotifySendSettings,
    /// Custom approval script settings
    pub custom: CustomScriptSettings,
}

impl Default for FileApprovalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            requester: RequesterKind::default(),
            zenity: ZenitySettings::default(),
            kdialog: KdialogSettings::default(),
            notify_send: NotifySendSettings::default(),
            custom: CustomScriptSettings::default(),
        }
    }
}
