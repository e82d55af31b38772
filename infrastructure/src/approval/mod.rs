//! User approval backends and the requester that drives them.

pub mod kdialog;
pub mod notify;
pub mod requester;
pub mod script;
pub mod zenity;

pub use kdialog::KdialogSettings;
pub use notify::NotifySendSettings;
pub use requester::{ApprovalRequester, RequesterKind};
pub use script::CustomScriptSettings;
pub use zenity::ZenitySettings;
