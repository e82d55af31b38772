//! Approval ports — how the gate asks a human for permission.
//!
//! Two contracts live here:
//! - [`ApprovalBackend`] - one concrete way of asking (a desktop dialog, a
//!   notification, a custom script), implemented in infrastructure
//! - [`ApprovalRequesterPort`] - the single entry the dispatch use case
//!   sees; the infrastructure requester picks a backend and wraps every
//!   request in a uniform timeout
//!
//! A request yields exactly one decision: approved, denied, or an error.
//! Errors are never approvals.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

/// One pending approval: which tool wants to run, with which arguments.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub tool_name: String,
    /// Raw JSON argument string of the call.
    pub arguments_json: String,
}

impl ApprovalRequest {
    pub fn new(tool_name: impl Into<String>, arguments_json: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments_json: arguments_json.into(),
        }
    }

    fn parsed_arguments(&self) -> Option<Value> {
        serde_json::from_str(&self.arguments_json)
            .ok()
            .filter(|v: &Value| !v.is_null())
    }

    /// The human-readable prompt shown by dialog backends.
    pub fn message(&self) -> String {
        let mut message = format!("Tool: {}\n\n", self.tool_name);
        if self.arguments_json.is_empty() {
            return message;
        }
        match serde_json::from_str::<Value>(&self.arguments_json) {
            Ok(Value::Null) => {}
            Ok(args) => {
                message.push_str("Arguments:\n");
                let pretty = serde_json::to_string_pretty(&args)
                    .unwrap_or_else(|_| self.arguments_json.clone());
                message.push_str(&pretty);
            }
            // Unparseable arguments are still shown; the human deciding
            // should see what the tool call carried.
            Err(_) => {
                message.push_str("Arguments:\n");
                message.push_str(&self.arguments_json);
            }
        }
        message
    }

    /// The machine-readable form handed to custom approval scripts.
    pub fn params_json(&self) -> String {
        let params = match self.parsed_arguments() {
            Some(args) => json!({"name": self.tool_name, "arguments": args}),
            None => json!({"name": self.tool_name}),
        };
        params.to_string()
    }
}

/// Error type for approval operations.
///
/// These errors represent failures to obtain a decision, not decisions
/// made by the user.
#[derive(Debug, Clone)]
pub enum ApprovalError {
    /// No approval backend is usable on this system.
    Unavailable,
    /// The user did not decide within the configured window.
    Timeout(Duration),
    /// A backend failed while asking (launch failure, dialog crash, ...).
    Backend(String),
}

impl std::fmt::Display for ApprovalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalError::Unavailable => write!(f, "unable to request approval to user"),
            ApprovalError::Timeout(window) => {
                write!(f, "approval request timed out after {window:?}")
            }
            ApprovalError::Backend(msg) => write!(f, "approval request failed: {msg}"),
        }
    }
}

impl std::error::Error for ApprovalError {}

/// One concrete approval strategy.
#[async_trait]
pub trait ApprovalBackend: Send + Sync {
    /// Cheap availability probe with no side effects.
    fn is_available(&self) -> bool;

    /// Present the request and wait for the user's decision.
    ///
    /// `Ok(true)` approve, `Ok(false)` deny, `Err` infrastructure failure.
    async fn wait_for_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError>;
}

/// Port for requesting a single approval decision.
#[async_trait]
pub trait ApprovalRequesterPort: Send + Sync {
    async fn request_approval(&self, request: &ApprovalRequest) -> Result<bool, ApprovalError>;
}
