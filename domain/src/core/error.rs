//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Expression error: {0}")]
    Expression(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Approval error: {0}")]
    Approval(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Configuration error for a named tool.
    pub fn tool_config(tool: &str, message: impl Into<String>) -> Self {
        DomainError::Configuration(format!("tool '{}': {}", tool, message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::Configuration("x".to_string()).is_cancelled());
        assert!(!DomainError::Execution("x".to_string()).is_cancelled());
        assert!(!DomainError::Approval("denied".to_string()).is_cancelled());
    }

    #[test]
    fn test_tool_config_names_the_tool() {
        let error = DomainError::tool_config("deploy", "command is missing");
        assert_eq!(
            error.to_string(),
            "Configuration error: tool 'deploy': command is missing"
        );
    }
}
