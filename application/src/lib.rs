//! Application layer for toolgate
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    approval::{ApprovalBackend, ApprovalError, ApprovalRequest, ApprovalRequesterPort},
    evaluator::{EvalContext, EvalError, EvalValue, ExpressionEvaluatorPort},
    http::{HttpCallRequest, HttpCallResponse, HttpClientPort, HttpError},
    process::{ProcessError, ProcessRunnerPort},
};
pub use use_cases::dispatch::DispatchToolUseCase;
pub use use_cases::policy::ApprovalPolicy;
