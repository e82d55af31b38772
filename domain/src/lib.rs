//! Domain layer for toolgate
//!
//! This crate contains the core business logic and entities of the
//! approval gate. It has no dependencies on infrastructure concerns.
//!
//! # Core Concepts
//!
//! ## Tool definitions
//!
//! A tool maps a name to either a shell-aware **command template**
//! (`$name` / `$@` expansion, POSIX quoting) or a **command expression**
//! whose evaluated result is the call output.
//!
//! ## Approval policy
//!
//! Each tool carries an `approval` value: empty (no approval), the
//! literals `always` / `never`, or an expression evaluated per call. The
//! policy decision itself lives in the application layer; this crate owns
//! the definition shape and the literals.

pub mod core;
pub mod tool;

// Re-export commonly used types
pub use core::error::DomainError;
pub use tool::{
    APPROVAL_ALWAYS, APPROVAL_NEVER, CommandDescriptor, OutputLimits, ToolArguments,
    ToolDefinition,
};
