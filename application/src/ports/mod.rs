//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod approval;
pub mod evaluator;
pub mod http;
pub mod process;
