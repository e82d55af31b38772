//! Infrastructure layer for toolgate
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading:
//!
//! - [`scripting`]: the sandboxed Lua expression engine
//! - [`execution`]: child process execution and output capture
//! - [`approval`]: user approval backends (dialogs, notifications, scripts)
//! - [`http`]: the outbound HTTP client behind the `fetch` capability
//! - [`config`]: TOML configuration discovery, merging and validation

pub mod approval;
pub mod config;
pub mod execution;
pub mod http;
pub mod scripting;

// Re-export commonly used types
pub use approval::ApprovalRequester;
pub use config::{ConfigLoader, FileConfig, validate_tools};
pub use execution::SystemProcessRunner;
pub use http::ReqwestHttpClient;
pub use scripting::LuaEvaluator;
