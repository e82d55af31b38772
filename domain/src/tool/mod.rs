//! Tool domain module
//!
//! This module defines how a configured tool turns one call's raw JSON
//! arguments into a concrete, runnable process invocation.
//!
//! # Overview
//!
//! Every tool is a [`ToolDefinition`]: a name, an approval policy and
//! exactly one execution strategy. Static tools carry a shell-aware
//! `command` template; dynamic tools carry a `commandExpr` whose evaluated
//! result *is* the call output.
//!
//! ```text
//! ┌─────────────────┐    ┌───────────────────┐    ┌────────────────────┐
//! │ ToolDefinition  │───▶│ ToolArguments     │───▶│ CommandDescriptor  │
//! │ (configuration) │    │ (one call's args) │    │ (argv, env, limits)│
//! └─────────────────┘    └───────────────────┘    └────────────────────┘
//! ```
//!
//! # Templating rules
//!
//! The `command` template is expanded with POSIX-style quoting before word
//! splitting: `$name` inside double quotes stays one argv entry, unquoted
//! it field-splits, and `"$@"` passes the raw JSON argument string through
//! verbatim as a single entry. Environment values and the working
//! directory use plain whole-string substitution instead (see
//! [`template`]), and `env` replaces the child environment outright while
//! `additionalEnv` merges over it.
//!
//! # Architecture
//!
//! - **Domain** (this module): pure construction, no I/O
//! - **Application** (`ProcessRunnerPort` et al.): ports consuming
//!   [`CommandDescriptor`]s
//! - **Infrastructure** (`SystemProcessRunner`): concrete execution with
//!   process spawning and output capture

pub mod args;
pub mod definition;
pub mod descriptor;
pub mod template;

pub use args::ToolArguments;
pub use definition::{APPROVAL_ALWAYS, APPROVAL_NEVER, ToolDefinition};
pub use descriptor::{CommandDescriptor, OutputLimits};
