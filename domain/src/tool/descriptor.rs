//! Concrete process invocations produced by templating or by expressions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything needed to run one child process.
///
/// Either `command` holds a raw command line (split into words at execution
/// time) or `name` + `arguments` hold the argv directly. The serialized
/// field names are the wire shape scripts construct for `run(...)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommandDescriptor {
    /// Raw command line; takes precedence over `name` + `arguments`.
    pub command: String,
    /// Program to execute.
    pub name: String,
    /// Arguments passed to the program.
    pub arguments: Vec<String>,
    /// When non-empty, replaces the child's entire environment.
    pub env: BTreeMap<String, String>,
    /// Merged over the child's environment (inherited or replaced).
    pub additional_env: BTreeMap<String, String>,
    /// Child working directory; empty means inherit.
    pub working_dir: String,
    /// Output capture limits; absent means capture everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputLimits>,
}

impl CommandDescriptor {
    /// A descriptor with an explicit argv.
    pub fn argv(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
            ..Self::default()
        }
    }

    /// A descriptor holding a raw command line.
    pub fn command_line(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// True when neither a command line nor a program name is present.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.name.is_empty()
    }
}

/// Capture limits for a child's combined output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputLimits {
    /// Route stdout to the null device instead of the capture buffer.
    pub disable_std_out: bool,
    /// Route stderr to the null device instead of the capture buffer.
    pub disable_std_err: bool,
    /// Keep this many bytes from the start; negative disables truncation.
    pub first_n_bytes: i64,
    /// Keep this many bytes from the end; negative disables truncation.
    pub last_n_bytes: i64,
}
