//! Tool configuration from TOML (`[tools.<name>]` sections)
//!
//! Each table under `[tools]` declares one tool; the table key is the tool
//! name. Example configuration:
//!
//! ```toml
//! [tools.commit]
//! description = "Commit staged changes"
//! approval = "always"
//! command = "git commit -m $message"
//!
//! [tools.fetch_issue]
//! description = "Fetch an issue as JSON"
//! approval = "never"
//! command_expr = "fetch({url = 'https://api.example.com/issues/' .. v.args.id}).body"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_domain::ToolDefinition;

/// One tool as written in the config file.
///
/// The field names are snake_case TOML keys; [`Self::into_definition`]
/// produces the domain-level [`ToolDefinition`] with defaults applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolConfig {
    /// Description surfaced to the model
    pub description: String,
    /// JSON schema for the tool's arguments
    pub parameters: Option<Value>,
    /// Approval policy: empty, "always", "never", or an expression
    pub approval: String,
    /// Shell-aware command template
    pub command: String,
    /// Command-construction expression; takes precedence over `command`
    pub command_expr: String,
    /// When non-empty, replaces the child's entire environment
    pub env: BTreeMap<String, String>,
    /// Merged over the child's environment
    pub additional_env: BTreeMap<String, String>,
    /// Working directory for the child process
    pub working_dir: String,
}

impl FileToolConfig {
    /// Build the domain definition for the tool named by the table key.
    pub fn into_definition(self, name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: self.description,
            parameters: self.parameters.unwrap_or(Value::Null),
            approval: self.approval,
            command: self.command,
            command_expr: self.command_expr,
            env: self.env,
            additional_env: self.additional_env,
            working_dir: self.working_dir,
        }
        .with_defaults()
    }
}
