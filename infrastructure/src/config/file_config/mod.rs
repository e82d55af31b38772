//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain types.

mod approval;
mod tools;

pub use approval::FileApprovalConfig;
pub use tools::FileToolConfig;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use toolgate_domain::ToolDefinition;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Approval settings
    pub approval: FileApprovalConfig,
    /// Configured tools, keyed by tool name
    pub tools: BTreeMap<String, FileToolConfig>,
}

impl FileConfig {
    /// Build the domain definitions for every configured tool, sorted by
    /// tool name.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|(name, tool)| tool.clone().into_definition(name))
            .collect()
    }

    /// Look up one tool by name.
    pub fn tool_definition(&self, name: &str) -> Option<ToolDefinition> {
        self.tools
            .get(name)
            .map(|tool| tool.clone().into_definition(name))
    }
}
