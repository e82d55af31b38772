//! Tool definitions: what a configured tool is and how its calls become
//! concrete process invocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::error::DomainError;
use crate::tool::args::ToolArguments;
use crate::tool::descriptor::CommandDescriptor;
use crate::tool::template;

/// Approval literal: every call requires approval.
pub const APPROVAL_ALWAYS: &str = "always";
/// Approval literal: no call ever requires approval.
pub const APPROVAL_NEVER: &str = "never";

/// A configured tool.
///
/// Exactly one execution strategy applies per call: when `command_expr` is
/// set it takes precedence and the expression's result is the call output;
/// otherwise `command` is expanded as a shell-aware template and executed.
///
/// The serialized field names (`commandExpr`, `additionalEnv`, ...) are the
/// shape expression contexts observe as `v.definition`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub parameters: Value,
    /// Approval policy: empty, `always`, `never`, or an expression.
    pub approval: String,
    /// Shell-aware command template (`$name`, `$@`).
    pub command: String,
    /// Command-construction expression; takes precedence over `command`.
    pub command_expr: String,
    /// When non-empty, replaces the child's entire environment.
    pub env: BTreeMap<String, String>,
    /// Merged over the child's environment.
    pub additional_env: BTreeMap<String, String>,
    pub working_dir: String,
}

impl ToolDefinition {
    /// True when this tool is driven by a command expression.
    pub fn uses_expression(&self) -> bool {
        !self.command_expr.is_empty()
    }

    /// True when `approval` is an expression rather than a literal.
    pub fn approval_is_expression(&self) -> bool {
        !self.approval.is_empty()
            && !self.approval.eq_ignore_ascii_case(APPROVAL_ALWAYS)
            && !self.approval.eq_ignore_ascii_case(APPROVAL_NEVER)
    }

    /// Fill defaults a bare definition omits: parameters default to an
    /// empty object schema.
    pub fn with_defaults(mut self) -> Self {
        if self.parameters.is_null() {
            self.parameters = json!({
                "type": "object",
                "properties": {},
            });
        }
        self
    }

    /// Structural validation; expression syntax is checked separately at
    /// configuration load.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::Configuration(
                "tool definition without a name".to_string(),
            ));
        }
        if self.command.is_empty() && self.command_expr.is_empty() {
            return Err(DomainError::Configuration(format!(
                "Command for tool '{}' is missing",
                self.name
            )));
        }
        Ok(())
    }

    /// Build the process invocation for one call of a template-driven tool.
    ///
    /// Parses `raw_args`, expands the command template into argv and applies
    /// plain substitution to environment values and the working directory.
    pub fn command_descriptor(&self, raw_args: &str) -> Result<CommandDescriptor, DomainError> {
        let args = ToolArguments::parse(raw_args)?;
        let words = template::expand_command_line(&self.command, &args)?;
        let mut words = words.into_iter();
        let Some(program) = words.next() else {
            return Err(DomainError::Configuration(format!(
                "Command for tool '{}' is missing",
                self.name
            )));
        };

        let mut descriptor = CommandDescriptor::argv(program, words.collect());
        descriptor.env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), template::substitute_env_value(v, &args)))
            .collect();
        descriptor.additional_env = self
            .additional_env
            .iter()
            .map(|(k, v)| (k.clone(), template::substitute_env_value(v, &args)))
            .collect();
        descriptor.working_dir = template::substitute_workdir(&self.working_dir, &args);
        Ok(descriptor)
    }
}
