//! Parsed tool-call arguments and their textual rendition.

use serde_json::Value;

use crate::core::error::DomainError;

/// Arguments of a single tool call: the raw JSON string as received,
/// plus the parsed object for named lookup.
///
/// Tool calls always carry a JSON object (`{"msg": "hello"}`); anything
/// else fails to parse and the call is rejected before templating.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    raw: String,
    values: serde_json::Map<String, Value>,
}

impl ToolArguments {
    /// Parse a raw JSON argument string.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let values: serde_json::Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidArguments(format!("failed to parse arguments: {e}")))?;
        Ok(Self {
            raw: raw.to_string(),
            values,
        })
    }

    /// The raw JSON string exactly as received. This is what `$@` expands to.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Argument names in deterministic (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The parsed arguments as a JSON object value.
    pub fn as_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Render a named argument for substitution.
    ///
    /// The value is serialized to JSON and one leading and one trailing
    /// double quote are stripped, so strings render bare (`hello`), numbers
    /// as their JSON text (`13`, `13.12`) and objects/arrays as compact
    /// JSON. A missing name renders as the empty string.
    pub fn render(&self, name: &str) -> String {
        let Some(value) = self.values.get(name) else {
            return String::new();
        };
        let Ok(text) = serde_json::to_string(value) else {
            return String::new();
        };
        let text = text.strip_suffix('"').unwrap_or(&text);
        let text = text.strip_prefix('"').unwrap_or(text);
        text.to_string()
    }
}
