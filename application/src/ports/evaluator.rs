//! Expression evaluator port — interface for the sandboxed script runtime.
//!
//! This port abstracts the embedded scripting engine so that:
//! - The application layer doesn't depend on the Lua runtime
//! - Policy and command expressions share one evaluation contract
//! - Tests can substitute a scripted fake
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ExpressionEvaluatorPort`] - defined here in application layer
//! - **Adapter**: `LuaEvaluator` - implemented in infrastructure
//!
//! Expressions run with a single context value bound to the global `v` and
//! produce a JSON-like result that call sites coerce via [`EvalValue`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolgate_domain::ToolDefinition;

/// Error from evaluating or precompiling an expression.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expression error: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// The context value expressions observe as the global `v`.
///
/// Policy expressions additionally see the parsed arguments as `v.args`
/// when the raw string parses; command expressions only see the
/// definition and the raw argument string.
#[derive(Debug, Clone, Serialize)]
pub struct EvalContext {
    pub definition: ToolDefinition,
    pub raw_args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl EvalContext {
    /// Context for an approval-policy evaluation.
    pub fn for_policy(definition: &ToolDefinition, raw_args: &str, args: Option<Value>) -> Self {
        Self {
            definition: definition.clone(),
            raw_args: raw_args.to_string(),
            args,
        }
    }

    /// Context for a command-expression evaluation.
    pub fn for_command(definition: &ToolDefinition, raw_args: &str) -> Self {
        Self {
            definition: definition.clone(),
            raw_args: raw_args.to_string(),
            args: None,
        }
    }
}

/// The JSON-like result of an evaluation, with the coercions call sites
/// rely on.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalValue(Value);

impl EvalValue {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// JSON truthiness: `false`, `null`, `0` and `""` are false, anything
    /// else (including empty arrays and objects) is true.
    pub fn as_bool(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Strings verbatim, null as empty, anything else as compact JSON.
    pub fn as_string(&self) -> String {
        match &self.0 {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// The string coercion's UTF-8 bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.as_string().into_bytes()
    }

    /// Finite numbers only; everything else is an error.
    pub fn as_f64(&self) -> Result<f64, EvalError> {
        match &self.0 {
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .ok_or_else(|| EvalError::new("result is not a number")),
            _ => Err(EvalError::new("result is not a number")),
        }
    }
}

/// Port for the expression runtime.
///
/// One engine instance serves all tools; every `evaluate` call runs in a
/// fresh, isolated sandbox. `precompile` resolves and syntax-checks a
/// source (trying it as a file path first, then as inline text) into a
/// process-wide write-once cache keyed by the literal source string.
#[async_trait]
pub trait ExpressionEvaluatorPort: Send + Sync {
    /// Resolve and syntax-check a configured expression source.
    fn precompile(&self, source: &str) -> Result<(), EvalError>;

    /// Evaluate an expression against a context.
    ///
    /// The token cancels host capabilities (`run`, `fetch`) invoked by the
    /// expression; pure computation is not preempted.
    async fn evaluate(
        &self,
        source: &str,
        context: &EvalContext,
        cancel: CancellationToken,
    ) -> Result<EvalValue, EvalError>;
}
