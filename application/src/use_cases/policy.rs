//! Approval policy decision.
//!
//! Maps a tool's `approval` value to a per-call boolean: does this call
//! need a human decision before anything runs?
//!
//! - empty → no approval
//! - `always` / `never` (case-insensitive) → fixed decision
//! - anything else → evaluated as an expression; the result's truthiness
//!   decides
//!
//! A failing expression requires approval. The policy can misconfigure
//! itself into asking too often, never into silently running.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{APPROVAL_ALWAYS, APPROVAL_NEVER, ToolDefinition};
use tracing::{debug, warn};

use crate::ports::evaluator::{EvalContext, ExpressionEvaluatorPort};

/// Use case deciding whether one tool call needs approval.
pub struct ApprovalPolicy<E: ExpressionEvaluatorPort> {
    evaluator: Arc<E>,
}

impl<E: ExpressionEvaluatorPort + 'static> ApprovalPolicy<E> {
    pub fn new(evaluator: Arc<E>) -> Self {
        Self { evaluator }
    }

    /// Decide for one call.
    ///
    /// Expression policies see `v.definition`, `v.raw_args` and, when the
    /// raw string parses as an object, `v.args`.
    pub async fn needs_approval(
        &self,
        definition: &ToolDefinition,
        raw_args: &str,
        cancel: &CancellationToken,
    ) -> bool {
        let policy = definition.approval.as_str();
        if policy.is_empty() {
            return false;
        }
        if policy.eq_ignore_ascii_case(APPROVAL_ALWAYS) {
            return true;
        }
        if policy.eq_ignore_ascii_case(APPROVAL_NEVER) {
            return false;
        }

        let args = match serde_json::from_str::<serde_json::Map<String, Value>>(raw_args) {
            Ok(map) => Some(Value::Object(map)),
            Err(e) => {
                debug!(
                    tool = %definition.name,
                    "arguments not usable in approval context: {e}"
                );
                None
            }
        };

        let context = EvalContext::for_policy(definition, raw_args, args);
        match self.evaluator.evaluate(policy, &context, cancel.clone()).await {
            Ok(value) => value.as_bool(),
            Err(e) => {
                warn!(
                    tool = %definition.name,
                    "approval expression failed, requiring approval: {}", e.message
                );
                true
            }
        }
    }
}
