//! Dispatch use case — the gate a tool call passes through.
//!
//! Order is fixed: policy decision, then (if required) the approval
//! request, then command construction and execution. A denied or failed
//! approval means nothing runs.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use toolgate_domain::{DomainError, ToolDefinition};
use tracing::{debug, info};

use crate::ports::approval::{ApprovalRequest, ApprovalRequesterPort};
use crate::ports::evaluator::{EvalContext, ExpressionEvaluatorPort};
use crate::ports::process::ProcessRunnerPort;
use crate::use_cases::policy::ApprovalPolicy;

/// Use case for dispatching one gated tool call.
///
/// Generic over its ports; infrastructure wires the Lua evaluator, the
/// system process runner and the desktop approval requester in here.
pub struct DispatchToolUseCase<E, R, A>
where
    E: ExpressionEvaluatorPort,
    R: ProcessRunnerPort,
    A: ApprovalRequesterPort,
{
    evaluator: Arc<E>,
    runner: Arc<R>,
    approvals: Arc<A>,
    cancellation_token: Option<CancellationToken>,
}

impl<E, R, A> DispatchToolUseCase<E, R, A>
where
    E: ExpressionEvaluatorPort + 'static,
    R: ProcessRunnerPort + 'static,
    A: ApprovalRequesterPort + 'static,
{
    pub fn new(evaluator: Arc<E>, runner: Arc<R>, approvals: Arc<A>) -> Self {
        Self {
            evaluator,
            runner,
            approvals,
            cancellation_token: None,
        }
    }

    /// Attach a cancellation token (e.g. wired to Ctrl-C).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Run one tool call through the gate and return its output bytes.
    pub async fn execute(
        &self,
        definition: &ToolDefinition,
        raw_args: &str,
    ) -> Result<Vec<u8>, DomainError> {
        let cancel = self.cancellation_token.clone().unwrap_or_default();
        self.check_cancelled(&cancel)?;

        let policy = ApprovalPolicy::new(Arc::clone(&self.evaluator));
        if policy.needs_approval(definition, raw_args, &cancel).await {
            info!(tool = %definition.name, "tool call requires approval");
            let request = ApprovalRequest::new(&definition.name, raw_args);
            let approved = self
                .approvals
                .request_approval(&request)
                .await
                .map_err(|e| {
                    DomainError::Approval(format!("error while waiting for approval: {e}"))
                })?;
            if !approved {
                return Err(DomainError::Approval("tool call not approved".to_string()));
            }
            debug!(tool = %definition.name, "tool call approved");
        }
        self.check_cancelled(&cancel)?;

        let output = if definition.uses_expression() {
            let context = EvalContext::for_command(definition, raw_args);
            let value = self
                .evaluator
                .evaluate(&definition.command_expr, &context, cancel.clone())
                .await
                .map_err(|e| {
                    DomainError::Expression(format!("error running expression: {}", e.message))
                })?;
            value.into_bytes()
        } else {
            let descriptor = definition.command_descriptor(raw_args)?;
            debug!(tool = %definition.name, program = %descriptor.name, "running command");
            self.runner
                .run(&descriptor, cancel.clone())
                .await
                .map_err(|e| DomainError::Execution(e.to_string()))?
        };

        self.check_cancelled(&cancel)?;
        Ok(output)
    }

    fn check_cancelled(&self, cancel: &CancellationToken) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::approval::ApprovalError;
    use crate::ports::evaluator::{EvalError, EvalValue};
    use crate::ports::process::ProcessError;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use toolgate_domain::CommandDescriptor;

    struct FakeEvaluator {
        outcome: Result<Value, String>,
        seen_source: Mutex<Option<String>>,
    }

    impl FakeEvaluator {
        fn returning(value: Value) -> Self {
            Self {
                outcome: Ok(value),
                seen_source: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Err(message.to_string()),
                seen_source: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ExpressionEvaluatorPort for FakeEvaluator {
        fn precompile(&self, _source: &str) -> Result<(), EvalError> {
            Ok(())
        }

        async fn evaluate(
            &self,
            source: &str,
            _context: &EvalContext,
            _cancel: CancellationToken,
        ) -> Result<EvalValue, EvalError> {
            *self.seen_source.lock().unwrap() = Some(source.to_string());
            match &self.outcome {
                Ok(value) => Ok(EvalValue::new(value.clone())),
                Err(message) => Err(EvalError::new(message.clone())),
            }
        }
    }

    struct FakeRunner {
        output: Vec<u8>,
        seen_descriptor: Mutex<Option<CommandDescriptor>>,
    }

    impl FakeRunner {
        fn new(output: &[u8]) -> Self {
            Self {
                output: output.to_vec(),
                seen_descriptor: Mutex::new(None),
            }
        }

        fn was_called(&self) -> bool {
            self.seen_descriptor.lock().unwrap().is_some()
        }
    }

    #[async_trait]
    impl ProcessRunnerPort for FakeRunner {
        async fn run(
            &self,
            descriptor: &CommandDescriptor,
            _cancel: CancellationToken,
        ) -> Result<Vec<u8>, ProcessError> {
            *self.seen_descriptor.lock().unwrap() = Some(descriptor.clone());
            Ok(self.output.clone())
        }
    }

    struct FakeRequester {
        outcome: Result<bool, ApprovalError>,
        called: AtomicBool,
    }

    impl FakeRequester {
        fn deciding(approved: bool) -> Self {
            Self {
                outcome: Ok(approved),
                called: AtomicBool::new(false),
            }
        }

        fn failing(error: ApprovalError) -> Self {
            Self {
                outcome: Err(error),
                called: AtomicBool::new(false),
            }
        }

        fn was_called(&self) -> bool {
            self.called.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApprovalRequesterPort for FakeRequester {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<bool, ApprovalError> {
            self.called.store(true, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn template_tool(approval: &str) -> ToolDefinition {
        ToolDefinition {
            name: "greet".to_string(),
            approval: approval.to_string(),
            command: "echo $msg".to_string(),
            ..ToolDefinition::default()
        }
    }

    fn expression_tool(approval: &str) -> ToolDefinition {
        ToolDefinition {
            name: "greet".to_string(),
            approval: approval.to_string(),
            command_expr: "'hi'".to_string(),
            ..ToolDefinition::default()
        }
    }

    fn gate(
        evaluator: FakeEvaluator,
        runner: FakeRunner,
        requester: FakeRequester,
    ) -> (
        DispatchToolUseCase<FakeEvaluator, FakeRunner, FakeRequester>,
        Arc<FakeRunner>,
        Arc<FakeRequester>,
    ) {
        let runner = Arc::new(runner);
        let requester = Arc::new(requester);
        let use_case = DispatchToolUseCase::new(
            Arc::new(evaluator),
            Arc::clone(&runner),
            Arc::clone(&requester),
        );
        (use_case, runner, requester)
    }

    #[tokio::test]
    async fn test_unguarded_tool_runs_without_requester() {
        let (use_case, runner, requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b"hello\n"),
            FakeRequester::deciding(false),
        );

        let output = use_case
            .execute(&template_tool(""), r#"{"msg": "hello"}"#)
            .await
            .unwrap();
        assert_eq!(output, b"hello\n");
        assert!(runner.was_called());
        assert!(!requester.was_called());
    }

    #[tokio::test]
    async fn test_approved_call_runs() {
        let (use_case, runner, requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b"ok"),
            FakeRequester::deciding(true),
        );

        let output = use_case
            .execute(&template_tool("always"), r#"{"msg": "hi"}"#)
            .await
            .unwrap();
        assert_eq!(output, b"ok");
        assert!(requester.was_called());
        assert!(runner.was_called());
    }

    #[tokio::test]
    async fn test_denied_call_never_runs() {
        let (use_case, runner, requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b"ok"),
            FakeRequester::deciding(false),
        );

        let err = use_case
            .execute(&template_tool("always"), r#"{"msg": "hi"}"#)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Approval error: tool call not approved"
        );
        assert!(requester.was_called());
        assert!(!runner.was_called());
    }

    #[tokio::test]
    async fn test_requester_failure_never_runs() {
        let (use_case, runner, _requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b"ok"),
            FakeRequester::failing(ApprovalError::Unavailable),
        );

        let err = use_case
            .execute(&template_tool("always"), r#"{"msg": "hi"}"#)
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("error while waiting for approval: unable to request approval to user")
        );
        assert!(!runner.was_called());
    }

    #[tokio::test]
    async fn test_never_policy_skips_the_requester() {
        let (use_case, runner, requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b"ok"),
            FakeRequester::failing(ApprovalError::Unavailable),
        );

        use_case
            .execute(&template_tool("never"), r#"{"msg": "hi"}"#)
            .await
            .unwrap();
        assert!(!requester.was_called());
        assert!(runner.was_called());
    }

    #[tokio::test]
    async fn test_failing_policy_expression_fails_safe() {
        let (use_case, _runner, requester) = gate(
            FakeEvaluator::failing("nope"),
            FakeRunner::new(b"ok"),
            FakeRequester::deciding(true),
        );

        // Policy evaluation fails, so approval is required; the requester
        // approves and the expression tool then fails the same way.
        let err = use_case
            .execute(&expression_tool("v.args.x"), "{}")
            .await
            .unwrap_err();
        assert!(requester.was_called());
        assert!(err.to_string().contains("error running expression"));
    }

    #[tokio::test]
    async fn test_expression_tool_returns_result_bytes() {
        let (use_case, runner, _requester) = gate(
            FakeEvaluator::returning(json!("built output")),
            FakeRunner::new(b"unused"),
            FakeRequester::deciding(true),
        );

        let output = use_case.execute(&expression_tool(""), "{}").await.unwrap();
        assert_eq!(output, b"built output");
        assert!(!runner.was_called());
    }

    #[tokio::test]
    async fn test_template_tool_builds_descriptor() {
        let (use_case, runner, _requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b""),
            FakeRequester::deciding(true),
        );

        use_case
            .execute(&template_tool(""), r#"{"msg": "hello world"}"#)
            .await
            .unwrap();
        let descriptor = runner.seen_descriptor.lock().unwrap().clone().unwrap();
        assert_eq!(descriptor.name, "echo");
        assert_eq!(descriptor.arguments, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn test_bad_arguments_fail_before_running() {
        let (use_case, runner, _requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b""),
            FakeRequester::deciding(true),
        );

        let err = use_case
            .execute(&template_tool(""), "{oops")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to parse arguments"));
        assert!(!runner.was_called());
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let (use_case, runner, requester) = gate(
            FakeEvaluator::returning(json!(true)),
            FakeRunner::new(b""),
            FakeRequester::deciding(true),
        );
        let token = CancellationToken::new();
        token.cancel();
        let use_case = use_case.with_cancellation(token);

        let err = use_case
            .execute(&template_tool("always"), "{}")
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!requester.was_called());
        assert!(!runner.was_called());
    }
}
