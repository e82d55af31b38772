//! Lua expression engine implementing `ExpressionEvaluatorPort`.
//!
//! Every evaluation builds a fresh Lua 5.4 VM: sandbox applied, the call
//! context bound to the global `v`, and the host capabilities `run`,
//! `fetch`, `log` and `json` registered. Nothing survives from one call
//! to the next, so expressions cannot observe each other.
//!
//! Sources registered at configuration load come back out of the
//! process-wide program cache (see [`super::programs`]); an unregistered
//! source evaluates as inline text.

use std::sync::Arc;

use async_trait::async_trait;
use mlua::prelude::*;
use tokio_util::sync::CancellationToken;
use toolgate_application::{
    EvalContext, EvalError, EvalValue, ExpressionEvaluatorPort, HttpCallRequest, HttpClientPort,
    ProcessRunnerPort,
};
use toolgate_domain::CommandDescriptor;

use super::programs;
use super::sandbox::apply_sandbox;

/// Lua 5.4 evaluator for policy and command expressions.
///
/// Holds the ports its host capabilities delegate to; the VMs themselves
/// are per-call.
pub struct LuaEvaluator<R, H> {
    runner: Arc<R>,
    http: Arc<H>,
}

impl<R, H> LuaEvaluator<R, H>
where
    R: ProcessRunnerPort + 'static,
    H: HttpClientPort + 'static,
{
    pub fn new(runner: Arc<R>, http: Arc<H>) -> Self {
        Self { runner, http }
    }

    /// Build one sandboxed VM with `v` and the host capabilities bound.
    fn build_vm(&self, context: &EvalContext, cancel: &CancellationToken) -> Result<Lua, EvalError> {
        let lua = Lua::new();

        // Apply sandbox
        apply_sandbox(&lua).map_err(|e| EvalError::new(format!("sandbox setup failed: {e}")))?;

        // Bind the call context as `v`
        let v = lua.to_value(context).map_err(lua_to_eval_error)?;
        lua.globals().set("v", v).map_err(lua_to_eval_error)?;

        self.register_run(&lua, cancel).map_err(lua_to_eval_error)?;
        self.register_fetch(&lua, cancel).map_err(lua_to_eval_error)?;
        register_log(&lua).map_err(lua_to_eval_error)?;
        register_json(&lua).map_err(lua_to_eval_error)?;

        Ok(lua)
    }

    /// `run(descriptor)` — execute a command through the runner port and
    /// return its captured output as a string.
    fn register_run(&self, lua: &Lua, cancel: &CancellationToken) -> LuaResult<()> {
        let runner = Arc::clone(&self.runner);
        let cancel = cancel.clone();
        let run_fn = lua.create_async_function(move |lua, descriptor: LuaValue| {
            let runner = Arc::clone(&runner);
            let cancel = cancel.clone();
            async move {
                let descriptor: CommandDescriptor = lua.from_value(descriptor)?;
                let output = runner
                    .run(&descriptor, cancel)
                    .await
                    .map_err(|e| LuaError::external(e.to_string()))?;
                Ok(String::from_utf8_lossy(&output).into_owned())
            }
        })?;
        lua.globals().set("run", run_fn)
    }

    /// `fetch(request)` — perform an HTTP call through the client port.
    fn register_fetch(&self, lua: &Lua, cancel: &CancellationToken) -> LuaResult<()> {
        let http = Arc::clone(&self.http);
        let cancel = cancel.clone();
        let fetch_fn = lua.create_async_function(move |lua, request: LuaValue| {
            let http = Arc::clone(&http);
            let cancel = cancel.clone();
            async move {
                let request: HttpCallRequest = lua.from_value(request)?;
                let response = tokio::select! {
                    result = http.fetch(&request) => {
                        result.map_err(|e| LuaError::external(e.to_string()))?
                    }
                    _ = cancel.cancelled() => {
                        return Err(LuaError::external("fetch cancelled"));
                    }
                };
                lua.to_value(&response)
            }
        })?;
        lua.globals().set("fetch", fetch_fn)
    }
}

/// `log(...)` — stringify the arguments and emit them on the host log.
fn register_log(lua: &Lua) -> LuaResult<()> {
    let log_fn = lua.create_function(|lua, values: LuaMultiValue| {
        let parts: Vec<String> = values
            .iter()
            .map(|value| display_lua_value(lua, value))
            .collect();
        tracing::info!(target: "expression", "{}", parts.join(" "));
        Ok(())
    })?;
    lua.globals().set("log", log_fn)
}

/// `json.encode` / `json.decode` helpers.
fn register_json(lua: &Lua) -> LuaResult<()> {
    let json = lua.create_table()?;
    json.set(
        "encode",
        lua.create_function(|lua, value: LuaValue| {
            let value: serde_json::Value = lua.from_value(value)?;
            serde_json::to_string(&value).map_err(LuaError::external)
        })?,
    )?;
    json.set(
        "decode",
        lua.create_function(|lua, text: String| {
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(LuaError::external)?;
            lua.to_value(&value)
        })?,
    )?;
    lua.globals().set("json", json)
}

fn display_lua_value(lua: &Lua, value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => n.to_string(),
        LuaValue::String(s) => s.to_string_lossy().to_string(),
        other => match lua.from_value::<serde_json::Value>(other.clone()) {
            Ok(json) => json.to_string(),
            Err(_) => format!("<{}>", other.type_name()),
        },
    }
}

#[async_trait]
impl<R, H> ExpressionEvaluatorPort for LuaEvaluator<R, H>
where
    R: ProcessRunnerPort + 'static,
    H: HttpClientPort + 'static,
{
    fn precompile(&self, source: &str) -> Result<(), EvalError> {
        programs::precompile(source)
    }

    async fn evaluate(
        &self,
        source: &str,
        context: &EvalContext,
        cancel: CancellationToken,
    ) -> Result<EvalValue, EvalError> {
        let lua = self.build_vm(context, &cancel)?;

        // Registered sources run their cached text; anything else is
        // inline program text as-is.
        let program = programs::lookup(source);
        let (text, path) = match program.as_deref() {
            Some(p) => (p.text.as_str(), p.path.as_deref()),
            None => (source, None),
        };

        let mut chunk = lua.load(text);
        if let Some(path) = path {
            chunk = chunk.set_name(path);
        }
        let value = chunk
            .eval_async::<LuaValue>()
            .await
            .map_err(lua_to_eval_error)?;

        let json = lua
            .from_value::<serde_json::Value>(value)
            .map_err(|e| EvalError::new(format!("result is not serializable: {e}")))?;
        Ok(EvalValue::new(json))
    }
}

fn lua_to_eval_error(e: LuaError) -> EvalError {
    EvalError::new(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::SystemProcessRunner;
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::sync::Mutex;
    use toolgate_application::{HttpCallResponse, HttpError, ProcessError};
    use toolgate_domain::ToolDefinition;

    struct FakeHttp {
        seen: Mutex<Option<HttpCallRequest>>,
    }

    impl FakeHttp {
        fn new() -> Self {
            Self {
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpClientPort for FakeHttp {
        async fn fetch(&self, request: &HttpCallRequest) -> Result<HttpCallResponse, HttpError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            let mut header = BTreeMap::new();
            header.insert(
                "content-type".to_string(),
                vec!["application/json".to_string()],
            );
            Ok(HttpCallResponse {
                status_code: 200,
                status: "200 OK".to_string(),
                header,
                body: r#"{"greeting": "hello"}"#.to_string(),
            })
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl ProcessRunnerPort for FailingRunner {
        async fn run(
            &self,
            _descriptor: &CommandDescriptor,
            _cancel: CancellationToken,
        ) -> Result<Vec<u8>, ProcessError> {
            Err(ProcessError::SpawnFailed(
                "executable file not found".to_string(),
            ))
        }
    }

    fn engine() -> LuaEvaluator<SystemProcessRunner, FakeHttp> {
        LuaEvaluator::new(Arc::new(SystemProcessRunner::new()), Arc::new(FakeHttp::new()))
    }

    fn context() -> EvalContext {
        let definition = ToolDefinition {
            name: "demo".to_string(),
            command_expr: "'x'".to_string(),
            ..ToolDefinition::default()
        };
        EvalContext::for_command(&definition, r#"{"count": 4}"#)
    }

    async fn eval(source: &str) -> Result<EvalValue, EvalError> {
        engine()
            .evaluate(source, &context(), CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_bare_expression_evaluates() {
        let value = eval("1 + 1").await.unwrap();
        assert_eq!(value.as_f64().unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_statement_block_needs_explicit_return() {
        let value = eval("local x = 'a'\nreturn x .. 'b'").await.unwrap();
        assert_eq!(value.as_string(), "ab");
    }

    #[tokio::test]
    async fn test_context_is_visible_as_v() {
        let value = eval("v.definition.name").await.unwrap();
        assert_eq!(value.as_string(), "demo");

        let value = eval("v.definition.commandExpr").await.unwrap();
        assert_eq!(value.as_string(), "'x'");

        let value = eval("v.raw_args").await.unwrap();
        assert_eq!(value.as_string(), r#"{"count": 4}"#);
    }

    #[tokio::test]
    async fn test_isolation_between_evaluations() {
        eval("leak = 'visible'").await.ok();
        let value = eval("leak == nil").await.unwrap();
        assert!(value.as_bool());
    }

    #[tokio::test]
    async fn test_syntax_error_is_an_eval_error() {
        assert!(eval("this is ; not lua (").await.is_err());
    }

    #[tokio::test]
    async fn test_thrown_error_is_an_eval_error() {
        let err = eval("error('boom')").await.unwrap_err();
        assert!(err.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_nil_result_coerces_to_empty() {
        let value = eval("nil").await.unwrap();
        assert!(!value.as_bool());
        assert_eq!(value.as_string(), "");
    }

    #[tokio::test]
    async fn test_run_executes_and_returns_output() {
        let value = eval("run({name = 'echo', arguments = {'hello'}})")
            .await
            .unwrap();
        assert_eq!(value.as_string(), "hello\n");
    }

    #[tokio::test]
    async fn test_run_applies_output_limits() {
        let value = eval(
            "run({name = 'echo', arguments = {'Echo:', 'Hello', 'World'}, \
             output = {firstNBytes = 1}})",
        )
        .await
        .unwrap();
        assert_eq!(value.as_string(), "E\n{{ 17 bytes skipped }}");
    }

    #[tokio::test]
    async fn test_run_failure_is_trappable_with_pcall() {
        let evaluator =
            LuaEvaluator::new(Arc::new(FailingRunner), Arc::new(FakeHttp::new()));
        let value = evaluator
            .evaluate(
                "local ok, err = pcall(function() return run({name = 'x'}) end)\n\
                 if ok then return 'ran' end\n\
                 return tostring(err)",
                &context(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(value.as_string().contains("failed to start command"));
    }

    #[tokio::test]
    async fn test_fetch_round_trips_through_the_port() {
        let http = Arc::new(FakeHttp::new());
        let evaluator =
            LuaEvaluator::new(Arc::new(SystemProcessRunner::new()), Arc::clone(&http));
        let value = evaluator
            .evaluate(
                "local r = fetch({method = 'POST', url = 'http://example.test/x', \
                 header = {['X-Key'] = 'k'}, body = 'ping'})\n\
                 return r.status .. '|' .. r.body",
                &context(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(value.as_string(), r#"200 OK|{"greeting": "hello"}"#);

        let seen = http.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.url, "http://example.test/x");
        assert_eq!(seen.header["X-Key"], "k");
        assert_eq!(seen.body, "ping");
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let value = eval("json.decode('{\"a\": 5}').a").await.unwrap();
        assert_eq!(value.as_f64().unwrap(), 5.0);

        let value = eval("json.encode({msg = 'hi'})").await.unwrap();
        assert_eq!(value.as_string(), r#"{"msg":"hi"}"#);
    }

    #[tokio::test]
    async fn test_log_is_callable() {
        let value = eval("log('building', 42, {step = 1})\nreturn true")
            .await
            .unwrap();
        assert!(value.as_bool());
    }

    #[tokio::test]
    async fn test_function_result_is_not_serializable() {
        let err = eval("function() end").await.unwrap_err();
        assert!(err.message.contains("not serializable"));
    }

    #[tokio::test]
    async fn test_precompiled_file_source_runs_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "return 'from ' .. v.definition.name").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let evaluator = engine();
        evaluator.precompile(&path).unwrap();
        let value = evaluator
            .evaluate(&path, &context(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value.as_string(), "from demo");
    }

    #[tokio::test]
    async fn test_unregistered_source_runs_inline() {
        // Never precompiled: the source text itself evaluates.
        let value = eval("'inline fallback'").await.unwrap();
        assert_eq!(value.as_string(), "inline fallback");
    }
}
