//! CLI entrypoint for toolgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use toolgate_application::DispatchToolUseCase;
use toolgate_infrastructure::{
    ApprovalRequester, ConfigLoader, FileConfig, LuaEvaluator, ReqwestHttpClient,
    SystemProcessRunner, validate_tools,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI arguments for toolgate
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(version, about = "Approval-gated command execution for agent tools")]
#[command(long_about = r#"
Toolgate turns declarative tool definitions into guarded command executions.

Each tool is declared in TOML with either a shell-aware command template or
a command-construction expression. Before anything runs, the tool's approval
policy decides whether the user must confirm the call via a desktop dialog,
notification or custom script.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./toolgate.toml     Project-level config
3. ~/.config/toolgate/config.toml   Global config

Example:
  toolgate check
  toolgate tools
  toolgate call hello '{"name": "world"}'
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    no_config: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration, including expression syntax
    Check,
    /// List the configured tools
    Tools,
    /// Run one tool call through the approval gate
    Call {
        /// Name of the configured tool
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level. Logs go to stderr so
    // that `call` output stays pipeable.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    debug!(tools = config.tools.len(), "configuration loaded");

    match cli.command {
        Command::Check => check(&config),
        Command::Tools => {
            list_tools(&config);
            Ok(())
        }
        Command::Call { tool, args } => call(&config, &tool, &args).await,
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))
}

/// Validate every configured tool and report the result.
fn check(config: &FileConfig) -> Result<()> {
    ConfigLoader::print_config_sources();
    println!();

    let evaluator = LuaEvaluator::new(
        Arc::new(SystemProcessRunner::new()),
        Arc::new(ReqwestHttpClient::new()?),
    );
    validate_tools(config, &evaluator)?;
    println!("Configuration OK ({} tools)", config.tools.len());
    Ok(())
}

fn list_tools(config: &FileConfig) {
    for definition in config.tool_definitions() {
        let kind = if definition.uses_expression() {
            "expression"
        } else {
            "command"
        };
        let approval = if definition.approval.is_empty() {
            "none"
        } else if definition.approval_is_expression() {
            "expression"
        } else {
            definition.approval.as_str()
        };
        let line = format!(
            "{:<24} {:<12} {:<12} {}",
            definition.name, kind, approval, definition.description
        );
        println!("{}", line.trim_end());
    }
}

/// Run one tool call through the gate and write its output to stdout.
async fn call(config: &FileConfig, tool: &str, args: &str) -> Result<()> {
    let Some(definition) = config.tool_definition(tool) else {
        bail!("unknown tool '{tool}'");
    };

    // === Dependency Injection ===
    let runner = Arc::new(SystemProcessRunner::new());
    let http = Arc::new(ReqwestHttpClient::new()?);
    let evaluator = Arc::new(LuaEvaluator::new(Arc::clone(&runner), http));
    let approvals = Arc::new(ApprovalRequester::from_config(&config.approval));

    // Validation also precompiles every configured expression, so the call
    // below evaluates from the cache.
    validate_tools(config, evaluator.as_ref())?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    let use_case = DispatchToolUseCase::new(evaluator, runner, approvals).with_cancellation(token);
    let output = use_case.execute(&definition, args).await?;

    let mut stdout = std::io::stdout();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}
