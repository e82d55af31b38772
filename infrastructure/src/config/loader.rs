//! Configuration file loader with multi-source merging

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use toolgate_application::ExpressionEvaluatorPort;
use toolgate_domain::DomainError;

use super::file_config::FileConfig;

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./toolgate.toml` or `./.toolgate.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/toolgate/config.toml`
    /// 4. Fallback: `~/.config/toolgate/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        // Add global config (XDG or fallback)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        // Add the project-level config file, if present
        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        // Add explicit config path (highest priority for files)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/toolgate/config.toml if set,
    /// otherwise falls back to ~/.config/toolgate/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolgate").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        for filename in &["toolgate.toml", ".toolgate.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./toolgate.toml or ./.toolgate.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

/// Validate every configured tool: structure plus expression syntax.
///
/// Approval and command expressions are resolved and syntax-checked now so
/// that a broken script fails configuration loading, not the first call.
pub fn validate_tools<E>(config: &FileConfig, evaluator: &E) -> Result<(), DomainError>
where
    E: ExpressionEvaluatorPort + ?Sized,
{
    for definition in config.tool_definitions() {
        definition.validate()?;
        if definition.approval_is_expression() {
            evaluator.precompile(&definition.approval).map_err(|e| {
                DomainError::tool_config(
                    &definition.name,
                    format!("invalid approval expression: {e}"),
                )
            })?;
        }
        if definition.uses_expression() {
            evaluator.precompile(&definition.command_expr).map_err(|e| {
                DomainError::tool_config(
                    &definition.name,
                    format!("invalid command expression: {e}"),
                )
            })?;
        }
    }
    Ok(())
}
