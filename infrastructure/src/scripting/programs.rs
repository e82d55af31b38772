//! Process-wide cache of precompiled expression sources.
//!
//! Configured expressions are registered once at load time. A source is
//! tried as a filesystem path first; if the file reads, its contents are
//! the program, otherwise the source itself is. Either way the cache key
//! is the literal configured string, and entries are write-once: nothing
//! replaces or evicts them for the life of the process. Sources come
//! from configuration, so the set stays small.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use mlua::prelude::*;
use toolgate_application::EvalError;

/// One resolved program: where it came from and the text that runs.
#[derive(Debug)]
pub struct Program {
    /// The path the source resolved to, when it named a readable file.
    pub path: Option<String>,
    pub text: String,
}

static PROGRAMS: OnceLock<RwLock<HashMap<String, Arc<Program>>>> = OnceLock::new();

fn store() -> &'static RwLock<HashMap<String, Arc<Program>>> {
    PROGRAMS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Look up a previously precompiled source by its literal configured text.
pub fn lookup(source: &str) -> Option<Arc<Program>> {
    store().read().ok()?.get(source).cloned()
}

/// Resolve, syntax-check and cache a configured source.
///
/// Idempotent: a source that is already cached is left untouched, so
/// concurrent registration of the same source is harmless.
pub fn precompile(source: &str) -> Result<(), EvalError> {
    if lookup(source).is_some() {
        return Ok(());
    }

    let program = resolve(source);
    check_syntax(&program)?;

    let mut programs = store()
        .write()
        .map_err(|e| EvalError::new(format!("program cache lock poisoned: {e}")))?;
    programs
        .entry(source.to_string())
        .or_insert_with(|| Arc::new(program));
    Ok(())
}

/// A path that reads wins; anything else is inline program text.
fn resolve(source: &str) -> Program {
    match std::fs::read_to_string(source) {
        Ok(text) => Program {
            path: Some(source.to_string()),
            text,
        },
        Err(_) => Program {
            path: None,
            text: source.to_string(),
        },
    }
}

/// Compile the text in a throwaway VM without running it.
///
/// Mirrors evaluation's expression-or-block handling: a bare expression
/// is compiled as `return <text>`, a statement block as-is.
fn check_syntax(program: &Program) -> Result<(), EvalError> {
    let lua = Lua::new();
    let as_expression = format!("return {}", program.text);
    if lua.load(&as_expression).into_function().is_ok() {
        return Ok(());
    }
    lua.load(&program.text)
        .into_function()
        .map(|_| ())
        .map_err(|e| EvalError::new(format!("invalid expression: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inline_expression_precompiles() {
        precompile("1 + 1").unwrap();
        let program = lookup("1 + 1").unwrap();
        assert!(program.path.is_none());
        assert_eq!(program.text, "1 + 1");
    }

    #[test]
    fn test_statement_block_precompiles() {
        let source = "local x = 2\nreturn x * 2";
        precompile(source).unwrap();
        assert!(lookup(source).is_some());
    }

    #[test]
    fn test_syntax_error_is_rejected_and_not_cached() {
        let source = "this is ; not lua (";
        assert!(precompile(source).is_err());
        assert!(lookup(source).is_none());
    }

    #[test]
    fn test_path_source_loads_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "return 'from file'").unwrap();
        let path = file.path().to_string_lossy().to_string();

        precompile(&path).unwrap();
        let program = lookup(&path).unwrap();
        assert_eq!(program.path.as_deref(), Some(path.as_str()));
        assert!(program.text.contains("from file"));
    }

    #[test]
    fn test_file_with_bad_syntax_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "return return return").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(precompile(&path).is_err());
    }

    #[test]
    fn test_precompile_is_write_once() {
        let source = "'stable'";
        precompile(source).unwrap();
        let first = lookup(source).unwrap();
        precompile(source).unwrap();
        let second = lookup(source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_source_misses() {
        assert!(lookup("never registered anywhere").is_none());
    }
}
