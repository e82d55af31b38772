//! Shell-aware command templating.
//!
//! A command template is expanded with POSIX-style quoting rules before it
//! is split into words:
//!
//! - `$name` expands to the rendered argument, `$@` to the raw JSON string.
//! - Inside double quotes an expansion stays one word; outside quotes it
//!   undergoes word splitting, and an empty expansion drops out entirely.
//! - Inside single quotes nothing expands.
//!
//! Environment values and the working directory use plain whole-string
//! substitution instead (no quoting, no splitting); `$@` is honored in
//! environment values but not in the working directory.

use crate::core::error::DomainError;
use crate::tool::args::ToolArguments;

#[derive(Clone, Copy, PartialEq)]
enum QuoteState {
    None,
    Single,
    Double,
}

/// Expand a command template and split it into words.
///
/// The first word is the program, the rest are its arguments. Unbalanced
/// quotes and similar syntax problems are argument errors.
pub fn expand_command_line(
    template: &str,
    args: &ToolArguments,
) -> Result<Vec<String>, DomainError> {
    let expanded = substitute_quoted(template, args);
    shell_words::split(&expanded).map_err(|e| {
        DomainError::InvalidArguments(format!("failed to parse command '{template}': {e}"))
    })
}

/// Quote-state walk over the template, replacing `$name` / `${name}` / `$@`
/// with escaped renditions appropriate to the surrounding quote context.
fn substitute_quoted(template: &str, args: &ToolArguments) -> String {
    let mut out = String::with_capacity(template.len());
    let mut state = QuoteState::None;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            QuoteState::Single => {
                if c == '\'' {
                    state = QuoteState::None;
                }
                out.push(c);
            }
            QuoteState::None | QuoteState::Double => match c {
                '\\' => {
                    // The escaped character is taken literally, never expanded.
                    out.push(c);
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '\'' if state == QuoteState::None => {
                    state = QuoteState::Single;
                    out.push(c);
                }
                '"' => {
                    state = match state {
                        QuoteState::Double => QuoteState::None,
                        _ => QuoteState::Double,
                    };
                    out.push(c);
                }
                '$' => match parse_expansion(&mut chars) {
                    Some(Expansion::AllArgs) => {
                        out.push_str(&escape_for(state, args.raw()));
                    }
                    Some(Expansion::Named(name)) => {
                        out.push_str(&escape_for(state, &args.render(&name)));
                    }
                    None => out.push('$'),
                },
                _ => out.push(c),
            },
        }
    }
    out
}

enum Expansion {
    Named(String),
    AllArgs,
}

/// Parse what follows a `$`: `@`, a bare identifier, or `{identifier}`.
/// Anything else leaves the `$` literal.
fn parse_expansion(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Expansion> {
    match chars.peek() {
        Some('@') => {
            chars.next();
            Some(Expansion::AllArgs)
        }
        Some('{') => {
            chars.next();
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    return Some(Expansion::Named(name));
                }
                name.push(c);
            }
            // Unterminated brace; keep what we consumed as a name.
            Some(Expansion::Named(name))
        }
        Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            Some(Expansion::Named(name))
        }
        _ => None,
    }
}

/// Escape an expanded value so the subsequent word split reproduces it.
///
/// In a double-quoted context only the quote and backslash need escaping.
/// Unquoted, quotes and backslashes are escaped but whitespace is left
/// bare so the value field-splits, and an empty value vanishes.
fn escape_for(state: QuoteState, value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match state {
            QuoteState::Double => {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            _ => {
                if c == '"' || c == '\'' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out
}

/// Plain substitution for environment values: every `$name` occurrence is
/// replaced with its rendition, then `$@` with the raw JSON string.
///
/// Names are applied longest-first so `$abc` is never clobbered by `$ab`.
pub fn substitute_env_value(value: &str, args: &ToolArguments) -> String {
    let mut out = substitute_names(value, args);
    out = out.replace("$@", args.raw());
    out
}

/// Working-directory substitution: like environment values but without `$@`.
pub fn substitute_workdir(value: &str, args: &ToolArguments) -> String {
    substitute_names(value, args)
}

fn substitute_names(value: &str, args: &ToolArguments) -> String {
    let mut names: Vec<&str> = args.names().collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let mut out = value.to_string();
    for name in names {
        let pattern = format!("${name}");
        if out.contains(&pattern) {
            out = out.replace(&pattern, &args.render(name));
        }
    }
    out
}
