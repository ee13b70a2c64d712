/*
 * filename.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive substitution in file and directory paths.
//!
//! Paths use a hardened subset of the content grammar: only `var` and `raw`
//! are honored, every other directive is left in the path text as written.
//! Each `/`-separated component is resolved on its own and then validated,
//! and the assembled path is validated once more. Values coming from
//! variables are held to stricter rules than in content because they are
//! usually supplied by whoever runs the generator.

use crate::ast::VarSpec;
use crate::error::{ParseError, ParseResult};
use crate::evaluator::resolve_variable;
use crate::loader::normalize;
use crate::scanner::{DirectiveKind, has_directive_prefix, scan};
use crate::variables::Variables;
use std::path::{Component, Path};

/// Resolve directives in a `/`-separated relative path.
///
/// A path without directive text is returned unchanged. Otherwise every
/// component must be non-empty, so doubled, leading and trailing `/` fail.
pub fn parse_filename(path: &str, variables: &Variables) -> ParseResult<String> {
    if !has_directive_prefix(path.as_bytes()) {
        return Ok(path.to_string());
    }

    let mut components = Vec::new();
    for component in path.split('/') {
        if component.is_empty() {
            return Err(ParseError::security_violation(format!(
                "path '{}' has an empty component",
                path
            ))
            .with_file(path));
        }
        if !has_directive_prefix(component.as_bytes()) {
            components.push(component.to_string());
            continue;
        }
        let resolved = resolve_component(component, variables).map_err(|e| e.with_file(path))?;
        validate_component(&resolved, component).map_err(|e| e.with_file(path))?;
        components.push(resolved);
    }

    let joined = components.join("/");
    validate_path(&joined).map_err(|e| e.with_file(path))?;
    Ok(joined)
}

fn resolve_component(component: &str, variables: &Variables) -> ParseResult<String> {
    let bytes = component.as_bytes();
    let mut out = String::with_capacity(component.len());
    let mut cursor = 0;

    for m in scan(bytes) {
        out.push_str(&component[cursor..m.start]);
        cursor = m.end;

        match m.kind {
            DirectiveKind::Var => {
                let attach = |e: ParseError| e.with_directive(m.text_str());
                let spec = VarSpec::parse(&m.args_str()).map_err(attach)?;
                let value = resolve_variable(&spec, variables).map_err(attach)?.render();
                validate_value(&value, &spec.name).map_err(attach)?;
                out.push_str(&value);
            }
            DirectiveKind::Raw => out.push_str(&m.args_str()),
            _ => out.push_str(&m.text_str()),
        }
    }
    out.push_str(&component[cursor..]);

    Ok(out)
}

/// Reject variable values that could escape or corrupt the output path.
fn validate_value(value: &str, name: &str) -> ParseResult<()> {
    let problem = if value.contains('\0') {
        "contains a null byte"
    } else if value.contains(':') {
        "contains ':'"
    } else if value == "." {
        "is the current-directory token '.'"
    } else if value.contains("..") {
        "contains a parent-directory sequence '..'"
    } else if value.contains(['/', '\\']) {
        "contains a path separator"
    } else {
        return Ok(());
    };

    Err(ParseError::security_violation(format!(
        "value of variable '{}' {} and cannot be used in a path",
        name, problem
    )))
}

fn validate_component(resolved: &str, original: &str) -> ParseResult<()> {
    let problem = if resolved.trim().is_empty() {
        "is empty"
    } else if resolved == ".." {
        "is a parent-directory segment"
    } else if resolved.contains(['/', '\\']) {
        "contains a path separator"
    } else {
        return Ok(());
    };

    Err(ParseError::security_violation(format!(
        "path component '{}' {} after substitution",
        original, problem
    )))
}

fn validate_path(path: &str) -> ParseResult<()> {
    let normalized = normalize(Path::new(path));
    let problem = if path.starts_with(['/', '\\']) || Path::new(path).is_absolute() {
        "is absolute"
    } else if normalized == Path::new(".") {
        "resolves to the output root"
    } else if normalized.components().next() == Some(Component::ParentDir) {
        "escapes the output root"
    } else {
        return Ok(());
    };

    Err(ParseError::security_violation(format!(
        "resolved path '{}' {}",
        path, problem
    )))
}
