/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for directive parsing and evaluation.
//!
//! Every failure raised by the engine is a [`ParseError`] tagged with a
//! [`ParseErrorKind`]. The kind is a fixed vocabulary so callers can decide
//! what is fatal; for example a generation run treats
//! [`ParseErrorKind::SecurityViolation`] as a hard stop even when it records
//! and skips every other per-file failure.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A directive used a verb the engine does not know.
    UnknownDirective,
    /// A referenced variable has no value and no default.
    MissingVariable,
    /// A variable's stored kind disagrees with the requested kind.
    TypeMismatch,
    /// An `if` was never closed by an `endif`.
    UnclosedBlock,
    /// An include target is already open further up the include stack.
    CircularInclude,
    /// Includes are nested deeper than the configured ceiling.
    MaxIncludeDepth,
    /// An include target could not be read.
    IncludeNotFound,
    /// A directive is malformed or misplaced.
    InvalidSyntax,
    /// A path substitution would escape or corrupt the output tree.
    SecurityViolation,
}

impl ParseErrorKind {
    /// Short machine-friendly name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnknownDirective => "unknown directive",
            ParseErrorKind::MissingVariable => "missing variable",
            ParseErrorKind::TypeMismatch => "type mismatch",
            ParseErrorKind::UnclosedBlock => "unclosed block",
            ParseErrorKind::CircularInclude => "circular include",
            ParseErrorKind::MaxIncludeDepth => "max include depth exceeded",
            ParseErrorKind::IncludeNotFound => "include not found",
            ParseErrorKind::InvalidSyntax => "invalid directive syntax",
            ParseErrorKind::SecurityViolation => "security violation",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised while scanning, parsing or evaluating directives.
#[derive(Debug, Error)]
#[error("{kind}: {message}{}", describe_location(.file, .line, .directive))]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Human-readable description.
    pub message: String,
    /// File being processed when the failure happened, if known.
    pub file: Option<PathBuf>,
    /// 1-based line of the offending directive, if known.
    pub line: Option<usize>,
    /// Literal text of the offending directive, if any.
    pub directive: Option<String>,
    /// Underlying cause (e.g. the I/O error behind an unreadable include).
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ParseError {
    /// Create an error with a kind and message and no location.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
            directive: None,
            cause: None,
        }
    }

    pub fn unknown_directive(verb: &str) -> Self {
        Self::new(
            ParseErrorKind::UnknownDirective,
            format!("unknown directive verb '{}'", verb),
        )
    }

    pub fn missing_variable(name: &str) -> Self {
        Self::new(
            ParseErrorKind::MissingVariable,
            format!("variable '{}' is not defined", name),
        )
    }

    pub fn type_mismatch(name: &str, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::TypeMismatch,
            format!(
                "variable '{}' is {} but {} was expected",
                name, found, expected
            ),
        )
    }

    pub fn invalid_syntax(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidSyntax, message)
    }

    pub fn security_violation(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::SecurityViolation, message)
    }

    /// Attach the file being processed.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach the file being processed, if one is known and none is set yet.
    pub fn with_file_opt(mut self, file: Option<&Path>) -> Self {
        if self.file.is_none() {
            self.file = file.map(Path::to_path_buf);
        }
        self
    }

    /// Attach the line of the offending directive.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach the literal directive text.
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    /// Attach an underlying cause.
    pub fn with_cause(
        mut self,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Whether this is a filename security violation.
    pub fn is_security_violation(&self) -> bool {
        self.kind == ParseErrorKind::SecurityViolation
    }
}

fn describe_location(
    file: &Option<PathBuf>,
    line: &Option<usize>,
    directive: &Option<String>,
) -> String {
    let mut out = String::new();
    match (file, line) {
        (Some(file), Some(line)) => out.push_str(&format!(" ({}:{})", file.display(), line)),
        (Some(file), None) => out.push_str(&format!(" ({})", file.display())),
        (None, Some(line)) => out.push_str(&format!(" (line {})", line)),
        (None, None) => {}
    }
    if let Some(directive) = directive {
        out.push_str(&format!(" in `{}`", directive));
    }
    out
}

/// Result type for directive operations.
pub type ParseResult<T> = Result<T, ParseError>;
