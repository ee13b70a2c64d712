/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! A template is parsed once into a tree of these nodes. Nodes borrow the
//! template bytes, so text between directives is emitted exactly as written.
//! Each directive node keeps its literal text and line for error reporting.

use crate::error::{ParseError, ParseResult};
use crate::variables::ValueType;
use std::borrow::Cow;

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode<'a> {
    /// Text outside any directive, emitted byte for byte.
    Text(&'a [u8]),

    /// Variable interpolation: `@ign-var:name[:type][=default]@`
    Variable(VariableRef<'a>),

    /// Comment line: `// @ign-comment:name@`
    Comment(CommentRef<'a>),

    /// Literal escape: `@ign-raw:LITERAL@`. Holds LITERAL.
    Raw(&'a [u8]),

    /// Conditional block: `@ign-if:name@...[@ign-else@...]@ign-endif@`
    Conditional(Conditional<'a>),

    /// File inclusion: `@ign-include:path@`
    Include(Include<'a>),
}

/// Where a directive came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveSource<'a> {
    /// The full directive text.
    pub text: &'a [u8],
    /// 1-based line of the directive's opening `@`.
    pub line: usize,
}

impl<'a> DirectiveSource<'a> {
    pub fn text_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.text)
    }

    /// Attach this directive's text and line to an error.
    pub fn attach(&self, err: ParseError) -> ParseError {
        let err = if err.directive.is_none() {
            err.with_directive(self.text_str())
        } else {
            err
        };
        if err.line.is_none() {
            err.with_line(self.line)
        } else {
            err
        }
    }
}

/// The parsed argument of a `var` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    /// Variable name.
    pub name: String,
    /// Optional type annotation (`:string`, `:int`, `:bool`).
    pub ty: Option<ValueType>,
    /// Optional default literal (everything after the first `=`).
    pub default: Option<String>,
}

impl VarSpec {
    /// Parse `name[:type][=default]`.
    ///
    /// The default runs to the end of the argument, so it may itself contain
    /// `:` and `=`.
    pub fn parse(args: &str) -> ParseResult<Self> {
        let (head, default) = match args.split_once('=') {
            Some((head, default)) => (head, Some(default.to_string())),
            None => (args, None),
        };

        let (name, ty) = match head.split_once(':') {
            Some((name, ty)) => {
                let ty = ty.trim();
                let parsed = ValueType::from_annotation(ty).ok_or_else(|| {
                    ParseError::invalid_syntax(format!(
                        "unknown type annotation '{}' (expected string, int or bool)",
                        ty
                    ))
                })?;
                (name, Some(parsed))
            }
            None => (head, None),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::invalid_syntax("variable name is empty"));
        }

        Ok(VarSpec {
            name: name.to_string(),
            ty,
            default,
        })
    }

    /// Extract just the name, without validating the rest of the argument.
    pub fn name_of(args: &str) -> &str {
        let head = args.split_once('=').map_or(args, |(head, _)| head);
        head.split_once(':').map_or(head, |(name, _)| name).trim()
    }
}

/// A variable interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef<'a> {
    pub spec: VarSpec,
    pub source: DirectiveSource<'a>,
}

/// A comment directive, resolved per line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRef<'a> {
    /// Variable whose value replaces the comment line.
    pub name: String,
    pub source: DirectiveSource<'a>,
}

/// A resolved if/[else]/endif region.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional<'a> {
    /// The boolean variable tested.
    pub name: String,
    /// Nodes taken when the variable is true.
    pub then_branch: Vec<TemplateNode<'a>>,
    /// Nodes taken when the variable is false (empty without `else`).
    pub else_branch: Vec<TemplateNode<'a>>,
    /// The `if` directive.
    pub source: DirectiveSource<'a>,
}

/// A file inclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Include<'a> {
    /// The include path as written (root-relative when it starts with `/`).
    pub path: String,
    pub source: DirectiveSource<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn test_var_spec_name_only() {
        let spec = VarSpec::parse("name").unwrap();
        assert_eq!(spec.name, "name");
        assert_eq!(spec.ty, None);
        assert_eq!(spec.default, None);
    }

    #[test]
    fn test_var_spec_with_type_and_default() {
        let spec = VarSpec::parse("port:int=8080").unwrap();
        assert_eq!(spec.name, "port");
        assert_eq!(spec.ty, Some(ValueType::Int));
        assert_eq!(spec.default.as_deref(), Some("8080"));
    }

    #[test]
    fn test_var_spec_default_without_type() {
        let spec = VarSpec::parse("greeting=hello").unwrap();
        assert_eq!(spec.ty, None);
        assert_eq!(spec.default.as_deref(), Some("hello"));
    }

    #[test]
    fn test_var_spec_default_keeps_separators() {
        let spec = VarSpec::parse("url:string=http://host:80/?a=b").unwrap();
        assert_eq!(spec.ty, Some(ValueType::String));
        assert_eq!(spec.default.as_deref(), Some("http://host:80/?a=b"));
    }

    #[test]
    fn test_var_spec_empty_default() {
        let spec = VarSpec::parse("suffix=").unwrap();
        assert_eq!(spec.default.as_deref(), Some(""));
    }

    #[test]
    fn test_var_spec_trims_name() {
        assert_eq!(VarSpec::parse(" name ").unwrap().name, "name");
    }

    #[test]
    fn test_var_spec_rejects_empty_name() {
        let err = VarSpec::parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
        let err = VarSpec::parse(":int=3").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_var_spec_rejects_unknown_type() {
        let err = VarSpec::parse("port:float").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
        assert!(err.message.contains("float"));
    }

    #[test]
    fn test_name_of() {
        assert_eq!(VarSpec::name_of("port:int=8080"), "port");
        assert_eq!(VarSpec::name_of("x=a:b"), "x");
        assert_eq!(VarSpec::name_of(" y "), "y");
    }

    #[test]
    fn test_directive_source_attach() {
        let source = DirectiveSource {
            text: b"@ign-var:x@",
            line: 4,
        };
        let err = source.attach(ParseError::missing_variable("x"));
        assert_eq!(err.line, Some(4));
        assert_eq!(err.directive.as_deref(), Some("@ign-var:x@"));
    }
}
