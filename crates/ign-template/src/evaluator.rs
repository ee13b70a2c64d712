/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation engine.
//!
//! Evaluation walks the AST top-down in three steps:
//!
//! 1. Structure: conditionals pick a branch, includes are loaded and fully
//!    processed, raw escapes become inert literals. The result is a flat list
//!    of [`Segment`]s. Nodes in a discarded branch are never visited.
//! 2. Comments: lines holding a comment directive lose their comment markers
//!    and take the variable's value.
//! 3. Variables: remaining interpolations are rendered.
//!
//! Literal segments (raw escapes and include output) pass through steps 2
//! and 3 untouched, so nothing they contain is ever reinterpreted.

use crate::ast::{Conditional, Include, TemplateNode, VarSpec, VariableRef};
use crate::comment::resolve_comments;
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::loader::resolve_include_path;
use crate::parser::Template;
use crate::scanner::has_directive_prefix;
use crate::variables::{Value, ValueType, Variables};
use std::borrow::Cow;

/// A piece of output produced by the structural step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'t> {
    /// Template text; comment markers may live here.
    Text(Cow<'t, [u8]>),
    /// Output that must not be reinterpreted.
    Literal(Cow<'t, [u8]>),
    /// A pending variable interpolation.
    Variable(&'t VariableRef<'t>),
    /// A pending comment directive.
    Comment(&'t crate::ast::CommentRef<'t>),
}

impl Template<'_> {
    /// Render this template with the given context.
    ///
    /// Either the whole template resolves or an error is returned; there is
    /// no partial output.
    pub fn render(&self, ctx: &ParseContext<'_>) -> ParseResult<Vec<u8>> {
        render_nodes(&self.nodes, ctx)
            .map_err(|e| e.with_file_opt(self.filename().or_else(|| ctx.current_file())))
    }
}

/// Process content with a fresh context.
pub fn parse(content: &[u8], variables: &Variables) -> ParseResult<Vec<u8>> {
    parse_with_context(content, &ParseContext::new(variables))
}

/// Process content with caller-supplied include state.
pub fn parse_with_context(content: &[u8], ctx: &ParseContext<'_>) -> ParseResult<Vec<u8>> {
    if !has_directive_prefix(content) {
        return Ok(content.to_vec());
    }
    let template = Template::compile_with_filename(content, ctx.current_file())?;
    template.render(ctx)
}

fn render_nodes<'t>(nodes: &'t [TemplateNode<'t>], ctx: &ParseContext<'_>) -> ParseResult<Vec<u8>> {
    let mut segments = Vec::new();
    collect_segments(nodes, ctx, &mut segments)?;
    let segments = resolve_comments(segments, ctx.variables)?;
    interpolate(&segments, ctx.variables)
}

fn collect_segments<'t>(
    nodes: &'t [TemplateNode<'t>],
    ctx: &ParseContext<'_>,
    out: &mut Vec<Segment<'t>>,
) -> ParseResult<()> {
    for node in nodes {
        match node {
            TemplateNode::Text(text) => out.push(Segment::Text(Cow::Borrowed(*text))),
            TemplateNode::Raw(literal) => out.push(Segment::Literal(Cow::Borrowed(*literal))),
            TemplateNode::Variable(var) => out.push(Segment::Variable(var)),
            TemplateNode::Comment(comment) => out.push(Segment::Comment(comment)),
            TemplateNode::Conditional(block) => {
                let branch = select_branch(block, ctx.variables)?;
                collect_segments(branch, ctx, out)?;
            }
            TemplateNode::Include(include) => {
                let content = evaluate_include(include, ctx)?;
                out.push(Segment::Literal(Cow::Owned(content)));
            }
        }
    }
    Ok(())
}

/// Pick the branch of a conditional. The condition must be a boolean.
fn select_branch<'b, 't>(
    block: &'b Conditional<'t>,
    variables: &Variables,
) -> ParseResult<&'b [TemplateNode<'t>]> {
    let condition = match variables.get(&block.name) {
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(block.source.attach(ParseError::type_mismatch(
                &block.name,
                "bool",
                other.type_name(),
            )));
        }
        None => {
            return Err(block.source.attach(ParseError::new(
                ParseErrorKind::TypeMismatch,
                format!(
                    "conditional variable '{}' is not defined (a bool is required)",
                    block.name
                ),
            )));
        }
    };

    Ok(if condition {
        block.then_branch.as_slice()
    } else {
        block.else_branch.as_slice()
    })
}

/// Load an include target and run the whole pipeline on it.
fn evaluate_include(include: &Include<'_>, ctx: &ParseContext<'_>) -> ParseResult<Vec<u8>> {
    let attribute = |err: ParseError| {
        include
            .source
            .attach(err)
            .with_file_opt(ctx.current_file())
    };

    if ctx.include_depth >= ctx.options.max_include_depth {
        return Err(attribute(ParseError::new(
            ParseErrorKind::MaxIncludeDepth,
            format!(
                "include depth limit of {} reached while including '{}'",
                ctx.options.max_include_depth, include.path
            ),
        )));
    }

    let target = resolve_include_path(&include.path, &ctx.template_root, ctx.current_file())
        .map_err(attribute)?;

    if ctx.is_open(&target) {
        return Err(attribute(ParseError::new(
            ParseErrorKind::CircularInclude,
            format!("circular include: {}", ctx.describe_chain(&target)),
        )));
    }

    let content = ctx.loader.load(&target).map_err(|e| {
        attribute(
            ParseError::new(
                ParseErrorKind::IncludeNotFound,
                format!("cannot read include target {}", target.display()),
            )
            .with_cause(e),
        )
    })?;

    tracing::debug!(
        path = %target.display(),
        depth = ctx.include_depth + 1,
        "resolving include"
    );

    parse_with_context(&content, &ctx.child(&target))
}

/// Render every pending variable and concatenate the output.
fn interpolate(segments: &[Segment<'_>], variables: &Variables) -> ParseResult<Vec<u8>> {
    let mut output = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(bytes) | Segment::Literal(bytes) => output.extend_from_slice(bytes),
            Segment::Variable(var) => {
                let value = resolve_variable(&var.spec, variables).map_err(|e| var.source.attach(e))?;
                output.extend_from_slice(value.render().as_bytes());
            }
            // Comment segments are consumed by the comment pass.
            Segment::Comment(comment) => {
                return Err(comment.source.attach(ParseError::invalid_syntax(
                    "comment directive was not resolved",
                )));
            }
        }
    }
    Ok(output)
}

/// Resolve a `var` directive's value.
///
/// A stored value wins and must match the type annotation when one is
/// given. Without a stored value the default is used: with an annotation it
/// must parse as that type, without one it is read as a bool, then an int,
/// then a string. No value and no default is a missing variable.
pub fn resolve_variable(spec: &VarSpec, variables: &Variables) -> ParseResult<Value> {
    if let Some(value) = variables.get(&spec.name) {
        if let Some(ty) = spec.ty {
            if !value.matches_type(ty) {
                return Err(ParseError::type_mismatch(
                    &spec.name,
                    ty.as_str(),
                    value.type_name(),
                ));
            }
        }
        return Ok(value.clone());
    }

    let Some(default) = &spec.default else {
        return Err(ParseError::missing_variable(&spec.name));
    };

    match spec.ty {
        None => Ok(Value::parse_literal(default)),
        Some(ValueType::String) => Ok(Value::String(default.clone())),
        Some(ty) => {
            let value = Value::parse_literal(default);
            if value.matches_type(ty) {
                Ok(value)
            } else {
                Err(ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    format!(
                        "default '{}' of variable '{}' is not a valid {}",
                        default, spec.name, ty
                    ),
                ))
            }
        }
    }
}
