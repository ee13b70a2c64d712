/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! Converts the scanner's flat directive list into the template AST. Nested
//! `if`/`else`/`endif` blocks are matched with a frame stack in one pass, so
//! the tree is built without re-scanning after each block.

use crate::ast::{
    CommentRef, Conditional, DirectiveSource, Include, TemplateNode, VarSpec, VariableRef,
};
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::scanner::{DirectiveKind, DirectiveMatch, scan};
use std::path::{Path, PathBuf};

/// A compiled template ready for evaluation.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    /// The parsed template AST.
    pub(crate) nodes: Vec<TemplateNode<'a>>,

    /// Original source.
    pub(crate) source: &'a [u8],

    /// File the template came from, for error reporting.
    pub(crate) filename: Option<PathBuf>,
}

impl<'a> Template<'a> {
    /// Compile a template from source bytes.
    ///
    /// Compilation checks structure only: unknown verbs, empty names,
    /// malformed variable specs and unbalanced conditional blocks. No
    /// variable values are needed.
    pub fn compile(source: &'a [u8]) -> ParseResult<Self> {
        Self::compile_with_filename(source, None)
    }

    /// Compile a template, attributing errors to `filename`.
    pub fn compile_with_filename(source: &'a [u8], filename: Option<&Path>) -> ParseResult<Self> {
        let nodes = parse_nodes(source).map_err(|e| e.with_file_opt(filename))?;
        Ok(Template {
            nodes,
            source,
            filename: filename.map(Path::to_path_buf),
        })
    }

    /// Get the AST nodes of this template.
    pub fn nodes(&self) -> &[TemplateNode<'a>] {
        &self.nodes
    }

    /// The bytes this template was compiled from.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// The file this template was compiled from, if known.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }
}

/// An `if` whose `endif` has not been seen yet.
struct Frame<'a> {
    name: String,
    source: DirectiveSource<'a>,
    then_branch: Vec<TemplateNode<'a>>,
    else_branch: Option<Vec<TemplateNode<'a>>>,
}

impl<'a> Frame<'a> {
    fn nodes_mut(&mut self) -> &mut Vec<TemplateNode<'a>> {
        match &mut self.else_branch {
            Some(nodes) => nodes,
            None => &mut self.then_branch,
        }
    }
}

/// Tracks line numbers for monotonically increasing offsets.
struct LineCounter<'a> {
    source: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        self.line += memchr::memchr_iter(b'\n', &self.source[self.offset..offset]).count();
        self.offset = offset;
        self.line
    }
}

fn parse_nodes(source: &[u8]) -> ParseResult<Vec<TemplateNode<'_>>> {
    let mut root: Vec<TemplateNode<'_>> = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut lines = LineCounter::new(source);
    let mut cursor = 0;

    for m in scan(source) {
        if m.start > cursor {
            current(&mut root, &mut stack).push(TemplateNode::Text(&source[cursor..m.start]));
        }
        cursor = m.end;

        let directive = DirectiveSource {
            text: m.text,
            line: lines.line_at(m.start),
        };
        parse_directive(&m, directive, &mut root, &mut stack).map_err(|e| directive.attach(e))?;
    }

    if cursor < source.len() {
        current(&mut root, &mut stack).push(TemplateNode::Text(&source[cursor..]));
    }

    if let Some(outermost) = stack.first() {
        return Err(outermost.source.attach(ParseError::new(
            ParseErrorKind::UnclosedBlock,
            format!(
                "conditional block '{}' is never closed with @ign-endif@",
                outermost.name
            ),
        )));
    }

    Ok(root)
}

fn current<'s, 'a>(
    root: &'s mut Vec<TemplateNode<'a>>,
    stack: &'s mut [Frame<'a>],
) -> &'s mut Vec<TemplateNode<'a>> {
    match stack.last_mut() {
        Some(frame) => frame.nodes_mut(),
        None => root,
    }
}

fn parse_directive<'a>(
    m: &DirectiveMatch<'a>,
    source: DirectiveSource<'a>,
    root: &mut Vec<TemplateNode<'a>>,
    stack: &mut Vec<Frame<'a>>,
) -> ParseResult<()> {
    match m.kind {
        DirectiveKind::Var => {
            let spec = VarSpec::parse(&m.args_str())?;
            current(root, stack).push(TemplateNode::Variable(VariableRef { spec, source }));
        }
        DirectiveKind::Comment => {
            let name = required_name(m, "comment")?;
            current(root, stack).push(TemplateNode::Comment(CommentRef { name, source }));
        }
        DirectiveKind::Raw => {
            current(root, stack).push(TemplateNode::Raw(m.args));
        }
        DirectiveKind::Include => {
            let path = required_name(m, "include path")?;
            current(root, stack).push(TemplateNode::Include(Include { path, source }));
        }
        DirectiveKind::If => {
            let name = required_name(m, "condition")?;
            stack.push(Frame {
                name,
                source,
                then_branch: Vec::new(),
                else_branch: None,
            });
        }
        DirectiveKind::Else => {
            no_args(m)?;
            let frame = stack
                .last_mut()
                .ok_or_else(|| ParseError::invalid_syntax("@ign-else@ without a matching @ign-if@"))?;
            if frame.else_branch.is_some() {
                return Err(ParseError::invalid_syntax(format!(
                    "conditional block '{}' has more than one @ign-else@",
                    frame.name
                )));
            }
            frame.else_branch = Some(Vec::new());
        }
        DirectiveKind::Endif => {
            no_args(m)?;
            let frame = stack
                .pop()
                .ok_or_else(|| ParseError::invalid_syntax("@ign-endif@ without a matching @ign-if@"))?;
            let block = Conditional {
                name: frame.name,
                then_branch: frame.then_branch,
                else_branch: frame.else_branch.unwrap_or_default(),
                source: frame.source,
            };
            current(root, stack).push(TemplateNode::Conditional(block));
        }
        DirectiveKind::Unknown => return Err(ParseError::unknown_directive(m.verb)),
    }
    Ok(())
}

fn required_name(m: &DirectiveMatch<'_>, what: &str) -> ParseResult<String> {
    let args = m.args_str();
    let name = args.trim();
    if name.is_empty() {
        return Err(ParseError::invalid_syntax(format!(
            "@ign-{}@ needs a {}",
            m.verb, what
        )));
    }
    Ok(name.to_string())
}

fn no_args(m: &DirectiveMatch<'_>) -> ParseResult<()> {
    if m.args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::invalid_syntax(format!(
            "@ign-{}@ takes no arguments",
            m.verb
        )))
    }
}
