/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive tokenizer.
//!
//! Directives have the shape `@ign-<verb>[:<args>]@` where `<verb>` is one or
//! more ASCII lowercase letters and `<args>` runs up to the next `@`. The
//! scanner walks the buffer once, left to right, and returns non-overlapping
//! matches that borrow from the input.
//!
//! The `raw` verb is the exception to "args run up to the next `@`": its
//! argument may contain complete directive-shaped tokens, so the closing `@`
//! is the first one that does not terminate a nested token. For example
//! `@ign-raw:@ign-var:x@@` has the argument `@ign-var:x@`. A `raw` directive
//! that never finds its closing `@` is not a directive at all and stays text.

use memchr::memmem;
use std::borrow::Cow;
use std::collections::HashMap;

/// Byte sequence that opens every directive.
pub const DIRECTIVE_PREFIX: &[u8] = b"@ign-";

const DELIMITER: u8 = b'@';
const ARGS_SEPARATOR: u8 = b':';

/// The verb of a scanned directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Var,
    Comment,
    Raw,
    If,
    Else,
    Endif,
    Include,
    Unknown,
}

impl DirectiveKind {
    pub fn from_verb(verb: &str) -> Self {
        match verb {
            "var" => DirectiveKind::Var,
            "comment" => DirectiveKind::Comment,
            "raw" => DirectiveKind::Raw,
            "if" => DirectiveKind::If,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "include" => DirectiveKind::Include,
            _ => DirectiveKind::Unknown,
        }
    }
}

/// One directive occurrence in a scanned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch<'a> {
    /// Which verb this is.
    pub kind: DirectiveKind,
    /// Byte offset of the opening `@`.
    pub start: usize,
    /// Byte offset just past the closing `@`.
    pub end: usize,
    /// The verb name as written.
    pub verb: &'a str,
    /// Bytes between `:` and the closing `@` (empty when absent).
    pub args: &'a [u8],
    /// The whole matched text, delimiters included.
    pub text: &'a [u8],
}

impl<'a> DirectiveMatch<'a> {
    /// The argument text, lossily decoded.
    pub fn args_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.args)
    }

    /// The full directive text, lossily decoded.
    pub fn text_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.text)
    }
}

/// Scan a buffer for directives, in ascending offset order.
pub fn scan(input: &[u8]) -> Vec<DirectiveMatch<'_>> {
    let finder = memmem::Finder::new(DIRECTIVE_PREFIX);
    let mut scanner = Scanner::new(input);
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(found) = finder.find(&input[pos..]) {
        let start = pos + found;
        match scanner.match_at(start) {
            Some(m) => {
                pos = m.end;
                matches.push(m);
            }
            None => pos = start + 1,
        }
    }

    matches
}

/// Scan and keep only directives of one kind.
pub fn scan_kind(input: &[u8], kind: DirectiveKind) -> Vec<DirectiveMatch<'_>> {
    scan(input).into_iter().filter(|m| m.kind == kind).collect()
}

/// Whether a buffer contains anything that looks like the start of a directive.
pub fn has_directive_prefix(input: &[u8]) -> bool {
    memmem::find(input, DIRECTIVE_PREFIX).is_some()
}

/// What follows `@ign-<verb>` at some offset.
enum Head<'a> {
    /// `@ign-<verb>@`, closed by the `@` at `close`.
    Bare { verb: &'a str, close: usize },
    /// `@ign-<verb>:`, with arguments starting at `args_start`.
    Args { verb: &'a str, args_start: usize },
}

fn head_at(input: &[u8], start: usize) -> Option<Head<'_>> {
    let verb_start = start + DIRECTIVE_PREFIX.len();
    let verb_end = verb_start
        + input[verb_start..]
            .iter()
            .take_while(|b| b.is_ascii_lowercase())
            .count();
    if verb_end == verb_start {
        return None;
    }

    // The verb is ASCII lowercase, so this never fails.
    let verb = std::str::from_utf8(&input[verb_start..verb_end]).ok()?;
    match input.get(verb_end)? {
        &DELIMITER => Some(Head::Bare {
            verb,
            close: verb_end,
        }),
        &ARGS_SEPARATOR => Some(Head::Args {
            verb,
            args_start: verb_end + 1,
        }),
        _ => None,
    }
}

/// One move while looking for the end of a `raw` argument.
enum RawStep {
    /// A nested token was skipped; continue at this offset.
    Skip(usize),
    /// A nested `raw` opens here, with arguments at the second offset.
    Nested(usize, usize),
    /// The `@` at this offset closes the argument.
    Close(usize),
    /// The buffer ends before any closing `@`.
    Unclosed,
}

/// Matches directives, remembering where each `raw` closes.
///
/// Whether a `raw` at a given offset closes, and where, does not depend on
/// what surrounds it, so each answer is computed once per scan. Nested `raw`
/// tokens are resolved with an explicit stack, which keeps deep nesting off
/// the call stack.
struct Scanner<'a> {
    input: &'a [u8],
    /// Offset of a `raw`'s opening `@` to the offset of its closing `@`.
    raw_closers: HashMap<usize, Option<usize>>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            raw_closers: HashMap::new(),
        }
    }

    /// Try to match a directive whose `@` is at `start`.
    fn match_at(&mut self, start: usize) -> Option<DirectiveMatch<'a>> {
        let input = self.input;
        let (verb, args_start, args_end) = match head_at(input, start)? {
            Head::Bare { verb, close } => (verb, close, close),
            Head::Args { verb, args_start } => {
                let close = if verb == "raw" {
                    match self.raw_closers.get(&start) {
                        Some(&known) => known?,
                        None => self.raw_close(start, args_start)?,
                    }
                } else {
                    args_start + memchr::memchr(DELIMITER, &input[args_start..])?
                };
                (verb, args_start, close)
            }
        };

        let end = args_end + 1;
        Some(DirectiveMatch {
            kind: DirectiveKind::from_verb(verb),
            start,
            end,
            verb,
            args: &input[args_start..args_end],
            text: &input[start..end],
        })
    }

    /// Find the `@` that closes the `raw` opened at `start`.
    ///
    /// Directive-shaped tokens inside the argument are skipped whole, so
    /// their own closing `@` never ends the outer directive. A nested `raw`
    /// that never closes is not a token, so its opening `@` closes the
    /// enclosing one.
    fn raw_close(&mut self, start: usize, args_start: usize) -> Option<usize> {
        // (opening `@`, resume offset) for each `raw` still looking for its end
        let mut open: Vec<(usize, usize)> = vec![(start, args_start)];

        while let Some(&(_, pos)) = open.last() {
            let mut settled = match self.raw_step(pos) {
                RawStep::Skip(next) => {
                    if let Some(frame) = open.last_mut() {
                        frame.1 = next;
                    }
                    continue;
                }
                RawStep::Nested(at, nested_args) => {
                    open.push((at, nested_args));
                    continue;
                }
                RawStep::Close(at) => Some(at),
                RawStep::Unclosed => None,
            };

            // Hand the innermost result outwards until a frame can resume.
            while let Some((opened_at, _)) = open.pop() {
                self.raw_closers.insert(opened_at, settled);
                match (open.last_mut(), settled) {
                    (None, _) => return settled,
                    (Some(parent), Some(close)) => {
                        parent.1 = close + 1;
                        break;
                    }
                    (Some(_), None) => settled = Some(opened_at),
                }
            }
        }

        None
    }

    fn raw_step(&self, pos: usize) -> RawStep {
        let input = self.input;
        let Some(offset) = memchr::memchr(DELIMITER, &input[pos..]) else {
            return RawStep::Unclosed;
        };
        let at = pos + offset;
        if !input[at..].starts_with(DIRECTIVE_PREFIX) {
            return RawStep::Close(at);
        }

        match head_at(input, at) {
            Some(Head::Bare { close, .. }) => RawStep::Skip(close + 1),
            Some(Head::Args {
                verb: "raw",
                args_start,
            }) => match self.raw_closers.get(&at) {
                Some(Some(close)) => RawStep::Skip(close + 1),
                Some(None) => RawStep::Close(at),
                None => RawStep::Nested(at, args_start),
            },
            Some(Head::Args { args_start, .. }) => {
                match memchr::memchr(DELIMITER, &input[args_start..]) {
                    Some(offset) => RawStep::Skip(args_start + offset + 1),
                    None => RawStep::Close(at),
                }
            }
            None => RawStep::Close(at),
        }
    }
}

/// Compute the 1-based line number of a byte offset.
pub fn line_of(input: &[u8], offset: usize) -> usize {
    let offset = offset.min(input.len());
    memchr::memchr_iter(b'\n', &input[..offset]).count() + 1
}
