/*
 * comment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Comment-line resolution.
//!
//! A comment directive lets a template line double as a comment in the host
//! language, e.g. `// @ign-comment:banner@` in Go or `<!-- @ign-comment:x@ -->`
//! in HTML. The whole line is replaced by its leading indentation followed by
//! the variable's value.
//!
//! Resolution is strictly per line. Recognized markers:
//!
//! | Opening | Closing |
//! |---------|---------|
//! | `//`, `#`, `--` | none |
//! | `/*` | `*/` |
//! | `<!--` | `-->` |
//!
//! Apart from the marker pair and whitespace, nothing else may share the
//! line with the directive.

use crate::ast::CommentRef;
use crate::error::{ParseError, ParseResult};
use crate::evaluator::Segment;
use crate::variables::Variables;
use std::borrow::Cow;

const LINE_MARKERS: [&[u8]; 3] = [b"//", b"#", b"--"];
const BLOCK_MARKERS: [(&[u8], &[u8]); 2] = [(b"/*", b"*/"), (b"<!--", b"-->")];

/// Replace every line holding a comment directive.
///
/// Lines without one are passed through unchanged.
pub(crate) fn resolve_comments<'t>(
    segments: Vec<Segment<'t>>,
    variables: &Variables,
) -> ParseResult<Vec<Segment<'t>>> {
    if !segments.iter().any(|s| matches!(s, Segment::Comment(_))) {
        return Ok(segments);
    }

    let mut out = Vec::with_capacity(segments.len());
    let mut line: Vec<Segment<'t>> = Vec::new();

    for segment in segments {
        match segment {
            Segment::Text(bytes) => {
                for piece in split_lines(bytes) {
                    let ends_line = piece.ends_with(b"\n");
                    line.push(Segment::Text(piece));
                    if ends_line {
                        flush_line(std::mem::take(&mut line), &mut out, variables)?;
                    }
                }
            }
            Segment::Literal(bytes) => {
                for piece in split_lines(bytes) {
                    let ends_line = piece.ends_with(b"\n");
                    line.push(Segment::Literal(piece));
                    if ends_line {
                        flush_line(std::mem::take(&mut line), &mut out, variables)?;
                    }
                }
            }
            other => line.push(other),
        }
    }
    flush_line(line, &mut out, variables)?;

    Ok(out)
}

/// Split bytes after each newline, keeping the newline on its piece.
fn split_lines(bytes: Cow<'_, [u8]>) -> Vec<Cow<'_, [u8]>> {
    if memchr::memchr(b'\n', &bytes).is_none() {
        return vec![bytes];
    }
    match bytes {
        Cow::Borrowed(b) => b.split_inclusive(|&c| c == b'\n').map(Cow::Borrowed).collect(),
        Cow::Owned(v) => v
            .split_inclusive(|&c| c == b'\n')
            .map(|piece| Cow::Owned(piece.to_vec()))
            .collect(),
    }
}

fn flush_line<'t>(
    line: Vec<Segment<'t>>,
    out: &mut Vec<Segment<'t>>,
    variables: &Variables,
) -> ParseResult<()> {
    let mut comments = line.iter().enumerate().filter_map(|(i, s)| match s {
        Segment::Comment(c) => Some((i, *c)),
        _ => None,
    });

    let Some((index, comment)) = comments.next() else {
        out.extend(line);
        return Ok(());
    };
    if let Some((_, second)) = comments.next() {
        return Err(second.source.attach(ParseError::invalid_syntax(
            "only one comment directive is allowed per line",
        )));
    }

    let prefix = line_text(&line[..index], comment)?;
    let suffix = line_text(&line[index + 1..], comment)?;
    let rendered = render_comment_line(&prefix, &suffix, comment, variables)?;
    out.push(Segment::Literal(Cow::Owned(rendered)));
    Ok(())
}

/// Concatenate the template text around a comment directive.
fn line_text(segments: &[Segment<'_>], comment: &CommentRef<'_>) -> ParseResult<Vec<u8>> {
    let mut text = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(bytes) => text.extend_from_slice(bytes),
            _ => return Err(alone_on_line(comment)),
        }
    }
    Ok(text)
}

fn render_comment_line(
    prefix: &[u8],
    suffix: &[u8],
    comment: &CommentRef<'_>,
    variables: &Variables,
) -> ParseResult<Vec<u8>> {
    let (body, eol) = split_line_ending(suffix);

    let indent_len = prefix
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count();
    let (indent, opener) = prefix.split_at(indent_len);
    let opener = opener.trim_ascii();
    let closer = body.trim_ascii();

    let expected_closer: &[u8] = if opener.is_empty() || LINE_MARKERS.contains(&opener) {
        b""
    } else if let Some((_, close)) = BLOCK_MARKERS.iter().find(|(open, _)| *open == opener) {
        *close
    } else {
        return Err(alone_on_line(comment));
    };
    if closer != expected_closer {
        return Err(alone_on_line(comment));
    }

    let value = variables
        .get(&comment.name)
        .ok_or_else(|| comment.source.attach(ParseError::missing_variable(&comment.name)))?;

    let mut rendered = Vec::with_capacity(indent.len() + eol.len() + 16);
    rendered.extend_from_slice(indent);
    rendered.extend_from_slice(value.render().as_bytes());
    rendered.extend_from_slice(eol);
    Ok(rendered)
}

fn split_line_ending(text: &[u8]) -> (&[u8], &[u8]) {
    let eol_len = if text.ends_with(b"\r\n") {
        2
    } else if text.ends_with(b"\n") {
        1
    } else {
        0
    };
    text.split_at(text.len() - eol_len)
}

fn alone_on_line(comment: &CommentRef<'_>) -> ParseError {
    comment.source.attach(ParseError::invalid_syntax(
        "comment directive must be alone on its line, optionally wrapped in a comment marker",
    ))
}

#[cfg(test)]
mod tests {
    use crate::error::ParseErrorKind;
    use crate::evaluator::parse;
    use crate::variables::{Value, Variables};
    use pretty_assertions::assert_eq;

    fn vars() -> Variables {
        [
            ("note", Value::from("generated file")),
            ("on", Value::Bool(true)),
            ("off", Value::Bool(false)),
            ("name", Value::from("svc")),
        ]
        .into_iter()
        .collect()
    }

    fn render(source: &str) -> String {
        String::from_utf8(parse(source.as_bytes(), &vars()).expect("template should render"))
            .unwrap()
    }

    fn render_err(source: &str) -> ParseErrorKind {
        parse(source.as_bytes(), &vars())
            .expect_err("template should fail")
            .kind
    }

    #[test]
    fn test_line_markers() {
        assert_eq!(render("// @ign-comment:note@\nx"), "generated file\nx");
        assert_eq!(render("# @ign-comment:note@"), "generated file");
        assert_eq!(render("-- @ign-comment:note@\n"), "generated file\n");
    }

    #[test]
    fn test_block_markers() {
        assert_eq!(render("/* @ign-comment:note@ */\n"), "generated file\n");
        assert_eq!(render("<!-- @ign-comment:note@ -->"), "generated file");
        assert_eq!(render("<!--@ign-comment:note@-->"), "generated file");
    }

    #[test]
    fn test_indentation_is_preserved() {
        assert_eq!(
            render("func main() {\n\t    // @ign-comment:note@\n}\n"),
            "func main() {\n\t    generated file\n}\n"
        );
    }

    #[test]
    fn test_bare_directive_line() {
        assert_eq!(render("  @ign-comment:note@  \n"), "  generated file\n");
    }

    #[test]
    fn test_crlf_line_ending_is_kept() {
        assert_eq!(render("# @ign-comment:note@\r\nnext"), "generated file\r\nnext");
    }

    #[test]
    fn test_other_lines_are_untouched() {
        assert_eq!(
            render("a @ign-var:name@\n// @ign-comment:note@\nb # c\n"),
            "a svc\ngenerated file\nb # c\n"
        );
    }

    #[test]
    fn test_code_before_directive_is_rejected() {
        assert_eq!(
            render_err("call(); // @ign-comment:note@"),
            ParseErrorKind::InvalidSyntax
        );
    }

    #[test]
    fn test_text_after_directive_is_rejected() {
        assert_eq!(
            render_err("// @ign-comment:note@ trailing"),
            ParseErrorKind::InvalidSyntax
        );
    }

    #[test]
    fn test_mismatched_block_marker_is_rejected() {
        assert_eq!(render_err("/* @ign-comment:note@"), ParseErrorKind::InvalidSyntax);
        assert_eq!(render_err("# @ign-comment:note@ */"), ParseErrorKind::InvalidSyntax);
        assert_eq!(
            render_err("<!-- @ign-comment:note@ */"),
            ParseErrorKind::InvalidSyntax
        );
    }

    #[test]
    fn test_directive_neighbours_are_rejected() {
        assert_eq!(
            render_err("// @ign-comment:note@ @ign-var:name@"),
            ParseErrorKind::InvalidSyntax
        );
        assert_eq!(
            render_err("@ign-comment:note@@ign-comment:name@"),
            ParseErrorKind::InvalidSyntax
        );
        assert_eq!(
            render_err("@ign-raw:x@ @ign-comment:note@"),
            ParseErrorKind::InvalidSyntax
        );
    }

    #[test]
    fn test_missing_comment_variable() {
        assert_eq!(
            render_err("// @ign-comment:absent@"),
            ParseErrorKind::MissingVariable
        );
    }

    #[test]
    fn test_comment_in_discarded_branch_is_ignored() {
        assert_eq!(
            render("@ign-if:off@// @ign-comment:absent@\n@ign-endif@rest"),
            "rest"
        );
    }

    #[test]
    fn test_comment_in_taken_branch() {
        assert_eq!(
            render("@ign-if:on@    // @ign-comment:note@\n@ign-endif@rest"),
            "    generated file\nrest"
        );
    }

    #[test]
    fn test_non_string_value() {
        assert_eq!(render("# @ign-comment:on@"), "true");
    }
}
