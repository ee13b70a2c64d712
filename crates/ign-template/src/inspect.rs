/*
 * inspect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Static checks that need no variable values.

use crate::ast::VarSpec;
use crate::error::ParseResult;
use crate::parser::Template;
use crate::scanner::{DirectiveKind, scan};
use std::collections::HashSet;

/// Check template structure without evaluating anything.
///
/// Reports unknown verbs, empty names, malformed `var` arguments and
/// unbalanced conditional blocks.
pub fn validate(content: &[u8]) -> ParseResult<()> {
    Template::compile(content).map(|_| ())
}

/// List every variable referenced by `var`, `comment` and `if` directives.
///
/// Names are deduplicated and reported in order of first appearance. Text
/// inside `raw` escapes is not inspected, and includes are not followed.
pub fn extract_variables(content: &[u8]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for m in scan(content) {
        let args = m.args_str();
        let name = match m.kind {
            DirectiveKind::Var => VarSpec::name_of(&args),
            DirectiveKind::Comment | DirectiveKind::If => args.trim(),
            _ => continue,
        };
        if !name.is_empty() && seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_variables() {
        let source = b"@ign-var:name@ @ign-if:debug@@ign-var:port:int=80@@ign-endif@\n\
            // @ign-comment:banner@\n@ign-var:name@ @ign-raw:@ign-var:hidden@@ @ign-include:x.txt@";
        assert_eq!(
            extract_variables(source),
            vec!["name", "debug", "port", "banner"]
        );
    }

    #[test]
    fn test_extract_from_plain_text() {
        assert!(extract_variables(b"nothing to see").is_empty());
    }

    #[test]
    fn test_validate_accepts_well_formed_template() {
        assert!(validate(b"@ign-if:a@@ign-var:b@@ign-else@@ign-raw:@ign-x@@@ign-endif@").is_ok());
    }

    #[test]
    fn test_validate_does_not_need_values() {
        assert!(validate(b"@ign-var:never_defined@ @ign-include:missing.txt@").is_ok());
    }

    #[test]
    fn test_validate_reports_structure_errors() {
        assert_eq!(
            validate(b"@ign-unknown@").unwrap_err().kind,
            ParseErrorKind::UnknownDirective
        );
        assert_eq!(
            validate(b"@ign-var:@").unwrap_err().kind,
            ParseErrorKind::InvalidSyntax
        );
        assert_eq!(
            validate(b"@ign-if:x@ open").unwrap_err().kind,
            ParseErrorKind::UnclosedBlock
        );
    }
}
