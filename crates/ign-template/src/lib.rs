/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive engine for ign project templates.
//!
//! Template files are ordinary source files in any language with embedded
//! `@ign-` directives. The engine resolves them against a set of typed
//! variables:
//!
//! - Variables: `@ign-var:name@`, `@ign-var:port:int=8080@`
//! - Comment lines: `// @ign-comment:header@`
//! - Raw escapes: `@ign-raw:@ign-var:kept@@`
//! - Conditionals: `@ign-if:flag@...@ign-else@...@ign-endif@`
//! - Includes: `@ign-include:partials/header.txt@`
//!
//! File and directory names are resolved through [`parse_filename`], which
//! honors only `var` and `raw` and rejects values that would let a path
//! escape the output directory.
//!
//! # Architecture
//!
//! Input is scanned once for directive tokens ([`scanner`]) and parsed into
//! a tree ([`Template`]). Rendering walks only the selected branch of each
//! conditional, resolves includes recursively through a derived
//! [`ParseContext`], and then runs the line-oriented comment pass and the
//! variable pass. Text produced by `raw` and by includes is never
//! re-interpreted.
//!
//! # Example
//!
//! ```
//! use ign_template::{Value, Variables, parse};
//!
//! let vars: Variables = [("name", Value::from("World"))].into_iter().collect();
//! let output = parse(b"Hello, @ign-var:name@!", &vars).unwrap();
//! assert_eq!(output, b"Hello, World!");
//! ```

pub mod ast;
mod comment;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod filename;
pub mod inspect;
pub mod loader;
pub mod parser;
pub mod scanner;
pub mod variables;

// Re-export main types at crate root
pub use ast::{CommentRef, Conditional, Include, TemplateNode, VarSpec, VariableRef};
pub use context::{DEFAULT_MAX_INCLUDE_DEPTH, EngineOptions, ParseContext};
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use evaluator::{parse, parse_with_context};
pub use filename::parse_filename;
pub use inspect::{extract_variables, validate};
pub use loader::{FileSystemLoader, IncludeLoader, MemoryLoader};
pub use parser::Template;
pub use variables::{Value, ValueType, Variables};
