//! `rotor_core` — a single-pass lexer that discovers the named exports and
//! re-exported module specifiers of a CommonJS JavaScript module without
//! executing it and without building an AST.
//!
//! # Crate layout
//!
//! - [`error`] — Error taxonomy with stable codes, source locations, and
//!   the `ParseResult` alias.
//! - [`lexer`] — The scanner and the public [`Analysis`] types.
//!
//! # Example
//!
//! ```
//! use rotor_core::parse_commonjs;
//!
//! let analysis = parse_commonjs(b"module.exports = { a, b };").unwrap();
//! assert_eq!(analysis.exports.len(), 2);
//! assert_eq!(analysis.exports[0].name, b"a");
//! assert_eq!(analysis.exports[0].line, 1);
//! ```

/// Error taxonomy with stable codes and the [`ParseResult`] alias.
pub mod error;
/// The CommonJS export scanner and its result types.
pub mod lexer;

pub use error::{ErrorKind, ParseError, ParseResult, SourceLocation};
pub use lexer::{Analysis, Export, ExportList, Reexport, ReexportList, parse_commonjs};
