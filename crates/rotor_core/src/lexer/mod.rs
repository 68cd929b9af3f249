//! CommonJS module-surface analysis.
//!
//! The lexer does a fast single pass over the raw bytes of a CommonJS
//! module, reporting the module's externally observable **named exports**
//! and **re-exported module specifiers** without executing it and without
//! building an AST.  It also rejects modules that are actually ESM by
//! failing on top-level `import`/`export`/`import.meta`.
//!
//! # Workflow
//!
//! 1. Call [`parse_commonjs`] with the module source bytes.
//! 2. On success, read [`Analysis::exports`] and [`Analysis::reexports`];
//!    every record aliases the input buffer (zero-copy) and carries its
//!    1-based source line.
//! 3. On failure, inspect the [`ParseError`](crate::error::ParseError) for
//!    the error kind and, when attributable, the offending line/column.
//!
//! # What the lexer recognizes
//!
//! - `exports.name = …`, `exports["name"] = …`, `module.exports.name = …`
//! - `module.exports = { … }` object literals (shorthand, `key: value`,
//!   quoted keys, `...require("…")` spreads)
//! - `module.exports = require("…")` re-export assignment (last one wins)
//! - `Object.defineProperty(exports, "name", { … })` with a literal
//!   `value` or a narrow single-`return` getter, `enumerable: true` only
//! - `__exportStar(require("…"))` / `__export(require("…"))`
//! - the transpiler-generated `Object.keys(local).forEach(…)` re-export
//!   loop, resolved against `var`/`let`/`const local = require("…")` and
//!   `_interopRequireWildcard(require("…"))` bindings
//!
//! Everything else is skipped, not parsed; unreachable code is still
//! scanned, so exports inside dead branches are reported.

mod scanner;

use smallvec::SmallVec;

use crate::error::ParseError;

/// A named export discovered in the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Export<'a> {
    /// The raw bytes of the export name (string-literal keys are reported
    /// without their quotes, escapes undecoded).  Aliases the input buffer.
    pub name: &'a [u8],
    /// 1-based source line of the first byte of the key.
    pub line: u32,
}

impl<'a> Export<'a> {
    /// The name as UTF-8, when it is valid UTF-8.
    #[must_use]
    pub fn name_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }
}

/// A module specifier this module forwards exports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reexport<'a> {
    /// The raw string-literal body between the quotes.  Aliases the input
    /// buffer.
    pub specifier: &'a [u8],
    /// 1-based source line of the first byte of the specifier body.
    pub line: u32,
}

impl<'a> Reexport<'a> {
    /// The specifier as UTF-8, when it is valid UTF-8.
    #[must_use]
    pub fn specifier_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.specifier).ok()
    }
}

/// Inline-capacity list of exports; typical modules stay off the heap.
pub type ExportList<'a> = SmallVec<[Export<'a>; 16]>;
/// Inline-capacity list of re-exports.
pub type ReexportList<'a> = SmallVec<[Reexport<'a>; 8]>;

/// The result of a successful parse.
///
/// Exports appear in first-recognition order with byte-identical duplicates
/// suppressed; re-exports appear in recognition order and are not
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis<'a> {
    /// Named exports.
    pub exports: ExportList<'a>,
    /// Re-exported module specifiers.
    pub reexports: ReexportList<'a>,
}

impl<'a> Analysis<'a> {
    /// `true` when some export has exactly these name bytes.
    #[must_use]
    pub fn has_export(&self, name: &[u8]) -> bool {
        self.exports.iter().any(|e| e.name == name)
    }

    /// Iterate over the export names.
    pub fn export_names(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.exports.iter().map(|e| e.name)
    }

    /// Iterate over the re-export specifiers.
    pub fn reexport_specifiers(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.reexports.iter().map(|r| r.specifier)
    }
}

/// Scan `source` and return its export analysis.
///
/// The input is treated as raw bytes; UTF-8 validity is neither required
/// nor checked.  Empty and whitespace-only inputs succeed with empty
/// outputs.  The returned [`Analysis`] borrows from `source`.
///
/// # Errors
///
/// Returns a [`ParseError`] when the module contains top-level ESM syntax,
/// an unterminated string/template/regex, a stray or unclosed bracket, or
/// nesting beyond the fixed tracker depth.
///
/// # Example
///
/// ```
/// use rotor_core::parse_commonjs;
///
/// let analysis = parse_commonjs(b"exports.foo = 1; exports.bar = 2;").unwrap();
/// let names: Vec<_> = analysis.export_names().collect();
/// assert_eq!(names, vec![b"foo".as_slice(), b"bar".as_slice()]);
/// ```
pub fn parse_commonjs(source: &[u8]) -> Result<Analysis<'_>, ParseError> {
    scanner::parse(source)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
