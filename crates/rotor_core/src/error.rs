//! Error types for the rotor lexer.

use core::fmt;

use thiserror::Error;

/// The reason a parse failed.
///
/// Each variant is pinned to a stable integer code that is shared with the
/// C ABI; see [`ErrorKind::code`].  The numbering must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(i32)]
pub enum ErrorKind {
    /// Reserved placeholder code.  Never produced by the lexer; kept so the
    /// stable code table starts at 0.
    #[error("implementation incomplete")]
    Todo = 0,

    /// A `)` with no matching `(`.
    #[error("unexpected closing parenthesis")]
    UnexpectedParen = 1,

    /// A `}` with no matching `{`.
    #[error("unexpected closing brace")]
    UnexpectedBrace = 2,

    /// End of input reached with an unclosed `(`.
    #[error("unterminated parenthesis")]
    UnterminatedParen = 3,

    /// End of input reached with an unclosed `{`.
    #[error("unterminated brace")]
    UnterminatedBrace = 4,

    /// A template literal or `${…}` substitution was never closed.
    #[error("unterminated template string")]
    UnterminatedTemplateString = 5,

    /// A `'…'` or `"…"` literal ran into a line terminator or end of input.
    #[error("unterminated string literal")]
    UnterminatedStringLiteral = 6,

    /// A regex `[…]` character class was never closed.
    #[error("unterminated regex character class")]
    UnterminatedRegexCharacterClass = 7,

    /// A `/…/` literal ran into a line terminator or end of input.
    #[error("unterminated regex")]
    UnterminatedRegex = 8,

    /// Top-level `import.meta` — the module is ESM, not CommonJS.
    #[error("unexpected ESM import.meta")]
    UnexpectedEsmImportMeta = 9,

    /// Top-level `import` statement — the module is ESM, not CommonJS.
    #[error("unexpected ESM import statement")]
    UnexpectedEsmImport = 10,

    /// Top-level `export` statement — the module is ESM, not CommonJS.
    #[error("unexpected ESM export statement")]
    UnexpectedEsmExport = 11,

    /// Nesting depth exceeded the fixed tracker-stack capacity.
    #[error("template nesting overflow")]
    TemplateNestOverflow = 12,
}

impl ErrorKind {
    /// The stable integer code exposed through the C ABI.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Inverse of [`ErrorKind::code`].  Returns `None` for unknown codes.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Todo),
            1 => Some(Self::UnexpectedParen),
            2 => Some(Self::UnexpectedBrace),
            3 => Some(Self::UnterminatedParen),
            4 => Some(Self::UnterminatedBrace),
            5 => Some(Self::UnterminatedTemplateString),
            6 => Some(Self::UnterminatedStringLiteral),
            7 => Some(Self::UnterminatedRegexCharacterClass),
            8 => Some(Self::UnterminatedRegex),
            9 => Some(Self::UnexpectedEsmImportMeta),
            10 => Some(Self::UnexpectedEsmImport),
            11 => Some(Self::UnexpectedEsmExport),
            12 => Some(Self::TemplateNestOverflow),
            _ => None,
        }
    }
}

/// A 1-based source position.  `column` counts bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-based line number (`\r\n` counts as a single line terminator).
    pub line: u32,
    /// 1-based byte column within the line.
    pub column: u32,
}

/// The error produced by a failed parse.
///
/// `location` points at the offending byte when one can be attributed: the
/// opening delimiter for unterminated literals, the keyword for ESM
/// rejections, the stray bracket for unexpected-close errors.  Bracket
/// imbalance only discovered at end of input carries no location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where, when attributable.
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{} at {}:{}", self.kind, loc.line, loc.column),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Convenient `Result` alias for fallible lexer operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorKind::Todo.code(), 0);
        assert_eq!(ErrorKind::UnexpectedParen.code(), 1);
        assert_eq!(ErrorKind::UnexpectedBrace.code(), 2);
        assert_eq!(ErrorKind::UnterminatedParen.code(), 3);
        assert_eq!(ErrorKind::UnterminatedBrace.code(), 4);
        assert_eq!(ErrorKind::UnterminatedTemplateString.code(), 5);
        assert_eq!(ErrorKind::UnterminatedStringLiteral.code(), 6);
        assert_eq!(ErrorKind::UnterminatedRegexCharacterClass.code(), 7);
        assert_eq!(ErrorKind::UnterminatedRegex.code(), 8);
        assert_eq!(ErrorKind::UnexpectedEsmImportMeta.code(), 9);
        assert_eq!(ErrorKind::UnexpectedEsmImport.code(), 10);
        assert_eq!(ErrorKind::UnexpectedEsmExport.code(), 11);
        assert_eq!(ErrorKind::TemplateNestOverflow.code(), 12);
    }

    #[test]
    fn test_from_code_round_trips() {
        for code in 0..=12 {
            let kind = ErrorKind::from_code(code).expect("known code");
            assert_eq!(kind.code(), code);
        }
        assert_eq!(ErrorKind::from_code(13), None);
        assert_eq!(ErrorKind::from_code(-1), None);
    }

    #[test]
    fn test_display_with_location() {
        let err = ParseError {
            kind: ErrorKind::UnterminatedStringLiteral,
            location: Some(SourceLocation { line: 3, column: 7 }),
        };
        assert_eq!(err.to_string(), "unterminated string literal at 3:7");
    }

    #[test]
    fn test_display_without_location() {
        let err = ParseError {
            kind: ErrorKind::UnterminatedBrace,
            location: None,
        };
        assert_eq!(err.to_string(), "unterminated brace");
    }
}
