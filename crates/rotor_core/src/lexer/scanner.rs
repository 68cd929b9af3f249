//! Single-pass CommonJS export scanner.
//!
//! The scanner walks the source buffer left to right exactly once,
//! maintaining just enough lexical context (bracket stack, template stack,
//! last significant token) to skip strings, templates, comments, and regex
//! literals correctly, and dispatches into the idiom recognizers when a
//! trigger byte (`i`, `r`, `_`, `e`, `m`, `O`, `c`) starts a candidate
//! construct.  Recognizers are greedy and best-effort: they save the cursor
//! on entry and restore it on any mismatch, so a failed match degrades into
//! plain scanning rather than an error.

use crate::error::{ErrorKind, ParseError, SourceLocation};

use super::{Analysis, Export, ExportList, Reexport, ReexportList};

// ─────────────────────────────────────────────────────────────────────────────
// Limits and sentinels
// ─────────────────────────────────────────────────────────────────────────────

/// Capacity of the bracket and template stacks.  Exceeding it is a hard
/// failure rather than unbounded growth.
pub(crate) const STACK_DEPTH: usize = 2048;

/// Capacity of the star-export binding table.  Overflow silently drops
/// further bindings.
pub(crate) const MAX_STAR_EXPORTS: usize = 256;

/// Position value meaning "before the first byte of the buffer".
const SENTINEL: usize = usize::MAX;

/// `template_depth` value meaning "not inside any template substitution".
const NO_TEMPLATE: usize = usize::MAX;

// ─────────────────────────────────────────────────────────────────────────────
// Character classification
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` for `\r` and `\n`.
const fn is_br(c: u8) -> bool {
    c == b'\r' || c == b'\n'
}

/// Returns `true` for ASCII whitespace and line terminators (TAB through CR,
/// plus space).
const fn is_br_or_ws(c: u8) -> bool {
    (c > 8 && c < 14) || c == 32
}

/// Returns `true` for all ASCII punctuators.
const fn is_punctuator(ch: u8) -> bool {
    ch == b'!'
        || ch == b'%'
        || ch == b'&'
        || (ch > 39 && ch < 48)
        || (ch > 57 && ch < 64)
        || ch == b'['
        || ch == b']'
        || ch == b'^'
        || (ch > 122 && ch < 127)
}

/// Returns `true` for punctuators after which a `/` opens a regex literal:
/// `! % & ( * + , - . : ; < = > ? [ ^ { | ~` (notably excluding `)`, `]`,
/// and `}`, which end value-producing expressions).
const fn is_expression_punctuator(ch: u8) -> bool {
    ch == b'!'
        || ch == b'%'
        || ch == b'&'
        || (ch > 39 && ch < 47 && ch != 41)
        || (ch > 57 && ch < 64)
        || ch == b'['
        || ch == b'^'
        || (ch > 122 && ch < 127 && ch != 125)
}

/// The keyword-boundary class: whitespace, line terminators, and every
/// punctuator except `.` (so `foo.import` is a member access, not a keyword).
const fn is_br_or_ws_or_punctuator_not_dot(c: u8) -> bool {
    is_br_or_ws(c) || (is_punctuator(c) && c != b'.')
}

/// Returns `true` for bytes that may start an identifier.  Non-ASCII bytes
/// are accepted so multi-byte UTF-8 identifiers scan as opaque runs.
const fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' || ch >= 0x80
}

/// Returns `true` for bytes that may continue an identifier.
const fn is_identifier_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' || ch >= 0x80
}

// ─────────────────────────────────────────────────────────────────────────────
// Line accounting
// ─────────────────────────────────────────────────────────────────────────────

/// Memoized newline counter.  Emission offsets are almost always
/// non-decreasing, so attributing a line number is an incremental scan; a
/// backward query (a re-export resolved against an earlier `require`
/// binding) restarts from the beginning.
struct LineCounter {
    offset: usize,
    line: u32,
}

impl LineCounter {
    fn new() -> Self {
        Self { offset: 0, line: 1 }
    }

    /// 1-based line of the byte at `target`.  A `\r\n` pair counts once.
    fn line_at(&mut self, src: &[u8], target: usize) -> u32 {
        if target < self.offset {
            self.offset = 0;
            self.line = 1;
        }
        while self.offset < target && self.offset < src.len() {
            let b = src[self.offset];
            if b == b'\n' || (b == b'\r' && src.get(self.offset + 1) != Some(&b'\n')) {
                self.line += 1;
            }
            self.offset += 1;
        }
        self.line
    }
}

/// One-shot line/column of the byte at `offset` (both 1-based, column in
/// bytes).  Used only for error attribution.
fn location_of(src: &[u8], offset: usize) -> SourceLocation {
    let end = offset.min(src.len());
    let mut line = 1u32;
    let mut line_start = 0usize;
    let mut i = 0usize;
    while i < end {
        match src[i] {
            b'\n' => {
                line += 1;
                i += 1;
                line_start = i;
            }
            b'\r' => {
                line += 1;
                i += if src.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                line_start = i;
            }
            _ => i += 1,
        }
    }
    SourceLocation {
        line,
        column: (end.saturating_sub(line_start) + 1) as u32,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner state
// ─────────────────────────────────────────────────────────────────────────────

/// How a matched `require("…")` call is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequireType {
    /// Plain import: no re-export, but the specifier is staged for a
    /// possible star-export binding.
    Import,
    /// The right-hand side of `module.exports = require("…")`.
    ExportAssign,
    /// The argument of `__exportStar(require("…"))`.
    ExportStar,
}

/// Association between a local identifier and the module specifier it was
/// `require`d from, captured by backtracking over `var`/`let`/`const`
/// declarations and resolved when an `Object.keys(local).forEach` re-export
/// loop is matched.
#[derive(Debug, Clone, Copy, Default)]
struct StarExportBinding {
    specifier_start: usize,
    specifier_end: usize,
    id_start: usize,
    id_end: usize,
}

/// The scanner itself.  One instance per parse; see [`parse`].
struct Lexer<'a> {
    src: &'a [u8],
    /// Current byte index.  May move past the end when an error aborts.
    pos: usize,
    /// Index of the last significant (non-whitespace, non-comment) byte, or
    /// [`SENTINEL`] before the first token.
    last_token_pos: usize,

    /// Count of currently open `(`, `{`, and template substitutions.
    open_token_depth: usize,
    /// Per open token: `last_token_pos` immediately before it opened.
    open_token_pos_stack: [usize; STACK_DEPTH],
    /// Per open token: whether a `{` opened a class body.
    open_class_pos_stack: [bool; STACK_DEPTH],
    /// Per open token: `{` (true) vs `(` (false), for end-of-input
    /// imbalance attribution.
    open_brace_stack: [bool; STACK_DEPTH],

    /// `open_token_depth` of the innermost live `${…}` substitution, or
    /// [`NO_TEMPLATE`].
    template_depth: usize,
    template_stack: [usize; STACK_DEPTH],
    template_stack_len: usize,

    star_export_stack: [StarExportBinding; MAX_STAR_EXPORTS],
    star_export_len: usize,

    last_slash_was_division: bool,
    next_brace_is_class: bool,

    exports: ExportList<'a>,
    reexports: ReexportList<'a>,
    /// First error recorded, with the offending byte offset when one can be
    /// attributed.
    error: Option<(ErrorKind, Option<usize>)>,
    lines: LineCounter,
}

/// Scan `src` and return its analysis, or the first error encountered.
pub(crate) fn parse(src: &[u8]) -> Result<Analysis<'_>, ParseError> {
    let mut lexer = Lexer::new(src);
    lexer.run();
    lexer.finish()
}

impl<'a> Lexer<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            last_token_pos: SENTINEL,
            open_token_depth: 0,
            open_token_pos_stack: [SENTINEL; STACK_DEPTH],
            open_class_pos_stack: [false; STACK_DEPTH],
            open_brace_stack: [false; STACK_DEPTH],
            template_depth: NO_TEMPLATE,
            template_stack: [NO_TEMPLATE; STACK_DEPTH],
            template_stack_len: 0,
            star_export_stack: [StarExportBinding::default(); MAX_STAR_EXPORTS],
            star_export_len: 0,
            last_slash_was_division: false,
            next_brace_is_class: false,
            exports: ExportList::new(),
            reexports: ReexportList::new(),
            error: None,
            lines: LineCounter::new(),
        }
    }

    // ── Low-level cursor helpers ────────────────────────────────────────────

    /// Byte at `i`, with a virtual NUL past the end of the buffer.
    #[inline]
    fn at(&self, i: usize) -> u8 {
        if i < self.src.len() { self.src[i] } else { 0 }
    }

    /// `true` when the bytes starting at `i` equal `expected`.
    #[inline]
    fn matches_at(&self, i: usize, expected: &[u8]) -> bool {
        self.src
            .get(i..i.saturating_add(expected.len()))
            .is_some_and(|s| s == expected)
    }

    /// `true` when the bytes starting at `at` equal `src[start..start+len]`.
    fn matches_range(&self, at: usize, start: usize, len: usize) -> bool {
        match self.src.get(at..at.saturating_add(len)) {
            Some(window) => *window == self.src[start..start + len],
            None => false,
        }
    }

    /// A bareword starting at `p` has a keyword-valid left boundary.
    fn keyword_start(&self, p: usize) -> bool {
        p == 0 || is_br_or_ws_or_punctuator_not_dot(self.at(p - 1))
    }

    /// `true` when `keyword` ends exactly at `p` with a keyword-valid left
    /// boundary before it.
    fn read_preceding_keyword(&self, p: usize, keyword: &[u8]) -> bool {
        if p == SENTINEL || p >= self.src.len() {
            return false;
        }
        let len = keyword.len();
        if p + 1 < len {
            return false;
        }
        let start = p + 1 - len;
        self.src[start..=p] == *keyword
            && (start == 0 || is_br_or_ws_or_punctuator_not_dot(self.src[start - 1]))
    }

    /// The bareword ending at `p` is a keyword after which `/` starts a
    /// regex literal.
    fn is_expression_keyword(&self, p: usize) -> bool {
        match self.at(p) {
            b'd' => {
                self.read_preceding_keyword(p, b"void") || self.read_preceding_keyword(p, b"yield")
            }
            b'e' => {
                self.read_preceding_keyword(p, b"case")
                    || self.read_preceding_keyword(p, b"delete")
                    || self.read_preceding_keyword(p, b"else")
            }
            b'f' => {
                self.read_preceding_keyword(p, b"typeof")
                    || self.read_preceding_keyword(p, b"instanceof")
            }
            b'n' => {
                self.read_preceding_keyword(p, b"in") || self.read_preceding_keyword(p, b"return")
            }
            b'o' => self.read_preceding_keyword(p, b"do"),
            b'r' => self.read_preceding_keyword(p, b"debugger"),
            b't' => self.read_preceding_keyword(p, b"await"),
            b'w' => {
                self.read_preceding_keyword(p, b"new") || self.read_preceding_keyword(p, b"throw")
            }
            _ => false,
        }
    }

    /// The token ending at `p` is `while`, `for`, or `if` (so the paren it
    /// opened holds a condition, not a value).
    fn is_paren_keyword(&self, p: usize) -> bool {
        self.read_preceding_keyword(p, b"while")
            || self.read_preceding_keyword(p, b"for")
            || self.read_preceding_keyword(p, b"if")
    }

    /// The token ending at `p` terminates an expression statement, so a
    /// brace that follows it opens a block (and `/` after that block's `}`
    /// starts a regex).
    fn is_expression_terminator(&self, p: usize) -> bool {
        match self.at(p) {
            b';' | b')' => true,
            b'>' => p != SENTINEL && p > 0 && self.at(p - 1) == b'=',
            b'h' => self.read_preceding_keyword(p, b"catch"),
            b'y' => self.read_preceding_keyword(p, b"finally"),
            b'e' => self.read_preceding_keyword(p, b"else"),
            _ => false,
        }
    }

    /// Entry of the open-token-position stack at the current depth, guarded
    /// against the (already failed) full-stack case.
    fn open_token_pos(&self) -> usize {
        self.open_token_pos_stack
            .get(self.open_token_depth)
            .copied()
            .unwrap_or(SENTINEL)
    }

    fn open_class_flag(&self) -> bool {
        self.open_class_pos_stack
            .get(self.open_token_depth)
            .copied()
            .unwrap_or(false)
    }

    /// Record the first error and park the cursor past the end so every scan
    /// loop unwinds.
    fn syntax_error(&mut self, kind: ErrorKind, offset: usize) {
        if self.error.is_none() {
            self.error = Some((kind, Some(offset)));
        }
        self.pos = self.src.len();
    }

    /// Push an opened `(` or `{` (or dynamic-import paren).  The fixed
    /// capacity is a hard ceiling; hitting it fails the parse with the
    /// taxonomy's one overflow code.
    fn push_open_token(&mut self, last_pos: usize, is_brace: bool, is_class: bool) {
        if self.open_token_depth >= STACK_DEPTH {
            self.syntax_error(ErrorKind::TemplateNestOverflow, self.pos.min(self.src.len()));
            return;
        }
        self.open_token_pos_stack[self.open_token_depth] = last_pos;
        self.open_brace_stack[self.open_token_depth] = is_brace;
        self.open_class_pos_stack[self.open_token_depth] = is_class;
        self.open_token_depth += 1;
    }

    // ── Comment and literal skippers ────────────────────────────────────────

    /// Skip whitespace and comments; return the byte at the new cursor
    /// position (0 at end of input).  The cursor is left *on* that byte.
    fn comment_whitespace(&mut self) -> u8 {
        while self.pos < self.src.len() {
            let ch = self.src[self.pos];
            if ch == b'/' {
                match self.at(self.pos + 1) {
                    b'/' => self.line_comment(),
                    b'*' => self.block_comment(),
                    _ => return ch,
                }
            } else if !is_br_or_ws(ch) {
                return ch;
            }
            self.pos += 1;
        }
        0
    }

    /// Skip a `// …` comment; leaves the cursor on the line terminator.
    fn line_comment(&mut self) {
        self.pos += 1;
        loop {
            self.pos += 1;
            match self.src.get(self.pos) {
                None => {
                    self.pos = self.src.len();
                    return;
                }
                Some(&b'\n') | Some(&b'\r') => return,
                Some(_) => {}
            }
        }
    }

    /// Skip a `/* … */` comment; leaves the cursor on the closing `/`.  An
    /// unterminated block comment simply runs to end of input.
    fn block_comment(&mut self) {
        self.pos += 1;
        loop {
            self.pos += 1;
            let Some(&ch) = self.src.get(self.pos) else {
                return;
            };
            if ch == b'*' && self.at(self.pos + 1) == b'/' {
                self.pos += 1;
                return;
            }
        }
    }

    /// Skip a string literal; the cursor starts on the opening quote and
    /// ends on the closing quote.  Raw line terminators are invalid inside
    /// (except escaped, including the `\` CRLF line continuation).
    fn string_literal(&mut self, quote: u8) {
        let start = self.pos;
        loop {
            self.pos += 1;
            let Some(&ch) = self.src.get(self.pos) else {
                break;
            };
            if ch == quote {
                return;
            }
            if ch == b'\\' {
                if self.pos + 1 >= self.src.len() {
                    break;
                }
                self.pos += 1;
                if self.src[self.pos] == b'\r' && self.at(self.pos + 1) == b'\n' {
                    self.pos += 1;
                }
            } else if is_br(ch) {
                break;
            }
        }
        self.syntax_error(ErrorKind::UnterminatedStringLiteral, start);
    }

    /// Skip a regex literal; the cursor starts on the opening `/` and ends
    /// on the closing `/` (flags are left to the main loop).
    fn regular_expression(&mut self) {
        let start = self.pos;
        loop {
            self.pos += 1;
            let Some(&ch) = self.src.get(self.pos) else {
                break;
            };
            if ch == b'/' {
                return;
            }
            if ch == b'[' {
                self.regex_character_class();
            } else if ch == b'\\' {
                if self.pos + 1 < self.src.len() {
                    self.pos += 1;
                }
            } else if is_br(ch) {
                break;
            }
        }
        self.syntax_error(ErrorKind::UnterminatedRegex, start);
    }

    /// Skip a `[…]` character class inside a regex; `/` loses its closing
    /// role in here.
    fn regex_character_class(&mut self) {
        let start = self.pos;
        loop {
            self.pos += 1;
            let Some(&ch) = self.src.get(self.pos) else {
                break;
            };
            if ch == b']' {
                return;
            }
            if ch == b'\\' {
                if self.pos + 1 < self.src.len() {
                    self.pos += 1;
                }
            } else if is_br(ch) {
                break;
            }
        }
        self.syntax_error(ErrorKind::UnterminatedRegexCharacterClass, start);
    }

    /// Skip template characters from the cursor (an opening backtick or the
    /// `}` that closed a substitution) until the closing backtick or a `${`.
    /// A `${` pushes the template stack and returns control to the main
    /// loop, which scans the substitution expression as ordinary code.
    fn template_string(&mut self) {
        let start = self.pos;
        loop {
            self.pos += 1;
            let Some(&ch) = self.src.get(self.pos) else {
                break;
            };
            if ch == b'$' && self.at(self.pos + 1) == b'{' {
                self.pos += 1;
                if self.template_stack_len >= STACK_DEPTH || self.open_token_depth >= STACK_DEPTH {
                    self.syntax_error(ErrorKind::TemplateNestOverflow, self.pos.min(self.src.len()));
                    return;
                }
                self.template_stack[self.template_stack_len] = self.template_depth;
                self.template_stack_len += 1;
                self.open_token_depth += 1;
                self.template_depth = self.open_token_depth;
                return;
            }
            if ch == b'`' {
                return;
            }
            if ch == b'\\' && self.pos + 1 < self.src.len() {
                self.pos += 1;
            }
        }
        self.syntax_error(ErrorKind::UnterminatedTemplateString, start);
    }

    /// Consume an identifier whose first byte (`start_ch`, at the cursor)
    /// has already been read.  Leaves the cursor on the first byte past it.
    fn identifier(&mut self, start_ch: u8) -> bool {
        if !is_identifier_start(start_ch) {
            return false;
        }
        self.pos += 1;
        while self.pos < self.src.len() && is_identifier_char(self.src[self.pos]) {
            self.pos += 1;
        }
        true
    }

    // ── Emission ────────────────────────────────────────────────────────────

    /// Record an export name spanning `[start, end)`, quotes included when
    /// the key was a string literal.  Duplicates (byte-identical names) are
    /// suppressed.
    fn add_export(&mut self, start: usize, end: usize) {
        let src = self.src;
        let (mut start, mut end) = (start, end);
        if start < end && (src[start] == b'\'' || src[start] == b'"') {
            start += 1;
            end -= 1;
        }
        let name = &src[start..end];
        // An escaped lone high surrogate (`\u{D800}`–`\u{DFFF}`) cannot
        // stand alone as an export name.
        if name.len() == 8
            && name[0] == b'\\'
            && name[1] == b'u'
            && name[2] == b'{'
            && name[7] == b'}'
            && name[3] == b'D'
            && matches!(name[4], b'8' | b'9' | b'A'..=b'F')
        {
            return;
        }
        if self.exports.iter().any(|e| e.name == name) {
            return;
        }
        let line = self.lines.line_at(src, start);
        self.exports.push(Export { name, line });
    }

    /// Record a re-export specifier spanning `[start, end)`, quotes
    /// included.  Re-exports are not deduplicated.
    fn add_reexport(&mut self, start: usize, end: usize) {
        let src = self.src;
        let (mut start, mut end) = (start, end);
        if start < end && (src[start] == b'\'' || src[start] == b'"') {
            start += 1;
            end -= 1;
        }
        let line = self.lines.line_at(src, start);
        self.reexports.push(Reexport {
            specifier: &src[start..end],
            line,
        });
    }

    /// `module.exports = …` overwrites whatever was assigned before, so any
    /// accumulated re-exports are dropped before the new right-hand side is
    /// examined.
    fn clear_reexports(&mut self) {
        self.reexports.clear();
    }

    /// Stage a specifier into the next free star-export slot.  The slot is
    /// only consumed if the backtracking capture later commits it.
    fn stage_star_specifier(&mut self, start: usize, end: usize) {
        if self.star_export_len < MAX_STAR_EXPORTS {
            self.star_export_stack[self.star_export_len].specifier_start = start;
            self.star_export_stack[self.star_export_len].specifier_end = end;
        }
    }

    // ── Idiom recognizers ───────────────────────────────────────────────────

    /// Consume `exports` or `module.exports` (comments and whitespace
    /// allowed around the dot), restoring the cursor on mismatch.  `ch` is
    /// the byte at the cursor.
    fn read_exports_or_module_dot_exports(&mut self, ch: u8) -> bool {
        let revert_pos = self.pos;
        let mut ch = ch;
        if ch == b'm' && self.matches_at(self.pos + 1, b"odule") {
            self.pos += 6;
            ch = self.comment_whitespace();
            if ch != b'.' {
                self.pos = revert_pos;
                return false;
            }
            self.pos += 1;
            ch = self.comment_whitespace();
        }
        if ch == b'e' && self.matches_at(self.pos + 1, b"xports") {
            self.pos += 7;
            true
        } else {
            self.pos = revert_pos;
            false
        }
    }

    /// Parse `require ( "specifier" )` with the cursor on the `r`.  In
    /// `ExportAssign`/`ExportStar` mode a successful match records a
    /// re-export; in `Import` mode it stages the specifier for star-export
    /// binding capture.  Restores the cursor on mismatch.
    fn try_parse_require(&mut self, require_type: RequireType) -> bool {
        let revert_pos = self.pos;
        if !self.matches_at(self.pos + 1, b"equire") {
            return false;
        }
        self.pos += 7;
        let mut ch = self.comment_whitespace();
        if ch == b'(' {
            self.pos += 1;
            ch = self.comment_whitespace();
            let reexport_start = self.pos;
            if ch == b'\'' || ch == b'"' {
                self.string_literal(ch);
                self.pos += 1;
                let reexport_end = self.pos;
                ch = self.comment_whitespace();
                if ch == b')' {
                    match require_type {
                        RequireType::ExportAssign | RequireType::ExportStar => {
                            self.add_reexport(reexport_start, reexport_end);
                        }
                        RequireType::Import => {
                            self.stage_star_specifier(reexport_start, reexport_end);
                        }
                    }
                    return true;
                }
            }
        }
        self.pos = revert_pos;
        false
    }

    /// An object-literal property value: a bare identifier or a
    /// `require("…")` call (which also records a re-export).  Updates `ch`
    /// to the byte at the new cursor position.
    fn try_parse_property_value(&mut self, ch: &mut u8) -> bool {
        if *ch == b'r' && self.try_parse_require(RequireType::ExportAssign) {
            *ch = self.at(self.pos);
            return true;
        }
        if self.identifier(*ch) {
            *ch = self.at(self.pos);
            return true;
        }
        false
    }

    /// Walk a `module.exports = { … }` object literal, recording each
    /// recognizable property key as an export.  The cursor starts on the
    /// `{`.  A `get name(` getter aborts the walk (exports already
    /// collected in this literal are kept); any unrecognizable property
    /// shape restores the cursor so the literal rescans as plain code.
    fn try_parse_literal_exports(&mut self) {
        let revert_pos = self.pos - 1;
        loop {
            if self.pos >= self.src.len() {
                return;
            }
            self.pos += 1;
            let mut ch = self.comment_whitespace();
            let start_pos = self.pos;
            if self.identifier(ch) {
                let end_pos = self.pos;
                ch = self.comment_whitespace();

                // `get name() { … }` marks lazy exports this scanner will
                // not claim; stop walking the literal entirely.
                if ch != b':' && end_pos - start_pos == 3 && self.matches_at(start_pos, b"get") {
                    if self.identifier(ch) {
                        ch = self.comment_whitespace();
                        if ch == b'(' {
                            self.pos = revert_pos;
                            return;
                        }
                    }
                    self.pos = revert_pos;
                    return;
                }

                if ch == b':' {
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if !self.try_parse_property_value(&mut ch) {
                        self.pos = revert_pos;
                        return;
                    }
                }
                self.add_export(start_pos, end_pos);
            } else if ch == b'\'' || ch == b'"' {
                let start = self.pos;
                self.string_literal(ch);
                self.pos += 1;
                let end_pos = self.pos;
                ch = self.comment_whitespace();
                if ch == b':' {
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if !self.try_parse_property_value(&mut ch) {
                        self.pos = revert_pos;
                        return;
                    }
                    self.add_export(start, end_pos);
                }
            } else if ch == b'.' && self.matches_at(self.pos + 1, b"..") {
                self.pos += 3;
                if self.at(self.pos) == b'r' && self.try_parse_require(RequireType::ExportAssign) {
                    self.pos += 1;
                } else if self.pos < self.src.len() && !self.identifier(self.at(self.pos)) {
                    self.pos = revert_pos;
                    return;
                }
                ch = self.comment_whitespace();
            } else {
                self.pos = revert_pos;
                return;
            }

            if ch == b'}' {
                return;
            }
            if ch != b',' {
                self.pos = revert_pos;
                return;
            }
        }
    }

    /// Dispatch after the bareword `exports` (cursor just past it after the
    /// `pos += 7` on entry): `.name =`, `["name"] =`, or — when reached via
    /// `module.exports` — `= {…}` / `= require("…")`.
    fn try_parse_exports_dot_assign(&mut self, assign: bool) {
        self.pos += 7;
        let revert_pos = self.pos - 1;
        let mut ch = self.comment_whitespace();
        match ch {
            b'.' => {
                self.pos += 1;
                ch = self.comment_whitespace();
                let start_pos = self.pos;
                if self.identifier(ch) {
                    let end_pos = self.pos;
                    ch = self.comment_whitespace();
                    if ch == b'=' {
                        self.add_export(start_pos, end_pos);
                        return;
                    }
                }
            }
            b'[' => {
                self.pos += 1;
                ch = self.comment_whitespace();
                if ch == b'\'' || ch == b'"' {
                    let start_pos = self.pos;
                    self.string_literal(ch);
                    self.pos += 1;
                    let end_pos = self.pos;
                    ch = self.comment_whitespace();
                    if ch == b']' {
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b'=' {
                            self.add_export(start_pos, end_pos);
                        }
                    }
                }
            }
            b'=' => {
                if assign {
                    // Last assignment wins: drop re-exports accumulated
                    // against the value being overwritten.
                    self.clear_reexports();
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch == b'{' {
                        self.try_parse_literal_exports();
                        return;
                    }
                    if ch == b'r' {
                        self.try_parse_require(RequireType::ExportAssign);
                    }
                }
            }
            _ => {}
        }
        self.pos = revert_pos;
    }

    /// `module` (cursor on the `m`) followed by `.exports` hands off to
    /// [`Lexer::try_parse_exports_dot_assign`] in assignment mode.
    fn try_parse_module_exports_dot_assign(&mut self) {
        self.pos += 6;
        let revert_pos = self.pos - 1;
        let mut ch = self.comment_whitespace();
        if ch == b'.' {
            self.pos += 1;
            ch = self.comment_whitespace();
            if ch == b'e' && self.matches_at(self.pos + 1, b"xports") {
                self.try_parse_exports_dot_assign(true);
                return;
            }
        }
        self.pos = revert_pos;
    }

    /// `Object.prototype.hasOwnProperty.call(x, it)` (the `prototype` hop
    /// optional), where `it` must be the loop variable.
    fn try_parse_object_has_own_property(&mut self, it_id_start: usize, it_id_len: usize) -> bool {
        let mut ch = self.comment_whitespace();
        if ch != b'O' || !self.matches_at(self.pos + 1, b"bject") {
            return false;
        }
        self.pos += 6;
        ch = self.comment_whitespace();
        if ch != b'.' {
            return false;
        }
        self.pos += 1;
        ch = self.comment_whitespace();
        if ch == b'p' {
            if !self.matches_at(self.pos + 1, b"rototype") {
                return false;
            }
            self.pos += 9;
            ch = self.comment_whitespace();
            if ch != b'.' {
                return false;
            }
            self.pos += 1;
            ch = self.comment_whitespace();
        }
        if ch != b'h' || !self.matches_at(self.pos + 1, b"asOwnProperty") {
            return false;
        }
        self.pos += 14;
        ch = self.comment_whitespace();
        if ch != b'.' {
            return false;
        }
        self.pos += 1;
        ch = self.comment_whitespace();
        if ch != b'c' || !self.matches_at(self.pos + 1, b"all") {
            return false;
        }
        self.pos += 4;
        ch = self.comment_whitespace();
        if ch != b'(' {
            return false;
        }
        self.pos += 1;
        ch = self.comment_whitespace();
        if !self.identifier(ch) {
            return false;
        }
        ch = self.comment_whitespace();
        if ch != b',' {
            return false;
        }
        self.pos += 1;
        let _ = self.comment_whitespace();
        if !self.matches_range(self.pos, it_id_start, it_id_len) {
            return false;
        }
        self.pos += it_id_len;
        ch = self.comment_whitespace();
        if ch != b')' {
            return false;
        }
        self.pos += 1;
        true
    }

    /// `Object.` (cursor on the `O`) followed by either
    /// `defineProperty(exports, "name", { … })` or — at top level only —
    /// the transpiler-generated `keys(local).forEach(function (it) { … })`
    /// re-export loop.
    fn try_parse_object_define_or_keys(&mut self, keys: bool) {
        self.pos += 6;
        let mut revert_pos = self.pos - 1;
        let mut ch = self.comment_whitespace();
        if ch == b'.' {
            self.pos += 1;
            ch = self.comment_whitespace();
            if ch == b'd' && self.matches_at(self.pos + 1, b"efineProperty") {
                'define: {
                    self.pos += 14;
                    revert_pos = self.pos - 1;
                    ch = self.comment_whitespace();
                    if ch != b'(' {
                        break 'define;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if !self.read_exports_or_module_dot_exports(ch) {
                        break 'define;
                    }
                    ch = self.comment_whitespace();
                    if ch != b',' {
                        break 'define;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'\'' && ch != b'"' {
                        break 'define;
                    }
                    let export_start = self.pos;
                    self.string_literal(ch);
                    self.pos += 1;
                    let export_end = self.pos;
                    ch = self.comment_whitespace();
                    if ch != b',' {
                        break 'define;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'{' {
                        break 'define;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch == b'e' {
                        if !self.matches_at(self.pos + 1, b"numerable") {
                            break 'define;
                        }
                        self.pos += 10;
                        ch = self.comment_whitespace();
                        if ch != b':' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        // `enumerable: false` is internal housekeeping, not
                        // a public export; any non-`true` value aborts.
                        if ch != b't' || !self.matches_at(self.pos + 1, b"rue") {
                            break 'define;
                        }
                        self.pos += 4;
                        ch = self.comment_whitespace();
                        if ch != b',' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                    }
                    if ch == b'v' {
                        if !self.matches_at(self.pos + 1, b"alue") {
                            break 'define;
                        }
                        self.pos += 5;
                        ch = self.comment_whitespace();
                        if ch != b':' {
                            break 'define;
                        }
                        self.add_export(export_start, export_end);
                        self.pos = revert_pos;
                        return;
                    } else if ch == b'g' {
                        if !self.matches_at(self.pos + 1, b"et") {
                            break 'define;
                        }
                        self.pos += 3;
                        ch = self.comment_whitespace();
                        if ch == b':' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if ch != b'f' {
                                break 'define;
                            }
                            if !self.matches_at(self.pos + 1, b"unction") {
                                break 'define;
                            }
                            self.pos += 8;
                            let last_pos = self.pos;
                            ch = self.comment_whitespace();
                            if ch != b'(' && (last_pos == self.pos || !self.identifier(ch)) {
                                break 'define;
                            }
                            ch = self.comment_whitespace();
                        }
                        if ch != b'(' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b')' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'{' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'r' {
                            break 'define;
                        }
                        if !self.matches_at(self.pos + 1, b"eturn") {
                            break 'define;
                        }
                        self.pos += 6;
                        ch = self.comment_whitespace();
                        if !self.identifier(ch) {
                            break 'define;
                        }
                        ch = self.comment_whitespace();
                        if ch == b'.' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if !self.identifier(ch) {
                                break 'define;
                            }
                            ch = self.comment_whitespace();
                        } else if ch == b'[' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if ch == b'\'' || ch == b'"' {
                                self.string_literal(ch);
                            } else {
                                break 'define;
                            }
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if ch != b']' {
                                break 'define;
                            }
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                        if ch == b';' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                        if ch != b'}' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b',' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                        if ch != b'}' {
                            break 'define;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b')' {
                            break 'define;
                        }
                        self.add_export(export_start, export_end);
                        return;
                    }
                    break 'define;
                }
            } else if keys && ch == b'k' && self.matches_at(self.pos + 1, b"eys") {
                'keys: {
                    self.pos += 4;
                    revert_pos = self.pos - 1;
                    ch = self.comment_whitespace();
                    if ch != b'(' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    let id_start = self.pos;
                    if !self.identifier(ch) {
                        break 'keys;
                    }
                    let id_len = self.pos - id_start;
                    ch = self.comment_whitespace();
                    if ch != b')' {
                        break 'keys;
                    }

                    revert_pos = self.pos;
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'.' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'f' || !self.matches_at(self.pos + 1, b"orEach") {
                        break 'keys;
                    }
                    self.pos += 7;
                    ch = self.comment_whitespace();
                    revert_pos = self.pos - 1;
                    if ch != b'(' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'f' || !self.matches_at(self.pos + 1, b"unction") {
                        break 'keys;
                    }
                    self.pos += 8;
                    ch = self.comment_whitespace();
                    if ch != b'(' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    let it_id_start = self.pos;
                    if !self.identifier(ch) {
                        break 'keys;
                    }
                    let it_id_len = self.pos - it_id_start;
                    ch = self.comment_whitespace();
                    if ch != b')' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'{' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b'i' || self.at(self.pos + 1) != b'f' {
                        break 'keys;
                    }
                    self.pos += 2;
                    ch = self.comment_whitespace();
                    if ch != b'(' {
                        break 'keys;
                    }
                    self.pos += 1;
                    let _ = self.comment_whitespace();
                    if !self.matches_range(self.pos, it_id_start, it_id_len) {
                        break 'keys;
                    }
                    self.pos += it_id_len;
                    ch = self.comment_whitespace();

                    if ch == b'=' {
                        // if (it === "default" || it === "__esModule") return;
                        if !self.matches_at(self.pos + 1, b"==") {
                            break 'keys;
                        }
                        self.pos += 3;
                        ch = self.comment_whitespace();
                        if ch != b'"' && ch != b'\'' {
                            break 'keys;
                        }
                        let mut quot = ch;
                        if !self.matches_at(self.pos + 1, b"default") {
                            break 'keys;
                        }
                        self.pos += 8;
                        ch = self.comment_whitespace();
                        if ch != quot {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'|' || self.at(self.pos + 1) != b'|' {
                            break 'keys;
                        }
                        self.pos += 2;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, it_id_start, it_id_len) {
                            break 'keys;
                        }
                        self.pos += it_id_len;
                        ch = self.comment_whitespace();
                        if ch != b'=' || !self.matches_at(self.pos + 1, b"==") {
                            break 'keys;
                        }
                        self.pos += 3;
                        ch = self.comment_whitespace();
                        if ch != b'"' && ch != b'\'' {
                            break 'keys;
                        }
                        quot = ch;
                        if !self.matches_at(self.pos + 1, b"__esModule") {
                            break 'keys;
                        }
                        self.pos += 11;
                        ch = self.comment_whitespace();
                        if ch != quot {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b')' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'r' || !self.matches_at(self.pos + 1, b"eturn") {
                            break 'keys;
                        }
                        self.pos += 6;
                        ch = self.comment_whitespace();
                        if ch == b';' {
                            self.pos += 1;
                        }
                        ch = self.comment_whitespace();

                        // Optional second guard: hasOwnProperty(_exportNames)
                        // or `it in exports && exports[it] === local[it]`.
                        if ch == b'i' && self.at(self.pos + 1) == b'f' {
                            let mut in_if = true;
                            self.pos += 2;
                            ch = self.comment_whitespace();
                            if ch != b'(' {
                                break 'keys;
                            }
                            self.pos += 1;
                            let if_inner_pos = self.pos;
                            if self.try_parse_object_has_own_property(it_id_start, it_id_len) {
                                ch = self.comment_whitespace();
                                if ch != b')' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                ch = self.comment_whitespace();
                                if ch != b'r' || !self.matches_at(self.pos + 1, b"eturn") {
                                    break 'keys;
                                }
                                self.pos += 6;
                                ch = self.comment_whitespace();
                                if ch == b';' {
                                    self.pos += 1;
                                }
                                ch = self.comment_whitespace();
                                if ch == b'i' && self.at(self.pos + 1) == b'f' {
                                    self.pos += 2;
                                    ch = self.comment_whitespace();
                                    if ch != b'(' {
                                        break 'keys;
                                    }
                                    self.pos += 1;
                                } else {
                                    in_if = false;
                                }
                            } else {
                                self.pos = if_inner_pos;
                            }

                            if in_if {
                                let _ = self.comment_whitespace();
                                if !self.matches_range(self.pos, it_id_start, it_id_len) {
                                    break 'keys;
                                }
                                self.pos += it_id_len;
                                ch = self.comment_whitespace();
                                if ch != b'i' || !self.matches_at(self.pos + 1, b"n ") {
                                    break 'keys;
                                }
                                self.pos += 3;
                                ch = self.comment_whitespace();
                                if !self.read_exports_or_module_dot_exports(ch) {
                                    break 'keys;
                                }
                                ch = self.comment_whitespace();
                                if ch != b'&' || self.at(self.pos + 1) != b'&' {
                                    break 'keys;
                                }
                                self.pos += 2;
                                ch = self.comment_whitespace();
                                if !self.read_exports_or_module_dot_exports(ch) {
                                    break 'keys;
                                }
                                ch = self.comment_whitespace();
                                if ch != b'[' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                let _ = self.comment_whitespace();
                                if !self.matches_range(self.pos, it_id_start, it_id_len) {
                                    break 'keys;
                                }
                                self.pos += it_id_len;
                                ch = self.comment_whitespace();
                                if ch != b']' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                ch = self.comment_whitespace();
                                if ch != b'=' || !self.matches_at(self.pos + 1, b"==") {
                                    break 'keys;
                                }
                                self.pos += 3;
                                let _ = self.comment_whitespace();
                                if !self.matches_range(self.pos, id_start, id_len) {
                                    break 'keys;
                                }
                                self.pos += id_len;
                                ch = self.comment_whitespace();
                                if ch != b'[' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                let _ = self.comment_whitespace();
                                if !self.matches_range(self.pos, it_id_start, it_id_len) {
                                    break 'keys;
                                }
                                self.pos += it_id_len;
                                ch = self.comment_whitespace();
                                if ch != b']' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                ch = self.comment_whitespace();
                                if ch != b')' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                ch = self.comment_whitespace();
                                if ch != b'r' || !self.matches_at(self.pos + 1, b"eturn") {
                                    break 'keys;
                                }
                                self.pos += 6;
                                ch = self.comment_whitespace();
                                if ch == b';' {
                                    self.pos += 1;
                                }
                                ch = self.comment_whitespace();
                            }
                        }
                    } else if ch == b'!' {
                        // if (it !== "default" [&& !….hasOwnProperty(it)]) …
                        if !self.matches_at(self.pos + 1, b"==") {
                            break 'keys;
                        }
                        self.pos += 3;
                        ch = self.comment_whitespace();
                        if ch != b'"' && ch != b'\'' {
                            break 'keys;
                        }
                        let quot = ch;
                        if !self.matches_at(self.pos + 1, b"default") {
                            break 'keys;
                        }
                        self.pos += 8;
                        ch = self.comment_whitespace();
                        if ch != quot {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b'&' {
                            if self.at(self.pos + 1) != b'&' {
                                break 'keys;
                            }
                            self.pos += 2;
                            ch = self.comment_whitespace();
                            if ch != b'!' {
                                break 'keys;
                            }
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if ch == b'O' && self.matches_at(self.pos + 1, b"bject.") {
                                if !self.try_parse_object_has_own_property(it_id_start, it_id_len)
                                {
                                    break 'keys;
                                }
                            } else if self.identifier(ch) {
                                ch = self.comment_whitespace();
                                if ch != b'.' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                ch = self.comment_whitespace();
                                if ch != b'h' || !self.matches_at(self.pos + 1, b"asOwnProperty") {
                                    break 'keys;
                                }
                                self.pos += 14;
                                ch = self.comment_whitespace();
                                if ch != b'(' {
                                    break 'keys;
                                }
                                self.pos += 1;
                                let _ = self.comment_whitespace();
                                if !self.matches_range(self.pos, it_id_start, it_id_len) {
                                    break 'keys;
                                }
                                self.pos += it_id_len;
                                ch = self.comment_whitespace();
                                if ch != b')' {
                                    break 'keys;
                                }
                                self.pos += 1;
                            }
                            ch = self.comment_whitespace();
                        }
                        if ch != b')' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                    } else {
                        break 'keys;
                    }

                    // The loop body: either a plain property copy or a
                    // defineProperty getter in the same narrow shape.
                    if self.read_exports_or_module_dot_exports(ch) {
                        ch = self.comment_whitespace();
                        if ch != b'[' {
                            break 'keys;
                        }
                        self.pos += 1;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, it_id_start, it_id_len) {
                            break 'keys;
                        }
                        self.pos += it_id_len;
                        ch = self.comment_whitespace();
                        if ch != b']' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'=' {
                            break 'keys;
                        }
                        self.pos += 1;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, id_start, id_len) {
                            break 'keys;
                        }
                        self.pos += id_len;
                        ch = self.comment_whitespace();
                        if ch != b'[' {
                            break 'keys;
                        }
                        self.pos += 1;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, it_id_start, it_id_len) {
                            break 'keys;
                        }
                        self.pos += it_id_len;
                        ch = self.comment_whitespace();
                        if ch != b']' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b';' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                    } else if ch == b'O' {
                        if !self.matches_at(self.pos + 1, b"bject") {
                            break 'keys;
                        }
                        self.pos += 6;
                        ch = self.comment_whitespace();
                        if ch != b'.' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'd' || !self.matches_at(self.pos + 1, b"efineProperty") {
                            break 'keys;
                        }
                        self.pos += 14;
                        ch = self.comment_whitespace();
                        if ch != b'(' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if !self.read_exports_or_module_dot_exports(ch) {
                            break 'keys;
                        }
                        ch = self.comment_whitespace();
                        if ch != b',' {
                            break 'keys;
                        }
                        self.pos += 1;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, it_id_start, it_id_len) {
                            break 'keys;
                        }
                        self.pos += it_id_len;
                        ch = self.comment_whitespace();
                        if ch != b',' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'{' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'e' || !self.matches_at(self.pos + 1, b"numerable") {
                            break 'keys;
                        }
                        self.pos += 10;
                        ch = self.comment_whitespace();
                        if ch != b':' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b't' || !self.matches_at(self.pos + 1, b"rue") {
                            break 'keys;
                        }
                        self.pos += 4;
                        ch = self.comment_whitespace();
                        if ch != b',' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'g' || !self.matches_at(self.pos + 1, b"et") {
                            break 'keys;
                        }
                        self.pos += 3;
                        ch = self.comment_whitespace();
                        if ch == b':' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                            if ch != b'f' {
                                break 'keys;
                            }
                            if !self.matches_at(self.pos + 1, b"unction") {
                                break 'keys;
                            }
                            self.pos += 8;
                            let last_pos = self.pos;
                            ch = self.comment_whitespace();
                            if ch != b'(' && (last_pos == self.pos || !self.identifier(ch)) {
                                break 'keys;
                            }
                            ch = self.comment_whitespace();
                        }
                        if ch != b'(' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b')' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'{' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b'r' || !self.matches_at(self.pos + 1, b"eturn") {
                            break 'keys;
                        }
                        self.pos += 6;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, id_start, id_len) {
                            break 'keys;
                        }
                        self.pos += id_len;
                        ch = self.comment_whitespace();
                        if ch != b'[' {
                            break 'keys;
                        }
                        self.pos += 1;
                        let _ = self.comment_whitespace();
                        if !self.matches_range(self.pos, it_id_start, it_id_len) {
                            break 'keys;
                        }
                        self.pos += it_id_len;
                        ch = self.comment_whitespace();
                        if ch != b']' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b';' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                        if ch != b'}' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b',' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                        if ch != b'}' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch != b')' {
                            break 'keys;
                        }
                        self.pos += 1;
                        ch = self.comment_whitespace();
                        if ch == b';' {
                            self.pos += 1;
                            ch = self.comment_whitespace();
                        }
                    } else {
                        break 'keys;
                    }

                    if ch != b'}' {
                        break 'keys;
                    }
                    self.pos += 1;
                    ch = self.comment_whitespace();
                    if ch != b')' {
                        break 'keys;
                    }

                    // The loop copies from `local`; if a prior
                    // `require("…")` was captured for it, this whole
                    // construct is a star re-export of that module.
                    for i in 0..self.star_export_len {
                        let binding = self.star_export_stack[i];
                        if binding.id_end - binding.id_start == id_len
                            && self.src[binding.id_start..binding.id_end]
                                == self.src[id_start..id_start + id_len]
                        {
                            self.add_reexport(binding.specifier_start, binding.specifier_end);
                            self.pos = revert_pos;
                            return;
                        }
                    }
                    return;
                }
            }
        }
        self.pos = revert_pos;
    }

    /// Walk backwards from just before a matched `require` looking for the
    /// `var`/`let`/`const <ident> =` that binds it, committing a
    /// star-export binding on success.  Only single spaces are tolerated,
    /// matching what transpilers emit.
    fn try_backtrack_add_star_export_binding(&mut self, mut bpos: usize) {
        while self.at(bpos) == b' ' && bpos > 0 {
            bpos -= 1;
        }
        if self.at(bpos) != b'=' {
            return;
        }
        if bpos == 0 {
            return;
        }
        bpos -= 1;
        while self.at(bpos) == b' ' && bpos > 0 {
            bpos -= 1;
        }
        let id_end = bpos;
        let mut identifier_start = false;
        while bpos > 0 {
            let ch = self.at(bpos);
            if !is_identifier_char(ch) {
                break;
            }
            identifier_start = is_identifier_start(ch);
            bpos -= 1;
        }
        if identifier_start && self.at(bpos) == b' ' {
            if self.star_export_len >= MAX_STAR_EXPORTS {
                return;
            }
            self.star_export_stack[self.star_export_len].id_start = bpos + 1;
            self.star_export_stack[self.star_export_len].id_end = id_end + 1;
            while self.at(bpos) == b' ' && bpos > 0 {
                bpos -= 1;
            }
            match self.at(bpos) {
                b'r' => {
                    if bpos == 0 || !self.read_preceding_keyword(bpos - 1, b"va") {
                        return;
                    }
                }
                b't' => {
                    if bpos == 0
                        || (!self.read_preceding_keyword(bpos - 1, b"le")
                            && !self.read_preceding_keyword(bpos - 1, b"cons"))
                    {
                        return;
                    }
                }
                _ => return,
            }
            self.star_export_len += 1;
        }
    }

    // ── ESM rejection ───────────────────────────────────────────────────────

    /// A top-level bareword `import`.  Dynamic `import(` is harmless;
    /// `import.meta` and static import statements make the module ESM.
    fn reject_esm_import(&mut self) {
        let start_pos = self.pos;
        self.pos += 6;
        let ch = self.comment_whitespace();
        match ch {
            b'(' => {
                self.push_open_token(start_pos, false, false);
            }
            b'.' => {
                self.pos += 1;
                let ch = self.comment_whitespace();
                if ch == b'm'
                    && self.pos + 4 <= self.src.len()
                    && self.matches_at(self.pos + 1, b"eta")
                {
                    // `import.metaFoo` is a plain member access.
                    if self.pos + 4 < self.src.len() && is_identifier_char(self.src[self.pos + 4])
                    {
                        return;
                    }
                    self.syntax_error(ErrorKind::UnexpectedEsmImportMeta, start_pos);
                }
            }
            _ => {
                let adjacent = self.pos == start_pos + 6;
                let esm_trigger = matches!(ch, b'"' | b'\'' | b'{' | b'*');
                if adjacent && !esm_trigger {
                    // Identifier continuation (`imports`, `importX`, …).
                    return;
                }
                if self.open_token_depth != 0 {
                    self.pos -= 1;
                    return;
                }
                self.syntax_error(ErrorKind::UnexpectedEsmImport, start_pos);
            }
        }
    }

    /// A top-level bareword `export` not continuing into `exports`.
    fn reject_esm_export(&mut self) {
        let start_pos = self.pos;
        self.pos += 6;
        let cur_pos = self.pos;
        let ch = self.comment_whitespace();
        if self.pos == cur_pos && !is_punctuator(ch) {
            return;
        }
        self.syntax_error(ErrorKind::UnexpectedEsmExport, start_pos);
    }

    // ── Main scan loop ──────────────────────────────────────────────────────

    fn run(&mut self) {
        let len = self.src.len();

        // Shebang: active only at byte 0; everything to the first line
        // terminator is skipped and the next token starts a statement.
        if len >= 2 && self.src[0] == b'#' && self.src[1] == b'!' {
            if len == 2 {
                return;
            }
            self.pos = 2;
            while self.pos < len {
                let ch = self.src[self.pos];
                if is_br(ch) {
                    break;
                }
                self.pos += 1;
            }
            self.last_token_pos = self.pos;
            self.pos += 1;
        }

        while self.pos < len {
            let ch = self.src[self.pos];

            if ch == b' ' || (ch < 14 && ch > 8) {
                self.pos += 1;
                continue;
            }

            if self.open_token_depth == 0 {
                match ch {
                    b'i' => {
                        if self.pos + 6 < len
                            && self.matches_at(self.pos + 1, b"mport")
                            && self.keyword_start(self.pos)
                        {
                            self.reject_esm_import();
                        }
                        self.last_token_pos = self.pos;
                        self.pos += 1;
                        continue;
                    }
                    b'r' => {
                        let start_pos = self.pos;
                        if self.try_parse_require(RequireType::Import)
                            && self.keyword_start(start_pos)
                            && start_pos > 0
                        {
                            self.try_backtrack_add_star_export_binding(start_pos - 1);
                        }
                        self.last_token_pos = self.pos;
                        self.pos += 1;
                        continue;
                    }
                    b'_' => {
                        if self.pos + 23 < len
                            && self.matches_at(self.pos + 1, b"interopRequireWildcard")
                            && (self.keyword_start(self.pos)
                                || (self.pos > 0 && self.src[self.pos - 1] == b'.'))
                        {
                            let start_pos = self.pos;
                            self.pos += 23;
                            if self.at(self.pos) == b'(' {
                                self.pos += 1;
                                self.push_open_token(self.last_token_pos, false, false);
                                if self.try_parse_require(RequireType::Import)
                                    && self.keyword_start(start_pos)
                                    && start_pos > 0
                                {
                                    self.try_backtrack_add_star_export_binding(start_pos - 1);
                                }
                            }
                        } else if self.pos + 8 < len
                            && self.matches_at(self.pos + 1, b"_export")
                            && (self.keyword_start(self.pos)
                                || (self.pos > 0 && self.src[self.pos - 1] == b'.'))
                        {
                            self.pos += 8;
                            if self.pos + 4 < len && self.matches_at(self.pos, b"Star") {
                                self.pos += 4;
                            }
                            if self.at(self.pos) == b'(' {
                                self.push_open_token(self.last_token_pos, false, false);
                                if self.at(self.pos + 1) == b'r' {
                                    self.pos += 1;
                                    self.try_parse_require(RequireType::ExportStar);
                                }
                            }
                        }
                        self.last_token_pos = self.pos;
                        self.pos += 1;
                        continue;
                    }
                    _ => {}
                }
            }

            match ch {
                b'e' => {
                    if self.pos + 6 < len
                        && self.matches_at(self.pos + 1, b"xport")
                        && self.keyword_start(self.pos)
                    {
                        if self.at(self.pos + 6) == b's' {
                            self.try_parse_exports_dot_assign(false);
                        } else if self.open_token_depth == 0 {
                            self.reject_esm_export();
                        }
                    }
                }
                b'c' => {
                    if self.keyword_start(self.pos)
                        && self.matches_at(self.pos + 1, b"lass")
                        && is_br_or_ws(self.at(self.pos + 5))
                    {
                        self.next_brace_is_class = true;
                    }
                }
                b'm' => {
                    if self.pos + 6 < len
                        && self.matches_at(self.pos + 1, b"odule")
                        && self.keyword_start(self.pos)
                    {
                        self.try_parse_module_exports_dot_assign();
                    }
                }
                b'O' => {
                    if self.pos + 6 < len
                        && self.matches_at(self.pos + 1, b"bject")
                        && self.keyword_start(self.pos)
                    {
                        let keys = self.open_token_depth == 0;
                        self.try_parse_object_define_or_keys(keys);
                    }
                }
                b'(' => {
                    self.push_open_token(self.last_token_pos, false, false);
                }
                b')' => {
                    if self.open_token_depth == 0 {
                        self.syntax_error(ErrorKind::UnexpectedParen, self.pos);
                        return;
                    }
                    self.open_token_depth -= 1;
                }
                b'{' => {
                    let is_class = self.next_brace_is_class;
                    self.next_brace_is_class = false;
                    self.push_open_token(self.last_token_pos, true, is_class);
                }
                b'}' => {
                    if self.open_token_depth == 0 {
                        self.syntax_error(ErrorKind::UnexpectedBrace, self.pos);
                        return;
                    }
                    let closing_depth = self.open_token_depth;
                    self.open_token_depth -= 1;
                    if closing_depth == self.template_depth {
                        // This `}` ends a `${…}` substitution; resume the
                        // surrounding template literal.
                        self.template_stack_len -= 1;
                        self.template_depth = self.template_stack[self.template_stack_len];
                        self.template_string();
                    } else if self.template_depth != NO_TEMPLATE
                        && self.open_token_depth < self.template_depth
                    {
                        self.syntax_error(ErrorKind::UnterminatedTemplateString, self.pos);
                        return;
                    }
                }
                b'\'' | b'"' => {
                    self.string_literal(ch);
                }
                b'/' => {
                    let next_ch = self.at(self.pos + 1);
                    if next_ch == b'/' {
                        self.line_comment();
                        self.pos += 1;
                        continue;
                    } else if next_ch == b'*' {
                        self.block_comment();
                        self.pos += 1;
                        continue;
                    } else {
                        let is_start = self.last_token_pos == SENTINEL;
                        let ltp = self.last_token_pos;
                        let last_token = if is_start { 0 } else { self.at(ltp) };
                        let regex = (is_expression_punctuator(last_token)
                            && !(last_token == b'.'
                                && ltp > 0
                                && self.at(ltp - 1).is_ascii_digit())
                            && !(last_token == b'+' && ltp > 0 && self.at(ltp - 1) == b'+')
                            && !(last_token == b'-' && ltp > 0 && self.at(ltp - 1) == b'-'))
                            || (last_token == b')'
                                && self.is_paren_keyword(self.open_token_pos()))
                            || (last_token == b'}'
                                && (self.open_token_pos() == SENTINEL
                                    || self.is_expression_terminator(self.open_token_pos())
                                    || self.open_class_flag()))
                            || (last_token == b'/' && self.last_slash_was_division)
                            || (!is_start && self.is_expression_keyword(ltp))
                            || last_token == 0
                            || is_start;
                        if regex {
                            self.regular_expression();
                            self.last_slash_was_division = false;
                        } else {
                            self.last_slash_was_division = true;
                        }
                    }
                }
                b'`' => {
                    self.template_string();
                }
                _ => {}
            }
            self.last_token_pos = self.pos;
            self.pos += 1;
        }
    }

    /// Final verdict: surface the recorded error, or an end-of-input
    /// imbalance, or the populated analysis.
    fn finish(mut self) -> Result<Analysis<'a>, ParseError> {
        if self.error.is_none() {
            if self.template_depth != NO_TEMPLATE {
                self.error = Some((ErrorKind::UnterminatedTemplateString, None));
            } else if self.open_token_depth != 0 {
                let innermost_is_brace = self
                    .open_brace_stack
                    .get(self.open_token_depth - 1)
                    .copied()
                    .unwrap_or(true);
                let kind = if innermost_is_brace {
                    ErrorKind::UnterminatedBrace
                } else {
                    ErrorKind::UnterminatedParen
                };
                self.error = Some((kind, None));
            }
        }
        match self.error {
            Some((kind, offset)) => Err(ParseError {
                kind,
                location: offset.map(|o| location_of(self.src, o)),
            }),
            None => Ok(Analysis {
                exports: self.exports,
                reexports: self.reexports,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(src: &str) -> Analysis<'_> {
        parse(src.as_bytes()).expect("parse should succeed")
    }

    fn err_kind(src: &str) -> ErrorKind {
        parse(src.as_bytes()).expect_err("parse should fail").kind
    }

    fn export_names<'a>(a: &Analysis<'a>) -> Vec<&'a [u8]> {
        a.exports.iter().map(|e| e.name).collect()
    }

    fn reexport_names<'a>(a: &Analysis<'a>) -> Vec<&'a [u8]> {
        a.reexports.iter().map(|r| r.specifier).collect()
    }

    // ── Character classification ──────────────────────────────────────────────

    #[test]
    fn test_expression_punctuator_set() {
        for ch in b"!%&(*+,-.:;<=>?[^{|~" {
            assert!(is_expression_punctuator(*ch), "{}", *ch as char);
        }
        for ch in b")]}/" {
            assert!(!is_expression_punctuator(*ch), "{}", *ch as char);
        }
    }

    #[test]
    fn test_punctuator_set() {
        for ch in b"!%&()*+,-./:;<=>?[]^{|}~" {
            assert!(is_punctuator(*ch), "{}", *ch as char);
        }
        for ch in b"aZ09_$#@\"'`" {
            assert!(!is_punctuator(*ch), "{}", *ch as char);
        }
    }

    #[test]
    fn test_identifier_classes() {
        assert!(is_identifier_start(b'a'));
        assert!(is_identifier_start(b'_'));
        assert!(is_identifier_start(b'$'));
        assert!(is_identifier_start(0x80));
        assert!(!is_identifier_start(b'1'));
        assert!(is_identifier_char(b'1'));
        assert!(!is_identifier_char(b'-'));
    }

    // ── Comments and whitespace ───────────────────────────────────────────────

    #[test]
    fn test_comments_are_skipped() {
        let a = ok("// exports.fake = 1;\n/* exports.fake2 = 1; */\nexports.real = 1;");
        assert_eq!(export_names(&a), vec![b"real".as_slice()]);
    }

    #[test]
    fn test_comment_between_exports_tokens() {
        let a = ok("module/*c*/./*c*/exports/*c*/./*c*/name = 1;");
        assert_eq!(export_names(&a), vec![b"name".as_slice()]);
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        let a = ok("exports.a = 1; /* exports.b = 2;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    // ── String, template, regex skipping ──────────────────────────────────────

    #[test]
    fn test_exports_inside_string_ignored() {
        let a = ok("var s = 'exports.fake = 1;'; exports.real = 2;");
        assert_eq!(export_names(&a), vec![b"real".as_slice()]);
    }

    #[test]
    fn test_exports_inside_template_ignored() {
        let a = ok("var s = `exports.fake = ${1}`; exports.real = 2;");
        assert_eq!(export_names(&a), vec![b"real".as_slice()]);
    }

    #[test]
    fn test_template_substitution_scans_as_code() {
        let a = ok("var s = `head ${exports.inner = 1} tail`;");
        assert_eq!(export_names(&a), vec![b"inner".as_slice()]);
    }

    #[test]
    fn test_nested_templates() {
        let a = ok("var s = `a ${`b ${c}`} d`; exports.x = 1;");
        assert_eq!(export_names(&a), vec![b"x".as_slice()]);
    }

    #[test]
    fn test_regex_with_brace_in_class() {
        // `/[}]/` must scan as a regex; as division the `}` would be a
        // stray closing brace.
        let a = ok("var re = /[}]/; exports.a = 1;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    #[test]
    fn test_regex_after_paren_keyword() {
        let a = ok("if (x) /y}/.test(z); exports.a = 1;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    #[test]
    fn test_division_not_regex() {
        let a = ok("var x = a / b / c; exports.q = 1;");
        assert_eq!(export_names(&a), vec![b"q".as_slice()]);
    }

    #[test]
    fn test_regex_after_expression_keyword() {
        let a = ok("function f() { return /}/.test(x); }\nexports.a = 1;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    #[test]
    fn test_regex_at_start_of_input() {
        let a = ok("/^{/.test(s); exports.a = 1;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    // ── Unterminated forms ────────────────────────────────────────────────────

    #[test]
    fn test_unterminated_string() {
        assert_eq!(err_kind("\"abc"), ErrorKind::UnterminatedStringLiteral);
        assert_eq!(err_kind("'abc\n'"), ErrorKind::UnterminatedStringLiteral);
    }

    #[test]
    fn test_unterminated_string_location() {
        let e = parse(b"var a = 1;\nvar s = \"abc").unwrap_err();
        let loc = e.location.expect("location");
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 9);
    }

    #[test]
    fn test_unterminated_template() {
        assert_eq!(err_kind("`abc"), ErrorKind::UnterminatedTemplateString);
    }

    #[test]
    fn test_unterminated_template_substitution() {
        assert_eq!(err_kind("`abc ${ x"), ErrorKind::UnterminatedTemplateString);
    }

    #[test]
    fn test_unterminated_regex() {
        assert_eq!(err_kind("var re = /abc"), ErrorKind::UnterminatedRegex);
    }

    #[test]
    fn test_unterminated_regex_class() {
        assert_eq!(
            err_kind("var re = /a[bc/"),
            ErrorKind::UnterminatedRegexCharacterClass
        );
    }

    #[test]
    fn test_unexpected_close_paren() {
        let e = parse(b")").unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnexpectedParen);
        assert_eq!(e.location, Some(SourceLocation { line: 1, column: 1 }));
    }

    #[test]
    fn test_unexpected_close_brace() {
        assert_eq!(err_kind("var x = 1; }"), ErrorKind::UnexpectedBrace);
    }

    #[test]
    fn test_unterminated_paren_at_eof() {
        let e = parse(b"foo(bar").unwrap_err();
        assert_eq!(e.kind, ErrorKind::UnterminatedParen);
        assert_eq!(e.location, None);
    }

    #[test]
    fn test_unterminated_brace_at_eof() {
        assert_eq!(err_kind("if (x) { y();"), ErrorKind::UnterminatedBrace);
    }

    #[test]
    fn test_template_nest_overflow() {
        let src = "`${".repeat(2049);
        assert_eq!(err_kind(&src), ErrorKind::TemplateNestOverflow);
    }

    #[test]
    fn test_deep_but_legal_template_nesting() {
        let mut src = "`${".repeat(100);
        src.push_str("x");
        src.push_str(&"}`".repeat(100));
        src.push(';');
        assert!(parse(src.as_bytes()).is_ok());
    }

    // ── ESM rejection ─────────────────────────────────────────────────────────

    #[test]
    fn test_esm_import_statement() {
        assert_eq!(err_kind("import 'x';"), ErrorKind::UnexpectedEsmImport);
        assert_eq!(
            err_kind("import { foo } from 'bar';"),
            ErrorKind::UnexpectedEsmImport
        );
        assert_eq!(
            err_kind("import * as ns from 'mod';"),
            ErrorKind::UnexpectedEsmImport
        );
    }

    #[test]
    fn test_esm_import_meta() {
        assert_eq!(err_kind("import.meta.url"), ErrorKind::UnexpectedEsmImportMeta);
    }

    #[test]
    fn test_import_meta_continuation_is_fine() {
        // `import.metaData` is a member access on an identifier.
        assert!(parse(b"import.metaData").is_ok());
    }

    #[test]
    fn test_dynamic_import_is_fine() {
        let a = ok("import('x').then(m => m); exports.a = 1;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    #[test]
    fn test_imports_identifier_is_fine() {
        assert!(parse(b"var imports = 1;").is_ok());
        assert!(parse(b"foo.import = 1;").is_ok());
        assert!(parse(b"var importx = 1;").is_ok());
    }

    #[test]
    fn test_esm_export_statement() {
        assert_eq!(err_kind("export const x = 1;"), ErrorKind::UnexpectedEsmExport);
        assert_eq!(err_kind("export { x };"), ErrorKind::UnexpectedEsmExport);
    }

    #[test]
    fn test_export_error_location() {
        let e = parse(b"export { x };").unwrap_err();
        assert_eq!(e.location, Some(SourceLocation { line: 1, column: 1 }));
    }

    #[test]
    fn test_import_inside_braces_is_fine() {
        // Only top-level `import` makes a module ESM.
        assert!(parse(b"if (0) { import.meta }").is_ok());
    }

    // ── exports.X recognizers ─────────────────────────────────────────────────

    #[test]
    fn test_exports_dot_assign() {
        let a = ok("exports.foo = 1; exports.bar = 2;");
        assert_eq!(export_names(&a), vec![b"foo".as_slice(), b"bar".as_slice()]);
        assert!(reexport_names(&a).is_empty());
    }

    #[test]
    fn test_module_exports_dot_assign() {
        let a = ok("module.exports.asdf = 'asdf';");
        assert_eq!(export_names(&a), vec![b"asdf".as_slice()]);
    }

    #[test]
    fn test_exports_bracket_assign() {
        let a = ok("exports['not identifier'] = 1;");
        assert_eq!(export_names(&a), vec![b"not identifier".as_slice()]);
    }

    #[test]
    fn test_exports_read_is_not_an_export() {
        let a = ok("var x = exports.foo;");
        assert!(export_names(&a).is_empty());
    }

    #[test]
    fn test_exports_dedup() {
        let a = ok("exports.a = 1;\nexports.a = 2;");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
        assert_eq!(a.exports[0].line, 1);
    }

    #[test]
    fn test_lone_high_surrogate_suppressed() {
        let a = ok("exports['\\u{D83C}'] = 1; exports['\\u{1F600}'] = 2;");
        assert_eq!(export_names(&a), vec![br"\u{1F600}".as_slice()]);
    }

    // ── Object-literal exports ────────────────────────────────────────────────

    #[test]
    fn test_literal_shorthand() {
        let a = ok("module.exports = { a, b, c };");
        assert_eq!(
            export_names(&a),
            vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]
        );
    }

    #[test]
    fn test_literal_with_values() {
        let a = ok("module.exports = {a: x, b: y};");
        assert_eq!(export_names(&a), vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn test_literal_quoted_keys() {
        let a = ok("module.exports = { 'ab cd': foo };\nexports['@notidentifier'] = 'asdf';\n");
        assert_eq!(
            export_names(&a),
            vec![b"ab cd".as_slice(), b"@notidentifier".as_slice()]
        );
    }

    #[test]
    fn test_literal_spread_require() {
        let a = ok("module.exports = {\n  ...require('dep1'),\n  name,\n  ...require('dep2'),\n};\n");
        assert_eq!(export_names(&a), vec![b"name".as_slice()]);
        assert_eq!(
            reexport_names(&a),
            vec![b"dep1".as_slice(), b"dep2".as_slice()]
        );
    }

    #[test]
    fn test_literal_require_value_adds_reexport() {
        // The require() value commits `a` and the re-export; the cursor
        // then sits on `)` rather than the `,`, so the walk stops there.
        let a = ok("module.exports = {a: require('dep'), b};");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
        assert_eq!(reexport_names(&a), vec![b"dep".as_slice()]);
    }

    #[test]
    fn test_literal_getter_aborts_but_keeps_prior() {
        let a = ok("module.exports = { a: x, get b() { return 1; }, c: y };");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    #[test]
    fn test_literal_default_value_aborts() {
        // The key commits before the `=` is seen; the walk then gives up,
        // so nothing after the malformed property is collected.
        let a = ok("module.exports = { a = 5, b: x };");
        assert_eq!(export_names(&a), vec![b"a".as_slice()]);
    }

    // ── require / re-exports ──────────────────────────────────────────────────

    #[test]
    fn test_module_exports_require() {
        let a = ok("module.exports = require('./dep');");
        assert!(export_names(&a).is_empty());
        assert_eq!(reexport_names(&a), vec![b"./dep".as_slice()]);
    }

    #[test]
    fn test_reexports_not_deduplicated() {
        let a = ok("__exportStar(require('a')); __exportStar(require('a'));");
        assert_eq!(reexport_names(&a), vec![b"a".as_slice(), b"a".as_slice()]);
    }

    #[test]
    fn test_module_exports_reset_rule() {
        let a = ok("__exportStar(require('a'));\nmodule.exports = require('b');");
        assert_eq!(reexport_names(&a), vec![b"b".as_slice()]);
    }

    #[test]
    fn test_export_star_and_double_underscore_export() {
        let a = ok("\"use strict\";\n__export(require(\"external1\"));\n__exportStar(require(\"external2\"));\n");
        assert_eq!(
            reexport_names(&a),
            vec![b"external1".as_slice(), b"external2".as_slice()]
        );
    }

    #[test]
    fn test_dotted_export_star() {
        let a = ok("tslib.__exportStar(require('dep'), exports);");
        assert_eq!(reexport_names(&a), vec![b"dep".as_slice()]);
    }

    #[test]
    fn test_require_template_argument_is_not_reexport() {
        let a = ok("module.exports = require(`./dep`);");
        assert!(reexport_names(&a).is_empty());
    }

    #[test]
    fn test_esbuild_annotation_shape() {
        let a = ok("0 && (module.exports = {a, b, c}) && __exportStar(require('fs'));");
        assert_eq!(
            export_names(&a),
            vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]
        );
        assert_eq!(reexport_names(&a), vec![b"fs".as_slice()]);
    }

    // ── Object.defineProperty ─────────────────────────────────────────────────

    #[test]
    fn test_define_property_value() {
        let a = ok("Object.defineProperty(module.exports, 'thing', { value: true });\nObject.defineProperty(exports, 'other', { enumerable: true, value: true });");
        assert_eq!(
            export_names(&a),
            vec![b"thing".as_slice(), b"other".as_slice()]
        );
    }

    #[test]
    fn test_define_property_getters() {
        let a = ok("Object.defineProperty(exports,'a',{enumerable:true,get:function(){return q.p;}}); Object.defineProperty(exports,'b',{enumerable:false,get:function(){return q.p;}}); Object.defineProperty(exports,\"c\",{get:function(){return q['p'];}});");
        assert_eq!(export_names(&a), vec![b"a".as_slice(), b"c".as_slice()]);
    }

    #[test]
    fn test_define_property_shorthand_getter() {
        let a = ok("Object.defineProperty(exports, 'x', { get() { return inner; } });");
        assert_eq!(export_names(&a), vec![b"x".as_slice()]);
    }

    #[test]
    fn test_define_property_named_getter_fn() {
        let a = ok("Object.defineProperty(exports, 'y', { get: function y() { return impl.y; } });");
        assert_eq!(export_names(&a), vec![b"y".as_slice()]);
    }

    #[test]
    fn test_define_property_complex_getter_rejected() {
        let a = ok("Object.defineProperty(exports, 'z', { get: function () { return a + b; } });");
        assert!(export_names(&a).is_empty());
    }

    // ── Transpiler re-export loops ────────────────────────────────────────────

    const BABEL_LOOP: &str = r#""use strict";
var _m = require("./m");
Object.keys(_m).forEach(function (key) {
  if (key === "default" || key === "__esModule") return;
  exports[key] = _m[key];
});
"#;

    #[test]
    fn test_babel_star_reexport_loop() {
        let a = ok(BABEL_LOOP);
        assert_eq!(reexport_names(&a), vec![b"./m".as_slice()]);
        // Attribution is the `require` specifier literal, on line 2.
        assert_eq!(a.reexports[0].line, 2);
    }

    const BABEL_GETTER_LOOP: &str = r#""use strict";
var _dep = require("dep");
Object.keys(_dep).forEach(function (key) {
  if (key === "default" || key === "__esModule") return;
  if (key in exports && exports[key] === _dep[key]) return;
  Object.defineProperty(exports, key, {
    enumerable: true,
    get: function () {
      return _dep[key];
    }
  });
});
"#;

    #[test]
    fn test_babel_getter_reexport_loop() {
        let a = ok(BABEL_GETTER_LOOP);
        assert_eq!(reexport_names(&a), vec![b"dep".as_slice()]);
    }

    const BABEL_EXPORT_NAMES_LOOP: &str = r#"var _m = require("m");
Object.keys(_m).forEach(function (key) {
  if (key === "default" || key === "__esModule") return;
  if (Object.prototype.hasOwnProperty.call(_exportNames, key)) return;
  exports[key] = _m[key];
});
"#;

    #[test]
    fn test_babel_export_names_guard_loop() {
        let a = ok(BABEL_EXPORT_NAMES_LOOP);
        assert_eq!(reexport_names(&a), vec![b"m".as_slice()]);
    }

    const TS_NOT_DEFAULT_LOOP: &str = r#"var dep = require("./lib");
Object.keys(dep).forEach(function (k) {
  if (k !== "default" && !exports.hasOwnProperty(k)) exports[k] = dep[k];
});
"#;

    #[test]
    fn test_not_default_guard_loop() {
        let a = ok(TS_NOT_DEFAULT_LOOP);
        assert_eq!(reexport_names(&a), vec![b"./lib".as_slice()]);
    }

    #[test]
    fn test_loop_without_matching_binding() {
        // `other` was never bound by a require declaration, so no
        // re-export can be attributed.
        let src = r#"var _m = require("m");
Object.keys(other).forEach(function (key) {
  if (key === "default" || key === "__esModule") return;
  exports[key] = other[key];
});
"#;
        let a = ok(src);
        assert!(reexport_names(&a).is_empty());
    }

    #[test]
    fn test_interop_require_wildcard_binding() {
        let src = r#"var ns = _interopRequireWildcard(require("./wild"));
Object.keys(ns).forEach(function (key) {
  if (key === "default" || key === "__esModule") return;
  exports[key] = ns[key];
});
"#;
        let a = ok(src);
        assert_eq!(reexport_names(&a), vec![b"./wild".as_slice()]);
    }

    #[test]
    fn test_let_and_const_bindings() {
        let src = "const a = require('x');\nlet b = require('y');\nObject.keys(a).forEach(function (k) {\n  if (k === \"default\" || k === \"__esModule\") return;\n  exports[k] = a[k];\n});\n";
        let a = ok(src);
        assert_eq!(reexport_names(&a), vec![b"x".as_slice()]);
    }

    // ── Shebang ───────────────────────────────────────────────────────────────

    #[test]
    fn test_shebang_skipped() {
        let a = ok("#! (  {\n      exports.asdf = 'asdf';\n    ");
        assert_eq!(export_names(&a), vec![b"asdf".as_slice()]);
    }

    #[test]
    fn test_shebang_only() {
        let a = ok("#!");
        assert!(export_names(&a).is_empty());
        let a = ok("#!/usr/bin/env node");
        assert!(export_names(&a).is_empty());
    }

    // ── Oddballs ──────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_and_whitespace_inputs() {
        assert!(parse(b"").is_ok());
        assert!(parse(b"   \n\t\r\n   ").is_ok());
    }

    #[test]
    fn test_non_utf8_input_accepted() {
        let a = parse(&[0xFF, 0xFE, b';', 0x00]).expect("arbitrary bytes are fine");
        assert!(a.exports.is_empty());
    }

    #[test]
    fn test_exports_in_dead_branches_still_reported() {
        let a = ok("if (false) { exports.a = 1; } else { exports.b = 2; }");
        assert_eq!(export_names(&a), vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn test_class_body_then_regex() {
        let a = ok("class Q { } /}/.test(x); exports.ok = 1;");
        assert_eq!(export_names(&a), vec![b"ok".as_slice()]);
    }

    #[test]
    fn test_exports_word_alone_is_harmless() {
        assert!(parse(b"exports;").is_ok());
        assert!(parse(b"exportsFoo.bar = 1;").is_ok());
    }
}
