//! `rotor_ffi` — C-ABI surface for the rotor CommonJS export lexer.
//!
//! This crate exposes a stable C API (`extern "C"`, `#[unsafe(no_mangle)]`)
//! so that bundlers and loaders written in other languages can link against
//! rotor without depending on Rust tooling.
//!
//! # Design
//! One parse produces one opaque [`RotorAnalysis`] handle.  Memory is owned
//! by the rotor side: callers obtain handles from
//! [`rotor_parse_commonjs`] and must release them with [`rotor_free`].
//! Export-name bytes returned through [`RotorString`] alias the *caller's*
//! input buffer and are valid only while both the handle and that buffer
//! are alive.
//!
//! A process-wide last-error slot mirrors the per-handle error state for
//! callers that only see the validity bit.  It is written by every parse
//! and therefore races when parses run concurrently; the per-handle
//! accessors [`rotor_get_error_code`] and [`rotor_get_error_loc`] are the
//! primary interface.

use std::ffi::{c_char, c_int};
use std::sync::atomic::{AtomicI32, Ordering};

use rotor_core::{Analysis, ParseError, parse_commonjs};

/// Version string of the underlying lexer, NUL-terminated for C.
const VERSION_CSTR: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Process-wide error code of the most recent parse; `-1` means success.
static LAST_ERROR: AtomicI32 = AtomicI32::new(-1);

/// An opaque handle to one parse result.
///
/// Created by [`rotor_parse_commonjs`], released by [`rotor_free`].  The
/// analysis inside borrows the caller's input buffer for the lifetime of
/// the handle; the `'static` here is a promise the *caller* makes by
/// keeping the buffer alive (see [`rotor_parse_commonjs`]).
pub struct RotorAnalysis {
    result: Option<Analysis<'static>>,
    error: Option<ParseError>,
}

// SAFETY: the analysis is immutable after construction and only holds
// shared references into the caller's buffer; moving or sharing the handle
// across threads adds no new aliasing.
unsafe impl Send for RotorAnalysis {}
unsafe impl Sync for RotorAnalysis {}

/// Non-owning byte range.  `data` is NOT NUL-terminated; always use
/// `length`.  `{NULL, 0}` signals an error or out-of-bounds access.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RotorString {
    pub data: *const c_char,
    pub length: usize,
}

impl RotorString {
    const fn null() -> Self {
        Self {
            data: std::ptr::null(),
            length: 0,
        }
    }
}

/// 1-based source location of a parse error; `{0, 0}` means unavailable.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotorErrorLoc {
    pub line: u32,
    pub column: u32,
}

impl RotorErrorLoc {
    const fn zero() -> Self {
        Self { line: 0, column: 0 }
    }
}

/// Library version split into components.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RotorVersionComponents {
    pub major: c_int,
    pub minor: c_int,
    pub revision: c_int,
}

fn error_loc_of(error: Option<&ParseError>) -> RotorErrorLoc {
    match error.and_then(|e| e.location) {
        Some(loc) => RotorErrorLoc {
            line: loc.line,
            column: loc.column,
        },
        None => RotorErrorLoc::zero(),
    }
}

/// Parse CommonJS source and return a handle to the analysis.
///
/// A NULL `input` is treated as an empty module.  The returned handle is
/// never NULL (allocation failure aborts the process) and must be released
/// with [`rotor_free`].  Use [`rotor_is_valid`] to learn whether the parse
/// succeeded; on failure the handle carries the error for
/// [`rotor_get_error_code`] / [`rotor_get_error_loc`].
///
/// When `out_err` is non-NULL it is always written: zeroed on success or
/// when no location is attributable, the 1-based error location otherwise.
///
/// # Safety
/// - `input` must either be NULL or be valid for reads of `length` bytes.
/// - The input buffer must stay alive and unmodified for as long as byte
///   ranges obtained from this handle are in use.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_parse_commonjs(
    input: *const c_char,
    length: usize,
    out_err: *mut RotorErrorLoc,
) -> *mut RotorAnalysis {
    let source: &'static [u8] = if input.is_null() {
        &[]
    } else {
        // SAFETY: caller guarantees `input` is readable for `length` bytes
        // and outlives the handle; the 'static is confined to the handle.
        unsafe { std::slice::from_raw_parts(input.cast::<u8>(), length) }
    };

    let (result, error) = match parse_commonjs(source) {
        Ok(analysis) => (Some(analysis), None),
        Err(err) => (None, Some(err)),
    };

    LAST_ERROR.store(
        error.map_or(-1, |e| e.kind.code()),
        Ordering::Relaxed,
    );
    if !out_err.is_null() {
        // SAFETY: caller guarantees `out_err` is writable when non-NULL.
        unsafe { out_err.write(error_loc_of(error.as_ref())) };
    }

    Box::into_raw(Box::new(RotorAnalysis { result, error }))
}

/// `true` when the parse behind `handle` succeeded.  NULL returns `false`.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_is_valid(handle: *const RotorAnalysis) -> bool {
    if handle.is_null() {
        return false;
    }
    // SAFETY: caller guarantees `handle` is valid.
    unsafe { (*handle).result.is_some() }
}

/// Release a handle.  NULL is a no-op.
///
/// # Safety
/// `handle` must be NULL or a pointer from [`rotor_parse_commonjs`] that
/// has not already been freed; it must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_free(handle: *mut RotorAnalysis) {
    if !handle.is_null() {
        // SAFETY: pointer was created by `Box::into_raw` in
        // `rotor_parse_commonjs`.
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Number of named exports.  0 for NULL or invalid handles.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_exports_count(handle: *const RotorAnalysis) -> usize {
    if handle.is_null() {
        return 0;
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => analysis.exports.len(),
        None => 0,
    }
}

/// Number of re-export specifiers.  0 for NULL or invalid handles.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_reexports_count(handle: *const RotorAnalysis) -> usize {
    if handle.is_null() {
        return 0;
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => analysis.reexports.len(),
        None => 0,
    }
}

/// Name of the export at `index`.  `{NULL, 0}` on NULL/invalid handles or
/// out-of-bounds indices.  The bytes alias the caller's input buffer.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`],
/// and the input buffer must still be alive when the bytes are read.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_export_name(
    handle: *const RotorAnalysis,
    index: usize,
) -> RotorString {
    if handle.is_null() {
        return RotorString::null();
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => match analysis.exports.get(index) {
            Some(export) => RotorString {
                data: export.name.as_ptr().cast::<c_char>(),
                length: export.name.len(),
            },
            None => RotorString::null(),
        },
        None => RotorString::null(),
    }
}

/// 1-based line of the export at `index`; 0 on error.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_export_line(
    handle: *const RotorAnalysis,
    index: usize,
) -> u32 {
    if handle.is_null() {
        return 0;
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => analysis.exports.get(index).map_or(0, |e| e.line),
        None => 0,
    }
}

/// Specifier of the re-export at `index`.  `{NULL, 0}` on NULL/invalid
/// handles or out-of-bounds indices.  The bytes alias the caller's input
/// buffer.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`],
/// and the input buffer must still be alive when the bytes are read.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_reexport_name(
    handle: *const RotorAnalysis,
    index: usize,
) -> RotorString {
    if handle.is_null() {
        return RotorString::null();
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => match analysis.reexports.get(index) {
            Some(reexport) => RotorString {
                data: reexport.specifier.as_ptr().cast::<c_char>(),
                length: reexport.specifier.len(),
            },
            None => RotorString::null(),
        },
        None => RotorString::null(),
    }
}

/// 1-based line of the re-export at `index`; 0 on error.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_reexport_line(
    handle: *const RotorAnalysis,
    index: usize,
) -> u32 {
    if handle.is_null() {
        return 0;
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).result } {
        Some(analysis) => analysis.reexports.get(index).map_or(0, |r| r.line),
        None => 0,
    }
}

/// Stable error code of the parse behind `handle`; `-1` when the parse
/// succeeded or `handle` is NULL.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_error_code(handle: *const RotorAnalysis) -> c_int {
    if handle.is_null() {
        return -1;
    }
    // SAFETY: caller guarantees `handle` is valid.
    match unsafe { &(*handle).error } {
        Some(err) => err.kind.code(),
        None => -1,
    }
}

/// Error location of the parse behind `handle`; zeroed when the parse
/// succeeded, the location is unavailable, or `handle` is NULL.
///
/// # Safety
/// `handle` must be NULL or a live pointer from [`rotor_parse_commonjs`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rotor_get_error_loc(handle: *const RotorAnalysis) -> RotorErrorLoc {
    if handle.is_null() {
        return RotorErrorLoc::zero();
    }
    // SAFETY: caller guarantees `handle` is valid.
    unsafe { error_loc_of((*handle).error.as_ref()) }
}

/// Error code of the most recent [`rotor_parse_commonjs`] call in this
/// process, `-1` if it succeeded.  This is global state and races when
/// parses run concurrently; prefer [`rotor_get_error_code`].
#[unsafe(no_mangle)]
pub extern "C" fn rotor_get_last_error() -> c_int {
    LAST_ERROR.load(Ordering::Relaxed)
}

/// NUL-terminated library version string (e.g. `"1.0.1"`).  Never NULL;
/// valid for the lifetime of the process.
#[unsafe(no_mangle)]
pub extern "C" fn rotor_get_version() -> *const c_char {
    VERSION_CSTR.as_ptr().cast::<c_char>()
}

/// Library version as individual components.
#[unsafe(no_mangle)]
pub extern "C" fn rotor_get_version_components() -> RotorVersionComponents {
    RotorVersionComponents {
        major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        revision: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Error codes as a C caller would name them.
    const ERR_UNEXPECTED_ESM_IMPORT_META: c_int = 9;
    const ERR_UNEXPECTED_ESM_IMPORT: c_int = 10;
    const ERR_UNEXPECTED_ESM_EXPORT: c_int = 11;

    fn parse(source: &str) -> *mut RotorAnalysis {
        unsafe { rotor_parse_commonjs(source.as_ptr().cast(), source.len(), std::ptr::null_mut()) }
    }

    fn string_eq(s: RotorString, expected: &str) -> bool {
        if s.length != expected.len() {
            return false;
        }
        if s.length == 0 {
            return true;
        }
        let bytes = unsafe { std::slice::from_raw_parts(s.data.cast::<u8>(), s.length) };
        bytes == expected.as_bytes()
    }

    #[test]
    fn test_version_string() {
        let version = rotor_get_version();
        assert!(!version.is_null());
        let cstr = unsafe { std::ffi::CStr::from_ptr(version) };
        assert!(!cstr.to_bytes().is_empty());
        assert!(cstr.to_str().unwrap().contains('.'));
    }

    #[test]
    fn test_version_components() {
        let vc = rotor_get_version_components();
        assert!(vc.major >= 1);
        assert!(vc.minor >= 0);
        assert!(vc.revision >= 0);
    }

    #[test]
    fn test_basic_exports() {
        let source = "exports.foo = 1; exports.bar = 2;";
        let result = parse(source);
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(rotor_get_exports_count(result), 2);
            assert_eq!(rotor_get_reexports_count(result), 0);
            assert!(string_eq(rotor_get_export_name(result, 0), "foo"));
            assert!(string_eq(rotor_get_export_name(result, 1), "bar"));
            rotor_free(result);
        }
    }

    #[test]
    fn test_export_names_alias_the_input_buffer() {
        let source = "exports.aliased = 1;";
        let result = parse(source);
        unsafe {
            let s = rotor_get_export_name(result, 0);
            let base = source.as_ptr() as usize;
            let p = s.data as usize;
            assert!(p >= base && p + s.length <= base + source.len());
            rotor_free(result);
        }
    }

    #[test]
    fn test_reexport() {
        let source = "module.exports = require('./dep');";
        let result = parse(source);
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(rotor_get_exports_count(result), 0);
            assert_eq!(rotor_get_reexports_count(result), 1);
            assert!(string_eq(rotor_get_reexport_name(result, 0), "./dep"));
            rotor_free(result);
        }
    }

    #[test]
    fn test_esm_import_error() {
        let result = parse("import 'x';");
        unsafe {
            assert!(!rotor_is_valid(result));
            assert_eq!(rotor_get_last_error(), ERR_UNEXPECTED_ESM_IMPORT);
            assert_eq!(rotor_get_error_code(result), ERR_UNEXPECTED_ESM_IMPORT);
            rotor_free(result);
        }
    }

    #[test]
    fn test_esm_export_error() {
        let result = parse("export { x };");
        unsafe {
            assert!(!rotor_is_valid(result));
            assert_eq!(rotor_get_error_code(result), ERR_UNEXPECTED_ESM_EXPORT);
            rotor_free(result);
        }
    }

    #[test]
    fn test_import_meta_error() {
        let result = parse("import.meta.url");
        unsafe {
            assert!(!rotor_is_valid(result));
            assert_eq!(rotor_get_error_code(result), ERR_UNEXPECTED_ESM_IMPORT_META);
            rotor_free(result);
        }
    }

    #[test]
    fn test_no_error_after_success() {
        let result = parse("exports.x = 1;");
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(rotor_get_last_error(), -1);
            assert_eq!(rotor_get_error_code(result), -1);
            assert_eq!(rotor_get_error_loc(result), RotorErrorLoc::zero());
            rotor_free(result);
        }
    }

    #[test]
    fn test_out_err_is_written() {
        let source = "var a = 1;\nvar s = \"abc";
        let mut loc = RotorErrorLoc { line: 99, column: 99 };
        let result = unsafe {
            rotor_parse_commonjs(source.as_ptr().cast(), source.len(), &mut loc)
        };
        unsafe {
            assert!(!rotor_is_valid(result));
            assert_eq!(loc, RotorErrorLoc { line: 2, column: 9 });
            assert_eq!(rotor_get_error_loc(result), loc);
            rotor_free(result);
        }

        // Success zeroes it.
        let source = "exports.a = 1;";
        let mut loc = RotorErrorLoc { line: 99, column: 99 };
        let result = unsafe {
            rotor_parse_commonjs(source.as_ptr().cast(), source.len(), &mut loc)
        };
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(loc, RotorErrorLoc::zero());
            rotor_free(result);
        }
    }

    #[test]
    fn test_empty_input() {
        let result = unsafe { rotor_parse_commonjs(c"".as_ptr(), 0, std::ptr::null_mut()) };
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(rotor_get_exports_count(result), 0);
            assert_eq!(rotor_get_reexports_count(result), 0);
            rotor_free(result);
        }
    }

    #[test]
    fn test_null_input() {
        let result =
            unsafe { rotor_parse_commonjs(std::ptr::null(), 0, std::ptr::null_mut()) };
        unsafe {
            assert!(rotor_is_valid(result));
            assert_eq!(rotor_get_exports_count(result), 0);
            rotor_free(result);
        }
    }

    #[test]
    fn test_null_handle_safety() {
        unsafe {
            assert!(!rotor_is_valid(std::ptr::null()));
            assert_eq!(rotor_get_exports_count(std::ptr::null()), 0);
            assert_eq!(rotor_get_reexports_count(std::ptr::null()), 0);

            let s = rotor_get_export_name(std::ptr::null(), 0);
            assert!(s.data.is_null());
            assert_eq!(s.length, 0);
            assert_eq!(rotor_get_export_line(std::ptr::null(), 0), 0);

            let s = rotor_get_reexport_name(std::ptr::null(), 0);
            assert!(s.data.is_null());
            assert_eq!(s.length, 0);
            assert_eq!(rotor_get_reexport_line(std::ptr::null(), 0), 0);

            assert_eq!(rotor_get_error_code(std::ptr::null()), -1);
            assert_eq!(rotor_get_error_loc(std::ptr::null()), RotorErrorLoc::zero());

            rotor_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_out_of_bounds_access() {
        let result = parse("exports.x = 1;");
        unsafe {
            assert_eq!(rotor_get_exports_count(result), 1);
            assert!(string_eq(rotor_get_export_name(result, 0), "x"));
            assert_ne!(rotor_get_export_line(result, 0), 0);

            let s = rotor_get_export_name(result, 1);
            assert!(s.data.is_null());
            assert_eq!(rotor_get_export_line(result, 1), 0);

            let s = rotor_get_export_name(result, 999);
            assert!(s.data.is_null());

            let s = rotor_get_reexport_name(result, 0);
            assert!(s.data.is_null());
            assert_eq!(rotor_get_reexport_line(result, 0), 0);

            rotor_free(result);
        }
    }

    #[test]
    fn test_invalid_result_accessors() {
        let result = parse("import 'x';");
        unsafe {
            assert!(!rotor_is_valid(result));
            assert_eq!(rotor_get_exports_count(result), 0);
            assert_eq!(rotor_get_reexports_count(result), 0);
            assert!(rotor_get_export_name(result, 0).data.is_null());
            assert_eq!(rotor_get_export_line(result, 0), 0);
            assert!(rotor_get_reexport_name(result, 0).data.is_null());
            assert_eq!(rotor_get_reexport_line(result, 0), 0);
            rotor_free(result);
        }
    }

    #[test]
    fn test_line_numbers() {
        let source = "// line 1\nexports.a = 1;\n\nexports.b = 2;\n";
        let result = parse(source);
        unsafe {
            assert_eq!(rotor_get_exports_count(result), 2);
            assert!(string_eq(rotor_get_export_name(result, 0), "a"));
            assert_eq!(rotor_get_export_line(result, 0), 2);
            assert!(string_eq(rotor_get_export_name(result, 1), "b"));
            assert_eq!(rotor_get_export_line(result, 1), 4);
            rotor_free(result);
        }
    }

    #[test]
    fn test_reexport_line_numbers() {
        let source = "// line 1\nmodule.exports = require('dep1');\n";
        let result = parse(source);
        unsafe {
            assert_eq!(rotor_get_reexports_count(result), 1);
            assert!(string_eq(rotor_get_reexport_name(result, 0), "dep1"));
            assert_eq!(rotor_get_reexport_line(result, 0), 2);
            rotor_free(result);
        }
    }

    #[test]
    fn test_bracket_notation_exports() {
        let result = parse("exports['not identifier'] = 1;");
        unsafe {
            assert_eq!(rotor_get_exports_count(result), 1);
            assert!(string_eq(
                rotor_get_export_name(result, 0),
                "not identifier"
            ));
            rotor_free(result);
        }
    }

    #[test]
    fn test_multiple_independent_parses() {
        let source1 = "exports.x = 1;";
        let source2 = "exports.y = 1; exports.z = 2;";
        let r1 = parse(source1);
        let r2 = parse(source2);
        unsafe {
            assert_ne!(r1, r2);
            assert_eq!(rotor_get_exports_count(r1), 1);
            assert_eq!(rotor_get_exports_count(r2), 2);
            assert!(string_eq(rotor_get_export_name(r1, 0), "x"));
            assert!(string_eq(rotor_get_export_name(r2, 0), "y"));
            assert!(string_eq(rotor_get_export_name(r2, 1), "z"));
            rotor_free(r1);
            rotor_free(r2);
        }
    }

    #[test]
    fn test_handle_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<RotorAnalysis>();
        assert_sync::<RotorAnalysis>();
    }
}
