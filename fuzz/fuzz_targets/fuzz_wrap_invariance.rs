#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::{ErrorKind, parse_commonjs};

// Wrapping a module in pure whitespace and comments must not change what it
// exports.  Shebang inputs are skipped (a shebang is only a shebang at byte
// 0, so any prefix legitimately changes its meaning).
fuzz_target!(|data: &[u8]| {
    if data.first() == Some(&b'#') {
        return;
    }

    let Ok(base) = parse_commonjs(data) else {
        return;
    };

    let mut wrapped = Vec::with_capacity(data.len() + 32);
    wrapped.extend_from_slice(b"\t \n/* wrap */ ");
    wrapped.extend_from_slice(data);
    wrapped.extend_from_slice(b"\n// wrap\n\t ");

    let rewrapped = match parse_commonjs(&wrapped) {
        Ok(analysis) => analysis,
        Err(err) => {
            // A bareword `import`/`export` at the very end of the input is
            // only examined once a byte follows it; the wrap suffix is that
            // byte.  Any other introduced error is a bug.
            assert!(
                matches!(
                    err.kind,
                    ErrorKind::UnexpectedEsmImport | ErrorKind::UnexpectedEsmExport
                ),
                "wrapping introduced {:?}",
                err.kind
            );
            return;
        }
    };

    let base_exports: Vec<&[u8]> = base.exports.iter().map(|e| e.name).collect();
    let wrapped_exports: Vec<&[u8]> = rewrapped.exports.iter().map(|e| e.name).collect();
    assert_eq!(base_exports, wrapped_exports);

    let base_reexports: Vec<&[u8]> = base.reexports.iter().map(|r| r.specifier).collect();
    let wrapped_reexports: Vec<&[u8]> =
        rewrapped.reexports.iter().map(|r| r.specifier).collect();
    assert_eq!(base_reexports, wrapped_reexports);
});
