#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::parse_commonjs;

// Feed arbitrary bytes to the scanner and verify it never panics and that a
// successful analysis upholds its output invariants:
//   - every emitted slice aliases the input buffer,
//   - export names are unique,
//   - line numbers are 1-based and match the newline count before the slice.
fuzz_target!(|data: &[u8]| {
    let Ok(analysis) = parse_commonjs(data) else {
        return;
    };

    let base = data.as_ptr() as usize;
    let line_of = |slice: &[u8]| {
        let offset = slice.as_ptr() as usize - base;
        let mut line = 1u32;
        let mut i = 0usize;
        while i < offset {
            match data[i] {
                b'\n' => line += 1,
                b'\r' => {
                    line += 1;
                    if data.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        line
    };

    for (i, export) in analysis.exports.iter().enumerate() {
        let p = export.name.as_ptr() as usize;
        assert!(p >= base && p + export.name.len() <= base + data.len());
        assert_eq!(export.line, line_of(export.name));
        for other in &analysis.exports[..i] {
            assert_ne!(export.name, other.name, "duplicate export emitted");
        }
    }
    for reexport in &analysis.reexports {
        let p = reexport.specifier.as_ptr() as usize;
        assert!(p >= base && p + reexport.specifier.len() <= base + data.len());
        assert_eq!(reexport.line, line_of(reexport.specifier));
    }
});
