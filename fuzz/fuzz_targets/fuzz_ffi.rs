#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_ffi::{
    rotor_free, rotor_get_error_code, rotor_get_error_loc, rotor_get_export_line,
    rotor_get_export_name, rotor_get_exports_count, rotor_get_last_error,
    rotor_get_reexport_line, rotor_get_reexport_name, rotor_get_reexports_count, rotor_is_valid,
    rotor_parse_commonjs, RotorErrorLoc,
};

// Drive the C ABI across its full handle lifecycle on arbitrary input,
// including out-of-bounds accessor indices, and check the accessor
// contracts hold on both valid and invalid handles.
fuzz_target!(|data: &[u8]| {
    let mut loc = RotorErrorLoc { line: 1, column: 1 };
    let handle = unsafe { rotor_parse_commonjs(data.as_ptr().cast(), data.len(), &mut loc) };
    assert!(!handle.is_null());

    unsafe {
        let valid = rotor_is_valid(handle);
        let exports = rotor_get_exports_count(handle);
        let reexports = rotor_get_reexports_count(handle);

        if valid {
            assert_eq!(rotor_get_error_code(handle), -1);
            assert_eq!(rotor_get_last_error(), -1);
            assert_eq!(loc.line, 0);
            assert_eq!(loc.column, 0);
        } else {
            assert_eq!(exports, 0);
            assert_eq!(reexports, 0);
            assert!(rotor_get_error_code(handle) >= 0);
            let hloc = rotor_get_error_loc(handle);
            assert_eq!(hloc.line, loc.line);
            assert_eq!(hloc.column, loc.column);
        }

        // In-bounds and out-of-bounds accessor sweeps.
        for i in 0..exports.saturating_add(2) {
            let name = rotor_get_export_name(handle, i);
            let line = rotor_get_export_line(handle, i);
            if i < exports {
                assert!(!name.data.is_null());
                assert!(line >= 1);
            } else {
                assert!(name.data.is_null());
                assert_eq!(name.length, 0);
                assert_eq!(line, 0);
            }
        }
        for i in 0..reexports.saturating_add(2) {
            let spec = rotor_get_reexport_name(handle, i);
            let line = rotor_get_reexport_line(handle, i);
            if i < reexports {
                assert!(!spec.data.is_null());
                assert!(line >= 1);
            } else {
                assert!(spec.data.is_null());
                assert_eq!(line, 0);
            }
        }

        rotor_free(handle);
    }
});
