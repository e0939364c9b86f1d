#![no_main]

use libfuzzer_sys::fuzz_target;
use motionseg::segmentation::Breakpoints;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(breakpoints) = Breakpoints::from_json(input) {
            assert_eq!(breakpoints.as_slice().first(), Some(&0));
            assert!(breakpoints.segments().count() + 1 == breakpoints.len());
        }
    }
});
