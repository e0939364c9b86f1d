#![no_main]

use libfuzzer_sys::fuzz_target;
use motionseg::segmentation::{segment_series, SegmentationConfig};
use motionseg::series::Series;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Whatever parses must segment without panicking
        if let Ok(series) = Series::from_csv_str(input) {
            let _ = segment_series(&series, &SegmentationConfig::default());
        }
    }
});
