//! Fuzz target for merging two parsed datasets.
//!
//! The input is split at the first NUL byte into two COCO documents. Any
//! pair that parses must either merge or fail with an error.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_merge

#![no_main]

use cocokit::dataset::io_coco_json::from_coco_slice;
use cocokit::merge::merge;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Some(split) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let (Ok(first), Ok(second)) = (
        from_coco_slice(&data[..split]),
        from_coco_slice(&data[split + 1..]),
    ) else {
        return;
    };

    if let Ok(merged) = merge(&first, &second) {
        assert_eq!(
            merged.images.len(),
            first.images.len() + second.images.len()
        );
        assert_eq!(
            merged.annotations.len(),
            first.annotations.len() + second.annotations.len()
        );
    }
});
