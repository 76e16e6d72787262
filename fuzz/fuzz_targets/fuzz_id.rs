//! Fuzz target for logical id parsing
//!
//! Tests that arbitrary id strings never cause panics and always round-trip
//! through Display.
//! Run with: cargo +nightly fuzz run fuzz_id -- -max_total_time=300

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Limit input size to prevent OOM
    if data.len() > 100_000 {
        return;
    }

    // Parsing is total - should never panic
    let id = focal::LogicalId::from(data);

    // Display must round-trip whatever came in
    assert_eq!(id.to_string(), data);
});
