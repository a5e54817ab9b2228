//! Fuzz target for delimited survey-text parsing.
//!
//! Feeds arbitrary byte sequences to the delimiter/header sniffing path,
//! checking for panics, crashes, or hangs.

#![no_main]

use std::path::Path;

use aufmass::ingest::io_delimited::from_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_slice(data, Path::new("<fuzz>"));
});
