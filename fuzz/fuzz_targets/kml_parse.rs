//! Fuzz target for KML parsing.

#![no_main]

use std::path::Path;

use aufmass::ingest::io_kml::from_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_slice(data, Path::new("<fuzz>"));
});
