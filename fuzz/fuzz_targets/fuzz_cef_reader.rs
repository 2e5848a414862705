#![no_main]

use cefmerge::cef::CefReader;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must produce records or errors, never a panic
    let mut reader = CefReader::new(Cursor::new(data), "fuzz.cef");

    // Malformed compounds are recoverable, so keep reading past them
    for _ in 0..1000 {
        match reader.next_compound() {
            Ok(Some(record)) => {
                assert!(!record.peaks.is_empty());
                assert!(record.retention_time >= 0.0);
            }
            Ok(None) => break,
            Err(e) if e.is_fatal() => break,
            Err(_) => {}
        }
    }
});
