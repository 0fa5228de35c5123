// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for stored-record decoding

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Decoding arbitrary store values must not panic.
        if let Ok(record) = kvbridge_core::decode(s, None) {
            // Anything that decodes re-encodes and decodes to the same record.
            let again = kvbridge_core::encode(&record).expect("decoded record re-encodes");
            assert_eq!(kvbridge_core::decode(&again, None).ok(), Some(record));
        }
    }
});
