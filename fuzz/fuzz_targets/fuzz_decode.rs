#![no_main]

use libfuzzer_sys::fuzz_target;
use sfs_protocol::core::{decode, Buffer};

fuzz_target!(|data: &[u8]| {
    // Value decoding must fail cleanly on any input
    let mut buf = Buffer::new(data);
    if let Ok(field) = decode(&mut buf) {
        // Duplicate keys collapse on decode, so only check that it encodes
        let _ = field.to_bytes();
    }
});
