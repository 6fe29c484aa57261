// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for encoding JSON request bodies into rows

#![no_main]

use atoms_store::codec::{decode, encode};
use atoms_store::Value;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let value = Value::from_json(json);

    // Reserved keys and null values are rejected; everything else decodes
    // back to the same shape.
    if let Ok(row) = encode("fuzz", &value) {
        let decoded = decode(&row).expect("encoded row decodes");
        assert_eq!(decoded.shape(), value.shape());
    }
});
