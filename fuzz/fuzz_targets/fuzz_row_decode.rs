// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for decoding stored row bytes

#![no_main]

use atoms_store::codec::{decode, row_from_bytes, row_to_bytes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode to a value or an error, never panic.
    let Ok(row) = row_from_bytes(data) else {
        return;
    };
    let _ = decode(&row);

    // Any row that parsed must serialize again.
    let bytes = row_to_bytes(&row).expect("parsed row re-serializes");
    assert_eq!(row_from_bytes(&bytes).ok(), Some(row));
});
