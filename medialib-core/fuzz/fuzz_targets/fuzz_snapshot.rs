#![no_main]

//! Fuzz target for LibrarySnapshot::from_json()
//!
//! Parsed snapshots are also loaded into a store and scanned, so malformed
//! but accepted input goes through classification and sorting too.
//!
//! Run with: cargo +nightly fuzz run fuzz_snapshot

use libfuzzer_sys::fuzz_target;
use medialib_core::{AnyMedia, AssetStore, InMemoryStore, LibrarySnapshot, Query, Resolve};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(snapshot) = LibrarySnapshot::from_json(text) {
        let store = InMemoryStore::from_snapshot(snapshot);
        for handle in store.fetch(&Query::all().including_hidden(true)) {
            let _ = AnyMedia::resolve(handle);
        }
    }
});
