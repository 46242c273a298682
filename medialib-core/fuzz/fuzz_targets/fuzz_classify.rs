#![no_main]

//! Fuzz target for kind classification.
//!
//! Every handle must resolve to at most one kind, and a kind's native
//! constraint must agree with direct matching.
//!
//! Run with: cargo +nightly fuzz run fuzz_classify

use libfuzzer_sys::fuzz_target;
use medialib_core::{AssetHandle, MediaKind, NativeMediaType, NativeSubtypes};

fuzz_target!(|data: (u8, u32)| {
    let (raw_type, raw_subtypes) = data;
    let media_type = match raw_type % 4 {
        0 => NativeMediaType::Unknown,
        1 => NativeMediaType::Image,
        2 => NativeMediaType::Video,
        _ => NativeMediaType::Audio,
    };
    let handle = AssetHandle::new("fuzz", media_type)
        .with_subtypes(NativeSubtypes::from_bits_retain(raw_subtypes));

    let matching = MediaKind::ALL
        .into_iter()
        .filter(|kind| kind.matches(&handle))
        .count();
    assert!(matching <= 1);

    for kind in MediaKind::ALL {
        assert_eq!(kind.matches(&handle), kind.constraint().evaluate(&handle));
    }
});
