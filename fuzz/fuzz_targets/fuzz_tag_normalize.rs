//! Fuzz target: tag normalization.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recipebox_core::tags::{normalize_tag, parse_tag_list, MAX_TAG_LEN};

fuzz_target!(|input: &str| {
    if let Ok(tag) = normalize_tag(input) {
        assert!(!tag.is_empty());
        assert!(tag.chars().count() <= MAX_TAG_LEN);
        assert_eq!(normalize_tag(&tag).ok().as_deref(), Some(tag.as_str()), "normalization must be idempotent");
    }
    let _ = parse_tag_list(input);
});
