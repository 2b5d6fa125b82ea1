//! Fuzz target: JSON recipe drafts through validation.
//!
//! Arbitrary bytes must never panic the parser or the validator, and a draft
//! that validates must validate again to the same value.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recipebox_core::RecipeDraft;

fuzz_target!(|data: &[u8]| {
    let Ok(draft) = serde_json::from_slice::<RecipeDraft>(data) else {
        return;
    };
    if let Ok(clean) = draft.validate() {
        let again = clean.clone().validate().expect("validated draft must stay valid");
        assert_eq!(again, clean, "validation must be idempotent");
    }
});
