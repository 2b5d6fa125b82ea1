//! Fuzz target: listing query-string parsing.
//!
//! Any query string either parses into a normalized pagination or yields a
//! client error; it must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recipebox_core::query::MAX_PAGE_SIZE;
use recipebox_gateway::routes::recipes::ListParams;

fuzz_target!(|input: &str| {
    let Ok(params) = serde_json::from_value::<ListParams>(serde_json::Value::Object(
        input
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_owned(), serde_json::Value::String(v.to_owned())))
            .collect(),
    )) else {
        return;
    };
    if let Ok((_, pagination)) = params.into_query() {
        assert!(pagination.page >= 1);
        assert!((1..=MAX_PAGE_SIZE).contains(&pagination.page_size));
    }
});
