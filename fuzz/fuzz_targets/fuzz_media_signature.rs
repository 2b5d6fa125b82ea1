//! Fuzz target: signed media URL verification.
//!
//! Input is split into key, expiry and signature at `\n`. Verification must
//! never panic, and a URL the signer produced must always verify.

#![no_main]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use recipebox_core::ObjectKey;
use recipebox_store::UrlSigner;

fuzz_target!(|input: &str| {
    let signer = UrlSigner::new(b"fuzz-secret".to_vec(), "http://fuzz.local", Duration::from_secs(60));
    let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("fixed timestamp");

    let mut parts = input.splitn(3, '\n');
    let key = ObjectKey::new(parts.next().unwrap_or_default());
    let expires = parts.next().and_then(|e| e.parse::<i64>().ok()).unwrap_or(0);
    let signature = parts.next().unwrap_or_default();
    let _ = signer.verify(&key, expires, signature, now);

    let url = signer.sign(&key, now);
    let query = url.rsplit_once('?').map(|(_, q)| q).expect("signed URL has a query");
    let mut expires = None;
    let mut signature = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", v)) => expires = v.parse::<i64>().ok(),
            Some(("signature", v)) => signature = Some(v),
            _ => {}
        }
    }
    let (Some(expires), Some(signature)) = (expires, signature) else {
        panic!("signed URL missing parameters: {url}");
    };
    signer.verify(&key, expires, signature, now).expect("fresh signature must verify");
});
