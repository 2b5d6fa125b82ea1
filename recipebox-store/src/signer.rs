//! Signed media URLs.
//!
//! Media is never served from a public bucket. Each URL carries an expiry
//! and a signature over the object key and that expiry:
//!
//! `sig = base64url(SHA-256(secret || "\n" || key || "\n" || expires))`

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use recipebox_core::ObjectKey;

use crate::StoreError;

/// Default lifetime of a signed URL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Mints and checks signed media URLs.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
    ttl: Duration,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Create a signer for URLs rooted at `base_url` (no trailing slash needed).
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, base_url: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            ttl,
        }
    }

    /// Produce a URL for `key` valid until `now + ttl`.
    #[must_use]
    pub fn sign(&self, key: &ObjectKey, now: DateTime<Utc>) -> String {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.timestamp().saturating_add(ttl_secs);
        let signature = self.signature(key.as_str(), expires);
        format!("{}/media/{}?expires={expires}&signature={signature}", self.base_url, key)
    }

    /// Check a signature presented with a media request.
    ///
    /// # Errors
    /// Returns [`StoreError::SignatureExpired`] when `now` is past `expires`,
    /// or [`StoreError::SignatureMismatch`] when the signature is wrong.
    pub fn verify(
        &self,
        key: &ObjectKey,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let expected = self.signature(key.as_str(), expires);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(StoreError::SignatureMismatch);
        }
        if now.timestamp() > expires {
            return Err(StoreError::SignatureExpired { expires });
        }
        Ok(())
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// Compare two byte strings without short-circuiting on the first difference.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("media-secret", "http://localhost:3456/", Duration::from_secs(60))
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').map_or("", |(_, q)| q);
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
            .unwrap_or_default()
    }

    #[test]
    fn sign_produces_url_that_verifies() {
        let signer = signer();
        let key = ObjectKey::new("recipes/abc/cover.png");
        let now = Utc::now();
        let url = signer.sign(&key, now);

        assert!(url.starts_with("http://localhost:3456/media/recipes/abc/cover.png?"), "got {url}");
        let expires: i64 = match query_param(&url, "expires").parse() {
            Ok(v) => v,
            Err(e) => panic!("bad expires in {url}: {e}"),
        };
        assert_eq!(expires, now.timestamp() + 60);
        let signature = query_param(&url, "signature");
        assert!(signer.verify(&key, expires, signature, now).is_ok());
    }

    #[test]
    fn verify_rejects_other_key_other_secret_and_tampered_expiry() {
        let signer = signer();
        let key = ObjectKey::new("avatars/u/a.png");
        let now = Utc::now();
        let url = signer.sign(&key, now);
        let expires: i64 = query_param(&url, "expires").parse().unwrap_or_default();
        let signature = query_param(&url, "signature");

        let other_key = ObjectKey::new("avatars/u/b.png");
        assert!(matches!(
            signer.verify(&other_key, expires, signature, now),
            Err(StoreError::SignatureMismatch)
        ));

        let other = UrlSigner::new("another-secret", "http://localhost:3456", Duration::from_secs(60));
        assert!(matches!(other.verify(&key, expires, signature, now), Err(StoreError::SignatureMismatch)));

        assert!(matches!(
            signer.verify(&key, expires + 3600, signature, now),
            Err(StoreError::SignatureMismatch)
        ));
    }

    #[test]
    fn verify_rejects_expired_links() {
        let signer = signer();
        let key = ObjectKey::new("recipes/abc/cover.png");
        let then = Utc::now() - chrono::Duration::hours(2);
        let url = signer.sign(&key, then);
        let expires: i64 = query_param(&url, "expires").parse().unwrap_or_default();
        let signature = query_param(&url, "signature");
        assert!(matches!(
            signer.verify(&key, expires, signature, Utc::now()),
            Err(StoreError::SignatureExpired { .. })
        ));
    }

    #[test]
    fn constant_time_eq_compares_contents_and_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
