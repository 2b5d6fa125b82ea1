//! Signed media delivery.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use recipebox_core::ObjectKey;
use recipebox_store::StoreError;

use super::{path_param, query_params};
use crate::{error::GatewayError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SignedParams {
    pub expires: Option<String>,
    pub signature: Option<String>,
}

/// `GET /media/{*key}?expires=..&signature=..`: stored bytes with their
/// content type.
///
/// # Errors
/// Returns 403 for a missing or wrong signature, 410 once the link has
/// expired, and 404 if the object is gone.
pub async fn serve_media(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
    params: Result<Query<SignedParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let key = ObjectKey::new(path_param(key)?);
    let params = query_params(params)?;
    let (Some(expires), Some(signature)) = (params.expires, params.signature) else {
        return Err(StoreError::SignatureMismatch.into());
    };
    let expires: i64 = expires.parse().map_err(|_| StoreError::SignatureMismatch)?;
    state.signer.verify(&key, expires, &signature, Utc::now())?;

    let object = state.catalog.media(&key).await?;
    tracing::debug!(key = %key, bytes = object.bytes.len(), "serving media");
    Ok(([(CONTENT_TYPE, object.content_type), (CACHE_CONTROL, "private, max-age=300".to_owned())], object.bytes))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{Body, Bytes},
        http::{Request, StatusCode},
    };
    use chrono::Duration as TimeDelta;
    use recipebox_core::UserId;
    use recipebox_store::{
        Identity, MemoryDocumentStore, MemoryObjectStore, RecipeCatalog, SharedSecretIdentity, UrlSigner,
    };
    use tower::ServiceExt;

    use crate::routes::create_router;

    use super::*;

    async fn state_with_avatar() -> (AppState, ObjectKey) {
        let catalog = RecipeCatalog::new(Arc::new(MemoryDocumentStore::new()), Arc::new(MemoryObjectStore::new()));
        let caller = Identity { uid: UserId::new("alice"), display_name: None };
        let profile = match catalog.set_avatar(&caller, "image/png", Bytes::from_static(b"\x89PNG")).await {
            Ok(p) => p,
            Err(e) => panic!("avatar upload failed: {e}"),
        };
        let Some(key) = profile.avatar else { panic!("avatar key missing") };
        let signer = UrlSigner::new(b"media-secret".to_vec(), "http://test.local", Duration::from_secs(60));
        (AppState::new(catalog, Arc::new(SharedSecretIdentity::new(b"t".to_vec())), signer), key)
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let req = match Request::builder().uri(uri).body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match create_router(state).oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        let status = resp.status();
        let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_owned);
        let bytes = match axum::body::to_bytes(resp.into_body(), 1 << 16).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        (status, content_type, bytes.to_vec())
    }

    fn path_of(url: &str) -> &str {
        url.strip_prefix("http://test.local").unwrap_or(url)
    }

    #[tokio::test]
    async fn signed_url_serves_bytes_with_content_type() {
        let (state, key) = state_with_avatar().await;
        let url = state.signer.sign(&key, Utc::now());
        let (status, content_type, body) = get(state, path_of(&url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(body, b"\x89PNG");
    }

    #[tokio::test]
    async fn tampered_or_missing_signature_is_forbidden() {
        let (state, key) = state_with_avatar().await;
        let url = state.signer.sign(&key, Utc::now());
        let tampered = format!("{}x", path_of(&url));
        let (status, _, _) = get(state.clone(), &tampered).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = get(state, &format!("/media/{key}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn expired_link_is_gone() {
        let (state, key) = state_with_avatar().await;
        let url = state.signer.sign(&key, Utc::now() - TimeDelta::hours(2));
        let (status, _, body) = get(state, path_of(&url)).await;
        assert_eq!(status, StatusCode::GONE);
        assert!(String::from_utf8_lossy(&body).contains("error"));
    }

    #[tokio::test]
    async fn valid_signature_for_deleted_object_is_404() {
        let (state, _) = state_with_avatar().await;
        let ghost = ObjectKey::new("avatars/alice/ghost.png");
        let url = state.signer.sign(&ghost, Utc::now());
        let (status, _, _) = get(state, path_of(&url)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
