//! Bearer-token extractors.
//!
//! [`Viewer`] is for routes anyone may call; [`Authed`] for routes that need
//! a signed-in caller. A header that is present but malformed or rejected
//! fails with 401 in both cases, so a client with an expired token never
//! silently sees the anonymous view.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use recipebox_core::UserId;
use recipebox_store::{Identity, StoreError};

use crate::{error::GatewayError, state::AppState};

/// The caller, if a bearer token was sent.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
    #[must_use]
    pub fn uid(&self) -> Option<&UserId> {
        self.0.as_ref().map(|identity| &identity.uid)
    }
}

/// A caller that presented a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authed(pub Identity);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(Viewer(None));
        };
        let identity = state.identity.verify(token).await.map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            e
        })?;
        Ok(Viewer(Some(identity)))
    }
}

impl FromRequestParts<AppState> for Authed {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Viewer::from_request_parts(parts, state).await? {
            Viewer(Some(identity)) => Ok(Authed(identity)),
            Viewer(None) => Err(GatewayError::Unauthorized),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, GatewayError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let malformed = || GatewayError::Store(StoreError::Unauthenticated("malformed Authorization header".to_owned()));
    let value = value.to_str().map_err(|_| malformed())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }
    Ok(Some(token))
}
