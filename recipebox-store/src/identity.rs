//! Identity providers.
//!
//! Authentication is delegated: the gateway never stores credentials, it
//! only asks a provider who a bearer token belongs to.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpStream;

use recipebox_core::UserId;

use crate::backend::{Identity, IdentityProvider};
use crate::signer::constant_time_eq;
use crate::StoreError;

/// Default timeout for a remote token verification round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Tokens of the form `<uid>.<base64url(SHA-256(secret || uid))>`.
///
/// Intended for development and tests, where no external provider runs.
#[derive(Clone)]
pub struct SharedSecretIdentity {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SharedSecretIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretIdentity").finish_non_exhaustive()
    }
}

impl SharedSecretIdentity {
    /// Create a provider that issues and checks tokens with `secret`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// Issue a token for `uid`.
    #[must_use]
    pub fn issue(&self, uid: &UserId) -> String {
        format!("{}.{}", uid, self.mac(uid.as_str()))
    }

    fn mac(&self, uid: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(uid.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[async_trait]
impl IdentityProvider for SharedSecretIdentity {
    async fn verify(&self, token: &str) -> Result<Identity, StoreError> {
        let (uid, mac) = token
            .rsplit_once('.')
            .ok_or_else(|| StoreError::Unauthenticated("malformed token".to_owned()))?;
        if uid.is_empty() {
            return Err(StoreError::Unauthenticated("token has no uid".to_owned()));
        }
        if !constant_time_eq(self.mac(uid).as_bytes(), mac.as_bytes()) {
            return Err(StoreError::Unauthenticated("token signature mismatch".to_owned()));
        }
        Ok(Identity { uid: UserId::new(uid), display_name: None })
    }
}

/// Verifies tokens against an external HTTP endpoint.
///
/// Sends `POST <path>` with `{"token": "..."}` and expects a 2xx response
/// carrying `{"uid": "...", "display_name": "..."}`. 400, 401 and 403 mean
/// the token was rejected; any other failure is a backend error.
#[derive(Debug, Clone)]
pub struct RemoteIdentityProvider {
    host: String,
    port: u16,
    path: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

impl RemoteIdentityProvider {
    /// Create a provider for an `http://host[:port]/path` endpoint.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the endpoint is not a plain
    /// `http` URL with a host.
    pub fn new(endpoint: &str) -> Result<Self, StoreError> {
        let uri: Uri = endpoint
            .parse()
            .map_err(|e| StoreError::Backend(format!("invalid identity endpoint {endpoint}: {e}")))?;
        if uri.scheme_str() != Some("http") {
            return Err(StoreError::Backend(format!(
                "identity endpoint {endpoint} must use http://"
            )));
        }
        let host = uri
            .host()
            .ok_or_else(|| StoreError::Backend(format!("identity endpoint {endpoint} has no host")))?
            .to_owned();
        let path = uri.path_and_query().map_or("/", |p| p.as_str()).to_owned();
        Ok(Self {
            host,
            port: uri.port_u16().unwrap_or(80),
            path,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the round-trip timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn round_trip(&self, body: String) -> Result<(StatusCode, Bytes), StoreError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| StoreError::Backend(format!("connect to {}:{}: {e}", self.host, self.port)))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| StoreError::Backend(format!("HTTP handshake: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("identity provider connection closed: {e}");
            }
        });

        let body = Bytes::from(body);
        let req = Request::builder()
            .method(Method::POST)
            .uri(self.path.as_str())
            .header("Host", format!("{}:{}", self.host, self.port))
            .header("Content-Type", "application/json")
            .header("Content-Length", body.len().to_string())
            .body(Full::new(body))
            .map_err(|e| StoreError::Backend(format!("build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| StoreError::Backend(format!("send request: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("read response body: {e}")))?
            .to_bytes();
        Ok((status, bytes))
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Identity, StoreError> {
        let body = serde_json::to_string(&VerifyRequest { token })
            .map_err(|e| StoreError::Backend(format!("encode verify request: {e}")))?;

        let (status, bytes) = tokio::time::timeout(self.timeout, self.round_trip(body))
            .await
            .map_err(|_| StoreError::Backend("identity provider timed out".to_owned()))??;

        match status {
            s if s.is_success() => serde_json::from_slice::<Identity>(&bytes)
                .map_err(|e| StoreError::Backend(format!("decode identity: {e}"))),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(StoreError::Unauthenticated(format!("identity provider returned {status}")))
            }
            other => {
                tracing::warn!(status = %other, "identity provider failure");
                Err(StoreError::Backend(format!(
                    "identity provider returned {other}: {}",
                    String::from_utf8_lossy(&bytes)
                )))
            }
        }
    }
}
