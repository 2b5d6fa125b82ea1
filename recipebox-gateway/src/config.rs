//! Gateway configuration loaded from `RECIPEBOX_*` environment variables.

use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use recipebox_store::DEFAULT_MAX_UPLOAD_BYTES;
use tracing::info;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";
const DEFAULT_MEDIA_TTL_SECS: u64 = 3600;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// How bearer tokens are verified.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    /// Tokens minted locally with a shared secret.
    SharedSecret(String),
    /// Tokens checked by an external HTTP endpoint.
    Remote(String),
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityConfig::SharedSecret(_) => f.write_str("SharedSecret(..)"),
            IdentityConfig::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
        }
    }
}

/// Runtime settings for the gateway binary.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    /// Base URL that signed media links point at.
    pub public_url: String,
    pub identity: IdentityConfig,
    pub media_secret: String,
    pub media_ttl: Duration,
    pub max_upload_bytes: usize,
    /// Load the sample recipes at startup.
    pub seed_demo: bool,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("public_url", &self.public_url)
            .field("identity", &self.identity)
            .field("media_ttl", &self.media_ttl)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("seed_demo", &self.seed_demo)
            .finish_non_exhaustive()
    }
}

impl GatewayConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// See [`GatewayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when a required secret is absent, or
    /// [`ConfigError::Invalid`] naming the variable that failed to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let listen_addr: SocketAddr =
            try_load(var("RECIPEBOX_LISTEN_ADDR"), "RECIPEBOX_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?;

        let public_url = match var("RECIPEBOX_PUBLIC_URL") {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.trim_end_matches('/').to_owned()
            }
            Some(url) => {
                return Err(ConfigError::Invalid {
                    var: "RECIPEBOX_PUBLIC_URL",
                    reason: format!("'{url}' is not an http(s) URL"),
                })
            }
            None => format!("http://{listen_addr}"),
        };

        let identity = match (var("RECIPEBOX_IDENTITY_URL"), var("RECIPEBOX_TOKEN_SECRET")) {
            (Some(url), _) => IdentityConfig::Remote(url),
            (None, Some(secret)) => IdentityConfig::SharedSecret(secret),
            (None, None) => return Err(ConfigError::Missing("RECIPEBOX_TOKEN_SECRET")),
        };

        let media_secret = var("RECIPEBOX_MEDIA_SECRET").ok_or(ConfigError::Missing("RECIPEBOX_MEDIA_SECRET"))?;

        let ttl_secs: u64 = try_load(
            var("RECIPEBOX_MEDIA_TTL_SECS"),
            "RECIPEBOX_MEDIA_TTL_SECS",
            &DEFAULT_MEDIA_TTL_SECS.to_string(),
        )?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "RECIPEBOX_MEDIA_TTL_SECS",
                reason: "must be positive".to_owned(),
            });
        }

        let max_upload_bytes: usize = try_load(
            var("RECIPEBOX_MAX_UPLOAD_BYTES"),
            "RECIPEBOX_MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: "RECIPEBOX_MAX_UPLOAD_BYTES",
                reason: "must be positive".to_owned(),
            });
        }

        let seed_demo = match var("RECIPEBOX_SEED_DEMO") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "RECIPEBOX_SEED_DEMO",
                reason: format!("'{raw}' is not a boolean"),
            })?,
        };

        Ok(Self {
            listen_addr,
            public_url,
            identity,
            media_secret,
            media_ttl: Duration::from_secs(ttl_secs),
            max_upload_bytes,
            seed_demo,
        })
    }
}

fn try_load<T: FromStr>(value: Option<String>, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = value.unwrap_or_else(|| {
        info!("{var} not set, using default: {default}");
        default.to_owned()
    });
    raw.parse().map_err(|e| ConfigError::Invalid { var, reason: format!("'{raw}': {e}") })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
