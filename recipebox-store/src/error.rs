//! Error types for the store crate.

use recipebox_core::{CoreError, RecipeId};

/// Errors that can occur in backend and catalog operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Input failed domain validation.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The bearer token was missing, malformed or rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller may see the recipe but not change it.
    #[error("recipe {0} is owned by another user")]
    Forbidden(RecipeId),

    /// No such recipe, or the caller may not see it.
    #[error("recipe not found: {0}")]
    RecipeNotFound(RecipeId),

    /// No profile exists for the user.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// No object is stored under the key.
    #[error("media not found: {0}")]
    MediaNotFound(String),

    /// A signed media URL was altered or signed with another secret.
    #[error("media signature mismatch")]
    SignatureMismatch,

    /// A signed media URL is past its expiry time.
    #[error("media link expired at {expires}")]
    SignatureExpired { expires: i64 },

    /// Uploaded content type is not an accepted image type.
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    /// Uploaded body is empty or larger than the configured limit.
    #[error("upload of {size} bytes is outside the accepted range 1..={max}")]
    UploadSize { size: usize, max: usize },

    /// Remote backend (identity provider or storage) failed.
    #[error("backend error: {0}")]
    Backend(String),
}
