/// Errors produced by the `recipebox-core` crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A field of a recipe draft or profile update failed validation.
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A tag could not be normalized.
    #[error("invalid tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    /// A collection grew beyond its allowed size.
    #[error("too many {what}: at most {max} allowed")]
    LimitExceeded { what: &'static str, max: usize },

    /// The request only makes sense for an authenticated caller.
    #[error("sign-in required for {0}")]
    SignInRequired(&'static str),
}

impl CoreError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }
}
