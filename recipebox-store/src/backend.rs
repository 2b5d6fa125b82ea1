//! Backend abstraction traits.
//!
//! The catalog is written against these traits so the managed document
//! database, object storage and identity provider can be swapped without
//! touching request handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};

use recipebox_core::{ObjectKey, Profile, Recipe, RecipeId, UserId};

use crate::StoreError;

/// Position in the listing order (`created_at` descending, then id descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanCursor {
    pub created_at: DateTime<Utc>,
    pub id: RecipeId,
}

impl ScanCursor {
    /// The cursor positioned at `recipe`.
    #[must_use]
    pub fn of(recipe: &Recipe) -> Self {
        Self { created_at: recipe.created_at, id: recipe.id }
    }
}

/// One batch of a recipe scan.
#[derive(Debug, Clone, Default)]
pub struct RecipeBatch {
    pub recipes: Vec<Recipe>,
    /// Where the next batch starts; `None` once the scan is exhausted.
    pub next: Option<ScanCursor>,
}

/// Persistent storage for recipes and profiles.
///
/// # Cancel Safety
/// Every method performs at most one write, so dropping a future never
/// leaves a record half-written.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a recipe by id.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the store cannot be reached.
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError>;

    /// Insert or replace a recipe.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the write fails.
    async fn put_recipe(&self, recipe: Recipe) -> Result<(), StoreError>;

    /// Delete a recipe. Returns `true` if it existed.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the write fails.
    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError>;

    /// Return up to `limit` recipes strictly after `cursor` in listing order,
    /// starting from the newest when `cursor` is `None`.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the store cannot be reached.
    async fn scan_recipes(
        &self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<RecipeBatch, StoreError>;

    /// Fetch a user's profile.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the store cannot be reached.
    async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, StoreError>;

    /// Insert or replace a profile.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the write fails.
    async fn put_profile(&self, profile: Profile) -> Result<(), StoreError>;
}

/// An object held by an [`ObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Blob storage for recipe images and avatars.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the write fails.
    async fn put(&self, key: &ObjectKey, content_type: &str, bytes: Bytes) -> Result<(), StoreError>;

    /// Fetch the object stored under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the store cannot be reached.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError>;

    /// Delete the object under `key`. Returns `true` if it existed.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if the delete fails.
    async fn delete(&self, key: &ObjectKey) -> Result<bool, StoreError>;
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Verifies bearer tokens issued by the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify `token` and return the identity it belongs to.
    ///
    /// # Errors
    /// Returns [`StoreError::Unauthenticated`] if the token is invalid, or
    /// [`StoreError::Backend`] if the provider cannot be reached.
    async fn verify(&self, token: &str) -> Result<Identity, StoreError>;
}
