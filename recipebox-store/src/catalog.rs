//! High-level recipe catalog wrapping the storage backends.
//!
//! Every request-level operation lives here: authorization checks,
//! profile bookkeeping and media handling. HTTP handlers only translate
//! between JSON and these calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use serde::Serialize;
use uuid::Uuid;

use recipebox_core::{
    ObjectKey, Page, Pagination, Profile, ProfileUpdate, Recipe, RecipeDraft, RecipeFilter, RecipeId,
    RecipeQuery, UserId,
};

use crate::backend::{DocumentStore, Identity, ObjectStore, StoredObject};
use crate::listing::list_recipes;
use crate::StoreError;

/// Default upload limit for images: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// What anyone may see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub bio: String,
    pub avatar: Option<ObjectKey>,
    /// Number of public recipes the user owns.
    pub public_recipes: usize,
    pub created_at: DateTime<Utc>,
}

/// Recipe catalog over a document store and an object store.
///
/// Cheap to clone; all clones share the same backends.
#[derive(Clone)]
pub struct RecipeCatalog {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl std::fmt::Debug for RecipeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeCatalog")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

impl RecipeCatalog {
    /// Create a catalog over the given backends.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects, max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES }
    }

    /// Override the image upload limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: usize) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// The configured image upload limit.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    // ── Recipes ──────────────────────────────────────────────────────────────

    /// Validate and store a new recipe owned by `caller`.
    ///
    /// The recipe's tags are added to the caller's tag vocabulary.
    ///
    /// # Errors
    /// Returns [`StoreError::Invalid`] if the draft fails validation, or a
    /// backend error.
    pub async fn create_recipe(&self, caller: &Identity, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        let recipe = Recipe::create(caller.uid.clone(), draft, Utc::now())?;
        self.store.put_recipe(recipe.clone()).await?;
        self.absorb_tags(caller, &recipe).await?;
        tracing::info!(recipe = %recipe.id, owner = %recipe.owner, kind = %recipe.kind(), "recipe created");
        Ok(recipe)
    }

    /// Fetch a recipe the viewer may see.
    ///
    /// # Errors
    /// Returns [`StoreError::RecipeNotFound`] if it does not exist or is
    /// private to someone else.
    pub async fn get_recipe(&self, viewer: Option<&UserId>, id: RecipeId) -> Result<Recipe, StoreError> {
        match self.store.get_recipe(id).await? {
            Some(recipe) if recipe.is_visible_to(viewer) => Ok(recipe),
            _ => Err(StoreError::RecipeNotFound(id)),
        }
    }

    /// Replace the editable fields of a recipe the caller owns.
    ///
    /// # Errors
    /// Returns [`StoreError::RecipeNotFound`] if the caller cannot see it,
    /// [`StoreError::Forbidden`] if someone else owns it, or
    /// [`StoreError::Invalid`] if the draft fails validation.
    pub async fn update_recipe(
        &self,
        caller: &Identity,
        id: RecipeId,
        draft: RecipeDraft,
    ) -> Result<Recipe, StoreError> {
        let mut recipe = self.owned_recipe(&caller.uid, id).await?;
        recipe.apply(draft, Utc::now())?;
        self.store.put_recipe(recipe.clone()).await?;
        self.absorb_tags(caller, &recipe).await?;
        tracing::info!(recipe = %id, "recipe updated");
        Ok(recipe)
    }

    /// Delete a recipe the caller owns, together with its image.
    ///
    /// # Errors
    /// Returns [`StoreError::RecipeNotFound`] or [`StoreError::Forbidden`].
    pub async fn delete_recipe(&self, caller: &UserId, id: RecipeId) -> Result<(), StoreError> {
        let recipe = self.owned_recipe(caller, id).await?;
        self.store.delete_recipe(id).await?;
        if let Some(image) = &recipe.image {
            self.objects.delete(image).await?;
        }
        tracing::info!(recipe = %id, "recipe deleted");
        Ok(())
    }

    /// Store a new cover image for a recipe the caller owns, replacing any
    /// previous one.
    ///
    /// # Errors
    /// Returns [`StoreError::UnsupportedMediaType`], [`StoreError::UploadSize`],
    /// [`StoreError::RecipeNotFound`] or [`StoreError::Forbidden`].
    pub async fn set_recipe_image(
        &self,
        caller: &UserId,
        id: RecipeId,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<Recipe, StoreError> {
        let ext = self.check_upload(content_type, bytes.len())?;
        let mut recipe = self.owned_recipe(caller, id).await?;

        let key = ObjectKey::new(format!("recipes/{id}/{}.{ext}", Uuid::new_v4()));
        self.objects.put(&key, &mime_essence(content_type), bytes).await?;
        let previous = recipe.image.replace(key.clone());
        recipe.updated_at = Utc::now();
        if let Err(e) = self.store.put_recipe(recipe.clone()).await {
            self.discard_object(&key).await;
            return Err(e);
        }

        if let Some(old) = previous {
            self.objects.delete(&old).await?;
        }
        tracing::info!(recipe = %id, "recipe image stored");
        Ok(recipe)
    }

    /// Mark or unmark a recipe as one of the caller's favorites.
    ///
    /// Returns the caller's favorites count afterwards. Unmarking does not
    /// require the recipe to still exist.
    ///
    /// # Errors
    /// Returns [`StoreError::RecipeNotFound`] when marking a recipe the
    /// caller cannot see.
    pub async fn set_favorite(&self, caller: &Identity, id: RecipeId, on: bool) -> Result<usize, StoreError> {
        if on {
            self.get_recipe(Some(&caller.uid), id).await?;
        }
        let mut profile = self.profile(caller).await?;
        if profile.set_favorite(id, on) {
            self.store.put_profile(profile.clone()).await?;
        }
        Ok(profile.favorites.len())
    }

    /// Run a listing query for `viewer`.
    ///
    /// # Errors
    /// Returns [`StoreError::Invalid`] when an anonymous caller asks for
    /// something that needs sign-in, or a backend error.
    pub async fn list(
        &self,
        query: RecipeQuery,
        pagination: Pagination,
        viewer: Option<&UserId>,
    ) -> Result<Page<Recipe>, StoreError> {
        let favorites = match viewer {
            Some(uid) if query.favorites_only => self
                .store
                .get_profile(uid)
                .await?
                .map(|p| p.favorites)
                .unwrap_or_default(),
            _ => Default::default(),
        };
        let filter = query.resolve(viewer, &favorites)?;
        list_recipes(self.store.as_ref(), &filter, pagination).await
    }

    /// List the public recipes of one user.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn list_public_by(&self, owner: UserId, pagination: Pagination) -> Result<Page<Recipe>, StoreError> {
        list_recipes(self.store.as_ref(), &RecipeFilter::public_by(owner), pagination).await
    }

    // ── Profiles ─────────────────────────────────────────────────────────────

    /// Return the caller's profile, creating it on first use.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn profile(&self, caller: &Identity) -> Result<Profile, StoreError> {
        if let Some(profile) = self.store.get_profile(&caller.uid).await? {
            return Ok(profile);
        }
        let profile = Profile::new(
            caller.uid.clone(),
            caller.display_name.as_deref().unwrap_or_default(),
            Utc::now(),
        );
        self.store.put_profile(profile.clone()).await?;
        tracing::info!(user = %caller.uid, "profile created");
        Ok(profile)
    }

    /// Apply a partial update to the caller's profile.
    ///
    /// # Errors
    /// Returns [`StoreError::Invalid`] if the update fails validation.
    pub async fn update_profile(&self, caller: &Identity, update: ProfileUpdate) -> Result<Profile, StoreError> {
        let mut profile = self.profile(caller).await?;
        profile.apply(update)?;
        self.store.put_profile(profile.clone()).await?;
        Ok(profile)
    }

    /// Store a new avatar for the caller, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`StoreError::UnsupportedMediaType`] or [`StoreError::UploadSize`].
    pub async fn set_avatar(&self, caller: &Identity, content_type: &str, bytes: Bytes) -> Result<Profile, StoreError> {
        let ext = self.check_upload(content_type, bytes.len())?;
        let mut profile = self.profile(caller).await?;

        let key = ObjectKey::new(format!(
            "avatars/{}/{}.{ext}",
            key_segment(caller.uid.as_str()),
            Uuid::new_v4()
        ));
        self.objects.put(&key, &mime_essence(content_type), bytes).await?;
        let previous = profile.avatar.replace(key.clone());
        if let Err(e) = self.store.put_profile(profile.clone()).await {
            self.discard_object(&key).await;
            return Err(e);
        }

        if let Some(old) = previous {
            self.objects.delete(&old).await?;
        }
        tracing::info!(user = %caller.uid, "avatar stored");
        Ok(profile)
    }

    /// The caller's tag vocabulary, in first-use order.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn list_tags(&self, caller: &Identity) -> Result<Vec<String>, StoreError> {
        Ok(self.profile(caller).await?.tags.into_iter().collect())
    }

    /// Add a tag to the caller's vocabulary.
    ///
    /// Returns whether the tag was new, and the vocabulary afterwards.
    ///
    /// # Errors
    /// Returns [`StoreError::Invalid`] for a bad tag or a full vocabulary.
    pub async fn add_tag(&self, caller: &Identity, raw: &str) -> Result<(bool, Vec<String>), StoreError> {
        let mut profile = self.profile(caller).await?;
        let added = profile.add_tag(raw)?;
        if added {
            self.store.put_profile(profile.clone()).await?;
        }
        Ok((added, profile.tags.into_iter().collect()))
    }

    /// Remove a tag from the caller's vocabulary. Returns whether it existed.
    ///
    /// # Errors
    /// Returns [`StoreError::Invalid`] for a tag that cannot be normalized.
    pub async fn remove_tag(&self, caller: &Identity, raw: &str) -> Result<bool, StoreError> {
        let mut profile = self.profile(caller).await?;
        let removed = profile.remove_tag(raw)?;
        if removed {
            self.store.put_profile(profile).await?;
        }
        Ok(removed)
    }

    /// The publicly visible part of a user's profile.
    ///
    /// # Errors
    /// Returns [`StoreError::ProfileNotFound`] if the user has no profile.
    pub async fn public_profile(&self, uid: &UserId) -> Result<PublicProfile, StoreError> {
        let profile = self
            .store
            .get_profile(uid)
            .await?
            .ok_or_else(|| StoreError::ProfileNotFound(uid.to_string()))?;
        let public_recipes = self
            .list_public_by(uid.clone(), Pagination::new(Some(1), Some(1)))
            .await?
            .total;
        Ok(PublicProfile {
            user_id: profile.user_id,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar: profile.avatar,
            public_recipes,
            created_at: profile.created_at,
        })
    }

    // ── Media ────────────────────────────────────────────────────────────────

    /// Fetch a stored media object. Signature checks happen before this.
    ///
    /// # Errors
    /// Returns [`StoreError::MediaNotFound`] if nothing is stored under `key`.
    pub async fn media(&self, key: &ObjectKey) -> Result<StoredObject, StoreError> {
        self.objects
            .get(key)
            .await?
            .ok_or_else(|| StoreError::MediaNotFound(key.to_string()))
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    async fn owned_recipe(&self, caller: &UserId, id: RecipeId) -> Result<Recipe, StoreError> {
        let recipe = self.get_recipe(Some(caller), id).await?;
        if &recipe.owner != caller {
            return Err(StoreError::Forbidden(id));
        }
        Ok(recipe)
    }

    async fn absorb_tags(&self, caller: &Identity, recipe: &Recipe) -> Result<(), StoreError> {
        if recipe.tags.is_empty() {
            return Ok(());
        }
        let mut profile = self.profile(caller).await?;
        if profile.absorb_tags(&recipe.tags) > 0 {
            self.store.put_profile(profile).await?;
        }
        Ok(())
    }

    /// Remove an object whose referencing document was never written.
    async fn discard_object(&self, key: &ObjectKey) {
        if let Err(e) = self.objects.delete(key).await {
            tracing::warn!(key = %key, error = %e, "orphaned upload left behind");
        }
    }

    fn check_upload(&self, content_type: &str, size: usize) -> Result<&'static str, StoreError> {
        let ext = image_extension(content_type)
            .ok_or_else(|| StoreError::UnsupportedMediaType(content_type.to_owned()))?;
        if size == 0 || size > self.max_upload_bytes {
            return Err(StoreError::UploadSize { size, max: self.max_upload_bytes });
        }
        Ok(ext)
    }
}

/// `"Image/PNG; charset=binary"` → `"image/png"`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension for an accepted image content type.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match mime_essence(content_type).as_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Make a uid safe to embed in an object key.
fn key_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
