//! Shared application state handed to every handler.

use std::sync::Arc;

use chrono::Utc;
use recipebox_core::{sample::sample_recipes, Profile, UserId};
use recipebox_store::{
    IdentityProvider, MemoryDocumentStore, MemoryObjectStore, RecipeCatalog, RemoteIdentityProvider,
    SharedSecretIdentity, UrlSigner,
};

use crate::{
    config::{GatewayConfig, IdentityConfig},
    error::GatewayError,
};

/// Catalog, token verifier and media signer. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub catalog: RecipeCatalog,
    pub identity: Arc<dyn IdentityProvider>,
    pub signer: Arc<UrlSigner>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("catalog", &self.catalog)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl AppState {
    #[must_use]
    pub fn new(catalog: RecipeCatalog, identity: Arc<dyn IdentityProvider>, signer: UrlSigner) -> Self {
        Self { catalog, identity, signer: Arc::new(signer) }
    }

    /// Build in-memory backends and providers from `config`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Store`] if the remote identity endpoint is unusable.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let identity: Arc<dyn IdentityProvider> = match &config.identity {
            IdentityConfig::Remote(url) => Arc::new(RemoteIdentityProvider::new(url)?),
            IdentityConfig::SharedSecret(secret) => Arc::new(SharedSecretIdentity::new(secret.as_bytes())),
        };

        let store = if config.seed_demo {
            let (recipes, profiles) = demo_documents();
            tracing::info!(recipes = recipes.len(), "seeding demo recipes");
            MemoryDocumentStore::seeded(recipes, profiles)
        } else {
            MemoryDocumentStore::new()
        };

        let catalog = RecipeCatalog::new(Arc::new(store), Arc::new(MemoryObjectStore::new()))
            .with_max_upload_bytes(config.max_upload_bytes);
        let signer = UrlSigner::new(config.media_secret.as_bytes(), &config.public_url, config.media_ttl);
        Ok(Self::new(catalog, identity, signer))
    }
}

/// Sample recipes for two demo users plus their profiles.
fn demo_documents() -> (Vec<recipebox_core::Recipe>, Vec<Profile>) {
    let now = Utc::now();
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");
    let recipes = sample_recipes(&alice, &bob, now);

    let profiles = [(alice, "Alice"), (bob, "Bob")]
        .into_iter()
        .map(|(uid, name)| {
            let owned = recipes.iter().filter(|r| r.owner == uid);
            let mut profile = Profile::new(uid.clone(), name, now);
            profile.absorb_tags(owned.flat_map(|r| r.tags.iter()));
            profile
        })
        .collect();
    (recipes, profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_profiles_absorb_their_own_recipe_tags() {
        let (recipes, profiles) = demo_documents();
        assert_eq!(recipes.len(), 10);
        assert_eq!(profiles.len(), 2);
        for profile in &profiles {
            for recipe in recipes.iter().filter(|r| r.owner == profile.user_id) {
                for tag in &recipe.tags {
                    assert!(profile.tags.contains(tag), "{} missing tag {tag}", profile.user_id);
                }
            }
        }
    }
}
