//! In-memory backends.
//!
//! Used for demo instances and tests. Recipes are indexed by their listing
//! order so scans are range queries rather than sorts.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use tokio::sync::RwLock;

use recipebox_core::{ObjectKey, Profile, Recipe, RecipeId, UserId};

use crate::backend::{DocumentStore, ObjectStore, RecipeBatch, ScanCursor, StoredObject};
use crate::StoreError;

type OrderKey = (Reverse<DateTime<Utc>>, Reverse<RecipeId>);

fn order_key(created_at: DateTime<Utc>, id: RecipeId) -> OrderKey {
    (Reverse(created_at), Reverse(id))
}

#[derive(Debug, Default)]
struct Documents {
    recipes: HashMap<RecipeId, Recipe>,
    order: BTreeSet<OrderKey>,
    profiles: HashMap<UserId, Profile>,
}

impl Documents {
    fn insert_recipe(&mut self, recipe: Recipe) {
        if let Some(old) = self.recipes.get(&recipe.id) {
            self.order.remove(&order_key(old.created_at, old.id));
        }
        self.order.insert(order_key(recipe.created_at, recipe.id));
        self.recipes.insert(recipe.id, recipe);
    }
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Documents>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with recipes and profiles.
    #[must_use]
    pub fn seeded(
        recipes: impl IntoIterator<Item = Recipe>,
        profiles: impl IntoIterator<Item = Profile>,
    ) -> Self {
        let mut docs = Documents::default();
        for recipe in recipes {
            docs.insert_recipe(recipe);
        }
        for profile in profiles {
            docs.profiles.insert(profile.user_id.clone(), profile);
        }
        Self { inner: RwLock::new(docs) }
    }

    /// Number of stored recipes.
    pub async fn recipe_count(&self) -> usize {
        self.inner.read().await.recipes.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
        Ok(self.inner.read().await.recipes.get(&id).cloned())
    }

    async fn put_recipe(&self, recipe: Recipe) -> Result<(), StoreError> {
        self.inner.write().await.insert_recipe(recipe);
        Ok(())
    }

    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError> {
        let mut docs = self.inner.write().await;
        match docs.recipes.remove(&id) {
            Some(old) => {
                docs.order.remove(&order_key(old.created_at, old.id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scan_recipes(
        &self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<RecipeBatch, StoreError> {
        let docs = self.inner.read().await;
        let lower = match cursor {
            Some(c) => Bound::Excluded(order_key(c.created_at, c.id)),
            None => Bound::Unbounded,
        };

        let recipes: Vec<Recipe> = docs
            .order
            .range((lower, Bound::Unbounded))
            .take(limit)
            .filter_map(|(_, Reverse(id))| docs.recipes.get(id).cloned())
            .collect();

        let next = if recipes.len() < limit {
            None
        } else {
            recipes.last().map(ScanCursor::of)
        };
        Ok(RecipeBatch { recipes, next })
    }

    async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.inner.read().await.profiles.get(uid).cloned())
    }

    async fn put_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.inner.write().await.profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }
}

/// Thread-safe in-memory [`ObjectStore`].
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectKey, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns `true` if no objects are stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &ObjectKey, content_type: &str, bytes: Bytes) -> Result<(), StoreError> {
        self.objects
            .write()
            .await
            .insert(key.clone(), StoredObject { content_type: content_type.to_owned(), bytes });
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StoreError> {
        Ok(self.objects.write().await.remove(key).is_some())
    }
}
