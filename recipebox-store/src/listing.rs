//! Filtered, paginated recipe listing over a batch-scanning store.
//!
//! The store only knows how to walk recipes in listing order. Filtering
//! happens here, so pagination must count matches rather than raw records:
//! the engine skips the first `offset` matches, collects the next
//! `page_size`, and keeps scanning to the end to report the total.

use recipebox_core::{Page, Pagination, Recipe, RecipeFilter};

use crate::backend::DocumentStore;
use crate::StoreError;

/// Number of recipes fetched from the store per scan call.
pub const SCAN_BATCH_SIZE: usize = 50;

/// List the recipes matching `filter`, paginated over the filtered sequence.
///
/// Returns an empty page without touching the store when the filter cannot
/// match anything (favorites-only with no favorites).
///
/// # Errors
/// Propagates errors from [`DocumentStore::scan_recipes`].
pub async fn list_recipes<S>(
    store: &S,
    filter: &RecipeFilter,
    pagination: Pagination,
) -> Result<Page<Recipe>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    list_recipes_batched(store, filter, pagination, SCAN_BATCH_SIZE).await
}

/// [`list_recipes`] with an explicit scan batch size.
///
/// # Errors
/// Propagates errors from [`DocumentStore::scan_recipes`].
pub async fn list_recipes_batched<S>(
    store: &S,
    filter: &RecipeFilter,
    pagination: Pagination,
    batch_size: usize,
) -> Result<Page<Recipe>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    if filter.is_trivially_empty() {
        return Ok(Page::empty(pagination));
    }

    let batch_size = batch_size.max(1);
    let mut skip = pagination.offset();
    let mut items = Vec::with_capacity(pagination.limit());
    let mut total = 0_usize;
    let mut cursor = None;
    let mut scanned = 0_usize;

    loop {
        let batch = store.scan_recipes(cursor, batch_size).await?;
        scanned += batch.recipes.len();

        for recipe in batch.recipes {
            if !filter.matches(&recipe) {
                continue;
            }
            total += 1;
            if skip > 0 {
                skip -= 1;
            } else if items.len() < pagination.limit() {
                items.push(recipe);
            }
        }

        match batch.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(scanned, total, page = pagination.page, "recipe listing scanned");

    Ok(Page { items, total, page: pagination.page, page_size: pagination.page_size })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use recipebox_core::sample::sample_recipes;
    use recipebox_core::{Profile, RecipeId, RecipeQuery, UserId};

    use super::*;
    use crate::backend::{RecipeBatch, ScanCursor};
    use crate::memory::MemoryDocumentStore;

    /// Wraps a store and counts scan calls.
    struct CountingStore {
        inner: MemoryDocumentStore,
        scans: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
            self.inner.get_recipe(id).await
        }
        async fn put_recipe(&self, recipe: Recipe) -> Result<(), StoreError> {
            self.inner.put_recipe(recipe).await
        }
        async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError> {
            self.inner.delete_recipe(id).await
        }
        async fn scan_recipes(
            &self,
            cursor: Option<ScanCursor>,
            limit: usize,
        ) -> Result<RecipeBatch, StoreError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.scan_recipes(cursor, limit).await
        }
        async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, StoreError> {
            self.inner.get_profile(uid).await
        }
        async fn put_profile(&self, profile: Profile) -> Result<(), StoreError> {
            self.inner.put_profile(profile).await
        }
    }

    fn counting() -> CountingStore {
        let recipes = sample_recipes(&UserId::new("alice"), &UserId::new("bob"), Utc::now());
        CountingStore { inner: MemoryDocumentStore::seeded(recipes, []), scans: AtomicUsize::new(0) }
    }

    fn filter(query: RecipeQuery, viewer: Option<&str>, favorites: &BTreeSet<RecipeId>) -> RecipeFilter {
        let viewer = viewer.map(UserId::new);
        match query.resolve(viewer.as_ref(), favorites) {
            Ok(f) => f,
            Err(e) => panic!("resolve failed: {e}"),
        }
    }

    #[tokio::test]
    async fn empty_favorites_short_circuits_without_scanning() {
        let store = counting();
        let f = filter(
            RecipeQuery { favorites_only: true, ..RecipeQuery::default() },
            Some("alice"),
            &BTreeSet::new(),
        );
        let page = match list_recipes(&store, &f, Pagination::default()).await {
            Ok(p) => p,
            Err(e) => panic!("listing failed: {e}"),
        };
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(store.scans.load(Ordering::SeqCst), 0, "no scan expected");
    }

    #[tokio::test]
    async fn pagination_counts_matches_not_raw_records() {
        let store = counting();
        // Anonymous: 7 public recipes among 10.
        let f = filter(RecipeQuery::default(), None, &BTreeSet::new());

        let first = match list_recipes_batched(&store, &f, Pagination::new(Some(1), Some(3)), 2).await {
            Ok(p) => p,
            Err(e) => panic!("listing failed: {e}"),
        };
        let third = match list_recipes_batched(&store, &f, Pagination::new(Some(3), Some(3)), 2).await {
            Ok(p) => p,
            Err(e) => panic!("listing failed: {e}"),
        };
        let past_end = match list_recipes_batched(&store, &f, Pagination::new(Some(9), Some(3)), 2).await {
            Ok(p) => p,
            Err(e) => panic!("listing failed: {e}"),
        };

        let titles = |p: &Page<Recipe>| p.items.iter().map(|r| r.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&first), vec!["Weeknight Tomato Soup", "Beef Stew", "Shoyu Ramen"]);
        assert_eq!(titles(&third), vec!["Sourdough Loaf"]);
        assert!(past_end.items.is_empty());
        assert_eq!((first.total, third.total, past_end.total), (7, 7, 7));
    }
}
