//! Integration test: catalog operations over the in-memory backends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hyper::body::Bytes;

use recipebox_core::{
    Pagination, Profile, ProfileUpdate, Recipe, RecipeContent, RecipeDraft, RecipeId, RecipeQuery, UserId,
    Visibility,
};
use recipebox_store::{
    DocumentStore, Identity, MemoryDocumentStore, MemoryObjectStore, RecipeBatch, RecipeCatalog, ScanCursor,
    StoreError,
};

struct Fixture {
    catalog: RecipeCatalog,
    objects: Arc<MemoryObjectStore>,
}

fn fixture() -> Fixture {
    let objects = Arc::new(MemoryObjectStore::new());
    let catalog = RecipeCatalog::new(Arc::new(MemoryDocumentStore::new()), objects.clone())
        .with_max_upload_bytes(16);
    Fixture { catalog, objects }
}

fn user(uid: &str) -> Identity {
    Identity { uid: UserId::new(uid), display_name: Some(format!("{uid} display")) }
}

fn draft(title: &str, visibility: Visibility, tags: &[&str]) -> RecipeDraft {
    RecipeDraft {
        title: title.to_owned(),
        notes: String::new(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        visibility,
        vegetarian: true,
        content: RecipeContent::Link { url: "https://example.com/r".to_owned() },
    }
}

#[tokio::test]
async fn create_absorbs_tags_into_owner_vocabulary() {
    let f = fixture();
    let alice = user("alice");

    let recipe = f
        .catalog
        .create_recipe(&alice, draft("Soup", Visibility::Public, &["Winter", "soup"]))
        .await
        .expect("create");
    assert_eq!(recipe.owner, alice.uid);

    let tags = f.catalog.list_tags(&alice).await.expect("tags");
    assert_eq!(tags, vec!["soup", "winter"]);

    let profile = f.catalog.profile(&alice).await.expect("profile");
    assert_eq!(profile.display_name, "alice display");
}

#[tokio::test]
async fn private_recipes_are_hidden_and_only_owners_may_edit() {
    let f = fixture();
    let alice = user("alice");
    let bob = user("bob");

    let private = f
        .catalog
        .create_recipe(&alice, draft("Secret", Visibility::Private, &[]))
        .await
        .expect("create");
    let public = f
        .catalog
        .create_recipe(&alice, draft("Shared", Visibility::Public, &[]))
        .await
        .expect("create");

    assert!(matches!(
        f.catalog.get_recipe(Some(&bob.uid), private.id).await,
        Err(StoreError::RecipeNotFound(_))
    ));
    assert!(matches!(f.catalog.get_recipe(None, private.id).await, Err(StoreError::RecipeNotFound(_))));
    assert!(f.catalog.get_recipe(None, public.id).await.is_ok());

    assert!(matches!(
        f.catalog.update_recipe(&bob, public.id, draft("Mine now", Visibility::Public, &[])).await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        f.catalog.update_recipe(&bob, private.id, draft("Mine now", Visibility::Public, &[])).await,
        Err(StoreError::RecipeNotFound(_))
    ));
    assert!(matches!(f.catalog.delete_recipe(&bob.uid, public.id).await, Err(StoreError::Forbidden(_))));

    let updated = f
        .catalog
        .update_recipe(&alice, private.id, draft("Secret v2", Visibility::Public, &["dessert"]))
        .await
        .expect("owner update");
    assert_eq!(updated.title, "Secret v2");
    assert_eq!(updated.created_at, private.created_at);
    assert!(f.catalog.get_recipe(Some(&bob.uid), private.id).await.is_ok(), "now public");
}

#[tokio::test]
async fn favorites_require_visibility_and_feed_the_listing() {
    let f = fixture();
    let alice = user("alice");
    let bob = user("bob");

    let hidden = f
        .catalog
        .create_recipe(&bob, draft("Hidden", Visibility::Private, &[]))
        .await
        .expect("create");
    let shared = f
        .catalog
        .create_recipe(&bob, draft("Shared", Visibility::Public, &[]))
        .await
        .expect("create");

    assert!(matches!(
        f.catalog.set_favorite(&alice, hidden.id, true).await,
        Err(StoreError::RecipeNotFound(_))
    ));
    assert_eq!(f.catalog.set_favorite(&alice, shared.id, true).await.expect("fav"), 1);
    assert_eq!(f.catalog.set_favorite(&alice, shared.id, true).await.expect("idempotent"), 1);

    let query = RecipeQuery { favorites_only: true, ..RecipeQuery::default() };
    let page = f
        .catalog
        .list(query.clone(), Pagination::default(), Some(&alice.uid))
        .await
        .expect("list");
    assert_eq!(page.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![shared.id]);

    // Bob has no favorites: empty page, not an error.
    let page = f
        .catalog
        .list(query.clone(), Pagination::default(), Some(&bob.uid))
        .await
        .expect("list");
    assert_eq!(page.total, 0);

    // Anonymous favorites listing needs sign-in.
    assert!(matches!(
        f.catalog.list(query, Pagination::default(), None).await,
        Err(StoreError::Invalid(_))
    ));

    // Unfavoriting works even after the recipe is gone.
    f.catalog.delete_recipe(&bob.uid, shared.id).await.expect("delete");
    assert_eq!(f.catalog.set_favorite(&alice, shared.id, false).await.expect("unfav"), 0);
    assert!(matches!(
        f.catalog.set_favorite(&alice, RecipeId::new(), true).await,
        Err(StoreError::RecipeNotFound(_))
    ));
}

#[tokio::test]
async fn images_replace_previous_object_and_are_removed_with_the_recipe() {
    let f = fixture();
    let alice = user("alice");
    let recipe = f
        .catalog
        .create_recipe(&alice, draft("Pie", Visibility::Public, &[]))
        .await
        .expect("create");

    let first = f
        .catalog
        .set_recipe_image(&alice.uid, recipe.id, "image/png", Bytes::from_static(b"png-1"))
        .await
        .expect("upload");
    let first_key = first.image.clone().expect("image key set");
    assert!(first_key.as_str().starts_with(&format!("recipes/{}/", recipe.id)));
    assert!(first_key.as_str().ends_with(".png"));

    let second = f
        .catalog
        .set_recipe_image(&alice.uid, recipe.id, "image/jpeg", Bytes::from_static(b"jpg-2"))
        .await
        .expect("upload");
    let second_key = second.image.clone().expect("image key set");
    assert_ne!(first_key, second_key);
    assert_eq!(f.objects.len().await, 1, "old image must be deleted");

    let stored = f.catalog.media(&second_key).await.expect("media");
    assert_eq!(stored.content_type, "image/jpeg");
    assert!(matches!(f.catalog.media(&first_key).await, Err(StoreError::MediaNotFound(_))));

    f.catalog.delete_recipe(&alice.uid, recipe.id).await.expect("delete");
    assert!(f.objects.is_empty().await, "image must be removed with the recipe");
}

#[tokio::test]
async fn uploads_are_checked_for_type_and_size() {
    let f = fixture();
    let alice = user("alice");
    let recipe = f
        .catalog
        .create_recipe(&alice, draft("Pie", Visibility::Public, &[]))
        .await
        .expect("create");

    assert!(matches!(
        f.catalog.set_recipe_image(&alice.uid, recipe.id, "text/html", Bytes::from_static(b"<p>")).await,
        Err(StoreError::UnsupportedMediaType(_))
    ));
    assert!(matches!(
        f.catalog.set_recipe_image(&alice.uid, recipe.id, "image/png", Bytes::new()).await,
        Err(StoreError::UploadSize { size: 0, .. })
    ));
    assert!(matches!(
        f.catalog.set_avatar(&alice, "image/png", Bytes::from(vec![0_u8; 17])).await,
        Err(StoreError::UploadSize { size: 17, max: 16 })
    ));

    let profile = f
        .catalog
        .set_avatar(&alice, "image/webp", Bytes::from_static(b"webp"))
        .await
        .expect("avatar");
    assert!(profile.avatar.expect("avatar key").as_str().starts_with("avatars/alice/"));
}

#[tokio::test]
async fn tag_vocabulary_management() {
    let f = fixture();
    let alice = user("alice");

    let (added, tags) = f.catalog.add_tag(&alice, "Quick").await.expect("add");
    assert!(added);
    assert_eq!(tags, vec!["quick"]);
    let (added, _) = f.catalog.add_tag(&alice, "quick ").await.expect("add again");
    assert!(!added);

    assert!(matches!(f.catalog.add_tag(&alice, "no/slashes").await, Err(StoreError::Invalid(_))));

    assert!(f.catalog.remove_tag(&alice, "QUICK").await.expect("remove"));
    assert!(!f.catalog.remove_tag(&alice, "quick").await.expect("remove again"));
    assert!(f.catalog.list_tags(&alice).await.expect("tags").is_empty());
}

#[tokio::test]
async fn public_profile_counts_public_recipes_only() {
    let f = fixture();
    let alice = user("alice");

    assert!(matches!(
        f.catalog.public_profile(&alice.uid).await,
        Err(StoreError::ProfileNotFound(_))
    ));

    for (title, visibility) in [("A", Visibility::Public), ("B", Visibility::Private), ("C", Visibility::Public)] {
        f.catalog
            .create_recipe(&alice, draft(title, visibility, &[]))
            .await
            .expect("create");
    }
    f.catalog
        .update_profile(&alice, ProfileUpdate { display_name: Some("Alice A.".to_owned()), bio: None })
        .await
        .expect("update");

    let public = f.catalog.public_profile(&alice.uid).await.expect("profile");
    assert_eq!(public.display_name, "Alice A.");
    assert_eq!(public.public_recipes, 2);

    let listed = f
        .catalog
        .list_public_by(alice.uid.clone(), Pagination::default())
        .await
        .expect("list");
    let mut titles: Vec<&str> = listed.items.iter().map(|r| r.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["A", "C"]);
}

/// Document store whose writes start failing once `broken` is set.
#[derive(Default)]
struct BreakableStore {
    inner: MemoryDocumentStore,
    broken: AtomicBool,
}

impl BreakableStore {
    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("document write refused".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for BreakableStore {
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
        self.inner.get_recipe(id).await
    }
    async fn put_recipe(&self, recipe: Recipe) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_recipe(recipe).await
    }
    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete_recipe(id).await
    }
    async fn scan_recipes(&self, cursor: Option<ScanCursor>, limit: usize) -> Result<RecipeBatch, StoreError> {
        self.inner.scan_recipes(cursor, limit).await
    }
    async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, StoreError> {
        self.inner.get_profile(uid).await
    }
    async fn put_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_profile(profile).await
    }
}

#[tokio::test]
async fn failed_document_write_does_not_orphan_the_upload() {
    let store = Arc::new(BreakableStore::default());
    let objects = Arc::new(MemoryObjectStore::new());
    let catalog = RecipeCatalog::new(store.clone(), objects.clone()).with_max_upload_bytes(16);
    let alice = user("alice");

    let recipe = catalog
        .create_recipe(&alice, draft("Soup", Visibility::Public, &[]))
        .await
        .expect("create");
    catalog.profile(&alice).await.expect("profile");
    store.broken.store(true, Ordering::SeqCst);

    let image = catalog
        .set_recipe_image(&alice.uid, recipe.id, "image/png", Bytes::from_static(b"png"))
        .await;
    assert!(matches!(image, Err(StoreError::Backend(_))), "got {image:?}");
    let avatar = catalog.set_avatar(&alice, "image/jpeg", Bytes::from_static(b"jpg")).await;
    assert!(matches!(avatar, Err(StoreError::Backend(_))), "got {avatar:?}");

    assert!(objects.is_empty().await, "uploads must be removed when the document write fails");
    let stored = catalog.get_recipe(Some(&alice.uid), recipe.id).await.expect("get");
    assert!(stored.image.is_none());
}
