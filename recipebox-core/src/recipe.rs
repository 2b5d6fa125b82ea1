use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{ObjectKey, RecipeId, UserId};
use crate::tags::{normalize_tags, MAX_RECIPE_TAGS};

/// Maximum length of a recipe title, in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length of free-form recipe notes, in characters.
pub const MAX_NOTES_LEN: usize = 10_000;
/// Maximum length of an external recipe URL.
pub const MAX_URL_LEN: usize = 2_048;

/// Who may see a recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Listed for everyone, including anonymous visitors.
    Public,
    /// Visible to the owner only.
    #[default]
    Private,
}

/// One line of a homemade recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// What to use, e.g. `"flour"`.
    pub name: String,
    /// Free-form amount, e.g. `"2 cups"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// The body of a recipe: either a pointer to an external page or a
/// structured homemade recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeContent {
    /// A recipe hosted elsewhere.
    Link {
        /// Absolute `http(s)` URL of the recipe page.
        url: String,
    },
    /// A recipe written by the user.
    Homemade {
        ingredients: Vec<Ingredient>,
        instructions: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        servings: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prep_minutes: Option<u32>,
    },
}

impl RecipeContent {
    /// Returns the kind discriminant of this content.
    #[must_use]
    pub fn kind(&self) -> RecipeKind {
        match self {
            Self::Link { .. } => RecipeKind::Link,
            Self::Homemade { .. } => RecipeKind::Homemade,
        }
    }

    fn validate(self) -> Result<Self, CoreError> {
        match self {
            Self::Link { url } => {
                let url = url.trim().to_owned();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(CoreError::field("url", "must start with http:// or https://"));
                }
                if url.len() > MAX_URL_LEN {
                    return Err(CoreError::field(
                        "url",
                        format!("longer than {MAX_URL_LEN} characters"),
                    ));
                }
                Ok(Self::Link { url })
            }
            Self::Homemade { ingredients, instructions, servings, prep_minutes } => {
                let ingredients: Vec<Ingredient> = ingredients
                    .into_iter()
                    .map(|i| Ingredient {
                        name: i.name.trim().to_owned(),
                        quantity: i
                            .quantity
                            .map(|q| q.trim().to_owned())
                            .filter(|q| !q.is_empty()),
                    })
                    .collect();
                if ingredients.is_empty() {
                    return Err(CoreError::field("ingredients", "at least one ingredient is required"));
                }
                if ingredients.iter().any(|i| i.name.is_empty()) {
                    return Err(CoreError::field("ingredients", "ingredient name is empty"));
                }

                let instructions: Vec<String> = instructions
                    .into_iter()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect();
                if instructions.is_empty() {
                    return Err(CoreError::field("instructions", "at least one step is required"));
                }

                if servings == Some(0) {
                    return Err(CoreError::field("servings", "must be at least 1"));
                }

                Ok(Self::Homemade { ingredients, instructions, servings, prep_minutes })
            }
        }
    }
}

/// Discriminant of [`RecipeContent`], used as a listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    Link,
    Homemade,
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link => f.write_str("link"),
            Self::Homemade => f.write_str("homemade"),
        }
    }
}

/// The client-editable part of a recipe.
///
/// Used as the body of both create and full-update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub vegetarian: bool,
    pub content: RecipeContent,
}

impl RecipeDraft {
    /// Normalize and check every field of the draft.
    ///
    /// On success the returned draft has trimmed text, normalized sorted
    /// tags and cleaned-up content.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidField`] or [`CoreError::InvalidTag`] for the
    /// first offending field, or [`CoreError::LimitExceeded`] when there are
    /// more than [`MAX_RECIPE_TAGS`] distinct tags.
    pub fn validate(self) -> Result<Self, CoreError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(CoreError::field("title", "title is empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(CoreError::field("title", format!("longer than {MAX_TITLE_LEN} characters")));
        }

        let notes = self.notes.trim().to_owned();
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(CoreError::field("notes", format!("longer than {MAX_NOTES_LEN} characters")));
        }

        let tags = normalize_tags(&self.tags)?;
        if tags.len() > MAX_RECIPE_TAGS {
            return Err(CoreError::LimitExceeded { what: "tags", max: MAX_RECIPE_TAGS });
        }

        Ok(Self {
            title,
            notes,
            tags: tags.into_iter().collect(),
            visibility: self.visibility,
            vegetarian: self.vegetarian,
            content: self.content.validate()?,
        })
    }
}

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner: UserId,
    pub title: String,
    pub notes: String,
    pub tags: BTreeSet<String>,
    pub visibility: Visibility,
    pub vegetarian: bool,
    pub content: RecipeContent,
    /// Media-store key of the cover image, if one was uploaded.
    pub image: Option<ObjectKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Build a new recipe owned by `owner` from a client draft.
    ///
    /// # Errors
    /// Returns any validation error from [`RecipeDraft::validate`].
    pub fn create(owner: UserId, draft: RecipeDraft, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let draft = draft.validate()?;
        Ok(Self {
            id: RecipeId::new(),
            owner,
            title: draft.title,
            notes: draft.notes,
            tags: draft.tags.into_iter().collect(),
            visibility: draft.visibility,
            vegetarian: draft.vegetarian,
            content: draft.content,
            image: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace every client-editable field with the contents of `draft`.
    ///
    /// Identity, ownership, image and creation time are left untouched.
    ///
    /// # Errors
    /// Returns any validation error from [`RecipeDraft::validate`]; the
    /// recipe is unchanged in that case.
    pub fn apply(&mut self, draft: RecipeDraft, now: DateTime<Utc>) -> Result<(), CoreError> {
        let draft = draft.validate()?;
        self.title = draft.title;
        self.notes = draft.notes;
        self.tags = draft.tags.into_iter().collect();
        self.visibility = draft.visibility;
        self.vegetarian = draft.vegetarian;
        self.content = draft.content;
        self.updated_at = now;
        Ok(())
    }

    /// Returns the kind of this recipe's content.
    #[must_use]
    pub fn kind(&self) -> RecipeKind {
        self.content.kind()
    }

    /// Returns `true` if `viewer` owns this recipe.
    #[must_use]
    pub fn is_owned_by(&self, viewer: Option<&UserId>) -> bool {
        viewer == Some(&self.owner)
    }

    /// Public recipes are visible to everyone, private ones to the owner only.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.visibility == Visibility::Public || self.is_owned_by(viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.to_owned(),
            notes: String::new(),
            tags: vec![],
            visibility: Visibility::Public,
            vegetarian: false,
            content: RecipeContent::Link { url: "https://example.com/pie".to_owned() },
        }
    }

    #[test]
    fn validate_trims_title_and_normalizes_tags() {
        let mut draft = link_draft("  Apple Pie  ");
        draft.tags = vec!["Dessert".to_owned(), "dessert".to_owned(), "Fall".to_owned()];
        let draft = match draft.validate() {
            Ok(d) => d,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(draft.title, "Apple Pie");
        assert_eq!(draft.tags, vec!["dessert", "fall"]);
    }

    #[test]
    fn validate_rejects_blank_title_and_bad_url() {
        assert!(matches!(
            link_draft("   ").validate(),
            Err(CoreError::InvalidField { field: "title", .. })
        ));

        let mut draft = link_draft("Pie");
        draft.content = RecipeContent::Link { url: "ftp://example.com".to_owned() };
        assert!(matches!(draft.validate(), Err(CoreError::InvalidField { field: "url", .. })));
    }

    #[test]
    fn validate_rejects_too_many_tags() {
        let mut draft = link_draft("Pie");
        draft.tags = (0..=MAX_RECIPE_TAGS).map(|i| format!("tag{i}")).collect();
        assert!(matches!(draft.validate(), Err(CoreError::LimitExceeded { what: "tags", .. })));
    }

    #[test]
    fn homemade_validation_drops_blank_steps_and_requires_ingredients() {
        let mut draft = link_draft("Toast");
        draft.content = RecipeContent::Homemade {
            ingredients: vec![Ingredient { name: " bread ".to_owned(), quantity: Some(" ".to_owned()) }],
            instructions: vec!["toast it".to_owned(), "  ".to_owned()],
            servings: Some(1),
            prep_minutes: None,
        };
        let draft = match draft.validate() {
            Ok(d) => d,
            Err(e) => panic!("unexpected error: {e}"),
        };
        match draft.content {
            RecipeContent::Homemade { ingredients, instructions, .. } => {
                assert_eq!(ingredients[0].name, "bread");
                assert!(ingredients[0].quantity.is_none(), "blank quantity must be dropped");
                assert_eq!(instructions, vec!["toast it"]);
            }
            other => panic!("expected homemade content, got {other:?}"),
        }

        let mut empty = link_draft("Nothing");
        empty.content = RecipeContent::Homemade {
            ingredients: vec![],
            instructions: vec!["wait".to_owned()],
            servings: None,
            prep_minutes: None,
        };
        assert!(matches!(
            empty.validate(),
            Err(CoreError::InvalidField { field: "ingredients", .. })
        ));
    }

    #[test]
    fn apply_keeps_identity_and_creation_time() {
        let created = Utc::now();
        let mut recipe = match Recipe::create(UserId::new("alice"), link_draft("Pie"), created) {
            Ok(r) => r,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let id = recipe.id;
        let later = created + chrono::Duration::minutes(5);

        let mut draft = link_draft("Better Pie");
        draft.visibility = Visibility::Private;
        assert!(recipe.apply(draft, later).is_ok());

        assert_eq!(recipe.id, id);
        assert_eq!(recipe.title, "Better Pie");
        assert_eq!(recipe.visibility, Visibility::Private);
        assert_eq!(recipe.created_at, created);
        assert_eq!(recipe.updated_at, later);
    }

    #[test]
    fn private_recipe_is_visible_only_to_owner() {
        let mut draft = link_draft("Secret");
        draft.visibility = Visibility::Private;
        let recipe = match Recipe::create(UserId::new("alice"), draft, Utc::now()) {
            Ok(r) => r,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert!(recipe.is_visible_to(Some(&UserId::new("alice"))));
        assert!(!recipe.is_visible_to(Some(&UserId::new("bob"))));
        assert!(!recipe.is_visible_to(None));
    }

    #[test]
    fn content_serializes_with_kind_tag() {
        let content = RecipeContent::Link { url: "https://example.com".to_owned() };
        let json = match serde_json::to_value(&content) {
            Ok(v) => v,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json["kind"], "link");
        assert_eq!(json["url"], "https://example.com");
    }
}
