use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{ObjectKey, RecipeId, UserId};
use crate::tags::normalize_tag;

/// Maximum length of a display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 80;
/// Maximum length of a profile bio, in characters.
pub const MAX_BIO_LEN: usize = 1_000;
/// Maximum number of tags in a user's vocabulary.
pub const MAX_PROFILE_TAGS: usize = 200;

/// Per-user state: public identity, tag vocabulary and favorites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub bio: String,
    /// Media-store key of the avatar image.
    pub avatar: Option<ObjectKey>,
    /// The user's tag vocabulary, in the order tags were first used.
    pub tags: IndexSet<String>,
    pub favorites: BTreeSet<RecipeId>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of the editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Profile {
    /// Create an empty profile.
    ///
    /// A blank `display_name` falls back to the uid.
    #[must_use]
    pub fn new(user_id: UserId, display_name: &str, now: DateTime<Utc>) -> Self {
        let display_name: String = display_name.trim().chars().take(MAX_DISPLAY_NAME_LEN).collect();
        let display_name = if display_name.is_empty() {
            user_id.as_str().chars().take(MAX_DISPLAY_NAME_LEN).collect()
        } else {
            display_name
        };
        Self {
            user_id,
            display_name,
            bio: String::new(),
            avatar: None,
            tags: IndexSet::new(),
            favorites: BTreeSet::new(),
            created_at: now,
        }
    }

    /// Apply a partial update. Fields left as `None` are unchanged.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidField`] if the display name is blank or
    /// too long, or the bio is too long. The profile is unchanged on error.
    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), CoreError> {
        let display_name = match update.display_name {
            Some(name) => {
                let name = name.trim().to_owned();
                if name.is_empty() {
                    return Err(CoreError::field("display_name", "display name is empty"));
                }
                if name.chars().count() > MAX_DISPLAY_NAME_LEN {
                    return Err(CoreError::field(
                        "display_name",
                        format!("longer than {MAX_DISPLAY_NAME_LEN} characters"),
                    ));
                }
                Some(name)
            }
            None => None,
        };
        let bio = match update.bio {
            Some(bio) => {
                let bio = bio.trim().to_owned();
                if bio.chars().count() > MAX_BIO_LEN {
                    return Err(CoreError::field("bio", format!("longer than {MAX_BIO_LEN} characters")));
                }
                Some(bio)
            }
            None => None,
        };

        if let Some(name) = display_name {
            self.display_name = name;
        }
        if let Some(bio) = bio {
            self.bio = bio;
        }
        Ok(())
    }

    /// Add a tag to the vocabulary. Returns `true` if it was not present.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTag`] if the tag cannot be normalized, or
    /// [`CoreError::LimitExceeded`] if the vocabulary is full.
    pub fn add_tag(&mut self, raw: &str) -> Result<bool, CoreError> {
        let tag = normalize_tag(raw)?;
        if self.tags.contains(&tag) {
            return Ok(false);
        }
        if self.tags.len() >= MAX_PROFILE_TAGS {
            return Err(CoreError::LimitExceeded { what: "profile tags", max: MAX_PROFILE_TAGS });
        }
        self.tags.insert(tag);
        Ok(true)
    }

    /// Remove a tag from the vocabulary. Returns `true` if it was present.
    ///
    /// Recipes already carrying the tag keep it.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTag`] if the tag cannot be normalized.
    pub fn remove_tag(&mut self, raw: &str) -> Result<bool, CoreError> {
        let tag = normalize_tag(raw)?;
        Ok(self.tags.shift_remove(&tag))
    }

    /// Add every already-normalized tag of a saved recipe to the vocabulary.
    ///
    /// Tags beyond [`MAX_PROFILE_TAGS`] are silently not recorded; the
    /// recipe itself keeps them. Returns the number of tags added.
    pub fn absorb_tags<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) -> usize {
        let mut added = 0;
        for tag in tags {
            if self.tags.len() >= MAX_PROFILE_TAGS {
                break;
            }
            if self.tags.insert(tag.clone()) {
                added += 1;
            }
        }
        added
    }

    /// Mark or unmark a recipe as a favorite. Returns `true` if the set changed.
    pub fn set_favorite(&mut self, id: RecipeId, on: bool) -> bool {
        if on {
            self.favorites.insert(id)
        } else {
            self.favorites.remove(&id)
        }
    }
}
