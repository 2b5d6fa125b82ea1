//! The recipe listing contract.
//!
//! [`RecipeQuery`] is what a caller asks for; [`RecipeQuery::resolve`] binds
//! it to the caller's identity and favorites, producing a [`RecipeFilter`]
//! whose [`RecipeFilter::matches`] is the single inclusion predicate used by
//! the scanning engine. Pagination is applied to the filtered sequence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{RecipeId, UserId};
use crate::recipe::{Recipe, RecipeKind, Visibility};

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which recipes a listing may draw from, relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Public recipes of any owner.
    Public,
    /// The caller's own private recipes.
    Private,
    /// Public recipes plus everything the caller owns.
    All,
}

/// Restricts a listing to one owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerScope {
    /// The authenticated caller.
    Me,
    /// A specific user.
    User(UserId),
}

/// A caller's listing request before it is bound to an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    /// Defaults to [`Scope::All`] for signed-in callers and
    /// [`Scope::Public`] for anonymous ones.
    pub scope: Option<Scope>,
    pub owner: Option<OwnerScope>,
    /// Case-insensitive substring of title or notes.
    pub search: Option<String>,
    /// Normalized tags; a recipe must carry all of them.
    pub tags: BTreeSet<String>,
    pub kind: Option<RecipeKind>,
    /// `Some(true)` keeps vegetarian recipes only, `Some(false)` the rest.
    pub vegetarian: Option<bool>,
    pub favorites_only: bool,
}

impl RecipeQuery {
    /// Bind the query to a caller.
    ///
    /// `favorites` is the caller's favorite set; it is only consulted when
    /// [`RecipeQuery::favorites_only`] is set.
    ///
    /// Anonymous callers may only reach the public scope: an unspecified or
    /// `all` scope is narrowed to `public`.
    ///
    /// # Errors
    /// Returns [`CoreError::SignInRequired`] when an anonymous caller asks
    /// for the private scope, `owner=me`, or favorites.
    pub fn resolve(
        self,
        viewer: Option<&UserId>,
        favorites: &BTreeSet<RecipeId>,
    ) -> Result<RecipeFilter, CoreError> {
        let scope = match (viewer, self.scope) {
            (Some(_), Some(scope)) => scope,
            (Some(_), None) => Scope::All,
            (None, None | Some(Scope::Public | Scope::All)) => Scope::Public,
            (None, Some(Scope::Private)) => {
                return Err(CoreError::SignInRequired("private recipes"));
            }
        };

        let owner = match self.owner {
            None => None,
            Some(OwnerScope::User(uid)) => Some(uid),
            Some(OwnerScope::Me) => match viewer {
                Some(me) => Some(me.clone()),
                None => return Err(CoreError::SignInRequired("owner=me")),
            },
        };

        let favorites = if self.favorites_only {
            if viewer.is_none() {
                return Err(CoreError::SignInRequired("favorites"));
            }
            Some(favorites.clone())
        } else {
            None
        };

        let search = self
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(RecipeFilter {
            viewer: viewer.cloned(),
            scope,
            owner,
            search,
            tags: self.tags,
            kind: self.kind,
            vegetarian: self.vegetarian,
            favorites,
        })
    }
}

/// A fully resolved listing predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub viewer: Option<UserId>,
    pub scope: Scope,
    pub owner: Option<UserId>,
    /// Already lowercased; `None` when the search was empty.
    pub search: Option<String>,
    pub tags: BTreeSet<String>,
    pub kind: Option<RecipeKind>,
    pub vegetarian: Option<bool>,
    /// `Some` only for favorites-only listings.
    pub favorites: Option<BTreeSet<RecipeId>>,
}

impl RecipeFilter {
    /// A filter over public recipes of one owner, as shown on profile pages.
    #[must_use]
    pub fn public_by(owner: UserId) -> Self {
        Self {
            viewer: None,
            scope: Scope::Public,
            owner: Some(owner),
            search: None,
            tags: BTreeSet::new(),
            kind: None,
            vegetarian: None,
            favorites: None,
        }
    }

    /// Returns `true` if no recipe can possibly match, so scanning can be
    /// skipped entirely.
    #[must_use]
    pub fn is_trivially_empty(&self) -> bool {
        matches!(&self.favorites, Some(f) if f.is_empty())
    }

    /// Returns `true` if `recipe` satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let owned = recipe.is_owned_by(self.viewer.as_ref());
        let in_scope = match self.scope {
            Scope::Public => recipe.visibility == Visibility::Public,
            Scope::Private => recipe.visibility == Visibility::Private && owned,
            Scope::All => recipe.visibility == Visibility::Public || owned,
        };
        if !in_scope {
            return false;
        }

        if let Some(owner) = &self.owner {
            if &recipe.owner != owner {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if recipe.kind() != kind {
                return false;
            }
        }
        if let Some(vegetarian) = self.vegetarian {
            if recipe.vegetarian != vegetarian {
                return false;
            }
        }
        if let Some(favorites) = &self.favorites {
            if !favorites.contains(&recipe.id) {
                return false;
            }
        }
        if !self.tags.is_subset(&recipe.tags) {
            return false;
        }
        match &self.search {
            Some(term) => {
                recipe.title.to_lowercase().contains(term.as_str())
                    || recipe.notes.to_lowercase().contains(term.as_str())
            }
            None => true,
        }
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Normalize raw page parameters.
    ///
    /// A missing or zero `page` becomes 1; `page_size` defaults to
    /// [`DEFAULT_PAGE_SIZE`] and is clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of matching records that precede this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_sub(1).saturating_mul(self.page_size as usize)
    }

    /// Maximum number of records on this page.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records matching the filter, across all pages.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// An empty page with a total of zero.
    #[must_use]
    pub fn empty(pagination: Pagination) -> Self {
        Self { items: Vec::new(), total: 0, page: pagination.page, page_size: pagination.page_size }
    }

    /// Transform the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
