//! Core types for the RecipeBox recipe-keeping service.
//!
//! Defines recipes, user profiles, tag normalization, and the listing
//! filter contract shared by the store and the HTTP gateway.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod id;
pub mod profile;
pub mod query;
pub mod recipe;
pub mod sample;
pub mod tags;

pub use error::CoreError;
pub use id::{ObjectKey, RecipeId, UserId};
pub use profile::{Profile, ProfileUpdate};
pub use query::{OwnerScope, Page, Pagination, RecipeFilter, RecipeQuery, Scope};
pub use recipe::{Ingredient, Recipe, RecipeContent, RecipeDraft, RecipeKind, Visibility};
