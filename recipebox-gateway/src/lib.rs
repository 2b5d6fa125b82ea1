//! HTTP API gateway for RecipeBox.
//!
//! Exposes recipe CRUD, the filtered recipe listing, profiles with tag
//! vocabularies and favorites, and signed media delivery over the
//! backends in `recipebox-store`.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
