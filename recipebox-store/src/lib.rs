//! Storage, identity and media backends for RecipeBox.
//!
//! Defines the backend traits the service is written against, in-memory
//! and HTTP implementations of them, signed media URLs, and the
//! batch-scanning listing engine.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod listing;
pub mod memory;
pub mod signer;

pub use backend::{
    DocumentStore, Identity, IdentityProvider, ObjectStore, RecipeBatch, ScanCursor, StoredObject,
};
pub use catalog::{PublicProfile, RecipeCatalog, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::StoreError;
pub use identity::{RemoteIdentityProvider, SharedSecretIdentity};
pub use listing::{list_recipes, list_recipes_batched, SCAN_BATCH_SIZE};
pub use memory::{MemoryDocumentStore, MemoryObjectStore};
pub use signer::UrlSigner;
