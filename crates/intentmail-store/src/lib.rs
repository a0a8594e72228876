//! # intentmail Store
//!
//! Local persistence for intentmail identities: key material, the intent
//! directory, contacts, and configuration.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use intentmail_core::KeyMaterial;
//! use intentmail_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("intentmail.db").unwrap();
//!
//!     let keys = KeyMaterial::generate().unwrap();
//!     store.save_key_material("alice", &keys.to_stored()).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - Key material is kept as standard base64 of the raw key bytes.
//! - A missing intent directory loads as `None`; [`StoreExt`] substitutes the
//!   default directory holding only `chat`.
//! - Contacts are checked on save and load: the fingerprint must belong to
//!   the agreement key.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
