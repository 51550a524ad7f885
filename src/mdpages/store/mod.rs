//! # Storage Layer
//!
//! The store is split in two, the same way across every backend:
//!
//! 1. [`backend::StorageBackend`] handles the "how": raw, atomic reads and
//!    writes of whole values under logical keys.
//! 2. [`documents::DocumentStore`] handles the "what": the document collection,
//!    the active pointer, naming rules and migration from older layouts.
//!
//! ## Persisted Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `documents` | JSON array of `{id, name, content, lastSavedAt}` |
//! | `activeDocumentId` | JSON string, must resolve into `documents` |
//! | `sidebarOpen` | JSON bool (UI preference) |
//! | `content` | legacy: raw markup of the single pre-migration document |
//! | `lastSaved` | legacy: timestamp string of that document |
//!
//! Every mutation rewrites the whole value of one key. There are no partial
//! patches, so a failed write leaves the previous value intact.
//!
//! ## Recovery
//!
//! Loading never fails. Unreadable current data falls back to migrating the
//! legacy keys, and failing that to a freshly seeded document. Write failures
//! are kept as warnings and the in-memory state stays authoritative for the
//! rest of the session.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one `{key}.json` file per key in a data directory.
//! - [`mem_backend::MemBackend`]: in-memory maps for tests, with write-error
//!   simulation and write counters.

pub mod backend;
pub mod documents;
pub mod fs_backend;
#[cfg(any(test, feature = "test_utils"))]
pub mod mem_backend;
pub mod migration;

pub use backend::StorageBackend;
pub use documents::{DocumentStore, StoreWarning};
pub use fs_backend::FsBackend;
#[cfg(any(test, feature = "test_utils"))]
pub use mem_backend::MemBackend;

pub const KEY_DOCUMENTS: &str = "documents";
pub const KEY_ACTIVE_ID: &str = "activeDocumentId";
pub const KEY_SIDEBAR_OPEN: &str = "sidebarOpen";
pub const LEGACY_KEY_CONTENT: &str = "content";
pub const LEGACY_KEY_LAST_SAVED: &str = "lastSaved";
