use super::backend::StorageBackend;
use super::migration;
use super::{
    KEY_ACTIVE_ID, KEY_DOCUMENTS, KEY_SIDEBAR_OPEN, LEGACY_KEY_CONTENT, LEGACY_KEY_LAST_SAVED,
};
use crate::model::{next_default_name, CurrentFormat, Document, LegacyRecord};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A non-fatal storage condition the UI should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// A write did not reach durable storage; memory still holds the data.
    WriteFailed { key: String, reason: String },
    /// Persisted data could not be used and was replaced.
    Recovered(String),
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreWarning::WriteFailed { key, reason } => {
                write!(f, "Could not save '{}' ({}); changes are kept in memory", key, reason)
            }
            StoreWarning::Recovered(reason) => write!(f, "Recovered store: {}", reason),
        }
    }
}

/// The in-memory document collection backed by a [`StorageBackend`].
///
/// Invariants:
/// - `documents` is never empty and every id is unique
/// - `active_id` always names a member of `documents`
pub struct DocumentStore<B: StorageBackend> {
    backend: B,
    documents: Vec<Document>,
    active_id: Uuid,
    sidebar_open: bool,
    warnings: Vec<StoreWarning>,
}

impl<B: StorageBackend> DocumentStore<B> {
    /// Load persisted state, migrating or seeding as needed. Never fails.
    pub fn load(backend: B) -> Self {
        let mut warnings = Vec::new();

        let current = match read_current(&backend) {
            Ok(Some(current)) => {
                discard_legacy(&backend);
                Some(current)
            }
            Ok(None) => None,
            Err(reason) => {
                log::warn!("{}", reason);
                warnings.push(StoreWarning::Recovered(reason));
                None
            }
        };

        let (format, needs_write) = match current {
            Some(format) => (format, false),
            None => match read_legacy(&backend) {
                Some(legacy) => {
                    log::info!("migrating legacy single-document layout");
                    (migration::migrate(legacy, Uuid::new_v4()), true)
                }
                None => {
                    log::debug!("no persisted documents, seeding");
                    (migration::seed(), true)
                }
            },
        };

        let active_id = migration::resolve_active(&format.documents, format.active_id);
        let sidebar_open = backend
            .read(KEY_SIDEBAR_OPEN)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(true);

        let mut store = Self {
            backend,
            documents: format.documents,
            active_id,
            sidebar_open,
            warnings,
        };

        if needs_write && store.persist_documents() {
            store.persist_active();
            // Legacy keys go only after the new layout is durable, so an
            // interrupted migration is retried rather than lost.
            discard_legacy(&store.backend);
        }
        store
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == *id)
    }

    pub fn position(&self, id: &Uuid) -> Option<usize> {
        self.documents.iter().position(|d| d.id == *id)
    }

    pub fn active_id(&self) -> Uuid {
        self.active_id
    }

    pub fn active(&self) -> &Document {
        self.get(&self.active_id)
            .unwrap_or_else(|| &self.documents[0])
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Drain warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Append a new document and persist. Blank names are auto-generated.
    pub fn create(&mut self, name: Option<&str>, content: &str) -> Uuid {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => next_default_name(self.documents.iter().map(|d| d.name.as_str())),
        };
        let document = Document::new(name, content);
        let id = document.id;
        self.documents.push(document);
        self.persist_documents();
        id
    }

    /// Replace content in memory only; persistence belongs to the autosave
    /// controller. Returns false for an unknown id.
    pub fn update(&mut self, id: &Uuid, content: &str) -> bool {
        match self.documents.iter_mut().find(|d| d.id == *id) {
            Some(doc) => {
                if doc.content != content {
                    doc.content = content.to_string();
                }
                true
            }
            None => false,
        }
    }

    /// Rename and persist. Blank input keeps the current name.
    pub fn rename(&mut self, id: &Uuid, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(doc) = self.documents.iter_mut().find(|d| d.id == *id) else {
            return false;
        };
        doc.name = trimmed.to_string();
        self.persist_documents();
        true
    }

    /// Duplicate a document right after its source and make it active.
    pub fn clone_document(&mut self, id: &Uuid) -> Option<Uuid> {
        let index = self.position(id)?;
        let source = &self.documents[index];
        let copy = Document::new(format!("{} (copy)", source.name), source.content.clone());
        let copy_id = copy.id;
        self.documents.insert(index + 1, copy);
        self.active_id = copy_id;
        if self.persist_documents() {
            self.persist_active();
        }
        Some(copy_id)
    }

    /// Remove a document. The sole remaining document is cleared instead.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        if self.documents.len() == 1 {
            let doc = &mut self.documents[0];
            doc.content.clear();
            doc.last_saved_at = None;
            self.persist_documents();
            return true;
        }

        self.documents.remove(index);
        let was_active = self.active_id == *id;
        if was_active {
            self.active_id = self.documents[index.saturating_sub(1)].id;
        }
        if self.persist_documents() && was_active {
            self.persist_active();
        }
        true
    }

    /// Point the session at another document. Unknown ids are ignored.
    pub fn set_active(&mut self, id: &Uuid) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_id = *id;
        self.persist_active();
        true
    }

    /// Persist the collection and stamp `id` as saved at `at`.
    /// The stamp is kept only if the write succeeds.
    pub fn commit(&mut self, id: &Uuid, at: DateTime<Utc>) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let previous = self.documents[index].last_saved_at.replace(at);
        if self.persist_documents() {
            true
        } else {
            self.documents[index].last_saved_at = previous;
            false
        }
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
        self.write_value(KEY_SIDEBAR_OPEN, &open.to_string());
    }

    /// Snapshot of the current layout.
    pub fn snapshot(&self) -> CurrentFormat {
        CurrentFormat {
            documents: self.documents.clone(),
            active_id: Some(self.active_id),
        }
    }

    /// Overwrite the whole `documents` value. Returns whether it was durable.
    pub fn persist_documents(&mut self) -> bool {
        match serde_json::to_string(&self.documents) {
            Ok(raw) => self.write_value(KEY_DOCUMENTS, &raw),
            Err(e) => {
                self.warn_write(KEY_DOCUMENTS, e.to_string());
                false
            }
        }
    }

    fn persist_active(&mut self) -> bool {
        match serde_json::to_string(&self.active_id) {
            Ok(raw) => self.write_value(KEY_ACTIVE_ID, &raw),
            Err(e) => {
                self.warn_write(KEY_ACTIVE_ID, e.to_string());
                false
            }
        }
    }

    fn write_value(&mut self, key: &str, value: &str) -> bool {
        match self.backend.write(key, value) {
            Ok(()) => true,
            Err(e) => {
                self.warn_write(key, e.to_string());
                false
            }
        }
    }

    fn warn_write(&mut self, key: &str, reason: String) {
        log::warn!("write to '{}' failed: {}", key, reason);
        self.warnings.push(StoreWarning::WriteFailed {
            key: key.to_string(),
            reason,
        });
    }
}

fn read_current<B: StorageBackend>(backend: &B) -> Result<Option<CurrentFormat>, String> {
    let raw = match backend.read(KEY_DOCUMENTS) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(None),
        Err(e) => return Err(format!("could not read documents: {}", e)),
    };
    let documents = migration::parse_documents(&raw).map_err(|e| e.to_string())?;
    let active_id = backend
        .read(KEY_ACTIVE_ID)
        .ok()
        .flatten()
        .and_then(|raw| migration::parse_active_id(&raw));
    Ok(Some(CurrentFormat {
        documents,
        active_id,
    }))
}

fn read_legacy<B: StorageBackend>(backend: &B) -> Option<LegacyRecord> {
    let content = match backend.read(LEGACY_KEY_CONTENT) {
        Ok(Some(raw)) => migration::decode_legacy_content(&raw),
        Ok(None) => return None,
        Err(e) => {
            log::warn!("legacy content unreadable: {}", e);
            return None;
        }
    };
    let last_saved = backend.read(LEGACY_KEY_LAST_SAVED).ok().flatten();
    Some(LegacyRecord {
        content,
        last_saved,
    })
}

fn discard_legacy<B: StorageBackend>(backend: &B) {
    for key in [LEGACY_KEY_CONTENT, LEGACY_KEY_LAST_SAVED] {
        if let Err(e) = backend.remove(key) {
            log::warn!("could not remove legacy key '{}': {}", key, e);
        }
    }
}
