use crate::error::{MdPagesError, Result};
use crate::index::DocSelector;
use crate::store::{DocumentStore, StorageBackend};
use uuid::Uuid;

/// Resolve a selector, or fall back to the active document when none is given.
pub fn resolve_or_active<B: StorageBackend>(
    store: &DocumentStore<B>,
    selector: Option<&DocSelector>,
) -> Result<Uuid> {
    match selector {
        Some(selector) => resolve(store, selector),
        None => Ok(store.active_id()),
    }
}

pub fn resolve<B: StorageBackend>(store: &DocumentStore<B>, selector: &DocSelector) -> Result<Uuid> {
    selector.resolve(store.documents()).map_err(MdPagesError::Api)
}
