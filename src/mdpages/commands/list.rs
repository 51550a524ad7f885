use crate::commands::CmdResult;
use crate::error::Result;
use crate::index::index_documents;
use crate::store::{DocumentStore, StorageBackend};

pub fn run<B: StorageBackend>(store: &DocumentStore<B>) -> Result<CmdResult> {
    let listed = index_documents(store.documents(), store.active_id());
    Ok(CmdResult::default().with_listed_documents(listed))
}
