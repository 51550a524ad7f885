use crate::commands::helpers::resolve_or_active;
use crate::commands::CmdResult;
use crate::error::{MdPagesError, Result};
use crate::index::DocSelector;
use crate::store::{DocumentStore, StorageBackend};

pub fn run<B: StorageBackend>(
    store: &DocumentStore<B>,
    selector: Option<&DocSelector>,
) -> Result<CmdResult> {
    let id = resolve_or_active(store, selector)?;
    let doc = store
        .get(&id)
        .cloned()
        .ok_or(MdPagesError::DocumentNotFound(id))?;
    Ok(CmdResult::default().with_affected_documents(vec![doc]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;

    #[test]
    fn shows_active_by_default() {
        let s = session();
        let result = run(s.store(), None).unwrap();
        assert_eq!(result.affected_documents[0].id, s.store().active_id());
    }
}
