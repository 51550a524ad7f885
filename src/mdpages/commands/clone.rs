use crate::commands::helpers::resolve_or_active;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{MdPagesError, Result};
use crate::index::DocSelector;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

/// Duplicate a document (the active one by default); the copy becomes active.
pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    selector: Option<&DocSelector>,
) -> Result<CmdResult> {
    let source = resolve_or_active(session.store(), selector)?;
    if source != session.store().active_id() {
        session.switch_to(&source);
    }
    let copy_id = session
        .clone_active()
        .ok_or(MdPagesError::DocumentNotFound(source))?;
    let copy = session
        .store()
        .get(&copy_id)
        .cloned()
        .ok_or(MdPagesError::DocumentNotFound(copy_id))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Created '{}'", copy.name)));
    Ok(result.with_affected_documents(vec![copy]))
}
