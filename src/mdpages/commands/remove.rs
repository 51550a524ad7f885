use crate::commands::helpers::resolve_or_active;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{MdPagesError, Result};
use crate::index::DocSelector;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    selector: Option<&DocSelector>,
) -> Result<CmdResult> {
    let id = resolve_or_active(session.store(), selector)?;
    let document = session
        .store()
        .get(&id)
        .cloned()
        .ok_or(MdPagesError::DocumentNotFound(id))?;
    let sole = session.store().len() == 1;

    session.remove(&id);

    let mut result = CmdResult::default();
    if sole {
        result.add_message(CmdMessage::info(format!(
            "'{}' is the only document; its content was cleared instead.",
            document.name
        )));
    } else {
        result.add_message(CmdMessage::success(format!("Removed '{}'", document.name)));
    }
    Ok(result.with_affected_documents(vec![document]))
}
