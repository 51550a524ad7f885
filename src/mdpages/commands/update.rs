use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

/// Replace the active document's content and save it right away.
pub fn run<B: StorageBackend, C: Clock>(session: &mut Session<B, C>, content: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if session.store().active().content == content {
        result.add_message(CmdMessage::info("No changes."));
        return Ok(result);
    }

    session.edit(content);
    let saved = session.flush().is_some();
    let doc = session.store().active().clone();
    if saved {
        result.add_message(CmdMessage::success(format!("Saved '{}'", doc.name)));
    }
    Ok(result.with_affected_documents(vec![doc]))
}
