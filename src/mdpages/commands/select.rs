use crate::commands::helpers::resolve;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::DocSelector;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

/// Make another document active.
pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    selector: &DocSelector,
) -> Result<CmdResult> {
    let id = resolve(session.store(), selector)?;
    session.switch_to(&id);
    let doc = session.store().active().clone();

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Now editing '{}'", doc.name)));
    Ok(result.with_affected_documents(vec![doc]))
}
