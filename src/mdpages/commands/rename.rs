use crate::commands::helpers::resolve;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::DocSelector;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    selector: &DocSelector,
    name: &str,
) -> Result<CmdResult> {
    let id = resolve(session.store(), selector)?;
    let mut result = CmdResult::default();

    if !session.rename(&id, name) {
        result.add_message(CmdMessage::info("Name is blank; keeping the current name."));
        return Ok(result);
    }

    if let Some(doc) = session.store().get(&id).cloned() {
        result.add_message(CmdMessage::success(format!("Renamed to '{}'", doc.name)));
        result = result.with_affected_documents(vec![doc]);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;

    #[test]
    fn trims_new_name() {
        let mut s = session();
        let result = run(&mut s, &DocSelector::Index(1), "  Notes  ").unwrap();
        assert_eq!(result.affected_documents[0].name, "Notes");
    }

    #[test]
    fn blank_name_is_a_no_op() {
        let mut s = session();
        let before = s.store().active().name.clone();
        let result = run(&mut s, &DocSelector::Index(1), "   ").unwrap();
        assert!(result.affected_documents.is_empty());
        assert_eq!(s.store().active().name, before);
    }

    #[test]
    fn unknown_document_is_an_error() {
        let mut s = session();
        assert!(run(&mut s, &DocSelector::Index(9), "x").is_err());
    }
}
