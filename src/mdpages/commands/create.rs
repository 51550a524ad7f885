use crate::commands::{CmdMessage, CmdResult};
use crate::error::{MdPagesError, Result};
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

/// Create a document and make it active. Blank names are auto-generated.
pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    name: Option<&str>,
    content: &str,
) -> Result<CmdResult> {
    let id = session.create(name, content);
    let document = session
        .store()
        .get(&id)
        .cloned()
        .ok_or(MdPagesError::DocumentNotFound(id))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Created '{}'", document.name)));
    Ok(result.with_affected_documents(vec![document]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;

    #[test]
    fn creates_and_activates() {
        let mut s = session();
        let result = run(&mut s, Some("Plan"), "# Plan").unwrap();
        let doc = &result.affected_documents[0];
        assert_eq!(doc.name, "Plan");
        assert_eq!(s.store().active_id(), doc.id);
    }

    #[test]
    fn blank_names_are_generated() {
        let mut s = session();
        let first = run(&mut s, None, "").unwrap();
        let second = run(&mut s, Some("   "), "").unwrap();
        // The seeded document already holds "Untitled".
        assert_eq!(first.affected_documents[0].name, "Untitled 2");
        assert_eq!(second.affected_documents[0].name, "Untitled 3");
    }
}
