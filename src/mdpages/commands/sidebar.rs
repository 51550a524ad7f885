use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::session::{Clock, Session};
use crate::store::StorageBackend;

/// Show or set the persisted document-list visibility preference.
pub fn run<B: StorageBackend, C: Clock>(
    session: &mut Session<B, C>,
    open: Option<bool>,
) -> Result<CmdResult> {
    let store = session.store_mut();
    if let Some(open) = open {
        store.set_sidebar_open(open);
    }
    let state = if store.sidebar_open() { "open" } else { "closed" };

    let mut result = CmdResult::default();
    match open {
        Some(_) => result.add_message(CmdMessage::success(format!("Sidebar {}", state))),
        None => result.add_message(CmdMessage::info(state)),
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;
    use crate::store::KEY_SIDEBAR_OPEN;

    #[test]
    fn defaults_to_open() {
        let mut s = session();
        let result = run(&mut s, None).unwrap();
        assert_eq!(result.messages[0].content, "open");
    }

    #[test]
    fn persists_new_state() {
        let mut s = session();
        run(&mut s, Some(false)).unwrap();
        assert!(!s.store().sidebar_open());
        assert_eq!(
            s.store().backend().raw(KEY_SIDEBAR_OPEN).as_deref(),
            Some("false")
        );
    }
}
