use crate::commands::{CmdMessage, CmdResult};
use crate::config::MdPagesConfig;
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(config_dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    match action {
        ConfigAction::ShowAll => {
            let config = MdPagesConfig::load(config_dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = MdPagesConfig::load(config_dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => result.add_message(CmdMessage::error(format!("Unknown config key: {}", key))),
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = MdPagesConfig::load(config_dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e.to_string()));
                return Ok(res);
            }
            config.save(config_dir)?;
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, display_val)));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;

    #[test]
    fn set_then_show_key() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), ConfigAction::Set("page-format".into(), "a5".into())).unwrap();
        let result = run(dir.path(), ConfigAction::ShowKey("page-format".into())).unwrap();
        assert_eq!(result.messages[0].content, "a5");
    }

    #[test]
    fn invalid_value_is_reported_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::Set("jpeg-quality".into(), "500".into())).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Error);
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn unknown_key_is_an_error_message() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::ShowKey("colour".into())).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Error);
    }
}
