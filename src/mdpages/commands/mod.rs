use crate::config::MdPagesConfig;
use crate::index::DisplayDocument;
use crate::model::Document;
use crate::store::{DocumentStore, StorageBackend};
use std::path::PathBuf;

pub mod clone;
pub mod config;
pub mod create;
pub mod export;
pub mod helpers;
pub mod list;
pub mod preview;
pub mod remove;
pub mod rename;
pub mod select;
pub mod sidebar;
pub mod update;
pub mod view;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_documents: Vec<Document>,
    pub listed_documents: Vec<DisplayDocument>,
    pub html: Option<String>,
    pub output_paths: Vec<PathBuf>,
    pub config: Option<MdPagesConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_documents(mut self, documents: Vec<Document>) -> Self {
        self.affected_documents = documents;
        self
    }

    pub fn with_listed_documents(mut self, documents: Vec<DisplayDocument>) -> Self {
        self.listed_documents = documents;
        self
    }

    pub fn with_html(mut self, html: String) -> Self {
        self.html = Some(html);
        self
    }

    pub fn with_output_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.output_paths = paths;
        self
    }

    pub fn with_config(mut self, config: MdPagesConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Surface store warnings (failed writes, recovered data) as messages.
    pub fn with_store_warnings<B: StorageBackend>(mut self, store: &mut DocumentStore<B>) -> Self {
        for warning in store.take_warnings() {
            self.messages.push(CmdMessage::warning(warning.to_string()));
        }
        self
    }
}
