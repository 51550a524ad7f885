//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every mdpages operation, whatever the UI.
//!
//! It:
//! - **Dispatches** to the matching command in `commands/*.rs`
//! - **Normalizes inputs** (display numbers and id prefixes become selectors)
//! - **Returns structured types** (`Result<CmdResult>`)
//! - **Surfaces store warnings** as `Warning` messages on every result
//!
//! It never prints, and holds no business logic of its own.
//!
//! `MdPagesApi<B, C>` is generic over the storage backend and the clock, so the
//! whole stack runs against `MemBackend` and `ManualClock` in tests.

use crate::commands;
use crate::config::MdPagesConfig;
use crate::error::{MdPagesError, Result};
use crate::export::Exporter;
use crate::index::DocSelector;
use crate::render::{CommandDiagramRenderer, DiagramRenderer, NoDiagramEngine, RenderPipeline};
use crate::session::{Clock, Session};
use crate::store::{DocumentStore, StorageBackend};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct MdPagesApi<B: StorageBackend, C: Clock> {
    session: Session<B, C>,
    config_dir: PathBuf,
    pipeline: RenderPipeline,
    renderer: Box<dyn DiagramRenderer>,
    exporter: Exporter,
}

impl<B: StorageBackend, C: Clock> MdPagesApi<B, C> {
    /// Load the store from `backend` and wire everything from `config`.
    pub fn new(backend: B, clock: C, config: &MdPagesConfig, config_dir: PathBuf) -> Self {
        let store = DocumentStore::load(backend);
        let session = Session::with_delays(
            store,
            clock,
            config.autosave_delay_ms,
            config.preview_delay_ms,
        );
        let renderer: Box<dyn DiagramRenderer> = match &config.diagram_command {
            Some(command) => Box::new(CommandDiagramRenderer::new(command.clone())),
            None => Box::new(NoDiagramEngine),
        };
        let exporter = Exporter::new(config.export_settings(), config.assembler());
        Self {
            session,
            config_dir,
            pipeline: RenderPipeline::new(config.diagram_languages.clone()),
            renderer,
            exporter,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn DiagramRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn session(&self) -> &Session<B, C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<B, C> {
        &mut self.session
    }

    pub fn list_documents(&mut self) -> Result<commands::CmdResult> {
        let result = commands::list::run(self.session.store())?;
        Ok(self.finish(result))
    }

    pub fn create_document(&mut self, name: Option<&str>, content: &str) -> Result<commands::CmdResult> {
        let result = commands::create::run(&mut self.session, name, content)?;
        Ok(self.finish(result))
    }

    pub fn rename_document(&mut self, selector: &str, name: &str) -> Result<commands::CmdResult> {
        let selector = parse_selector(selector)?;
        let result = commands::rename::run(&mut self.session, &selector, name)?;
        Ok(self.finish(result))
    }

    pub fn clone_document(&mut self, selector: Option<&str>) -> Result<commands::CmdResult> {
        let selector = parse_optional(selector)?;
        let result = commands::clone::run(&mut self.session, selector.as_ref())?;
        Ok(self.finish(result))
    }

    pub fn remove_document(&mut self, selector: Option<&str>) -> Result<commands::CmdResult> {
        let selector = parse_optional(selector)?;
        let result = commands::remove::run(&mut self.session, selector.as_ref())?;
        Ok(self.finish(result))
    }

    pub fn select_document(&mut self, selector: &str) -> Result<commands::CmdResult> {
        let selector = parse_selector(selector)?;
        let result = commands::select::run(&mut self.session, &selector)?;
        Ok(self.finish(result))
    }

    /// Replace the active document's content and save it.
    pub fn update_active(&mut self, content: &str) -> Result<commands::CmdResult> {
        let result = commands::update::run(&mut self.session, content)?;
        Ok(self.finish(result))
    }

    pub fn view_document(&mut self, selector: Option<&str>) -> Result<commands::CmdResult> {
        let selector = parse_optional(selector)?;
        let result = commands::view::run(self.session.store(), selector.as_ref())?;
        Ok(self.finish(result))
    }

    pub fn preview_document(&mut self, selector: Option<&str>) -> Result<commands::CmdResult> {
        let selector = parse_optional(selector)?;
        let result = commands::preview::run(
            self.session.store(),
            &self.pipeline,
            self.renderer.as_ref(),
            selector.as_ref(),
        )?;
        Ok(self.finish(result))
    }

    pub fn export_document(&mut self, selector: Option<&str>, out_dir: &Path) -> Result<commands::CmdResult> {
        let selector = parse_optional(selector)?;
        let result = commands::export::run(
            self.session.store(),
            &self.pipeline,
            self.renderer.as_ref(),
            &self.exporter,
            selector.as_ref(),
            out_dir,
        )?;
        Ok(self.finish(result))
    }

    pub fn sidebar(&mut self, open: Option<bool>) -> Result<commands::CmdResult> {
        let result = commands::sidebar::run(&mut self.session, open)?;
        Ok(self.finish(result))
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.config_dir, action)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Commit pending edits; call before the process exits.
    pub fn shutdown(&mut self) -> Vec<commands::CmdMessage> {
        self.session.flush();
        self.finish(commands::CmdResult::default()).messages
    }

    fn finish(&mut self, result: commands::CmdResult) -> commands::CmdResult {
        result.with_store_warnings(self.session.store_mut())
    }
}

fn parse_selector(input: &str) -> Result<DocSelector> {
    DocSelector::from_str(input).map_err(MdPagesError::Api)
}

fn parse_optional(input: Option<&str>) -> Result<Option<DocSelector>> {
    input.map(parse_selector).transpose()
}

pub use crate::commands::config::ConfigAction;
pub use commands::{CmdMessage, CmdResult, MessageLevel};
