//! # Render Pipeline
//!
//! Turns document markup into a [`VisualTree`] in two phases:
//!
//! 1. **Structure** (synchronous): markdown is parsed and every block-level unit
//!    becomes a [`Block`]. Code fences in a diagram language become
//!    placeholders tagged `diagram-{pass}-{index}`, where `pass` comes from a
//!    process-wide counter so two passes never hand out the same id.
//! 2. **Resolution** (asynchronous): each placeholder is sent to the
//!    [`DiagramRenderer`]; results are joined and substituted in place.
//!
//! The tree is only final once phase 2 is done. Callers that have no executor
//! use [`RenderPipeline::render_blocking`].

pub mod builder;
pub mod diagram;
pub mod highlight;
pub mod html;
pub mod tree;

pub use diagram::{resolve_diagrams, CommandDiagramRenderer, DiagramRenderer, NoDiagramEngine};
pub use highlight::{Highlighter, PlainHighlighter, SyntectHighlighter};
pub use tree::{Block, Diagram, DiagramImage, DiagramState, ImageEncoding, Inline, VisualTree};

use builder::TreeBuilder;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_DIAGRAM_LANGUAGE: &str = "mermaid";

static RENDER_PASS: AtomicU64 = AtomicU64::new(1);

fn next_pass() -> u64 {
    RENDER_PASS.fetch_add(1, Ordering::Relaxed)
}

pub struct RenderPipeline {
    diagram_languages: Vec<String>,
    highlighter: Box<dyn Highlighter>,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(vec![DEFAULT_DIAGRAM_LANGUAGE.to_string()])
    }
}

impl RenderPipeline {
    pub fn new(diagram_languages: Vec<String>) -> Self {
        Self {
            diagram_languages,
            highlighter: Box::new(SyntectHighlighter),
        }
    }

    pub fn with_highlighter(mut self, highlighter: Box<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn diagram_languages(&self) -> &[String] {
        &self.diagram_languages
    }

    /// CSS for highlighted code blocks.
    pub fn stylesheet(&self) -> Option<String> {
        self.highlighter.stylesheet()
    }

    /// Structural pass only. Diagrams are left `Pending`.
    pub fn structure(&self, markup: &str) -> VisualTree {
        let pass = next_pass();
        let tree =
            TreeBuilder::new(pass, self.highlighter.as_ref(), &self.diagram_languages).build(markup);
        log::debug!("render pass {}: {} block(s)", pass, tree.blocks.len());
        tree
    }

    pub async fn render<R>(&self, markup: &str, renderer: &R) -> VisualTree
    where
        R: DiagramRenderer + ?Sized,
    {
        let tree = self.structure(markup);
        resolve_diagrams(tree, renderer).await
    }

    pub fn render_blocking<R>(&self, markup: &str, renderer: &R) -> VisualTree
    where
        R: DiagramRenderer + ?Sized,
    {
        futures::executor::block_on(self.render(markup, renderer))
    }
}

#[cfg(test)]
mod tests {
    use super::diagram::fixtures::FakeEngine;
    use super::*;

    #[test]
    fn code_fences_are_highlighted_by_default() {
        let tree = RenderPipeline::default().structure("```python\nprint('hi')\n```\n\n```nope\n<x>\n```");
        let html = tree.to_html();
        assert!(html.contains("hl-python"), "{}", html);
        assert!(html.contains("&lt;x&gt;"));
        assert!(RenderPipeline::default().stylesheet().is_some());
    }

    #[test]
    fn passes_never_share_diagram_ids() {
        let pipeline = RenderPipeline::default();
        let markup = "```mermaid\ngraph TD\n```";
        let a = pipeline.structure(markup);
        let b = pipeline.structure(markup);
        assert_ne!(a.pass, b.pass);
        let id_a = &a.diagrams().next().unwrap().instance_id;
        let id_b = &b.diagrams().next().unwrap().instance_id;
        assert_ne!(id_a, id_b);
        assert_eq!(id_a, &format!("diagram-{}-0", a.pass));
    }

    #[test]
    fn malformed_diagram_does_not_break_surrounding_content() {
        let markup = "First paragraph.\n\n```mermaid\nbad graph\n```\n\nSecond paragraph.";
        let tree = RenderPipeline::default().render_blocking(markup, &FakeEngine);

        assert!(tree.is_final());
        assert_eq!(tree.blocks.len(), 3);
        assert!(matches!(tree.blocks[0], Block::Paragraph { .. }));
        assert!(matches!(tree.blocks[2], Block::Paragraph { .. }));

        let html = tree.to_html();
        assert!(html.contains("<p>First paragraph.</p>"));
        assert!(html.contains("<p>Second paragraph.</p>"));
        assert!(html.contains("diagram-source"));
        assert!(html.contains("bad graph"));
    }

    #[test]
    fn configured_languages_decide_what_is_a_diagram() {
        let pipeline = RenderPipeline::new(vec!["dot".to_string()]);
        let tree = pipeline.structure("```mermaid\ngraph\n```\n\n```dot\ndigraph {}\n```");
        assert!(matches!(tree.blocks[0], Block::CodeBlock { .. }));
        assert!(matches!(tree.blocks[1], Block::Diagram(_)));
    }

    #[test]
    fn empty_markup_is_an_empty_final_tree() {
        let tree = RenderPipeline::default().render_blocking("", &NoDiagramEngine);
        assert!(tree.is_empty());
        assert!(tree.is_final());
    }
}
