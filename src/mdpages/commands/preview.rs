use crate::commands::helpers::resolve_or_active;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{MdPagesError, Result};
use crate::index::DocSelector;
use crate::render::highlight::escape_html;
use crate::render::{DiagramRenderer, DiagramState, RenderPipeline, VisualTree};
use crate::store::{DocumentStore, StorageBackend};

/// Render a document to a standalone HTML page.
pub fn run<B: StorageBackend>(
    store: &DocumentStore<B>,
    pipeline: &RenderPipeline,
    renderer: &dyn DiagramRenderer,
    selector: Option<&DocSelector>,
) -> Result<CmdResult> {
    let id = resolve_or_active(store, selector)?;
    let doc = store.get(&id).ok_or(MdPagesError::DocumentNotFound(id))?;
    let tree = pipeline.render_blocking(&doc.content, renderer);

    let mut result = CmdResult::default();
    if let Some(warning) = diagram_warning(&tree) {
        result.add_message(warning);
    }
    let css = format!("{}{}", PREVIEW_CSS, pipeline.stylesheet().unwrap_or_default());
    Ok(result.with_html(standalone_page(&doc.name, &css, &tree.to_html())))
}

/// Warning for diagrams that fell back to their source, if any did.
pub fn diagram_warning(tree: &VisualTree) -> Option<CmdMessage> {
    let failed = tree
        .diagrams()
        .filter(|d| matches!(d.state, DiagramState::Failed { .. }))
        .count();
    (failed > 0).then(|| {
        CmdMessage::warning(format!(
            "{} diagram(s) could not be rendered and are shown as source",
            failed
        ))
    })
}

fn standalone_page(title: &str, css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<article class=\"markdown-body\">\n{}</article>\n</body>\n</html>\n",
        escape_html(title),
        css,
        body
    )
}

const PREVIEW_CSS: &str = "body{max-width:794px;margin:2em auto;font-family:sans-serif;line-height:1.5}\
pre{background:#f4f4f4;padding:12px;overflow:auto}\
table{border-collapse:collapse}th,td{border:1px solid #ccc;padding:4px 8px}\
blockquote{border-left:3px solid #ccc;margin-left:0;padding-left:1em;color:#555}\
li[data-depth=\"1\"]{margin-left:1.5em}li[data-depth=\"2\"]{margin-left:3em}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;
    use crate::render::NoDiagramEngine;

    #[test]
    fn renders_active_document_as_page() {
        let mut s = session();
        s.create(Some("A <b>"), "# Hello\n\ntext");
        let result = run(s.store(), &RenderPipeline::default(), &NoDiagramEngine, None).unwrap();
        let html = result.html.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt;</title>"));
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn page_carries_highlight_styles() {
        let mut s = session();
        s.create(None, "```rust\nfn main() {}\n```");
        let result = run(s.store(), &RenderPipeline::default(), &NoDiagramEngine, None).unwrap();
        let html = result.html.unwrap();
        assert!(html.contains("hl-rust"));
        assert!(html.contains(".hl-"));
    }

    #[test]
    fn warns_about_unrendered_diagrams() {
        let mut s = session();
        s.create(None, "```mermaid\ngraph TD\n```");
        let result = run(s.store(), &RenderPipeline::default(), &NoDiagramEngine, None).unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(result.html.unwrap().contains("diagram-source"));
    }
}
