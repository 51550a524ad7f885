use crate::commands::helpers::resolve_or_active;
use crate::commands::preview::diagram_warning;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{MdPagesError, Result};
use crate::export::Exporter;
use crate::index::DocSelector;
use crate::render::{DiagramRenderer, RenderPipeline};
use crate::store::{DocumentStore, StorageBackend};
use std::path::Path;
use std::sync::Arc;

/// Render a document and export it as pages into `out_dir`.
///
/// The export works on a snapshot of the rendered tree; the document itself is
/// only read.
pub fn run<B: StorageBackend>(
    store: &DocumentStore<B>,
    pipeline: &RenderPipeline,
    renderer: &dyn DiagramRenderer,
    exporter: &Exporter,
    selector: Option<&DocSelector>,
    out_dir: &Path,
) -> Result<CmdResult> {
    let id = resolve_or_active(store, selector)?;
    let doc = store.get(&id).ok_or(MdPagesError::DocumentNotFound(id))?;
    let tree = Arc::new(pipeline.render_blocking(&doc.content, renderer));

    let mut result = CmdResult::default();
    if let Some(warning) = diagram_warning(&tree) {
        result.add_message(warning);
    }
    let path = exporter.export(tree, &doc.name, out_dir)?;
    result.add_message(CmdMessage::success(format!("Exported to {}", path.display())));
    Ok(result.with_output_paths(vec![path]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::fixtures::session;
    use crate::error::ExportError;
    use crate::export::{ArchiveAssembler, Assembler, ExportSettings, PdfAssembler};
    use crate::render::NoDiagramEngine;

    fn exporter_with(assembler: Box<dyn Assembler>) -> Exporter {
        let settings = ExportSettings {
            raster_width: 300,
            raster_scale: 1.0,
            ..Default::default()
        };
        Exporter::new(settings, assembler)
    }

    fn exporter() -> Exporter {
        exporter_with(Box::new(PdfAssembler::default()))
    }

    #[test]
    fn writes_pdf_named_after_document() {
        let mut s = session();
        s.create(Some("Trip Notes"), "# Day 1\n\nWalked.");
        let dir = tempfile::tempdir().unwrap();
        let before = s.store().active().clone();

        let result = run(
            s.store(),
            &RenderPipeline::default(),
            &NoDiagramEngine,
            &exporter(),
            None,
            dir.path(),
        )
        .unwrap();

        assert_eq!(result.output_paths, vec![dir.path().join("Trip Notes.pdf")]);
        assert!(std::fs::read(&result.output_paths[0]).unwrap().starts_with(b"%PDF-"));
        assert_eq!(s.store().active(), &before);
    }

    #[test]
    fn archive_artifact_is_still_available() {
        let mut s = session();
        s.create(Some("Trip Notes"), "# Day 1");
        let dir = tempfile::tempdir().unwrap();
        let result = run(
            s.store(),
            &RenderPipeline::default(),
            &NoDiagramEngine,
            &exporter_with(Box::new(ArchiveAssembler::default())),
            None,
            dir.path(),
        )
        .unwrap();
        assert_eq!(result.output_paths, vec![dir.path().join("Trip Notes.tar.gz")]);
        assert!(result.output_paths[0].exists());
    }

    #[test]
    fn empty_document_cannot_be_exported() {
        let mut s = session();
        s.create(None, "");
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            s.store(),
            &RenderPipeline::default(),
            &NoDiagramEngine,
            &exporter(),
            None,
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, MdPagesError::Export(ExportError::EmptySurface)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
