//! Diagram placeholder resolution (the asynchronous pass).
//!
//! The structural pass leaves every diagram as `DiagramState::Pending` with an
//! instance id unique to its render pass. [`resolve_diagrams`] fans out one
//! engine call per placeholder, joins them, and substitutes each result in
//! place. One failing diagram only affects its own block: it ends up
//! `Failed` and the preview shows its source instead.

use super::tree::{Block, DiagramImage, DiagramState, ImageEncoding, VisualTree};
use crate::error::{MdPagesError, Result};
use futures::future::{join_all, BoxFuture};
use image::GenericImageView;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use uuid::Uuid;

/// External diagram engine: description text in, static image out.
pub trait DiagramRenderer {
    fn render<'a>(
        &'a self,
        instance_id: &'a str,
        source: &'a str,
    ) -> BoxFuture<'a, Result<DiagramImage>>;
}

/// Used when no engine is configured; every diagram keeps showing its source.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagramEngine;

impl DiagramRenderer for NoDiagramEngine {
    fn render<'a>(
        &'a self,
        _instance_id: &'a str,
        _source: &'a str,
    ) -> BoxFuture<'a, Result<DiagramImage>> {
        Box::pin(async { Err(MdPagesError::Render("no diagram engine configured".into())) })
    }
}

/// Runs an external command per diagram, e.g. `mmdc -i {input} -o {output}`.
///
/// `{input}` is replaced by a temp file holding the source, `{output}` by the
/// PNG path the command must write.
#[derive(Debug, Clone)]
pub struct CommandDiagramRenderer {
    command: String,
}

impl CommandDiagramRenderer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Temp input and output paths for one diagram. Pass counters restart in
    /// every process, so the stem carries a random suffix as well.
    fn scratch_paths(instance_id: &str) -> (PathBuf, PathBuf) {
        let stem = format!("mdpages-{}-{}", instance_id, Uuid::new_v4().simple());
        let dir = env::temp_dir();
        (
            dir.join(format!("{}.mmd", stem)),
            dir.join(format!("{}.png", stem)),
        )
    }

    fn run(&self, instance_id: &str, source: &str) -> Result<DiagramImage> {
        let (input, output) = Self::scratch_paths(instance_id);
        fs::write(&input, source)?;

        let mut parts = self.command.split_whitespace().map(|part| {
            part.replace("{input}", &input.to_string_lossy())
                .replace("{output}", &output.to_string_lossy())
        });
        let program = parts
            .next()
            .ok_or_else(|| MdPagesError::Render("empty diagram command".into()))?;

        let status = Command::new(&program).args(parts).status();
        let _ = fs::remove_file(&input);
        let status = status.map_err(|e| {
            MdPagesError::Render(format!("failed to launch '{}': {}", program, e))
        })?;
        if !status.success() {
            let _ = fs::remove_file(&output);
            return Err(MdPagesError::Render(format!(
                "'{}' exited with {}",
                program, status
            )));
        }

        let bytes = fs::read(&output)?;
        let _ = fs::remove_file(&output);
        let (width, height) = image::load_from_memory(&bytes)?.dimensions();
        Ok(DiagramImage {
            width,
            height,
            encoding: ImageEncoding::Png,
            bytes,
        })
    }
}

impl DiagramRenderer for CommandDiagramRenderer {
    fn render<'a>(
        &'a self,
        instance_id: &'a str,
        source: &'a str,
    ) -> BoxFuture<'a, Result<DiagramImage>> {
        Box::pin(async move { self.run(instance_id, source) })
    }
}

/// Resolve every pending diagram in `tree`. Never fails as a whole.
pub async fn resolve_diagrams<R>(mut tree: VisualTree, renderer: &R) -> VisualTree
where
    R: DiagramRenderer + ?Sized,
{
    let jobs: Vec<(usize, String, String)> = tree
        .blocks
        .iter()
        .enumerate()
        .filter_map(|(index, block)| match block {
            Block::Diagram(d) if matches!(d.state, DiagramState::Pending) => {
                Some((index, d.instance_id.clone(), d.source.clone()))
            }
            _ => None,
        })
        .collect();

    if jobs.is_empty() {
        return tree;
    }
    log::debug!("resolving {} diagram(s) for pass {}", jobs.len(), tree.pass);

    let results = join_all(jobs.iter().map(|(index, id, source)| async move {
        (*index, id.as_str(), renderer.render(id, source).await)
    }))
    .await;

    for (index, id, result) in results {
        let Some(Block::Diagram(diagram)) = tree.blocks.get_mut(index) else {
            continue;
        };
        diagram.state = match result {
            Ok(image) => DiagramState::Rendered(image),
            Err(e) => {
                log::warn!("diagram {} failed to render: {}", id, e);
                DiagramState::Failed {
                    reason: e.to_string(),
                }
            }
        };
    }
    tree
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Renders any source except ones containing `bad` into a tiny image.
    pub struct FakeEngine;

    impl DiagramRenderer for FakeEngine {
        fn render<'a>(
            &'a self,
            _instance_id: &'a str,
            source: &'a str,
        ) -> BoxFuture<'a, Result<DiagramImage>> {
            Box::pin(async move {
                if source.contains("bad") {
                    Err(MdPagesError::Render("syntax error".into()))
                } else {
                    Ok(DiagramImage {
                        width: 40,
                        height: 20,
                        encoding: ImageEncoding::Svg,
                        bytes: b"<svg/>".to_vec(),
                    })
                }
            })
        }
    }
}
