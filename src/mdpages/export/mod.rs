//! # Pagination / Export Engine
//!
//! Takes a final [`VisualTree`] and produces fixed-size pages:
//!
//! 1. **Layout** ([`layout`]): blocks become stacked boxes at the raster width.
//! 2. **Plan**: either [`slice::plan_slices`] (whole surface, cut every page
//!    height) or [`breaks::plan_breaks`] (cuts chosen between atomic units).
//! 3. **Raster** ([`raster`]): the surface is painted once and cropped per band.
//! 4. **Assemble** ([`assemble`]): pages are written as a single artifact, a
//!    PDF by default or a `.tar.gz` of page images.
//!
//! Content is scaled to the page's usable width and each slice is centered
//! horizontally. Any failure aborts the whole export; no partial artifact is
//! left behind and the source document is never touched.

pub mod assemble;
pub mod breaks;
pub mod font;
pub mod layout;
pub mod page;
pub mod raster;
pub mod slice;

pub use assemble::{sanitize_filename, ArchiveAssembler, ArtifactKind, Assembler, PageImageFormat, PdfAssembler};
pub use font::MonoMeasurer;
pub use layout::{LayoutConfig, Measurer};
pub use page::{Band, Margins, Orientation, Page, PageFormat, PageGeometry, Placement};
pub use raster::{GlyphRasterizer, Rasterizer};

use crate::error::{ExportError, Result};
use crate::render::tree::VisualTree;
use image::imageops;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Slice the whole surface every page height.
    Whole,
    /// Break between atomic units.
    #[default]
    Content,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Whole => write!(f, "whole"),
            Strategy::Content => write!(f, "content"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole" | "slice" => Ok(Strategy::Whole),
            "content" | "breaks" => Ok(Strategy::Content),
            _ => Err(format!("unknown export strategy '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    pub geometry: PageGeometry,
    pub strategy: Strategy,
    /// Surface width in layout pixels.
    pub raster_width: u32,
    /// Device pixels per layout pixel.
    pub raster_scale: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            strategy: Strategy::default(),
            raster_width: 794,
            raster_scale: 2.0,
        }
    }
}

/// Lay out, plan, rasterize and crop `tree` into pages.
pub fn export_pages(
    tree: &VisualTree,
    settings: &ExportSettings,
    measurer: &dyn Measurer,
    rasterizer: &dyn Rasterizer,
) -> std::result::Result<Vec<Page>, ExportError> {
    let layout = layout::layout_tree(tree, &LayoutConfig::for_width(settings.raster_width), measurer);
    if layout.is_empty() {
        return Err(ExportError::EmptySurface);
    }

    let page_height = settings.geometry.content_height_px(layout.width);
    let bands = match settings.strategy {
        Strategy::Whole => slice::plan_slices(layout.height, page_height),
        Strategy::Content => breaks::plan_breaks(&layout.boxes, page_height),
    };
    log::debug!(
        "export: surface {}x{}, page height {}, {} page(s) ({})",
        layout.width,
        layout.height,
        page_height,
        bands.len(),
        settings.strategy
    );

    let surface = rasterizer.rasterize(&layout, settings.raster_scale)?;
    let edges = device_edges(&bands, settings.raster_scale, surface.height()).ok_or_else(|| {
        ExportError::Raster(format!(
            "{} pages do not fit a {} px tall raster",
            bands.len(),
            surface.height()
        ))
    })?;
    let mut pages = Vec::with_capacity(bands.len());
    for (i, band) in bands.into_iter().enumerate() {
        let (y0, y1) = (edges[i], edges[i + 1]);
        let image = imageops::crop_imm(&surface, 0, y0, surface.width(), y1 - y0).to_image();
        pages.push(Page {
            number: i + 1,
            band,
            placement: settings.geometry.place(layout.width, band.height),
            image,
        });
    }
    Ok(pages)
}

/// Device rows where consecutive bands meet, `bands.len() + 1` of them.
///
/// Edges are scaled from the shared band boundaries rather than per band, so
/// the crops tile the raster exactly. Bands thinner than a device row are
/// widened to one row, borrowing from their neighbours. `None` when there are
/// more bands than rows.
fn device_edges(bands: &[Band], scale: f32, surface_height: u32) -> Option<Vec<u32>> {
    let n = bands.len();
    if n == 0 || n as u64 > u64::from(surface_height) {
        return None;
    }
    let mut edges: Vec<u32> = bands
        .iter()
        .map(|b| b.top)
        .chain(bands.last().map(Band::bottom))
        .map(|y| ((y as f32 * scale).round() as u32).min(surface_height))
        .collect();
    edges[0] = 0;
    for i in 1..edges.len() {
        edges[i] = edges[i].max(edges[i - 1] + 1);
    }
    edges[n] = surface_height;
    for i in (1..n).rev() {
        edges[i] = edges[i].min(edges[i + 1] - 1);
    }
    Some(edges)
}

/// Marks an export as running; dropping it releases the guard.
pub struct ExportTicket {
    flag: Arc<AtomicBool>,
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Export orchestration with a single-flight guard.
pub struct Exporter {
    settings: ExportSettings,
    measurer: Box<dyn Measurer>,
    rasterizer: Box<dyn Rasterizer>,
    assembler: Box<dyn Assembler>,
    in_progress: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(settings: ExportSettings, assembler: Box<dyn Assembler>) -> Self {
        Self {
            settings,
            measurer: Box::new(MonoMeasurer),
            rasterizer: Box::new(GlyphRasterizer::default()),
            assembler,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_measurer(mut self, measurer: Box<dyn Measurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Claim the guard, or fail if another export holds it.
    pub fn begin(&self) -> std::result::Result<ExportTicket, ExportError> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyInProgress)?;
        Ok(ExportTicket {
            flag: Arc::clone(&self.in_progress),
        })
    }

    /// `{dir}/{sanitized name}.{ext}`
    pub fn artifact_path(&self, dir: &Path, document_name: &str) -> PathBuf {
        dir.join(format!(
            "{}.{}",
            sanitize_filename(document_name),
            self.assembler.extension()
        ))
    }

    /// Export a snapshot of `tree` named after `document_name` into `dir`.
    pub fn export(&self, tree: Arc<VisualTree>, document_name: &str, dir: &Path) -> Result<PathBuf> {
        let _ticket = self.begin()?;
        let dest = self.artifact_path(dir, document_name);
        let result = export_pages(
            &tree,
            &self.settings,
            self.measurer.as_ref(),
            self.rasterizer.as_ref(),
        )
        .and_then(|pages| {
            self.assembler
                .assemble(&pages, &self.settings.geometry, &dest)
                .map(|_| pages.len())
        });
        match result {
            Ok(count) => {
                log::info!("exported {} page(s) to {}", count, dest.display());
                Ok(dest)
            }
            Err(e) => {
                log::warn!("export of '{}' failed: {}", document_name, e);
                Err(e.into())
            }
        }
    }
}
