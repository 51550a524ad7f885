use super::page::{Band, Page, PageGeometry, Placement};
use crate::error::ExportError;
use flate2::write::GzEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use printpdf::{
    ColorBits, ColorSpace, Image as PdfImage, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Turns rendered pages into the final artifact at `dest`.
///
/// Implementations either write the complete artifact or leave nothing at
/// `dest`.
pub trait Assembler {
    /// File extension of the artifact, without the leading dot.
    fn extension(&self) -> &'static str;

    fn assemble(&self, pages: &[Page], geometry: &PageGeometry, dest: &Path) -> Result<(), ExportError>;
}

/// Which artifact an export writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// One PDF page per rendered page.
    #[default]
    Pdf,
    /// Page images plus `manifest.json` in a `.tar.gz`.
    Archive,
}

impl ArtifactKind {
    pub fn assembler(self, image_format: PageImageFormat) -> Box<dyn Assembler> {
        match self {
            ArtifactKind::Pdf => Box::new(PdfAssembler::new(image_format)),
            ArtifactKind::Archive => Box::new(ArchiveAssembler::new(image_format)),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Pdf => write!(f, "pdf"),
            ArtifactKind::Archive => write!(f, "archive"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ArtifactKind::Pdf),
            "archive" | "tar.gz" | "tgz" => Ok(ArtifactKind::Archive),
            _ => Err(format!("unknown export artifact '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PageImageFormat {
    #[default]
    Png,
    Jpeg {
        quality: u8,
    },
}

impl PageImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PageImageFormat::Png => "png",
            PageImageFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn encode(&self, page: &Page) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        let result = match self {
            PageImageFormat::Png => page
                .image
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
            PageImageFormat::Jpeg { quality } => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgba8(page.image.clone()).to_rgb8();
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, (*quality).clamp(1, 100)))
            }
        };
        result.map_err(|e| ExportError::Assembly(format!("page {}: {}", page.number, e)))?;
        Ok(buf)
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    geometry: &'a PageGeometry,
    page_width_mm: f32,
    page_height_mm: f32,
    pages: Vec<ManifestPage>,
}

#[derive(Debug, Serialize)]
struct ManifestPage {
    number: usize,
    file: String,
    band: Band,
    placement: Placement,
}

/// Writes `pages/page-NNN.<ext>` plus `manifest.json` into a gzip'd tar.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveAssembler {
    pub image_format: PageImageFormat,
}

impl ArchiveAssembler {
    pub fn new(image_format: PageImageFormat) -> Self {
        Self { image_format }
    }

    fn write_archive<W: Write>(
        &self,
        writer: W,
        pages: &[Page],
        geometry: &PageGeometry,
    ) -> Result<(), ExportError> {
        let enc = GzEncoder::new(writer, Compression::default());
        let mut tar = tar::Builder::new(enc);
        let (page_width_mm, page_height_mm) = geometry.page_size_mm();
        let mut manifest = Manifest {
            geometry,
            page_width_mm,
            page_height_mm,
            pages: Vec::with_capacity(pages.len()),
        };

        for page in pages {
            let file = format!("pages/page-{:03}.{}", page.number, self.image_format.extension());
            let bytes = self.image_format.encode(page)?;
            append(&mut tar, &file, &bytes)?;
            manifest.pages.push(ManifestPage {
                number: page.number,
                file,
                band: page.band,
                placement: page.placement,
            });
        }

        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| ExportError::Assembly(format!("manifest: {}", e)))?;
        append(&mut tar, "manifest.json", &json)?;

        let enc = tar.into_inner().map_err(assembly_io)?;
        enc.finish().map_err(assembly_io)?;
        Ok(())
    }
}

fn append<W: Write>(tar: &mut tar::Builder<W>, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, name, bytes).map_err(assembly_io)
}

fn assembly_io(e: std::io::Error) -> ExportError {
    ExportError::Assembly(e.to_string())
}

/// Write through a hidden tmp file next to `dest` and rename it into place.
/// On failure the tmp file is removed and `dest` is untouched.
fn write_atomically<F>(dest: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(File) -> Result<(), ExportError>,
{
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).map_err(assembly_io)?;
    }

    let tmp_path = dir.join(format!(".mdpages-export-{}.tmp", Uuid::new_v4()));
    let written = File::create(&tmp_path)
        .map_err(assembly_io)
        .and_then(write)
        .and_then(|_| fs::rename(&tmp_path, dest).map_err(assembly_io));
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

impl Assembler for ArchiveAssembler {
    fn extension(&self) -> &'static str {
        "tar.gz"
    }

    fn assemble(&self, pages: &[Page], geometry: &PageGeometry, dest: &Path) -> Result<(), ExportError> {
        if pages.is_empty() {
            return Err(ExportError::EmptySurface);
        }
        write_atomically(dest, |file| self.write_archive(file, pages, geometry))
    }
}

/// Writes one PDF page of the configured paper size per rendered page, with
/// the page image drawn at its placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfAssembler {
    /// PNG pages are embedded as raw RGB, JPEG pages as DCT streams.
    pub image_format: PageImageFormat,
}

impl PdfAssembler {
    pub fn new(image_format: PageImageFormat) -> Self {
        Self { image_format }
    }

    fn xobject(&self, page: &Page) -> Result<ImageXObject, ExportError> {
        let (image_data, image_filter) = match self.image_format {
            PageImageFormat::Png => {
                let rgb = DynamicImage::ImageRgba8(page.image.clone()).to_rgb8();
                (rgb.into_raw(), None)
            }
            PageImageFormat::Jpeg { .. } => (self.image_format.encode(page)?, Some(ImageFilter::DCT)),
        };
        Ok(ImageXObject {
            width: Px(page.image.width() as usize),
            height: Px(page.image.height() as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data,
            image_filter,
            smask: None,
            clipping_bbox: None,
        })
    }

    fn render(&self, pages: &[Page], geometry: &PageGeometry) -> Result<Vec<u8>, ExportError> {
        let (page_w, page_h) = geometry.page_size_mm();
        let (doc, first_page, first_layer) = PdfDocument::new("mdpages export", Mm(page_w), Mm(page_h), "page 1");
        for (i, page) in pages.iter().enumerate() {
            let (page_index, layer_index) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(page_w), Mm(page_h), format!("page {}", page.number))
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);
            let placed = page.placement;
            if page.image.width() == 0 || placed.width_mm <= 0.0 {
                return Err(ExportError::Assembly(format!("page {} has no width", page.number)));
            }

            // At this dpi the image is exactly `width_mm` wide; scale_y
            // absorbs any rounding in the band height.
            let dpi = page.image.width() as f32 * 25.4 / placed.width_mm;
            let natural_height_mm = page.image.height() as f32 * 25.4 / dpi;
            // PDF space starts at the bottom-left corner.
            let transform = ImageTransform {
                translate_x: Some(Mm(placed.x_mm)),
                translate_y: Some(Mm(page_h - placed.y_mm - placed.height_mm)),
                scale_y: Some(placed.height_mm / natural_height_mm),
                dpi: Some(dpi),
                ..Default::default()
            };
            PdfImage::from(self.xobject(page)?).add_to_layer(layer, transform);
        }
        doc.save_to_bytes()
            .map_err(|e| ExportError::Assembly(format!("pdf: {}", e)))
    }
}

impl Assembler for PdfAssembler {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn assemble(&self, pages: &[Page], geometry: &PageGeometry, dest: &Path) -> Result<(), ExportError> {
        if pages.is_empty() {
            return Err(ExportError::EmptySurface);
        }
        let bytes = self.render(pages, geometry)?;
        write_atomically(dest, |mut file| {
            file.write_all(&bytes).map_err(assembly_io)?;
            file.sync_all().map_err(assembly_io)
        })
    }
}

/// Keep letters, digits, spaces, `-` and `_`; everything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use image::RgbaImage;
    use std::io::Read;

    fn page(number: usize) -> Page {
        let geometry = PageGeometry::default();
        Page {
            number,
            band: Band {
                top: (number as u32 - 1) * 10,
                height: 10,
            },
            placement: geometry.place(20, 10),
            image: RgbaImage::from_pixel(20, 10, image::Rgba([255, 255, 255, 255])),
        }
    }

    fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let mut e = e.unwrap();
                let name = e.path().unwrap().to_string_lossy().to_string();
                let mut bytes = Vec::new();
                e.read_to_end(&mut bytes).unwrap();
                (name, bytes)
            })
            .collect()
    }

    #[test]
    fn archive_holds_pages_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("notes.tar.gz");
        ArchiveAssembler::default()
            .assemble(&[page(1), page(2)], &PageGeometry::default(), &dest)
            .unwrap();

        let entries = entries(&dest);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["pages/page-001.png", "pages/page-002.png", "manifest.json"]);

        let manifest: serde_json::Value = serde_json::from_slice(&entries[2].1).unwrap();
        assert_eq!(manifest["pages"].as_array().unwrap().len(), 2);
        assert_eq!(manifest["page_width_mm"], 210.0);
        assert_eq!(manifest["pages"][1]["band"]["top"], 10);
    }

    #[test]
    fn jpeg_pages_use_jpg_extension() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.tar.gz");
        ArchiveAssembler::new(PageImageFormat::Jpeg { quality: 80 })
            .assemble(&[page(1)], &PageGeometry::default(), &dest)
            .unwrap();
        let entries = entries(&dest);
        assert_eq!(entries[0].0, "pages/page-001.jpg");
        // JPEG SOI marker
        assert_eq!(&entries[0].1[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn failure_leaves_no_artifact_or_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the destination makes the final rename fail.
        let dest = dir.path().join("blocked.tar.gz");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("keep"), "x").unwrap();

        let result = ArchiveAssembler::default().assemble(&[page(1)], &PageGeometry::default(), &dest);
        assert!(matches!(result, Err(ExportError::Assembly(_))));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(leftovers, vec!["blocked.tar.gz".to_string()]);
    }

    #[test]
    fn no_pages_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.tar.gz");
        assert!(ArchiveAssembler::default()
            .assemble(&[], &PageGeometry::default(), &dest)
            .is_err());
        assert!(!dest.exists());
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn pdf_has_one_page_per_rendered_page() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("notes.pdf");
        PdfAssembler::default()
            .assemble(&[page(1), page(2), page(3)], &PageGeometry::default(), &dest)
            .unwrap();

        let bytes = fs::read(&dest).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let pages = count(&bytes, b"/Type/Page") - count(&bytes, b"/Type/Pages");
        assert_eq!(pages, 3);
        assert_eq!(count(&bytes, b"/Subtype/Image"), 3);
        // A4 in points.
        assert_eq!(count(&bytes, b"/MediaBox[0 0 595.27"), 3);
    }

    #[test]
    fn pdf_embeds_jpeg_pages_as_dct() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("notes.pdf");
        PdfAssembler::new(PageImageFormat::Jpeg { quality: 80 })
            .assemble(&[page(1)], &PageGeometry::default(), &dest)
            .unwrap();
        let bytes = fs::read(&dest).unwrap();
        assert_eq!(count(&bytes, b"/DCTDecode"), 1);
    }

    #[test]
    fn pdf_failure_leaves_no_artifact_or_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("blocked.pdf");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("keep"), "x").unwrap();

        let result = PdfAssembler::default().assemble(&[page(1)], &PageGeometry::default(), &dest);
        assert!(matches!(result, Err(ExportError::Assembly(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(PdfAssembler::default()
            .assemble(&[], &PageGeometry::default(), &dir.path().join("none.pdf"))
            .is_err());
        assert!(!dir.path().join("none.pdf").exists());
    }

    #[test]
    fn artifact_kinds_parse_and_pick_extensions() {
        assert_eq!("pdf".parse::<ArtifactKind>().unwrap(), ArtifactKind::Pdf);
        assert_eq!("tar.gz".parse::<ArtifactKind>().unwrap(), ArtifactKind::Archive);
        assert_eq!(ArtifactKind::default(), ArtifactKind::Pdf);
        assert!("zip".parse::<ArtifactKind>().is_err());
        let png = PageImageFormat::Png;
        assert_eq!(ArtifactKind::Pdf.assembler(png).extension(), "pdf");
        assert_eq!(ArtifactKind::Archive.assembler(png).extension(), "tar.gz");
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_filename("Hello World"), "Hello World");
        assert_eq!(sanitize_filename("foo/bar"), "foo_bar");
        assert_eq!(sanitize_filename("  "), "document");
    }
}
