use crate::error::{MdPagesError, Result};
use crate::export::{
    ArtifactKind, Assembler, ExportSettings, Margins, Orientation, PageFormat, PageGeometry, PageImageFormat,
    Strategy,
};
use crate::render::DEFAULT_DIAGRAM_LANGUAGE;
use crate::session::{DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_PREVIEW_DELAY_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    Png,
    Jpeg,
}

/// Configuration for mdpages, stored as `config.json` in the data directory.
///
/// Missing fields take their defaults; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MdPagesConfig {
    pub autosave_delay_ms: u64,
    pub preview_delay_ms: u64,
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
    pub export_strategy: Strategy,
    pub export_artifact: ArtifactKind,
    /// Layout width of the export surface, in pixels.
    pub raster_width: u32,
    pub raster_scale: f32,
    pub image_format: ImageKind,
    pub jpeg_quality: u8,
    /// Fence languages rendered as diagrams.
    pub diagram_languages: Vec<String>,
    /// External renderer, e.g. `mmdc -i {input} -o {output}`.
    pub diagram_command: Option<String>,
}

impl Default for MdPagesConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            preview_delay_ms: DEFAULT_PREVIEW_DELAY_MS,
            page_format: PageFormat::default(),
            orientation: Orientation::default(),
            margins: Margins::default(),
            export_strategy: Strategy::default(),
            export_artifact: ArtifactKind::default(),
            raster_width: 794,
            raster_scale: 2.0,
            image_format: ImageKind::default(),
            jpeg_quality: 92,
            diagram_languages: vec![DEFAULT_DIAGRAM_LANGUAGE.to_string()],
            diagram_command: None,
        }
    }
}

impl MdPagesConfig {
    pub const KEYS: &'static [&'static str] = &[
        "autosave-delay",
        "preview-delay",
        "page-format",
        "orientation",
        "margin",
        "export-strategy",
        "export-artifact",
        "raster-width",
        "raster-scale",
        "image-format",
        "jpeg-quality",
        "diagram-languages",
        "diagram-command",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: MdPagesConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry {
            format: self.page_format,
            orientation: self.orientation,
            margins: self.margins,
        }
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            geometry: self.geometry(),
            strategy: self.export_strategy,
            raster_width: self.raster_width,
            raster_scale: self.raster_scale,
        }
    }

    pub fn page_image_format(&self) -> PageImageFormat {
        match self.image_format {
            ImageKind::Png => PageImageFormat::Png,
            ImageKind::Jpeg => PageImageFormat::Jpeg {
                quality: self.jpeg_quality,
            },
        }
    }

    /// Writer for the configured artifact kind and page image format.
    pub fn assembler(&self) -> Box<dyn Assembler> {
        self.export_artifact.assembler(self.page_image_format())
    }

    /// Current value of a user-facing key.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "autosave-delay" => self.autosave_delay_ms.to_string(),
            "preview-delay" => self.preview_delay_ms.to_string(),
            "page-format" => self.page_format.to_string(),
            "orientation" => match self.orientation {
                Orientation::Portrait => "portrait".to_string(),
                Orientation::Landscape => "landscape".to_string(),
            },
            "margin" => format!(
                "{} {} {} {}",
                self.margins.top, self.margins.right, self.margins.bottom, self.margins.left
            ),
            "export-strategy" => self.export_strategy.to_string(),
            "export-artifact" => self.export_artifact.to_string(),
            "raster-width" => self.raster_width.to_string(),
            "raster-scale" => self.raster_scale.to_string(),
            "image-format" => match self.image_format {
                ImageKind::Png => "png".to_string(),
                ImageKind::Jpeg => "jpeg".to_string(),
            },
            "jpeg-quality" => self.jpeg_quality.to_string(),
            "diagram-languages" => self.diagram_languages.join(","),
            "diagram-command" => self.diagram_command.clone().unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    /// Parse and store a user-facing key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| MdPagesError::Api(format!("{}: {}", key, reason));
        let value = value.trim();
        match key {
            "autosave-delay" => self.autosave_delay_ms = parse_number(value).map_err(invalid)?,
            "preview-delay" => self.preview_delay_ms = parse_number(value).map_err(invalid)?,
            "page-format" => self.page_format = value.parse().map_err(invalid)?,
            "orientation" => self.orientation = value.parse().map_err(invalid)?,
            "margin" => self.margins = parse_margins(value).map_err(invalid)?,
            "export-strategy" => self.export_strategy = value.parse().map_err(invalid)?,
            "export-artifact" => self.export_artifact = value.parse().map_err(invalid)?,
            "raster-width" => {
                let width: u32 = parse_number(value).map_err(invalid)?;
                if width < 64 {
                    return Err(invalid("must be at least 64".into()));
                }
                self.raster_width = width;
            }
            "raster-scale" => {
                let scale: f32 = parse_number(value).map_err(invalid)?;
                if !(0.25..=8.0).contains(&scale) {
                    return Err(invalid("must be between 0.25 and 8".into()));
                }
                self.raster_scale = scale;
            }
            "image-format" => {
                self.image_format = match value.to_lowercase().as_str() {
                    "png" => ImageKind::Png,
                    "jpeg" | "jpg" => ImageKind::Jpeg,
                    other => return Err(invalid(format!("unknown image format '{}'", other))),
                }
            }
            "jpeg-quality" => {
                let quality: u8 = parse_number(value).map_err(invalid)?;
                if !(1..=100).contains(&quality) {
                    return Err(invalid("must be between 1 and 100".into()));
                }
                self.jpeg_quality = quality;
            }
            "diagram-languages" => {
                self.diagram_languages = value
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "diagram-command" => {
                self.diagram_command = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(MdPagesError::Api(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> std::result::Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", value))
}

/// One value for all sides, or `top right bottom left`.
fn parse_margins(value: &str) -> std::result::Result<Margins, String> {
    let parts = value
        .split_whitespace()
        .map(parse_number::<f32>)
        .collect::<std::result::Result<Vec<f32>, String>>()?;
    if parts.iter().any(|mm| *mm < 0.0) {
        return Err("margins cannot be negative".into());
    }
    match parts.as_slice() {
        [all] => Ok(Margins::uniform(*all)),
        [top, right, bottom, left] => Ok(Margins {
            top: *top,
            right: *right,
            bottom: *bottom,
            left: *left,
        }),
        _ => Err("expected one value or four (top right bottom left)".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MdPagesConfig::default();
        assert_eq!(config.autosave_delay_ms, 1000);
        assert_eq!(config.page_format, PageFormat::A4);
        assert_eq!(config.margins, Margins::uniform(10.0));
        assert_eq!(config.diagram_languages, vec!["mermaid".to_string()]);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = MdPagesConfig::load(dir.path()).unwrap();
        assert_eq!(config, MdPagesConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MdPagesConfig::default();
        config.set("page-format", "letter").unwrap();
        config.set("jpeg-quality", "70").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = MdPagesConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.page_format, PageFormat::Letter);
        assert_eq!(loaded.jpeg_quality, 70);
    }

    #[test]
    fn test_partial_file_uses_defaults_and_ignores_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{"raster_width": 600, "theme": "dark"}"#,
        )
        .unwrap();
        let config = MdPagesConfig::load(dir.path()).unwrap();
        assert_eq!(config.raster_width, 600);
        assert_eq!(config.autosave_delay_ms, 1000);
    }

    #[test]
    fn test_margins_one_or_four_values() {
        let mut config = MdPagesConfig::default();
        config.set("margin", "15").unwrap();
        assert_eq!(config.margins, Margins::uniform(15.0));
        config.set("margin", "5 10 15 20").unwrap();
        assert_eq!(config.get("margin").unwrap(), "5 10 15 20");
        assert!(config.set("margin", "1 2").is_err());
        assert!(config.set("margin", "-1").is_err());
    }

    #[test]
    fn test_rejects_bad_values_and_keys() {
        let mut config = MdPagesConfig::default();
        assert!(config.set("jpeg-quality", "0").is_err());
        assert!(config.set("export-strategy", "sideways").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config, MdPagesConfig::default());
    }

    #[test]
    fn test_every_key_round_trips_through_get() {
        let config = MdPagesConfig::default();
        for key in MdPagesConfig::KEYS {
            assert!(config.get(key).is_some(), "missing getter for {}", key);
        }
    }

    #[test]
    fn test_image_format_selects_encoder() {
        let mut config = MdPagesConfig::default();
        assert_eq!(config.page_image_format(), PageImageFormat::Png);
        config.set("image-format", "jpg").unwrap();
        assert_eq!(config.page_image_format(), PageImageFormat::Jpeg { quality: 92 });
    }

    #[test]
    fn test_export_artifact_defaults_to_pdf() {
        let mut config = MdPagesConfig::default();
        assert_eq!(config.get("export-artifact").unwrap(), "pdf");
        assert_eq!(config.assembler().extension(), "pdf");
        config.set("export-artifact", "archive").unwrap();
        assert_eq!(config.export_artifact, ArtifactKind::Archive);
        assert_eq!(config.assembler().extension(), "tar.gz");
        assert!(config.set("export-artifact", "docx").is_err());
    }
}
