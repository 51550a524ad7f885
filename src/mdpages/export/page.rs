use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target paper size. Dimensions are in millimetres, portrait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom {
        width_mm: f32,
        height_mm: f32,
    },
}

impl PageFormat {
    pub fn size_mm(&self) -> (f32, f32) {
        match *self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
            PageFormat::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFormat::A4 => write!(f, "a4"),
            PageFormat::A5 => write!(f, "a5"),
            PageFormat::Letter => write!(f, "letter"),
            PageFormat::Legal => write!(f, "legal"),
            PageFormat::Custom {
                width_mm,
                height_mm,
            } => write!(f, "{}x{}", width_mm, height_mm),
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    /// Named sizes, or `WIDTHxHEIGHT` in millimetres.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            other => {
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| format!("unknown page format '{}'", s))?;
                let width_mm: f32 = w.trim().parse().map_err(|_| format!("bad width '{}'", w))?;
                let height_mm: f32 = h.trim().parse().map_err(|_| format!("bad height '{}'", h))?;
                if width_mm <= 0.0 || height_mm <= 0.0 {
                    return Err(format!("page size must be positive: '{}'", s));
                }
                Ok(PageFormat::Custom {
                    width_mm,
                    height_mm,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(format!("unknown orientation '{}'", s)),
        }
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const DEFAULT_MM: f32 = 10.0;

    pub fn uniform(mm: f32) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT_MM)
    }
}

/// Format, orientation and margins: everything needed to place content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PageGeometry {
    pub format: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
}

impl PageGeometry {
    pub fn page_size_mm(&self) -> (f32, f32) {
        let (w, h) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn usable_width_mm(&self) -> f32 {
        (self.page_size_mm().0 - self.margins.left - self.margins.right).max(1.0)
    }

    pub fn usable_height_mm(&self) -> f32 {
        (self.page_size_mm().1 - self.margins.top - self.margins.bottom).max(1.0)
    }

    /// Millimetres covered by one surface pixel when `surface_width` pixels
    /// are scaled to the usable width.
    pub fn mm_per_px(&self, surface_width: u32) -> f32 {
        self.usable_width_mm() / surface_width.max(1) as f32
    }

    /// Height of one page's content area, in surface pixels.
    pub fn content_height_px(&self, surface_width: u32) -> u32 {
        let px = (self.usable_height_mm() * surface_width.max(1) as f32 / self.usable_width_mm())
            .floor();
        (px as u32).max(1)
    }

    /// Where a slice `height_px` surface pixels tall lands on the page.
    ///
    /// Slices always span the usable width and are centered horizontally.
    pub fn place(&self, surface_width: u32, height_px: u32) -> Placement {
        let (page_w, _) = self.page_size_mm();
        let width_mm = self.usable_width_mm();
        Placement {
            x_mm: (page_w - width_mm) / 2.0,
            y_mm: self.margins.top,
            width_mm,
            height_mm: height_px as f32 * self.mm_per_px(surface_width),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// A vertical range of the surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub top: u32,
    pub height: u32,
}

impl Band {
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// One exported page. Numbers start at 1 and follow reading order.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub band: Band,
    pub placement: Placement,
    pub image: RgbaImage,
}
