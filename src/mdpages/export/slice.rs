//! Whole-surface strategy: cut the rendered surface into page-height bands.

use super::page::Band;

/// Bands covering `surface_height` in steps of `page_height`.
///
/// The loop stops as soon as nothing remains, so an exact multiple of the page
/// height yields exactly that many pages. Any positive remainder, even a
/// single pixel, gets a page of its own.
pub fn plan_slices(surface_height: u32, page_height: u32) -> Vec<Band> {
    let page_height = page_height.max(1);
    let mut bands = Vec::new();
    let mut top = 0u32;
    let mut remaining = i64::from(surface_height);
    loop {
        if remaining <= 0 {
            break;
        }
        let height = remaining.min(i64::from(page_height)) as u32;
        bands.push(Band { top, height });
        top += height;
        remaining -= i64::from(page_height);
    }
    bands
}
