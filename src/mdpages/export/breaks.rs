//! Content-aware strategy: choose page breaks between layout boxes.
//!
//! Rules, in order:
//! - a box that fits on the current page stays there;
//! - an atomic box that would straddle the page bottom moves whole to the next
//!   page, taking any `keep_with_next` boxes directly above it along;
//! - a non-atomic box is cut at the last line boundary that fits;
//! - an atomic box taller than a page starts a fresh page and is then cut at
//!   page height. This is the only way a unit ever spans pages.

use super::layout::LayoutBox;
use super::page::Band;

pub fn plan_breaks(boxes: &[LayoutBox], page_height: u32) -> Vec<Band> {
    let page_height = page_height.max(1);
    let content_end = boxes.iter().map(LayoutBox::bottom).max().unwrap_or(0);
    let mut bands = Vec::new();
    let mut top = 0u32;
    let mut i = 0usize;

    while i < boxes.len() {
        let b = &boxes[i];
        let bottom = top + page_height;
        if b.bottom() <= bottom {
            i += 1;
            continue;
        }

        let cut = if b.y >= bottom {
            // Only whitespace is left on this page.
            bottom
        } else if b.atomic && b.height <= page_height {
            keep_together(boxes, i, top)
        } else if b.atomic {
            if b.y > top {
                keep_together(boxes, i, top)
            } else {
                log::debug!(
                    "{} at y={} is taller than a page ({} > {}); slicing",
                    b.kind,
                    b.y,
                    b.height,
                    page_height
                );
                bottom
            }
        } else {
            let line = b.line_height.max(1);
            let lines_fit = (bottom - b.y) / line;
            let at_line = b.y + lines_fit * line;
            if at_line > top && lines_fit > 0 {
                at_line
            } else if b.y > top {
                keep_together(boxes, i, top)
            } else {
                bottom
            }
        };

        bands.push(Band {
            top,
            height: cut - top,
        });
        top = cut;
    }

    if content_end > top {
        bands.push(Band {
            top,
            height: content_end - top,
        });
    }
    bands
}

/// Break point before box `i`, moved up over any boxes that must stay with it.
fn keep_together(boxes: &[LayoutBox], i: usize, top: u32) -> u32 {
    let mut j = i;
    while j > 0 && boxes[j - 1].keep_with_next && boxes[j - 1].y > top {
        j -= 1;
    }
    boxes[j].y
}
