//! Vertical layout of a visual tree at a fixed surface width.
//!
//! Every block becomes one or more [`LayoutBox`]es stacked top to bottom.
//! Tables contribute one box per row and list items one box each, so page
//! breaking can treat them as separate units. Heights come from wrapping text
//! through a [`Measurer`].

use crate::render::tree::{Block, DiagramState, ImageEncoding, Inline, VisualTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Body,
    Heading(u8),
    Code,
}

/// Text measurement hook; width of `text` in surface pixels.
pub trait Measurer {
    fn measure_text_px(&self, text: &str, style: TextStyle) -> f32;
}

fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 2.0,
        2 => 1.5,
        3 => 1.25,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Surface width in pixels.
    pub width: u32,
    pub line_height: u32,
    pub code_line_height: u32,
    pub block_gap: u32,
    pub list_indent: u32,
    pub quote_indent: u32,
    pub cell_padding: u32,
    pub code_padding: u32,
    /// Height reserved for images the layout cannot load.
    pub image_height: u32,
    pub rule_height: u32,
}

impl LayoutConfig {
    pub fn for_width(width: u32) -> Self {
        Self {
            width: width.max(64),
            ..Self::default()
        }
    }

    fn heading_line_height(&self, level: u8) -> u32 {
        (self.line_height as f32 * heading_scale(level)).round() as u32
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 794,
            line_height: 24,
            code_line_height: 20,
            block_gap: 12,
            list_indent: 24,
            quote_indent: 16,
            cell_padding: 8,
            code_padding: 12,
            image_height: 240,
            rule_height: 16,
        }
    }
}

/// One line of wrapped text and its measured width.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    pub width: u32,
}

impl WrappedLine {
    fn new(text: String, width: f32) -> Self {
        Self {
            text,
            width: width.ceil() as u32,
        }
    }
}

/// What the rasterizer draws for a box.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Text {
        lines: Vec<WrappedLine>,
        style: TextStyle,
        bar: bool,
    },
    Code {
        lines: Vec<WrappedLine>,
    },
    Row {
        header: bool,
        columns: u32,
        cells: Vec<Vec<WrappedLine>>,
    },
    Picture {
        width: u32,
        png: Option<Vec<u8>>,
    },
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub y: u32,
    pub height: u32,
    /// Must not be split across pages.
    pub atomic: bool,
    pub kind: &'static str,
    /// Should stay on the same page as the box after it.
    pub keep_with_next: bool,
    /// Non-atomic boxes may be split at multiples of this.
    pub line_height: u32,
    pub indent: u32,
    pub paint: Paint,
}

impl LayoutBox {
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<LayoutBox>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.height == 0
    }
}

/// Greedy word wrap. Explicit newlines always start a new line.
pub fn wrap_lines(text: &str, max_width: u32, measurer: &dyn Measurer, style: TextStyle) -> Vec<WrappedLine> {
    let max = max_width.max(1) as f32;
    let space = measurer.measure_text_px(" ", style);
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0f32;
        for word in raw_line.split_whitespace() {
            let w = measurer.measure_text_px(word, style);
            if !current.is_empty() && current_w + space + w <= max {
                current.push(' ');
                current.push_str(word);
                current_w += space + w;
                continue;
            }
            if !current.is_empty() {
                lines.push(WrappedLine::new(std::mem::take(&mut current), current_w));
                current_w = 0.0;
            }
            if w <= max {
                current.push_str(word);
                current_w = w;
            } else {
                // Words wider than a line are hard-broken.
                current_w = break_chars(word, max, measurer, style, &mut current, &mut lines);
            }
        }
        lines.push(WrappedLine::new(current, current_w));
    }
    lines
}

/// Wrap code by characters, keeping indentation. Tabs become four spaces.
pub fn wrap_code(code: &str, max_width: u32, measurer: &dyn Measurer) -> Vec<WrappedLine> {
    let max = max_width.max(1) as f32;
    let mut lines = Vec::new();
    for raw_line in code.split('\n') {
        let expanded = raw_line.trim_end().replace('\t', "    ");
        let mut current = String::new();
        let width = break_chars(&expanded, max, measurer, TextStyle::Code, &mut current, &mut lines);
        lines.push(WrappedLine::new(current, width));
    }
    lines
}

/// Append `text` to `current` char by char, pushing full lines as they fill.
/// Returns the width of what is left in `current`.
fn break_chars(
    text: &str,
    max: f32,
    measurer: &dyn Measurer,
    style: TextStyle,
    current: &mut String,
    lines: &mut Vec<WrappedLine>,
) -> f32 {
    let mut width = measurer.measure_text_px(current, style);
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let cw = measurer.measure_text_px(c.encode_utf8(&mut buf), style);
        if !current.is_empty() && width + cw > max {
            lines.push(WrappedLine::new(std::mem::take(current), width));
            width = 0.0;
        }
        current.push(c);
        width += cw;
    }
    width
}

struct Cursor<'a> {
    cfg: &'a LayoutConfig,
    measurer: &'a dyn Measurer,
    y: u32,
    boxes: Vec<LayoutBox>,
}

impl<'a> Cursor<'a> {
    fn push(&mut self, mut b: LayoutBox, gap_after: u32) {
        b.y = self.y;
        self.y += b.height + gap_after;
        self.boxes.push(b);
    }

    fn text_box(&self, content: &Inline, style: TextStyle, indent: u32, kind: &'static str, atomic: bool) -> LayoutBox {
        let line_height = match style {
            TextStyle::Heading(level) => self.cfg.heading_line_height(level),
            TextStyle::Code => self.cfg.code_line_height,
            TextStyle::Body => self.cfg.line_height,
        };
        let lines = wrap_lines(
            &content.text,
            self.cfg.width.saturating_sub(indent),
            self.measurer,
            style,
        );
        LayoutBox {
            y: 0,
            height: lines.len() as u32 * line_height,
            atomic,
            kind,
            keep_with_next: matches!(style, TextStyle::Heading(_)),
            line_height,
            indent,
            paint: Paint::Text {
                lines,
                style,
                bar: kind == "block_quote",
            },
        }
    }

    fn code_box(&self, code: &str, kind: &'static str) -> LayoutBox {
        let inner = self.cfg.width.saturating_sub(2 * self.cfg.code_padding);
        let lines = wrap_code(code.trim_end_matches('\n'), inner, self.measurer);
        LayoutBox {
            y: 0,
            height: lines.len() as u32 * self.cfg.code_line_height + 2 * self.cfg.code_padding,
            atomic: true,
            kind,
            keep_with_next: false,
            line_height: self.cfg.code_line_height,
            indent: 0,
            paint: Paint::Code { lines },
        }
    }

    fn block(&mut self, block: &Block) {
        let gap = self.cfg.block_gap;
        let kind = block.kind_name();
        match block {
            Block::Heading { level, content } => {
                let b = self.text_box(content, TextStyle::Heading(*level), 0, kind, true);
                self.push(b, gap);
            }
            Block::Paragraph { content } => {
                let b = self.text_box(content, TextStyle::Body, 0, kind, false);
                self.push(b, gap);
            }
            Block::BlockQuote { content } => {
                let b = self.text_box(content, TextStyle::Body, self.cfg.quote_indent, kind, false);
                self.push(b, gap);
            }
            Block::Html { raw } => {
                let content = Inline {
                    text: raw.trim_end().to_string(),
                    html: String::new(),
                };
                let b = self.text_box(&content, TextStyle::Body, 0, kind, true);
                self.push(b, gap);
            }
            Block::ListItem { depth, content, .. } => {
                let indent = (*depth as u32 + 1) * self.cfg.list_indent;
                let b = self.text_box(content, TextStyle::Body, indent, kind, true);
                self.push(b, gap / 2);
            }
            Block::CodeBlock { code, .. } => {
                let b = self.code_box(code, kind);
                self.push(b, gap);
            }
            Block::Table { header, rows, .. } => {
                let columns = header.cells.len().max(1) as u32;
                let cell_width = (self.cfg.width / columns).saturating_sub(2 * self.cfg.cell_padding);
                let all_rows = std::iter::once((true, header)).chain(rows.iter().map(|r| (false, r)));
                let count = rows.len() + 1;
                for (i, (is_header, row)) in all_rows.enumerate() {
                    let cells: Vec<Vec<WrappedLine>> = row
                        .cells
                        .iter()
                        .map(|c| wrap_lines(&c.text, cell_width, self.measurer, TextStyle::Body))
                        .collect();
                    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1) as u32;
                    let b = LayoutBox {
                        y: 0,
                        height: lines * self.cfg.line_height + 2 * self.cfg.cell_padding,
                        atomic: true,
                        kind: "table_row",
                        keep_with_next: is_header,
                        line_height: self.cfg.line_height,
                        indent: 0,
                        paint: Paint::Row {
                            header: is_header,
                            columns,
                            cells,
                        },
                    };
                    let after = if i + 1 == count { gap } else { 0 };
                    self.push(b, after);
                }
            }
            Block::Image { .. } => {
                let b = LayoutBox {
                    y: 0,
                    height: self.cfg.image_height,
                    atomic: true,
                    kind,
                    keep_with_next: false,
                    line_height: self.cfg.image_height,
                    indent: 0,
                    paint: Paint::Picture {
                        width: self.cfg.width,
                        png: None,
                    },
                };
                self.push(b, gap);
            }
            Block::Diagram(diagram) => match &diagram.state {
                DiagramState::Rendered(image) => {
                    let (w, h) = fit_width(image.width, image.height, self.cfg.width);
                    let png = match image.encoding {
                        ImageEncoding::Png => Some(image.bytes.clone()),
                        ImageEncoding::Svg => None,
                    };
                    let b = LayoutBox {
                        y: 0,
                        height: h,
                        atomic: true,
                        kind,
                        keep_with_next: false,
                        line_height: h.max(1),
                        indent: (self.cfg.width - w) / 2,
                        paint: Paint::Picture { width: w, png },
                    };
                    self.push(b, gap);
                }
                DiagramState::Pending | DiagramState::Failed { .. } => {
                    let b = self.code_box(&diagram.source, kind);
                    self.push(b, gap);
                }
            },
            Block::Rule => {
                let b = LayoutBox {
                    y: 0,
                    height: self.cfg.rule_height,
                    atomic: true,
                    kind,
                    keep_with_next: false,
                    line_height: self.cfg.rule_height,
                    indent: 0,
                    paint: Paint::Rule,
                };
                self.push(b, gap);
            }
        }
    }
}

/// Scale `(w, h)` down to at most `max_width`, keeping the aspect ratio.
fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let h = (height as u64 * max_width as u64 / width as u64) as u32;
    (max_width, h.max(1))
}

pub fn layout_tree(tree: &VisualTree, cfg: &LayoutConfig, measurer: &dyn Measurer) -> Layout {
    let mut cursor = Cursor {
        cfg,
        measurer,
        y: 0,
        boxes: Vec::with_capacity(tree.blocks.len()),
    };
    for block in &tree.blocks {
        cursor.block(block);
    }
    // The surface ends at the last box; trailing gaps are not content.
    let height = cursor.boxes.last().map(LayoutBox::bottom).unwrap_or(0);
    Layout {
        width: cfg.width,
        height,
        boxes: cursor.boxes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MonoMeasurer;
    use crate::render::RenderPipeline;

    fn layout(markup: &str) -> Layout {
        let tree = RenderPipeline::default().structure(markup);
        layout_tree(&tree, &LayoutConfig::for_width(400), &MonoMeasurer)
    }

    fn texts(lines: &[WrappedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn wraps_words_at_the_width() {
        // 8 px per glyph: "aaaa" is 32 px, a space 8 px.
        let lines = wrap_lines("aaaa bbbb cccc", 72, &MonoMeasurer, TextStyle::Body);
        assert_eq!(texts(&lines), vec!["aaaa bbbb", "cccc"]);
        assert_eq!(lines.iter().map(|l| l.width).collect::<Vec<_>>(), vec![72, 32]);
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        assert_eq!(wrap_lines("a\nb", 100, &MonoMeasurer, TextStyle::Body).len(), 2);
        let empty = wrap_lines("", 100, &MonoMeasurer, TextStyle::Body);
        assert_eq!(empty, vec![WrappedLine { text: String::new(), width: 0 }]);
    }

    #[test]
    fn long_words_are_broken_without_losing_characters() {
        let lines = wrap_lines("abcdefghij xy", 32, &MonoMeasurer, TextStyle::Body);
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij", "xy"]);
        assert!(lines.iter().all(|l| l.width <= 32));
    }

    #[test]
    fn code_keeps_indentation_and_breaks_long_lines() {
        // 7 px per code glyph.
        let lines = wrap_code("fn main() {\n\tlet x = 1;\n}", 70, &MonoMeasurer);
        assert_eq!(texts(&lines), vec!["fn main() ", "{", "    let x ", "= 1;", "}"]);
    }

    #[test]
    fn boxes_stack_without_overlap() {
        let l = layout("# Title\n\nSome text.\n\n- one\n- two\n\n```\ncode\n```");
        assert!(l.boxes.len() >= 5);
        for pair in l.boxes.windows(2) {
            assert!(pair[0].bottom() <= pair[1].y);
        }
        assert_eq!(l.height, l.boxes.last().unwrap().bottom());
    }

    #[test]
    fn table_rows_are_separate_atomic_boxes() {
        let l = layout("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
        let rows: Vec<_> = l.boxes.iter().filter(|b| b.kind == "table_row").collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|b| b.atomic));
        assert!(rows[0].keep_with_next);
    }

    #[test]
    fn headings_keep_with_next_and_paragraphs_split() {
        let l = layout("## Head\n\nbody");
        assert!(l.boxes[0].keep_with_next);
        assert!(l.boxes[0].atomic);
        assert!(!l.boxes[1].atomic);
    }

    #[test]
    fn wide_images_are_scaled_to_fit() {
        assert_eq!(fit_width(800, 400, 400), (400, 200));
        assert_eq!(fit_width(100, 50, 400), (100, 50));
    }

    #[test]
    fn empty_tree_has_empty_layout() {
        assert!(layout("").is_empty());
    }
}
