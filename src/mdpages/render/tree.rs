use serde::Serialize;

/// The rendered form of a document: block-level units in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualTree {
    /// Render pass that produced this tree; diagram instance ids embed it.
    pub pass: u64,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlign {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMarker {
    Bullet,
    Ordered(u64),
}

/// Inline content kept in two forms: plain text for measuring, HTML for preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inline {
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Svg,
    Png,
}

/// A diagram rendered to a static image by the external engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramImage {
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DiagramState {
    Pending,
    Rendered(DiagramImage),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagram {
    /// Unique per diagram per render pass: `diagram-{pass}-{index}`.
    pub instance_id: String,
    pub language: String,
    pub source: String,
    pub state: DiagramState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        content: Inline,
    },
    Paragraph {
        content: Inline,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
        highlighted: String,
    },
    Table {
        alignments: Vec<ColumnAlign>,
        header: TableRow,
        rows: Vec<TableRow>,
    },
    ListItem {
        depth: usize,
        marker: ListMarker,
        checked: Option<bool>,
        content: Inline,
    },
    Image {
        src: String,
        alt: String,
    },
    Diagram(Diagram),
    BlockQuote {
        content: Inline,
    },
    Rule,
    Html {
        raw: String,
    },
}

impl Block {
    /// Whether pagination must keep this unit on a single page.
    ///
    /// Tables are not atomic as a whole; each of their rows is.
    pub fn is_atomic(&self) -> bool {
        !matches!(
            self,
            Block::Paragraph { .. } | Block::BlockQuote { .. } | Block::Table { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::CodeBlock { .. } => "code_block",
            Block::Table { .. } => "table",
            Block::ListItem { .. } => "list_item",
            Block::Image { .. } => "image",
            Block::Diagram(_) => "diagram",
            Block::BlockQuote { .. } => "block_quote",
            Block::Rule => "rule",
            Block::Html { .. } => "html",
        }
    }
}

impl VisualTree {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn diagrams(&self) -> impl Iterator<Item = &Diagram> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Diagram(d) => Some(d),
            _ => None,
        })
    }

    /// True once no diagram is still waiting on the engine.
    pub fn is_final(&self) -> bool {
        self.diagrams()
            .all(|d| !matches!(d.state, DiagramState::Pending))
    }

    /// Readable text of the whole tree, one block per paragraph.
    pub fn plain_text(&self) -> String {
        let mut out = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let text = match block {
                Block::Heading { content, .. }
                | Block::Paragraph { content }
                | Block::BlockQuote { content }
                | Block::ListItem { content, .. } => content.text.clone(),
                Block::CodeBlock { code, .. } => code.clone(),
                Block::Table { header, rows, .. } => std::iter::once(header)
                    .chain(rows.iter())
                    .map(|r| {
                        r.cells
                            .iter()
                            .map(|c| c.text.as_str())
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                Block::Image { alt, .. } => alt.clone(),
                Block::Diagram(d) => d.source.clone(),
                Block::Rule => "---".to_string(),
                Block::Html { raw } => raw.clone(),
            };
            out.push(text);
        }
        out.join("\n\n")
    }
}
