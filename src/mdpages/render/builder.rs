//! Markdown event stream -> visual tree (the synchronous structural pass).

use super::highlight::{highlight_or_escape, Highlighter};
use super::tree::{
    Block, ColumnAlign, Diagram, DiagramState, Inline, ListMarker, TableRow, VisualTree,
};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

struct ListContext {
    next_number: Option<u64>,
}

struct PendingItem {
    depth: usize,
    marker: ListMarker,
    checked: Option<bool>,
}

struct TableContext {
    alignments: Vec<ColumnAlign>,
    header: Vec<Inline>,
    rows: Vec<TableRow>,
    current_row: Vec<Inline>,
    in_head: bool,
}

struct CodeContext {
    language: Option<String>,
    code: String,
}

pub(crate) struct TreeBuilder<'h> {
    pass: u64,
    highlighter: &'h dyn Highlighter,
    diagram_languages: &'h [String],
    blocks: Vec<Block>,
    inline: Vec<Event<'static>>,
    lists: Vec<ListContext>,
    item: Option<PendingItem>,
    table: Option<TableContext>,
    code: Option<CodeContext>,
    html: Option<String>,
    quote_depth: usize,
    diagram_count: usize,
}

impl<'h> TreeBuilder<'h> {
    pub(crate) fn new(
        pass: u64,
        highlighter: &'h dyn Highlighter,
        diagram_languages: &'h [String],
    ) -> Self {
        Self {
            pass,
            highlighter,
            diagram_languages,
            blocks: Vec::new(),
            inline: Vec::new(),
            lists: Vec::new(),
            item: None,
            table: None,
            code: None,
            html: None,
            quote_depth: 0,
            diagram_count: 0,
        }
    }

    pub(crate) fn build(mut self, markup: &str) -> VisualTree {
        for event in Parser::new_ext(markup, markdown_options()) {
            self.process_event(event.into_static());
        }
        self.flush_item();
        VisualTree {
            pass: self.pass,
            blocks: self.blocks,
        }
    }

    fn process_event(&mut self, event: Event<'static>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.code.push_str(&text);
                } else {
                    self.inline.push(Event::Text(text));
                }
            }
            Event::Html(raw) => match self.html.as_mut() {
                Some(html) => html.push_str(&raw),
                None => self.blocks.push(Block::Html {
                    raw: raw.to_string(),
                }),
            },
            Event::Rule => {
                self.flush_item();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                if let Some(item) = self.item.as_mut() {
                    item.checked = Some(checked);
                }
            }
            other => self.inline.push(other),
        }
    }

    fn start(&mut self, tag: Tag<'static>) {
        match tag {
            Tag::List(start) => {
                // Text an outer item held before its nested list belongs to it.
                self.flush_item();
                self.lists.push(ListContext { next_number: start });
            }
            Tag::Item => {
                self.flush_item();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(ListContext {
                        next_number: Some(n),
                    }) => {
                        let marker = ListMarker::Ordered(*n);
                        *n += 1;
                        marker
                    }
                    _ => ListMarker::Bullet,
                };
                self.item = Some(PendingItem {
                    depth,
                    marker,
                    checked: None,
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_item();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeContext {
                    language,
                    code: String::new(),
                });
            }
            Tag::HtmlBlock => {
                self.flush_item();
                self.html = Some(String::new());
            }
            Tag::BlockQuote(_) => {
                self.flush_item();
                self.quote_depth += 1;
            }
            Tag::Table(alignments) => {
                self.table = Some(TableContext {
                    alignments: alignments.into_iter().map(column_align).collect(),
                    header: Vec::new(),
                    rows: Vec::new(),
                    current_row: Vec::new(),
                    in_head: false,
                });
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.current_row.clear();
                }
            }
            Tag::TableCell | Tag::Paragraph | Tag::Heading { .. } => {
                if self.item.is_none() {
                    self.inline.clear();
                }
            }
            other => self.inline.push(Event::Start(other)),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.item.is_some() {
                    // Loose list items: keep paragraphs inside the item.
                    self.inline.push(Event::HardBreak);
                    return;
                }
                let events = std::mem::take(&mut self.inline);
                if let Some((src, alt)) = lone_image(&events) {
                    self.blocks.push(Block::Image { src, alt });
                } else if self.quote_depth > 0 {
                    self.blocks.push(Block::BlockQuote {
                        content: inline_content(events),
                    });
                } else {
                    self.blocks.push(Block::Paragraph {
                        content: inline_content(events),
                    });
                }
            }
            TagEnd::Heading(level) => {
                let events = std::mem::take(&mut self.inline);
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    content: inline_content(events),
                });
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.flush_item();
                self.lists.pop();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    let block = self.code_block(code);
                    self.blocks.push(block);
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(raw) = self.html.take() {
                    self.blocks.push(Block::Html { raw });
                }
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::TableCell => {
                let events = std::mem::take(&mut self.inline);
                if let Some(table) = self.table.as_mut() {
                    table.current_row.push(inline_content(events));
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.current_row);
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    if !table.in_head {
                        let cells = std::mem::take(&mut table.current_row);
                        table.rows.push(TableRow { cells });
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table {
                        alignments: table.alignments,
                        header: TableRow {
                            cells: table.header,
                        },
                        rows: table.rows,
                    });
                }
            }
            other => self.inline.push(Event::End(other)),
        }
    }

    fn flush_item(&mut self) {
        let Some(item) = self.item.take() else {
            return;
        };
        let mut events = std::mem::take(&mut self.inline);
        while matches!(events.last(), Some(Event::HardBreak)) {
            events.pop();
        }
        self.blocks.push(Block::ListItem {
            depth: item.depth,
            marker: item.marker,
            checked: item.checked,
            content: inline_content(events),
        });
    }

    fn code_block(&mut self, code: CodeContext) -> Block {
        let is_diagram = code
            .language
            .as_deref()
            .is_some_and(|lang| self.diagram_languages.iter().any(|d| d == lang));

        if let (true, Some(language)) = (is_diagram, code.language.clone()) {
            let instance_id = format!("diagram-{}-{}", self.pass, self.diagram_count);
            self.diagram_count += 1;
            return Block::Diagram(Diagram {
                instance_id,
                language,
                source: code.code,
                state: DiagramState::Pending,
            });
        }

        let highlighted =
            highlight_or_escape(self.highlighter, &code.code, code.language.as_deref());
        Block::CodeBlock {
            language: code.language,
            code: code.code,
            highlighted,
        }
    }
}

fn column_align(alignment: Alignment) -> ColumnAlign {
    match alignment {
        Alignment::None => ColumnAlign::None,
        Alignment::Left => ColumnAlign::Left,
        Alignment::Center => ColumnAlign::Center,
        Alignment::Right => ColumnAlign::Right,
    }
}

/// A paragraph holding nothing but one image becomes an image block.
fn lone_image(events: &[Event<'static>]) -> Option<(String, String)> {
    let (first, rest) = events.split_first()?;
    let Event::Start(Tag::Image { dest_url, .. }) = first else {
        return None;
    };
    let (last, middle) = rest.split_last()?;
    if !matches!(last, Event::End(TagEnd::Image)) {
        return None;
    }
    let mut alt = String::new();
    for event in middle {
        match event {
            Event::Text(t) | Event::Code(t) => alt.push_str(t),
            _ => return None,
        }
    }
    Some((dest_url.to_string(), alt))
}

/// Soft breaks render as hard breaks, so single newlines are kept.
fn inline_content(events: Vec<Event<'static>>) -> Inline {
    let mut text = String::new();
    for event in &events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }
    let mut html = String::new();
    pulldown_cmark::html::push_html(
        &mut html,
        events.into_iter().map(|e| match e {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        }),
    );
    Inline {
        text: text.trim_end().to_string(),
        html: html.trim_end().to_string(),
    }
}
