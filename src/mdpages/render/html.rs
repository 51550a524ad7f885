//! Preview HTML for a visual tree.

use super::highlight::escape_html;
use super::tree::{Block, ColumnAlign, DiagramState, ImageEncoding, ListMarker, TableRow, VisualTree};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

impl VisualTree {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            push_block(&mut out, block);
            out.push('\n');
        }
        out
    }
}

fn push_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{0}>{1}</h{0}>", level, content.html));
        }
        Block::Paragraph { content } => {
            out.push_str(&format!("<p>{}</p>", content.html));
        }
        Block::BlockQuote { content } => {
            out.push_str(&format!("<blockquote><p>{}</p></blockquote>", content.html));
        }
        Block::CodeBlock {
            language,
            highlighted,
            ..
        } => match language {
            Some(lang) => out.push_str(&format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                escape_html(lang),
                highlighted
            )),
            None => out.push_str(&format!("<pre><code>{}</code></pre>", highlighted)),
        },
        Block::ListItem {
            depth,
            marker,
            checked,
            content,
        } => {
            let marker = match marker {
                ListMarker::Bullet => "bullet".to_string(),
                ListMarker::Ordered(n) => format!("ordered\" value=\"{}", n),
            };
            out.push_str(&format!(
                "<li class=\"{}\" data-depth=\"{}\">",
                marker, depth
            ));
            if let Some(done) = checked {
                out.push_str(if *done {
                    "<input type=\"checkbox\" checked disabled> "
                } else {
                    "<input type=\"checkbox\" disabled> "
                });
            }
            out.push_str(&content.html);
            out.push_str("</li>");
        }
        Block::Table {
            alignments,
            header,
            rows,
        } => {
            out.push_str("<table><thead>");
            push_row(out, header, alignments, "th");
            out.push_str("</thead><tbody>");
            for row in rows {
                push_row(out, row, alignments, "td");
            }
            out.push_str("</tbody></table>");
        }
        Block::Image { src, alt } => {
            out.push_str(&format!(
                "<p><img src=\"{}\" alt=\"{}\"></p>",
                escape_html(src),
                escape_html(alt)
            ));
        }
        Block::Diagram(diagram) => match &diagram.state {
            DiagramState::Rendered(image) => {
                out.push_str(&format!("<div class=\"diagram\" id=\"{}\">", diagram.instance_id));
                match image.encoding {
                    ImageEncoding::Svg => out.push_str(&String::from_utf8_lossy(&image.bytes)),
                    ImageEncoding::Png => out.push_str(&format!(
                        "<img src=\"data:image/png;base64,{}\" width=\"{}\" height=\"{}\">",
                        STANDARD.encode(&image.bytes),
                        image.width,
                        image.height
                    )),
                }
                out.push_str("</div>");
            }
            DiagramState::Pending | DiagramState::Failed { .. } => {
                out.push_str(&format!(
                    "<pre class=\"diagram-source\" id=\"{}\">{}</pre>",
                    diagram.instance_id,
                    escape_html(&diagram.source)
                ));
            }
        },
        Block::Rule => out.push_str("<hr>"),
        Block::Html { raw } => out.push_str(raw.trim_end()),
    }
}

fn push_row(out: &mut String, row: &TableRow, alignments: &[ColumnAlign], cell: &str) {
    out.push_str("<tr>");
    for (i, content) in row.cells.iter().enumerate() {
        let style = match alignments.get(i).copied().unwrap_or(ColumnAlign::None) {
            ColumnAlign::None => "",
            ColumnAlign::Left => " style=\"text-align: left\"",
            ColumnAlign::Center => " style=\"text-align: center\"",
            ColumnAlign::Right => " style=\"text-align: right\"",
        };
        out.push_str(&format!("<{0}{1}>{2}</{0}>", cell, style, content.html));
    }
    out.push_str("</tr>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tree::{Diagram, DiagramImage, Inline};

    fn tree(blocks: Vec<Block>) -> VisualTree {
        VisualTree { pass: 1, blocks }
    }

    #[test]
    fn failed_diagram_shows_escaped_source() {
        let html = tree(vec![Block::Diagram(Diagram {
            instance_id: "diagram-1-0".into(),
            language: "mermaid".into(),
            source: "A --> <B>".into(),
            state: DiagramState::Failed {
                reason: "nope".into(),
            },
        })])
        .to_html();
        assert!(html.contains("<pre class=\"diagram-source\" id=\"diagram-1-0\">A --&gt; &lt;B&gt;</pre>"));
    }

    #[test]
    fn png_diagrams_are_inlined_as_data_uris() {
        let html = tree(vec![Block::Diagram(Diagram {
            instance_id: "diagram-1-0".into(),
            language: "mermaid".into(),
            source: "graph".into(),
            state: DiagramState::Rendered(DiagramImage {
                width: 3,
                height: 2,
                encoding: ImageEncoding::Png,
                bytes: vec![1, 2, 3],
            }),
        })])
        .to_html();
        assert!(html.contains("data:image/png;base64,AQID"));
        assert!(html.contains("width=\"3\" height=\"2\""));
    }

    #[test]
    fn headings_tasks_and_tables() {
        let html = tree(vec![
            Block::Heading {
                level: 2,
                content: Inline {
                    text: "Hi".into(),
                    html: "Hi".into(),
                },
            },
            Block::ListItem {
                depth: 0,
                marker: ListMarker::Bullet,
                checked: Some(true),
                content: Inline {
                    text: "done".into(),
                    html: "done".into(),
                },
            },
            Block::Table {
                alignments: vec![ColumnAlign::Right],
                header: TableRow {
                    cells: vec![Inline {
                        text: "n".into(),
                        html: "n".into(),
                    }],
                },
                rows: vec![],
            },
        ])
        .to_html();
        assert!(html.contains("<h2>Hi</h2>"));
        assert!(html.contains("checked disabled> done</li>"));
        assert!(html.contains("<th style=\"text-align: right\">n</th>"));
    }
}
