use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NAME: &str = "Untitled";

/// One user-authored markup source.
///
/// Serialized with camelCase keys so the persisted `documents` record keeps the
/// `{id, name, content, lastSavedAt}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            last_saved_at: None,
        }
    }

    /// First non-empty line of content, used by listings.
    pub fn preview_line(&self) -> &str {
        self.content
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// The current persisted layout: the collection plus the active pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentFormat {
    pub documents: Vec<Document>,
    pub active_id: Option<Uuid>,
}

/// The pre-multi-document layout: one blob, one timestamp, no identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub content: String,
    pub last_saved: Option<String>,
}

/// True when `name` is `Untitled` or `Untitled <number>`.
pub fn is_default_name(name: &str) -> bool {
    match name.strip_prefix(DEFAULT_NAME) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(' ')
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())),
        None => false,
    }
}

/// Picks the next auto-generated name given the names already in use.
pub fn next_default_name<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken = existing.into_iter().filter(|n| is_default_name(n)).count();
    if taken == 0 {
        DEFAULT_NAME.to_string()
    } else {
        format!("{} {}", DEFAULT_NAME, taken + 1)
    }
}

pub const WELCOME_MARKDOWN: &str = r#"# Markdown to Pages

Start typing in the editor. The preview follows every keystroke and
**Export** turns it into print-ready pages.

## Features

- **Live preview**: see the rendered document as you type
- **Code highlighting**: fenced blocks keep their language
- **Diagrams**: `mermaid` blocks are rendered as images
- **Paginated export**: headings, code, rows and list items never split

## Code Example

```rust
fn main() {
    println!("Converting markdown to pages!");
}
```

## Table Example

| Feature | Status |
|---------|--------|
| Markdown parsing | ✅ |
| Page export | ✅ |
| Syntax highlighting | ✅ |

> "The best way to predict the future is to invent it."
> - Alan Kay
"#;
