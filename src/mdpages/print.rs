use chrono::{DateTime, Utc};
use colored::*;
use mdpages::api::{CmdMessage, MessageLevel};
use mdpages::config::MdPagesConfig;
use mdpages::index::DisplayDocument;
use mdpages::model::Document;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const ACTIVE_MARKER: &str = "●";

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

pub fn print_documents(documents: &[DisplayDocument]) {
    let now = Utc::now();
    for dd in documents {
        let marker = if dd.active {
            format!(" {} ", ACTIVE_MARKER)
        } else {
            "   ".to_string()
        };
        let idx_str = format!("{}. ", dd.index);
        let time_ago = format_saved(dd.document.last_saved_at, now);

        let preview = dd.document.preview_line();
        let name_preview = if preview.is_empty() {
            dd.document.name.clone()
        } else {
            format!("{}  {}", dd.document.name, preview)
        };

        let fixed_width = marker.width() + idx_str.width() + TIME_WIDTH + 1;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let display = truncate_to_width(&name_preview, available);
        let padding = available.saturating_sub(display.width());

        let idx_colored = if dd.active {
            idx_str.yellow()
        } else {
            idx_str.normal()
        };

        println!(
            "{}{}{}{} {}",
            marker.green(),
            idx_colored,
            display,
            " ".repeat(padding),
            time_ago.dimmed()
        );
    }
}

pub fn print_document(document: &Document) {
    println!("{}", document.name.bold());
    println!("--------------------------------");
    println!("{}", document.content);
}

pub fn print_config(config: &MdPagesConfig) {
    for key in MdPagesConfig::KEYS {
        let value = config.get(key).unwrap_or_default();
        println!("{} = {}", key, value);
    }
}

pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn format_saved(saved: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let text = match saved {
        Some(at) => {
            let duration = now.signed_duration_since(at).to_std().unwrap_or_default();
            timeago::Formatter::new().convert(duration)
        }
        None => "unsaved".to_string(),
    };
    format!("{:>width$}", text, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate_to_width("notes", 10), "notes");
    }

    #[test]
    fn long_strings_end_in_ellipsis_within_width() {
        let out = truncate_to_width("a very long document name", 10);
        assert!(out.ends_with('…'));
        assert!(out.width() <= 10);
    }

    #[test]
    fn wide_characters_count_double() {
        let out = truncate_to_width("日本語のドキュメント", 7);
        assert!(out.width() <= 7);
    }

    #[test]
    fn unsaved_documents_say_so() {
        assert_eq!(format_saved(None, Utc::now()).trim(), "unsaved");
    }

    #[test]
    fn saved_time_is_relative() {
        let now = Utc::now();
        let text = format_saved(Some(now - Duration::minutes(5)), now);
        assert!(text.trim().ends_with("ago"));
        assert_eq!(text.width(), TIME_WIDTH);
    }
}
