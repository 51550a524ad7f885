use std::sync::OnceLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Syntax highlighting callback, keyed by the fence's declared language.
///
/// Implementations return safe HTML for the code body, or `None` to fall back
/// to escaped plain text.
pub trait Highlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Option<String>;

    /// CSS the highlighted markup needs, if any.
    fn stylesheet(&self) -> Option<String> {
        None
    }
}

/// No highlighting: every block falls back to escaped text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _language: Option<&str>) -> Option<String> {
        None
    }
}

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };
const THEME: &str = "InspiredGitHub";

fn syntaxes() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Class-based highlighting with syntect's bundled grammars.
///
/// The fence language is looked up as a grammar token (`rust`, `py`, `sh`...).
/// Fences without a language are matched by their first line, e.g. a shebang.
/// Unknown languages fall back to escaped text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectHighlighter;

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        let set = syntaxes();
        let syntax = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(token) => set.find_syntax_by_token(token)?,
            None => set.find_syntax_by_first_line(code.lines().next()?)?,
        };
        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                log::debug!("highlighting as {} failed: {}", syntax.name, e);
                return None;
            }
        }
        Some(generator.finalize())
    }

    fn stylesheet(&self) -> Option<String> {
        let themes = ThemeSet::load_defaults();
        let theme = themes.themes.get(THEME)?;
        css_for_theme_with_class_style(theme, CLASS_STYLE)
            .map_err(|e| log::warn!("highlight stylesheet: {}", e))
            .ok()
    }
}

/// Highlight through `highlighter`, falling back to escaped text.
pub fn highlight_or_escape(highlighter: &dyn Highlighter, code: &str, language: Option<&str>) -> String {
    highlighter
        .highlight(code, language)
        .unwrap_or_else(|| escape_html(code))
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Highlighter for Upper {
        fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
            (language == Some("shout")).then(|| code.to_uppercase())
        }
    }

    #[test]
    fn escapes_when_highlighter_declines() {
        assert_eq!(
            highlight_or_escape(&PlainHighlighter, "<a & b>", Some("rust")),
            "&lt;a &amp; b&gt;"
        );
    }

    #[test]
    fn known_languages_get_classed_spans() {
        let html = SyntectHighlighter
            .highlight("fn main() { let a = 1 < 2; }\n", Some("rust"))
            .unwrap();
        assert!(html.contains("<span class=\"hl-source hl-rust\">"), "{}", html);
        assert!(html.matches("<span").count() > 2);
        assert!(html.contains("&lt;"));
        assert!(!html.contains(" < "));
    }

    #[test]
    fn unknown_languages_fall_back_to_escaped_text() {
        assert_eq!(SyntectHighlighter.highlight("<x>", Some("klingon")), None);
        assert_eq!(
            highlight_or_escape(&SyntectHighlighter, "<x>\n", Some("klingon")),
            "&lt;x&gt;\n"
        );
        assert_eq!(SyntectHighlighter.highlight("plain words\n", None), None);
    }

    #[test]
    fn shebang_picks_a_grammar_without_a_language() {
        let html = SyntectHighlighter
            .highlight("#!/bin/bash\necho hi\n", None)
            .unwrap();
        assert!(html.contains("hl-shell"), "{}", html);
    }

    #[test]
    fn stylesheet_targets_the_prefixed_classes() {
        let css = SyntectHighlighter.stylesheet().unwrap();
        assert!(css.contains(".hl-"));
        assert_eq!(PlainHighlighter.stylesheet(), None);
    }

    #[test]
    fn uses_highlighter_output_by_language() {
        assert_eq!(highlight_or_escape(&Upper, "hi", Some("shout")), "HI");
        assert_eq!(highlight_or_escape(&Upper, "hi", None), "hi");
    }
}
