//! Chat-turn markup: fenced spans become code panels, everything else goes
//! through a small inline markdown pass.

use crate::language::language_icon;
use regex::Regex;
use std::sync::LazyLock;

static FENCED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("fenced span pattern should compile"));
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern should compile"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern should compile"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern should compile"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern should compile"));
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- (.+)$").expect("unordered item pattern should compile"));
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\d+\. (.+)$").expect("ordered item pattern should compile")
});
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\.").expect("ordered marker pattern should compile"));

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn format_assistant_message(message: &str) -> String {
    let mut formatted = String::new();
    let mut cursor = 0;
    for fenced in FENCED_SPAN.find_iter(message) {
        formatted.push_str(&format_markdown(&message[cursor..fenced.start()]));
        formatted.push_str(&code_panel(fenced.as_str()));
        cursor = fenced.end();
    }
    formatted.push_str(&format_markdown(&message[cursor..]));
    formatted
}

fn code_panel(fenced: &str) -> String {
    let lines: Vec<&str> = fenced.split('\n').collect();
    let label = lines[0].trim_start_matches("```").trim();
    let language = if label.is_empty() { "plaintext" } else { label };
    let code = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        String::new()
    };
    let language = escape_html(language);

    format!(
        "<div class=\"code-block-container\"><div class=\"code-block-header\">\
         <span class=\"material-icons\">{}</span>{language}</div>\
         <pre><code class=\"language-{language}\">{}</code></pre></div>",
        language_icon(&language),
        escape_html(&code)
    )
}

fn format_markdown(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    PARAGRAPH_BREAK
        .split(text)
        .map(|paragraph| {
            let paragraph = paragraph.trim();
            let escaped = escape_html(paragraph);
            let formatted = BOLD.replace_all(&escaped, "<strong>$1</strong>");
            let formatted = ITALIC.replace_all(&formatted, "<em>$1</em>");
            let formatted = INLINE_CODE.replace_all(&formatted, "<code>$1</code>");
            let formatted = UNORDERED_ITEM.replace_all(&formatted, "<li>$1</li>");
            let formatted = ORDERED_ITEM.replace_all(&formatted, "<li>$1</li>").into_owned();

            if formatted.contains("<li>") {
                if ORDERED_MARKER.is_match(paragraph) {
                    return format!("<ol>{formatted}</ol>");
                }
                if paragraph.starts_with('-') || paragraph.contains("\n-") {
                    return format!("<ul>{formatted}</ul>");
                }
            }
            format!("<p>{formatted}</p>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{escape_html, format_assistant_message};

    #[test]
    fn fenced_spans_become_escaped_code_panels() {
        let html = format_assistant_message("Try this:\n```html\n<b>hi</b>\n```");
        assert!(html.starts_with("<p>Try this:</p>"));
        assert!(html.contains("<span class=\"material-icons\">html</span>html"));
        assert!(html.contains("<code class=\"language-html\">&lt;b&gt;hi&lt;/b&gt;</code>"));
    }

    #[test]
    fn untagged_fence_is_labeled_plaintext() {
        let html = format_assistant_message("```\nsrc/\n```");
        assert!(html.contains("description</span>plaintext"));
        assert!(html.contains(">src/</code>"));
    }

    #[test]
    fn inline_markdown_is_applied_per_paragraph() {
        let html = format_assistant_message("**Bold** and *soft* with `x<y`\n\nplain");
        assert_eq!(
            html,
            "<p><strong>Bold</strong> and <em>soft</em> with <code>x&lt;y</code></p>\n<p>plain</p>"
        );
    }

    #[test]
    fn lists_are_wrapped_by_style() {
        assert_eq!(
            format_assistant_message("- one\n- two"),
            "<ul><li>one</li>\n<li>two</li></ul>"
        );
        assert_eq!(
            format_assistant_message("1. one\n2. two"),
            "<ol><li>one</li>\n<li>two</li></ol>"
        );
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
