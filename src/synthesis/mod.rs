//! Assistant text to workspace files: sanitize, extract fenced blocks,
//! resolve their filenames, and project the reply for display.

pub mod extract;
pub mod format;
pub mod markdown;
pub mod resolver;
pub mod sanitize;

use extract::{extract, CodeBlock};
use format::{format_response, FormattedResponse};

#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Sanitized reply text; this is what gets recorded in chat history.
    pub content: String,
    pub blocks: Vec<CodeBlock>,
    pub formatted: FormattedResponse,
}

pub fn synthesize(raw: &str) -> Synthesis {
    let content = sanitize::sanitize_text(raw);
    let extraction = extract(&content);
    let formatted = format_response(&extraction.cleaned, &extraction.blocks);
    Synthesis {
        content,
        blocks: extraction.blocks,
        formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::synthesize;

    #[test]
    fn sanitizes_before_extracting() {
        let synthesis = synthesize("Create \u{201C}x\u{201D} in `app.js`:\n```js\nlet s = \u{201C}hi\u{201D};\n```");
        assert_eq!(synthesis.blocks.len(), 1);
        assert_eq!(synthesis.blocks[0].filename, "app.js");
        assert_eq!(synthesis.blocks[0].content, "let s = \"hi\";");
        assert!(synthesis.content.is_ascii());
        assert_eq!(synthesis.formatted.generated_files().count(), 1);
    }
}
