use crate::language::language_icon;
use crate::synthesis::extract::{BlockId, CodeBlock};
use crate::synthesis::markdown::escape_html;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const STEP_MARKER: &str = "###";

static DIRECTORY_TREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```\n(.*?)\n```").expect("directory tree pattern should compile")
});
static FILE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`]+\.[a-zA-Z0-9]+)`").expect("file reference pattern should compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    FileReference(String),
    DirectoryTree(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub block_id: BlockId,
    pub filename: String,
    pub language: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    Prose { body: Vec<Inline> },
    Step { title: String, body: Vec<Inline> },
    GeneratedFiles { files: Vec<GeneratedFile> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResponse {
    pub sections: Vec<Section>,
}

/// Projects cleaned assistant text and its extracted blocks into display
/// sections. Neither input is modified.
pub fn format_response(cleaned: &str, blocks: &[CodeBlock]) -> FormattedResponse {
    let mut sections: Vec<Section> = split_segments(cleaned)
        .into_iter()
        .filter_map(|segment| segment_to_section(&segment))
        .collect();

    if !blocks.is_empty() {
        sections.push(Section::GeneratedFiles {
            files: blocks
                .iter()
                .map(|block| GeneratedFile {
                    block_id: block.id.clone(),
                    filename: block.filename.clone(),
                    language: block.language.clone(),
                    icon: language_icon(&block.language).to_string(),
                })
                .collect(),
        });
    }

    FormattedResponse { sections }
}

fn split_segments(text: &str) -> Vec<String> {
    let mut segments: Vec<Vec<&str>> = vec![Vec::new()];
    for line in text.lines() {
        if line.trim_start().starts_with(STEP_MARKER) {
            segments.push(Vec::new());
        }
        if let Some(current) = segments.last_mut() {
            current.push(line);
        }
    }
    segments
        .into_iter()
        .map(|lines| lines.join("\n"))
        .collect()
}

fn segment_to_section(segment: &str) -> Option<Section> {
    let trimmed = segment.trim();
    if let Some(rest) = trimmed.strip_prefix(STEP_MARKER) {
        let (title, body) = rest.split_once('\n').unwrap_or((rest, ""));
        return Some(Section::Step {
            title: title.trim().to_string(),
            body: parse_body(body.trim()),
        });
    }
    if trimmed.is_empty() {
        return None;
    }
    Some(Section::Prose {
        body: parse_body(trimmed),
    })
}

fn parse_body(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut cursor = 0;
    for tree in DIRECTORY_TREE.captures_iter(text) {
        let (Some(whole), Some(listing)) = (tree.get(0), tree.get(1)) else {
            continue;
        };
        push_text_with_references(&text[cursor..whole.start()], &mut inlines);
        inlines.push(Inline::DirectoryTree(listing.as_str().trim().to_string()));
        cursor = whole.end();
    }
    push_text_with_references(&text[cursor..], &mut inlines);
    inlines
}

fn push_text_with_references(text: &str, inlines: &mut Vec<Inline>) {
    let mut cursor = 0;
    for reference in FILE_REFERENCE.captures_iter(text) {
        let (Some(whole), Some(name)) = (reference.get(0), reference.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            inlines.push(Inline::Text(text[cursor..whole.start()].to_string()));
        }
        inlines.push(Inline::FileReference(name.as_str().to_string()));
        cursor = whole.end();
    }
    if cursor < text.len() {
        inlines.push(Inline::Text(text[cursor..].to_string()));
    }
}

impl FormattedResponse {
    pub fn generated_files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.sections.iter().flat_map(|section| match section {
            Section::GeneratedFiles { files } => files.as_slice(),
            _ => &[][..],
        })
    }

    pub fn to_html(&self) -> String {
        self.sections
            .iter()
            .map(section_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn section_html(section: &Section) -> String {
    match section {
        Section::Prose { body } => {
            format!("<div class=\"message-section\">{}</div>", inlines_html(body))
        }
        Section::Step { title, body } => format!(
            "<div class=\"step-item\"><div class=\"step-title\">{}</div>\
             <div class=\"step-content\">{}</div></div>",
            escape_html(title),
            inlines_html(body)
        ),
        Section::GeneratedFiles { files } => {
            let list: String = files
                .iter()
                .map(|file| {
                    format!(
                        "<div class=\"code-block-reference\" data-block-id=\"{}\">\
                         <div class=\"code-block-header\"><i class=\"material-icons\">{}</i>\
                         <span class=\"code-block-filename\">{}</span></div></div>",
                        escape_html(file.block_id.as_str()),
                        file.icon,
                        escape_html(&file.filename)
                    )
                })
                .collect();
            format!(
                "<div class=\"generated-files-section\">\
                 <div class=\"generated-files-header\">Generated Files</div>\
                 <div class=\"generated-files-list\">{list}</div></div>"
            )
        }
    }
}

fn inlines_html(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => escape_html(text),
            Inline::FileReference(name) => {
                format!("<span class=\"file-reference\">{}</span>", escape_html(name))
            }
            Inline::DirectoryTree(listing) => format!(
                "<div class=\"directory-structure\"><pre>{}</pre></div>",
                escape_html(listing)
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{format_response, Inline, Section};
    use crate::synthesis::extract::extract;

    #[test]
    fn splits_prose_and_step_sections() {
        let formatted = format_response("Intro text\n### Step 1: Setup\nInstall it.\n### Step 2\n", &[]);
        assert_eq!(
            formatted.sections,
            vec![
                Section::Prose {
                    body: vec![Inline::Text("Intro text".to_string())]
                },
                Section::Step {
                    title: "Step 1: Setup".to_string(),
                    body: vec![Inline::Text("Install it.".to_string())]
                },
                Section::Step {
                    title: "Step 2".to_string(),
                    body: Vec::new()
                },
            ]
        );
    }

    #[test]
    fn marks_file_references_and_directory_trees() {
        let formatted = format_response("Edit `app.js` and `npm`:\n```\nsrc/\n  app.js\n```\nend", &[]);
        let Section::Prose { body } = &formatted.sections[0] else {
            panic!("expected prose section");
        };
        assert_eq!(
            body,
            &vec![
                Inline::Text("Edit ".to_string()),
                Inline::FileReference("app.js".to_string()),
                Inline::Text(" and `npm`:\n".to_string()),
                Inline::DirectoryTree("src/\n  app.js".to_string()),
                Inline::Text("\nend".to_string()),
            ]
        );
    }

    #[test]
    fn appends_generated_files_after_all_segments() {
        let extraction = extract("### Build\nCreate `index.html`:\n```html\n<p>x</p>\n```");
        let formatted = format_response(&extraction.cleaned, &extraction.blocks);
        assert_eq!(formatted.sections.len(), 2);
        let files: Vec<_> = formatted.generated_files().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "index.html");
        assert_eq!(files[0].icon, "html");
        assert_eq!(files[0].block_id, extraction.blocks[0].id);
    }

    #[test]
    fn no_generated_files_section_without_blocks() {
        let formatted = format_response("just text", &[]);
        assert_eq!(formatted.generated_files().count(), 0);
        assert_eq!(
            formatted.to_html(),
            "<div class=\"message-section\">just text</div>"
        );
    }

    #[test]
    fn html_projection_escapes_step_titles() {
        let formatted = format_response("### <Setup>\nuse `main.rs`", &[]);
        let html = formatted.to_html();
        assert!(html.contains("<div class=\"step-title\">&lt;Setup&gt;</div>"));
        assert!(html.contains("<span class=\"file-reference\">main.rs</span>"));
    }
}
