use crate::synthesis::resolver::{self, Resolution, CONTEXT_LINES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```(\w+)\s*(?:[(`]?([^\n`)]+)[)`]?)?\s*$")
        .expect("opening fence pattern should compile")
});
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\s*$").expect("closing fence pattern should compile"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    fn fresh() -> Self {
        Self(format!("code-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub id: BlockId,
    pub language: String,
    pub filename: String,
    pub content: String,
    pub order: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub blocks: Vec<CodeBlock>,
    /// Input text with every finalized block (fences included) removed.
    pub cleaned: String,
}

#[derive(Debug)]
struct PendingBlock {
    resolution: Resolution,
    raw_lines: Vec<String>,
    lines: Vec<String>,
}

#[derive(Debug)]
enum ScanState {
    Outside,
    Inside(PendingBlock),
}

/// Line scanner that turns sanitized assistant text into code blocks.
#[derive(Debug)]
struct BlockScanner {
    state: ScanState,
    context: VecDeque<String>,
    blocks: Vec<CodeBlock>,
    cleaned: Vec<String>,
}

impl BlockScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Outside,
            context: VecDeque::with_capacity(CONTEXT_LINES),
            blocks: Vec::new(),
            cleaned: Vec::new(),
        }
    }

    fn feed(&mut self, raw_line: &str) {
        let line = raw_line.trim();
        match std::mem::replace(&mut self.state, ScanState::Outside) {
            ScanState::Outside => match OPENING_FENCE.captures(line) {
                Some(captures) => {
                    let tag = captures.get(1).map_or("", |tag| tag.as_str());
                    let metadata = captures.get(2).map(|metadata| metadata.as_str());
                    let preceding: Vec<&str> = self.context.iter().map(String::as_str).collect();
                    self.state = ScanState::Inside(PendingBlock {
                        resolution: resolver::resolve(tag, metadata, &preceding),
                        raw_lines: vec![raw_line.to_string()],
                        lines: Vec::new(),
                    });
                }
                None => {
                    if !CLOSING_FENCE.is_match(line) {
                        self.remember(line);
                    }
                    self.cleaned.push(raw_line.to_string());
                }
            },
            ScanState::Inside(mut pending) => {
                if CLOSING_FENCE.is_match(line) {
                    self.finish(pending);
                } else {
                    pending.raw_lines.push(raw_line.to_string());
                    pending.lines.push(line.to_string());
                    self.remember(line);
                    self.state = ScanState::Inside(pending);
                }
            }
        }
    }

    fn finish(&mut self, pending: PendingBlock) {
        if pending.lines.is_empty() {
            return;
        }
        let order = self.blocks.len();
        tracing::debug!(
            filename = %pending.resolution.filename,
            source = ?pending.resolution.source,
            order,
            "extracted code block"
        );
        self.blocks.push(CodeBlock {
            id: BlockId::fresh(),
            language: pending.resolution.language,
            filename: pending.resolution.filename,
            content: pending.lines.join("\n"),
            order,
        });
    }

    fn remember(&mut self, line: &str) {
        if self.context.len() == CONTEXT_LINES {
            self.context.pop_front();
        }
        self.context.push_back(line.to_string());
    }

    fn into_extraction(mut self) -> Extraction {
        // An unterminated block yields nothing; its text stays in the prose.
        if let ScanState::Inside(pending) = std::mem::replace(&mut self.state, ScanState::Outside) {
            self.cleaned.extend(pending.raw_lines);
        }
        Extraction {
            blocks: self.blocks,
            cleaned: self.cleaned.join("\n"),
        }
    }
}

pub fn extract(text: &str) -> Extraction {
    let mut scanner = BlockScanner::new();
    for line in text.lines() {
        scanner.feed(line);
    }
    scanner.into_extraction()
}
