//! In-memory multi-file workspace. Filenames are the only identity; the open
//! tab list and current file always refer to records that exist.

pub mod tabs;

use crate::language::language_for_filename;
use crate::synthesis::extract::{BlockId, CodeBlock};
use crate::synthesis::sanitize::format_code_content;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub filename: String,
    pub content: String,
    pub language: String,
    pub last_modified: DateTime<Local>,
    pub origin_block_id: Option<BlockId>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// What the editor buffer should show after a tab change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferSwap {
    Show(String),
    Clear,
}

#[derive(Debug, Default)]
pub struct Workspace {
    files: BTreeMap<String, FileRecord>,
    order: Vec<String>,
    open_files: Vec<String>,
    current_file: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(
        &mut self,
        filename: &str,
        content: &str,
        language: Option<&str>,
        origin_block_id: Option<BlockId>,
    ) -> UpsertOutcome {
        let now = Local::now();
        if let Some(record) = self.files.get_mut(filename) {
            record.content = content.to_string();
            record.last_modified = now;
            if origin_block_id.is_some() {
                record.origin_block_id = origin_block_id;
            }
            tracing::debug!(filename, "updated workspace file");
            return UpsertOutcome::Updated;
        }

        let derived = language_for_filename(filename);
        let language = match (derived, language) {
            ("plaintext", Some(hint)) if !hint.trim().is_empty() => hint.to_ascii_lowercase(),
            (derived, _) => derived.to_string(),
        };
        self.files.insert(
            filename.to_string(),
            FileRecord {
                filename: filename.to_string(),
                content: content.to_string(),
                language,
                last_modified: now,
                origin_block_id,
                is_open: false,
            },
        );
        self.order.push(filename.to_string());
        tracing::debug!(filename, "created workspace file");
        UpsertOutcome::Created
    }

    /// Manual creation: stores the file and makes it current.
    pub fn add_file(&mut self, filename: &str, content: &str) -> UpsertOutcome {
        let outcome = self.upsert(filename, content, None, None);
        self.open_tab(filename);
        outcome
    }

    /// Formats and stores every extracted block. Other files are untouched.
    pub fn apply_blocks(&mut self, blocks: &[CodeBlock]) -> Vec<(String, UpsertOutcome)> {
        blocks
            .iter()
            .map(|block| {
                let outcome = self.upsert(
                    &block.filename,
                    &format_code_content(&block.content),
                    Some(&block.language),
                    Some(block.id.clone()),
                );
                (block.filename.clone(), outcome)
            })
            .collect()
    }

    pub fn open_tab(&mut self, filename: &str) -> Option<BufferSwap> {
        let record = self.files.get_mut(filename)?;
        record.is_open = true;
        if !self.open_files.iter().any(|open| open == filename) {
            self.open_files.push(filename.to_string());
        }
        self.current_file = Some(filename.to_string());
        Some(BufferSwap::Show(filename.to_string()))
    }

    /// Closes a tab, keeping the file. Returns a swap only when the current
    /// file changed.
    pub fn close_tab(&mut self, filename: &str) -> Option<BufferSwap> {
        let index = self.open_files.iter().position(|open| open == filename)?;

        let swap = if self.current_file.as_deref() == Some(filename) {
            let replacement = self
                .open_files
                .get(index + 1)
                .or_else(|| index.checked_sub(1).and_then(|prev| self.open_files.get(prev)))
                .cloned();
            self.current_file = replacement.clone();
            Some(match replacement {
                Some(next) => BufferSwap::Show(next),
                None => BufferSwap::Clear,
            })
        } else {
            None
        };

        self.open_files.remove(index);
        if let Some(record) = self.files.get_mut(filename) {
            record.is_open = false;
        }
        swap
    }

    /// Removes a file entirely. Returns `None` when the file is unknown.
    pub fn delete_file(&mut self, filename: &str) -> Option<Option<BufferSwap>> {
        if !self.files.contains_key(filename) {
            return None;
        }
        let swap = self.close_tab(filename);
        self.files.remove(filename);
        self.order.retain(|known| known != filename);
        Some(swap)
    }

    /// Applies a direct buffer edit. Unknown files are ignored.
    pub fn edit_content(&mut self, filename: &str, text: &str) -> bool {
        match self.files.get_mut(filename) {
            Some(record) => {
                if record.content != text {
                    record.content = text.to_string();
                    record.last_modified = Local::now();
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, filename: &str) -> Option<&FileRecord> {
        self.files.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    /// Records in creation order.
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.order.iter().filter_map(|filename| self.files.get(filename))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn open_files(&self) -> &[String] {
        &self.open_files
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn current_record(&self) -> Option<&FileRecord> {
        self.current_file
            .as_deref()
            .and_then(|filename| self.files.get(filename))
    }

    /// Copies every file's content so it can be handed to a background task.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(filename, record)| (filename.clone(), record.content.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferSwap, UpsertOutcome, Workspace};
    use crate::synthesis::extract::extract;

    fn workspace_with(files: &[&str]) -> Workspace {
        let mut workspace = Workspace::new();
        for filename in files {
            workspace.upsert(filename, "", None, None);
        }
        workspace
    }

    fn assert_invariant(workspace: &Workspace) {
        if let Some(current) = workspace.current_file() {
            assert!(workspace.open_files().iter().any(|open| open == current));
        }
        for open in workspace.open_files() {
            let record = workspace.get(open).expect("open file should exist");
            assert!(record.is_open);
        }
    }

    #[test]
    fn repeated_upsert_is_idempotent() {
        let mut workspace = workspace_with(&["app.js"]);
        workspace.open_tab("app.js");
        let first = workspace.upsert("main.py", "print(1)", None, None);
        let second = workspace.upsert("main.py", "print(1)", None, None);
        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Updated);
        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.open_files(), ["app.js".to_string()]);
        assert_eq!(workspace.current_file(), Some("app.js"));
    }

    #[test]
    fn upsert_preserves_open_state_and_tab_position() {
        let mut workspace = workspace_with(&["a.js", "b.js"]);
        workspace.open_tab("a.js");
        workspace.open_tab("b.js");
        workspace.upsert("a.js", "changed", None, None);
        let record = workspace.get("a.js").expect("file should exist");
        assert!(record.is_open);
        assert_eq!(record.content, "changed");
        assert_eq!(workspace.open_files(), ["a.js".to_string(), "b.js".to_string()]);
        assert_eq!(workspace.current_file(), Some("b.js"));
    }

    #[test]
    fn language_comes_from_extension_with_hint_fallback() {
        let mut workspace = Workspace::new();
        workspace.upsert("app.js", "", Some("js"), None);
        workspace.upsert("Dockerfile", "", Some("Docker"), None);
        workspace.upsert("notes", "", None, None);
        assert_eq!(workspace.get("app.js").map(|r| r.language.as_str()), Some("javascript"));
        assert_eq!(workspace.get("Dockerfile").map(|r| r.language.as_str()), Some("docker"));
        assert_eq!(workspace.get("notes").map(|r| r.language.as_str()), Some("plaintext"));
    }

    #[test]
    fn open_tab_ignores_unknown_files() {
        let mut workspace = workspace_with(&["a.js"]);
        assert_eq!(workspace.open_tab("missing.js"), None);
        assert!(workspace.open_files().is_empty());
        assert_eq!(workspace.current_file(), None);
    }

    #[test]
    fn closing_only_tab_clears_current_file() {
        let mut workspace = workspace_with(&["a.js"]);
        workspace.open_tab("a.js");
        assert_eq!(workspace.close_tab("a.js"), Some(BufferSwap::Clear));
        assert_eq!(workspace.current_file(), None);
        assert!(workspace.open_files().is_empty());
        assert!(workspace.contains("a.js"));
        assert_invariant(&workspace);
    }

    #[test]
    fn closing_current_tab_prefers_next_then_previous() {
        let mut workspace = workspace_with(&["a.js", "b.js", "c.js"]);
        workspace.open_tab("a.js");
        workspace.open_tab("b.js");
        workspace.open_tab("c.js");

        workspace.open_tab("b.js");
        assert_eq!(workspace.close_tab("b.js"), Some(BufferSwap::Show("c.js".to_string())));
        assert_eq!(workspace.current_file(), Some("c.js"));

        assert_eq!(workspace.close_tab("c.js"), Some(BufferSwap::Show("a.js".to_string())));
        assert_eq!(workspace.current_file(), Some("a.js"));
        assert_invariant(&workspace);
    }

    #[test]
    fn closing_background_tab_keeps_current() {
        let mut workspace = workspace_with(&["a.js", "b.js"]);
        workspace.open_tab("a.js");
        workspace.open_tab("b.js");
        assert_eq!(workspace.close_tab("a.js"), None);
        assert_eq!(workspace.current_file(), Some("b.js"));
        assert_eq!(workspace.close_tab("a.js"), None);
    }

    #[test]
    fn delete_removes_record_and_reselects() {
        let mut workspace = workspace_with(&["a.js", "b.js"]);
        workspace.open_tab("a.js");
        workspace.open_tab("b.js");
        assert_eq!(
            workspace.delete_file("b.js"),
            Some(Some(BufferSwap::Show("a.js".to_string())))
        );
        assert!(!workspace.contains("b.js"));
        assert_eq!(workspace.files().count(), 1);
        assert_eq!(workspace.delete_file("b.js"), None);
        assert_invariant(&workspace);
    }

    #[test]
    fn applying_blocks_touches_only_named_files() {
        let mut workspace = workspace_with(&["keep.txt", "app.js"]);
        workspace.open_tab("keep.txt");
        let blocks = extract("Update `app.js`:\n```js\nif (x) {\ngo();\n}\n```").blocks;
        let outcomes = workspace.apply_blocks(&blocks);
        assert_eq!(outcomes, vec![("app.js".to_string(), UpsertOutcome::Updated)]);

        let record = workspace.get("app.js").expect("file should exist");
        assert_eq!(record.content, "if (x) {\n    go();\n}");
        assert_eq!(record.origin_block_id.as_ref(), Some(&blocks[0].id));
        assert!(!record.is_open);
        assert_eq!(workspace.open_files(), ["keep.txt".to_string()]);
        assert_eq!(workspace.current_file(), Some("keep.txt"));
    }

    #[test]
    fn snapshot_copies_all_contents() {
        let mut workspace = Workspace::new();
        workspace.upsert("b.css", "b", None, None);
        workspace.upsert("a.js", "a", None, None);
        let snapshot = workspace.snapshot();
        workspace.edit_content("a.js", "changed");
        assert_eq!(snapshot.get("a.js").map(String::as_str), Some("a"));
        assert_eq!(snapshot.len(), 2);
        let names: Vec<&str> = workspace.files().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["b.css", "a.js"]);
    }

    #[test]
    fn add_file_opens_and_selects_it() {
        let mut workspace = workspace_with(&["a.js"]);
        assert_eq!(workspace.add_file("notes.md", "# hi"), UpsertOutcome::Created);
        assert_eq!(workspace.current_file(), Some("notes.md"));
        assert_eq!(workspace.get("notes.md").map(|record| record.language.as_str()), Some("markdown"));
        assert_invariant(&workspace);
    }
}
