use crate::error::ImportError;
use std::fs;
use std::path::{Path, PathBuf};

const SKIPPED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    /// Root-relative path with `/` separators.
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub files: Vec<ImportedFile>,
    /// Root-relative paths of files that were not valid UTF-8 or unreadable.
    pub skipped: Vec<String>,
}

impl ImportReport {
    /// Prompt asking the assistant to review the imported files.
    pub fn analysis_prompt(&self) -> String {
        let listing = self
            .files
            .iter()
            .map(|file| format!("### {}\n{}\n", file.filename, file.content))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Analyze the following files and provide a synthesis of their content:\n\n{listing}"
        )
    }
}

fn should_skip_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn to_root_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn import_folder(root: &Path) -> Result<ImportReport, ImportError> {
    if !root.is_dir() {
        return Err(ImportError::NotADirectory(root.to_path_buf()));
    }

    let mut report = ImportReport::default();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if dir == root => {
                return Err(ImportError::Io { path: dir, source });
            }
            Err(err) => {
                let relative = to_root_relative(&dir, root);
                tracing::warn!(dir = %relative, error = %err, "skipping unreadable directory");
                report.skipped.push(relative);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            // Linked directories are never followed.
            if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                if file_type.is_dir() && !should_skip_dir(&path) {
                    stack.push(path);
                }
                continue;
            }

            let filename = to_root_relative(&path, root);
            match fs::read(&path).map(String::from_utf8) {
                Ok(Ok(content)) => report.files.push(ImportedFile { filename, content }),
                Ok(Err(_)) => {
                    tracing::debug!(file = %filename, "skipping non-utf8 file");
                    report.skipped.push(filename);
                }
                Err(err) => {
                    tracing::warn!(file = %filename, error = %err, "skipping unreadable file");
                    report.skipped.push(filename);
                }
            }
        }
    }

    report.files.sort_by(|a, b| a.filename.cmp(&b.filename));
    report.skipped.sort();
    Ok(report)
}
