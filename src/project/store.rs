use crate::error::StoreError;
use crate::project::{ProjectStore, SaveRequest, SaveResponse};
use chrono::Utc;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Writes projects under a root directory, one `project_<slug>` directory
/// per project.
pub struct LocalProjectStore {
    root: PathBuf,
}

impl LocalProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn project_dir_name(&self, slug: &str, is_update: bool) -> String {
        let base = format!("project_{slug}");
        if is_update || !self.root.join(&base).exists() {
            return base;
        }

        let minted = format!("{base}_{}", Utc::now().timestamp());
        let mut candidate = minted.clone();
        let mut suffix = 1;
        while self.root.join(&candidate).exists() {
            candidate = format!("{minted}_{suffix}");
            suffix += 1;
        }
        candidate
    }
}

impl ProjectStore for LocalProjectStore {
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse, StoreError> {
        if request.files.is_empty() {
            return Err(StoreError::NoFiles);
        }

        fs::create_dir_all(&self.root).map_err(Self::io_error(&self.root))?;
        let dir_name = self.project_dir_name(&sanitize_slug(&request.project_id), request.is_update);
        let project_path = self.root.join(&dir_name);
        fs::create_dir_all(&project_path).map_err(Self::io_error(&project_path))?;

        let mut saved_files = Vec::new();
        let mut errors = Vec::new();
        for (filename, content) in &request.files {
            let Some(relative) = contained_path(filename) else {
                errors.push(format!("Invalid filename: {filename}"));
                continue;
            };
            let file_path = project_path.join(relative);
            if let Some(parent) = file_path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    errors.push(format!("Failed to create directory for: {filename} ({err})"));
                    continue;
                }
            }
            match fs::write(&file_path, content) {
                Ok(()) => saved_files.push(filename.clone()),
                Err(err) => errors.push(format!("Failed to save: {filename} ({err})")),
            }
        }

        tracing::info!(
            project = %dir_name,
            saved = saved_files.len(),
            failed = errors.len(),
            "project saved"
        );

        Ok(SaveResponse {
            success: !saved_files.is_empty(),
            url: Some(format!("file://{}", project_path.display())),
            project_dir: Some(dir_name),
            saved_files,
            errors,
            message: None,
        })
    }
}

/// Keeps `[A-Za-z0-9_-]`; falls back to `untitled`.
pub fn sanitize_slug(raw: &str) -> String {
    let slug: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .collect();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Drops root, prefix and parent components so a client filename can never
/// leave the project directory. Returns `None` when nothing remains.
pub fn contained_path(filename: &str) -> Option<PathBuf> {
    let relative: PathBuf = Path::new(filename)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}
