use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is not configured: {0}")]
    Misconfiguration(String),

    #[error("assistant transport error: {0}")]
    Transport(String),

    #[error("assistant call failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("assistant response had no message content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no files with content to save")]
    NoFiles,

    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("no files to package")]
    NoFiles,

    #[error("packaging is unavailable after {attempts} attempts")]
    Unavailable { attempts: usize },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to write archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("packaging task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
