use crate::error::PackageError;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const AVAILABILITY_ATTEMPTS: usize = 5;
pub const AVAILABILITY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_ARCHIVE_NAME: &str = "project.zip";

pub trait Packager: Send + Sync {
    /// Whether the packaging facility can be used right now.
    fn is_available(&self) -> bool;

    fn package(&self, files: &BTreeMap<String, String>) -> Result<Vec<u8>, PackageError>;
}

/// Deflate-compressed zip archive, one entry per file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipPackager;

impl Packager for ZipPackager {
    fn is_available(&self) -> bool {
        true
    }

    fn package(&self, files: &BTreeMap<String, String>) -> Result<Vec<u8>, PackageError> {
        if files.is_empty() {
            return Err(PackageError::NoFiles);
        }

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (filename, content) in files {
            writer.start_file(filename.as_str(), options)?;
            writer
                .write_all(content.as_bytes())
                .map_err(|source| PackageError::Io {
                    path: PathBuf::from(filename),
                    source,
                })?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

pub async fn wait_until_available(
    packager: &dyn Packager,
    attempts: usize,
    delay: Duration,
) -> Result<(), PackageError> {
    for attempt in 1..=attempts {
        if packager.is_available() {
            return Ok(());
        }
        tracing::debug!(attempt, attempts, "packager not ready");
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    Err(PackageError::Unavailable { attempts })
}

/// Waits for the packager, builds the archive off the async threads and
/// writes it to `destination`.
pub async fn package_project(
    packager: Arc<dyn Packager>,
    files: BTreeMap<String, String>,
    destination: PathBuf,
    delay: Duration,
) -> Result<PathBuf, PackageError> {
    wait_until_available(packager.as_ref(), AVAILABILITY_ATTEMPTS, delay).await?;

    tokio::task::spawn_blocking(move || {
        let bytes = packager.package(&files)?;
        write_archive(&destination, &bytes)?;
        tracing::info!(
            path = %destination.display(),
            files = files.len(),
            bytes = bytes.len(),
            "project packaged"
        );
        Ok::<_, PackageError>(destination)
    })
    .await
    .map_err(|err| PackageError::Task(err.to_string()))?
}

fn write_archive(destination: &Path, bytes: &[u8]) -> Result<(), PackageError> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| PackageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(destination, bytes).map_err(|source| PackageError::Io {
        path: destination.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{package_project, wait_until_available, Packager, ZipPackager};
    use crate::error::PackageError;
    use std::collections::BTreeMap;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowStart {
        probes: AtomicUsize,
        ready_after: usize,
    }

    impl Packager for SlowStart {
        fn is_available(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst) + 1 >= self.ready_after
        }

        fn package(&self, files: &BTreeMap<String, String>) -> Result<Vec<u8>, PackageError> {
            ZipPackager.package(files)
        }
    }

    fn sample_files() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("index.html".to_string(), "<h1>hi</h1>".to_string()),
            ("src/app.js".to_string(), "console.log(1);".to_string()),
        ])
    }

    #[test]
    fn archive_contains_every_file() {
        let bytes = ZipPackager
            .package(&sample_files())
            .expect("packaging should succeed");
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).expect("archive should be readable");
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("src/app.js")
            .expect("entry should exist")
            .read_to_string(&mut content)
            .expect("entry should be utf-8");
        assert_eq!(content, "console.log(1);");
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        let result = ZipPackager.package(&BTreeMap::new());
        assert!(matches!(result, Err(PackageError::NoFiles)));
    }

    #[tokio::test]
    async fn waits_for_packager_to_become_available() {
        let packager = SlowStart {
            probes: AtomicUsize::new(0),
            ready_after: 3,
        };
        wait_until_available(&packager, 5, Duration::from_millis(1))
            .await
            .expect("packager should become available");
        assert_eq!(packager.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let packager = SlowStart {
            probes: AtomicUsize::new(0),
            ready_after: usize::MAX,
        };
        let result = wait_until_available(&packager, 5, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(PackageError::Unavailable { attempts: 5 })));
        assert_eq!(packager.probes.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn package_project_writes_archive_to_destination() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let destination = dir.path().join("out").join("project.zip");
        let written = package_project(
            Arc::new(ZipPackager),
            sample_files(),
            destination.clone(),
            Duration::from_millis(1),
        )
        .await
        .expect("packaging should succeed");
        assert_eq!(written, destination);
        assert!(destination.is_file());
    }
}
