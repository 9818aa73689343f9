//! Where local copies of transformed files go.
//!
//! A [`SaveEnvironment`] offers a single-file save prompt, a directory picker
//! for batches, and a plain download as the last resort.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Upper bound on `name (n).ext` candidates tried for a download.
const MAX_DOWNLOAD_SUFFIX: u32 = 10_000;

#[derive(Debug, Error)]
pub enum LocalSaveError {
    #[error("Save cancelled by user")]
    Cancelled,

    #[error("Not supported by this environment: {0}")]
    Unsupported(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Save failed: {0}")]
    Failed(String),
}

/// A directory granted for the whole batch.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Create or overwrite `file_name` in this directory.
    async fn write_file(&self, file_name: &str, data: &Bytes) -> Result<(), LocalSaveError>;
}

#[async_trait]
pub trait SaveEnvironment: Send + Sync {
    fn supports_save_prompt(&self) -> bool;

    /// Ask the user where to save one file. `Err(Cancelled)` when dismissed.
    async fn prompt_save(
        &self,
        suggested_name: &str,
        media_type: &str,
        extension: Option<&str>,
        data: &Bytes,
    ) -> Result<(), LocalSaveError>;

    fn supports_directory_picker(&self) -> bool;

    /// Ask the user for a directory. `Ok(None)` when the picker is cancelled.
    async fn pick_directory(&self) -> Result<Option<Arc<dyn DirectoryHandle>>, LocalSaveError>;

    /// Save without asking. Returns where the file ended up.
    async fn download(&self, file_name: &str, data: &Bytes) -> Result<PathBuf, LocalSaveError>;
}

/// Reject names that would escape the target directory.
fn check_file_name(file_name: &str) -> Result<(), LocalSaveError> {
    let path = Path::new(file_name);
    if file_name.is_empty()
        || path.file_name().and_then(|n| n.to_str()) != Some(file_name)
    {
        return Err(LocalSaveError::InvalidName(file_name.to_string()));
    }
    Ok(())
}

/// A directory on the local filesystem.
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_file(&self, file_name: &str, data: &Bytes) -> Result<(), LocalSaveError> {
        check_file_name(file_name)?;
        let target = self.path.join(file_name);
        tokio::fs::write(&target, data).await?;
        tracing::debug!(path = %target.display(), size_bytes = data.len(), "Wrote file to directory");
        Ok(())
    }
}

/// Non-interactive environment for the command line.
///
/// There is no save prompt. The batch directory, when configured, is handed
/// out by the picker; downloads land in `downloads_dir` without overwriting.
pub struct FilesystemEnvironment {
    batch_dir: Option<PathBuf>,
    downloads_dir: PathBuf,
}

impl FilesystemEnvironment {
    pub fn new(batch_dir: Option<PathBuf>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            batch_dir,
            downloads_dir: downloads_dir.into(),
        }
    }
}

/// `name`, then `stem (1).ext`, `stem (2).ext`, ...
pub fn download_candidate(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", file_name, n),
    }
}

#[async_trait]
impl SaveEnvironment for FilesystemEnvironment {
    fn supports_save_prompt(&self) -> bool {
        false
    }

    async fn prompt_save(
        &self,
        _suggested_name: &str,
        _media_type: &str,
        _extension: Option<&str>,
        _data: &Bytes,
    ) -> Result<(), LocalSaveError> {
        Err(LocalSaveError::Unsupported("save prompt".to_string()))
    }

    fn supports_directory_picker(&self) -> bool {
        self.batch_dir.is_some()
    }

    async fn pick_directory(&self) -> Result<Option<Arc<dyn DirectoryHandle>>, LocalSaveError> {
        let Some(dir) = &self.batch_dir else {
            return Ok(None);
        };
        tokio::fs::create_dir_all(dir).await?;
        Ok(Some(Arc::new(LocalDirectory::new(dir.clone()))))
    }

    async fn download(&self, file_name: &str, data: &Bytes) -> Result<PathBuf, LocalSaveError> {
        check_file_name(file_name)?;
        tokio::fs::create_dir_all(&self.downloads_dir).await?;

        for n in 0..MAX_DOWNLOAD_SUFFIX {
            let path = self.downloads_dir.join(download_candidate(file_name, n));
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(data).await?;
            file.flush().await?;
            tracing::info!(path = %path.display(), size_bytes = data.len(), "Downloaded local copy");
            return Ok(path);
        }

        Err(LocalSaveError::Failed(format!(
            "No free download name for {}",
            file_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_download_candidate() {
        assert_eq!(download_candidate("a.jpg", 0), "a.jpg");
        assert_eq!(download_candidate("a.jpg", 1), "a (1).jpg");
        assert_eq!(download_candidate("archive.tar.gz", 2), "archive.tar (2).gz");
        assert_eq!(download_candidate("README", 1), "README (1)");
        assert_eq!(download_candidate(".env", 1), ".env (1)");
    }

    #[tokio::test]
    async fn test_download_never_overwrites() {
        let dir = tempdir().unwrap();
        let env = FilesystemEnvironment::new(None, dir.path());

        let first = env.download("a.jpg", &Bytes::from_static(b"one")).await.unwrap();
        let second = env.download("a.jpg", &Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(first, dir.path().join("a.jpg"));
        assert_eq!(second, dir.path().join("a (1).jpg"));
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"one");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_picker_only_with_batch_dir() {
        let dir = tempdir().unwrap();
        let without = FilesystemEnvironment::new(None, dir.path());
        assert!(!without.supports_directory_picker());
        assert!(without.pick_directory().await.unwrap().is_none());
        assert!(!without.supports_save_prompt());

        let batch = dir.path().join("batch");
        let with = FilesystemEnvironment::new(Some(batch.clone()), dir.path());
        let handle = with.pick_directory().await.unwrap().unwrap();
        assert_eq!(handle.name(), "batch");

        handle
            .write_file("x.jpg", &Bytes::from_static(b"1"))
            .await
            .unwrap();
        handle
            .write_file("x.jpg", &Bytes::from_static(b"2"))
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(batch.join("x.jpg")).await.unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_write_rejects_path_names() {
        let dir = tempdir().unwrap();
        let handle = LocalDirectory::new(dir.path());
        let result = handle
            .write_file("../escape.jpg", &Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(LocalSaveError::InvalidName(_))));
    }
}
