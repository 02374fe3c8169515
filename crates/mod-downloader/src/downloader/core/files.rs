//! File operation utilities
//!
//! Everything the downloader writes lives under the target directory and is
//! addressed by `/`-separated relative paths, the same form the manifest
//! records.

use futures::StreamExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::downloader::core::{DownloadError, FileOperation, Result};

/// Content of one output file
#[derive(Debug)]
pub enum FileBody {
    /// Streamed to disk chunk by chunk
    Response(reqwest::Response),
    Bytes(Vec<u8>),
}

impl FileBody {
    /// Read the whole body into memory
    pub async fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            FileBody::Bytes(bytes) => Ok(bytes),
            FileBody::Response(response) => Ok(response.bytes().await?.to_vec()),
        }
    }
}

/// One file produced by a download source
#[derive(Debug)]
pub struct FetchedFile {
    /// `/`-separated path relative to the target directory
    pub path: String,
    pub body: FileBody,
}

impl FetchedFile {
    pub fn new(path: impl Into<String>, body: FileBody) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }
}

/// Map a `/`-separated relative path onto `root`
///
/// Manifest paths can be edited by hand, so `.` and `..` are resolved
/// lexically and `..` never climbs above `root`.
pub fn resolve_relative(root: &Path, relative: &str) -> PathBuf {
    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments
        .into_iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Write `file` under `root`, creating parent directories
///
/// Without `force` an existing file is [`DownloadError::FileExists`]; with
/// it the existing file is replaced. A partially written file is removed
/// again when streaming fails. Returns the number of bytes written.
pub async fn write_output(root: &Path, file: FetchedFile, force: bool) -> Result<u64> {
    let dest_path = resolve_relative(root, &file.path);

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::file_system(parent, FileOperation::CreateDir, e))?;
    }

    if force {
        match fs::remove_file(&dest_path).await {
            Ok(()) => debug!("Removed existing file {}", dest_path.display()),
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(DownloadError::file_system(&dest_path, FileOperation::Delete, e)),
        }
    }

    let mut out = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&dest_path)
        .await
        .map_err(|e| {
            if e.kind() == IoErrorKind::AlreadyExists {
                DownloadError::FileExists {
                    path: dest_path.clone(),
                }
            } else {
                DownloadError::file_system(&dest_path, FileOperation::Create, e)
            }
        })?;

    let written = match stream_body(&mut out, &dest_path, file.body).await {
        Ok(written) => written,
        Err(e) => {
            drop(out);
            remove_quietly(&dest_path).await;
            return Err(e);
        }
    };

    debug!("Wrote {} bytes to {}", written, dest_path.display());
    Ok(written)
}

async fn stream_body(out: &mut fs::File, dest_path: &Path, body: FileBody) -> Result<u64> {
    let write_error = |e: std::io::Error| DownloadError::file_system(dest_path, FileOperation::Write, e);
    let mut written = 0u64;

    match body {
        FileBody::Bytes(bytes) => {
            out.write_all(&bytes).await.map_err(write_error)?;
            written = bytes.len() as u64;
        }
        FileBody::Response(response) => {
            let mut stream = response.bytes_stream();
            while let Some(chunk_result) = stream.next().await {
                let chunk = chunk_result?;
                out.write_all(&chunk).await.map_err(write_error)?;
                written += chunk.len() as u64;
            }
        }
    }

    out.flush().await.map_err(write_error)?;
    Ok(written)
}

/// Delete files recorded relative to `root`; missing files are ignored
pub async fn delete_files(root: &Path, files: &[String]) -> Result<()> {
    for relative in files {
        let path = resolve_relative(root, relative);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Deleted {}", path.display()),
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(DownloadError::file_system(&path, FileOperation::Delete, e)),
        }
    }
    Ok(())
}

/// Best effort removal of files written by a failed task
pub async fn remove_written(root: &Path, files: &[String]) {
    for relative in files {
        remove_quietly(&resolve_relative(root, relative)).await;
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

/// Whether every file in `files` exists under `root`
pub async fn all_exist(root: &Path, files: &[String]) -> bool {
    for relative in files {
        if !fs::try_exists(resolve_relative(root, relative))
            .await
            .unwrap_or(false)
        {
            return false;
        }
    }
    true
}

pub async fn is_dir_empty(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::file_system(dir, FileOperation::ListDir, e))?;
    let first = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::file_system(dir, FileOperation::ListDir, e))?;
    Ok(first.is_none())
}

/// Recursively delete everything inside `dir`, keeping `dir` itself
pub async fn clear_directory(dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::file_system(dir, FileOperation::ListDir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::file_system(dir, FileOperation::ListDir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| DownloadError::file_system(&path, FileOperation::Metadata, e))?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|e| DownloadError::file_system(&path, FileOperation::Delete, e))?;
        debug!("Cleaned {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_output_creates_parents() {
        let dir = tempdir().unwrap();
        let file = FetchedFile::new("config/extra/a.cfg", FileBody::Bytes(b"key=1".to_vec()));
        let written = write_output(dir.path(), file, false).await.unwrap();
        assert_eq!(written, 5);
        let content = std::fs::read(dir.path().join("config").join("extra").join("a.cfg")).unwrap();
        assert_eq!(content, b"key=1");
    }

    #[tokio::test]
    async fn test_write_output_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jar"), b"old").unwrap();

        let err = write_output(dir.path(), FetchedFile::new("a.jar", FileBody::Bytes(b"new".to_vec())), false)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::FileExists { .. }));
        assert_eq!(std::fs::read(dir.path().join("a.jar")).unwrap(), b"old");

        write_output(dir.path(), FetchedFile::new("a.jar", FileBody::Bytes(b"new".to_vec())), true)
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.jar")).unwrap(), b"new");
    }

    #[test]
    fn test_resolve_relative_stays_under_root() {
        let root = Path::new("/srv/mods");
        assert_eq!(resolve_relative(root, "config/a.cfg"), root.join("config").join("a.cfg"));
        assert_eq!(resolve_relative(root, "../../etc/passwd"), root.join("etc").join("passwd"));
        assert_eq!(resolve_relative(root, "a/../../b.jar"), root.join("b.jar"));
        assert_eq!(resolve_relative(root, "./x\\..\\y.jar"), root.join("y.jar"));
    }

    #[tokio::test]
    async fn test_delete_files_never_leaves_root() {
        let outer = tempdir().unwrap();
        let root = outer.path().join("mods");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("keep.txt"), b"precious").unwrap();
        std::fs::write(root.join("keep.txt"), b"inside").unwrap();

        delete_files(&root, &["../keep.txt".to_string()]).await.unwrap();
        assert!(outer.path().join("keep.txt").exists());
        assert!(!root.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_files_ignores_missing() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.jar"), b"b").unwrap();

        delete_files(dir.path(), &["missing.jar".to_string(), "sub/b.jar".to_string()])
            .await
            .unwrap();
        assert!(!dir.path().join("sub").join("b.jar").exists());
    }

    #[tokio::test]
    async fn test_all_exist() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jar"), b"a").unwrap();
        assert!(all_exist(dir.path(), &["a.jar".to_string()]).await);
        assert!(!all_exist(dir.path(), &["a.jar".to_string(), "b.jar".to_string()]).await);
    }

    #[tokio::test]
    async fn test_clear_directory() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested").join("deep")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep").join("x"), b"x").unwrap();
        std::fs::write(dir.path().join("top.jar"), b"t").unwrap();

        assert!(!is_dir_empty(dir.path()).await.unwrap());
        clear_directory(dir.path()).await.unwrap();
        assert!(is_dir_empty(dir.path()).await.unwrap());
        assert!(dir.path().exists());
    }
}
