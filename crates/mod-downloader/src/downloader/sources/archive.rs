//! Zip archive download source
//!
//! Wraps another source whose single file is a zip archive and emits a
//! subset of its entries. Entry names come from untrusted archives, so they
//! are normalized before use and can never leave the destination prefix.

use std::io::{Cursor, Read};
use tracing::debug;

use super::{DownloadSource, FetchContext};
use crate::downloader::core::{DownloadError, FetchedFile, FileBody, FileOperation, Result};
use crate::mods_config::ModEntry;

const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipSource {
    pub inner: Box<DownloadSource>,
    /// Directory inside the archive to take entries from, empty for all
    pub path_in_zip: String,
    /// Directory under the target to place entries in
    pub dest_path: String,
}

impl ZipSource {
    pub fn new<P: Into<String>, D: Into<String>>(inner: DownloadSource, path_in_zip: P, dest_path: D) -> Self {
        Self {
            inner: Box::new(inner),
            path_in_zip: path_in_zip.into(),
            dest_path: dest_path.into(),
        }
    }

    pub async fn resolve(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<Vec<FetchedFile>> {
        let mut files = self.inner.resolve(entry, ctx).await?;
        if files.len() != 1 {
            return Err(DownloadError::ZipSourceFileCount { count: files.len() });
        }
        let Some(archive_file) = files.pop() else {
            return Err(DownloadError::ZipSourceFileCount { count: 0 });
        };

        debug!("Buffering archive {} for {}", archive_file.path, entry.id);
        let bytes = archive_file.body.into_bytes().await?;

        let prefix = normalize_path(&self.path_in_zip);
        let dest = normalize_path(&self.dest_path);
        tokio::task::spawn_blocking(move || extract_entries(bytes, &prefix, &dest))
            .await
            .map_err(|source| DownloadError::TaskFailed {
                operation: format!("unpacking zip for {}", entry.id),
                source,
            })?
    }
}

fn extract_entries(bytes: Vec<u8>, prefix: &[String], dest: &[String]) -> Result<Vec<FetchedFile>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let normalized = normalize_path(&name);
        let Some(relative) = strip_prefix(&normalized, prefix) else {
            debug!("Skipping zip entry {} outside of {:?}", name, prefix);
            continue;
        };

        let mut content = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut content)
            .map_err(|e| DownloadError::file_system(&name, FileOperation::Read, e))?;

        let path = dest.iter().chain(relative).map(String::as_str).collect::<Vec<_>>().join("/");
        debug!("Zip entry {} -> {}", name, path);
        files.push(FetchedFile::new(path, FileBody::Bytes(content)));
    }

    Ok(files)
}

/// Preallocation for an entry whose header claims `declared` bytes
///
/// Headers come from the archive, so the claim is only trusted up to a cap.
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// Split a path on `/` and `\` and resolve `.` and `..`
///
/// `..` drops the last kept segment and is ignored at the root, so the
/// result never points above where it started.
pub fn normalize_path(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment.to_string()),
        }
    }
    segments
}

/// Remainder of `segments` below `prefix`, matched by whole segments
///
/// An entry equal to the prefix keeps its last segment.
fn strip_prefix<'a>(segments: &'a [String], prefix: &[String]) -> Option<&'a [String]> {
    if segments.is_empty() || !segments.starts_with(prefix) {
        return None;
    }
    if segments.len() == prefix.len() {
        return Some(&segments[segments.len() - 1..]);
    }
    Some(&segments[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/../b/c"), segments(&["b", "c"]));
        assert_eq!(normalize_path("./a//b/./c/"), segments(&["a", "b", "c"]));
        assert_eq!(normalize_path("a\\b\\..\\c"), segments(&["a", "c"]));
        assert_eq!(normalize_path("../../../etc/passwd"), segments(&["etc", "passwd"]));
        assert_eq!(normalize_path("a/b/../../../../x"), segments(&["x"]));
        assert!(normalize_path("").is_empty());
        assert!(normalize_path(".").is_empty());
    }

    #[test]
    fn test_strip_prefix() {
        let entry = segments(&["mods", "a.jar"]);
        assert_eq!(strip_prefix(&entry, &[]), Some(&entry[..]));
        assert_eq!(strip_prefix(&entry, &segments(&["mods"])), Some(&entry[1..]));
        assert_eq!(strip_prefix(&entry, &segments(&["mods", "a.jar"])), Some(&entry[1..]));
        assert_eq!(strip_prefix(&entry, &segments(&["mo"])), None);
        assert_eq!(strip_prefix(&segments(&["modsx", "a.jar"]), &segments(&["mods"])), None);
    }

    #[test]
    fn test_extract_rerooted_under_dest() {
        let bytes = zip_bytes(&[("a/../b/c", "c"), ("top.txt", "t")]);
        let files = extract_entries(bytes, &[], &segments(&["out"])).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["out/b/c", "out/top.txt"]);
    }

    #[test]
    fn test_extract_cannot_escape_dest() {
        let bytes = zip_bytes(&[("../../../../evil.jar", "x"), ("..\\..\\win.jar", "y")]);
        let files = extract_entries(bytes, &[], &segments(&["out"])).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["out/evil.jar", "out/win.jar"]);
    }

    #[test]
    fn test_extract_filters_by_prefix_and_skips_dirs() {
        let bytes = zip_bytes(&[
            ("pack/", ""),
            ("pack/mods/", ""),
            ("pack/mods/a.jar", "a"),
            ("pack/mods/sub/b.jar", "b"),
            ("pack/config/c.cfg", "c"),
            ("pack/modsextra/d.jar", "d"),
        ]);
        let files = extract_entries(bytes, &segments(&["pack", "mods"]), &[]).unwrap();
        let summary: Vec<_> = files
            .into_iter()
            .map(|f| match f.body {
                FileBody::Bytes(bytes) => (f.path, bytes),
                FileBody::Response(_) => unreachable!(),
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a.jar".to_string(), b"a".to_vec()),
                ("sub/b.jar".to_string(), b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn test_declared_size_is_capped() {
        assert_eq!(initial_capacity(12), 12);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let err = extract_entries(b"not a zip".to_vec(), &[], &[]).unwrap_err();
        assert!(matches!(err, DownloadError::Archive { .. }));
    }
}
