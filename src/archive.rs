//! In-memory gzip tarball of a module directory.

use crate::error::ArchiveError;
use bytes::Bytes;
use flate2::{Compression, write::GzEncoder};
use std::path::{Path, PathBuf};
use tar::HeaderMode;
use walkdir::WalkDir;

/// Package every file and directory under `source_dir` into a `.tar.gz` buffer.
///
/// Entry paths are relative to `source_dir`; the root itself is not an entry.
/// Headers are deterministic so identical trees produce identical archives.
pub async fn create_archive(source_dir: &Path) -> Result<Bytes, ArchiveError> {
    let root = source_dir.to_path_buf();
    tokio::task::spawn_blocking(move || build_archive(&root))
        .await
        .map_err(|e| ArchiveError::Join(e.to_string()))?
}

fn build_archive(root: &Path) -> Result<Bytes, ArchiveError> {
    if !root.is_dir() {
        return Err(ArchiveError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.mode(HeaderMode::Deterministic);

    let mut entries = 0usize;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path == root {
            continue;
        }

        let write_err = |source| ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        };
        let rel_path = relative(root, path);

        if entry.file_type().is_dir() {
            tar.append_dir(&rel_path, path).map_err(write_err)?;
        } else {
            tar.append_path_with_name(path, &rel_path)
                .map_err(write_err)?;
        }
        entries += 1;
    }

    let encoder = tar.into_inner().map_err(|source| ArchiveError::Write {
        path: root.to_path_buf(),
        source,
    })?;
    let buffer = encoder.finish().map_err(|source| ArchiveError::Write {
        path: root.to_path_buf(),
        source,
    })?;

    log::debug!(
        "Archived {} entries from {} ({} bytes compressed)",
        entries,
        root.display(),
        buffer.len()
    );
    Ok(Bytes::from(buffer))
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
