//! Tree enumeration.
//! Collects every regular file below a root, in a stable (name-sorted) order.
//! The destination walk also collects symlinks so stray ones can be removed.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classify::FileRecord;
use crate::errors::MirrorError;
use crate::fs_ops::helpers::mirror_io_error;

/// An entry the walker couldn't read.
#[derive(Debug)]
pub struct WalkIssue {
    pub path: PathBuf,
    pub error: MirrorError,
}

/// Files found under one root plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct TreeListing {
    pub files: Vec<FileRecord>,
    pub issues: Vec<WalkIssue>,
}

/// Enumerate regular files under `root`.
///
/// - Symlinks are not followed and not mirrored (logged at debug level).
/// - A root that doesn't exist yet is an empty tree.
/// - Unreadable directories/entries become `WalkIssue`s; the walk continues.
pub fn list_files(root: &Path) -> TreeListing {
    list(root, false)
}

/// Like [`list_files`], but symlinks are listed as well (never followed).
pub fn list_files_and_links(root: &Path) -> TreeListing {
    list(root, true)
}

fn list(root: &Path, with_links: bool) -> TreeListing {
    let mut listing = TreeListing::default();

    for item in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                let depth = err.depth();
                let io_err = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
                if depth == 0 && io_err.kind() == io::ErrorKind::NotFound {
                    debug!(root = %root.display(), "root does not exist; treating as empty");
                    return listing;
                }
                warn!(path = %path.display(), error = %io_err, "skipping unreadable entry");
                let error = mirror_io_error("read directory entry", &path)(io_err);
                listing.issues.push(WalkIssue { path, error });
                continue;
            }
        };

        let ft = entry.file_type();
        if ft.is_dir() {
            continue;
        }
        if !ft.is_file() && !(with_links && ft.is_symlink()) {
            debug!(path = %entry.path().display(), "not a regular file; skipping");
            continue;
        }
        match entry.metadata() {
            Ok(meta) => listing.files.push(FileRecord::from_metadata(entry.path(), &meta)),
            Err(err) => {
                let path = entry.path().to_path_buf();
                let io_err = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("metadata unavailable"));
                let error = mirror_io_error("read metadata", &path)(io_err);
                listing.issues.push(WalkIssue { path, error });
            }
        }
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_files_recursively_including_undotted_and_empty() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("top.txt"), b"1").unwrap();
        fs::write(root.join("a/b/deep"), b"").unwrap();
        fs::write(root.join("a/.dot"), b"22").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();

        let listing = list_files(root);
        assert!(listing.issues.is_empty());
        let mut rels: Vec<_> = listing
            .files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        rels.sort();
        assert_eq!(
            rels,
            vec![PathBuf::from("a/.dot"), PathBuf::from("a/b/deep"), PathBuf::from("top.txt")]
        );
        assert!(listing.files.iter().all(|f| f.is_file));
    }

    #[test]
    fn missing_root_is_empty() {
        let td = tempdir().unwrap();
        let listing = list_files(&td.path().join("not-yet"));
        assert!(listing.files.is_empty());
        assert!(listing.issues.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::write(root.join("real"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();
        let listing = list_files(root);
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].path, root.join("real"));
    }

    #[cfg(unix)]
    #[test]
    fn destination_listing_includes_links_without_following() {
        let td = tempdir().unwrap();
        let root = td.path();
        fs::create_dir_all(root.join("target/inner")).unwrap();
        fs::write(root.join("target/inner/f"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("target"), root.join("dirlink")).unwrap();
        std::os::unix::fs::symlink("/nonexistent", root.join("dangling")).unwrap();

        let listing = list_files_and_links(root);
        let names: Vec<_> = listing.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            names,
            vec![root.join("dangling"), root.join("dirlink"), root.join("target/inner/f")]
        );
        assert!(!listing.files[0].is_file);
        assert_eq!(listing.files[0].size, 0);
        assert!(listing.issues.is_empty());
    }
}
