//! Translation of paths between the two mirrored trees.
//!
//! Roots are compared component-wise, so drive/volume prefixes and redundant
//! separators are normalized by `Path` itself. Joining uses the host's native
//! separator.

use std::path::{Path, PathBuf};

use crate::errors::MirrorError;

/// Path of `path` relative to `root`.
pub fn relative<'a>(path: &'a Path, root: &Path) -> Result<&'a Path, MirrorError> {
    path.strip_prefix(root).map_err(|_| MirrorError::PathOutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })
}

/// Map `path` (under `from_root`) to the equivalent location under `to_root`.
pub fn map(path: &Path, from_root: &Path, to_root: &Path) -> Result<PathBuf, MirrorError> {
    let rel = relative(path, from_root)?;
    if rel.as_os_str().is_empty() {
        return Ok(to_root.to_path_buf());
    }
    Ok(to_root.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_nested_file() {
        let got = map(
            Path::new("/data/one/two/three.txt"),
            Path::new("/data/one"),
            Path::new("/backup/four"),
        )
        .unwrap();
        assert_eq!(got, Path::new("/backup/four/two/three.txt"));
    }

    #[test]
    fn mapping_is_bijective() {
        let a = Path::new("/src/root");
        let b = Path::new("/mnt/mirror");
        for p in ["/src/root/x", "/src/root/d/e/f.bin", "/src/root/.hidden", "/src/root/no_ext"] {
            let p = Path::new(p);
            let q = map(p, a, b).unwrap();
            assert!(q.starts_with(b));
            assert_eq!(map(&q, b, a).unwrap(), p);
        }
    }

    #[test]
    fn trailing_separator_on_root_is_ignored() {
        let got = map(Path::new("/a/b/c.txt"), Path::new("/a/b/"), Path::new("/z")).unwrap();
        assert_eq!(got, Path::new("/z/c.txt"));
    }

    #[test]
    fn sibling_with_common_prefix_is_outside() {
        // "/a/bc" shares a string prefix with "/a/b" but is not beneath it.
        let err = map(Path::new("/a/bc/file"), Path::new("/a/b"), Path::new("/z")).unwrap_err();
        assert!(matches!(err, MirrorError::PathOutsideRoot { .. }));
    }

    #[test]
    fn root_maps_to_root() {
        assert_eq!(map(Path::new("/a/b"), Path::new("/a/b"), Path::new("/z")).unwrap(), Path::new("/z"));
    }

    #[test]
    fn relative_strips_root() {
        assert_eq!(relative(Path::new("/r/x/y"), Path::new("/r")).unwrap(), Path::new("x/y"));
        assert!(relative(Path::new("/q/x"), Path::new("/r")).is_err());
    }
}
