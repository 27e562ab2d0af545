//! Mapping wire paths onto the local filesystem
// (c) 2026 Ferry contributors

use std::path::{Component, Path, PathBuf};

/// Reasons a wire path was not accepted
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnsafePath {
    #[error("path is empty")]
    Empty,
    #[error("path contains a NUL byte")]
    Nul,
    #[error("path is absolute")]
    Absolute,
    #[error("path contains a parent directory component")]
    Traversal,
    #[error("path leads outside the served directory")]
    Escapes,
}

/// Converts a `/`-separated wire path into a relative local path.
///
/// `.` components are dropped; anything which could climb out of the base directory is refused.
pub(crate) fn safe_relative(wire: &str) -> Result<PathBuf, UnsafePath> {
    if wire.contains('\0') {
        return Err(UnsafePath::Nul);
    }
    if wire.starts_with('/') || wire.starts_with('\\') {
        return Err(UnsafePath::Absolute);
    }
    let mut out = PathBuf::new();
    for part in wire.split('/') {
        // Parse each piece with local rules, so that `C:` or `a\..\b` cannot sneak through
        for component in Path::new(part).components() {
            match component {
                Component::Normal(s) => out.push(s),
                Component::CurDir => {}
                Component::ParentDir => return Err(UnsafePath::Traversal),
                Component::RootDir | Component::Prefix(_) => return Err(UnsafePath::Absolute),
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(UnsafePath::Empty);
    }
    Ok(out)
}

/// Resolves a wire path beneath `root`, following symlinks, and checks the result is still beneath `root`.
///
/// The target must exist.
pub(crate) fn resolve_under_root(root: &Path, wire: &str) -> Result<PathBuf, UnsafePath> {
    let joined = root.join(safe_relative(wire)?);
    let canon_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    match std::fs::canonicalize(&joined) {
        Ok(canon) if canon.starts_with(&canon_root) => Ok(canon),
        Ok(_) => Err(UnsafePath::Escapes),
        // Does not exist; the caller will find that out for itself
        Err(_) => Ok(joined),
    }
}

/// The final component of a wire path
pub(crate) fn basename(wire: &str) -> Option<&str> {
    wire.rsplit('/').find(|s| !s.is_empty() && *s != "." && *s != "..")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{basename, resolve_under_root, safe_relative, UnsafePath};

    #[test]
    fn relative_paths() {
        assert_eq!(safe_relative("a.txt").unwrap(), PathBuf::from("a.txt"));
        assert_eq!(
            safe_relative("dir/./sub/b.txt").unwrap(),
            PathBuf::from("dir").join("sub").join("b.txt")
        );
    }

    #[test]
    fn refusals() {
        assert_eq!(safe_relative("../etc/passwd"), Err(UnsafePath::Traversal));
        assert_eq!(safe_relative("dir/../../x"), Err(UnsafePath::Traversal));
        assert_eq!(safe_relative("/etc/passwd"), Err(UnsafePath::Absolute));
        assert_eq!(safe_relative(""), Err(UnsafePath::Empty));
        assert_eq!(safe_relative("./"), Err(UnsafePath::Empty));
        assert_eq!(safe_relative("a\0b"), Err(UnsafePath::Nul));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), "s").unwrap();
        let root = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), root.path().join("link"))
            .unwrap();
        std::fs::write(root.path().join("fine"), "f").unwrap();
        assert_eq!(
            resolve_under_root(root.path(), "link"),
            Err(UnsafePath::Escapes)
        );
        assert!(resolve_under_root(root.path(), "fine").is_ok());
        assert!(resolve_under_root(root.path(), "missing").is_ok());
    }

    #[test]
    fn basenames() {
        assert_eq!(basename("a/b/c.txt"), Some("c.txt"));
        assert_eq!(basename("c.txt"), Some("c.txt"));
        assert_eq!(basename("dir/"), Some("dir"));
        assert_eq!(basename(""), None);
    }
}
