// (c) 2026 Ferry contributors

//! The list of files a server offers

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Things that can go wrong while building or decoding a catalog
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The catalog root does not exist or is not a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// Walking the tree failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// where it went wrong
        path: PathBuf,
        /// what went wrong
        source: std::io::Error,
    },
    /// The catalog message was not valid UTF-8
    #[error("catalog could not be decoded")]
    Undecodable,
}

/// Ordered list of unique relative file paths, using `/` as the separator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<String>,
}

/// A symbolic link is listed when it resolves to a regular file within the root
fn link_is_offerable(link: &Path, canonical_root: &Path) -> bool {
    link.canonicalize()
        .is_ok_and(|target| target.is_file() && target.starts_with(canonical_root))
}

/// Converts a path relative to the catalog root into its wire form
fn wire_path(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl Catalog {
    /// Walks `root` and lists every regular file beneath it.
    ///
    /// Entries are sorted by name within each directory.
    /// Symbolic links to regular files inside the root are listed under the link's own name;
    /// links to directories are not descended into.
    /// Files whose names cannot be expressed on the wire (non-Unicode, or containing a comma)
    /// are left out with a diagnostic, as are unreadable subdirectories.
    pub fn build(root: &Path) -> Result<Self, Error> {
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        let canonical_root = root.canonicalize().map_err(|source| Error::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let mut entries = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(wderr) => {
                    if let Some(ioe) = wderr.io_error() {
                        if ioe.kind() == ErrorKind::PermissionDenied {
                            error!("{ioe}");
                            continue;
                        }
                    }
                    let path = wderr.path().unwrap_or(root).to_path_buf();
                    return Err(Error::Io {
                        path,
                        source: wderr.into(),
                    });
                }
            };
            if entry.path_is_symlink() {
                if !link_is_offerable(entry.path(), &canonical_root) {
                    debug!("Not offering {}: link does not lead to a file inside the root", entry.path().display());
                    continue;
                }
            } else if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            match wire_path(relative) {
                Some(p) if p.contains(',') => {
                    warn!("Not offering {p}: file names containing commas cannot be listed");
                }
                Some(p) => entries.push(p),
                None => error!(
                    "Path name {} could not be converted into Unicode string",
                    relative.display()
                ),
            }
        }
        Ok(Self::from_entries(entries))
    }

    /// Creates a catalog from a list of paths, dropping duplicates but otherwise preserving order
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(Into::<String>::into)
            .filter(|e| seen.insert(e.clone()))
            .collect();
        Self { entries }
    }

    /// Is this path on offer?
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e == path)
    }

    /// The paths on offer, in order
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of paths on offer
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is there nothing on offer?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the catalog message
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        self.entries.join(",").into_bytes()
    }

    /// Decodes a catalog message
    pub fn from_wire(payload: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(payload).map_err(|_| Error::Undecodable)?;
        Ok(Self::from_entries(
            text.trim()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        ))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::fs;

    use assertables::assert_matches;
    use pretty_assertions::assert_eq;

    use super::{Catalog, Error};

    fn setup_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("sub/x.bin"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("sub/deeper/y.txt"), "y").unwrap();
        fs::write(root.join("sub/with,comma.txt"), "nope").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        dir
    }

    #[test]
    fn walks_tree() {
        let dir = setup_tree();
        let cat = Catalog::build(dir.path()).unwrap();
        assert_eq!(
            cat.entries(),
            &["a.txt", "b.txt", "sub/deeper/y.txt", "sub/x.bin"]
        );
        assert!(cat.contains("sub/x.bin"));
        assert!(!cat.contains("sub/with,comma.txt"));
        assert!(!cat.contains("empty"));
    }

    #[cfg(unix)]
    #[test]
    fn links_inside_root() {
        use std::os::unix::fs::symlink;

        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("real.txt"), "r").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/inner.txt"), "i").unwrap();
        symlink("real.txt", root.join("link.txt")).unwrap();
        symlink(outside.path().join("secret.txt"), root.join("escape.txt")).unwrap();
        symlink("sub", root.join("subdir-link")).unwrap();
        symlink("missing.txt", root.join("dangling.txt")).unwrap();

        let cat = Catalog::build(root).unwrap();
        assert_eq!(cat.entries(), &["link.txt", "real.txt", "sub/inner.txt"]);
        assert!(!cat.contains("escape.txt"));
        assert!(!cat.contains("subdir-link/inner.txt"));
    }

    #[test]
    fn missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let res = Catalog::build(&dir.path().join("nonexistent"));
        assert_matches!(res, Err(Error::NotADirectory(_)));
    }

    #[test]
    fn empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let cat = Catalog::build(dir.path()).unwrap();
        assert!(cat.is_empty());
        assert_eq!(cat.to_wire(), b"");
    }

    #[test]
    fn wire_form() {
        let cat = Catalog::from_entries(["x.txt", "dir/y.txt", "x.txt"]);
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.to_wire(), b"x.txt,dir/y.txt");
        let decoded = Catalog::from_wire(b"x.txt,dir/y.txt").unwrap();
        assert_eq!(decoded, cat);
    }

    #[test]
    fn decode_tolerates_whitespace_and_empties() {
        let decoded = Catalog::from_wire(b" a.txt, ,b.txt,\n").unwrap();
        assert_eq!(decoded.entries(), &["a.txt", "b.txt"]);
        assert!(Catalog::from_wire(b"").unwrap().is_empty());
        assert_matches!(Catalog::from_wire(&[0xc3, 0x28]), Err(Error::Undecodable));
    }
}
