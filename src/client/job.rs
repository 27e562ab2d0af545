//! Transfer requests and where they land locally
// (c) 2026 Ferry contributors

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Priority;
use crate::util::path::{basename, safe_relative, UnsafePath};

/// One file the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Path as it appears in the server's catalog
    pub path: String,
    /// How urgent it is
    pub priority: Priority,
}

impl TransferRequest {
    /// Constructor
    pub fn new<S: Into<String>>(path: S, priority: Priority) -> Self {
        Self {
            path: path.into(),
            priority,
        }
    }
}

impl std::fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.priority)
    }
}

/// What to do when two requested files map onto the same local file
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollisionPolicy {
    /// Files are named by their basename; a later file silently replaces an earlier one
    Overwrite,
    /// Files are named by their basename; a later request whose name is already taken is rejected
    /// before anything is sent
    #[default]
    Reject,
    /// Files keep the server's directory structure beneath the output directory
    Namespace,
}

impl CollisionPolicy {
    /// Where the file for a catalog path is written
    pub(crate) fn destination(self, output_dir: &Path, wire_path: &str) -> Result<PathBuf, UnsafePath> {
        match self {
            Self::Overwrite | Self::Reject => {
                let name = basename(wire_path).ok_or(UnsafePath::Empty)?;
                Ok(output_dir.join(safe_relative(name)?))
            }
            Self::Namespace => Ok(output_dir.join(safe_relative(wire_path)?)),
        }
    }
}
