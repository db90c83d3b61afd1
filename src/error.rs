//! Typed errors for vault and export operations.
//!
//! Command handlers wrap these in `anyhow` with extra context; the library
//! surface keeps them typed so callers can tell a malformed page apart from
//! an unreadable directory.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The directory lacks the marker subdirectory (`.obsidian` by default).
    #[error("not a valid vault (missing {marker} directory): {}", path.display())]
    NotAVault { path: PathBuf, marker: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The front-matter block exists but is not valid YAML for a mapping.
    #[error("malformed front-matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize front-matter for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclude glob: {0}")]
    Glob(#[from] globset::Error),

    #[error("failed to read export {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
