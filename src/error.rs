use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::category::Category;

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A source file could not be read. Scoped to one file; the scan continues.
    #[error("Failed to read source file {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Writer needs at least one output category")]
    NoCategories,

    /// Disk full, permission denied and friends. The pending buffer is kept.
    #[error("Failed to write output file {}: {source}", path.display())]
    WriterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Category {0} has no output stream")]
    UnmanagedCategory(Category),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read keyword table {}: {source}", path.display())]
    KeywordRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid keyword table {}: {source}", path.display())]
    KeywordParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::InputRead { .. })
    }
}

/// Best-effort extraction degraded but did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralIssue {
    MissingClass,
    UnterminatedDocComment,
}

impl std::fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClass => f.write_str("no top-level class declaration found"),
            Self::UnterminatedDocComment => f.write_str("doc comment never closed"),
        }
    }
}
