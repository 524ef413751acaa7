//! Error types for grid validation, source loading and persistence.

use std::path::PathBuf;

/// A grid description that cannot produce any pieces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("a puzzle needs at least one column and one row, got {columns}x{rows}")]
    EmptyGrid { columns: u32, rows: u32 },
    #[error("source must have a non-zero size, got {width}x{height}")]
    EmptySource { width: u32, height: u32 },
    #[error("source {width}x{height} exceeds the {max} pixel limit per side")]
    SourceTooLarge { width: u32, height: u32, max: u32 },
    #[error("{columns}x{rows} grid is too fine for a {width}x{height} source")]
    CellsTooSmall {
        columns: u32,
        rows: u32,
        width: u32,
        height: u32,
    },
}

/// The graphic source could not be resolved to a usable size.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("source {url} has no pixels ({width}x{height})")]
    ZeroSized { url: String, width: u32, height: u32 },
    #[error("scaling {url} for the viewport leaves no pixels")]
    ScaledAway { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("puzzle state i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("puzzle state is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("puzzle state version {found} does not match {expected}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Any failure surfaced by [`crate::puzzle::Puzzle`].
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
