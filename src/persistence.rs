//! Saving and restoring puzzle progress.
//!
//! State is stored as JSON:
//! - `version`: format version, see [`STATE_VERSION`]
//! - `sourceUrl`, `columns`, `rows`, `scalePolicy`: what the puzzle was built from
//! - `pieces`: `{x, y}` per piece, in build order, in zone pixels

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::source::ScalePolicy;

/// Version written into every saved state.
pub const STATE_VERSION: u32 = 1;

/// Where a single piece was left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPiece {
    pub x: i32,
    pub y: i32,
}

/// Everything needed to resume a puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleState {
    pub version: u32,
    pub source_url: String,
    pub columns: u32,
    pub rows: u32,
    pub scale_policy: ScalePolicy,
    pub pieces: Vec<SavedPiece>,
}

/// Serializes a state to its stored form.
pub fn encode(state: &PuzzleState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parses a stored state, rejecting other format versions.
pub fn decode(contents: &str) -> Result<PuzzleState, PersistenceError> {
    let state: PuzzleState = serde_json::from_str(contents)?;
    if state.version != STATE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: STATE_VERSION,
            found: state.version,
        });
    }
    Ok(state)
}

/// Somewhere to keep the current puzzle between sessions.
pub trait PuzzleStore {
    fn save(&mut self, state: &PuzzleState) -> Result<(), PersistenceError>;

    /// `Ok(None)` when nothing was saved yet.
    fn load(&self) -> Result<Option<PuzzleState>, PersistenceError>;
}

/// Keeps the state in a JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PuzzleStore for JsonFileStore {
    fn save(&mut self, state: &PuzzleState) -> Result<(), PersistenceError> {
        fs::write(&self.path, encode(state)?)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<PuzzleState>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        decode(&contents).map(Some)
    }
}

/// Keeps the encoded state in memory, the way a browser's local storage
/// keeps a string.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    contents: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `contents`, valid or not.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl PuzzleStore for MemoryStore {
    fn save(&mut self, state: &PuzzleState) -> Result<(), PersistenceError> {
        self.contents = Some(encode(state)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<PuzzleState>, PersistenceError> {
        self.contents.as_deref().map(decode).transpose()
    }
}

/// Discards everything; for puzzles that should not be resumed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl PuzzleStore for NullStore {
    fn save(&mut self, _state: &PuzzleState) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<PuzzleState>, PersistenceError> {
        Ok(None)
    }
}
