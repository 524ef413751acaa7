//! Jigsaw Puzzle Library
//!
//! Cuts an image into interlocking jigsaw pieces and tracks where the player
//! has put them. Geometry is pure data (boxes and outline paths); drawing it
//! is left to whatever presentation layer hosts the puzzle.

pub mod drag;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod pieces;
pub mod puzzle;
pub mod scheduler;
pub mod source;
pub mod visualization;

pub use error::{GridError, PersistenceError, PuzzleError, SourceError};
pub use geometry::{build_outline, compute_box, GridSpec, OutlinePath, PieceBox, PiecePosition};
pub use persistence::{PuzzleState, PuzzleStore};
pub use pieces::{LockState, Piece};
pub use puzzle::{Puzzle, PuzzleConfig};
pub use source::{ScalePolicy, Viewport};
