//! Pointer dragging with a magnetic pull towards a piece's original box.
//!
//! The presentation layer owns the [`DragSession`] for the piece under the
//! pointer and feeds pointer positions through it. Snapping happens here,
//! before the piece model sees the position, so the model's lock check stays
//! an exact comparison.

use crate::pieces::Piece;

/// Default distance, in pixels, under which a dragged piece snaps home.
pub const DEFAULT_MAGNET_TOLERANCE: i32 = 12;

/// Pulls `candidate` onto `home` when it is strictly within `tolerance` on
/// both axes.
pub fn magnet_snap(candidate: (i32, i32), home: (i32, i32), tolerance: i32) -> (i32, i32) {
    let dx = home.0 - candidate.0;
    let dy = home.1 - candidate.1;
    if dx.abs() < tolerance && dy.abs() < tolerance {
        home
    } else {
        candidate
    }
}

/// An in-progress drag of one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragSession {
    piece: usize,
    grab_offset: (i32, i32),
    tolerance: i32,
}

impl DragSession {
    /// Starts dragging `piece` (build index `index`) from `pointer`.
    ///
    /// The offset between the pointer and the piece is kept for the whole
    /// drag so the piece does not jump under the cursor.
    pub fn start(index: usize, piece: &Piece, pointer: (i32, i32), tolerance: i32) -> Self {
        Self {
            piece: index,
            grab_offset: (pointer.0 - piece.current_x(), pointer.1 - piece.current_y()),
            tolerance,
        }
    }

    /// Build index of the dragged piece.
    pub fn piece(&self) -> usize {
        self.piece
    }

    /// Moves the piece to follow `pointer`, snapping it home when close.
    /// Returns the committed position.
    pub fn drag_to(&self, piece: &mut Piece, pointer: (i32, i32)) -> (i32, i32) {
        let candidate = (pointer.0 - self.grab_offset.0, pointer.1 - self.grab_offset.1);
        let home = (piece.bounds().x, piece.bounds().y);
        let (x, y) = magnet_snap(candidate, home, self.tolerance);
        piece.set_position(Some(x), Some(y));
        (x, y)
    }
}
