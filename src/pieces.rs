//! Runtime puzzle pieces.
//!
//! A piece pairs its fixed geometry with where the player has put it. It is
//! either locked (sitting exactly on its original box) or unlocked.

use std::fmt;

use crate::geometry::{
    build_outline, compute_box, CellSize, GridSpec, OutlinePath, PieceBox, PiecePosition,
    SHADOW_MARGIN,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

/// Visual classification handed to the presentation layer.
///
/// Displays as the class list the piece's surface should carry, e.g.
/// `piece lock shadow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PieceClass {
    pub locked: bool,
    pub shadow: bool,
}

impl fmt::Display for PieceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("piece")?;
        if self.locked {
            f.write_str(" lock")?;
        }
        if self.shadow {
            f.write_str(" shadow")?;
        }
        Ok(())
    }
}

/// One piece of a built puzzle.
#[derive(Clone, Debug)]
pub struct Piece {
    position: PiecePosition,
    bounds: PieceBox,
    outline: OutlinePath,
    current_x: i32,
    current_y: i32,
    lock: LockState,
    class: PieceClass,
    z_index: u32,
}

impl Piece {
    /// Builds the piece at `position`, placed on its original box but not
    /// yet locked. `shadow` marks its surface for drop-shadow filtering.
    pub fn new(position: PiecePosition, grid: &GridSpec, shadow: bool) -> Self {
        let bounds = compute_box(position, grid);
        let outline = build_outline(position, grid, &bounds);
        Self {
            position,
            bounds,
            outline,
            current_x: bounds.x,
            current_y: bounds.y,
            lock: LockState::Unlocked,
            class: PieceClass {
                locked: false,
                shadow,
            },
            z_index: 0,
        }
    }

    pub fn position(&self) -> PiecePosition {
        self.position
    }

    /// The piece's original box; also the source rectangle it shows.
    pub fn bounds(&self) -> &PieceBox {
        &self.bounds
    }

    pub fn outline(&self) -> &OutlinePath {
        &self.outline
    }

    pub fn current_x(&self) -> i32 {
        self.current_x
    }

    pub fn current_y(&self) -> i32 {
        self.current_y
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock == LockState::Locked
    }

    pub fn class(&self) -> PieceClass {
        self.class
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    pub(crate) fn set_z_index(&mut self, z_index: u32) {
        self.z_index = z_index;
    }

    /// Whether the piece currently sits exactly on its original box.
    pub fn is_home(&self) -> bool {
        self.current_x == self.bounds.x && self.current_y == self.bounds.y
    }

    /// Moves the piece. A missing coordinate means "back to the original
    /// box" on that axis. The lock state is left alone; call
    /// [`Piece::evaluate_lock`] once the move is committed.
    pub fn set_position(&mut self, x: Option<i32>, y: Option<i32>) {
        self.current_x = x.unwrap_or(self.bounds.x);
        self.current_y = y.unwrap_or(self.bounds.y);
    }

    /// Recomputes the lock state.
    ///
    /// `Some(true)` and `Some(false)` force the state; `None` locks the piece
    /// exactly when it is home.
    pub fn evaluate_lock(&mut self, force: Option<bool>) -> LockState {
        let locked = force.unwrap_or_else(|| self.is_home());
        self.lock = if locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        };
        self.class.locked = locked;
        self.lock
    }

    /// Top-left corner of the piece's drawing surface, which extends past
    /// the box by the shadow margin.
    pub fn surface_origin(&self) -> (i32, i32) {
        (
            self.current_x - SHADOW_MARGIN.left,
            self.current_y - SHADOW_MARGIN.top,
        )
    }

    pub fn surface_size(&self) -> CellSize {
        self.bounds.surface_size()
    }
}
