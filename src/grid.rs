//! Grid-wide helpers: build order, cell lookup and a printable layout table.
//!
//! Pieces are built row by row, left to right. The build index of a piece is
//! also its slot in saved puzzle state, so the order must never change.

use crate::geometry::{compute_box, edge_profile, Bulge, Edge, EdgeProfile, GridSpec, PiecePosition};

/// Iterates every cell of the grid in build order.
pub fn positions(grid: &GridSpec) -> impl Iterator<Item = PiecePosition> {
    let columns = grid.columns();
    (1..=grid.rows()).flat_map(move |row| (1..=columns).map(move |column| PiecePosition::new(column, row)))
}

/// Converts a cell to its build index.
///
/// Index order is row-major: `idx = (row - 1) * columns + (column - 1)`.
#[inline]
pub fn position_to_index(grid: &GridSpec, position: PiecePosition) -> usize {
    (position.row as usize - 1) * grid.columns() as usize + (position.column as usize - 1)
}

/// Converts a build index back to its cell.
#[inline]
pub fn index_to_position(grid: &GridSpec, index: usize) -> PiecePosition {
    let columns = grid.columns() as usize;
    PiecePosition::new((index % columns) as u32 + 1, (index / columns) as u32 + 1)
}

/// The cell sharing `edge` with `position`, if it is not a border edge.
pub fn neighbor(grid: &GridSpec, position: PiecePosition, edge: Edge) -> Option<PiecePosition> {
    let PiecePosition { column, row } = position;
    let candidate = match edge {
        Edge::Top => PiecePosition::new(column, row.checked_sub(1)?),
        Edge::Right => PiecePosition::new(column + 1, row),
        Edge::Bottom => PiecePosition::new(column, row + 1),
        Edge::Left => PiecePosition::new(column.checked_sub(1)?, row),
    };
    grid.contains(candidate).then_some(candidate)
}

/// Single-character code for an edge: `-` border, `T` tab, `B` blank.
fn edge_char(profile: EdgeProfile) -> char {
    match profile.bulge() {
        None => '-',
        Some(Bulge::Tab) => 'T',
        Some(Bulge::Blank) => 'B',
    }
}

/// Formats every piece's box and edge shapes as a human-readable table.
///
/// Edges are listed top, right, bottom, left.
pub fn format_layout(grid: &GridSpec) -> String {
    let mut output = format!("{:<8}{:>6}{:>6}{:>6}{:>6}  edges\n", "piece", "x", "y", "w", "h");

    for position in positions(grid) {
        let piece_box = compute_box(position, grid);
        let edges: String = Edge::ALL
            .iter()
            .map(|&edge| edge_char(edge_profile(position, grid, edge)))
            .collect();
        output.push_str(&format!(
            "{:<8}{:>6}{:>6}{:>6}{:>6}  {}\n",
            position.to_string(),
            piece_box.x,
            piece_box.y,
            piece_box.width,
            piece_box.height,
            edges
        ));
    }

    output
}
