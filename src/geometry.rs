//! Piece geometry: bounding boxes and interlocking outlines.
//!
//! A puzzle cuts a `source_width x source_height` raster into a grid of
//! cells. Each piece covers its cell plus a margin on every side that borders
//! another piece, so tabs have room to protrude into the neighbor's cell.
//! Pieces on the last column or row absorb whatever pixels the rounded cell
//! size leaves over, which makes the grid tile the source exactly.
//!
//! Outlines are traced clockwise (top, right, bottom, left) in the piece's
//! local frame, whose origin sits `SHADOW_MARGIN.left/top` pixels above and to
//! the left of the box so drop shadows fit inside the same drawing surface.

use std::fmt;

use crate::error::GridError;

/// Extra drawing room around a piece's box reserved for its drop shadow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowMargin {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

pub const SHADOW_MARGIN: ShadowMargin = ShadowMargin {
    top: 10,
    left: 10,
    bottom: 20,
    right: 20,
};

/// Largest source side a grid accepts. Boxes, outlines and on-screen
/// positions are `i32` pixels, and this keeps every sum of them in range.
pub const MAX_SOURCE_SIDE: u32 = 1 << 20;

/// Number of columns and rows laid over a source of a given pixel size.
///
/// Only constructible through [`GridSpec::new`], so every value describes a
/// grid whose pieces all have a positive size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSpec {
    columns: u32,
    rows: u32,
    source_width: u32,
    source_height: u32,
}

/// A cell of the grid, 1-based on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PiecePosition {
    pub column: u32,
    pub row: u32,
}

impl PiecePosition {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for PiecePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// A width/height pair in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: i32,
    pub height: i32,
}

/// The rectangle of the source a piece covers, margins included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PieceBox {
    /// Size of the piece's drawing surface once the shadow margin is added.
    pub fn surface_size(&self) -> CellSize {
        CellSize {
            width: self.width + SHADOW_MARGIN.left + SHADOW_MARGIN.right,
            height: self.height + SHADOW_MARGIN.top + SHADOW_MARGIN.bottom,
        }
    }
}

/// `round(numerator / denominator)` for positive operands, halves rounding up.
#[inline]
fn round_div(numerator: i64, denominator: i64) -> i32 {
    ((2 * numerator + denominator) / (2 * denominator)) as i32
}

impl GridSpec {
    /// Validates a grid against the source it will cut.
    ///
    /// Rejects empty grids, empty or oversized sources, and grids so fine
    /// that a rounded cell is zero pixels wide or the last column/row would
    /// be left with nothing of its own.
    pub fn new(
        columns: u32,
        rows: u32,
        source_width: u32,
        source_height: u32,
    ) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyGrid { columns, rows });
        }
        if source_width == 0 || source_height == 0 {
            return Err(GridError::EmptySource {
                width: source_width,
                height: source_height,
            });
        }
        if source_width > MAX_SOURCE_SIDE || source_height > MAX_SOURCE_SIDE {
            return Err(GridError::SourceTooLarge {
                width: source_width,
                height: source_height,
                max: MAX_SOURCE_SIDE,
            });
        }

        let grid = Self {
            columns,
            rows,
            source_width,
            source_height,
        };
        let basic = grid.basic_cell_size();
        let fits = |cell: i32, count: u32, total: u32| {
            cell >= 1 && (cell as i64) * (count as i64 - 1) < total as i64
        };
        if !fits(basic.width, columns, source_width) || !fits(basic.height, rows, source_height) {
            return Err(GridError::CellsTooSmall {
                columns,
                rows,
                width: source_width,
                height: source_height,
            });
        }

        Ok(grid)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn source_width(&self) -> u32 {
        self.source_width
    }

    pub fn source_height(&self) -> u32 {
        self.source_height
    }

    pub fn piece_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn contains(&self, position: PiecePosition) -> bool {
        (1..=self.columns).contains(&position.column) && (1..=self.rows).contains(&position.row)
    }

    /// The tab-free tile size: source size divided by the grid, rounded.
    pub fn basic_cell_size(&self) -> CellSize {
        CellSize {
            width: round_div(self.source_width as i64, self.columns as i64),
            height: round_div(self.source_height as i64, self.rows as i64),
        }
    }

    /// Overlap allowance on each interior side of a piece: a quarter cell.
    pub fn piece_margin(&self) -> CellSize {
        let basic = self.basic_cell_size();
        CellSize {
            width: round_div(basic.width as i64, 4),
            height: round_div(basic.height as i64, 4),
        }
    }

    /// Pixels the last column's cell is short of (or over) a basic cell.
    fn column_shortfall(&self, column: u32) -> i32 {
        if column == self.columns {
            self.basic_cell_size().width * self.columns as i32 - self.source_width as i32
        } else {
            0
        }
    }

    fn row_shortfall(&self, row: u32) -> i32 {
        if row == self.rows {
            self.basic_cell_size().height * self.rows as i32 - self.source_height as i32
        } else {
            0
        }
    }
}

/// Start and length of one piece along one axis.
///
/// `index` is 1-based. The first cell gets no leading margin, the last cell
/// gets no trailing margin and takes the remainder of `total`.
fn axis_span(index: u32, count: u32, total: u32, basic: i32, margin: i32) -> (i32, i32) {
    let first = index == 1;
    let last = index == count;
    let offset = basic * (index as i32 - 1);

    let core = if last { total as i32 - offset } else { basic };
    let leading = if first { 0 } else { margin };
    let trailing = if last { 0 } else { margin };

    (offset - leading, leading + core + trailing)
}

/// Computes the source rectangle covered by the piece at `position`.
///
/// # Panics
///
/// Panics if `position` lies outside `grid`.
pub fn compute_box(position: PiecePosition, grid: &GridSpec) -> PieceBox {
    assert!(
        grid.contains(position),
        "piece {position} is outside a {}x{} grid",
        grid.columns,
        grid.rows
    );
    let basic = grid.basic_cell_size();
    let margin = grid.piece_margin();

    let (x, width) = axis_span(
        position.column,
        grid.columns,
        grid.source_width,
        basic.width,
        margin.width,
    );
    let (y, height) = axis_span(
        position.row,
        grid.rows,
        grid.source_height,
        basic.height,
        margin.height,
    );

    PieceBox {
        x,
        y,
        width,
        height,
    }
}

/// The four sides of a piece, in tracing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// Whether the edge runs along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Top | Edge::Bottom)
    }
}

/// Which way an interlocking edge curves relative to the piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bulge {
    /// Protrudes out of the piece into the neighbor's cell.
    Tab,
    /// Cuts into the piece to receive the neighbor's tab.
    Blank,
}

impl Bulge {
    pub fn opposite(self) -> Self {
        match self {
            Bulge::Tab => Bulge::Blank,
            Bulge::Blank => Bulge::Tab,
        }
    }
}

/// Shape parameters of one edge, lengths measured along the tracing direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeProfile {
    /// Straight edge on the border of the source.
    Border { length: f64 },
    /// Straight run, elliptical arc across `chord`, straight run.
    Interlock {
        lead: f64,
        radius: f64,
        chord: f64,
        trail: f64,
        bulge: Bulge,
        /// Whether this side carries the anti-aliasing pixel of the pair.
        widened: bool,
    },
}

impl EdgeProfile {
    /// Distance covered along the edge from corner to corner.
    pub fn length(&self) -> f64 {
        match *self {
            EdgeProfile::Border { length } => length,
            EdgeProfile::Interlock {
                lead, chord, trail, ..
            } => lead + chord + trail,
        }
    }

    pub fn bulge(&self) -> Option<Bulge> {
        match *self {
            EdgeProfile::Border { .. } => None,
            EdgeProfile::Interlock { bulge, .. } => Some(bulge),
        }
    }
}

/// Tab run lengths and radius shared by every piece of a grid.
///
/// The radius is a quarter of the shorter cell side; the longer side's runs
/// absorb the difference so tabs stay round on non-square cells.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TabMetrics {
    horizontal_run: f64,
    vertical_run: f64,
    radius: f64,
}

impl TabMetrics {
    fn for_grid(grid: &GridSpec) -> Self {
        let basic = grid.basic_cell_size();
        let h = basic.width as f64 / 4.0;
        let v = basic.height as f64 / 4.0;
        let radius = h.min(v);
        Self {
            horizontal_run: h + (h - radius),
            vertical_run: v + (v - radius),
            radius,
        }
    }
}

fn on_border(position: PiecePosition, grid: &GridSpec, edge: Edge) -> bool {
    match edge {
        Edge::Top => position.row == 1,
        Edge::Right => position.column == grid.columns,
        Edge::Bottom => position.row == grid.rows,
        Edge::Left => position.column == 1,
    }
}

/// Describes one edge of the piece at `position`.
///
/// Tabs and blanks alternate like a checkerboard: a piece whose column and
/// row have the same parity carries tabs on its top and bottom edges and
/// blanks on its left and right edges, the other half the reverse. Two
/// neighbors therefore always disagree on their shared edge. The blank side
/// of each pair is widened by one pixel (longer runs, radius shrunk by two)
/// so the pair overlaps instead of leaving a sub-pixel seam.
///
/// The last column/row shortfall is taken off the run that ends at the far
/// corner of the source, so the outline closes exactly on the box.
///
/// # Panics
///
/// Panics if `position` lies outside `grid`.
pub fn edge_profile(position: PiecePosition, grid: &GridSpec, edge: Edge) -> EdgeProfile {
    assert!(
        grid.contains(position),
        "piece {position} is outside a {}x{} grid",
        grid.columns,
        grid.rows
    );
    let basic = grid.basic_cell_size();
    let shortfall = if edge.is_horizontal() {
        grid.column_shortfall(position.column)
    } else {
        grid.row_shortfall(position.row)
    } as f64;

    if on_border(position, grid, edge) {
        let cell = if edge.is_horizontal() {
            basic.width
        } else {
            basic.height
        };
        return EdgeProfile::Border {
            length: cell as f64 - shortfall,
        };
    }

    let metrics = TabMetrics::for_grid(grid);
    let same_parity = position.column % 2 == position.row % 2;
    // tab-carrying edges never get the extra pixel
    let bulge = match (edge.is_horizontal(), same_parity) {
        (true, true) | (false, false) => Bulge::Tab,
        _ => Bulge::Blank,
    };
    let widened = bulge == Bulge::Blank;
    let extra = if widened { 1.0 } else { 0.0 };

    let run = if edge.is_horizontal() {
        metrics.horizontal_run
    } else {
        metrics.vertical_run
    } + extra;
    let (lead, trail) = match edge {
        Edge::Top | Edge::Right => (run, run - shortfall),
        Edge::Bottom | Edge::Left => (run - shortfall, run),
    };

    EdgeProfile::Interlock {
        lead,
        radius: metrics.radius - 2.0 * extra,
        chord: 2.0 * metrics.radius - 2.0 * extra,
        trail,
        bulge,
        widened,
    }
}

/// One drawing command of an outline. Everything after the initial move is
/// relative to the current point, the same way SVG's lower-case commands are.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    Horizontal(f64),
    Vertical(f64),
    /// Large elliptical arc with equal radii ending at `(dx, dy)`. `sweep`
    /// selects the clockwise arc, which points out of a clockwise outline.
    Arc {
        radius: f64,
        sweep: bool,
        dx: f64,
        dy: f64,
    },
    Close,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PathSegment::MoveTo { x, y } => write!(f, "M{x} {y}"),
            PathSegment::Horizontal(dx) => write!(f, "h{dx}"),
            PathSegment::Vertical(dy) => write!(f, "v{dy}"),
            PathSegment::Arc {
                radius,
                sweep,
                dx,
                dy,
            } => write!(f, "a{radius},{radius} 0 1,{} {dx},{dy}", u8::from(sweep)),
            PathSegment::Close => f.write_str("Z"),
        }
    }
}

/// A closed piece silhouette in the piece's local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OutlinePath {
    segments: Vec<PathSegment>,
}

impl OutlinePath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.segments.iter()
    }

    /// Whether the outline has no tabs or blanks at all.
    pub fn is_rectangle(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Arc { .. }))
    }

    /// Where the pen rests after the last segment before closing.
    pub fn end_point(&self) -> (f64, f64) {
        let mut point = (0.0, 0.0);
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo { x, y } => point = (x, y),
                PathSegment::Horizontal(dx) => point.0 += dx,
                PathSegment::Vertical(dy) => point.1 += dy,
                PathSegment::Arc { dx, dy, .. } => {
                    point.0 += dx;
                    point.1 += dy;
                }
                PathSegment::Close => {}
            }
        }
        point
    }
}

impl fmt::Display for OutlinePath {
    /// Formats the outline as an SVG path `d` attribute.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a OutlinePath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Unit tracing direction of an edge in screen coordinates (y down).
fn edge_direction(edge: Edge) -> (f64, f64) {
    match edge {
        Edge::Top => (1.0, 0.0),
        Edge::Right => (0.0, 1.0),
        Edge::Bottom => (-1.0, 0.0),
        Edge::Left => (0.0, -1.0),
    }
}

fn run_segment(edge: Edge, length: f64) -> PathSegment {
    let (dx, dy) = edge_direction(edge);
    if edge.is_horizontal() {
        PathSegment::Horizontal(dx * length)
    } else {
        PathSegment::Vertical(dy * length)
    }
}

/// Traces the interlocking outline of the piece at `position`.
///
/// `piece_box` must be the result of [`compute_box`] for the same inputs; a
/// box that does not touch the source's left or top border starts tracing
/// one margin in. The left edge ends with a
/// close command, which also draws its final straight run.
///
/// # Panics
///
/// Panics if `position` lies outside `grid`.
pub fn build_outline(position: PiecePosition, grid: &GridSpec, piece_box: &PieceBox) -> OutlinePath {
    let margin = grid.piece_margin();
    let start_x = SHADOW_MARGIN.left + if piece_box.x == 0 { 0 } else { margin.width };
    let start_y = SHADOW_MARGIN.top + if piece_box.y == 0 { 0 } else { margin.height };

    let mut segments = Vec::with_capacity(14);
    segments.push(PathSegment::MoveTo {
        x: start_x as f64,
        y: start_y as f64,
    });

    for edge in Edge::ALL {
        let profile = edge_profile(position, grid, edge);
        match profile {
            EdgeProfile::Border { length } => {
                if edge != Edge::Left {
                    segments.push(run_segment(edge, length));
                }
            }
            EdgeProfile::Interlock {
                lead,
                radius,
                chord,
                trail,
                bulge,
                ..
            } => {
                let (dx, dy) = edge_direction(edge);
                segments.push(run_segment(edge, lead));
                segments.push(PathSegment::Arc {
                    radius,
                    sweep: bulge == Bulge::Tab,
                    dx: dx * chord + 0.0,
                    dy: dy * chord + 0.0,
                });
                if edge != Edge::Left {
                    segments.push(run_segment(edge, trail));
                }
            }
        }
    }
    segments.push(PathSegment::Close);

    OutlinePath { segments }
}
