//! SVG rendering of a puzzle.
//!
//! Every piece becomes a nested `<svg>` surface placed at the piece's current
//! position. The source image is clipped to the piece outline and shifted so
//! the piece's box lines up with the outline's local frame.

use crate::geometry::SHADOW_MARGIN;
use crate::pieces::Piece;
use crate::puzzle::Puzzle;

/// Escapes text for use inside a double-quoted XML attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Renders one piece as a self-contained `<svg>` element.
///
/// `href` is the source image, drawn at `source_width x source_height`.
pub fn piece_svg(piece: &Piece, href: &str, source_width: u32, source_height: u32) -> String {
    let position = piece.position();
    let id = format!("{}_{}", position.row, position.column);
    let (x, y) = piece.surface_origin();
    let size = piece.surface_size();
    let bounds = piece.bounds();

    let mut svg = format!(
        r#"<svg class="{class}" x="{x}" y="{y}" width="{width}" height="{height}" style="z-index:{z}">"#,
        class = piece.class(),
        width = size.width,
        height = size.height,
        z = piece.z_index(),
    );
    svg.push_str(&format!(
        r##"<defs><path id="p{id}" d="{d}"/><clipPath id="c{id}"><use href="#p{id}"/></clipPath></defs>"##,
        d = piece.outline(),
    ));
    svg.push_str(&format!(
        r#"<g clip-path="url(#c{id})"><image href="{href}" x="{ix}" y="{iy}" width="{source_width}" height="{source_height}"/></g>"#,
        href = escape_attribute(href),
        ix = SHADOW_MARGIN.left - bounds.x,
        iy = SHADOW_MARGIN.top - bounds.y,
    ));
    svg.push_str(&format!(r##"<use href="#p{id}" fill="none" stroke="#000" stroke-opacity="0.4"/></svg>"##));
    svg
}

/// Renders the whole puzzle, pieces stacked by z-index, as an SVG document
/// the size of the viewport.
pub fn document(puzzle: &Puzzle) -> String {
    let viewport = puzzle.viewport();
    let grid = puzzle.grid();
    let href = &puzzle.source().url;

    let mut order: Vec<&Piece> = puzzle.pieces().iter().collect();
    // stable: equal z-indexes keep build order
    order.sort_by_key(|piece| piece.z_index());

    let mut output = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">\n",
        viewport.width, viewport.height
    );
    output.push_str(&format!(
        "<g transform=\"translate({},{})\">\n",
        viewport.padding_x, viewport.padding_y
    ));
    for piece in order {
        output.push_str(&piece_svg(piece, href, grid.source_width(), grid.source_height()));
        output.push('\n');
    }
    output.push_str("</g>\n</svg>\n");
    output
}
