use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Cell;

use crate::context::TreeRowContext;

/// Strings used to draw indentation and expander markers.
#[derive(Clone, Copy, Debug)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    /// Drawn after the edit buffer of the node being renamed.
    pub cursor: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            cursor: "▏",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            cursor: "_",
        }
    }
}

/// Builds the label line: indentation, expander, name, and a move badge.
pub fn tree_label_line<'a>(
    ctx: &TreeRowContext,
    name: Span<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    let expander = if ctx.has_children {
        if ctx.is_expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else {
        glyphs.leaf
    };

    let mut spans = Vec::with_capacity(ctx.depth + 4);
    for _ in 0..ctx.depth {
        spans.push(Span::styled(glyphs.indent, ctx.line_style));
    }
    spans.push(Span::raw(expander));
    spans.push(Span::raw(" "));
    spans.push(name);
    if ctx.is_dragging && ctx.moving_count > 0 {
        spans.push(Span::styled(format!(" (+{})", ctx.moving_count), Style::default()));
    }
    Line::from(spans)
}

pub fn tree_name_cell<'a>(
    ctx: &TreeRowContext,
    name: Span<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Cell<'a> {
    Cell::from(tree_label_line(ctx, name, glyphs))
}
