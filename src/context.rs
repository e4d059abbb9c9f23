use ratatui::style::Style;

/// Per-row data handed to label rendering.
#[derive(Clone, Copy, Debug)]
pub struct TreeRowContext {
    /// Display depth; the projected depth for the row being dragged.
    pub depth: usize,
    pub is_expanded: bool,
    pub has_children: bool,
    pub is_dragging: bool,
    /// Descendants moving along with the dragged row.
    pub moving_count: usize,
    pub line_style: Style,
}
