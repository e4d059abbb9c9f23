use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Scroll policy applied when the selected row changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeScrollPolicy {
    KeepInView,
    CenterOnSelect,
}

/// Visual settings of the tree widget.
#[derive(Clone, Debug)]
pub struct TreeListViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    pub highlight_style: Style,
    pub line_style: Style,
    /// Row being dragged.
    pub drag_style: Style,
    /// Name cell of the node being edited.
    pub edit_style: Style,
    /// Nodes matching the active search.
    pub match_style: Style,
    /// Text shown for a draft that has no name yet.
    pub draft_placeholder: &'a str,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for TreeListViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            line_style: Style::default(),
            drag_style: Style::default().add_modifier(Modifier::DIM),
            edit_style: Style::default().add_modifier(Modifier::UNDERLINED),
            match_style: Style::default().add_modifier(Modifier::BOLD),
            draft_placeholder: "new label",
            highlight_symbol: ">> ",
            borders: Borders::ALL,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}
