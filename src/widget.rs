use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::text::Span;
use ratatui::widgets::{
    Block, Borders, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Table,
};

use crate::context::TreeRowContext;
use crate::glyphs::{TreeGlyphs, tree_name_cell};
use crate::state::TreeEditorState;
use crate::style::TreeListViewStyle;

/// Renders the editor's visible rows (table + stateful).
///
/// The dragged row is drawn at its projected depth with a count of the
/// descendants moving along with it.
#[derive(Clone, Debug)]
pub struct TreeListView<'a> {
    style: TreeListViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
}

impl<'a> TreeListView<'a> {
    pub const fn new(style: TreeListViewStyle<'a>) -> Self {
        Self {
            style,
            glyphs: TreeGlyphs::unicode(),
        }
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn build_rows(&self, state: &TreeEditorState) -> Vec<Row<'a>> {
        let active = state.drag_active_id();
        let projection = state.projection();
        let editing = state.editing();

        let items = state.cached_items();
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let is_dragging = active == Some(item.id);
            let depth = if is_dragging {
                projection.map_or(item.depth, |projection| projection.depth)
            } else {
                item.depth
            };
            let is_search_match = state.is_search_match(item.id);
            let ctx = TreeRowContext {
                depth,
                is_expanded: !item.node.collapsed(),
                has_children: item.has_children(),
                is_dragging,
                moving_count: if is_dragging {
                    item.node.descendant_count()
                } else {
                    0
                },
                line_style: self.style.line_style,
            };

            let name = match editing {
                Some(session) if session.id == item.id => Span::styled(
                    format!("{}{}", session.buffer, self.glyphs.cursor),
                    self.style.edit_style,
                ),
                _ if item.node.is_draft() && item.node.name().is_empty() => {
                    Span::styled(self.style.draft_placeholder, self.style.edit_style)
                }
                _ if is_search_match => {
                    Span::styled(item.node.name().to_owned(), self.style.match_style)
                }
                _ => Span::raw(item.node.name().to_owned()),
            };

            let mut row = Row::new([tree_name_cell(&ctx, name, &self.glyphs)]);
            if is_dragging {
                row = row.style(self.style.drag_style);
            }
            rows.push(row);
        }
        rows
    }

    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        state: &TreeEditorState,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = state
            .list_state()
            .offset()
            .min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for TreeListView<'_> {
    type State = TreeEditorState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.ensure_visible_items();

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        state.ensure_selection_visible(inner_height, self.style.scroll_policy);

        let rows = self.build_rows(state);
        let scroll_rows = rows.len().saturating_sub(inner_height);

        let (table_area, table_block, scrollbar_area) = if scroll_rows > 0 && area.width > 1 {
            let table_area = Rect {
                width: area.width - 1,
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width - 1,
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            (table_area, block.borders(table_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };

        let table = Table::new(rows, [Constraint::Percentage(100)])
            .style(self.style.block_style)
            .block(table_block)
            .row_highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol);
        table.render(table_area, buf, state.list_state_mut());

        if let Some(scrollbar_area) = scrollbar_area {
            Self::render_scrollbar(scrollbar_area, buf, state, inner_height, scroll_rows);
        }
    }
}
