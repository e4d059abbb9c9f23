// Drag example: reparent a label with a simulated pointer gesture, then print
// the change set a host would send to its save endpoint.
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_sortable_tree::{
    LabelTree, NodeId, TreeEditorState, TreeGlyphs, TreeListView, TreeListViewStyle, TreeNode,
};

// Fixed taxonomy: an open group, a collapsed group, and a loose label.
fn taxonomy() -> LabelTree {
    LabelTree::from_roots([
        TreeNode::new(1, "Fruit")
            .with_children([TreeNode::new(2, "Apple"), TreeNode::new(3, "Pear")]),
        TreeNode::new(4, "Vegetables")
            .with_children([TreeNode::new(5, "Carrot")])
            .with_collapsed(true),
        TreeNode::new(6, "Banana"),
    ])
    .unwrap_or_default()
}

fn render(state: &mut TreeEditorState) -> String {
    let area = Rect::new(0, 0, 36, 10);
    let mut buffer = Buffer::empty(area);
    TreeListView::new(TreeListViewStyle::default())
        .glyphs(TreeGlyphs::ascii())
        .render(area, &mut buffer, state);
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() {
    let before = taxonomy();
    let mut state = TreeEditorState::new(before.clone());
    println!("{}", render(&mut state));

    // Pick up "Banana", hover the collapsed "Vegetables" long enough to open it.
    let now = Instant::now();
    state.drag_start(NodeId(6));
    state.drag_over(Some(NodeId(4)), now);
    state.tick(now + Duration::from_millis(700));

    // Then drop it under "Pear", one level to the right.
    let width = state.config().indentation_width;
    state.drag_over(Some(NodeId(3)), now + Duration::from_millis(800));
    state.drag_move(width);
    if let Some(projection) = state.projection() {
        println!(
            "dropping at depth {} under {:?}",
            projection.depth, projection.parent_id
        );
    }
    println!("{}", render(&mut state));

    let event = state.drag_end();
    println!("{event:?}");
    println!("{}", render(&mut state));

    for entry in state.diff_against(&before).iter_changed() {
        println!("{:?} {} ({})", entry.change, entry.name, entry.id);
    }
}
