// Keyboard example: add, rename, and indent labels through the built-in keymap.
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_sortable_tree::{
    LabelTree, TreeEditorState, TreeEvent, TreeListView, TreeListViewStyle, TreeNode,
};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}

fn main() {
    let tree = LabelTree::from_roots([
        TreeNode::new(1, "Inbox"),
        TreeNode::new(2, "Projects").with_children([TreeNode::new(3, "Website")]),
    ])
    .unwrap_or_default();
    let mut state = TreeEditorState::new(tree);
    state.select_first();

    // 'A' opens a draft root, typed characters fill it, Enter commits.
    let mut keys = vec![key(KeyCode::Char('A'))];
    keys.extend("Archive".chars().map(|ch| key(KeyCode::Char(ch))));
    keys.push(key(KeyCode::Enter));
    // Move the new label up once, then indent it under "Projects".
    keys.push(shift(KeyCode::Up));
    keys.push(shift(KeyCode::Right));
    // Empty names are refused and leave the draft open; Esc discards it.
    keys.push(key(KeyCode::Char('a')));
    keys.push(key(KeyCode::Enter));
    keys.push(key(KeyCode::Esc));

    for event in keys {
        match state.handle_key(event) {
            TreeEvent::StructureChanged(change) => println!("{:?} -> {change:?}", event.code),
            TreeEvent::ValidationFailed(err) => println!("{:?} -> rejected: {err}", event.code),
            _ => {}
        }
    }

    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);
    TreeListView::new(TreeListViewStyle::default()).render(area, &mut buffer, &mut state);
    for node in state.tree().nodes() {
        println!("{} {}", node.id(), node.name());
    }
}
