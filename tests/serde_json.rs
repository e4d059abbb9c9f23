#![cfg(feature = "serde")]

use serde_json::json;

use tui_sortable_tree::{ChangeKind, LabelTree, NodeId, NodeKind, TreeNode, diff};

#[test]
fn host_payload_loads_with_defaults() {
    let payload = json!([
        { "id": 1, "name": "Fruit", "children": [
            { "id": 2, "name": "Apple", "type": "modified" }
        ]},
        { "id": 3, "name": "Loose", "collapsed": true }
    ]);
    let tree: LabelTree = serde_json::from_value(payload).unwrap();
    assert_eq!(tree.node_count(), 3);
    assert_eq!(tree.find(NodeId(2)).unwrap().kind(), NodeKind::Modified);
    assert_eq!(tree.find(NodeId(1)).unwrap().kind(), NodeKind::Existing);
    assert!(tree.find(NodeId(3)).unwrap().collapsed());
}

#[test]
fn node_kind_serializes_as_type_field() {
    let tree = LabelTree::from_roots([TreeNode::new(7, "Seven")]).unwrap();
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value[0]["type"], "existing");
    assert_eq!(value[0]["status"], "persisted");
    assert_eq!(value[0]["id"], 7);
}

#[test]
fn change_set_serializes_as_flat_list() {
    let before = LabelTree::from_roots([TreeNode::new(1, "A"), TreeNode::new(2, "B")]).unwrap();
    let after = before.remove(NodeId(2));
    let set = diff(&before, &after);
    let value = serde_json::to_value(&set).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["change"], "removed");
    assert_eq!(set.get(NodeId(2)).unwrap().change, ChangeKind::Removed);
}
