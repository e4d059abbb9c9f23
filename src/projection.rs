use rustc_hash::FxHashSet;

use crate::flatten::{FlattenedItem, array_move, remove_children_of};
use crate::model::NodeId;

/// Depth and parent a dragged node would land at if dropped now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Projection {
    pub depth: usize,
    pub parent_id: Option<NodeId>,
    /// One level below the item that would precede the drop.
    pub max_depth: usize,
    /// Depth of the item that would follow the drop.
    pub min_depth: usize,
}

/// Converts a horizontal pointer offset into a drop depth and parent.
///
/// `items` is the visible flat list, `offset` is positive when dragged right
/// (deeper), `indentation_width` is the width of one level in the same unit.
/// Returns `None` if either id is not in `items` or `over_id` lies inside the
/// dragged subtree.
pub fn get_projection(
    items: &[FlattenedItem],
    active_id: NodeId,
    over_id: NodeId,
    offset: f32,
    indentation_width: f32,
) -> Option<Projection> {
    // A node never lands below itself, even if the caller left its subtree in.
    let hidden: FxHashSet<NodeId> = std::iter::once(active_id).collect();
    let items = remove_children_of(items, &hidden);

    let over_index = items.iter().position(|item| item.id == over_id)?;
    let active_index = items.iter().position(|item| item.id == active_id)?;
    let active_depth = items[active_index].depth;

    let mut new_items: Vec<&FlattenedItem> = items.iter().collect();
    array_move(&mut new_items, active_index, over_index);

    let previous = over_index
        .checked_sub(1)
        .and_then(|idx| new_items.get(idx).copied());
    let next = new_items.get(over_index + 1).copied();

    let drag_depth = drag_depth(offset, indentation_width);
    let projected = isize::try_from(active_depth)
        .unwrap_or(isize::MAX)
        .saturating_add(drag_depth)
        .max(0)
        .unsigned_abs();
    let max_depth = previous.map_or(0, |item| item.depth + 1);
    let min_depth = next.map_or(0, |item| item.depth).min(max_depth);
    let mut depth = projected.clamp(min_depth, max_depth);

    let parent_id = if depth == 0 {
        None
    } else {
        let parent = previous.and_then(|previous| {
            resolve_parent(&new_items[..over_index], previous, depth)
        });
        if parent.is_none() {
            depth = 0;
        }
        parent
    };

    log::trace!(
        "projection active={active_id} over={over_id} offset={offset} depth={depth} parent={parent_id:?}"
    );
    Some(Projection {
        depth,
        parent_id,
        max_depth,
        min_depth,
    })
}

#[allow(clippy::cast_possible_truncation, reason = "pointer offsets are small")]
fn drag_depth(offset: f32, indentation_width: f32) -> isize {
    if indentation_width <= 0.0 || !offset.is_finite() {
        return 0;
    }
    (offset / indentation_width).round() as isize
}

/// Finds the parent for `depth` given the items that precede the drop slot.
fn resolve_parent(
    preceding: &[&FlattenedItem],
    previous: &FlattenedItem,
    depth: usize,
) -> Option<NodeId> {
    if depth == previous.depth {
        return previous.parent_id;
    }
    if depth > previous.depth {
        return Some(previous.id);
    }
    // Shallower than the previous item: reuse the parent of the nearest
    // preceding item already at the target depth.
    preceding
        .iter()
        .rev()
        .find(|item| item.depth == depth)
        .and_then(|item| item.parent_id)
}
