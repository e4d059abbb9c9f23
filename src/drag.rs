use std::time::{Duration, Instant};

use crate::flatten::FlattenedItem;
use crate::model::NodeId;
use crate::projection::{Projection, get_projection};

/// Single-slot, cancellable hover-to-expand timer.
///
/// At most one expansion is pending; arming always replaces the previous one.
/// The host drives it by polling [`Self::take_due`] with the current time.
#[derive(Clone, Debug)]
pub struct HoverExpandTimer {
    delay: Duration,
    pending: Option<PendingExpand>,
}

#[derive(Clone, Copy, Debug)]
struct PendingExpand {
    node: NodeId,
    deadline: Instant,
}

impl HoverExpandTimer {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `node` to expand `delay` after `now`, dropping any pending one.
    pub fn arm(&mut self, node: NodeId, now: Instant) {
        if let Some(previous) = self.pending.take() {
            log::trace!("hover timer for {} replaced", previous.node);
        }
        self.pending = Some(PendingExpand {
            node,
            deadline: now + self.delay,
        });
    }

    /// Cancels the pending expansion, returning the node it targeted.
    pub fn cancel_pending(&mut self) -> Option<NodeId> {
        self.pending.take().map(|pending| pending.node)
    }

    /// The node waiting to expand, if any.
    pub fn pending(&self) -> Option<NodeId> {
        self.pending.map(|pending| pending.node)
    }

    /// Fires the pending expansion if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<NodeId> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(pending.node)
            }
            _ => None,
        }
    }
}

/// Ephemeral state of one drag gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct DragGesture {
    pub active_id: NodeId,
    pub over_id: Option<NodeId>,
    /// Horizontal displacement since the gesture started.
    pub offset: f32,
    pub projection: Option<Projection>,
}

/// Owns the in-flight gesture and the hover timer.
///
/// Gestures are strictly sequential: `start`, any number of offset/over
/// updates, then `finish` or `cancel`. Either end discards everything.
#[derive(Clone, Debug)]
pub struct DragController {
    gesture: Option<DragGesture>,
    timer: HoverExpandTimer,
}

impl DragController {
    pub const fn new(hover_expand_delay: Duration) -> Self {
        Self {
            gesture: None,
            timer: HoverExpandTimer::new(hover_expand_delay),
        }
    }

    #[inline]
    pub const fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    #[inline]
    pub const fn gesture(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    pub fn active_id(&self) -> Option<NodeId> {
        self.gesture.as_ref().map(|gesture| gesture.active_id)
    }

    pub fn projection(&self) -> Option<Projection> {
        self.gesture.as_ref().and_then(|gesture| gesture.projection)
    }

    #[inline]
    pub const fn timer(&self) -> &HoverExpandTimer {
        &self.timer
    }

    /// Begins a gesture, discarding any previous one.
    pub fn start(&mut self, active_id: NodeId) {
        self.timer.cancel_pending();
        self.gesture = Some(DragGesture {
            active_id,
            over_id: Some(active_id),
            offset: 0.0,
            projection: None,
        });
    }

    /// Records the cumulative horizontal offset. Returns `false` when idle.
    pub fn set_offset(&mut self, offset: f32) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        gesture.offset = offset;
        true
    }

    /// Records the item under the pointer and arms or cancels the timer.
    ///
    /// `expandable` tells whether `over_id` is a collapsed node with children.
    pub fn set_over(&mut self, over_id: Option<NodeId>, expandable: bool, now: Instant) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        gesture.over_id = over_id;
        match over_id {
            Some(over) if expandable && over != gesture.active_id => {
                if self.timer.pending() != Some(over) {
                    self.timer.arm(over, now);
                }
            }
            _ => {
                self.timer.cancel_pending();
            }
        }
        true
    }

    /// Recomputes the projection against the visible list.
    pub fn reproject(&mut self, items: &[FlattenedItem], indentation_width: f32) {
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.projection = gesture.over_id.and_then(|over| {
                get_projection(
                    items,
                    gesture.active_id,
                    over,
                    gesture.offset,
                    indentation_width,
                )
            });
        }
    }

    /// Returns the node to expand if the timer fired while still hovered.
    pub fn take_due_expand(&mut self, now: Instant) -> Option<NodeId> {
        let node = self.timer.take_due(now)?;
        let still_over = self
            .gesture
            .as_ref()
            .is_some_and(|gesture| gesture.over_id == Some(node));
        still_over.then_some(node)
    }

    /// Ends the gesture and hands its final state to the caller.
    pub fn finish(&mut self) -> Option<DragGesture> {
        self.timer.cancel_pending();
        self.gesture.take()
    }

    /// Drops the gesture without committing anything.
    pub fn cancel(&mut self) {
        self.timer.cancel_pending();
        if let Some(gesture) = self.gesture.take() {
            log::trace!("drag of {} cancelled", gesture.active_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::model::{LabelTree, TreeNode};

    const DELAY: Duration = Duration::from_millis(600);

    #[test]
    fn timer_fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = HoverExpandTimer::new(DELAY);
        timer.arm(NodeId(1), start);
        assert_eq!(timer.take_due(start + Duration::from_millis(599)), None);
        assert_eq!(timer.take_due(start + DELAY), Some(NodeId(1)));
        assert_eq!(timer.take_due(start + DELAY * 2), None);
    }

    #[test]
    fn arming_replaces_pending_timer() {
        let start = Instant::now();
        let mut timer = HoverExpandTimer::new(DELAY);
        timer.arm(NodeId(1), start);
        timer.arm(NodeId(2), start + Duration::from_millis(300));
        assert_eq!(timer.pending(), Some(NodeId(2)));
        assert_eq!(timer.take_due(start + DELAY), None);
        assert_eq!(timer.take_due(start + Duration::from_millis(900)), Some(NodeId(2)));
    }

    #[test]
    fn moving_away_cancels_expansion() {
        let start = Instant::now();
        let mut drag = DragController::new(DELAY);
        drag.start(NodeId(3));
        drag.set_over(Some(NodeId(1)), true, start);
        assert_eq!(drag.timer().pending(), Some(NodeId(1)));
        drag.set_over(Some(NodeId(2)), false, start + Duration::from_millis(100));
        assert_eq!(drag.timer().pending(), None);
        assert_eq!(drag.take_due_expand(start + DELAY * 2), None);
    }

    #[test]
    fn hovering_keeps_original_deadline() {
        let start = Instant::now();
        let mut drag = DragController::new(DELAY);
        drag.start(NodeId(3));
        drag.set_over(Some(NodeId(1)), true, start);
        drag.set_over(Some(NodeId(1)), true, start + Duration::from_millis(500));
        assert_eq!(drag.take_due_expand(start + DELAY), Some(NodeId(1)));
    }

    #[test]
    fn updates_are_ignored_when_idle() {
        let mut drag = DragController::new(DELAY);
        assert!(!drag.set_offset(10.0));
        assert!(!drag.set_over(Some(NodeId(1)), true, Instant::now()));
        assert!(drag.finish().is_none());
    }

    #[test]
    fn cancel_discards_projection() {
        let items = flatten(
            &LabelTree::from_roots([
                TreeNode::new(1, "A").with_children([TreeNode::new(2, "B")]),
                TreeNode::new(3, "C"),
            ])
            .unwrap(),
        );
        let mut drag = DragController::new(DELAY);
        drag.start(NodeId(3));
        drag.set_offset(24.0);
        drag.set_over(Some(NodeId(2)), false, Instant::now());
        drag.reproject(&items, 24.0);
        assert_eq!(drag.projection().unwrap().parent_id, Some(NodeId(1)));
        drag.cancel();
        assert!(!drag.is_dragging());
        assert!(drag.projection().is_none());
    }
}
