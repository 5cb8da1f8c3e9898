// Stack snapshot structures for Stackweave.
// A chain owns every snapshot of one capture; links between them are ids.

use crate::domain::frame::CallFrame;
use std::fmt;

/// Index of a snapshot inside its `SnapshotChain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(pub usize);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One captured synchronous stack plus the link to the async context that scheduled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSnapshot {
    /// `None` when the capture produced no frame list at all.
    pub call_frames: Option<Vec<CallFrame>>,
    /// First frame marks where an async operation was scheduled.
    pub top_call_frame_is_boundary: bool,
    /// The capture dropped deeper frames.
    pub truncated: bool,
    pub parent: Option<SnapshotId>,
}

impl StackSnapshot {
    pub fn new(call_frames: Vec<CallFrame>) -> Self {
        Self {
            call_frames: Some(call_frames),
            ..Self::default()
        }
    }

    /// A snapshot whose frame list is missing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn boundary(mut self) -> Self {
        self.top_call_frame_is_boundary = true;
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn with_parent(mut self, parent: SnapshotId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.call_frames.as_ref().map_or(0, Vec::len)
    }
}

/// Arena holding all snapshots of one capture.
#[derive(Debug, Clone, Default)]
pub struct SnapshotChain {
    snapshots: Vec<StackSnapshot>,
    head: Option<SnapshotId>,
}

impl SnapshotChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a linear chain: `snapshots[0]` is the head, each one's parent is the next.
    /// Existing `parent` fields are overwritten.
    pub fn linear(snapshots: Vec<StackSnapshot>) -> Self {
        let count = snapshots.len();
        let snapshots = snapshots
            .into_iter()
            .enumerate()
            .map(|(i, mut s)| {
                s.parent = if i + 1 < count { Some(SnapshotId(i + 1)) } else { None };
                s
            })
            .collect();
        Self {
            snapshots,
            head: if count > 0 { Some(SnapshotId(0)) } else { None },
        }
    }

    /// Append a snapshot and return its id. The first pushed snapshot becomes the head.
    pub fn push(&mut self, snapshot: StackSnapshot) -> SnapshotId {
        let id = SnapshotId(self.snapshots.len());
        self.snapshots.push(snapshot);
        if self.head.is_none() {
            self.head = Some(id);
        }
        id
    }

    /// Point `child`'s parent link at `parent`. Returns false if `child` is unknown.
    pub fn link(&mut self, child: SnapshotId, parent: SnapshotId) -> bool {
        match self.snapshots.get_mut(child.0) {
            Some(snapshot) => {
                snapshot.parent = Some(parent);
                true
            }
            None => false,
        }
    }

    pub fn set_head(&mut self, head: SnapshotId) {
        self.head = Some(head);
    }

    pub fn head(&self) -> Option<SnapshotId> {
        self.head
    }

    pub fn get(&self, id: SnapshotId) -> Option<&StackSnapshot> {
        self.snapshots.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SnapshotId, &StackSnapshot)> {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(i, s)| (SnapshotId(i), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_links_in_order() {
        let chain = SnapshotChain::linear(vec![
            StackSnapshot::new(vec![CallFrame::function("a")]),
            StackSnapshot::new(vec![CallFrame::function("b")]),
            StackSnapshot::empty(),
        ]);
        assert_eq!(chain.head(), Some(SnapshotId(0)));
        assert_eq!(chain.get(SnapshotId(0)).unwrap().parent, Some(SnapshotId(1)));
        assert_eq!(chain.get(SnapshotId(1)).unwrap().parent, Some(SnapshotId(2)));
        assert_eq!(chain.get(SnapshotId(2)).unwrap().parent, None);
    }

    #[test]
    fn test_push_sets_head_once() {
        let mut chain = SnapshotChain::new();
        assert!(chain.is_empty());
        let first = chain.push(StackSnapshot::empty());
        let second = chain.push(StackSnapshot::empty());
        assert_eq!(chain.head(), Some(first));
        assert!(chain.link(first, second));
        assert!(!chain.link(SnapshotId(9), second));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(StackSnapshot::empty().frame_count(), 0);
        let s = StackSnapshot::new(vec![CallFrame::anonymous(), CallFrame::anonymous()]);
        assert_eq!(s.frame_count(), 2);
    }
}
