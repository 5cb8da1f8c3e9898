//! Call Stack Traversal
//!
//! Walks a snapshot chain from its head along parent links and renders
//! one logical backtrace. Frame indices restart at every async boundary,
//! so each async leg is numbered from 0 regardless of how many snapshots
//! it was captured in.

use crate::domain::error::{TraceError, TraceResult};
use crate::domain::frame::FrameKind;
use crate::domain::render::{
    render_boundary, render_frame, ASYNC_CALL_STACK_HEADER, CALL_STACK_HEADER, EMPTY_CALL_STACK,
    TRUNCATED_MARKER,
};
use crate::domain::snapshot::{SnapshotChain, SnapshotId, StackSnapshot};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Default upper bound on the number of snapshots visited in one traversal.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 1024;

/// Traversal limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum number of snapshots visited before giving up.
    pub max_chain_length: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

// ============================================================================
// ChainWalk - guarded head-to-tail walk over parent links
// ============================================================================

/// Iterator over the snapshots reachable from a head, in parent order.
///
/// Yields an error and stops when a snapshot repeats, the walk exceeds
/// `limit` snapshots, or a link points outside the chain.
pub struct ChainWalk<'a> {
    chain: &'a SnapshotChain,
    cursor: Option<SnapshotId>,
    visited: HashSet<SnapshotId>,
    limit: usize,
    failed: bool,
}

impl<'a> ChainWalk<'a> {
    pub fn new(chain: &'a SnapshotChain, head: Option<SnapshotId>, limit: usize) -> Self {
        Self {
            chain,
            cursor: head,
            visited: HashSet::new(),
            limit,
            failed: false,
        }
    }

    fn step(&mut self, id: SnapshotId) -> TraceResult<&'a StackSnapshot> {
        if !self.visited.insert(id) {
            warn!(snapshot = %id, "cycle in snapshot chain");
            return Err(TraceError::CyclicChain { snapshot: id });
        }
        if self.visited.len() > self.limit {
            warn!(limit = self.limit, "snapshot chain exceeds maximum length");
            return Err(TraceError::ChainTooLong { limit: self.limit });
        }
        let snapshot = self
            .chain
            .get(id)
            .ok_or(TraceError::UnknownSnapshot { snapshot: id })?;
        self.cursor = snapshot.parent;
        Ok(snapshot)
    }
}

impl<'a> Iterator for ChainWalk<'a> {
    type Item = TraceResult<(SnapshotId, &'a StackSnapshot)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let id = self.cursor.take()?;
        match self.step(id) {
            Ok(snapshot) => Some(Ok((id, snapshot))),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

// ============================================================================
// Line rendering
// ============================================================================

/// Counters carried from one snapshot to the next within a single traversal.
#[derive(Debug, Default)]
struct TraversalState {
    frame_index: usize,
    seen_async_boundary: bool,
}

impl TraversalState {
    fn render_snapshot(&mut self, snapshot: &StackSnapshot, out: &mut VecDeque<String>) {
        let Some(frames) = snapshot.call_frames.as_deref() else {
            out.push_back(EMPTY_CALL_STACK.to_string());
            return;
        };

        let mut start = 0;
        if snapshot.top_call_frame_is_boundary {
            if !self.seen_async_boundary {
                self.seen_async_boundary = true;
                out.push_back(ASYNC_CALL_STACK_HEADER.to_string());
            }
            self.frame_index = 0;
            out.push_back(render_boundary(frames.first(), self.frame_index));
            self.frame_index += 1;
            start = 1;
        }

        for frame in frames.iter().skip(start) {
            out.push_back(render_frame(frame, self.frame_index, false));
            self.frame_index += 1;
            if frame.kind() == FrameKind::Program {
                break;
            }
        }

        if snapshot.truncated {
            out.push_back(TRUNCATED_MARKER.to_string());
        }
    }
}

/// A renderable view of a snapshot chain starting at one head.
///
/// Borrowing the chain keeps the view cheap; `lines()` can be called any
/// number of times and always starts a fresh traversal.
#[derive(Debug, Clone, Copy)]
pub struct CallStack<'a> {
    chain: &'a SnapshotChain,
    head: Option<SnapshotId>,
    options: RenderOptions,
}

impl<'a> CallStack<'a> {
    /// View starting at the chain's own head.
    pub fn new(chain: &'a SnapshotChain) -> Self {
        Self::from_snapshot(chain, chain.head())
    }

    /// View starting at an arbitrary snapshot. `None` renders only the header.
    pub fn from_snapshot(chain: &'a SnapshotChain, head: Option<SnapshotId>) -> Self {
        Self {
            chain,
            head,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn lines(&self) -> Lines<'a> {
        Lines {
            walk: ChainWalk::new(self.chain, self.head, self.options.max_chain_length),
            state: TraversalState::default(),
            pending: VecDeque::new(),
            header_emitted: false,
            done: false,
        }
    }

    /// Collect every line, or the error that stopped the traversal.
    pub fn render(&self) -> TraceResult<Vec<String>> {
        self.lines().collect()
    }
}

impl<'a> IntoIterator for &CallStack<'a> {
    type Item = TraceResult<String>;
    type IntoIter = Lines<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines()
    }
}

/// Lazily produced backtrace lines.
///
/// Each snapshot is rendered only when its first line is requested. After
/// an error nothing further is yielded.
pub struct Lines<'a> {
    walk: ChainWalk<'a>,
    state: TraversalState,
    pending: VecDeque<String>,
    header_emitted: bool,
    done: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = TraceResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.done {
                return None;
            }
            if !self.header_emitted {
                self.header_emitted = true;
                return Some(Ok(CALL_STACK_HEADER.to_string()));
            }
            match self.walk.next() {
                Some(Ok((id, snapshot))) => {
                    debug!(
                        snapshot = %id,
                        frames = snapshot.frame_count(),
                        boundary = snapshot.top_call_frame_is_boundary,
                        "rendering snapshot"
                    );
                    self.state.render_snapshot(snapshot, &mut self.pending);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => self.done = true,
            }
        }
    }
}

/// Render the chain from its head with default options.
pub fn render(chain: &SnapshotChain) -> TraceResult<Vec<String>> {
    CallStack::new(chain).render()
}
