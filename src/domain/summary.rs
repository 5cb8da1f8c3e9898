//! Chain Summary
//!
//! Statistics over the snapshots reachable from a head, gathered with the
//! same guarded walk the renderer uses.

use crate::domain::snapshot::{SnapshotChain, SnapshotId};
use crate::domain::traversal::{ChainWalk, RenderOptions};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    /// Snapshots visited before the walk ended
    pub snapshots: usize,
    /// Frames across all visited snapshots
    pub frames: usize,
    /// Snapshots whose top frame is an async boundary
    pub boundaries: usize,
    /// Snapshots with no frame list
    pub empty: usize,
    pub truncated: usize,
    /// Why the walk stopped early, if it did
    pub error: Option<String>,
}

impl ChainSummary {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn summarize(
    chain: &SnapshotChain,
    head: Option<SnapshotId>,
    options: RenderOptions,
) -> ChainSummary {
    let mut summary = ChainSummary::default();
    for step in ChainWalk::new(chain, head, options.max_chain_length) {
        match step {
            Ok((_, snapshot)) => {
                summary.snapshots += 1;
                summary.frames += snapshot.frame_count();
                if snapshot.call_frames.is_none() {
                    summary.empty += 1;
                }
                if snapshot.top_call_frame_is_boundary {
                    summary.boundaries += 1;
                }
                if snapshot.truncated {
                    summary.truncated += 1;
                }
            }
            Err(e) => summary.error = Some(e.to_string()),
        }
    }
    summary
}
