// Main library entry point for Stackweave.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::error::{TraceError, TraceResult};
pub use domain::frame::{classify, CallFrame, FrameKind};
pub use domain::render::render_frame;
pub use domain::snapshot::{SnapshotChain, SnapshotId, StackSnapshot};
pub use domain::traversal::{render, CallStack, RenderOptions};
