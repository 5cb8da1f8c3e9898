// Domain model and algorithms for Stackweave.

pub mod error;
pub mod frame;
pub mod render;
pub mod snapshot;
pub mod summary;
pub mod traversal;
