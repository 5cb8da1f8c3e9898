// Infrastructure implementations for Stackweave.

pub mod capture_loader;
pub mod concurrency;
pub mod config;
pub mod sinks;

pub use capture_loader::{parse_capture, CaptureFile};
pub use config::{ConfigOverrides, OutputFormat, StackweaveConfig};
pub use sinks::{MemorySink, WriterSink};
