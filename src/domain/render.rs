//! Frame Renderer
//!
//! Turns a single call frame into one backtrace line.

use crate::domain::frame::{classify, CallFrame};

pub const CALL_STACK_HEADER: &str = "CALL STACK:";
pub const ASYNC_CALL_STACK_HEADER: &str = "ASYNC CALL STACK:";
pub const EMPTY_CALL_STACK: &str = "EMPTY CALL STACK:";
pub const TRUNCATED_MARKER: &str = "(remaining call frames truncated)";

/// Label for frames without a usable function name.
pub const ANONYMOUS_LABEL: &str = "(anonymous function)";
/// Label for a boundary snapshot that carries no frame at all.
pub const ASYNC_FALLBACK_LABEL: &str = "(async)";

/// Display label of a frame.
pub fn frame_label(frame: &CallFrame) -> &str {
    frame.name().unwrap_or(ANONYMOUS_LABEL)
}

/// Render a frame as `"<index>: --- <label> ---"` (boundary) or `"<index>: [<kind>] <label>"`.
pub fn render_frame(frame: &CallFrame, index: usize, is_boundary: bool) -> String {
    let label = frame_label(frame);
    if is_boundary {
        format!("{}: --- {} ---", index, label)
    } else {
        format!("{}: [{}] {}", index, classify(frame).letter(), label)
    }
}

/// Render the scheduling point of a boundary snapshot. An absent frame uses `"(async)"`.
pub fn render_boundary(frame: Option<&CallFrame>, index: usize) -> String {
    match frame {
        Some(frame) => render_frame(frame, index, true),
        None => format!("{}: --- {} ---", index, ASYNC_FALLBACK_LABEL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_normal_frames() {
        assert_eq!(render_frame(&CallFrame::function("foo"), 0, false), "0: [F] foo");
        assert_eq!(render_frame(&CallFrame::native("push"), 3, false), "3: [N] push");
        assert_eq!(render_frame(&CallFrame::program("main"), 12, false), "12: [P] main");
    }

    #[test]
    fn test_render_boundary_has_no_letter() {
        assert_eq!(render_frame(&CallFrame::native("setTimeout"), 0, true), "0: --- setTimeout ---");
    }

    #[test]
    fn test_anonymous_label() {
        assert_eq!(render_frame(&CallFrame::anonymous(), 1, false), "1: [F] (anonymous function)");
        assert_eq!(render_frame(&CallFrame::function(""), 2, true), "2: --- (anonymous function) ---");
    }

    #[test]
    fn test_boundary_fallback() {
        assert_eq!(render_boundary(None, 0), "0: --- (async) ---");
        let present = CallFrame::anonymous();
        assert_eq!(render_boundary(Some(&present), 0), "0: --- (anonymous function) ---");
    }
}
