//! Call Frame Module
//!
//! A single entry of a captured stack and its classification.

use std::fmt;

/// One entry of a captured stack snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFrame {
    /// Function name as reported by the capture; `None` or empty means anonymous.
    pub function_name: Option<String>,
    /// Frame belongs to native (host) code.
    pub is_native_code: bool,
    /// Frame is the program/harness entry point.
    pub is_program_code: bool,
    /// Source URL, when the capture knows it.
    pub url: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

impl CallFrame {
    /// A plain function frame.
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A native code frame.
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
            is_native_code: true,
            ..Self::default()
        }
    }

    /// A program (entry point) frame.
    pub fn program(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
            is_program_code: true,
            ..Self::default()
        }
    }

    /// A frame with no function name.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Function name if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.function_name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn kind(&self) -> FrameKind {
        classify(self)
    }
}

/// Classification of frame types for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Native/host routine
    Native,
    /// Harness entry point; nothing below it is shown
    Program,
    /// Regular function
    Function,
}

impl FrameKind {
    /// Single-letter code used in rendered lines.
    pub fn letter(&self) -> char {
        match self {
            FrameKind::Native => 'N',
            FrameKind::Program => 'P',
            FrameKind::Function => 'F',
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Classify a frame. Native wins over program, program over function.
pub fn classify(frame: &CallFrame) -> FrameKind {
    if frame.is_native_code {
        FrameKind::Native
    } else if frame.is_program_code {
        FrameKind::Program
    } else {
        FrameKind::Function
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_function() {
        assert_eq!(classify(&CallFrame::function("foo")), FrameKind::Function);
        assert_eq!(classify(&CallFrame::anonymous()), FrameKind::Function);
    }

    #[test]
    fn test_classify_priority() {
        let both = CallFrame {
            function_name: Some("both".to_string()),
            is_native_code: true,
            is_program_code: true,
            ..CallFrame::default()
        };
        assert_eq!(classify(&both), FrameKind::Native);
        assert_eq!(classify(&CallFrame::program("main")), FrameKind::Program);
        assert_eq!(classify(&CallFrame::native("push")), FrameKind::Native);
    }

    #[test]
    fn test_letters() {
        assert_eq!(FrameKind::Native.letter(), 'N');
        assert_eq!(FrameKind::Program.letter(), 'P');
        assert_eq!(FrameKind::Function.to_string(), "F");
    }

    #[test]
    fn test_empty_name_is_anonymous() {
        let frame = CallFrame::function("");
        assert_eq!(frame.name(), None);
        assert_eq!(CallFrame::function("x").name(), Some("x"));
    }
}
