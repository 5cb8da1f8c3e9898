use crate::domain::frame::CallFrame;
use crate::domain::snapshot::{SnapshotChain, SnapshotId, StackSnapshot};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A capture file. Either one nested stack trace, or a flat table of
/// stack traces linked by index.
///
/// The shape is chosen by key: an object with `stackTraces` is flat,
/// anything else is nested. Unknown keys are rejected in both shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CaptureDto {
    Flat(FlatCaptureDto),
    Nested(NestedStackTraceDto),
}

const CAPTURE_FIELDS: &[&str] = &[
    "head",
    "stackTraces",
    "callFrames",
    "topCallFrameIsBoundary",
    "truncated",
    "parentStackTrace",
];

impl<'de> Deserialize<'de> for CaptureDto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CaptureVisitor)
    }
}

struct CaptureVisitor;

impl<'de> Visitor<'de> for CaptureVisitor {
    type Value = CaptureDto;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a stack trace object or a flat capture with `stackTraces`")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CaptureDto, A::Error> {
        let mut head = None;
        let mut stack_traces = None;
        let mut nested = NestedStackTraceDto::default();
        let mut nested_key = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "head" => head = Some(map.next_value::<usize>()?),
                "stackTraces" => stack_traces = Some(map.next_value::<Vec<FlatStackTraceDto>>()?),
                "callFrames" => nested.call_frames = map.next_value()?,
                "topCallFrameIsBoundary" => nested.top_call_frame_is_boundary = map.next_value()?,
                "truncated" => nested.truncated = map.next_value()?,
                "parentStackTrace" => nested.parent_stack_trace = map.next_value()?,
                other => return Err(de::Error::unknown_field(other, CAPTURE_FIELDS)),
            }
            if !matches!(key.as_str(), "head" | "stackTraces") {
                nested_key = Some(key);
            }
        }

        match (stack_traces, nested_key) {
            (Some(_), Some(key)) => Err(de::Error::custom(format!(
                "flat capture cannot contain stack trace field `{}`",
                key
            ))),
            (Some(stack_traces), None) => Ok(CaptureDto::Flat(FlatCaptureDto { head, stack_traces })),
            (None, _) if head.is_some() => Err(de::Error::missing_field("stackTraces")),
            (None, _) => Ok(CaptureDto::Nested(nested)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrameDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default)]
    pub is_native_code: bool,
    #[serde(default)]
    pub is_program_code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

/// Stack trace in inspector-protocol shape, parent embedded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NestedStackTraceDto {
    #[serde(default)]
    pub call_frames: Option<Vec<CallFrameDto>>,
    #[serde(default)]
    pub top_call_frame_is_boundary: bool,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_stack_trace: Option<Box<NestedStackTraceDto>>,
}

/// Flat capture: `head` and `parent` are indices into `stack_traces`.
/// Without `head` the first stack trace is the head.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlatCaptureDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<usize>,
    pub stack_traces: Vec<FlatStackTraceDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlatStackTraceDto {
    #[serde(default)]
    pub call_frames: Option<Vec<CallFrameDto>>,
    #[serde(default)]
    pub top_call_frame_is_boundary: bool,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl From<CallFrameDto> for CallFrame {
    fn from(dto: CallFrameDto) -> Self {
        CallFrame {
            function_name: dto.function_name,
            is_native_code: dto.is_native_code,
            is_program_code: dto.is_program_code,
            url: dto.url,
            line_number: dto.line_number,
            column_number: dto.column_number,
        }
    }
}

impl From<&CallFrame> for CallFrameDto {
    fn from(frame: &CallFrame) -> Self {
        CallFrameDto {
            function_name: frame.function_name.clone(),
            is_native_code: frame.is_native_code,
            is_program_code: frame.is_program_code,
            url: frame.url.clone(),
            line_number: frame.line_number,
            column_number: frame.column_number,
        }
    }
}

fn convert_frames(frames: Option<Vec<CallFrameDto>>) -> Option<Vec<CallFrame>> {
    frames.map(|frames| frames.into_iter().map(CallFrame::from).collect())
}

impl From<CaptureDto> for SnapshotChain {
    fn from(dto: CaptureDto) -> Self {
        match dto {
            CaptureDto::Flat(flat) => flat.into(),
            CaptureDto::Nested(nested) => nested.into(),
        }
    }
}

impl From<NestedStackTraceDto> for SnapshotChain {
    fn from(dto: NestedStackTraceDto) -> Self {
        // Unrolled in a loop; each level is moved out before the next, so
        // dropping a long chain does not recurse either.
        let mut snapshots = Vec::new();
        let mut next = Some(dto);
        while let Some(current) = next {
            snapshots.push(StackSnapshot {
                call_frames: convert_frames(current.call_frames),
                top_call_frame_is_boundary: current.top_call_frame_is_boundary,
                truncated: current.truncated,
                parent: None,
            });
            next = current.parent_stack_trace.map(|parent| *parent);
        }
        SnapshotChain::linear(snapshots)
    }
}

impl From<FlatCaptureDto> for SnapshotChain {
    fn from(dto: FlatCaptureDto) -> Self {
        // Links are kept as given; dangling or cyclic ones surface at render time.
        let mut chain = SnapshotChain::new();
        for trace in dto.stack_traces {
            chain.push(StackSnapshot {
                call_frames: convert_frames(trace.call_frames),
                top_call_frame_is_boundary: trace.top_call_frame_is_boundary,
                truncated: trace.truncated,
                parent: trace.parent.map(SnapshotId),
            });
        }
        // `push` already made the first stack trace the head
        if let Some(head) = dto.head {
            chain.set_head(SnapshotId(head));
        }
        chain
    }
}

impl From<&SnapshotChain> for FlatCaptureDto {
    fn from(chain: &SnapshotChain) -> Self {
        let stack_traces = chain
            .iter()
            .map(|(_, snapshot)| FlatStackTraceDto {
                call_frames: snapshot
                    .call_frames
                    .as_ref()
                    .map(|frames| frames.iter().map(CallFrameDto::from).collect()),
                top_call_frame_is_boundary: snapshot.top_call_frame_is_boundary,
                truncated: snapshot.truncated,
                parent: snapshot.parent.map(|id| id.0),
            })
            .collect();
        FlatCaptureDto {
            head: chain.head().map(|id| id.0),
            stack_traces,
        }
    }
}
