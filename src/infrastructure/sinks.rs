//! Trace Sinks
//!
//! Line consumers for rendered backtraces.

use crate::infrastructure::config::OutputFormat;
use crate::ports::TraceSink;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct RenderedTraceJson<'a> {
    source: &'a str,
    lines: &'a [String],
}

/// Writes lines to any `Write` (stdout in the CLI).
///
/// In `Text` format every line is written as soon as it arrives. In `Json`
/// format lines are buffered and each capture is written as one JSON object
/// on its own line when it finishes.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    source: String,
    buffered: Vec<String>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            source: String::new(),
            buffered: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for WriterSink<W> {
    fn begin(&mut self, source: &str) -> Result<()> {
        self.source = source.to_string();
        self.buffered.clear();
        Ok(())
    }

    fn line(&mut self, line: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "{}", line).context("Failed to write trace line")
            }
            OutputFormat::Json => {
                self.buffered.push(line.to_string());
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.format == OutputFormat::Json {
            let record = RenderedTraceJson {
                source: &self.source,
                lines: &self.buffered,
            };
            serde_json::to_writer(&mut self.writer, &record)?;
            writeln!(self.writer)?;
            self.buffered.clear();
        }
        self.writer.flush().context("Failed to flush trace output")
    }
}

/// Collects rendered traces in memory, one entry per capture.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub traces: Vec<(String, Vec<String>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines of every capture, in order.
    pub fn lines(&self) -> Vec<String> {
        self.traces.iter().flat_map(|(_, l)| l.iter().cloned()).collect()
    }
}

impl TraceSink for MemorySink {
    fn begin(&mut self, source: &str) -> Result<()> {
        self.traces.push((source.to_string(), Vec::new()));
        Ok(())
    }

    fn line(&mut self, line: &str) -> Result<()> {
        if self.traces.is_empty() {
            self.traces.push((String::new(), Vec::new()));
        }
        if let Some((_, lines)) = self.traces.last_mut() {
            lines.push(line.to_string());
        }
        Ok(())
    }
}
