use crate::domain::snapshot::SnapshotChain;
use crate::domain::summary::{summarize, ChainSummary};
use crate::domain::traversal::{CallStack, RenderOptions};
use crate::ports::{SnapshotSource, TraceSink};
use anyhow::{Context, Result};
use rayon::prelude::*;

/// Load one capture, render it and stream the lines into a sink.
pub struct RenderUsecase<'a> {
    pub source: &'a dyn SnapshotSource,
    pub options: RenderOptions,
}

impl<'a> RenderUsecase<'a> {
    /// The sink is finished even when the traversal fails, so lines produced
    /// before the failure reach the output before the error is returned.
    pub fn run(&self, sink: &mut dyn TraceSink) -> Result<()> {
        let name = self.source.describe();
        let chain = self.source.load()?;
        sink.begin(&name)?;
        let streamed = self.stream(&chain, sink);
        let finished = sink.finish();
        streamed.with_context(|| format!("Failed to render {}", name))?;
        finished
    }

    fn stream(&self, chain: &SnapshotChain, sink: &mut dyn TraceSink) -> Result<()> {
        for line in CallStack::new(chain).with_options(self.options).lines() {
            sink.line(&line?)?;
        }
        Ok(())
    }
}

/// Outcome of rendering one capture in a batch.
#[derive(Debug)]
pub struct RenderedCapture {
    pub source: String,
    /// Lines produced before the traversal ended, including on failure.
    pub lines: Vec<String>,
    pub error: Option<anyhow::Error>,
}

/// Render several independent captures in parallel, reporting in input order.
pub struct BatchRenderUsecase<'a> {
    pub sources: &'a [Box<dyn SnapshotSource + Send + Sync>],
    pub options: RenderOptions,
}

impl<'a> BatchRenderUsecase<'a> {
    pub fn render_all(&self, pool: &rayon::ThreadPool) -> Vec<RenderedCapture> {
        pool.install(|| {
            self.sources
                .par_iter()
                .map(|source| render_capture(source.as_ref(), self.options))
                .collect()
        })
    }

    /// Render everything and forward successful captures to `sink`.
    /// Returns the number of captures that failed.
    pub fn run(&self, pool: &rayon::ThreadPool, sink: &mut dyn TraceSink) -> Result<usize> {
        let mut failures = 0;
        for capture in self.render_all(pool) {
            sink.begin(&capture.source)?;
            for line in &capture.lines {
                sink.line(line)?;
            }
            sink.finish()?;
            if let Some(e) = capture.error {
                tracing::error!(source = %capture.source, "{:#}", e);
                failures += 1;
            }
        }
        Ok(failures)
    }
}

fn render_capture(source: &dyn SnapshotSource, options: RenderOptions) -> RenderedCapture {
    let name = source.describe();
    let chain = match source.load() {
        Ok(chain) => chain,
        Err(e) => {
            return RenderedCapture {
                source: name,
                lines: Vec::new(),
                error: Some(e),
            }
        }
    };

    let mut lines = Vec::new();
    let mut error = None;
    for line in CallStack::new(&chain).with_options(options).lines() {
        match line {
            Ok(line) => lines.push(line),
            Err(e) => {
                error = Some(anyhow::Error::new(e).context(format!("Failed to render {}", name)));
                break;
            }
        }
    }
    RenderedCapture {
        source: name,
        lines,
        error,
    }
}

/// Chain statistics for one capture without rendering it.
pub struct CheckUsecase<'a> {
    pub source: &'a dyn SnapshotSource,
    pub options: RenderOptions,
}

impl<'a> CheckUsecase<'a> {
    pub fn run(&self) -> Result<ChainSummary> {
        let chain = self.source.load()?;
        Ok(summarize(&chain, chain.head(), self.options))
    }
}

/// Outcome of checking one capture in a batch.
#[derive(Debug)]
pub struct CheckedCapture {
    pub source: String,
    pub summary: Result<ChainSummary>,
}

impl CheckedCapture {
    pub fn is_ok(&self) -> bool {
        matches!(&self.summary, Ok(summary) if summary.is_ok())
    }
}

/// Check every capture; a capture that fails to load does not stop the rest.
pub struct BatchCheckUsecase<'a> {
    pub sources: &'a [Box<dyn SnapshotSource + Send + Sync>],
    pub options: RenderOptions,
}

impl<'a> BatchCheckUsecase<'a> {
    pub fn run(&self) -> Vec<CheckedCapture> {
        self.sources
            .iter()
            .map(|source| {
                let summary = CheckUsecase {
                    source: source.as_ref(),
                    options: self.options,
                }
                .run();
                if let Err(e) = &summary {
                    tracing::warn!(capture = %source.describe(), "{:#}", e);
                }
                CheckedCapture {
                    source: source.describe(),
                    summary,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::CallFrame;
    use crate::domain::snapshot::StackSnapshot;
    use crate::infrastructure::config::OutputFormat;
    use crate::infrastructure::sinks::{MemorySink, WriterSink};

    fn cyclic_chain() -> SnapshotChain {
        let mut chain = SnapshotChain::new();
        let a = chain.push(StackSnapshot::new(vec![CallFrame::function("a")]));
        chain.link(a, a);
        chain
    }

    #[test]
    fn test_render_usecase_streams_lines() {
        let chain = SnapshotChain::linear(vec![StackSnapshot::new(vec![CallFrame::function("foo")])]);
        let mut sink = MemorySink::new();
        RenderUsecase {
            source: &chain,
            options: RenderOptions::default(),
        }
        .run(&mut sink)
        .unwrap();
        assert_eq!(sink.traces, vec![("<memory>".to_string(), vec!["CALL STACK:".to_string(), "0: [F] foo".to_string()])]);
    }

    #[test]
    fn test_render_usecase_reports_cycle_after_partial_output() {
        let chain = cyclic_chain();
        let mut sink = MemorySink::new();
        let err = RenderUsecase {
            source: &chain,
            options: RenderOptions::default(),
        }
        .run(&mut sink)
        .unwrap_err();
        assert!(format!("{:#}", err).contains("cyclic"));
        assert_eq!(sink.lines(), vec!["CALL STACK:", "0: [F] a"]);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let sources: Vec<Box<dyn SnapshotSource + Send + Sync>> = (0..8)
            .map(|i| {
                let chain = SnapshotChain::linear(vec![StackSnapshot::new(vec![CallFrame::function(
                    format!("f{}", i),
                )])]);
                Box::new(chain) as Box<dyn SnapshotSource + Send + Sync>
            })
            .chain(std::iter::once(Box::new(cyclic_chain()) as Box<dyn SnapshotSource + Send + Sync>))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let batch = BatchRenderUsecase {
            sources: &sources,
            options: RenderOptions::default(),
        };
        let mut sink = MemorySink::new();
        let failures = batch.run(&pool, &mut sink).unwrap();

        assert_eq!(failures, 1);
        assert_eq!(sink.traces.len(), 9);
        for i in 0..8 {
            assert_eq!(sink.traces[i].1[1], format!("0: [F] f{}", i));
        }
        assert_eq!(sink.traces[8].1, vec!["CALL STACK:", "0: [F] a"]);
    }

    #[test]
    fn test_check_usecase() {
        let chain = cyclic_chain();
        let summary = CheckUsecase {
            source: &chain,
            options: RenderOptions::default(),
        }
        .run()
        .unwrap();
        assert_eq!(summary.snapshots, 1);
        assert!(!summary.is_ok());
    }

    #[test]
    fn test_render_usecase_json_keeps_partial_lines_on_cycle() {
        let chain = cyclic_chain();
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Json);
        let err = RenderUsecase {
            source: &chain,
            options: RenderOptions::default(),
        }
        .run(&mut sink)
        .unwrap_err();
        assert!(format!("{:#}", err).contains("cyclic"));

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let record: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(record["lines"], serde_json::json!(["CALL STACK:", "0: [F] a"]));
    }

    struct MissingSource;

    impl SnapshotSource for MissingSource {
        fn describe(&self) -> String {
            "missing".to_string()
        }

        fn load(&self) -> Result<SnapshotChain> {
            anyhow::bail!("no such capture")
        }
    }

    #[test]
    fn test_batch_check_continues_after_load_failure() {
        let sources: Vec<Box<dyn SnapshotSource + Send + Sync>> = vec![
            Box::new(MissingSource),
            Box::new(cyclic_chain()),
            Box::new(SnapshotChain::linear(vec![StackSnapshot::new(vec![CallFrame::function("a")])])),
        ];
        let checked = BatchCheckUsecase {
            sources: &sources,
            options: RenderOptions::default(),
        }
        .run();

        assert_eq!(checked.len(), 3);
        assert_eq!(checked[0].source, "missing");
        assert!(checked[0].summary.is_err());
        assert!(!checked[1].is_ok());
        assert!(checked[2].is_ok());
        assert_eq!(checked[2].summary.as_ref().unwrap().frames, 1);
    }
}
