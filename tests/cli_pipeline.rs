/// Capture files, config files and sinks wired together the way the CLI does.

use stackweave::application::{BatchRenderUsecase, CheckUsecase, RenderUsecase};
use stackweave::infrastructure::concurrency::build_thread_pool;
use stackweave::infrastructure::{CaptureFile, MemorySink, OutputFormat, StackweaveConfig, WriterSink};
use stackweave::ports::SnapshotSource;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

const NESTED: &str = r#"{
    "callFrames": [{"functionName": "inner", "url": "test.js", "lineNumber": 3}],
    "parentStackTrace": {
        "topCallFrameIsBoundary": true,
        "callFrames": [{"functionName": "scheduler"}, {"functionName": "outer"}]
    }
}"#;

const CYCLIC: &str = r#"{
    "head": 0,
    "stackTraces": [
        {"callFrames": [{"functionName": "a"}], "parent": 1},
        {"callFrames": [{"functionName": "b"}], "topCallFrameIsBoundary": true, "parent": 0}
    ]
}"#;

fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_render_nested_capture_as_text() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "nested.json", NESTED);

    let source = CaptureFile::new(&path);
    let mut sink = WriterSink::new(Vec::new(), OutputFormat::Text);
    RenderUsecase {
        source: &source,
        options: StackweaveConfig::default().render_options(),
    }
    .run(&mut sink)
    .unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        out,
        "CALL STACK:\n0: [F] inner\nASYNC CALL STACK:\n0: --- scheduler ---\n1: [F] outer\n"
    );
}

#[test]
fn test_batch_with_config_file() {
    let dir = tempdir().unwrap();
    let config_path = write(
        dir.path(),
        "stackweave.toml",
        "[render]\nmax_chain_length = 4\n[output]\nformat = \"json\"\n[batch]\njobs = 2\n",
    );
    let config = StackweaveConfig::load(&config_path).unwrap();
    assert_eq!(config.output.format, OutputFormat::Json);

    let inputs = vec![
        write(dir.path(), "one.json", NESTED),
        write(dir.path(), "cyclic.json", CYCLIC),
        dir.path().join("missing.json"),
    ];
    let sources: Vec<Box<dyn SnapshotSource + Send + Sync>> = inputs
        .iter()
        .map(|p| Box::new(CaptureFile::new(p)) as Box<dyn SnapshotSource + Send + Sync>)
        .collect();

    let pool = build_thread_pool(config.batch.jobs).unwrap();
    let batch = BatchRenderUsecase {
        sources: &sources,
        options: config.render_options(),
    };
    let mut sink = MemorySink::new();
    let failures = batch.run(&pool, &mut sink).unwrap();

    assert_eq!(failures, 2);
    assert_eq!(sink.traces.len(), 3);
    assert_eq!(sink.traces[0].1.len(), 5);
    assert_eq!(
        sink.traces[1].1,
        vec!["CALL STACK:", "0: [F] a", "ASYNC CALL STACK:", "0: --- b ---"]
    );
    assert!(sink.traces[2].1.is_empty());
}

#[test]
fn test_check_reports_cycle() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "cyclic.json", CYCLIC);
    let source = CaptureFile::new(&path);

    let summary = CheckUsecase {
        source: &source,
        options: StackweaveConfig::default().render_options(),
    }
    .run()
    .unwrap();

    assert_eq!(summary.snapshots, 2);
    assert_eq!(summary.boundaries, 1);
    assert!(summary.error.as_deref().unwrap_or("").contains("already visited"));
}

#[test]
fn test_missing_config_is_an_error() {
    let dir = tempdir().unwrap();
    let err = StackweaveConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.toml"));
}
