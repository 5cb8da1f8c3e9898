// Command-line entry point for Stackweave.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use stackweave::application::{BatchCheckUsecase, BatchRenderUsecase, RenderUsecase};
use stackweave::infrastructure::concurrency::build_thread_pool;
use stackweave::infrastructure::{CaptureFile, ConfigOverrides, OutputFormat, StackweaveConfig, WriterSink};
use stackweave::ports::SnapshotSource;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render captures as backtraces on stdout
    Render(RenderArgs),
    /// Validate captures and print chain statistics
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Capture file (JSON); can be given multiple times
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Maximum number of linked snapshots to follow
    #[arg(long)]
    max_chain_length: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Worker threads when rendering several captures
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Capture file (JSON); can be given multiple times
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Maximum number of linked snapshots to follow
    #[arg(long)]
    max_chain_length: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some capture could not be rendered or checked.
fn run(cli: Cli) -> Result<bool> {
    let base = StackweaveConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => {
            let config = base.apply(&ConfigOverrides {
                max_chain_length: args.max_chain_length,
                format: args.format,
                jobs: args.jobs,
            })?;
            render(&args.input, &config)
        }
        Command::Check(args) => {
            let config = base.apply(&ConfigOverrides {
                max_chain_length: args.max_chain_length,
                format: args.format,
                jobs: None,
            })?;
            check(&args.input, &config)
        }
    }
}

fn render(inputs: &[PathBuf], config: &StackweaveConfig) -> Result<bool> {
    let stdout = std::io::stdout();
    let mut sink = WriterSink::new(stdout.lock(), config.output.format);
    let options = config.render_options();

    if let [input] = inputs {
        let source = CaptureFile::new(input);
        RenderUsecase {
            source: &source,
            options,
        }
        .run(&mut sink)?;
        return Ok(true);
    }

    let sources: Vec<Box<dyn SnapshotSource + Send + Sync>> = inputs
        .iter()
        .map(|path| Box::new(CaptureFile::new(path)) as Box<dyn SnapshotSource + Send + Sync>)
        .collect();
    let pool = build_thread_pool(config.batch.jobs)?;
    info!(captures = sources.len(), "rendering captures");

    let failures = BatchRenderUsecase {
        sources: &sources,
        options,
    }
    .run(&pool, &mut sink)?;

    if failures > 0 {
        warn!(failures, "some captures failed to render");
    }
    Ok(failures == 0)
}

fn check(inputs: &[PathBuf], config: &StackweaveConfig) -> Result<bool> {
    let sources: Vec<Box<dyn SnapshotSource + Send + Sync>> = inputs
        .iter()
        .map(|path| Box::new(CaptureFile::new(path)) as Box<dyn SnapshotSource + Send + Sync>)
        .collect();
    let checked = BatchCheckUsecase {
        sources: &sources,
        options: config.render_options(),
    }
    .run();

    let mut all_ok = true;
    for capture in &checked {
        all_ok &= capture.is_ok();
        let summary = match &capture.summary {
            Ok(summary) => summary,
            Err(_) => continue,
        };
        match config.output.format {
            OutputFormat::Text => println!(
                "{}: {} snapshots, {} frames, {} async boundaries, {} empty, {} truncated",
                capture.source,
                summary.snapshots,
                summary.frames,
                summary.boundaries,
                summary.empty,
                summary.truncated
            ),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "source": &capture.source, "summary": summary })
            ),
        }
        if let Some(error) = &summary.error {
            warn!(capture = %capture.source, "{}", error);
        }
    }
    Ok(all_ok)
}
