//! The `curator run` command: score, filter, annotate and package a dataset.

mod batch;
mod setup;

use clap::Args;
use curator_core::{BatchPipeline, Config, DatasetExporter, OutputFormat, ReportWriter};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::oneshot;

use super::provider::{connect, ProviderArgs};
use super::types::{Mode, ReportFormat};
use batch::{create_progress_bar, print_summary, render_progress};
use setup::{apply_overrides, build_queue, pipeline_config};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Image files or directories to curate
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// The concept the dataset is curated for (e.g. "vintage school bus")
    #[arg(short, long)]
    pub concept: String,

    /// Minimum score (0.0-1.0) for an image to be accepted
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Annotation style for accepted images
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Directory the dataset archive is written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a report of every result to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub report_format: ReportFormat,
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&args, &mut config)?;
    let run = pipeline_config(&args, &config)?;

    let queue = build_queue(&args, &config).await?;
    let connection = connect(&args.provider, &mut config).await?;

    let pipeline = BatchPipeline::new(connection.provider.clone());

    // Ctrl-C finishes the current image, then stops
    let stop = pipeline.stop_handle();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Stopping after the current image...");
            stop.stop();
        }
    });

    let pb = create_progress_bar(queue.len() as u64);
    let (render_done, done_rx) = oneshot::channel();
    let render = tokio::spawn(render_progress(pipeline.subscribe(), pb.clone(), done_rx));

    let start = Instant::now();
    let outcome = pipeline.start(queue.items(), &run, &connection.status).await;

    // Let the renderer drain the last snapshot before the bar is cleared
    let _ = render_done.send(());
    if let Err(e) = render.await {
        tracing::debug!("Progress renderer ended abnormally: {e}");
    }
    signal.abort();
    pb.finish_and_clear();
    let summary = outcome?;

    let results = pipeline.results();
    print_summary(&summary, start.elapsed());
    if summary.stopped {
        eprintln!("  Processing stopped by user.");
    }

    match DatasetExporter::export_to_dir(
        &results,
        &config.output_dir(),
        &config.export.archive_name,
    )? {
        Some(path) => eprintln!("  Dataset written to {}", path.display()),
        None => eprintln!("  No images were accepted; nothing to export."),
    }

    if let Some(path) = &args.report {
        let format = OutputFormat::from(args.report_format);
        let mut writer = ReportWriter::create(path, format)?;
        writer.write_report(&results, &summary)?;
        tracing::info!(
            "Wrote {} result(s) to {} ({})",
            writer.items_written(),
            path.display(),
            args.report_format
        );
    }

    Ok(())
}
