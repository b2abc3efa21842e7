//! Run setup: config overrides and image queue construction.

use curator_core::{Config, ImageQueue, PipelineConfig};

use super::RunArgs;

/// Apply command-line overrides to the loaded config and validate the result.
pub fn apply_overrides(args: &RunArgs, config: &mut Config) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        config.curation.threshold = threshold;
    }
    if let Some(mode) = args.mode {
        config.curation.mode = mode.into();
    }
    if let Some(output) = &args.output {
        config.export.output_dir = output.to_string_lossy().into_owned();
    }
    config.validate()?;
    Ok(())
}

/// Per-run settings from the concept and the effective config.
pub fn pipeline_config(args: &RunArgs, config: &Config) -> anyhow::Result<PipelineConfig> {
    let run = PipelineConfig::new(
        args.concept.trim(),
        config.curation.mode,
        config.curation.threshold,
    );
    run.validate()?;
    Ok(run)
}

/// Queue every input path, warning about files that were skipped.
pub async fn build_queue(args: &RunArgs, config: &Config) -> anyhow::Result<ImageQueue> {
    let mut queue = ImageQueue::new(config);

    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!(
                "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
                input
            );
        }
        let report = queue.add_path(input).await?;
        for (path, reason) in &report.skipped {
            tracing::warn!("Skipped {:?}: {reason}", path);
        }
        if report.duplicates > 0 {
            tracing::info!("Ignored {} duplicate image(s) in {:?}", report.duplicates, input);
        }
    }

    if queue.is_empty() {
        anyhow::bail!(
            "No supported images found (formats: {}).",
            config.curation.supported_formats.join(", ")
        );
    }
    tracing::info!("Queued {} image(s)", queue.len());
    Ok(queue)
}
