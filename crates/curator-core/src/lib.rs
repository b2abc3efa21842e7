//! Curator Core - LoRA dataset curation library.
//!
//! Scores images against a visual concept with a vision-language model,
//! keeps those that reach a threshold, annotates the keepers with captions
//! or tags that leave the concept out, and packages the result as a
//! training archive.
//!
//! # Architecture
//!
//! ```text
//! Files → ImageQueue → BatchPipeline (score → decide → annotate) → ResultSet → Archive
//!                            ↑
//!                  InferenceProvider (Gemini | local server)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use curator_core::{
//!     AnnotationMode, BatchPipeline, Config, ConnectionMonitor, DatasetExporter, ImageQueue,
//!     PipelineConfig, ProviderFactory, ProviderKind,
//! };
//!
//! #[tokio::main]
//! async fn main() -> curator_core::Result<()> {
//!     let config = Config::load()?;
//!     let provider = ProviderFactory::create(ProviderKind::LocalServer, &config, "");
//!
//!     let monitor = ConnectionMonitor::new(std::time::Duration::ZERO);
//!     let connection = monitor.validate_now(provider.clone()).await;
//!
//!     let mut queue = ImageQueue::new(&config);
//!     queue.add_path("./photos".as_ref()).await?;
//!
//!     let pipeline = BatchPipeline::new(provider);
//!     let run = PipelineConfig::new("vintage school bus", AnnotationMode::Tags, 0.8);
//!     pipeline.start(queue.items(), &run, &connection).await?;
//!
//!     DatasetExporter::export_to_dir(&pipeline.results(), ".".as_ref(), "lora_dataset.zip")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod types;
pub mod validation;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, CuratorError, ExportError, PipelineError, ProviderError, Result};
pub use export::{DatasetExporter, ARCHIVE_NAME};
pub use llm::{ConnectionCheck, InferenceProvider, ProviderFactory};
pub use output::{OutputFormat, ReportWriter};
pub use pipeline::{
    AddReport, BatchPipeline, ImageQueue, ResultSet, RunSnapshot, RunState, RunSummary, StopHandle,
};
pub use policy::{decide, Decision};
pub use types::{
    AnnotationMode, ImageItem, ItemResult, ItemStatus, PipelineConfig, ProviderKind, ScoreOutcome,
};
pub use validation::{ConnectionMonitor, ConnectionStatus, CredentialSource, KeyState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
