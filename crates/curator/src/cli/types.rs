//! CLI enum types shared by commands: provider, annotation mode, report format.

use clap::ValueEnum;
use curator_core::{AnnotationMode, OutputFormat, ProviderKind};

/// Supported inference backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Cloud API, fast model
    Flash,
    /// Cloud API, pro model
    Pro,
    /// Local OpenAI-compatible server (LM Studio and similar)
    Local,
}

impl From<Provider> for ProviderKind {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Flash => ProviderKind::CloudFlash,
            Provider::Pro => ProviderKind::CloudPro,
            Provider::Local => ProviderKind::LocalServer,
        }
    }
}

/// Annotation style for accepted images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One descriptive sentence
    Caption,
    /// Comma-separated keywords
    Tags,
}

impl From<Mode> for AnnotationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Caption => AnnotationMode::Caption,
            Mode::Tags => AnnotationMode::Tags,
        }
    }
}

/// Supported report formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON document with summary and results
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
