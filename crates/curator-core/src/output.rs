//! Run reports in JSON or JSON Lines format.
//!
//! A report lists every finalized [`ItemResult`] of a run (never image
//! bytes). JSON reports wrap the results together with the run summary;
//! JSONL reports carry one result per line.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::pipeline::{ResultSet, RunSummary};
use crate::types::ItemResult;

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON document with summary and results
    #[default]
    Json,
    /// One result object per line (newline-delimited JSON)
    JsonLines,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a RunSummary,
    results: &'a [ItemResult],
}

/// Serializes run results to a writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (or truncate) a report file.
    pub fn create(path: &Path, format: OutputFormat) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format, true))
    }
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects the JSON format; JSONL is always one line per item.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single result.
    pub fn write_result(&mut self, result: &ItemResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, result).map_err(io::Error::other)?
            }
            _ => serde_json::to_writer(&mut self.writer, result).map_err(io::Error::other)?,
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a full run report.
    pub fn write_report(&mut self, results: &ResultSet, summary: &RunSummary) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let report = Report {
                    summary,
                    results: results.as_slice(),
                };
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, &report)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, &report).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += results.len();
            }
            OutputFormat::JsonLines => {
                for result in results {
                    self.write_result(result)?;
                }
            }
        }
        self.writer.flush()
    }

    /// Number of results written so far.
    pub fn items_written(&self) -> usize {
        self.items_written
    }
}
