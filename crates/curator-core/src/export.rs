//! Dataset archive export.
//!
//! Accepted images are packaged with one sidecar text file each, named after
//! the image stem, which holds the annotation. Entries are stored with a
//! fixed timestamp so exporting the same results twice yields identical
//! bytes.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::types::ItemResult;

/// Default archive file name.
pub const ARCHIVE_NAME: &str = "lora_dataset.zip";

/// Builds dataset archives from run results.
pub struct DatasetExporter;

impl DatasetExporter {
    /// Build the archive in memory. Returns `None` when nothing was accepted.
    ///
    /// When two entries share a name, the later one replaces the earlier in
    /// place, so the archive holds one entry per name.
    pub fn build_archive<'a, I>(results: I) -> Result<Option<Vec<u8>>, ExportError>
    where
        I: IntoIterator<Item = &'a ItemResult>,
    {
        let mut entries: Vec<(String, &[u8])> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut add = |name: String, data: &'a [u8]| match positions.get(&name) {
            Some(&index) => {
                tracing::warn!("Duplicate archive entry {name}, keeping the later one");
                entries[index].1 = data;
            }
            None => {
                positions.insert(name.clone(), entries.len());
                entries.push((name, data));
            }
        };

        for result in results.into_iter().filter(|r| r.is_accepted()) {
            let image = result.image();
            add(image.file_name.clone(), image.bytes());
            add(
                format!("{}.txt", image.stem()),
                result.annotation().unwrap_or_default().as_bytes(),
            );
        }

        if entries.is_empty() {
            return Ok(None);
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &entries {
            zip.start_file(name.as_str(), entry_options())?;
            zip.write_all(data)?;
        }
        let bytes = zip.finish()?.into_inner();

        tracing::debug!(
            "Built archive with {} entries ({} bytes)",
            entries.len(),
            bytes.len()
        );
        Ok(Some(bytes))
    }

    /// Write the archive into `dir` under `archive_name`.
    ///
    /// Returns the archive path, or `None` (writing nothing) when nothing
    /// was accepted.
    pub fn export_to_dir<'a, I>(
        results: I,
        dir: &Path,
        archive_name: &str,
    ) -> Result<Option<PathBuf>, ExportError>
    where
        I: IntoIterator<Item = &'a ItemResult>,
    {
        let Some(bytes) = Self::build_archive(results)? else {
            tracing::info!("No accepted images to export");
            return Ok(None);
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(archive_name);
        std::fs::write(&path, bytes)?;
        tracing::info!("Wrote dataset archive to {:?}", path);
        Ok(Some(path))
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default())
}
