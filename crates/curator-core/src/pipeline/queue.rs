//! The ordered list of images waiting to be curated.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::config::Config;
use crate::error::PipelineError;
use crate::types::ImageItem;

use super::discovery::FileDiscovery;
use super::validate::Validator;

/// What happened when a path was added to the queue.
#[derive(Debug, Default)]
pub struct AddReport {
    /// Images appended to the queue
    pub added: usize,
    /// Images already queued under the same id
    pub duplicates: usize,
    /// Files that were found but could not be queued
    pub skipped: Vec<(PathBuf, PipelineError)>,
}

/// Ordered image queue built from files and directories.
pub struct ImageQueue {
    items: Vec<ImageItem>,
    discovery: FileDiscovery,
    validator: Validator,
}

impl ImageQueue {
    pub fn new(config: &Config) -> Self {
        Self {
            items: Vec::new(),
            discovery: FileDiscovery::new(&config.curation),
            validator: Validator::new(config.limits.clone()),
        }
    }

    /// Add a file, or every supported image under a directory.
    ///
    /// Individual files that fail validation are reported in
    /// [`AddReport::skipped`]; only a missing path is an error.
    pub async fn add_path(&mut self, path: &Path) -> Result<AddReport, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let mut report = AddReport::default();
        for file in self.discovery.discover(path) {
            if let Err(e) = self.validator.check_size(&file.path, file.size) {
                tracing::warn!("Skipping {:?}: {e}", file.path);
                report.skipped.push((file.path, e));
                continue;
            }
            match self.load(&file.path).await {
                Ok(item) => {
                    if self.push(item) {
                        report.added += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {e}", file.path);
                    report.skipped.push((file.path, e));
                }
            }
        }

        tracing::debug!(
            "Queued {} image(s) from {:?} ({} duplicate, {} skipped)",
            report.added,
            path,
            report.duplicates,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Read a file and build its queue item.
    async fn load(&self, path: &Path) -> Result<ImageItem, PipelineError> {
        let read_err = |e: std::io::Error| PipelineError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
        let bytes = tokio::fs::read(path).await.map_err(read_err)?;
        let media_type = self.validator.media_type(path, &bytes)?;
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);

        Ok(ImageItem::new(path, media_type, modified, bytes))
    }

    /// Append an item unless one with the same id is already queued.
    pub fn push(&mut self, item: ImageItem) -> bool {
        if self.items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[tokio::test]
    async fn test_add_directory_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), PNG).unwrap();
        fs::write(dir.path().join("a.jpg"), JPEG).unwrap();

        let mut queue = ImageQueue::new(&Config::default());
        let report = queue.add_path(dir.path()).await.unwrap();

        assert_eq!(report.added, 2);
        let names: Vec<_> = queue.items().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
        assert_eq!(queue.items()[0].media_type, "image/jpeg");
        assert_eq!(queue.items()[1].media_type, "image/png");
    }

    #[tokio::test]
    async fn test_adding_twice_skips_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, PNG).unwrap();

        let mut queue = ImageQueue::new(&Config::default());
        queue.add_path(&path).await.unwrap();
        let report = queue.add_path(&path).await.unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.duplicates, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_content_that_is_not_an_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fake.jpg"), b"not really a jpeg").unwrap();
        fs::write(dir.path().join("real.png"), PNG).unwrap();

        let mut queue = ImageQueue::new(&Config::default());
        let report = queue.add_path(dir.path()).await.unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].1,
            PipelineError::UnsupportedFormat { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_path_is_error() {
        let mut queue = ImageQueue::new(&Config::default());
        let err = queue
            .add_path(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_empties_queue() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), PNG).unwrap();

        let mut queue = ImageQueue::new(&Config::default());
        queue.add_path(dir.path()).await.unwrap();
        assert!(!queue.is_empty());

        queue.clear();
        assert!(queue.is_empty());
    }
}
