//! Input validation before an image joins the queue.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Media types the providers accept.
pub const SUPPORTED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Validates files before they are queued.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check the on-disk size against the configured limit.
    pub fn check_size(&self, path: &Path, size: u64) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Identify the media type from the file's magic bytes.
    ///
    /// Only JPEG, PNG and WEBP content is accepted, whatever the extension says.
    pub fn media_type(&self, path: &Path, bytes: &[u8]) -> Result<&'static str, PipelineError> {
        Self::sniff(bytes).ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: Self::describe(bytes),
        })
    }

    /// Match the header against known signatures.
    fn sniff(header: &[u8]) -> Option<&'static str> {
        match header {
            // JPEG: FF D8 FF
            [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
            // PNG: 89 50 4E 47
            [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
            // WebP: RIFF....WEBP
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
            _ => None,
        }
    }

    fn describe(header: &[u8]) -> String {
        match header {
            [] => "empty file".to_string(),
            [b'G', b'I', b'F', b'8', ..] => "image/gif".to_string(),
            [b'B', b'M', ..] => "image/bmp".to_string(),
            _ => "unrecognized content (invalid magic bytes)".to_string(),
        }
    }
}
