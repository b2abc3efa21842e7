//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.curation.threshold) {
            return Err(ConfigError::ValidationError(
                "curation.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.curation.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "curation.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.discovery_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.discovery_timeout_ms must be > 0".into(),
            ));
        }
        if self.provider.local.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.local.endpoint must not be empty".into(),
            ));
        }
        if self.provider.cloud.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.cloud.endpoint must not be empty".into(),
            ));
        }
        if self.provider.local.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "provider.local.max_tokens must be > 0".into(),
            ));
        }
        if self.export.archive_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "export.archive_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.curation.threshold = 1.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));

        config.curation.threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_threshold_bounds() {
        let mut config = Config::default();
        config.curation.threshold = 0.0;
        assert!(config.validate().is_ok());
        config.curation.threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut config = Config::default();
        config.provider.local.endpoint = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider.local.endpoint"));
    }

    #[test]
    fn test_validate_rejects_empty_archive_name() {
        let mut config = Config::default();
        config.export.archive_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("archive_name"));
    }
}
