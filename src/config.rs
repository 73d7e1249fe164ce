//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::aggregate::MatchMode;
use crate::error::ConfigError;
use crate::policy::DEFAULT_RULE_PREFIX;
use crate::report::{ReportFormat, SheetLayout};

/// Policy extraction run configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory holding `*.txt` console exports.
    pub input_dir: PathBuf,
    /// Directory reports are written to.
    pub output_dir: PathBuf,
    /// Optional mail log CSV used for send/receive counts.
    pub log_path: Option<PathBuf>,
    /// Product prefix in rule names (`-<prefix>-DLP-<Type>`).
    pub rule_prefix: String,
    pub format: ReportFormat,
    pub layout: SheetLayout,
    pub match_mode: MatchMode,
    /// Drop entries that fail address/domain syntax checks instead of only warning.
    pub drop_invalid: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            log_path: None,
            rule_prefix: DEFAULT_RULE_PREFIX.to_string(),
            format: ReportFormat::default(),
            layout: SheetLayout::default(),
            match_mode: MatchMode::default(),
            drop_invalid: false,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InvalidValue {
                key: "input_dir".into(),
                message: format!("{} is not a directory", self.input_dir.display()),
            });
        }
        if let Some(log) = &self.log_path {
            if !log.is_file() {
                return Err(ConfigError::InvalidValue {
                    key: "log_path".into(),
                    message: format!("{} does not exist", log.display()),
                });
            }
        }
        if self.rule_prefix.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                key: "rule_prefix".into(),
                message: "must not contain whitespace".into(),
            });
        }
        Ok(())
    }
}

/// Vulnerability-scan export configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// API base URL; the footprint is appended as a path segment.
    pub base_url: String,
    pub footprint: String,
    pub api_key: Option<SecretString>,
    /// Accept self-signed certificates (internal scanners often use them).
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
    /// Hard stop for pagination.
    pub max_pages: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            footprint: String::new(),
            api_key: None,
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
            max_pages: 1000,
        }
    }
}

impl ScanConfig {
    /// Full URL of the footprint's service listing.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.footprint.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "base_url".into(),
                hint: "Pass --base-url or set SCAN_API_URL".into(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "base_url".into(),
                message: "must start with http:// or https://".into(),
            });
        }
        if self.footprint.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "footprint".into(),
                hint: "Pass --footprint or set SCAN_API_FOOTPRINT".into(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_pages".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.rule_prefix, "EPPA");
        assert_eq!(config.match_mode, MatchMode::Exact);
        assert_eq!(config.format, ReportFormat::Xlsx);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn extract_rejects_missing_input_dir() {
        let config = ExtractConfig {
            input_dir: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "input_dir"
        ));
    }

    #[test]
    fn extract_rejects_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractConfig {
            input_dir: dir.path().to_path_buf(),
            log_path: Some(dir.path().join("missing.csv")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn scan_endpoint_joins_segments() {
        let config = ScanConfig {
            base_url: "https://scan.example.com/api/footprints/".into(),
            footprint: "/acme".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "https://scan.example.com/api/footprints/acme");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scan_requires_url_and_footprint() {
        let config = ScanConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { key, .. }) if key == "base_url"
        ));
        let config = ScanConfig {
            base_url: "ftp://scan.example.com".into(),
            footprint: "acme".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
