//! Harness configuration surface
//!
//! Loaded from a TOML file with serde defaults; the CLI layers flag
//! overrides on top. Invalid configuration is fatal before any case runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::platform::PlatformKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding YAML case specs
    pub test_dir: PathBuf,

    /// Hard ceiling for navigation plus capture, per attempt
    pub default_timeout_ms: u64,

    /// Bound for wait-for-selector and title expectations
    pub expect_timeout_ms: u64,

    /// Base URL for relative case paths. Cases with absolute URLs work
    /// without it; a relative path with no base is a configuration error.
    pub base_url: Option<String>,

    pub headless: bool,

    /// Concurrent case workers
    pub worker_count: usize,

    pub report_format: ReportFormat,

    /// Bounded retries for navigation timeouts only. Failed comparisons
    /// are never retried.
    pub retry_on_error: u32,

    /// Report, actual screenshots, and diff artifacts land here
    pub output_dir: PathBuf,

    /// Baseline directory; defaults to `<test_dir>/snapshots`
    pub snapshot_dir: Option<PathBuf>,

    /// Override the platform half of the baseline key
    pub platform_key: Option<String>,

    /// Optional site-under-test process to spawn before the run
    pub site: Option<SiteConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from("cases"),
            default_timeout_ms: 30_000,
            expect_timeout_ms: 5_000,
            base_url: None,
            headless: true,
            worker_count: 4,
            report_format: ReportFormat::Html,
            retry_on_error: 0,
            output_dir: PathBuf::from("snap-results"),
            snapshot_dir: None,
            platform_key: None,
            site: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Configuration(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(Error::Configuration(
                "default_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some(site) = &self.site {
            if site.command.is_empty() {
                return Err(Error::Configuration(
                    "site.command must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Baselines live adjacent to the case definitions unless overridden
    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| self.test_dir.join("snapshots"))
    }

    pub fn platform(&self) -> PlatformKey {
        match &self.platform_key {
            Some(key) => PlatformKey::new(key.clone()),
            None => PlatformKey::current(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
}

/// Site-under-test process spawned for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Port the command serves on; becomes the default base URL
    pub port: u16,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

fn default_health_path() -> String {
    "/".to_string()
}

fn default_startup_timeout() -> u64 {
    30
}

impl SiteConfig {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.expect_timeout_ms, 5_000);
        assert_eq!(config.retry_on_error, 0);
        assert_eq!(config.worker_count, 4);
        assert!(config.headless);
        assert_eq!(config.report_format, ReportFormat::Html);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_snapshot_dir_defaults_adjacent_to_cases() {
        let config = HarnessConfig {
            test_dir: PathBuf::from("cases"),
            ..Default::default()
        };
        assert_eq!(config.snapshot_dir(), PathBuf::from("cases/snapshots"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
test_dir = "e2e/cases"
default_timeout_ms = 10000
expect_timeout_ms = 2000
base_url = "http://127.0.0.1:3000"
headless = false
worker_count = 2
retry_on_error = 1
report_format = "html"
output_dir = "out"
platform_key = "ci-linux"

[site]
command = "serve"
args = ["-p", "3000", "dist"]
port = 3000
health_path = "/about"
"#;
        let config: HarnessConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.test_dir, PathBuf::from("e2e/cases"));
        assert_eq!(config.default_timeout_ms, 10_000);
        assert_eq!(config.retry_on_error, 1);
        assert_eq!(config.platform().as_str(), "ci-linux");

        let site = config.site.unwrap();
        assert_eq!(site.base_url(), "http://127.0.0.1:3000");
        assert_eq!(site.health_path, "/about");
        assert_eq!(site.startup_timeout_secs, 30);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = HarnessConfig {
            worker_count: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("worker_count"));
    }

    #[test]
    fn test_bad_toml_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapcheck.toml");
        std::fs::write(&path, "worker_count = \"many\"").unwrap();

        let err = HarnessConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = HarnessConfig::from_file(Path::new("/nonexistent/snapcheck.toml")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
