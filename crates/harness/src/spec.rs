//! Declarative YAML case specifications

use std::path::Path;

use serde::{Deserialize, Serialize};
use snapcheck_core::ToleranceSpec;

use crate::error::{HarnessError, HarnessResult};

/// One page-under-test case parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    /// Unique name for this case; also the default baseline label
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Base-relative path or fully-qualified URL
    pub path: String,

    /// Selector the page must render before capture
    #[serde(default)]
    pub wait_for_selector: Option<String>,

    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Capture the full scrollable page instead of the viewport
    #[serde(default)]
    pub full_page: bool,

    /// Whether to capture and compare a snapshot; title-only cases turn
    /// this off
    #[serde(default = "default_true")]
    pub visual: bool,

    /// Per-case differing-pixel budget; the global default is 0
    #[serde(default)]
    pub max_diff_pixels: Option<u64>,

    /// Exact page title expected after navigation
    #[serde(default)]
    pub expect_title: Option<String>,

    /// Baseline label override; defaults to the case name
    #[serde(default)]
    pub snapshot_name: Option<String>,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl CaseSpec {
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load every `*.yaml`/`*.yml` under a directory, sorted by name.
    /// Duplicate case names are rejected: the name keys the baseline.
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(HarnessError::Spec(format!(
                "case directory not found: {}",
                dir.display()
            )));
        }

        let mut specs = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in specs.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(HarnessError::Spec(format!(
                    "duplicate case name: {}",
                    pair[0].name
                )));
            }
        }

        Ok(specs)
    }

    pub fn snapshot_label(&self) -> &str {
        self.snapshot_name.as_deref().unwrap_or(&self.name)
    }

    /// Pattern filtering for `run [pattern]`: name substring or exact tag
    pub fn matches(&self, pattern: &str) -> bool {
        self.name.contains(pattern) || self.tags.iter().any(|t| t == pattern)
    }

    pub fn tolerance(&self) -> ToleranceSpec {
        ToleranceSpec::new(self.max_diff_pixels.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_visual_case() {
        let yaml = r#"
name: aboutpage
description: About page visual snapshot
tags:
  - visual
path: /about
wait_for_selector: 'main'
max_diff_pixels: 100
"#;
        let spec = CaseSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "aboutpage");
        assert_eq!(spec.path, "/about");
        assert!(spec.visual);
        assert_eq!(spec.viewport.width, 1280);
        assert_eq!(spec.viewport.height, 720);
        assert_eq!(spec.tolerance(), ToleranceSpec::new(100));
        assert_eq!(spec.snapshot_label(), "aboutpage");
    }

    #[test]
    fn test_parse_title_only_case() {
        let yaml = r#"
name: homepage-title
path: https://playwright.dev
visual: false
expect_title: Playwright
"#;
        let spec = CaseSpec::from_yaml(yaml).unwrap();
        assert!(!spec.visual);
        assert_eq!(spec.expect_title.as_deref(), Some("Playwright"));
        assert_eq!(spec.tolerance(), ToleranceSpec::new(0));
    }

    #[test]
    fn test_parse_viewport_and_snapshot_name() {
        let yaml = r#"
name: landing-wide
path: /
viewport:
  width: 1920
  height: 1080
full_page: true
snapshot_name: landing
"#;
        let spec = CaseSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.viewport.width, 1920);
        assert!(spec.full_page);
        assert_eq!(spec.snapshot_label(), "landing");
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "name: beta\npath: /beta\ntags: [smoke]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.yml"), "name: alpha\npath: /alpha\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a spec").unwrap();

        let specs = CaseSpec::load_all(dir.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "alpha");
        assert_eq!(specs[1].name, "beta");

        assert!(specs[1].matches("bet"));
        assert!(specs[1].matches("smoke"));
        assert!(!specs[0].matches("smoke"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yaml"), "name: same\npath: /a\n").unwrap();
        std::fs::write(dir.path().join("b.yaml"), "name: same\npath: /b\n").unwrap();

        let err = CaseSpec::load_all(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate case name"));
    }

    #[test]
    fn test_missing_directory_is_spec_error() {
        let err = CaseSpec::load_all(Path::new("/nonexistent/cases")).unwrap_err();
        assert!(matches!(err, HarnessError::Spec(_)));
    }
}
