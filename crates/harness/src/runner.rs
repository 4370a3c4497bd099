//! Test orchestration: resolve, capture, compare, report
//!
//! Each case walks `Pending -> Navigating -> Capturing -> Comparing` into a
//! terminal outcome. Cases are independent: they share only the baseline
//! store, and one case's error never aborts its siblings.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use snapcheck_core::baseline::{sha256_file, BaselineKey, CreateOutcome};
use snapcheck_core::compare::ComparisonResult;
use snapcheck_core::{
    BaselineStore, CaseOutcome, CaseResult, CaseState, Comparator, HarnessConfig, PlatformKey,
    RunSummary,
};
use tracing::{debug, error, info, warn};

use crate::capture::SnapshotCapturer;
use crate::engine::BrowserEngine;
use crate::error::HarnessResult;
use crate::report;
use crate::server::SiteServer;
use crate::spec::CaseSpec;
use crate::target::PageTarget;

pub struct Orchestrator {
    config: HarnessConfig,
    engine: Arc<dyn BrowserEngine>,
    store: BaselineStore,
    comparator: Comparator,
    platform: PlatformKey,
    site: Option<SiteServer>,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig, engine: Arc<dyn BrowserEngine>) -> HarnessResult<Self> {
        config.validate()?;
        let store = BaselineStore::open(config.snapshot_dir())?;
        let platform = config.platform();

        Ok(Self {
            config,
            engine,
            store,
            comparator: Comparator::default(),
            platform,
            site: None,
        })
    }

    /// Spawn the configured site under test, if any. Its address becomes
    /// the default base URL when none is configured.
    pub async fn start_site(&mut self) -> HarnessResult<()> {
        if self.site.is_some() {
            return Ok(());
        }
        if let Some(site_config) = self.config.site.clone() {
            let server = SiteServer::spawn(&site_config).await?;
            if self.config.base_url.is_none() {
                self.config.base_url = Some(server.base_url().to_string());
            }
            self.site = Some(server);
        }
        Ok(())
    }

    pub fn stop_site(&mut self) {
        if let Some(mut site) = self.site.take() {
            site.stop();
        }
    }

    /// Run all cases matching the pattern and write the report artifacts
    pub async fn run(&mut self, pattern: Option<&str>) -> HarnessResult<RunSummary> {
        let start = Instant::now();
        let specs = self.load_specs(pattern)?;
        self.start_site().await?;

        std::fs::create_dir_all(&self.config.output_dir)?;
        let capturer = SnapshotCapturer::new(
            Arc::clone(&self.engine),
            self.config.output_dir.join("actual"),
            self.config.default_timeout_ms,
            self.config.expect_timeout_ms,
            self.config.headless,
        )?;

        info!("running {} case(s) on {}", specs.len(), self.platform);

        let this = &*self;
        let capturer = &capturer;
        let mut indexed = stream::iter(specs.iter().enumerate())
            .map(|(idx, spec)| async move {
                let result = this.run_case(capturer, spec).await;
                match result.outcome {
                    CaseOutcome::Passed => {
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    }
                    CaseOutcome::BaselineCreated => {
                        info!(
                            "✓ {} (baseline created, {} ms)",
                            result.name, result.duration_ms
                        );
                    }
                    CaseOutcome::Failed | CaseOutcome::Errored => {
                        error!(
                            "✗ {} - {}",
                            result.name,
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                (idx, result)
            })
            .buffer_unordered(this.config.worker_count)
            .collect::<Vec<_>>()
            .await;

        // Report in spec order regardless of completion order
        indexed.sort_by_key(|(idx, _)| *idx);
        let results = indexed.into_iter().map(|(_, result)| result).collect();
        let summary = RunSummary::from_results(results, start.elapsed().as_millis() as u64);

        info!(
            "results: {} passed, {} baselines created, {} failed, {} errored ({} ms)",
            summary.passed,
            summary.baselines_created,
            summary.failed,
            summary.errored,
            summary.duration_ms
        );

        report::write_json(&summary, &self.config.output_dir)?;
        report::write_html(&summary, &self.config.output_dir)?;

        Ok(summary)
    }

    async fn run_case(&self, capturer: &SnapshotCapturer, spec: &CaseSpec) -> CaseResult {
        let start = Instant::now();
        let mut attempts = 0u32;
        debug!("running case: {}", spec.name);

        let target = match PageTarget::resolve(self.config.base_url.as_deref(), &spec.path) {
            Ok(target) => target,
            Err(e) => return errored(spec, start, attempts, e.to_string()),
        };

        let mut state = CaseState::Pending;
        let captured = loop {
            state = match state.transition(CaseState::Navigating) {
                Ok(next) => next,
                Err(e) => return errored(spec, start, attempts, e.to_string()),
            };
            attempts += 1;

            match capturer.capture(spec, &target, &self.platform).await {
                Ok(captured) => break captured,
                Err(e) if e.is_retryable() && attempts <= self.config.retry_on_error => {
                    warn!(
                        "navigation retry {}/{} for '{}': {}",
                        attempts, self.config.retry_on_error, spec.name, e
                    );
                }
                Err(e) => return errored(spec, start, attempts, e.to_string()),
            }
        };

        state = match state.transition(CaseState::Capturing) {
            Ok(next) => next,
            Err(e) => return errored(spec, start, attempts, e.to_string()),
        };
        let state = match state.transition(CaseState::Comparing) {
            Ok(next) => next,
            Err(e) => return errored(spec, start, attempts, e.to_string()),
        };
        debug!("case '{}' entering {}", spec.name, state);

        // A wrong title means the workflow completed and found a
        // regression: Failed, not Errored
        if let Some(expected) = &spec.expect_title {
            if &captured.title != expected {
                let mut result = base_result(spec, start, attempts, CaseOutcome::Failed);
                result.error = Some(format!(
                    "title mismatch: expected {:?}, got {:?}",
                    expected, captured.title
                ));
                return result;
            }
        }

        let (snapshot, png_path) = match (captured.snapshot, captured.png_path) {
            (Some(snapshot), Some(png_path)) => (snapshot, png_path),
            _ => return base_result(spec, start, attempts, CaseOutcome::Passed),
        };

        let key = BaselineKey::new(spec.snapshot_label(), self.platform.clone());

        let mut baseline = match self.store.load(&key) {
            Ok(baseline) => baseline,
            Err(e) => return errored(spec, start, attempts, e.to_string()),
        };

        if baseline.is_none() {
            match self.store.create_if_absent(&key, &png_path) {
                Ok(CreateOutcome::Created) => {
                    return base_result(spec, start, attempts, CaseOutcome::BaselineCreated);
                }
                // Lost the create race to a concurrent run of this key;
                // the persisted baseline wins
                Ok(CreateOutcome::AlreadyExists) => {
                    baseline = match self.store.load(&key) {
                        Ok(baseline) => baseline,
                        Err(e) => return errored(spec, start, attempts, e.to_string()),
                    };
                }
                Err(e) => return errored(spec, start, attempts, e.to_string()),
            }
        }

        let Some(baseline) = baseline else {
            return errored(
                spec,
                start,
                attempts,
                format!("baseline {} unreadable after creation", key.file_name()),
            );
        };

        let tolerance = spec.tolerance();

        // Byte-identical captures skip the pixel walk entirely
        if let Ok(hash) = sha256_file(&png_path) {
            if hash == baseline.sha256() {
                let mut result = base_result(spec, start, attempts, CaseOutcome::Passed);
                result.diff_pixel_count = Some(0);
                return result;
            }
        }

        let comparison = self.comparator.compare(&baseline, &snapshot, tolerance);
        if comparison.passed {
            let mut result = base_result(spec, start, attempts, CaseOutcome::Passed);
            result.diff_pixel_count = Some(comparison.diff_pixel_count);
            return result;
        }

        let mut result = base_result(spec, start, attempts, CaseOutcome::Failed);
        result.diff_pixel_count = Some(comparison.diff_pixel_count);
        result.diff_image = self.save_diff_artifact(spec, &comparison);
        result.error = comparison.failure_reason(tolerance);
        result
    }

    /// Re-capture matching cases and overwrite their baselines. This is
    /// the explicit operator path; a normal run never lands here.
    pub async fn update_baselines(&mut self, pattern: Option<&str>) -> HarnessResult<Vec<String>> {
        let specs = self.load_specs(pattern)?;
        self.start_site().await?;

        let capturer = SnapshotCapturer::new(
            Arc::clone(&self.engine),
            self.config.output_dir.join("actual"),
            self.config.default_timeout_ms,
            self.config.expect_timeout_ms,
            self.config.headless,
        )?;

        let mut updated = Vec::new();
        for spec in &specs {
            if !spec.visual {
                continue;
            }
            let target = PageTarget::resolve(self.config.base_url.as_deref(), &spec.path)?;
            let captured = capturer.capture(spec, &target, &self.platform).await?;
            if let Some(png_path) = captured.png_path {
                let key = BaselineKey::new(spec.snapshot_label(), self.platform.clone());
                self.store.update(&key, &png_path)?;
                updated.push(key.file_name());
            }
        }

        Ok(updated)
    }

    pub fn list_baselines(&self) -> HarnessResult<Vec<String>> {
        Ok(self.store.list()?)
    }

    fn load_specs(&self, pattern: Option<&str>) -> HarnessResult<Vec<CaseSpec>> {
        let specs = CaseSpec::load_all(&self.config.test_dir)?;
        let specs: Vec<CaseSpec> = match pattern {
            Some(pattern) => specs.into_iter().filter(|s| s.matches(pattern)).collect(),
            None => specs,
        };
        if specs.is_empty() {
            warn!("no cases matched in {}", self.config.test_dir.display());
        }
        Ok(specs)
    }

    fn save_diff_artifact(&self, spec: &CaseSpec, comparison: &ComparisonResult) -> Option<String> {
        let diff = comparison.diff_image.as_ref()?;

        let dir = self.config.output_dir.join("diffs");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("could not create diff directory: {}", e);
            return None;
        }

        let file_name = format!("{}-{}-diff.png", spec.snapshot_label(), self.platform);
        match diff.save(dir.join(&file_name)) {
            Ok(()) => Some(format!("diffs/{}", file_name)),
            Err(e) => {
                warn!("could not save diff artifact for '{}': {}", spec.name, e);
                None
            }
        }
    }
}

fn base_result(spec: &CaseSpec, start: Instant, attempts: u32, outcome: CaseOutcome) -> CaseResult {
    CaseResult {
        name: spec.name.clone(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
        attempts,
        diff_pixel_count: None,
        diff_image: None,
        error: None,
    }
}

fn errored(spec: &CaseSpec, start: Instant, attempts: u32, message: String) -> CaseResult {
    let mut result = base_result(spec, start, attempts, CaseOutcome::Errored);
    result.error = Some(message);
    result
}
