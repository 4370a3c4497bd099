//! Snapshot capture: navigate, settle, screenshot, load

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snapcheck_core::{PlatformKey, Snapshot};
use tokio::time::timeout;
use tracing::debug;

use crate::engine::{BrowserEngine, CaptureRequest};
use crate::error::{HarnessError, HarnessResult};
use crate::spec::CaseSpec;
use crate::target::PageTarget;

/// Everything one capture produced
pub struct CapturedCase {
    /// Decoded screenshot; absent for title-only cases
    pub snapshot: Option<Snapshot>,

    /// On-disk PNG the engine wrote, kept as a run artifact
    pub png_path: Option<PathBuf>,

    pub title: String,
}

/// Turns a resolved target into a [`Snapshot`] via the browser engine
pub struct SnapshotCapturer {
    engine: Arc<dyn BrowserEngine>,
    actual_dir: PathBuf,
    nav_timeout_ms: u64,
    wait_timeout_ms: u64,
    headless: bool,
}

impl SnapshotCapturer {
    pub fn new(
        engine: Arc<dyn BrowserEngine>,
        actual_dir: PathBuf,
        nav_timeout_ms: u64,
        wait_timeout_ms: u64,
        headless: bool,
    ) -> HarnessResult<Self> {
        std::fs::create_dir_all(&actual_dir)?;
        Ok(Self {
            engine,
            actual_dir,
            nav_timeout_ms,
            wait_timeout_ms,
            headless,
        })
    }

    /// Capture one case. The configured timeout is a hard ceiling over
    /// navigation plus capture; on expiry the engine future is dropped,
    /// which tears down the browser session on every exit path.
    pub async fn capture(
        &self,
        spec: &CaseSpec,
        target: &PageTarget,
        platform: &PlatformKey,
    ) -> HarnessResult<CapturedCase> {
        let png_path = spec
            .visual
            .then(|| {
                self.actual_dir
                    .join(format!("{}-{}.png", spec.snapshot_label(), platform))
            });

        let request = CaptureRequest {
            url: target.url.clone(),
            screenshot_path: png_path.clone(),
            viewport: (spec.viewport.width, spec.viewport.height),
            full_page: spec.full_page,
            wait_for_selector: spec.wait_for_selector.clone(),
            nav_timeout_ms: self.nav_timeout_ms,
            wait_timeout_ms: self.wait_timeout_ms,
            headless: self.headless,
        };

        debug!("capturing {} -> {:?}", target.url, png_path);

        let page = match timeout(
            Duration::from_millis(self.nav_timeout_ms),
            self.engine.capture(&request),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(HarnessError::Navigation {
                    url: target.url.clone(),
                    timeout_ms: self.nav_timeout_ms,
                })
            }
        };

        let snapshot = match &png_path {
            Some(path) => Some(Snapshot::load_png(path)?),
            None => None,
        };

        Ok(CapturedCase {
            snapshot,
            png_path,
            title: page.title,
        })
    }
}
