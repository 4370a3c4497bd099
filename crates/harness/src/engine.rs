//! Browser engine seam and the Playwright implementation
//!
//! The engine is a black box to the rest of the harness: navigate to a URL,
//! wait for the page to settle, write a screenshot, report the title. The
//! production implementation generates a Node script per capture and runs
//! it with Playwright; tests substitute their own [`BrowserEngine`].

use std::path::PathBuf;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// One capture: everything the engine needs for a single page visit
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: String,

    /// Where to write the screenshot; `None` for title-only cases
    pub screenshot_path: Option<PathBuf>,

    pub viewport: (u32, u32),
    pub full_page: bool,
    pub wait_for_selector: Option<String>,

    /// Navigation budget passed to the engine's own goto timeout
    pub nav_timeout_ms: u64,

    /// Budget for wait-for-selector
    pub wait_timeout_ms: u64,

    pub headless: bool,
}

/// What the engine observed after the page settled
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub title: String,
}

/// External rendering engine: navigate and capture, nothing more
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> HarnessResult<CapturedPage>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Drives Playwright through generated Node scripts, one per capture.
/// The subprocess is killed when the capture future is dropped, so a
/// timed-out case never leaks a browser session.
pub struct PlaywrightEngine {
    browser: Browser,
}

impl PlaywrightEngine {
    pub fn new(browser: Browser) -> HarnessResult<Self> {
        Self::check_installed()?;
        Ok(Self { browser })
    }

    fn check_installed() -> HarnessResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::EngineNotFound),
        }
    }

    fn build_script(&self, request: &CaptureRequest) -> String {
        let mut script = format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();

  try {{
    await page.goto('{url}', {{ timeout: {nav_timeout}, waitUntil: 'load' }});
"#,
            browser = self.browser.as_str(),
            headless = request.headless,
            width = request.viewport.0,
            height = request.viewport.1,
            url = escape_js(&request.url),
            nav_timeout = request.nav_timeout_ms,
        );

        if let Some(selector) = &request.wait_for_selector {
            script.push_str(&format!(
                "    await page.waitForSelector('{}', {{ timeout: {} }});\n",
                escape_js(selector),
                request.wait_timeout_ms,
            ));
        }

        script.push_str("    const title = await page.title();\n");

        if let Some(path) = &request.screenshot_path {
            script.push_str(&format!(
                "    await page.screenshot({{ path: '{}', fullPage: {} }});\n",
                escape_js(&path.to_string_lossy()),
                request.full_page,
            ));
        }

        script.push_str(
            r#"    console.log('SNAPCHECK_RESULT ' + JSON.stringify({ title: title }));
  } catch (error) {
    console.error('SNAPCHECK_ERROR ' + JSON.stringify({ message: error.message }));
    process.exit(1);
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }
}

#[async_trait]
impl BrowserEngine for PlaywrightEngine {
    async fn capture(&self, request: &CaptureRequest) -> HarnessResult<CapturedPage> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("capture.js");
        std::fs::write(&script_path, self.build_script(request))?;

        debug!("running engine script for {}", request.url);

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, request));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = parse_result_line(&stdout).ok_or_else(|| {
            HarnessError::Engine(format!(
                "no result line in engine output: {}",
                stdout.trim()
            ))
        })?;

        Ok(CapturedPage {
            title: result.title,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EngineResult {
    title: String,
}

#[derive(Debug, Deserialize)]
struct EngineFailure {
    message: String,
}

fn parse_result_line(stdout: &str) -> Option<EngineResult> {
    let re = Regex::new(r"(?m)^SNAPCHECK_RESULT (.+)$").ok()?;
    let captures = re.captures(stdout)?;
    serde_json::from_str(&captures[1]).ok()
}

/// Map an engine failure onto the harness taxonomy. Playwright reports
/// navigation budget expiry as a TimeoutError; that is the one retryable
/// failure.
fn classify_failure(stderr: &str, request: &CaptureRequest) -> HarnessError {
    let message = Regex::new(r"(?m)^SNAPCHECK_ERROR (.+)$")
        .ok()
        .and_then(|re| {
            re.captures(stderr)
                .and_then(|c| serde_json::from_str::<EngineFailure>(&c[1]).ok())
        })
        .map(|f| f.message)
        .unwrap_or_else(|| stderr.trim().to_string());

    if message.contains("Timeout") || message.contains("timeout") {
        HarnessError::Navigation {
            url: request.url.clone(),
            timeout_ms: request.nav_timeout_ms,
        }
    } else {
        HarnessError::Engine(message)
    }
}

fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
