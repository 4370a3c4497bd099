//! snapcheck test harness
//!
//! Drives the visual-regression workflow against an HTTP-served site. The
//! site and the browser engine are external collaborators: the site exposes
//! navigable URLs, the engine exposes navigate/capture, and everything else
//! is this crate's job.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Orchestrator                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  per case (bounded worker pool):                            │
//! │    PageTarget::resolve(base_url, path)                      │
//! │      -> SnapshotCapturer::capture()   [BrowserEngine]       │
//! │      -> BaselineStore::load / create_if_absent              │
//! │      -> Comparator::compare(tolerance)                      │
//! │      -> CaseResult { Passed | BaselineCreated |             │
//! │                      Failed | Errored }                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaseSpec (YAML)                                            │
//! │    ├── name, path, tags                                     │
//! │    ├── viewport, full_page, wait_for_selector               │
//! │    ├── max_diff_pixels, expect_title                        │
//! │    └── visual: bool                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod engine;
pub mod error;
pub mod report;
pub mod runner;
pub mod server;
pub mod spec;
pub mod target;

pub use engine::{Browser, BrowserEngine, CaptureRequest, CapturedPage, PlaywrightEngine};
pub use error::{HarnessError, HarnessResult};
pub use runner::Orchestrator;
pub use spec::{CaseSpec, Viewport};
pub use target::PageTarget;
