//! Core types for the snapcheck visual regression harness
//!
//! Browser-free building blocks: the error taxonomy, the configuration
//! surface, the platform-scoped baseline store, and the pixel comparator.
//! Browser automation and test orchestration live in `snapcheck-harness`.

pub mod baseline;
pub mod compare;
pub mod config;
pub mod error;
pub mod outcome;
pub mod platform;
pub mod snapshot;

pub use baseline::{Baseline, BaselineKey, BaselineStore, CreateOutcome};
pub use compare::{Comparator, ComparisonResult, DimensionMismatch, ToleranceSpec};
pub use config::{HarnessConfig, ReportFormat, SiteConfig};
pub use error::{Error, Result};
pub use outcome::{CaseOutcome, CaseResult, CaseState, RunSummary};
pub use platform::PlatformKey;
pub use snapshot::Snapshot;
