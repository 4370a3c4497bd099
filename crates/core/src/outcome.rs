//! Per-case state machine and run results
//!
//! `Errored` means the harness could not complete the workflow (timeout,
//! navigation failure, bad configuration); `Failed` means the workflow
//! completed but the comparison did not meet tolerance. The distinction is
//! preserved end to end, into the report and the exit code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    Pending,
    Navigating,
    Capturing,
    Comparing,
    Passed,
    BaselineCreated,
    Failed,
    Errored,
}

impl CaseState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaseState::Passed | CaseState::BaselineCreated | CaseState::Failed | CaseState::Errored
        )
    }

    /// Legal transitions; a retried navigation re-enters Navigating
    pub fn can_transition(self, next: CaseState) -> bool {
        use CaseState::*;
        matches!(
            (self, next),
            (Pending, Navigating)
                | (Navigating, Navigating)
                | (Navigating, Capturing)
                | (Navigating, Errored)
                | (Capturing, Comparing)
                | (Capturing, Errored)
                | (Comparing, Passed)
                | (Comparing, BaselineCreated)
                | (Comparing, Failed)
                | (Comparing, Errored)
        )
    }

    pub fn transition(self, next: CaseState) -> Result<CaseState> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseState::Pending => "pending",
            CaseState::Navigating => "navigating",
            CaseState::Capturing => "capturing",
            CaseState::Comparing => "comparing",
            CaseState::Passed => "passed",
            CaseState::BaselineCreated => "baseline-created",
            CaseState::Failed => "failed",
            CaseState::Errored => "errored",
        };
        write!(f, "{}", s)
    }
}

/// Terminal outcome of one case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    /// First run for this key: a baseline was written instead of compared.
    /// Not a pass and not a failure; surfaced so operators review it.
    BaselineCreated,
    Failed,
    Errored,
}

impl CaseOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, CaseOutcome::Failed | CaseOutcome::Errored)
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseOutcome::Passed => "passed",
            CaseOutcome::BaselineCreated => "baseline-created",
            CaseOutcome::Failed => "failed",
            CaseOutcome::Errored => "errored",
        };
        write!(f, "{}", s)
    }
}

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub outcome: CaseOutcome,
    pub duration_ms: u64,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_pixel_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub baselines_created: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub results: Vec<CaseResult>,
}

impl RunSummary {
    pub fn from_results(results: Vec<CaseResult>, duration_ms: u64) -> Self {
        let mut summary = Self {
            total: results.len(),
            passed: 0,
            baselines_created: 0,
            failed: 0,
            errored: 0,
            duration_ms,
            results,
        };
        for result in &summary.results {
            match result.outcome {
                CaseOutcome::Passed => summary.passed += 1,
                CaseOutcome::BaselineCreated => summary.baselines_created += 1,
                CaseOutcome::Failed => summary.failed += 1,
                CaseOutcome::Errored => summary.errored += 1,
            }
        }
        summary
    }

    /// Exit-code semantics: baseline creation is non-failure
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = CaseState::Pending;
        for next in [
            CaseState::Navigating,
            CaseState::Capturing,
            CaseState::Comparing,
            CaseState::Passed,
        ] {
            state = state.transition(next).unwrap();
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn test_navigation_retry_reenters_navigating() {
        let state = CaseState::Navigating;
        assert!(state.can_transition(CaseState::Navigating));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [
            CaseState::Passed,
            CaseState::BaselineCreated,
            CaseState::Failed,
            CaseState::Errored,
        ] {
            assert!(!terminal.can_transition(CaseState::Navigating));
            assert!(!terminal.can_transition(CaseState::Comparing));
        }
    }

    #[test]
    fn test_illegal_transition_is_error() {
        let err = CaseState::Pending
            .transition(CaseState::Comparing)
            .unwrap_err();
        assert!(err.to_string().contains("pending -> comparing"));
    }

    #[test]
    fn test_baseline_created_is_not_failure() {
        assert!(!CaseOutcome::BaselineCreated.is_failure());
        assert!(!CaseOutcome::Passed.is_failure());
        assert!(CaseOutcome::Failed.is_failure());
        assert!(CaseOutcome::Errored.is_failure());
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            case("a", CaseOutcome::Passed),
            case("b", CaseOutcome::BaselineCreated),
            case("c", CaseOutcome::Failed),
            case("d", CaseOutcome::Errored),
            case("e", CaseOutcome::Passed),
        ];
        let summary = RunSummary::from_results(results, 1234);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.baselines_created, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errored, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_baselines_only_run_is_success() {
        let results = vec![case("a", CaseOutcome::BaselineCreated)];
        assert!(RunSummary::from_results(results, 0).is_success());
    }

    fn case(name: &str, outcome: CaseOutcome) -> CaseResult {
        CaseResult {
            name: name.to_string(),
            outcome,
            duration_ms: 10,
            attempts: 1,
            diff_pixel_count: None,
            diff_image: None,
            error: None,
        }
    }
}
