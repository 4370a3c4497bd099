//! Platform key for baseline scoping
//!
//! Pages render differently across operating systems (fonts, antialiasing),
//! so the platform is part of the baseline key and of the on-disk file name.
//! Comparing a snapshot against a baseline from another platform without
//! relaxed tolerance is expected to produce false failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for the rendering environment a baseline was captured on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformKey(String);

impl PlatformKey {
    /// Key for the platform this process is running on
    pub fn current() -> Self {
        Self(std::env::consts::OS.to_string())
    }

    /// Operator-supplied key, e.g. to share baselines between CI runners
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_is_non_empty() {
        assert!(!PlatformKey::current().as_str().is_empty());
    }

    #[test]
    fn test_display_matches_key() {
        let key = PlatformKey::new("linux");
        assert_eq!(key.to_string(), "linux");
    }
}
