//! Page target resolution

use snapcheck_core::Error as CoreError;

use crate::error::{HarnessError, HarnessResult};

/// One page under test, identified by a fully-qualified URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub url: String,
}

impl PageTarget {
    /// Resolve a configured path against an optional base URL.
    ///
    /// Absolute URLs pass through untouched. A relative path requires a
    /// configured base; without one the case cannot run at all.
    pub fn resolve(base_url: Option<&str>, path_or_url: &str) -> HarnessResult<Self> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            return Ok(Self {
                url: path_or_url.to_string(),
            });
        }

        let base = base_url.ok_or_else(|| {
            HarnessError::Core(CoreError::Configuration(format!(
                "relative path {:?} requires a configured base_url",
                path_or_url
            )))
        })?;

        Ok(Self {
            url: format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path_or_url.trim_start_matches('/')
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_absolute_url_passes_through() {
        let target = PageTarget::resolve(None, "https://example.com/about").unwrap();
        assert_eq!(target.url, "https://example.com/about");
    }

    #[test_case("http://127.0.0.1:3000", "/about"; "base no slash, path slash")]
    #[test_case("http://127.0.0.1:3000/", "/about"; "both slashes")]
    #[test_case("http://127.0.0.1:3000/", "about"; "base slash only")]
    #[test_case("http://127.0.0.1:3000", "about"; "neither slash")]
    fn test_join_has_exactly_one_slash(base: &str, path: &str) {
        let target = PageTarget::resolve(Some(base), path).unwrap();
        assert_eq!(target.url, "http://127.0.0.1:3000/about");
    }

    #[test]
    fn test_relative_path_without_base_is_configuration_error() {
        let err = PageTarget::resolve(None, "/about").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }
}
