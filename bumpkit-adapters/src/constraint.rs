//! Version constraint rewriting shared by the manifest adapters.

use bumpkit_core::error::{Error, Result};
use regex::Regex;
use semver::Version;

const CONSTRAINT_PATTERN: &str = r"^(?P<prefix>(?:workspace:)?(?:\^|~|>=|<=|>|<|=)?\s*)(?P<version>\d+(?:\.\d+){0,2}(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?)$";

/// Moves a single-version constraint to `version`, keeping its operator.
///
/// `^1.2.0` becomes `^1.3.0`, `workspace:~1.2.0` becomes `workspace:~1.3.0`.
/// Returns `Ok(None)` for constraints without one concrete version (`*`,
/// `workspace:*`, `1.x`, compound ranges), which are left as they are.
pub fn rewrite_constraint(constraint: &str, version: &Version) -> Result<Option<String>> {
    let re = Regex::new(CONSTRAINT_PATTERN)
        .map_err(|e| Error::Release(format!("Failed to create regex: {}", e)))?;

    let trimmed = constraint.trim();
    Ok(re.captures(trimmed).and_then(|caps| {
        let prefix = caps.name("prefix").map_or("", |m| m.as_str());
        let updated = format!("{}{}", prefix, version);
        (updated != trimmed).then_some(updated)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_preserves_operator_prefix() {
        let new = v("1.3.0");
        assert_eq!(rewrite_constraint("^1.2.0", &new).unwrap().as_deref(), Some("^1.3.0"));
        assert_eq!(rewrite_constraint("~1.2.0", &new).unwrap().as_deref(), Some("~1.3.0"));
        assert_eq!(rewrite_constraint(">=1.2.0", &new).unwrap().as_deref(), Some(">=1.3.0"));
        assert_eq!(rewrite_constraint("1.2.0", &new).unwrap().as_deref(), Some("1.3.0"));
        assert_eq!(
            rewrite_constraint("workspace:^1.2.0", &new).unwrap().as_deref(),
            Some("workspace:^1.3.0")
        );
    }

    #[test]
    fn test_partial_versions_are_expanded() {
        assert_eq!(rewrite_constraint("1.2", &v("1.3.0")).unwrap().as_deref(), Some("1.3.0"));
    }

    #[test]
    fn test_leaves_wildcards_and_ranges_alone() {
        let new = v("2.0.0");
        assert_eq!(rewrite_constraint("*", &new).unwrap(), None);
        assert_eq!(rewrite_constraint("workspace:*", &new).unwrap(), None);
        assert_eq!(rewrite_constraint("1.x", &new).unwrap(), None);
        assert_eq!(rewrite_constraint(">=1.0.0 <2.0.0", &new).unwrap(), None);
    }

    #[test]
    fn test_unchanged_constraint_returns_none() {
        assert_eq!(rewrite_constraint("^2.0.0", &v("2.0.0")).unwrap(), None);
    }
}
