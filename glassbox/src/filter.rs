//! Accessor filtering with allow/deny patterns
//!
//! A literal pattern names a subtree: `public` matches `public`,
//! `public.id` and `public[0]` but not `publicKey`. A regex pattern is
//! searched anywhere in the accessor. Deny always overrides allow.

use regex::Regex;

use crate::error::{InstrumentError, InstrumentResult};

/// One allow or deny rule
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact accessor or path prefix
    Literal(String),
    /// Unanchored search against the full accessor
    Regex(Regex),
}

impl Pattern {
    pub fn literal(path: impl Into<String>) -> Self {
        Pattern::Literal(path.into())
    }

    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> InstrumentResult<Self> {
        Regex::new(pattern)
            .map(Pattern::Regex)
            .map_err(|e| InstrumentError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Check an accessor against this pattern
    pub fn matches(&self, accessor: &str) -> bool {
        match self {
            Pattern::Literal(prefix) => match accessor.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
                None => false,
            },
            Pattern::Regex(regex) => regex.is_match(accessor),
        }
    }
}

impl From<&str> for Pattern {
    fn from(path: &str) -> Self {
        Pattern::literal(path)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Regex(regex)
    }
}

/// Allow/deny policy over accessor strings
///
/// `include: None` allows everything; `Some(vec![])` allows nothing.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Option<Vec<Pattern>>,
    exclude: Option<Vec<Pattern>>,
}

impl PathFilter {
    pub fn new(include: Option<Vec<Pattern>>, exclude: Option<Vec<Pattern>>) -> Self {
        Self { include, exclude }
    }

    /// Filter that reports everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn include(&self) -> Option<&[Pattern]> {
        self.include.as_deref()
    }

    pub fn exclude(&self) -> Option<&[Pattern]> {
        self.exclude.as_deref()
    }

    /// Whether events for `accessor` should reach the observer
    pub fn should_report(&self, accessor: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.iter().any(|p| p.matches(accessor)) {
                return false;
            }
        }

        match &self.exclude {
            Some(exclude) => !exclude.iter().any(|p| p.matches(accessor)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_prefix_semantics() {
        let p = Pattern::literal("public");
        assert!(p.matches("public"));
        assert!(p.matches("public.id"));
        assert!(p.matches("public[0]"));
        assert!(p.matches(r#"public["x-y"]"#));
        assert!(!p.matches("publicKey"));
        assert!(!p.matches("private.public"));
    }

    #[test]
    fn test_regex_is_searched() {
        let p = Pattern::regex(r"secret").unwrap();
        assert!(p.matches("user.secretToken"));
        assert!(!p.matches("user.name"));

        let anchored = Pattern::regex(r"^user\.").unwrap();
        assert!(anchored.matches("user.name"));
        assert!(!anchored.matches("admin.user.name"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = Pattern::regex("(unclosed").unwrap_err();
        assert!(matches!(err, InstrumentError::InvalidPattern { .. }));
    }

    #[test]
    fn test_no_patterns_reports_everything() {
        let filter = PathFilter::allow_all();
        assert!(filter.should_report(""));
        assert!(filter.should_report("anything.at.all"));
    }

    #[test]
    fn test_empty_include_reports_nothing() {
        let filter = PathFilter::new(Some(vec![]), None);
        assert!(!filter.should_report("a"));
    }

    #[test]
    fn test_include_then_exclude() {
        let filter = PathFilter::new(
            Some(vec!["public".into()]),
            Some(vec!["public.secretField".into()]),
        );
        assert!(filter.should_report("public.id"));
        assert!(!filter.should_report("private.key"));
        assert!(!filter.should_report("public.secretField"));
        assert!(!filter.should_report("public.secretField.inner"));
        assert!(filter.should_report("public.secretFieldName"));
    }

    #[test]
    fn test_deny_overrides_allow() {
        let filter = PathFilter::new(
            Some(vec!["config".into()]),
            Some(vec![Pattern::regex("config").unwrap()]),
        );
        assert!(!filter.should_report("config.port"));
    }
}
