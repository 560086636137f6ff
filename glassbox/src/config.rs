//! Configuration for instrumentation sessions

use serde::{Deserialize, Serialize};

use crate::error::{InstrumentError, InstrumentResult};
use crate::filter::{PathFilter, Pattern};

/// Serializable instrumentation configuration
///
/// ```json
/// {
///   "enabled": true,
///   "depth_limit": 4,
///   "include": ["public", { "regex": "^api\\." }],
///   "exclude": ["public.secretField"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Whether instrumentation is applied at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum wrap distance from the root (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_limit: Option<usize>,

    /// Allow patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<PatternConfig>>,

    /// Deny patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<PatternConfig>>,
}

fn default_true() -> bool { true }

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            depth_limit: None,
            include: None,
            exclude: None,
        }
    }
}

impl InstrumentConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> InstrumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A pattern as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternConfig {
    /// Literal path prefix
    Literal(String),
    /// Regular expression
    Regex { regex: String },
}

impl PatternConfig {
    /// Compile into a matchable pattern
    pub fn compile(&self) -> InstrumentResult<Pattern> {
        match self {
            PatternConfig::Literal(path) => Ok(Pattern::literal(path.as_str())),
            PatternConfig::Regex { regex } => Pattern::regex(regex),
        }
    }
}

fn compile_all(patterns: &Option<Vec<PatternConfig>>) -> InstrumentResult<Option<Vec<Pattern>>> {
    patterns
        .as_ref()
        .map(|list| list.iter().map(PatternConfig::compile).collect())
        .transpose()
}

/// Compiled options consumed by `instrument`
#[derive(Debug, Clone)]
pub struct InstrumentOptions {
    /// `false` turns `instrument` into the identity function
    pub enabled: bool,

    /// Maximum wrap distance from the root
    pub depth_limit: Option<usize>,

    /// Allow patterns; `None` allows every accessor
    pub include: Option<Vec<Pattern>>,

    /// Deny patterns; always override allow patterns
    pub exclude: Option<Vec<Pattern>>,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            depth_limit: None,
            include: None,
            exclude: None,
        }
    }
}

impl InstrumentOptions {
    /// Options that leave every target untouched
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    pub fn with_include<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.include = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        self.exclude = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Filter built from the include/exclude sets
    pub fn filter(&self) -> PathFilter {
        PathFilter::new(self.include.clone(), self.exclude.clone())
    }
}

impl TryFrom<InstrumentConfig> for InstrumentOptions {
    type Error = InstrumentError;

    fn try_from(config: InstrumentConfig) -> InstrumentResult<Self> {
        Ok(Self {
            enabled: config.enabled,
            depth_limit: config.depth_limit,
            include: compile_all(&config.include)?,
            exclude: compile_all(&config.exclude)?,
        })
    }
}
