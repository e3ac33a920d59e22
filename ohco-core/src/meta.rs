//! Metadata path patterns and context matching.
//!
//! A metadata path is a `/`-separated sequence of element names. It matches
//! an element context when each step, taken in order, occurs in the context,
//! every match anchoring the search for the next step at the matched
//! position. The test is a subsequence test - neither contiguous nor
//! tail-anchored: `titleStmt/author` matches the context
//! `[teiHeader, fileDesc, titleStmt, author]`.
//!
//! Patterns are registered per hierarchy level and evaluated in declaration
//! order. Two same-level patterns that can claim the same context with
//! different destinations make the harvested result order-dependent; the
//! configuration validation pass rejects such pairs up front (see
//! [`crate::config::LoaderConfig::validate`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::vector::{Level, LEVEL_COUNT};

/// A parsed metadata path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPath {
    steps: Vec<String>,
    attribute: Option<String>,
}

impl MetaPath {
    /// Parse a `a/b/c` pattern. Empty segments are dropped, so `a//b`
    /// parses the same as `a/b`. A trailing `@attr` segment is split off
    /// and carried separately.
    pub fn parse(pattern: &str) -> Self {
        let mut steps: Vec<String> = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let attribute = if steps.last().is_some_and(|last| last.starts_with('@')) {
            steps.pop().map(|last| last[1..].to_string())
        } else {
            None
        };
        MetaPath { steps, attribute }
    }

    /// The element-name steps of the pattern.
    #[inline]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Trailing `@attribute` leaf, if the pattern carried one.
    ///
    /// Parsed and stored but not applied during matching: attribute-leaf
    /// harvesting is an interface stub without behavior.
    #[inline]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Anchored-subsequence match against an element context.
    ///
    /// Each step is searched for in the remaining context window; a match
    /// re-anchors the window at the matched element (inclusive), so later
    /// steps may not precede earlier ones.
    pub fn matches(&self, context: &[String]) -> bool {
        let mut window = context;
        for step in &self.steps {
            match window.iter().position(|element| element == step) {
                Some(at) => window = &window[at..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for MetaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.steps.join("/"))?;
        if let Some(attribute) = &self.attribute {
            if !self.steps.is_empty() {
                f.write_str("/")?;
            }
            write!(f, "@{}", attribute)?;
        }
        Ok(())
    }
}

/// Per-level pattern registries mapping context patterns to destination
/// field names. Declaration order is evaluation order.
#[derive(Debug, Clone, Default)]
pub struct MetaPaths {
    by_level: [Vec<(MetaPath, String)>; LEVEL_COUNT],
}

impl MetaPaths {
    pub fn new() -> Self {
        MetaPaths::default()
    }

    /// Register a pattern for one hierarchy level.
    pub fn insert(&mut self, level: Level, pattern: &str, field: &str) {
        self.by_level[level.index()].push((MetaPath::parse(pattern), field.to_string()));
    }

    /// Patterns registered for a level, in declaration order.
    #[inline]
    pub fn for_level(&self, level: Level) -> &[(MetaPath, String)] {
        &self.by_level[level.index()]
    }

    /// Check if no patterns are registered at any level.
    pub fn is_empty(&self) -> bool {
        self.by_level.iter().all(Vec::is_empty)
    }
}

impl<'de> Deserialize<'de> for MetaPaths {
    /// Deserializes from a level-keyed map of `pattern: field` entries:
    ///
    /// ```yaml
    /// doc:
    ///   titleStmt/title: title
    /// div1:
    ///   head: head
    /// ```
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<Level, BTreeMap<String, String>> =
            Deserialize::deserialize(deserializer)?;
        let mut paths = MetaPaths::new();
        for (level, entries) in raw {
            for (pattern, field) in entries {
                paths.insert(level, &pattern, &field);
            }
        }
        Ok(paths)
    }
}
