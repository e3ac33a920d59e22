//! Loader configuration: the element-to-level table and metadata paths.
//!
//! Both tables are static for a run: built once (from the compiled-in
//! defaults or a deserialized config file), validated, then shared
//! immutably across every document build. The compiled-in defaults
//! reproduce the customary TEI profile: generic `div` elements resolve to
//! division levels by nesting depth, and header/heading/speaker text is
//! harvested into document, division and paragraph metadata.

use std::collections::HashMap;

use phf::phf_map;
use serde::Deserialize;
use thiserror::Error;

use crate::meta::MetaPaths;
use crate::vector::Level;

/// What a mapped element opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementClass {
    /// The next division level below the innermost open division,
    /// saturating at div3.
    Division,
    Div1,
    Div2,
    Div3,
    Para,
}

impl ElementClass {
    /// Resolve to a concrete level given the innermost open division.
    pub fn resolve(self, innermost_division: Option<Level>) -> Level {
        match self {
            ElementClass::Division => match innermost_division {
                None => Level::Div1,
                Some(Level::Div1) => Level::Div2,
                Some(_) => Level::Div3,
            },
            ElementClass::Div1 => Level::Div1,
            ElementClass::Div2 => Level::Div2,
            ElementClass::Div3 => Level::Div3,
            ElementClass::Para => Level::Para,
        }
    }
}

/// Default TEI element classes, compiled in.
static DEFAULT_ELEMENT_CLASSES: phf::Map<&'static str, ElementClass> = phf_map! {
    "front" => ElementClass::Division,
    "div" => ElementClass::Division,
    "div0" => ElementClass::Division,
    "div1" => ElementClass::Division,
    "div2" => ElementClass::Division,
    "div3" => ElementClass::Division,
    "p" => ElementClass::Para,
    "sp" => ElementClass::Para,
    "stage" => ElementClass::Para,
};

/// Configuration problems caught by the startup validation pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Two same-level patterns with different destinations can claim the
    /// same context, so evaluation order would pick the winner.
    #[error("ambiguous metadata patterns at level {level}: {first:?} vs {second:?}")]
    AmbiguousPatterns {
        level: &'static str,
        first: String,
        second: String,
    },

    /// An empty pattern would claim every text node at its level.
    #[error("empty metadata pattern at level {level} (field {field:?})")]
    EmptyPattern { level: &'static str, field: String },
}

/// Static configuration for a load run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Element whose closing tag ends the document object.
    pub root_element: String,

    /// Line-marker element. It never opens a hierarchy object; it advances
    /// the parallel line counter and emits a line-synchronization record.
    pub line_element: String,

    /// Attribute of the line element carrying an explicit line number.
    pub line_number_attr: String,

    /// Element name to hierarchy class table.
    pub levels: HashMap<String, ElementClass>,

    /// Per-level metadata paths.
    pub metadata: MetaPaths,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let levels = DEFAULT_ELEMENT_CLASSES
            .entries()
            .map(|(name, class)| (name.to_string(), *class))
            .collect();

        let mut metadata = MetaPaths::new();
        metadata.insert(Level::Doc, "titleStmt/author", "author");
        metadata.insert(Level::Doc, "titleStmt/title", "title");
        for level in [Level::Div1, Level::Div2, Level::Div3] {
            metadata.insert(level, "head", "head");
        }
        metadata.insert(Level::Para, "speaker", "who");

        LoaderConfig {
            root_element: "TEI".to_string(),
            line_element: "l".to_string(),
            line_number_attr: "n".to_string(),
            levels,
            metadata,
        }
    }
}

impl LoaderConfig {
    /// Hierarchy class of an element, if it is mapped.
    #[inline]
    pub fn class_of(&self, element: &str) -> Option<ElementClass> {
        self.levels.get(element).copied()
    }

    /// Startup validation pass.
    ///
    /// Rejects per-level pattern sets whose evaluation order could change
    /// the harvested result: empty patterns, and pattern pairs with
    /// different destination fields where either pattern subsequence-matches
    /// the other's steps (both could claim one context). Run this once when
    /// the configuration is assembled; ambiguity is a configuration defect,
    /// not a parse-time condition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for level in Level::ALL {
            let patterns = self.metadata.for_level(level);
            for (path, field) in patterns {
                if path.steps().is_empty() {
                    return Err(ConfigError::EmptyPattern {
                        level: level.label(),
                        field: field.clone(),
                    });
                }
            }
            for (i, (first, first_field)) in patterns.iter().enumerate() {
                for (second, second_field) in &patterns[i + 1..] {
                    if first_field == second_field {
                        continue;
                    }
                    if first.matches(second.steps()) || second.matches(first.steps()) {
                        return Err(ConfigError::AmbiguousPatterns {
                            level: level.label(),
                            first: first.to_string(),
                            second: second.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let config = LoaderConfig::default();
        assert_eq!(config.class_of("div1"), Some(ElementClass::Division));
        assert_eq!(config.class_of("front"), Some(ElementClass::Division));
        assert_eq!(config.class_of("sp"), Some(ElementClass::Para));
        assert_eq!(config.class_of("teiHeader"), None);
        assert_eq!(config.root_element, "TEI");
        assert_eq!(config.line_element, "l");
    }

    #[test]
    fn test_default_config_validates() {
        assert_eq!(LoaderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_division_resolution() {
        assert_eq!(ElementClass::Division.resolve(None), Level::Div1);
        assert_eq!(ElementClass::Division.resolve(Some(Level::Div1)), Level::Div2);
        assert_eq!(ElementClass::Division.resolve(Some(Level::Div2)), Level::Div3);
        // Saturates: a fourth nesting level re-opens div3.
        assert_eq!(ElementClass::Division.resolve(Some(Level::Div3)), Level::Div3);
        assert_eq!(ElementClass::Div2.resolve(None), Level::Div2);
    }

    #[test]
    fn test_ambiguous_patterns_rejected() {
        let mut config = LoaderConfig::default();
        // "head" subsequence-matches "div/head": both can claim one context
        // with different destinations.
        config.metadata.insert(Level::Div1, "div/head", "title");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousPatterns { level: "div1", .. }));
    }

    #[test]
    fn test_same_destination_overlap_allowed() {
        let mut config = LoaderConfig::default();
        config.metadata.insert(Level::Div1, "div/head", "head");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let mut config = LoaderConfig::default();
        config.metadata.insert(Level::Para, "", "who");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPattern { level: "para", .. }));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let yaml = "\
root_element: TEI.2
levels:
  div: division
  p: para
metadata:
  doc:
    titleStmt/title: title
";
        let config: LoaderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.root_element, "TEI.2");
        // Missing fields keep their defaults.
        assert_eq!(config.line_element, "l");
        assert_eq!(config.class_of("div"), Some(ElementClass::Division));
        assert_eq!(config.class_of("sp"), None);
        assert_eq!(config.metadata.for_level(Level::Doc).len(), 1);
        assert_eq!(config.validate(), Ok(()));
    }
}
