//! Selector registry: ordered CSS selector lists per field type.
//!
//! The registry holds the built-in defaults plus user overrides loaded from
//! persisted settings. It is injected into the pipeline rather than read from
//! global state, so two runs with different overrides never interfere.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The fields a page scrape extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Page or article title.
    Title,
    /// Byline.
    Author,
    /// Publication date.
    Date,
    /// Main content root.
    Content,
}

impl FieldType {
    /// All field types in extraction order.
    pub const ALL: [Self; 4] = [Self::Title, Self::Author, Self::Date, Self::Content];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Date => "date",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_TITLE: &[&str] = &[
    "h1.entry-title",
    "h1.post-title",
    "h1.article-title",
    "article h1",
    "[itemprop=\"headline\"]",
    "meta[property=\"og:title\"]",
    "meta[name=\"twitter:title\"]",
    "h1",
    "title",
];

const DEFAULT_AUTHOR: &[&str] = &[
    "meta[name=\"author\"]",
    "meta[property=\"article:author\"]",
    "[itemprop=\"author\"] [itemprop=\"name\"]",
    "[itemprop=\"author\"]",
    "[rel=\"author\"]",
    ".author-name",
    ".byline",
    ".author",
    ".post-author",
];

const DEFAULT_DATE: &[&str] = &[
    "meta[property=\"article:published_time\"]",
    "meta[itemprop=\"datePublished\"]",
    "meta[name=\"date\"]",
    "time[datetime]",
    "[itemprop=\"datePublished\"]",
    ".published",
    ".post-date",
    ".entry-date",
    ".date",
    "time",
];

const DEFAULT_CONTENT: &[&str] = &[
    "[itemprop=\"articleBody\"]",
    ".entry-content",
    ".post-content",
    ".article-content",
    ".article-body",
    "main article",
    "[role=\"main\"]",
    "main",
    "#content",
    ".content",
];

/// Ordered selector lists per field, defaults merged with overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRegistry {
    defaults: HashMap<FieldType, Vec<String>>,
    overrides: HashMap<FieldType, Vec<String>>,
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        let mut defaults = HashMap::new();
        defaults.insert(FieldType::Title, list(DEFAULT_TITLE));
        defaults.insert(FieldType::Author, list(DEFAULT_AUTHOR));
        defaults.insert(FieldType::Date, list(DEFAULT_DATE));
        defaults.insert(FieldType::Content, list(DEFAULT_CONTENT));
        Self {
            defaults,
            overrides: HashMap::new(),
        }
    }
}

impl SelectorRegistry {
    /// Registry with the built-in defaults only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a partial override map. A field with a non-empty override list
    /// uses that list instead of the defaults.
    #[must_use]
    pub fn with_overrides(mut self, overrides: HashMap<FieldType, Vec<String>>) -> Self {
        for (field, selectors) in overrides {
            self.set_override(field, selectors);
        }
        self
    }

    /// Parse persisted overrides, e.g. `{"title": ["h1.headline"]}`.
    pub fn from_overrides_json(json: &str) -> Result<Self> {
        let overrides: HashMap<FieldType, Vec<String>> =
            serde_json::from_str(json).map_err(Error::from)?;
        Ok(Self::default().with_overrides(overrides))
    }

    /// Replace the override list for one field. Blank entries are dropped; an
    /// empty list removes the override.
    pub fn set_override(&mut self, field: FieldType, selectors: Vec<String>) {
        let cleaned: Vec<String> = selectors
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if cleaned.is_empty() {
            self.overrides.remove(&field);
        } else {
            self.overrides.insert(field, cleaned);
        }
    }

    /// Whether the user overrode this field.
    #[must_use]
    pub fn is_overridden(&self, field: FieldType) -> bool {
        self.overrides.contains_key(&field)
    }

    /// Effective ordered selector list for a field.
    #[must_use]
    pub fn selectors(&self, field: FieldType) -> &[String] {
        self.overrides
            .get(&field)
            .or_else(|| self.defaults.get(&field))
            .map_or(&[], Vec::as_slice)
    }

    /// Built-in list for a field, ignoring overrides.
    #[must_use]
    pub fn default_selectors(&self, field: FieldType) -> &[String] {
        self.defaults.get(&field).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_field() {
        let registry = SelectorRegistry::new();
        for field in FieldType::ALL {
            assert!(!registry.selectors(field).is_empty(), "{field} has no defaults");
        }
    }

    #[test]
    fn test_override_replaces_list() {
        let mut overrides = HashMap::new();
        overrides.insert(FieldType::Title, vec!["h2.custom".to_string()]);
        let registry = SelectorRegistry::new().with_overrides(overrides);

        assert_eq!(registry.selectors(FieldType::Title), ["h2.custom".to_string()]);
        assert!(registry.is_overridden(FieldType::Title));
        assert!(!registry.is_overridden(FieldType::Author));
        assert!(registry.default_selectors(FieldType::Title).len() > 1);
    }

    #[test]
    fn test_empty_override_falls_back_to_defaults() {
        let mut registry = SelectorRegistry::new();
        registry.set_override(FieldType::Date, vec![" ".to_string()]);
        assert!(!registry.is_overridden(FieldType::Date));
        assert_eq!(
            registry.selectors(FieldType::Date),
            registry.default_selectors(FieldType::Date)
        );
    }

    #[test]
    fn test_from_overrides_json() {
        let registry =
            SelectorRegistry::from_overrides_json(r#"{"author":[".writer"," "]}"#).unwrap();
        assert_eq!(registry.selectors(FieldType::Author), [".writer".to_string()]);
    }

    #[test]
    fn test_from_overrides_json_rejects_unknown_field() {
        assert!(SelectorRegistry::from_overrides_json(r#"{"summary":["p"]}"#).is_err());
    }
}
