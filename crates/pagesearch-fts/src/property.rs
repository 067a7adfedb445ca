//! Fields that take part in a query or a summary.

use pagesearch_core::safe_alias;
use serde::{Deserialize, Serialize};

/// One document field participating in a query or summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProperty {
    /// Field name, already mapped onto the index field alphabet.
    pub name: String,

    /// Relevance weight of clauses against this field.
    pub boost_multiplier: f64,

    /// Fuzzy similarity in `(0, 1]`; `1.0` disables fuzzy matching.
    pub fuzzy_multiplier: f64,

    /// Also match terms as prefixes. Takes precedence over fuzziness.
    pub wildcard: bool,
}

impl SearchProperty {
    /// Create a property with neutral boost and no fuzziness or wildcard.
    pub fn new(name: &str) -> Self {
        Self {
            name: safe_alias(name),
            boost_multiplier: 1.0,
            fuzzy_multiplier: 1.0,
            wildcard: false,
        }
    }

    /// Set the boost multiplier.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost_multiplier = boost;
        self
    }

    /// Set the fuzzy multiplier.
    pub fn with_fuzzy(mut self, fuzzy: f64) -> Self {
        self.fuzzy_multiplier = fuzzy;
        self
    }

    /// Enable or disable prefix matching.
    pub fn with_wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Returns whether clauses get a `~fuzzy` suffix.
    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy_multiplier > 0.0 && self.fuzzy_multiplier < 1.0
    }

    /// Parse a comma-separated list of field names.
    ///
    /// Blank entries and names with no valid characters are dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagesearch_fts::SearchProperty;
    ///
    /// let props = SearchProperty::parse_list("nodeName, pageTitle,,", 10.0, 0.8, false);
    /// assert_eq!(props.len(), 2);
    /// assert_eq!(props[1].name, "pageTitle");
    /// assert_eq!(props[1].boost_multiplier, 10.0);
    /// ```
    pub fn parse_list(list: &str, boost: f64, fuzzy: f64, wildcard: bool) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                Self::new(name)
                    .with_boost(boost)
                    .with_fuzzy(fuzzy)
                    .with_wildcard(wildcard)
            })
            .filter(|p| !p.name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sanitizes_name() {
        let prop = SearchProperty::new("page title");
        assert_eq!(prop.name, "pageTitle");
        assert_eq!(prop.boost_multiplier, 1.0);
        assert!(!prop.is_fuzzy());
        assert!(!prop.wildcard);
    }

    #[test]
    fn test_is_fuzzy_bounds() {
        assert!(SearchProperty::new("a").with_fuzzy(0.8).is_fuzzy());
        assert!(!SearchProperty::new("a").with_fuzzy(1.0).is_fuzzy());
        assert!(!SearchProperty::new("a").with_fuzzy(0.0).is_fuzzy());
        assert!(!SearchProperty::new("a").with_fuzzy(1.5).is_fuzzy());
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(SearchProperty::parse_list("", 1.0, 1.0, false).is_empty());
        assert!(SearchProperty::parse_list(" , ,", 1.0, 1.0, false).is_empty());
        assert!(SearchProperty::parse_list("%%", 1.0, 1.0, false).is_empty());
    }

    #[test]
    fn test_parse_list_applies_settings() {
        let props = SearchProperty::parse_list("bodyText,summary", 1.0, 0.7, true);
        assert_eq!(props.len(), 2);
        assert!(props.iter().all(|p| p.wildcard && p.fuzzy_multiplier == 0.7));
    }
}
