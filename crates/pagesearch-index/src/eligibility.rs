//! Which nodes contribute text to the index.

use std::fmt;

use pagesearch_core::SearchConfig;

use crate::node::ContentNode;

/// Why a node was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The node is not published.
    Unpublished,
    /// The node is in the recycle bin.
    Trashed,
    /// The node has no template, so there is nothing to render.
    NoTemplate,
    /// The node type is listed in `excluded_node_types`.
    ExcludedType(String),
    /// A hide property is set on the node.
    HiddenByProperty(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unpublished => f.write_str("not published"),
            Rejection::Trashed => f.write_str("in the recycle bin"),
            Rejection::NoTemplate => f.write_str("no template"),
            Rejection::ExcludedType(alias) => write!(f, "node type '{alias}' is excluded"),
            Rejection::HiddenByProperty(name) => write!(f, "hidden by property '{name}'"),
        }
    }
}

/// Eligibility rules taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct Eligibility {
    excluded_node_types: Vec<String>,
    hide_properties: Vec<String>,
}

impl Eligibility {
    /// Create rules from explicit lists.
    pub fn new<T, P>(excluded_node_types: T, hide_properties: P) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            excluded_node_types: excluded_node_types.into_iter().map(Into::into).collect(),
            hide_properties: hide_properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Create rules from the configured exclusion lists.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.excluded_node_types.iter().cloned(),
            config.disable_search_property_names.iter().cloned(),
        )
    }

    /// Check a node, returning the first reason it must be skipped.
    pub fn check(&self, node: &ContentNode) -> Result<(), Rejection> {
        if !node.published {
            return Err(Rejection::Unpublished);
        }
        if node.trashed {
            return Err(Rejection::Trashed);
        }
        if !node.has_template() {
            return Err(Rejection::NoTemplate);
        }
        if self
            .excluded_node_types
            .iter()
            .any(|alias| *alias == node.node_type_alias)
        {
            return Err(Rejection::ExcludedType(node.node_type_alias.clone()));
        }
        if let Some(name) = self.hidden_by(node) {
            return Err(Rejection::HiddenByProperty(name.to_string()));
        }
        Ok(())
    }

    /// The first configured hide property that is set on the node.
    pub fn hidden_by(&self, node: &ContentNode) -> Option<&str> {
        self.hide_properties
            .iter()
            .find(|name| node.property(name).is_some_and(is_truthy))
            .map(String::as_str)
    }
}

/// Whether a property value switches a flag on. Blank, `0` and `false`
/// are off.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rules() -> Eligibility {
        Eligibility::new(["Folder"], ["umbracoNaviHide", "hideFromSearch"])
    }

    fn page() -> ContentNode {
        ContentNode::new(1050, "Home", "Home").with_template(3)
    }

    #[test]
    fn test_eligible_page() {
        assert_eq!(rules().check(&page()), Ok(()));
    }

    #[test]
    fn test_rejections_in_order() {
        let rules = rules();
        assert_eq!(
            rules.check(&page().unpublished().trashed()),
            Err(Rejection::Unpublished)
        );
        assert_eq!(rules.check(&page().trashed()), Err(Rejection::Trashed));
        assert_eq!(
            rules.check(&ContentNode::new(1, "A", "Home")),
            Err(Rejection::NoTemplate)
        );
        assert_eq!(
            rules.check(&ContentNode::new(1, "A", "Folder").with_template(3)),
            Err(Rejection::ExcludedType("Folder".to_string()))
        );
        assert_eq!(
            rules.check(&page().with_property("hideFromSearch", "1")),
            Err(Rejection::HiddenByProperty("hideFromSearch".to_string()))
        );
    }

    #[test]
    fn test_template_zero_is_never_eligible() {
        let node = ContentNode::new(1, "A", "Page").with_template(0);
        assert_eq!(rules().check(&node), Err(Rejection::NoTemplate));
    }

    #[test]
    fn test_hide_property_values() {
        let rules = rules();
        for off in ["", "0", "false", "False", " "] {
            let node = page().with_property("umbracoNaviHide", off);
            assert!(rules.check(&node).is_ok(), "value {off:?} should not hide");
        }
        for on in ["1", "true", "yes"] {
            let node = page().with_property("umbracoNaviHide", on);
            assert!(rules.check(&node).is_err(), "value {on:?} should hide");
        }
    }

    #[test]
    fn test_from_config() {
        let config = SearchConfig {
            excluded_node_types: vec!["Redirect".to_string()],
            ..SearchConfig::default()
        };
        let node = ContentNode::new(1, "A", "Redirect").with_template(1);
        assert!(Eligibility::from_config(&config).check(&node).is_err());
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            Rejection::HiddenByProperty("x".to_string()).to_string(),
            "hidden by property 'x'"
        );
    }

    proptest! {
        #[test]
        fn prop_templateless_node_never_eligible(
            template in prop_oneof![Just(None), (-5i32..=0).prop_map(Some)],
            published in any::<bool>(),
            trashed in any::<bool>(),
        ) {
            let mut node = ContentNode::new(1050, "Home", "Home");
            node.template_id = template;
            node.published = published;
            node.trashed = trashed;
            prop_assert!(rules().check(&node).is_err());
        }

        #[test]
        fn prop_zero_and_blank_never_hide(value in prop_oneof![
            Just("0".to_string()),
            Just("FALSE".to_string()),
            "[ \t]{0,3}",
        ]) {
            prop_assert!(!is_truthy(&value));
        }
    }
}
