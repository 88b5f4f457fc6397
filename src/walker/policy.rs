//! Which elements the walker leaves alone.

use std::collections::HashSet;

use crate::config::SkipConfig;
use crate::dom::{
    Document,
    NodeId,
};

/// Excludes non-content tags, explicitly marked elements and editable
/// regions.
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    /// Lowercase tag names never entered.
    tags: HashSet<String>,
    /// Marker classes.
    classes: Vec<String>,
    /// Marker attribute.
    attribute: String,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::from_config(&SkipConfig::default())
    }
}

impl SkipPolicy {
    #[must_use]
    pub fn from_config(config: &SkipConfig) -> Self {
        Self {
            tags: config.tags.iter().map(|tag| tag.trim().to_ascii_lowercase()).collect(),
            classes: config.classes.clone(),
            attribute: config.attribute.clone(),
        }
    }

    /// Attribute that excludes an element when present.
    #[must_use]
    pub fn marker_attribute(&self) -> &str {
        &self.attribute
    }

    /// Whether `element` and its subtree may be translated. Only the element
    /// itself is checked, not its ancestors.
    #[must_use]
    pub fn accepts(&self, doc: &Document, element: NodeId) -> bool {
        let Some(data) = doc.element(element) else {
            return true;
        };
        if self.tags.contains(&data.tag) {
            return false;
        }
        if data.attributes.contains_key(&self.attribute)
            || data.attributes.get("translate").is_some_and(|value| value == "no")
        {
            return false;
        }
        if data.classes().any(|class| self.classes.iter().any(|marker| marker == class)) {
            return false;
        }
        !is_editable(data.tag.as_str(), data.attributes.get("contenteditable").map(String::as_str))
    }

    /// Whether `node` lies outside every excluded subtree: the node itself
    /// (if an element) and all its ancestors are accepted.
    #[must_use]
    pub fn accepts_in_context(&self, doc: &Document, node: NodeId) -> bool {
        self.accepts(doc, node) && doc.ancestors(node).all(|ancestor| self.accepts(doc, ancestor))
    }
}

/// Live-editable elements hold user input, not page text.
fn is_editable(tag: &str, contenteditable: Option<&str>) -> bool {
    tag == "textarea"
        || contenteditable.is_some_and(|value| !value.trim().eq_ignore_ascii_case("false"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn element_with(tag: &str, attributes: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let id = doc.append_element(doc.body(), tag).unwrap();
        for (name, value) in attributes {
            doc.set_attribute(id, name, *value).unwrap();
        }
        (doc, id)
    }

    #[rstest]
    #[case("script", &[])]
    #[case("STYLE", &[])]
    #[case("iframe", &[])]
    #[case("textarea", &[])]
    #[case("div", &[("class", "panel no-translate")])]
    #[case("div", &[("class", "notranslate")])]
    #[case("span", &[("data-no-translate", "")])]
    #[case("span", &[("translate", "no")])]
    #[case("div", &[("contenteditable", "true")])]
    #[case("div", &[("contenteditable", "")])]
    fn rejected(#[case] tag: &str, #[case] attributes: &[(&str, &str)]) {
        let (doc, id) = element_with(tag, attributes);

        assert_that!(SkipPolicy::default().accepts(&doc, id), eq(false));
    }

    #[rstest]
    #[case("div", &[])]
    #[case("button", &[("class", "btn")])]
    #[case("div", &[("contenteditable", "false")])]
    #[case("span", &[("translate", "yes")])]
    fn accepted(#[case] tag: &str, #[case] attributes: &[(&str, &str)]) {
        let (doc, id) = element_with(tag, attributes);

        assert_that!(SkipPolicy::default().accepts(&doc, id), eq(true));
    }

    #[rstest]
    fn context_includes_ancestors() {
        let (mut doc, code) = element_with("div", &[("class", "no-translate")]);
        let inner = doc.append_element(code, "span").unwrap();
        let text = doc.append_text(inner, "Hosts").unwrap();
        let policy = SkipPolicy::default();

        assert_that!(policy.accepts(&doc, inner), eq(true));
        assert_that!(policy.accepts_in_context(&doc, inner), eq(false));
        assert_that!(policy.accepts_in_context(&doc, text), eq(false));
    }

    #[rstest]
    fn configured_tags_are_normalized() {
        let config = SkipConfig { tags: vec![" PRE ".to_string()], ..SkipConfig::default() };
        let (doc, id) = element_with("pre", &[]);

        assert_that!(SkipPolicy::from_config(&config).accepts(&doc, id), eq(false));
    }
}
