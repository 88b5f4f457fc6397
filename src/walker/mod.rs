//! Finds translatable content under a root and substitutes it in place.
/// Skip policy
pub mod policy;
/// Original-text side table
pub mod shadow;

use std::ops::AddAssign;

pub use policy::SkipPolicy;
pub use shadow::ShadowMap;

use crate::dom::{
    Document,
    NodeId,
};
use crate::phrase::{
    find_partial_translation,
    is_untranslatable,
    split_whitespace_edges,
};
use crate::store::TranslationMap;

/// Attributes translated on every element (exact match only).
const TRANSLATED_ATTRIBUTES: [&str; 4] = ["placeholder", "title", "aria-label", "alt"];

/// `input` types whose `value` is a visible label.
const BUTTON_INPUT_TYPES: [&str; 3] = ["button", "submit", "reset"];

/// Counters for one walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Text nodes holding translatable text.
    pub text_nodes: usize,
    /// Text nodes whose value changed.
    pub substituted: usize,
    /// Attributes whose value changed.
    pub attributes: usize,
}

impl AddAssign for WalkStats {
    fn add_assign(&mut self, other: Self) {
        self.text_nodes += other.text_nodes;
        self.substituted += other.substituted;
        self.attributes += other.attributes;
    }
}

/// What happened to one text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOutcome {
    /// Empty, numeric or punctuation only.
    Skipped,
    /// Looked up, nothing changed.
    Unchanged,
    /// Value replaced.
    Substituted,
}

/// DOM walker holding the skip policy and the original-text shadow map.
#[derive(Debug, Default)]
pub struct Walker {
    /// Excluded elements.
    policy: SkipPolicy,
    /// Source text of visited nodes.
    shadow: ShadowMap,
}

impl Walker {
    #[must_use]
    pub fn new(policy: SkipPolicy) -> Self {
        Self { policy, shadow: ShadowMap::new() }
    }

    #[must_use]
    pub const fn policy(&self) -> &SkipPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn shadow(&self) -> &ShadowMap {
        &self.shadow
    }

    /// Translates `root`'s attributes and every text node and element
    /// attribute in its subtree, pruning excluded subtrees.
    ///
    /// Nodes are collected before anything is mutated. A text-node `root` is
    /// translated on its own.
    pub fn translate_element(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        map: &TranslationMap,
    ) -> WalkStats {
        let mut stats = WalkStats::default();
        if !self.policy.accepts_in_context(doc, root) {
            tracing::trace!(node = %root, "Root excluded from translation");
            return stats;
        }

        let policy = &self.policy;
        let nodes = doc.collect_pruned(root, |doc, id| policy.accepts(doc, id));

        for node in nodes {
            if doc.is_element(node) {
                stats.attributes += self.translate_attributes(doc, node, map);
                continue;
            }
            match self.substitute_text(doc, node, map) {
                TextOutcome::Skipped => {}
                TextOutcome::Unchanged => stats.text_nodes += 1,
                TextOutcome::Substituted => {
                    stats.text_nodes += 1;
                    stats.substituted += 1;
                }
            }
        }
        tracing::trace!(node = %root, ?stats, "Walk finished");
        stats
    }

    /// Substitutes a single text node unless it lies inside an excluded
    /// subtree. Returns whether the value changed.
    pub fn translate_text_node(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        map: &TranslationMap,
    ) -> bool {
        if doc.is_element(node) || !self.policy.accepts_in_context(doc, node) {
            return false;
        }
        self.substitute_text(doc, node, map) == TextOutcome::Substituted
    }

    /// Puts every node still showing a translation back to its source text.
    pub fn restore_originals(&mut self, doc: &mut Document) -> usize {
        let restored = self.shadow.restore(doc);
        tracing::debug!(restored, "Restored original text");
        restored
    }

    /// Forgets the shadow entries of a removed subtree.
    pub fn forget(&mut self, doc: &Document, root: NodeId) -> usize {
        self.shadow.evict_subtree(doc, root)
    }

    /// Exact lookup on the trimmed value, then partial substitution.
    fn substitute_text(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        map: &TranslationMap,
    ) -> TextOutcome {
        let Some(current) = doc.text(node) else {
            return TextOutcome::Skipped;
        };
        let (leading, core, trailing) = split_whitespace_edges(current);
        if is_untranslatable(core) {
            return TextOutcome::Skipped;
        }
        self.shadow.observe(node, current);

        // An exact hit ends the lookup even when it maps to itself.
        let replacement = match map.get(core) {
            Some(translation) if translation == core => return TextOutcome::Unchanged,
            Some(translation) => translation.to_string(),
            None => match find_partial_translation(core, map) {
                Some(translation) => translation,
                None => return TextOutcome::Unchanged,
            },
        };

        let value = format!("{leading}{replacement}{trailing}");
        self.shadow.mark_applied(node, &value);
        if doc.set_text(node, value) {
            TextOutcome::Substituted
        } else {
            TextOutcome::Unchanged
        }
    }

    /// Exact lookup of the labelled attributes of `element`.
    fn translate_attributes(
        &mut self,
        doc: &mut Document,
        element: NodeId,
        map: &TranslationMap,
    ) -> usize {
        let mut changed = 0;
        for name in translatable_attributes(doc, element) {
            let Some(current) = doc.attribute(element, name) else {
                continue;
            };
            let trimmed = current.trim();
            if is_untranslatable(trimmed) {
                continue;
            }
            self.shadow.observe_attribute(element, name, current);
            let Some(translation) = map.get(trimmed).filter(|t| *t != trimmed) else {
                continue;
            };
            let translation = translation.to_string();
            self.shadow.mark_attribute_applied(element, name, &translation);
            match doc.set_attribute(element, name, translation) {
                Ok(()) => changed += 1,
                Err(error) => tracing::debug!(%error, "Attribute not translated"),
            }
        }
        changed
    }
}

/// Attribute names of `element` eligible for translation.
fn translatable_attributes(doc: &Document, element: NodeId) -> Vec<&'static str> {
    let mut names = TRANSLATED_ATTRIBUTES.to_vec();
    let has_label_value = match doc.tag(element) {
        Some("button") => true,
        Some("input") => doc.attribute(element, "type").is_some_and(|kind| {
            BUTTON_INPUT_TYPES.iter().any(|button| kind.trim().eq_ignore_ascii_case(button))
        }),
        _ => false,
    };
    if has_label_value {
        names.push("value");
    }
    names
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[fixture]
    fn map() -> TranslationMap {
        [
            ("Hello", "你好"),
            ("Hosts", "主机"),
            ("Search", "搜索"),
            ("Submit", "提交"),
            ("log in", "登录"),
            ("log", "日志"),
            ("OK", "OK"),
        ]
        .into_iter()
        .collect()
    }

    fn page_text(doc: &Document) -> Vec<String> {
        doc.descendants(doc.body())
            .into_iter()
            .filter_map(|id| doc.text(id).map(str::to_string))
            .collect()
    }

    #[rstest]
    #[case("  Hello  ", "  你好  ")]
    #[case("\n\tHello\n", "\n\t你好\n")]
    #[case("Please log in now", "Please 登录 now")]
    #[case(" 123 ", " 123 ")]
    #[case("---", "---")]
    #[case("Unknown phrase", "Unknown phrase")]
    #[case("OK", "OK")]
    fn text_substitution(map: TranslationMap, #[case] source: &str, #[case] expected: &str) {
        let mut doc = Document::new();
        let text = doc.append_text(doc.body(), source).unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        walker.translate_element(&mut doc, body, &map);

        assert_eq!(doc.text(text), Some(expected));
    }

    #[rstest]
    fn empty_translation_leaves_text_alone() {
        let map: TranslationMap = [("Hosts", ""), ("Search", "")].into_iter().collect();
        let mut doc = Document::new();
        let text = doc.append_text(doc.body(), " Hosts ").unwrap();
        let input = doc.append_element(doc.body(), "input").unwrap();
        doc.set_attribute(input, "placeholder", "Search").unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        let stats = walker.translate_element(&mut doc, body, &map);

        assert_eq!(doc.text(text), Some(" Hosts "));
        assert_eq!(doc.attribute(input, "placeholder"), Some("Search"));
        assert_that!(stats.substituted, eq(0));
    }

    #[rstest]
    fn untranslatable_text_is_not_recorded(map: TranslationMap) {
        let mut doc = Document::new();
        doc.append_text(doc.body(), "123").unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        let stats = walker.translate_element(&mut doc, body, &map);

        assert_that!(stats.text_nodes, eq(0));
        assert_that!(walker.shadow().is_empty(), eq(true));
    }

    #[rstest]
    fn second_pass_changes_nothing(map: TranslationMap) {
        let mut doc = Document::new();
        let div = doc.append_element(doc.body(), "div").unwrap();
        doc.append_text(div, " Hosts ").unwrap();
        doc.append_text(div, "log in to view logs").unwrap();
        let input = doc.append_element(div, "input").unwrap();
        doc.set_attribute(input, "placeholder", "Search").unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        let first = walker.translate_element(&mut doc, body, &map);
        let after_first = doc.to_snapshot();
        let second = walker.translate_element(&mut doc, body, &map);

        assert_that!(first.substituted, eq(2));
        assert_that!(second.substituted, eq(0));
        assert_that!(second.attributes, eq(0));
        assert_eq!(doc.to_snapshot(), after_first);
    }

    #[rstest]
    #[case("script")]
    #[case("style")]
    #[case("textarea")]
    fn excluded_subtree_is_untouched(map: TranslationMap, #[case] tag: &str) {
        let mut doc = Document::new();
        let translated = doc.append_text(doc.body(), "Hosts").unwrap();
        let excluded = doc.append_element(doc.body(), tag).unwrap();
        let hidden = doc.append_text(excluded, "Hosts").unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        walker.translate_element(&mut doc, body, &map);

        assert_eq!(doc.text(translated), Some("主机"));
        assert_eq!(doc.text(hidden), Some("Hosts"));
        assert_eq!(walker.shadow().original(hidden), None);
    }

    #[rstest]
    fn marked_descendant_is_pruned(map: TranslationMap) {
        let mut doc = Document::new();
        let panel = doc.append_element(doc.body(), "div").unwrap();
        let code = doc.append_element(panel, "span").unwrap();
        doc.set_attribute(code, "class", "no-translate").unwrap();
        let nested = doc.append_element(code, "b").unwrap();
        let hidden = doc.append_text(nested, "Hello").unwrap();
        let mut walker = Walker::default();

        walker.translate_element(&mut doc, panel, &map);
        let direct = walker.translate_text_node(&mut doc, hidden, &map);
        walker.translate_element(&mut doc, nested, &map);

        assert_that!(direct, eq(false));
        assert_eq!(doc.text(hidden), Some("Hello"));
    }

    #[rstest]
    fn attributes_are_exact_only(map: TranslationMap) {
        let mut doc = Document::new();
        let exact = doc.append_element(doc.body(), "input").unwrap();
        doc.set_attribute(exact, "placeholder", "Search").unwrap();
        let partial = doc.append_element(doc.body(), "input").unwrap();
        doc.set_attribute(partial, "placeholder", "Search here").unwrap();
        let mut walker = Walker::default();

        let body = doc.body();
        let stats = walker.translate_element(&mut doc, body, &map);

        assert_eq!(doc.attribute(exact, "placeholder"), Some("搜索"));
        assert_eq!(doc.attribute(partial, "placeholder"), Some("Search here"));
        assert_that!(stats.attributes, eq(1));
    }

    #[rstest]
    #[case("button", None, "提交")]
    #[case("input", Some("submit"), "提交")]
    #[case("input", Some("RESET"), "提交")]
    #[case("input", Some("text"), "Submit")]
    #[case("option", None, "Submit")]
    fn value_only_on_buttons(
        map: TranslationMap,
        #[case] tag: &str,
        #[case] kind: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut doc = Document::new();
        let element = doc.append_element(doc.body(), tag).unwrap();
        doc.set_attribute(element, "value", "Submit").unwrap();
        if let Some(kind) = kind {
            doc.set_attribute(element, "type", kind).unwrap();
        }
        let mut walker = Walker::default();

        let body = doc.body();
        walker.translate_element(&mut doc, body, &map);

        assert_eq!(doc.attribute(element, "value"), Some(expected));
    }

    #[rstest]
    fn restore_then_translate_with_new_map(map: TranslationMap) {
        let mut doc = Document::new();
        let title = doc.append_element(doc.body(), "h1").unwrap();
        doc.set_attribute(title, "title", "Search").unwrap();
        doc.append_text(title, "Hosts").unwrap();
        let mut walker = Walker::default();
        let body = doc.body();
        walker.translate_element(&mut doc, body, &map);
        let english: TranslationMap = [("Hosts", "Hosts")].into_iter().collect();

        let restored = walker.restore_originals(&mut doc);
        walker.translate_element(&mut doc, body, &english);

        assert_that!(restored, eq(2));
        assert_eq!(page_text(&doc), vec!["Hosts".to_string()]);
        assert_eq!(doc.attribute(title, "title"), Some("Search"));
    }

    #[rstest]
    fn forget_evicts_removed_nodes(map: TranslationMap) {
        let mut doc = Document::new();
        let div = doc.append_element(doc.body(), "div").unwrap();
        doc.append_text(div, "Hosts").unwrap();
        let mut walker = Walker::default();
        let body = doc.body();
        walker.translate_element(&mut doc, body, &map);

        doc.remove(div).unwrap();

        assert_that!(walker.forget(&doc, div), eq(1));
        assert_that!(walker.shadow().is_empty(), eq(true));
    }
}
