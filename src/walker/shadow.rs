//! Side table remembering the source text of visited nodes.

use std::collections::{
    HashMap,
    HashSet,
};

use crate::dom::{
    Document,
    NodeId,
};

/// What a shadow entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    /// Character data of a text node.
    Text(NodeId),
    /// One attribute of an element.
    Attribute(NodeId, String),
}

impl Slot {
    /// Node owning the slot.
    const fn node(&self) -> NodeId {
        match self {
            Self::Text(node) | Self::Attribute(node, _) => *node,
        }
    }

    /// Current value in `doc`.
    fn current<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        match self {
            Self::Text(node) => doc.text(*node),
            Self::Attribute(node, name) => doc.attribute(*node, name),
        }
    }
}

/// Source text of one slot and the value the walker last wrote to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ShadowEntry {
    /// Text before any translation was applied.
    original: String,
    /// Value written by the walker, if it is still the slot's value.
    applied: Option<String>,
}

/// Original text keyed by node, evicted explicitly when nodes leave the page.
#[derive(Debug, Default, Clone)]
pub struct ShadowMap {
    /// Entries by slot.
    entries: HashMap<Slot, ShadowEntry>,
}

impl ShadowMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded source text of a text node.
    #[must_use]
    pub fn original(&self, node: NodeId) -> Option<&str> {
        self.entries.get(&Slot::Text(node)).map(|entry| entry.original.as_str())
    }

    /// Recorded source value of an element attribute.
    #[must_use]
    pub fn original_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.entries
            .get(&Slot::Attribute(node, name.to_string()))
            .map(|entry| entry.original.as_str())
    }

    /// Records `current` as the source text of `node` on first visit.
    ///
    /// A value that is neither the recorded source nor what the walker wrote
    /// was set by the page itself and becomes the new source.
    pub(crate) fn observe(&mut self, node: NodeId, current: &str) {
        self.observe_slot(Slot::Text(node), current);
    }

    /// Attribute counterpart of [`Self::observe`].
    pub(crate) fn observe_attribute(&mut self, node: NodeId, name: &str, current: &str) {
        self.observe_slot(Slot::Attribute(node, name.to_string()), current);
    }

    /// Notes that the walker wrote `value` to `node`.
    pub(crate) fn mark_applied(&mut self, node: NodeId, value: &str) {
        self.mark_slot(&Slot::Text(node), value);
    }

    /// Attribute counterpart of [`Self::mark_applied`].
    pub(crate) fn mark_attribute_applied(&mut self, node: NodeId, name: &str, value: &str) {
        self.mark_slot(&Slot::Attribute(node, name.to_string()), value);
    }

    /// Shared by text and attribute observation.
    fn observe_slot(&mut self, slot: Slot, current: &str) {
        match self.entries.get_mut(&slot) {
            None => {
                self.entries
                    .insert(slot, ShadowEntry { original: current.to_string(), applied: None });
            }
            Some(entry) => {
                if entry.applied.as_deref() != Some(current) && entry.original != current {
                    entry.original = current.to_string();
                    entry.applied = None;
                }
            }
        }
    }

    /// Records the value the walker wrote.
    fn mark_slot(&mut self, slot: &Slot, value: &str) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.applied = Some(value.to_string());
        }
    }

    /// Drops the entries of `root` and its descendants. Returns the number of
    /// dropped entries.
    pub fn evict_subtree(&mut self, doc: &Document, root: NodeId) -> usize {
        let gone: HashSet<NodeId> = doc.descendants(root).into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|slot, _| !gone.contains(&slot.node()));
        before - self.entries.len()
    }

    /// Puts every connected slot still showing the walker's output back to
    /// its source text. Returns the number of restored slots.
    pub fn restore(&mut self, doc: &mut Document) -> usize {
        let mut restored = 0;
        for (slot, entry) in &mut self.entries {
            let Some(applied) = entry.applied.as_deref() else {
                continue;
            };
            if !doc.is_connected(slot.node()) || slot.current(doc) != Some(applied) {
                continue;
            }
            let written = match slot {
                Slot::Text(node) => doc.set_text(*node, entry.original.as_str()),
                Slot::Attribute(node, name) => {
                    doc.set_attribute(*node, name, entry.original.as_str()).is_ok()
                }
            };
            if written {
                entry.applied = None;
                restored += 1;
            }
        }
        restored
    }
}
