//! Node types stored in the document arena.

use std::collections::BTreeMap;
use std::fmt;

/// Stable handle to a node in a [`Document`](super::Document).
///
/// Arena slots are reused once a node is reclaimed, but each reuse bumps the
/// slot's generation, so a handle to a reclaimed node never matches a node
/// created afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    /// Arena slot.
    pub(super) index: usize,
    /// Slot generation the handle was issued for.
    pub(super) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Element payload: lowercase tag name plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Tag name, always lowercase.
    pub tag: String,
    /// Attribute name to value.
    pub attributes: BTreeMap<String, String>,
}

impl ElementData {
    /// Creates an element payload with no attributes.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_ascii_lowercase(), attributes: BTreeMap::new() }
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes.get("class").map(String::as_str).unwrap_or_default().split_whitespace()
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

/// Arena slot.
#[derive(Debug, Clone)]
pub(super) struct Node {
    /// Payload.
    pub(super) data: NodeData,
    /// Parent element, `None` for the body and for detached nodes.
    pub(super) parent: Option<NodeId>,
    /// Children in document order. Always empty for text nodes.
    pub(super) children: Vec<NodeId>,
}

impl Node {
    /// Creates a detached node.
    pub(super) const fn new(data: NodeData) -> Self {
        Self { data, parent: None, children: Vec::new() }
    }
}

/// A change observed on a connected part of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were inserted into or removed from `target`.
    ChildList { target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId> },
    /// The character data of the text node `target` changed.
    CharacterData { target: NodeId, old_value: String },
}

/// Handle identifying the observer currently attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(super) u64);
