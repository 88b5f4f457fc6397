//! Arena-backed document tree with a single mutation observer.

use std::collections::VecDeque;

use thiserror::Error;

use super::node::{
    ElementData,
    MutationRecord,
    Node,
    NodeData,
    NodeId,
    ObserverId,
};

/// Errors raised by structural document operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("Inserting {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: NodeId, child: NodeId },
}

/// Observer registration and its pending records.
#[derive(Debug)]
struct Observer {
    /// Identity handed to the watcher.
    id: ObserverId,
    /// Records not yet taken.
    records: VecDeque<MutationRecord>,
}

/// Arena entry; `node` is `None` once reclaimed.
#[derive(Debug)]
struct ArenaSlot {
    /// Bumped every time the slot is freed.
    generation: u32,
    /// Occupant.
    node: Option<Node>,
}

/// A page: a tree of elements and text rooted at `body`.
///
/// Nodes live in an arena. Removing a node only detaches it, so it can be
/// inserted again; [`Document::reclaim`] later frees removed subtrees that
/// stayed detached. Changes under the body are queued for the attached
/// observer, if any.
#[derive(Debug)]
pub struct Document {
    /// Node arena indexed by slot.
    nodes: Vec<ArenaSlot>,
    /// Freed slots, reused before the arena grows.
    free: Vec<usize>,
    /// Roots detached by [`Document::remove`] since the last reclaim.
    removed: Vec<NodeId>,
    /// Occupied slots.
    live: usize,
    /// Root element.
    body: NodeId,
    /// Currently attached observer.
    observer: Option<Observer>,
    /// Next observer identity.
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with a `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("body")
    }

    /// Creates a document whose root element has the given tag.
    #[must_use]
    pub fn with_root(tag: &str) -> Self {
        let root = Node::new(NodeData::Element(ElementData::new(tag)));
        Self {
            nodes: vec![ArenaSlot { generation: 0, node: Some(root) }],
            free: Vec::new(),
            removed: Vec::new(),
            live: 1,
            body: NodeId { index: 0, generation: 0 },
            observer: None,
            next_observer: 0,
        }
    }

    /// Root element.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.live
    }

    /// Node behind `id`, `None` if the handle is stale.
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Mutable counterpart of [`Self::node`].
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(value.into()))
    }

    /// Adds a detached node to the arena, reusing a freed slot if any.
    fn push(&mut self, data: NodeData) -> NodeId {
        let node = Node::new(data);
        self.live += 1;
        if let Some(index) = self.free.pop()
            && let Some(slot) = self.nodes.get_mut(index)
        {
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }
        let id = NodeId { index: self.nodes.len(), generation: 0 };
        self.nodes.push(ArenaSlot { generation: 0, node: Some(node) });
        id
    }

    /// Frees the slot of `id`. Returns whether it was live.
    fn release(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.nodes.get_mut(id.index) else {
            return false;
        };
        if slot.generation != id.generation || slot.node.take().is_none() {
            return false;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    /// Node payload.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    /// Element payload, `None` for text or unknown nodes.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    /// Whether `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    /// Attribute value of an element.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    /// Whether the element's `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|element| element.classes().any(|c| c == class))
    }

    /// Sets an attribute on an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let node = self.node_mut(id).ok_or(DomError::UnknownNode(id))?;
        let NodeData::Element(element) = &mut node.data else {
            return Err(DomError::NotAnElement(id));
        };
        element.attributes.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Character data of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(value) => Some(value),
            NodeData::Element(_) => None,
        }
    }

    /// Replaces the character data of a text node.
    ///
    /// Returns `true` if the value changed. Writing the current value is a
    /// no-op and queues no record.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        let value = value.into();
        let Some(NodeData::Text(current)) = self.node_mut(id).map(|node| &mut node.data) else {
            return false;
        };
        if *current == value {
            return false;
        }
        let old_value = std::mem::replace(current, value);
        if self.is_connected(id) {
            self.record(MutationRecord::CharacterData { target: id, old_value });
        }
        true
    }

    /// Parent element.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// Whether `id` is the body or a descendant of it.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.body || self.ancestors(id).any(|ancestor| ancestor == self.body)
    }

    /// Appends a detached node to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(if self.node(parent).is_some() {
                DomError::NotAnElement(parent)
            } else {
                DomError::UnknownNode(parent)
            });
        }
        let child_node = self.node(child).ok_or(DomError::UnknownNode(child))?;
        if child_node.parent.is_some() || child == self.body {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(DomError::HierarchyCycle { parent, child });
        }

        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if self.is_connected(parent) {
            self.record(MutationRecord::ChildList {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Creates an element, appends it to `parent` and returns it.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Creates a text node, appends it to `parent` and returns it.
    pub fn append_text(
        &mut self,
        parent: NodeId,
        value: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        let id = self.create_text(value);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Detaches `id` from its parent. Detaching a detached node is a no-op.
    ///
    /// The subtree stays readable and can be inserted again until the next
    /// [`Self::reclaim`].
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        let node = self.node_mut(id).ok_or(DomError::UnknownNode(id))?;
        let Some(parent) = node.parent.take() else {
            return Ok(());
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        self.removed.push(id);
        if self.is_connected(parent) {
            self.record(MutationRecord::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![id],
            });
        }
        Ok(())
    }

    /// Frees every subtree removed since the last call that is still
    /// detached. Returns the number of freed nodes.
    ///
    /// Handles to freed nodes become unknown. Nothing is freed while the
    /// observer has records pending, so the ids in those records stay
    /// readable until the watcher has handled them.
    pub fn reclaim(&mut self) -> usize {
        if self.pending_records() > 0 {
            return 0;
        }
        let mut freed = 0;
        for root in std::mem::take(&mut self.removed) {
            if self.node(root).is_none_or(|node| node.parent.is_some()) {
                continue;
            }
            for id in self.descendants(root) {
                freed += usize::from(self.release(id));
            }
        }
        if freed > 0 {
            tracing::trace!(freed, live = self.live, "Reclaimed removed nodes");
        }
        freed
    }

    /// Detaches every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), DomError> {
        let children = self.children(id).to_vec();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// First connected element whose `id` attribute equals `element_id`.
    #[must_use]
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(element_id))
    }

    /// `root` and all its descendants in document order.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.collect_pruned(root, |_, _| true)
    }

    /// Pre-order walk from `root` that does not descend into elements for
    /// which `descend` returns `false`. Pruned elements are not yielded.
    ///
    /// The walk only reads the tree; callers mutate afterwards.
    pub fn collect_pruned<F>(&self, root: NodeId, mut descend: F) -> Vec<NodeId>
    where
        F: FnMut(&Self, NodeId) -> bool,
    {
        let mut found = Vec::new();
        if self.node(root).is_none() {
            return found;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.is_element(id) && !descend(self, id) {
                continue;
            }
            found.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Concatenated text of `root`'s subtree.
    #[must_use]
    pub fn text_content(&self, root: NodeId) -> String {
        self.descendants(root).into_iter().filter_map(|id| self.text(id)).collect()
    }

    /// Attaches a new observer, replacing (and disconnecting) any previous
    /// one. Returns the new observer's identity.
    pub fn observe(&mut self) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        if let Some(previous) = self.observer.replace(Observer { id, records: VecDeque::new() }) {
            tracing::debug!(
                previous = previous.id.0,
                dropped = previous.records.len(),
                "Replacing mutation observer"
            );
        }
        id
    }

    /// Currently attached observer.
    #[must_use]
    pub fn observer(&self) -> Option<ObserverId> {
        self.observer.as_ref().map(|observer| observer.id)
    }

    /// Detaches `id` if it is the current observer.
    pub fn disconnect(&mut self, id: ObserverId) {
        if self.observer() == Some(id) {
            self.observer = None;
        }
    }

    /// Takes the pending records of observer `id`. Returns nothing for a
    /// disconnected observer.
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        match &mut self.observer {
            Some(observer) if observer.id == id => observer.records.drain(..).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of records queued for the current observer.
    #[must_use]
    pub fn pending_records(&self) -> usize {
        self.observer.as_ref().map_or(0, |observer| observer.records.len())
    }

    /// Queues `record` for the attached observer.
    fn record(&mut self, record: MutationRecord) {
        if let Some(observer) = &mut self.observer {
            observer.records.push_back(record);
        }
    }
}
