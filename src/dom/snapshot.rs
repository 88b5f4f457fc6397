//! JSON form of a page.
//!
//! Text nodes are plain strings, elements are objects:
//!
//! ```json
//! { "tag": "body", "children": [
//!     { "tag": "h1", "attributes": { "title": "Hosts" }, "children": ["Hosts"] },
//!     "  Free text  "
//! ] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use super::{
    DomError,
    Document,
    NodeData,
    NodeId,
};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access page file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse page: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The page root must be an element")]
    RootNotElement,

    #[error("Failed to build page: {0}")]
    Dom(#[from] DomError),
}

/// Serialized node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSnapshot {
    Text(String),
    Element(ElementSnapshot),
}

/// Serialized element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl Document {
    /// Builds a document from a snapshot whose root is an element.
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> Result<Self, SnapshotError> {
        let NodeSnapshot::Element(root) = snapshot else {
            return Err(SnapshotError::RootNotElement);
        };
        let mut doc = Self::with_root(&root.tag);
        let body = doc.body();
        for (name, value) in &root.attributes {
            doc.set_attribute(body, name, value.as_str())?;
        }
        for child in &root.children {
            build_node(&mut doc, body, child)?;
        }
        Ok(doc)
    }

    /// Serializes the connected tree.
    #[must_use]
    pub fn to_snapshot(&self) -> NodeSnapshot {
        snapshot_node(self, self.body())
    }
}

/// Appends `snapshot` under `parent`.
fn build_node(doc: &mut Document, parent: NodeId, snapshot: &NodeSnapshot) -> Result<(), DomError> {
    match snapshot {
        NodeSnapshot::Text(value) => {
            doc.append_text(parent, value.as_str())?;
        }
        NodeSnapshot::Element(element) => {
            let id = doc.append_element(parent, &element.tag)?;
            for (name, value) in &element.attributes {
                doc.set_attribute(id, name, value.as_str())?;
            }
            for child in &element.children {
                build_node(doc, id, child)?;
            }
        }
    }
    Ok(())
}

/// Serializes the subtree at `id`.
fn snapshot_node(doc: &Document, id: NodeId) -> NodeSnapshot {
    match doc.data(id) {
        Some(NodeData::Element(element)) => NodeSnapshot::Element(ElementSnapshot {
            tag: element.tag.clone(),
            attributes: element.attributes.clone(),
            children: doc.children(id).iter().map(|child| snapshot_node(doc, *child)).collect(),
        }),
        Some(NodeData::Text(value)) => NodeSnapshot::Text(value.clone()),
        None => NodeSnapshot::Text(String::new()),
    }
}

/// Reads a page snapshot file.
pub fn load_page(path: &Path) -> Result<Document, SnapshotError> {
    tracing::debug!("Loading page from: {:?}", path);
    let content = std::fs::read_to_string(path)?;
    let snapshot: NodeSnapshot = serde_json::from_str(&content)?;
    Document::from_snapshot(&snapshot)
}

/// Renders a document as pretty-printed JSON.
pub fn render_page(doc: &Document) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&doc.to_snapshot())?)
}
