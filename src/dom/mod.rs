//! In-memory page model the overlay translates.
mod document;
mod node;
/// JSON page snapshots
pub mod snapshot;

pub use document::{
    DomError,
    Document,
};
pub use node::{
    ElementData,
    MutationRecord,
    NodeData,
    NodeId,
    ObserverId,
};
