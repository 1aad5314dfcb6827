//! JSON projections of nodes returned to callers

use crate::context::format_timestamp;
use crate::{Node, NodeId, Projection, TitleProvider};
use serde::{Deserialize, Serialize};

/// A node as seen by one request: localized title, zoned timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub title: String,
    /// `YYYY-MM-DD HH:MM:SS` in the requested timezone
    pub created_at: String,
}

impl NodeView {
    /// Render `node` for `projection`. The title is always re-derived from the
    /// id; a stored title is never trusted.
    pub fn project(node: &Node, titles: &dyn TitleProvider, projection: &Projection) -> Self {
        Self {
            id: node.id,
            parent: node.parent,
            title: titles.number_to_words(node.id, &projection.locale),
            created_at: format_timestamp(node.created_at, projection.timezone),
        }
    }
}

/// A node with its descendants down to the requested depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeView {
    #[serde(flatten)]
    pub node: NodeView,
    /// Empty at the deepest requested level, never absent
    pub children: Vec<TreeView>,
}

/// Result of a children listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChildListing {
    /// Direct children without a `children` key (no depth given)
    Flat(Vec<NodeView>),
    /// Direct children with nested descendants
    Tree(Vec<TreeView>),
}

impl ChildListing {
    pub fn len(&self) -> usize {
        match self {
            ChildListing::Flat(nodes) => nodes.len(),
            ChildListing::Tree(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the top-level entries
    pub fn ids(&self) -> Vec<NodeId> {
        match self {
            ChildListing::Flat(nodes) => nodes.iter().map(|n| n.id).collect(),
            ChildListing::Tree(nodes) => nodes.iter().map(|n| n.node.id).collect(),
        }
    }
}
