//! Node data model for nodetree
//!
//! One flat table of nodes; the tree lives in the `parent` column.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Node identifier. Valid ids start at 1.
pub type NodeId = u64;

/// A persisted node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// Parent node, `None` for roots
    #[serde(default)]
    pub parent: Option<NodeId>,

    /// English base title, backfilled once after insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// When the node was created (UTC, whole seconds)
    pub created_at: DateTime<Utc>,

    /// When the node was last written
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Insertion request handed to a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    /// Caller-assigned id, or `None` to let the store pick the next one
    pub id: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub created_at: DateTime<Utc>,
}

impl NewNode {
    /// A store-assigned node created now
    pub fn new(parent: Option<NodeId>) -> Self {
        Self::at(parent, Utc::now())
    }

    /// A store-assigned node with an explicit creation instant
    pub fn at(parent: Option<NodeId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            parent,
            created_at: created_at.trunc_subsecs(0),
        }
    }

    /// Pin the id instead of letting the store assign it
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }
}
