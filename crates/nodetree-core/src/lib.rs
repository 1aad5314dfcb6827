//! nodetree-core: Core library for the nodetree service
//!
//! A self-referencing tree of nodes whose titles are never free text: each
//! title is the node's id spelled out in words, localized per request.
//! Nodes live in a JSONL file under `.nodetree/`.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod node;
pub mod seed;
pub mod store;
pub mod title;
pub mod view;

pub use config::Config;
pub use context::{Locale, Projection};
pub use engine::{DEFAULT_MAX_DEPTH, DeleteOutcome, MAX_DEPTH_LIMIT, TreeEngine};
pub use error::Error;
pub use node::{NewNode, Node, NodeId};
pub use store::{Store, TreeStore};
pub use title::{Spellout, TitleProvider};
pub use view::{ChildListing, NodeView, TreeView};

/// Result type for nodetree operations
pub type Result<T> = std::result::Result<T, Error>;
