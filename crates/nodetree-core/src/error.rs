//! Error types for nodetree

use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Parent node not found: {0}")]
    InvalidParent(NodeId),

    #[error("Node {0} has children and cannot be deleted")]
    HasChildren(NodeId),

    #[error("Node already exists: {0}")]
    AlreadyExists(NodeId),

    #[error("Invalid node ID: {0}")]
    InvalidId(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Store not initialized. Run 'nodetree init' first.")]
    NotInitialized,

    #[error("Store already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Corrupt node file: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status code this error maps to at the API boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidParent(_) | Error::InvalidArgument(_) => 400,
            Error::NotFound(_) => 404,
            Error::HasChildren(_) | Error::AlreadyExists(_) => 409,
            Error::InvalidId(_) => 422,
            _ => 500,
        }
    }

    /// Whether the message is safe to show to a client
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
