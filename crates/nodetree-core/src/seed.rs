//! Sample tree for demos and local development

use crate::{Error, Locale, NewNode, NodeId, Result, TreeEngine, TreeStore};
use chrono::{Duration, Utc};

/// `(id, parent)` pairs, parents first
pub const SAMPLE_TREE: &[(NodeId, Option<NodeId>)] = &[
    (1, None),
    (2, None),
    (3, Some(1)),
    (4, Some(1)),
    (5, Some(3)),
    (6, Some(2)),
];

/// Insert the sample tree, skipping nodes that already exist or whose parent
/// is missing. Returns how many nodes were created.
pub fn seed<S: TreeStore>(engine: &mut TreeEngine<S>) -> Result<usize> {
    tracing::info!("seeding sample tree");
    let now = Utc::now();
    let mut created = 0;

    for &(id, parent) in SAMPLE_TREE {
        // Spread creation dates over the past two weeks
        let created_at = now - Duration::days(((id * 5) % 15 + 1) as i64);
        let node = NewNode::at(parent, created_at).with_id(id);

        match engine.create(node, &Locale::english()) {
            Ok(view) => {
                tracing::info!(id = view.id, title = %view.title, ?parent, "seeded node");
                created += 1;
            }
            Err(Error::AlreadyExists(_)) => {
                tracing::warn!(id, "node already exists, skipping");
            }
            Err(Error::InvalidParent(missing)) => {
                tracing::warn!(id, parent = missing, "parent node not found, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(created, "seeding complete");
    Ok(created)
}
