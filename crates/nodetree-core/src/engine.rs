//! Tree queries and mutations
//!
//! Sits between callers and a `TreeStore`: derives titles, projects
//! timestamps, walks descendants to a bounded depth and refuses to delete
//! nodes that still have children.

use crate::{
    ChildListing, Error, Locale, NewNode, Node, NodeId, NodeView, Projection, Result, Spellout,
    TitleProvider, TreeStore, TreeView,
};
use serde::Serialize;

/// Depth cap applied when none is configured
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Hard ceiling on how deeply a listing may nest
pub const MAX_DEPTH_LIMIT: u32 = 128;

/// Outcome of a delete request as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub status_code: u16,
}

impl DeleteOutcome {
    fn deleted() -> Self {
        Self {
            success: true,
            message: "Node deleted successfully".to_string(),
            status_code: 200,
        }
    }

    fn refused(status_code: u16, message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            status_code,
        }
    }
}

/// Query/mutation engine over a node store
pub struct TreeEngine<S> {
    store: S,
    titles: Box<dyn TitleProvider>,
    max_depth: u32,
}

impl<S: TreeStore> TreeEngine<S> {
    /// Engine with the built-in spell-out titles
    pub fn new(store: S) -> Self {
        Self::with_titles(store, Box::new(Spellout))
    }

    pub fn with_titles(store: S, titles: Box<dyn TitleProvider>) -> Self {
        Self {
            store,
            titles,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Cap the depth a children listing may ask for, within `1..=MAX_DEPTH_LIMIT`
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.clamp(1, MAX_DEPTH_LIMIT);
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn titles(&self) -> &dyn TitleProvider {
        self.titles.as_ref()
    }

    pub fn find_node(&self, id: NodeId) -> Result<Option<Node>> {
        self.store.find_by_id(id)
    }

    /// Create a node under `parent` (or as a root) now
    pub fn create_node(&mut self, parent: Option<NodeId>, locale: &Locale) -> Result<NodeView> {
        self.create(NewNode::new(parent), locale)
    }

    /// Create a node from a full insertion request
    ///
    /// The stored title is the English spelling; the returned view is titled
    /// in `locale` with `created_at` in UTC.
    pub fn create(&mut self, new: NewNode, locale: &Locale) -> Result<NodeView> {
        let parent = new.parent;
        let node = self.store.insert(new).inspect_err(|e| {
            if !e.is_client_error() {
                tracing::error!(?parent, locale = %locale, error = %e, "failed to insert node");
            }
        })?;

        // A node is never left behind without its title
        let base_title = self.titles.number_to_words(node.id, &Locale::english());
        if let Err(e) = self.store.set_title(node.id, base_title) {
            tracing::error!(id = node.id, error = %e, "failed to store node title");
            if let Err(rollback) = self.store.delete(node.id) {
                tracing::error!(id = node.id, error = %rollback, "failed to roll back node");
            }
            return Err(e);
        }

        tracing::info!(id = node.id, ?parent, "created node");
        Ok(self.view(&node, &Projection::utc(locale.clone())))
    }

    /// All root nodes, id ascending
    pub fn list_roots(&self, projection: &Projection) -> Result<Vec<NodeView>> {
        let roots = self.store.find_roots()?;
        Ok(roots.iter().map(|n| self.view(n, projection)).collect())
    }

    /// Children of `parent`
    ///
    /// Without a depth the direct children come back flat. With depth `D` each
    /// child carries `children`, filled `D` levels deep; nodes on the last
    /// level get an empty list and their children are never fetched.
    ///
    /// Work grows with the size of the visited subtree: one store call per
    /// visited node. Depth is capped by `max_depth`.
    pub fn list_children(
        &self,
        parent: NodeId,
        depth: Option<i64>,
        projection: &Projection,
    ) -> Result<ChildListing> {
        let depth = depth.map(|d| self.check_depth(d)).transpose()?;

        if self.store.find_by_id(parent)?.is_none() {
            return Err(Error::NotFound(parent));
        }

        match depth {
            None => {
                let children = self.store.find_children(parent)?;
                let views = children.iter().map(|n| self.view(n, projection)).collect();
                Ok(ChildListing::Flat(views))
            }
            Some(depth) => {
                tracing::debug!(parent, depth, "walking descendants");
                Ok(ChildListing::Tree(self.descendants(parent, depth, projection)?))
            }
        }
    }

    /// Delete a childless node
    ///
    /// Missing nodes and nodes with children are reported in the outcome, not
    /// as errors. Children are never removed along with their parent.
    pub fn delete_node(&mut self, id: NodeId) -> Result<DeleteOutcome> {
        match self.store.delete(id) {
            Ok(()) => {
                tracing::info!(id, "deleted node");
                Ok(DeleteOutcome::deleted())
            }
            Err(Error::NotFound(_)) => Ok(DeleteOutcome::refused(404, "Node not found")),
            Err(Error::HasChildren(_)) => {
                tracing::debug!(id, "refusing to delete node with children");
                Ok(DeleteOutcome::refused(
                    409,
                    "Cannot delete a node that has children",
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn check_depth(&self, depth: i64) -> Result<u32> {
        if depth < 1 {
            return Err(Error::InvalidArgument(
                "depth must be an integer greater than or equal to 1".into(),
            ));
        }
        if depth > i64::from(self.max_depth) {
            return Err(Error::InvalidArgument(format!(
                "depth must not exceed {}",
                self.max_depth
            )));
        }
        u32::try_from(depth).map_err(|_| Error::InvalidArgument("depth out of range".into()))
    }

    /// Walk `depth` levels below `parent` one level at a time, then assemble
    /// the nested views from the deepest level up.
    fn descendants(
        &self,
        parent: NodeId,
        depth: u32,
        projection: &Projection,
    ) -> Result<Vec<TreeView>> {
        // levels[k]: nodes k+1 below `parent`, each with the index of its
        // parent in levels[k - 1]
        let first = self.store.find_children(parent)?;
        let mut levels: Vec<Vec<(usize, Node)>> = vec![first.into_iter().map(|n| (0, n)).collect()];

        while levels.len() < depth as usize {
            let Some(last) = levels.last() else { break };
            let mut next = Vec::new();
            for (index, (_, node)) in last.iter().enumerate() {
                let kids = self.store.find_children(node.id)?;
                next.extend(kids.into_iter().map(|kid| (index, kid)));
            }
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }

        // One group of finished subtrees per node of the level being built
        let mut below: Vec<Vec<TreeView>> = Vec::new();
        while let Some(level) = levels.pop() {
            let parents = levels.last().map_or(1, Vec::len);
            let mut groups: Vec<Vec<TreeView>> = (0..parents).map(|_| Vec::new()).collect();
            let mut subtrees = std::mem::take(&mut below).into_iter();
            for (up, node) in level {
                groups[up].push(TreeView {
                    node: self.view(&node, projection),
                    children: subtrees.next().unwrap_or_default(),
                });
            }
            below = groups;
        }

        Ok(below.into_iter().next().unwrap_or_default())
    }

    fn view(&self, node: &Node, projection: &Projection) -> NodeView {
        NodeView::project(node, self.titles.as_ref(), projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::parse_timezone;
    use crate::Store;
    use std::cell::Cell;

    /// Store wrapper that counts read calls
    struct CountingStore {
        inner: Store,
        lookups: Cell<usize>,
        child_fetches: Cell<usize>,
    }

    impl CountingStore {
        fn new(inner: Store) -> Self {
            Self {
                inner,
                lookups: Cell::new(0),
                child_fetches: Cell::new(0),
            }
        }
    }

    impl TreeStore for CountingStore {
        fn insert(&mut self, node: NewNode) -> Result<Node> {
            self.inner.insert(node)
        }
        fn set_title(&mut self, id: NodeId, title: String) -> Result<()> {
            self.inner.set_title(id, title)
        }
        fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.find_by_id(id)
        }
        fn find_roots(&self) -> Result<Vec<Node>> {
            self.inner.find_roots()
        }
        fn find_children(&self, id: NodeId) -> Result<Vec<Node>> {
            self.child_fetches.set(self.child_fetches.get() + 1);
            self.inner.find_children(id)
        }
        fn has_children(&self, id: NodeId) -> Result<bool> {
            self.inner.has_children(id)
        }
        fn delete(&mut self, id: NodeId) -> Result<()> {
            self.inner.delete(id)
        }
    }

    fn en() -> Locale {
        Locale::english()
    }

    /// P(1) -> C1(2) -> G1(4) -> GG(5); P(1) -> C2(3)
    fn sample() -> TreeEngine<CountingStore> {
        let mut engine = TreeEngine::new(CountingStore::new(Store::in_memory()));
        engine.create_node(None, &en()).unwrap();
        engine.create_node(Some(1), &en()).unwrap();
        engine.create_node(Some(1), &en()).unwrap();
        engine.create_node(Some(2), &en()).unwrap();
        engine.create_node(Some(4), &en()).unwrap();
        engine
    }

    #[test]
    fn test_create_stores_english_and_returns_localized() {
        let mut engine = TreeEngine::new(Store::in_memory());
        let view = engine
            .create_node(None, &Locale::parse("es").unwrap())
            .unwrap();
        assert_eq!(view.id, 1);
        assert_eq!(view.parent, None);
        assert_eq!(view.title, "Uno");

        let stored = engine.find_node(1).unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("One"));
        assert_eq!(
            view.created_at,
            stored.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
        );
    }

    #[test]
    fn test_create_with_missing_parent() {
        let mut engine = TreeEngine::new(Store::in_memory());
        let err = engine.create_node(Some(7), &en()).unwrap_err();
        assert!(matches!(err, Error::InvalidParent(7)));
        assert!(engine.list_roots(&Projection::default()).unwrap().is_empty());
        assert!(engine.find_node(1).unwrap().is_none());
    }

    #[test]
    fn test_list_roots_localized_and_zoned() {
        let mut engine = TreeEngine::new(Store::in_memory());
        engine.create_node(None, &en()).unwrap();
        engine.create_node(Some(1), &en()).unwrap();
        engine.create_node(None, &en()).unwrap();

        let projection = Projection::new(
            Locale::parse("fr").unwrap(),
            parse_timezone("Asia/Tokyo").unwrap(),
        );
        let roots = engine.list_roots(&projection).unwrap();
        let titles: Vec<_> = roots.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Un", "Trois"]);
        assert!(roots.iter().all(|r| r.parent.is_none()));
    }

    #[test]
    fn test_list_children_without_depth_is_flat() {
        let engine = sample();
        let listing = engine
            .list_children(1, None, &Projection::default())
            .unwrap();
        assert!(matches!(listing, ChildListing::Flat(_)));
        assert_eq!(listing.ids(), vec![2, 3]);

        let json = serde_json::to_value(&listing).unwrap();
        assert!(json[0].get("children").is_none());
    }

    #[test]
    fn test_list_children_depth_two() {
        let engine = sample();
        let listing = engine
            .list_children(1, Some(2), &Projection::default())
            .unwrap();
        let json = serde_json::to_value(&listing).unwrap();

        let shape: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                let grandkids: Vec<_> = c["children"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|g| (g["id"].as_u64().unwrap(), g["children"].as_array().unwrap().len()))
                    .collect();
                (c["id"].as_u64().unwrap(), grandkids)
            })
            .collect();

        // C1 has G1 (whose own child is beyond the bound), C2 is a leaf
        assert_eq!(shape, vec![(2, vec![(4, 0)]), (3, vec![])]);
        assert_eq!(json[0]["children"][0]["title"], "Four");
        assert_eq!(json[0]["children"][0]["parent"], 2);
    }

    #[test]
    fn test_depth_bounds_store_calls() {
        let engine = sample();
        engine.store().child_fetches.set(0);
        engine
            .list_children(1, Some(1), &Projection::default())
            .unwrap();
        // Only the queried parent's children are fetched
        assert_eq!(engine.store().child_fetches.get(), 1);

        engine.store().child_fetches.set(0);
        engine
            .list_children(1, Some(2), &Projection::default())
            .unwrap();
        // Parent, then C1 and C2
        assert_eq!(engine.store().child_fetches.get(), 3);
    }

    #[test]
    fn test_invalid_depth_performs_no_query() {
        let engine = sample();
        engine.store().lookups.set(0);
        engine.store().child_fetches.set(0);

        for depth in [0, -1, i64::MIN] {
            let err = engine
                .list_children(1, Some(depth), &Projection::default())
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert_eq!(engine.store().lookups.get(), 0);
        assert_eq!(engine.store().child_fetches.get(), 0);
    }

    #[test]
    fn test_max_depth_cap() {
        assert_eq!(sample().max_depth(), DEFAULT_MAX_DEPTH);

        let engine = sample().with_max_depth(2);
        assert!(engine.list_children(1, Some(2), &Projection::default()).is_ok());
        let err = engine
            .list_children(1, Some(3), &Projection::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_max_depth_is_clamped() {
        assert_eq!(sample().with_max_depth(0).max_depth(), 1);
        assert_eq!(
            sample().with_max_depth(u32::MAX).max_depth(),
            MAX_DEPTH_LIMIT
        );
    }

    /// Chain 1 -> 2 -> ... -> len
    fn chain(len: u64) -> TreeEngine<Store> {
        let mut engine = TreeEngine::new(Store::in_memory());
        engine.create_node(None, &en()).unwrap();
        for parent in 1..len {
            engine.create_node(Some(parent), &en()).unwrap();
        }
        engine
    }

    #[test]
    fn test_long_chain_depth_is_bounded() {
        // Same stack size as a tokio worker
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let engine = chain(3000).with_max_depth(MAX_DEPTH_LIMIT);
                let projection = Projection::default();

                let err = engine
                    .list_children(1, Some(1_000_000), &projection)
                    .unwrap_err();
                assert_eq!(err.status_code(), 400);

                let listing = engine
                    .list_children(1, Some(i64::from(MAX_DEPTH_LIMIT)), &projection)
                    .unwrap();
                let json = serde_json::to_string(&listing).unwrap();
                assert!(json.starts_with(r#"[{"id":2,"#));

                let ChildListing::Tree(mut level) = listing else {
                    panic!("expected a tree listing");
                };
                let mut levels = 0;
                let mut last_id = 1;
                while let Some(node) = level.pop() {
                    assert_eq!(node.node.parent, Some(last_id));
                    last_id = node.node.id;
                    levels += 1;
                    level = node.children;
                }
                assert_eq!(levels, MAX_DEPTH_LIMIT);
                assert_eq!(last_id, u64::from(MAX_DEPTH_LIMIT) + 1);
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_walk_stops_at_leaves() {
        let engine = sample();
        engine.store().child_fetches.set(0);
        let listing = engine
            .list_children(1, Some(i64::from(DEFAULT_MAX_DEPTH)), &Projection::default())
            .unwrap();
        // Parent, C1, C2, G1, GG
        assert_eq!(engine.store().child_fetches.get(), 5);
        assert_eq!(listing.ids(), vec![2, 3]);
    }

    /// Store whose title writes always fail
    struct TitleFailingStore(Store);

    impl TreeStore for TitleFailingStore {
        fn insert(&mut self, node: NewNode) -> Result<Node> {
            self.0.insert(node)
        }
        fn set_title(&mut self, _id: NodeId, _title: String) -> Result<()> {
            Err(Error::Other("disk full".into()))
        }
        fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
            self.0.find_by_id(id)
        }
        fn find_roots(&self) -> Result<Vec<Node>> {
            self.0.find_roots()
        }
        fn find_children(&self, id: NodeId) -> Result<Vec<Node>> {
            self.0.find_children(id)
        }
        fn has_children(&self, id: NodeId) -> Result<bool> {
            self.0.has_children(id)
        }
        fn delete(&mut self, id: NodeId) -> Result<()> {
            self.0.delete(id)
        }
    }

    #[test]
    fn test_failed_title_write_rolls_back_insert() {
        let mut engine = TreeEngine::new(TitleFailingStore(Store::in_memory()));
        let err = engine.create_node(None, &en()).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(engine.find_node(1).unwrap().is_none());
        assert!(engine.list_roots(&Projection::default()).unwrap().is_empty());
    }

    #[test]
    fn test_list_children_missing_parent() {
        let engine = sample();
        for depth in [None, Some(1)] {
            let err = engine
                .list_children(99, depth, &Projection::default())
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(99)));
        }
    }

    #[test]
    fn test_created_child_appears_in_listing() {
        let mut engine = sample();
        let created = engine.create_node(Some(3), &en()).unwrap();
        let listing = engine
            .list_children(3, Some(1), &Projection::default())
            .unwrap();
        match listing {
            ChildListing::Tree(nodes) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].node.id, created.id);
                assert_eq!(nodes[0].node.parent, Some(3));
            }
            ChildListing::Flat(_) => panic!("expected a tree listing"),
        }
    }

    #[test]
    fn test_delete_refuses_node_with_children() {
        let mut engine = sample();
        let outcome = engine.delete_node(2).unwrap();
        assert_eq!(outcome.status_code, 409);
        assert!(!outcome.success);
        assert!(engine.find_node(2).unwrap().is_some());
        assert!(engine.find_node(4).unwrap().is_some());
    }

    #[test]
    fn test_delete_leaf() {
        let mut engine = sample();
        let outcome = engine.delete_node(3).unwrap();
        assert_eq!(outcome.status_code, 200);
        assert!(outcome.success);
        assert!(engine.find_node(3).unwrap().is_none());

        let again = engine.delete_node(3).unwrap();
        assert_eq!(again.status_code, 404);
        assert_eq!(again.message, "Node not found");
    }

    #[test]
    fn test_delete_bottom_up() {
        let mut engine = sample();
        for id in [5, 4, 2, 3, 1] {
            assert!(engine.delete_node(id).unwrap().success, "node {id}");
        }
        assert!(engine.list_roots(&Projection::default()).unwrap().is_empty());
    }
}
