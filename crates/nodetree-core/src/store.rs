//! JSONL store for nodetree nodes
//!
//! No database server - one `nodes.jsonl` file, rewritten on every mutation.

use crate::{Error, NewNode, Node, NodeId, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const NODETREE_DIR: &str = ".nodetree";
const NODES_FILE: &str = "nodes.jsonl";
const CONFIG_FILE: &str = "config.toml";

/// Persistence operations the engine relies on
///
/// Listings come back in ascending id order.
pub trait TreeStore {
    /// Persist a new node. Fails with `InvalidParent` if the parent is missing.
    fn insert(&mut self, node: NewNode) -> Result<Node>;

    /// Backfill the stored base title
    fn set_title(&mut self, id: NodeId, title: String) -> Result<()>;

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>>;

    fn find_roots(&self) -> Result<Vec<Node>>;

    /// Direct children only
    fn find_children(&self, id: NodeId) -> Result<Vec<Node>>;

    fn has_children(&self, id: NodeId) -> Result<bool>;

    /// Remove a childless node.
    ///
    /// The children check and the removal are a single operation: `NotFound`
    /// if the node is absent, `HasChildren` if anything still points at it.
    fn delete(&mut self, id: NodeId) -> Result<()>;
}

/// JSONL-based node store
pub struct Store {
    /// Repository root; `None` keeps everything in memory
    root: Option<PathBuf>,
    nodes: BTreeMap<NodeId, Node>,
    /// parent id -> child ids
    children: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Store {
    /// Find and open the store for the current directory
    pub fn open() -> Result<Self> {
        let root = Self::find_root()?;
        Self::open_at(root)
    }

    /// Open the store rooted at `root` (the directory containing `.nodetree`)
    pub fn open_at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(NODETREE_DIR).exists() {
            return Err(Error::NotInitialized);
        }
        let mut store = Self {
            root: Some(root),
            nodes: BTreeMap::new(),
            children: BTreeMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Initialize a new store under `root`
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = root.join(NODETREE_DIR);

        if dir.exists() {
            return Err(Error::AlreadyInitialized(dir.display().to_string()));
        }

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(CONFIG_FILE), crate::Config::default_with_comments())?;
        fs::write(dir.join(NODES_FILE), "")?;

        Ok(Self {
            root: Some(root),
            nodes: BTreeMap::new(),
            children: BTreeMap::new(),
        })
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            root: None,
            nodes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Find the repository root (directory containing .nodetree)
    fn find_root() -> Result<PathBuf> {
        let mut current = std::env::current_dir()?;
        loop {
            if current.join(NODETREE_DIR).exists() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(Error::NotInitialized);
            }
        }
    }

    /// Path to the .nodetree directory, if file-backed
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(NODETREE_DIR))
    }

    /// Path to config.toml, if file-backed
    pub fn config_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    fn nodes_path(dir: &Path) -> PathBuf {
        dir.join(NODES_FILE)
    }

    /// Number of stored nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Load all nodes from JSONL
    fn load(&mut self) -> Result<()> {
        let Some(dir) = self.data_dir() else {
            return Ok(());
        };
        let path = Self::nodes_path(&dir);
        if !path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let node: Node = serde_json::from_str(&line)?;
            if node.id == 0 {
                return Err(Error::Corrupt("node with id 0".into()));
            }
            if self.nodes.contains_key(&node.id) {
                return Err(Error::Corrupt(format!("duplicate node id {}", node.id)));
            }
            self.index(node);
        }

        // Every parent reference must resolve, otherwise the file was edited by hand
        for (parent, kids) in &self.children {
            if !self.nodes.contains_key(parent) {
                let orphan = kids.first().copied().unwrap_or_default();
                return Err(Error::Corrupt(format!(
                    "node {} references missing parent {}",
                    orphan, parent
                )));
            }
        }

        Ok(())
    }

    /// Save all nodes to JSONL
    fn save(&self) -> Result<()> {
        let Some(dir) = self.data_dir() else {
            return Ok(());
        };
        let file = File::create(Self::nodes_path(&dir))?;
        let mut writer = BufWriter::new(file);

        for node in self.nodes.values() {
            serde_json::to_writer(&mut writer, node)?;
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn index(&mut self, node: Node) {
        if let Some(parent) = node.parent {
            self.children.entry(parent).or_default().insert(node.id);
        }
        self.nodes.insert(node.id, node);
    }

    fn unindex(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        if let Some(parent) = node.parent
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.remove(&id);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
        Some(node)
    }

    fn next_id(&self) -> NodeId {
        self.nodes.keys().next_back().map_or(1, |max| max + 1)
    }

    fn collect(&self, ids: impl Iterator<Item = NodeId>) -> Vec<Node> {
        ids.filter_map(|id| self.nodes.get(&id).cloned()).collect()
    }
}

impl TreeStore for Store {
    fn insert(&mut self, new: NewNode) -> Result<Node> {
        if let Some(parent) = new.parent
            && !self.nodes.contains_key(&parent)
        {
            return Err(Error::InvalidParent(parent));
        }

        let id = match new.id {
            Some(0) => return Err(Error::InvalidId("0".into())),
            Some(id) if self.nodes.contains_key(&id) => return Err(Error::AlreadyExists(id)),
            Some(id) => id,
            None => self.next_id(),
        };

        let node = Node {
            id,
            parent: new.parent,
            title: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        self.index(node.clone());

        if let Err(e) = self.save() {
            self.unindex(id);
            return Err(e);
        }
        Ok(node)
    }

    fn set_title(&mut self, id: NodeId, title: String) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(Error::NotFound(id))?;
        node.title = Some(title);
        node.updated_at = chrono::Utc::now();
        self.save()
    }

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn find_roots(&self) -> Result<Vec<Node>> {
        Ok(self.nodes.values().filter(|n| n.is_root()).cloned().collect())
    }

    fn find_children(&self, id: NodeId) -> Result<Vec<Node>> {
        Ok(match self.children.get(&id) {
            Some(kids) => self.collect(kids.iter().copied()),
            None => Vec::new(),
        })
    }

    fn has_children(&self, id: NodeId) -> Result<bool> {
        Ok(self.children.get(&id).is_some_and(|kids| !kids.is_empty()))
    }

    fn delete(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        if self.has_children(id)? {
            return Err(Error::HasChildren(id));
        }

        let removed = self.unindex(id);
        if let Err(e) = self.save() {
            if let Some(node) = removed {
                self.index(node);
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(nodes: &[Node]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = Store::in_memory();
        let a = store.insert(NewNode::new(None)).unwrap();
        let b = store.insert(NewNode::new(Some(a.id))).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.parent, Some(1));
    }

    #[test]
    fn test_insert_missing_parent_persists_nothing() {
        let mut store = Store::in_memory();
        let err = store.insert(NewNode::new(Some(42))).unwrap_err();
        assert!(matches!(err, Error::InvalidParent(42)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_with_explicit_id() {
        let mut store = Store::in_memory();
        store.insert(NewNode::new(None).with_id(10)).unwrap();
        assert!(matches!(
            store.insert(NewNode::new(None).with_id(10)),
            Err(Error::AlreadyExists(10))
        ));
        assert!(matches!(
            store.insert(NewNode::new(None).with_id(0)),
            Err(Error::InvalidId(_))
        ));
        // Next assigned id continues after the highest one
        assert_eq!(store.insert(NewNode::new(None)).unwrap().id, 11);
    }

    #[test]
    fn test_children_and_roots_are_id_ordered() {
        let mut store = Store::in_memory();
        store.insert(NewNode::new(None).with_id(5)).unwrap();
        store.insert(NewNode::new(None).with_id(2)).unwrap();
        store.insert(NewNode::new(Some(5)).with_id(9)).unwrap();
        store.insert(NewNode::new(Some(5)).with_id(7)).unwrap();

        assert_eq!(ids(&store.find_roots().unwrap()), vec![2, 5]);
        assert_eq!(ids(&store.find_children(5).unwrap()), vec![7, 9]);
        assert!(store.find_children(2).unwrap().is_empty());
        assert!(store.has_children(5).unwrap());
        assert!(!store.has_children(7).unwrap());
    }

    #[test]
    fn test_delete_refuses_parent() {
        let mut store = Store::in_memory();
        let root = store.insert(NewNode::new(None)).unwrap();
        let child = store.insert(NewNode::new(Some(root.id))).unwrap();

        assert!(matches!(store.delete(root.id), Err(Error::HasChildren(1))));
        assert!(store.find_by_id(root.id).unwrap().is_some());

        store.delete(child.id).unwrap();
        assert!(!store.has_children(root.id).unwrap());
        store.delete(root.id).unwrap();
        assert!(store.find_by_id(root.id).unwrap().is_none());
        assert!(matches!(store.delete(root.id), Err(Error::NotFound(1))));
    }

    #[test]
    fn test_set_title() {
        let mut store = Store::in_memory();
        let node = store.insert(NewNode::new(None)).unwrap();
        assert!(node.title.is_none());
        store.set_title(node.id, "One".into()).unwrap();
        let node = store.find_by_id(node.id).unwrap().unwrap();
        assert_eq!(node.title.as_deref(), Some("One"));
        assert!(matches!(
            store.set_title(99, "x".into()),
            Err(Error::NotFound(99))
        ));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = Store::init(dir.path()).unwrap();
            let root = store.insert(NewNode::new(None)).unwrap();
            store.insert(NewNode::new(Some(root.id))).unwrap();
            store.set_title(root.id, "One".into()).unwrap();
        }

        let store = Store::open_at(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(ids(&store.find_children(1).unwrap()), vec![2]);
        assert_eq!(
            store.find_by_id(1).unwrap().unwrap().title.as_deref(),
            Some("One")
        );
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = TempDir::new().unwrap();
        Store::init(dir.path()).unwrap();
        assert!(matches!(
            Store::init(dir.path()),
            Err(Error::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_open_uninitialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Store::open_at(dir.path()),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_load_rejects_dangling_parent() {
        let dir = TempDir::new().unwrap();
        Store::init(dir.path()).unwrap();
        let line = r#"{"id":2,"parent":1,"created_at":"2025-10-07T17:22:31Z","updated_at":"2025-10-07T17:22:31Z"}"#;
        fs::write(
            dir.path().join(NODETREE_DIR).join(NODES_FILE),
            format!("{line}\n"),
        )
        .unwrap();

        assert!(matches!(Store::open_at(dir.path()), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_load_rejects_duplicate_id() {
        let dir = TempDir::new().unwrap();
        Store::init(dir.path()).unwrap();
        let lines = [
            r#"{"id":1,"parent":null,"created_at":"2025-10-07T17:22:31Z","updated_at":"2025-10-07T17:22:31Z"}"#,
            r#"{"id":2,"parent":null,"created_at":"2025-10-07T17:22:31Z","updated_at":"2025-10-07T17:22:31Z"}"#,
            r#"{"id":3,"parent":1,"created_at":"2025-10-07T17:22:31Z","updated_at":"2025-10-07T17:22:31Z"}"#,
            r#"{"id":3,"parent":2,"created_at":"2025-10-07T17:22:31Z","updated_at":"2025-10-07T17:22:31Z"}"#,
        ];
        fs::write(
            dir.path().join(NODETREE_DIR).join(NODES_FILE),
            lines.join("\n") + "\n",
        )
        .unwrap();

        match Store::open_at(dir.path()) {
            Err(Error::Corrupt(msg)) => assert!(msg.contains("duplicate node id 3"), "{msg}"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("duplicate id was accepted"),
        }
    }
}
