//! Arena-based tree of nodes mirrored from the server.

use std::collections::HashMap;
use std::fmt;

use horizon_canopy_net::{NodeId, NodeRecord};

/// Id of the synthetic root node holding the true top-level nodes.
pub const ROOT_ID: NodeId = 0;

/// Sibling direction for reorder operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Errors from model operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The id is not present in the arena.
    UnknownNode(NodeId),
    /// The node is already the first (up) or last (down) sibling.
    AtBoundary(Direction),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "Unknown node {id}"),
            Self::AtBoundary(Direction::Up) => {
                write!(f, "Node is already the first of its siblings")
            }
            Self::AtBoundary(Direction::Down) => {
                write!(f, "Node is already the last of its siblings")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// One node of the tree.
///
/// `children` is kept ordered by `order` ascending. The ordering is an
/// invariant actively preserved by every insert, remove and swap; it is
/// never re-derived by sorting.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Whether the current user may mutate this node.
    pub manageable: bool,
    /// Position among siblings, ascending.
    pub order: i64,
    /// Whether the node has children on the server (loaded or not).
    pub has_children: bool,
    /// Highest `order` among the node's children, 0 if none.
    pub last_children_order: i64,
    /// Display state; collapsed nodes hide their subtree.
    pub collapsed: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn from_record(record: NodeRecord, parent: NodeId) -> Self {
        Self {
            id: record.id,
            name: record.name,
            manageable: record.manageable,
            order: record.order,
            has_children: record.has_children,
            last_children_order: record.last_children_order,
            collapsed: true,
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    fn synthetic_root() -> Self {
        Self {
            id: ROOT_ID,
            name: String::new(),
            manageable: false,
            order: 0,
            has_children: false,
            last_children_order: 0,
            collapsed: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// The node's parent id; `None` only for the synthetic root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, ordered by `order` ascending.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// `true` once the node's children are in the arena (or it has none).
    ///
    /// A node with `has_children` and an empty child list has not been
    /// expanded yet; its children load lazily on first activation.
    pub fn children_loaded(&self) -> bool {
        !self.has_children || !self.children.is_empty()
    }
}

/// Arena of [`Node`]s keyed by server id.
///
/// One tree per widget instance; the owning widget mutates it exclusively
/// from its own event handlers.
#[derive(Debug)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates an empty tree containing only the synthetic root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID, Node::synthetic_root());
        Self { nodes }
    }

    /// Drops every node, keeping a fresh synthetic root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.insert(ROOT_ID, Node::synthetic_root());
    }

    /// Number of nodes, not counting the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// `true` if only the synthetic root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a node by id. O(1); absent ids yield `None`.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// `true` if the id is present.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The synthetic root.
    pub fn root(&self) -> &Node {
        &self.nodes[&ROOT_ID]
    }

    /// The top-level node ids.
    pub fn roots(&self) -> &[NodeId] {
        self.children_of(ROOT_ID)
    }

    /// Children of `id`, empty for unknown ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Appends a node built from `record` as the last child of `parent_id`.
    ///
    /// Sets the parent's `has_children` and bumps its `last_children_order`.
    /// Returns `None` without touching the tree when the parent reference is
    /// stale (not in the arena).
    pub fn insert_child(&mut self, parent_id: NodeId, record: NodeRecord) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent_id) {
            tracing::warn!(
                target: "horizon_canopy::tree",
                parent_id,
                child_id = record.id,
                "insert against stale parent ignored"
            );
            return None;
        }

        let node = Node::from_record(record, parent_id);
        let id = node.id;
        let order = node.order;
        self.nodes.insert(id, node);

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(id);
            parent.has_children = true;
            if order > parent.last_children_order {
                parent.last_children_order = order;
            }
        }
        Some(id)
    }

    /// Removes a node (and any loaded subtree) by id.
    ///
    /// The parent's `has_children` and `last_children_order` are recomputed
    /// from the remaining ordered children. The synthetic root cannot be
    /// removed. Returns the removed node, or `None` for unknown ids.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if id == ROOT_ID {
            return None;
        }
        let node = self.nodes.remove(&id)?;
        for &child in &node.children {
            self.remove_subtree(child);
        }

        if let Some(parent_id) = node.parent {
            let new_last = self
                .nodes
                .get(&parent_id)
                .map(|parent| {
                    parent
                        .children
                        .iter()
                        .filter(|&&child| child != id)
                        .filter_map(|child| self.nodes.get(child))
                        .map(|child| child.order)
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);

            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|&child| child != id);
                parent.has_children = !parent.children.is_empty();
                parent.last_children_order = new_last;
            }
        }
        Some(node)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Renames a node. Returns `false` for unknown ids.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Sets a node's collapsed flag. Returns `false` for unknown ids.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.collapsed = collapsed;
                true
            }
            None => false,
        }
    }

    /// The adjacent sibling of `id` in the given direction.
    ///
    /// Fails with [`TreeError::AtBoundary`] when the node is already first
    /// (up) or last (down) among its siblings.
    pub fn sibling_in(&self, id: NodeId, direction: Direction) -> Result<NodeId, TreeError> {
        let node = self.get(id).ok_or(TreeError::UnknownNode(id))?;
        let parent_id = node.parent().ok_or(TreeError::UnknownNode(id))?;
        let siblings = self.children_of(parent_id);
        let index = siblings
            .iter()
            .position(|&sibling| sibling == id)
            .ok_or(TreeError::UnknownNode(id))?;

        match direction {
            Direction::Up => {
                if index == 0 {
                    Err(TreeError::AtBoundary(Direction::Up))
                } else {
                    Ok(siblings[index - 1])
                }
            }
            Direction::Down => {
                if index + 1 == siblings.len() {
                    Err(TreeError::AtBoundary(Direction::Down))
                } else {
                    Ok(siblings[index + 1])
                }
            }
        }
    }

    /// Exchanges a node with its adjacent sibling: both the positions in the
    /// parent's child list and the two `order` values are swapped, keeping
    /// the ordering invariant intact.
    ///
    /// Returns the pair `(id, sibling)` that was swapped.
    pub fn swap_with_sibling(
        &mut self,
        id: NodeId,
        direction: Direction,
    ) -> Result<(NodeId, NodeId), TreeError> {
        let sibling = self.sibling_in(id, direction)?;
        let parent_id = self
            .get(id)
            .and_then(Node::parent)
            .ok_or(TreeError::UnknownNode(id))?;

        let (index_a, index_b) = {
            let siblings = self.children_of(parent_id);
            let a = siblings.iter().position(|&n| n == id);
            let b = siblings.iter().position(|&n| n == sibling);
            match (a, b) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(TreeError::UnknownNode(id)),
            }
        };
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.swap(index_a, index_b);
        }

        let order_a = self.get(id).map(|n| n.order).unwrap_or(0);
        let order_b = self.get(sibling).map(|n| n.order).unwrap_or(0);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.order = order_b;
        }
        if let Some(node) = self.nodes.get_mut(&sibling) {
            node.order = order_a;
        }

        Ok((id, sibling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: NodeId, name: &str, order: i64) -> NodeRecord {
        NodeRecord {
            id,
            name: name.to_string(),
            manageable: true,
            order,
            has_children: false,
            last_children_order: 0,
        }
    }

    fn sample_tree() -> NodeTree {
        let mut tree = NodeTree::new();
        tree.insert_child(ROOT_ID, record(1, "A", 1));
        tree.insert_child(ROOT_ID, record(2, "B", 2));
        tree.insert_child(1, record(3, "A1", 1));
        tree.insert_child(1, record(4, "A2", 2));
        tree
    }

    #[test]
    fn test_insert_maintains_parent_invariants() {
        let tree = sample_tree();

        let root = tree.root();
        assert!(root.has_children);
        assert_eq!(root.last_children_order, 2);
        assert_eq!(tree.roots(), &[1, 2]);

        let a = tree.get(1).unwrap();
        assert!(a.has_children);
        assert_eq!(a.last_children_order, 2);
        assert_eq!(a.children(), &[3, 4]);
        assert!(a.children_loaded());
    }

    #[test]
    fn test_insert_with_stale_parent_is_ignored() {
        let mut tree = sample_tree();
        assert_eq!(tree.insert_child(99, record(5, "ghost", 1)), None);
        assert!(!tree.contains(5));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_has_children_tracks_child_list() {
        let mut tree = sample_tree();

        // holds after every add and delete
        assert!(tree.get(1).unwrap().has_children);
        tree.remove(3);
        assert!(tree.get(1).unwrap().has_children);
        assert_eq!(tree.get(1).unwrap().last_children_order, 2);
        tree.remove(4);

        let a = tree.get(1).unwrap();
        assert!(!a.has_children);
        assert_eq!(a.last_children_order, 0);
        assert!(a.children().is_empty());
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = sample_tree();
        let removed = tree.remove(1).unwrap();
        assert_eq!(removed.name, "A");
        assert!(!tree.contains(3));
        assert!(!tree.contains(4));
        assert_eq!(tree.roots(), &[2]);
        assert_eq!(tree.root().last_children_order, 2);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut tree = sample_tree();
        assert!(tree.remove(ROOT_ID).is_none());
        assert!(tree.contains(ROOT_ID));
    }

    #[test]
    fn test_swap_then_swap_back_restores_order() {
        let mut tree = sample_tree();

        tree.swap_with_sibling(1, Direction::Down).unwrap();
        assert_eq!(tree.roots(), &[2, 1]);
        assert_eq!(tree.get(1).unwrap().order, 2);
        assert_eq!(tree.get(2).unwrap().order, 1);

        tree.swap_with_sibling(1, Direction::Up).unwrap();
        assert_eq!(tree.roots(), &[1, 2]);
        assert_eq!(tree.get(1).unwrap().order, 1);
        assert_eq!(tree.get(2).unwrap().order, 2);
    }

    #[test]
    fn test_swap_at_boundary_changes_nothing() {
        let mut tree = sample_tree();

        assert_eq!(
            tree.swap_with_sibling(1, Direction::Up),
            Err(TreeError::AtBoundary(Direction::Up))
        );
        assert_eq!(
            tree.swap_with_sibling(2, Direction::Down),
            Err(TreeError::AtBoundary(Direction::Down))
        );
        assert_eq!(tree.roots(), &[1, 2]);
        assert_eq!(tree.get(1).unwrap().order, 1);
        assert_eq!(tree.get(2).unwrap().order, 2);
    }

    #[test]
    fn test_unknown_node_is_reported() {
        let tree = sample_tree();
        assert_eq!(
            tree.sibling_in(42, Direction::Up),
            Err(TreeError::UnknownNode(42))
        );
        assert!(tree.get(42).is_none());
    }

    #[test]
    fn test_clear_keeps_fresh_root() {
        let mut tree = sample_tree();
        tree.clear();
        assert!(tree.is_empty());
        assert!(!tree.root().has_children);
        assert_eq!(tree.root().last_children_order, 0);
    }
}
