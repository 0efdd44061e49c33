//! Tree view controller.
//!
//! Translates the five user gestures (toggle, add, rename, delete, reorder,
//! plus select) into gateway calls and reconciles the node model from the
//! responses. The rendering layer mirrors the model by connecting slots to
//! [`TreeViewSignals`]; confirmation dialogs (delete) and inline editors are
//! its responsibility, which is why [`TreeView::delete`] assumes the user
//! already confirmed and a successful add emits `edit_requested`.
//!
//! Domain validation (empty name, delete-with-children, reorder at a
//! boundary) fails before any network call. Network failures carry the
//! server's raw response text when present; see
//! [`TreeViewError::user_message`].

use std::fmt;

use horizon_canopy_core::Signal;
use horizon_canopy_net::{GatewayError, ManageRequest, NodeId, NodeRecord, TreeGateway};

use crate::model::{Direction, NodeTree, ROOT_ID, TreeError};

/// Errors from tree view gestures.
#[derive(Debug)]
pub enum TreeViewError {
    /// A trimmed-empty name was submitted.
    EmptyName,
    /// Delete was attempted on a node that still has children.
    HasChildren(NodeId),
    /// Reorder was attempted on the first (up) or last (down) sibling.
    AtBoundary(Direction),
    /// The id is not in the model.
    UnknownNode(NodeId),
    /// A gateway call failed.
    Gateway(GatewayError),
}

impl fmt::Display for TreeViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name must not be empty"),
            Self::HasChildren(id) => {
                write!(f, "Node {id} still has children and cannot be deleted")
            }
            Self::AtBoundary(Direction::Up) => {
                write!(f, "Node is already the first of its siblings")
            }
            Self::AtBoundary(Direction::Down) => {
                write!(f, "Node is already the last of its siblings")
            }
            Self::UnknownNode(id) => write!(f, "Unknown node {id}"),
            Self::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TreeViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for TreeViewError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<TreeError> for TreeViewError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::UnknownNode(id) => Self::UnknownNode(id),
            TreeError::AtBoundary(direction) => Self::AtBoundary(direction),
        }
    }
}

impl TreeViewError {
    /// The text to show the user for this failure.
    ///
    /// Validation errors are self-describing; network failures surface the
    /// server's raw response text when present, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Gateway(err) => err.user_message(fallback),
            other => other.to_string(),
        }
    }
}

/// Change notifications emitted by a [`TreeView`].
pub struct TreeViewSignals {
    /// A node was inserted into the model.
    pub node_inserted: Signal<NodeId>,
    /// A node (and its loaded subtree) was removed.
    pub node_removed: Signal<NodeId>,
    /// A node was renamed.
    pub node_renamed: Signal<NodeId>,
    /// Two siblings exchanged positions: `(moved, other)`.
    pub order_changed: Signal<(NodeId, NodeId)>,
    /// A node was expanded (`true`) or collapsed (`false`).
    pub expansion_changed: Signal<(NodeId, bool)>,
    /// A freshly added node should open in inline edit mode.
    pub edit_requested: Signal<NodeId>,
    /// The current selection changed; `None` clears the detail panel.
    pub selection_changed: Signal<Option<NodeId>>,
    /// The detail fragment for a node arrived: `(id, HTML or JSON)`.
    pub detail_ready: Signal<(NodeId, String)>,
}

impl TreeViewSignals {
    fn new() -> Self {
        Self {
            node_inserted: Signal::new(),
            node_removed: Signal::new(),
            node_renamed: Signal::new(),
            order_changed: Signal::new(),
            expansion_changed: Signal::new(),
            edit_requested: Signal::new(),
            selection_changed: Signal::new(),
            detail_ready: Signal::new(),
        }
    }
}

/// Controller for one server-backed tree.
///
/// Owns its [`NodeTree`] and [`TreeGateway`] exclusively for its lifetime;
/// all mutation goes through its methods, which run in the single UI
/// event-handler thread. Gateway calls await inline, so two gestures on the
/// same instance cannot interleave.
pub struct TreeView {
    tree: NodeTree,
    gateway: TreeGateway,
    signals: TreeViewSignals,
    selected: Option<NodeId>,
    displayed_levels: usize,
    default_name: String,
    refresh_detail_on_mutation: bool,
}

impl TreeView {
    /// Creates a tree view over `gateway` with two eagerly loaded levels,
    /// no detail refresh after mutations, and "New node" as the default
    /// name for added nodes.
    pub fn new(gateway: TreeGateway) -> Self {
        Self {
            tree: NodeTree::new(),
            gateway,
            signals: TreeViewSignals::new(),
            selected: None,
            displayed_levels: 2,
            default_name: "New node".to_string(),
            refresh_detail_on_mutation: false,
        }
    }

    /// Sets how many generations the initial load fetches eagerly.
    pub fn with_displayed_levels(mut self, levels: usize) -> Self {
        self.displayed_levels = levels.max(1);
        self
    }

    /// Sets the name given to freshly added nodes.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Re-fetches the selected node's detail after every successful
    /// mutation.
    pub fn with_detail_refresh(mut self, enabled: bool) -> Self {
        self.refresh_detail_on_mutation = enabled;
        self
    }

    /// The node model.
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The change notification signals.
    pub fn signals(&self) -> &TreeViewSignals {
        &self.signals
    }

    /// The currently selected node, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Loads the tree from scratch.
    ///
    /// Fetches the root nodes, then walks `displayed_levels` generations
    /// eagerly, inserting them pre-expanded. Deeper levels load lazily on
    /// first activation, driven by each node's `has_children` flag.
    pub async fn load(&mut self) -> Result<(), TreeViewError> {
        self.tree.clear();
        if self.selected.take().is_some() {
            self.signals.selection_changed.emit(None);
        }

        let roots = self.gateway.load_children(None).await?;
        let mut frontier = Vec::new();
        for record in roots {
            if let Some(id) = self.insert_record(ROOT_ID, record, false) {
                frontier.push(id);
            }
        }

        for _ in 1..self.displayed_levels {
            let mut next = Vec::new();
            for id in frontier {
                if !self.tree.get(id).is_some_and(|n| n.has_children) {
                    continue;
                }
                let records = self.gateway.load_children(Some(id)).await?;
                for record in records {
                    if let Some(child) = self.insert_record(id, record, false) {
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }

        tracing::debug!(
            target: "horizon_canopy::tree",
            nodes = self.tree.len(),
            levels = self.displayed_levels,
            "initial load complete"
        );
        Ok(())
    }

    /// Handles an activation of a node's expander.
    ///
    /// The first activation of an unloaded node fetches its children and
    /// expands it; afterwards this is a pure visibility toggle with no
    /// network call.
    pub async fn toggle(&mut self, id: NodeId) -> Result<(), TreeViewError> {
        let (loaded, collapsed) = {
            let node = self.tree.get(id).ok_or(TreeViewError::UnknownNode(id))?;
            (node.children_loaded(), node.collapsed)
        };

        if !loaded {
            let records = self.gateway.load_children(Some(id)).await?;
            for record in records {
                self.insert_record(id, record, true);
            }
            self.tree.set_collapsed(id, false);
            self.signals.expansion_changed.emit((id, true));
        } else {
            self.tree.set_collapsed(id, !collapsed);
            self.signals.expansion_changed.emit((id, collapsed));
        }
        Ok(())
    }

    /// Adds a node under `parent`, or a new top-level node for `None`.
    ///
    /// An unexpanded parent is expanded first (loading its children), so the
    /// new node never masks server-side children the model has not seen yet.
    /// The node is created with the default name and `order` one past the
    /// parent's last child; on success it is inserted as the last child and
    /// `edit_requested` fires so the view opens it in inline edit mode.
    pub async fn add_child(&mut self, parent: Option<NodeId>) -> Result<NodeId, TreeViewError> {
        let (request, parent_id) = match parent {
            Some(parent_id) => {
                if !self.tree.contains(parent_id) {
                    return Err(TreeViewError::UnknownNode(parent_id));
                }
                if !self
                    .tree
                    .get(parent_id)
                    .is_some_and(|n| n.children_loaded())
                {
                    let records = self.gateway.load_children(Some(parent_id)).await?;
                    for record in records {
                        self.insert_record(parent_id, record, false);
                    }
                    self.tree.set_collapsed(parent_id, false);
                    self.signals.expansion_changed.emit((parent_id, true));
                }
                let node = self
                    .tree
                    .get(parent_id)
                    .ok_or(TreeViewError::UnknownNode(parent_id))?;
                (
                    ManageRequest::add(parent_id, &self.default_name, node.last_children_order + 1),
                    parent_id,
                )
            }
            None => (
                ManageRequest::add_root(&self.default_name, self.tree.root().last_children_order + 1),
                ROOT_ID,
            ),
        };

        let record = self.gateway.manage(&request).await?;
        let id = record.id;
        self.insert_record(parent_id, record, true);
        self.signals.edit_requested.emit(id);
        self.refresh_detail().await;
        Ok(id)
    }

    /// Renames a node from an inline edit.
    ///
    /// A trimmed-empty name blocks the submit before any network call.
    pub async fn rename(&mut self, id: NodeId, name: &str) -> Result<(), TreeViewError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TreeViewError::EmptyName);
        }
        if !self.tree.contains(id) {
            return Err(TreeViewError::UnknownNode(id));
        }

        let record = self.gateway.manage(&ManageRequest::edit(id, trimmed)).await?;
        self.tree.set_name(id, record.name);
        self.signals.node_renamed.emit(id);
        self.refresh_detail().await;
        Ok(())
    }

    /// Deletes a node the user already confirmed.
    ///
    /// Fails without a server call while the node has children. Deleting the
    /// selected node clears the selection (and thereby the detail panel).
    pub async fn delete(&mut self, id: NodeId) -> Result<(), TreeViewError> {
        let node = self.tree.get(id).ok_or(TreeViewError::UnknownNode(id))?;
        if node.has_children {
            return Err(TreeViewError::HasChildren(id));
        }

        self.gateway.manage(&ManageRequest::delete(id)).await?;
        self.tree.remove(id);
        if self.selected == Some(id) {
            self.selected = None;
            self.signals.selection_changed.emit(None);
        }
        self.signals.node_removed.emit(id);
        self.refresh_detail().await;
        Ok(())
    }

    /// Moves a node one position up or down among its siblings.
    ///
    /// Issues two dependent change-order calls swapping the two siblings'
    /// `order` values; the second goes out only once the first succeeded,
    /// and the local swap applies only after both. Failure of either call
    /// aborts with the model unchanged. There is no compensating call when
    /// the second fails after the first succeeded, so model and server can
    /// diverge on that path; callers recover with a full [`load`](Self::load).
    pub async fn move_node(&mut self, id: NodeId, direction: Direction) -> Result<(), TreeViewError> {
        let sibling = self.tree.sibling_in(id, direction)?;
        let node_order = self
            .tree
            .get(id)
            .map(|n| n.order)
            .ok_or(TreeViewError::UnknownNode(id))?;
        let sibling_order = self
            .tree
            .get(sibling)
            .map(|n| n.order)
            .ok_or(TreeViewError::UnknownNode(sibling))?;

        self.gateway
            .manage(&ManageRequest::change_order(id, sibling_order))
            .await?;
        self.gateway
            .manage(&ManageRequest::change_order(sibling, node_order))
            .await?;

        self.tree.swap_with_sibling(id, direction)?;
        self.signals.order_changed.emit((id, sibling));
        self.refresh_detail().await;
        Ok(())
    }

    /// Selects a node and fetches its detail fragment.
    pub async fn select(&mut self, id: NodeId) -> Result<(), TreeViewError> {
        if !self.tree.contains(id) {
            return Err(TreeViewError::UnknownNode(id));
        }
        self.selected = Some(id);
        self.signals.selection_changed.emit(Some(id));

        let detail = self.gateway.fetch_detail(id).await?;
        self.signals.detail_ready.emit((id, detail));
        Ok(())
    }

    fn insert_record(
        &mut self,
        parent_id: NodeId,
        record: NodeRecord,
        collapsed: bool,
    ) -> Option<NodeId> {
        let id = self.tree.insert_child(parent_id, record)?;
        self.tree.set_collapsed(id, collapsed);
        self.signals.node_inserted.emit(id);
        Some(id)
    }

    /// Re-fetches the selected node's detail after a successful mutation.
    ///
    /// The mutation already succeeded, so a failing refresh is only logged.
    async fn refresh_detail(&mut self) {
        if !self.refresh_detail_on_mutation {
            return;
        }
        let Some(id) = self.selected else {
            return;
        };
        match self.gateway.fetch_detail(id).await {
            Ok(detail) => self.signals.detail_ready.emit((id, detail)),
            Err(err) => {
                tracing::warn!(target: "horizon_canopy::tree", id, %err, "detail refresh failed");
            }
        }
    }
}

impl fmt::Debug for TreeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeView")
            .field("nodes", &self.tree.len())
            .field("selected", &self.selected)
            .field("displayed_levels", &self.displayed_levels)
            .finish()
    }
}
