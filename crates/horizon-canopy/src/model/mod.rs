//! In-memory node model mirrored from server-side hierarchical records.
//!
//! The model is an arena of nodes keyed by their server id; parent and
//! children are stored as id references, never as nested structures, so a
//! tree view can own the whole model without ownership cycles. A synthetic
//! root node (id 0) holds the true top-level nodes and is never rendered.

mod node_tree;

pub use node_tree::{Direction, Node, NodeTree, ROOT_ID, TreeError};
