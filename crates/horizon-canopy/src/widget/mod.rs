//! Widget controllers.
//!
//! Controllers own their model and gateway exclusively and notify the
//! rendering layer through signals; they never draw anything themselves.

mod tree_view;

pub use tree_view::{TreeView, TreeViewError, TreeViewSignals};
