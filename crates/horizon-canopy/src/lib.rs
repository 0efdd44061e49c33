//! Horizon Canopy - client-side tree and table widgets for server-backed data.
//!
//! This is the main umbrella crate. It provides:
//!
//! - [`model`]: the in-memory node arena mirroring a server-side hierarchy.
//! - [`widget`]: the tree view controller that turns user gestures into
//!   gateway calls and reconciles the model from the responses.
//! - [`table`]: the per-table filter/sort configuration, the filter panel
//!   that materializes type-specific filter fields, and the in-place sorter
//!   for already-rendered rows.
//! - [`net`]: the server gateway client (re-exported from
//!   `horizon-canopy-net`).
//!
//! Widgets notify their rendering layer through signals (re-exported from
//! `horizon-canopy-core`); nothing in this crate draws anything itself.

pub use horizon_canopy_core::*;

/// Networking module: the server gateway and autocomplete clients.
pub mod net {
    pub use horizon_canopy_net::*;
}

pub mod model;
pub mod table;
pub mod widget;
