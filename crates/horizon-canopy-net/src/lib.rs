//! Networking module for Horizon Canopy.
//!
//! This crate holds the client side of the Canopy server gateway: the four
//! tree endpoints (manage, load-children, detail click, list navigation) and
//! the autocomplete lookup used by table filter fields.
//!
//! All calls are plain single round trips. There is no retry logic: every
//! failure is terminal for the user action that triggered it, and the caller
//! decides how to surface it (see [`GatewayError::user_message`]).

pub mod autocomplete;
pub mod error;
pub mod gateway;

pub use autocomplete::{AutocompleteCache, AutocompleteClient, SuggestionPair};
pub use error::{GatewayError, Result};
pub use gateway::{
    ManageAction, ManageRequest, NodeId, NodeRecord, TreeGateway, TreeGatewayBuilder,
};
