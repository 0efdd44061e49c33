//! Core systems for Horizon Canopy.
//!
//! This crate provides the signal/slot mechanism used by every Canopy widget
//! for change notification, plus shared logging targets.
//!
//! # Example
//!
//! ```
//! use horizon_canopy_core::Signal;
//!
//! let renamed = Signal::<String>::new();
//! renamed.connect(|name| println!("renamed to {name}"));
//! renamed.emit("Reports".to_string());
//! ```

pub mod logging;
pub mod signal;

pub use signal::{ConnectionId, Signal};
