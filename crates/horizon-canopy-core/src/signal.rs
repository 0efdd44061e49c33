//! Signal/slot system for Horizon Canopy.
//!
//! Widgets emit signals when their state changes and connected slots
//! (callbacks) are invoked in response. All Canopy widgets are
//! single-threaded event-handler code, so slots always run directly in the
//! emitting thread; there is no queued or cross-thread delivery.
//!
//! # Example
//!
//! ```
//! use horizon_canopy_core::Signal;
//!
//! let page_reset = Signal::<usize>::new();
//!
//! let id = page_reset.connect(|page| {
//!     println!("page is now {page}");
//! });
//!
//! page_reset.emit(0);
//! page_reset.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Returned by [`Signal::connect`]; pass it to [`Signal::disconnect`] to
    /// remove the slot. The ID stays valid until the connection is
    /// disconnected or the signal is dropped.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal with any number of connected slots.
///
/// Emitting invokes every connected slot with a reference to the argument.
/// Use `()` for signals with no payload, or a tuple for several values.
///
/// Slots are snapshotted before invocation, so a slot may connect or
/// disconnect other slots on the same signal without deadlocking.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Creates a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connects a slot (closure) to this signal.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
        })
    }

    /// Disconnects a previously connected slot.
    ///
    /// Returns `true` if the connection existed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnects every connected slot.
    pub fn clear(&self) {
        self.connections.lock().clear();
    }

    /// Returns the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Emits the signal, invoking every connected slot.
    ///
    /// Does nothing while the signal is [blocked](Self::set_blocked).
    pub fn emit(&self, args: Args) {
        if self.blocked.load(Ordering::Acquire) {
            tracing::trace!(target: "horizon_canopy::signal", "emit suppressed (blocked)");
            return;
        }

        // Snapshot the slots so handlers can re-entrantly modify connections.
        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = self
            .connections
            .lock()
            .values()
            .map(|c| Arc::clone(&c.slot))
            .collect();

        for slot in slots {
            slot(&args);
        }
    }

    /// Blocks or unblocks emission.
    ///
    /// While blocked, [`emit`](Self::emit) is a no-op. Returns the previous
    /// blocked state.
    pub fn set_blocked(&self, blocked: bool) -> bool {
        self.blocked.swap(blocked, Ordering::AcqRel)
    }

    /// Returns `true` if emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}
