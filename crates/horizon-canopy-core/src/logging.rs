//! Logging facilities for Horizon Canopy.
//!
//! Canopy is instrumented with the `tracing` crate. Install a subscriber in
//! your application to see logs:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem, e.g.
/// `RUST_LOG=horizon_canopy::tree=debug`.
pub mod targets {
    /// Signal emission and blocking.
    pub const SIGNAL: &str = "horizon_canopy::signal";
    /// Tree view gesture handling and model reconciliation.
    pub const TREE: &str = "horizon_canopy::tree";
    /// Table filter/sort configuration changes.
    pub const TABLE: &str = "horizon_canopy::table";
    /// Server gateway requests and responses.
    pub const GATEWAY: &str = "horizon_canopy_net::gateway";
    /// Autocomplete lookups and cache hits.
    pub const AUTOCOMPLETE: &str = "horizon_canopy_net::autocomplete";
}
