//! Table filtering, sorting and configuration.
//!
//! Three collaborating pieces:
//!
//! - [`TableConfig`]: the per-table state machine describing which columns
//!   are displayed, filtered and sorted, plus current filter values and the
//!   page index. It never issues network calls; the table-data endpoint
//!   reads a [`TableQuery`] snapshot to compute the next render.
//! - [`FilterPanel`]: materializes one type-specific filter field per
//!   filtered column and pushes committed values into the configuration.
//! - [`RowSorter`]: in-place stable sort of already-rendered rows for
//!   tables that are not paginated through the server.

mod client_sort;
mod filter_config;
mod filter_panel;

pub use client_sort::{CellKind, RowSorter, SortDirection, TableRow};
pub use filter_config::{
    ColumnSpec, ColumnState, FilterKind, FilterValue, NumericComparator, SortOrder, SortSpec,
    TableConfig, TableQuery,
};
pub use filter_panel::{ColumnChoice, FilterField, FilterPanel};
