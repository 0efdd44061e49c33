//! In-place stable sort for already-rendered table rows.
//!
//! Used by tables that are not paginated through the server: the rows are
//! all present client-side, so sorting only reorders them. Rows are always
//! pre-sorted by row id first, which makes tie-breaking deterministic across
//! repeated sorts regardless of the starting order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

/// How a column's cell text is interpreted for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Number,
    Date,
    DateTime,
}

/// Header icon state of a sorted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// One rendered row: its identifier and the cell texts, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new(id: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            id: id.into(),
            cells,
        }
    }
}

/// Sorter over a table's rendered rows.
///
/// Mirrors the row order the view should display; after a sort, the view
/// moves each row into place in [`rows`](Self::rows) order and updates the
/// header icon from the returned direction.
#[derive(Debug)]
pub struct RowSorter {
    rows: Vec<TableRow>,
    icons: HashMap<usize, SortDirection>,
    date_format: String,
    date_time_format: String,
}

impl RowSorter {
    /// Creates a sorter with ISO date formats (`%Y-%m-%d`,
    /// `%Y-%m-%d %H:%M:%S`).
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            icons: HashMap::new(),
            date_format: "%Y-%m-%d".to_string(),
            date_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }

    /// Overrides the format used by [`CellKind::Date`].
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Overrides the format used by [`CellKind::DateTime`].
    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    /// The rows in display order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Consumes the sorter, returning the rows.
    pub fn into_rows(self) -> Vec<TableRow> {
        self.rows
    }

    /// The header icon of a column, if it was ever sorted.
    pub fn direction(&self, column: usize) -> Option<SortDirection> {
        self.icons.get(&column).copied()
    }

    /// Sorts by `column` in the given direction.
    ///
    /// Rows are first ordered by row id, then stably by the typed cell key,
    /// so equal keys always end up in row-id order. Cells that fail to
    /// parse as the requested kind sort before all parseable cells.
    pub fn sort(&mut self, column: usize, kind: CellKind, direction: SortDirection) {
        let date_format = self.date_format.clone();
        let date_time_format = self.date_time_format.clone();

        self.rows.sort_by(|a, b| a.id.cmp(&b.id));

        let compare = move |a: &TableRow, b: &TableRow| -> Ordering {
            let cell_a = a.cells.get(column).map(String::as_str).unwrap_or("");
            let cell_b = b.cells.get(column).map(String::as_str).unwrap_or("");
            match kind {
                CellKind::Text => cell_a.cmp(cell_b),
                CellKind::Number => compare_keys(
                    cell_a.trim().parse::<f64>().ok(),
                    cell_b.trim().parse::<f64>().ok(),
                ),
                CellKind::Date => compare_keys(
                    NaiveDate::parse_from_str(cell_a, &date_format).ok(),
                    NaiveDate::parse_from_str(cell_b, &date_format).ok(),
                ),
                CellKind::DateTime => compare_keys(
                    NaiveDateTime::parse_from_str(cell_a, &date_time_format).ok(),
                    NaiveDateTime::parse_from_str(cell_b, &date_time_format).ok(),
                ),
            }
        };

        match direction {
            SortDirection::Ascending => self.rows.sort_by(|a, b| compare(a, b)),
            SortDirection::Descending => self.rows.sort_by(|a, b| compare(b, a)),
        }
        self.icons.insert(column, direction);
    }

    /// Handles a header click: an ascending column flips to descending,
    /// anything else (unsorted or descending) sorts ascending.
    ///
    /// Returns the new direction for the header icon.
    pub fn toggle_sort(&mut self, column: usize, kind: CellKind) -> SortDirection {
        let next = match self.icons.get(&column) {
            Some(SortDirection::Ascending) => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.sort(column, kind, next);
        next
    }
}

/// `None` (unparseable) keys order before `Some`.
fn compare_keys<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
