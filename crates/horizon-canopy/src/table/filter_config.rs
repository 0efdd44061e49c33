//! Per-table filter/sort configuration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use horizon_canopy_core::Signal;
use serde::Serialize;

/// The filter control kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterKind {
    /// Column cannot be filtered.
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "CHECKBOX")]
    Checkbox,
    #[serde(rename = "TEXTFIELD")]
    TextField,
    /// Number with a comparator.
    #[serde(rename = "NUMERIC")]
    Numeric,
    #[serde(rename = "DATERANGE")]
    DateRange,
    /// Multi-select over a fixed option list.
    #[serde(rename = "SELECT")]
    Select,
    /// Free text resolved against a lookup endpoint.
    #[serde(rename = "AUTOCOMPLETE")]
    Autocomplete,
}

/// Comparator applied to a numeric filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericComparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl NumericComparator {
    /// The wire symbol for this comparator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    /// Parses a wire symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }
}

/// A committed filter value; the shape depends on the column's kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Checkbox state.
    Flag(bool),
    /// Free text.
    Text(String),
    /// Number plus comparator.
    Numeric {
        value: f64,
        comparator: NumericComparator,
    },
    /// Inclusive date range; open ends are `None`.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Chosen option values of a multi-select.
    Selection(Vec<String>),
    /// Autocomplete pick: the value and its display content.
    Autocomplete { value: String, content: String },
}

impl FilterValue {
    /// `true` when this value shape belongs to the given column kind.
    pub fn matches_kind(&self, kind: FilterKind) -> bool {
        matches!(
            (self, kind),
            (Self::Flag(_), FilterKind::Checkbox)
                | (Self::Text(_), FilterKind::TextField)
                | (Self::Numeric { .. }, FilterKind::Numeric)
                | (Self::DateRange { .. }, FilterKind::DateRange)
                | (Self::Selection(_), FilterKind::Select)
                | (Self::Autocomplete { .. }, FilterKind::Autocomplete)
        )
    }
}

/// Static description of one selectable column.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Filter control kind.
    pub kind: FilterKind,
    /// Human-readable label shown in the column selector.
    pub label: String,
    /// KPI columns sort after regular columns in selector lists.
    pub is_kpi: bool,
    /// Whether header clicks may sort this column.
    pub sortable: bool,
    /// `(value, label)` options for `Select` columns.
    pub options: Vec<(String, String)>,
    /// Lookup endpoint for `Autocomplete` columns.
    pub lookup_url: Option<String>,
    /// Display format hint forwarded to the renderer.
    pub format: Option<String>,
}

impl ColumnSpec {
    /// Creates a sortable, non-KPI column of the given kind.
    pub fn new(kind: FilterKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            is_kpi: false,
            sortable: true,
            options: Vec::new(),
            lookup_url: None,
            format: None,
        }
    }

    /// Marks the column as a KPI.
    pub fn kpi(mut self) -> Self {
        self.is_kpi = true;
        self
    }

    /// Disables header sorting for this column.
    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Sets the option list of a `Select` column.
    pub fn with_options(mut self, options: Vec<(String, String)>) -> Self {
        self.options = options;
        self
    }

    /// Sets the lookup endpoint of an `Autocomplete` column.
    pub fn with_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.lookup_url = Some(url.into());
        self
    }

    /// Sets the display format hint.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Sort state of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    /// Column is not sortable.
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "UNSORTED")]
    Unsorted,
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

/// Mutable per-column state.
#[derive(Debug, Clone)]
pub struct ColumnState {
    /// Whether the column is rendered.
    pub displayed: bool,
    /// Whether the column currently has a filter field.
    pub filtered: bool,
    /// Header sort state.
    pub sort: SortOrder,
    /// The committed filter value, if any.
    pub value: Option<FilterValue>,
}

/// The active sort column in a [`TableQuery`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// Serializable snapshot read by the table-data endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableQuery {
    /// Zero-based page index.
    pub page: usize,
    /// The single sorted column, if any.
    pub sort: Option<SortSpec>,
    /// Displayed column ids, in column order.
    pub displayed: Vec<String>,
    /// Committed filter values by column id.
    pub filters: BTreeMap<String, FilterValue>,
}

/// Per-table configuration state machine.
///
/// Invariants: at most one column is sorted ascending or descending at any
/// time, and every filter value matches its column's kind. Any filter
/// membership change, filter value change or sort change resets the page
/// to 0 and emits `refresh_requested`; the external collaborator reacts by
/// re-fetching with [`query`](Self::query).
pub struct TableConfig {
    columns: BTreeMap<String, ColumnSpec>,
    states: BTreeMap<String, ColumnState>,
    current_page: usize,
    /// Emitted whenever the configuration changed in a way that requires a
    /// re-render.
    pub refresh_requested: Signal<()>,
}

impl TableConfig {
    /// Creates a configuration for the given columns, all displayed,
    /// unfiltered and unsorted.
    pub fn new(columns: Vec<(String, ColumnSpec)>) -> Self {
        let mut column_map = BTreeMap::new();
        let mut states = BTreeMap::new();
        for (id, spec) in columns {
            states.insert(
                id.clone(),
                ColumnState {
                    displayed: true,
                    filtered: false,
                    sort: if spec.sortable {
                        SortOrder::Unsorted
                    } else {
                        SortOrder::None
                    },
                    value: None,
                },
            );
            column_map.insert(id, spec);
        }
        Self {
            columns: column_map,
            states,
            current_page: 0,
            refresh_requested: Signal::new(),
        }
    }

    /// The static description of a column.
    pub fn column(&self, id: &str) -> Option<&ColumnSpec> {
        self.columns.get(id)
    }

    /// The mutable state of a column.
    pub fn state(&self, id: &str) -> Option<&ColumnState> {
        self.states.get(id)
    }

    /// All column ids, in column order.
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// The current zero-based page index.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Navigates to a page and requests a refresh.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page;
        self.refresh_requested.emit(());
    }

    /// Shows or hides a column. Does not reset the page.
    pub fn set_displayed(&mut self, id: &str, displayed: bool) -> bool {
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        if state.displayed == displayed {
            return true;
        }
        state.displayed = displayed;
        self.refresh_requested.emit(());
        true
    }

    /// Adds or removes a column's filter membership.
    ///
    /// Removing also drops the committed value. Either change resets the
    /// page and requests a refresh.
    pub fn set_filtered(&mut self, id: &str, filtered: bool) -> bool {
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        if state.filtered == filtered {
            return true;
        }
        state.filtered = filtered;
        if !filtered {
            state.value = None;
        }
        self.touch();
        true
    }

    /// Commits a filter value for a column.
    ///
    /// Rejects values whose shape does not match the column's kind. The
    /// column becomes filtered if it was not. Resets the page and requests
    /// a refresh.
    pub fn set_filter_value(&mut self, id: &str, value: FilterValue) -> bool {
        let Some(spec) = self.columns.get(id) else {
            return false;
        };
        if !value.matches_kind(spec.kind) {
            tracing::warn!(
                target: "horizon_canopy::table",
                column = id,
                kind = ?spec.kind,
                "filter value shape does not match column kind"
            );
            return false;
        }
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        state.filtered = true;
        state.value = Some(value);
        self.touch();
        true
    }

    /// Drops a column's committed value, keeping its filter membership.
    pub fn clear_filter_value(&mut self, id: &str) -> bool {
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        if state.value.take().is_some() {
            self.touch();
        }
        true
    }

    /// Cycles a column's sort on a header click: Unsorted → Asc → Desc →
    /// Asc → …, forcing every other sortable column back to Unsorted.
    ///
    /// Returns the column's new sort order; `SortOrder::None` columns are
    /// untouched and no refresh fires.
    pub fn cycle_sort(&mut self, id: &str) -> SortOrder {
        let Some(state) = self.states.get(id) else {
            return SortOrder::None;
        };
        let next = match state.sort {
            SortOrder::None => return SortOrder::None,
            SortOrder::Unsorted | SortOrder::Descending => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Descending,
        };

        for (other_id, other) in self.states.iter_mut() {
            if other.sort != SortOrder::None {
                other.sort = if other_id == id { next } else { SortOrder::Unsorted };
            }
        }
        self.touch();
        next
    }

    /// The single sorted column, if any.
    pub fn sorted_column(&self) -> Option<(&str, SortOrder)> {
        self.states.iter().find_map(|(id, state)| match state.sort {
            SortOrder::Ascending | SortOrder::Descending => {
                Some((id.as_str(), state.sort))
            }
            _ => None,
        })
    }

    /// Column ids in selector order: non-KPI before KPI, alphabetical by
    /// label within each group.
    pub fn selector_order(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        ids.sort_by_key(|id| {
            let spec = &self.columns[*id];
            (spec.is_kpi, spec.label.to_lowercase())
        });
        ids
    }

    /// The snapshot the table-data endpoint reads to compute the next
    /// render.
    pub fn query(&self) -> TableQuery {
        let displayed = self
            .states
            .iter()
            .filter(|(_, state)| state.displayed)
            .map(|(id, _)| id.clone())
            .collect();
        let filters = self
            .states
            .iter()
            .filter(|(_, state)| state.filtered)
            .filter_map(|(id, state)| state.value.clone().map(|v| (id.clone(), v)))
            .collect();
        let sort = self.sorted_column().map(|(column, order)| SortSpec {
            column: column.to_string(),
            order,
        });
        TableQuery {
            page: self.current_page,
            sort,
            displayed,
            filters,
        }
    }

    /// Page reset shared by every filter/sort change.
    fn touch(&mut self) {
        self.current_page = 0;
        self.refresh_requested.emit(());
    }
}

impl std::fmt::Debug for TableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableConfig")
            .field("columns", &self.columns.len())
            .field("current_page", &self.current_page)
            .field("sorted", &self.sorted_column())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_config() -> TableConfig {
        TableConfig::new(vec![
            (
                "name".to_string(),
                ColumnSpec::new(FilterKind::TextField, "Name"),
            ),
            (
                "amount".to_string(),
                ColumnSpec::new(FilterKind::Numeric, "Amount"),
            ),
            (
                "margin".to_string(),
                ColumnSpec::new(FilterKind::Numeric, "Margin").kpi(),
            ),
            (
                "active".to_string(),
                ColumnSpec::new(FilterKind::Checkbox, "Active").not_sortable(),
            ),
        ])
    }

    #[test]
    fn test_activating_filter_resets_page() {
        let mut config = sample_config();
        config.set_page(5);
        assert_eq!(config.current_page(), 5);

        assert!(config.set_filtered("amount", true));
        assert_eq!(config.current_page(), 0);
    }

    #[test]
    fn test_filter_value_change_resets_page_and_requests_refresh() {
        let mut config = sample_config();
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        config.refresh_requested.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        config.set_page(3);
        assert!(config.set_filter_value(
            "amount",
            FilterValue::Numeric {
                value: 100.0,
                comparator: NumericComparator::Ge,
            },
        ));
        assert_eq!(config.current_page(), 0);
        // one refresh for the page change, one for the value
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
        assert!(config.state("amount").unwrap().filtered);
    }

    #[test]
    fn test_filter_value_shape_must_match_kind() {
        let mut config = sample_config();
        assert!(!config.set_filter_value("amount", FilterValue::Text("x".to_string())));
        assert!(config.state("amount").unwrap().value.is_none());
    }

    #[test]
    fn test_unfiltering_clears_value() {
        let mut config = sample_config();
        config.set_filter_value("name", FilterValue::Text("al".to_string()));
        config.set_filtered("name", false);

        let state = config.state("name").unwrap();
        assert!(!state.filtered);
        assert!(state.value.is_none());
    }

    #[test]
    fn test_sort_cycles_and_stays_single_column() {
        let mut config = sample_config();

        assert_eq!(config.cycle_sort("name"), SortOrder::Ascending);
        assert_eq!(config.cycle_sort("name"), SortOrder::Descending);
        assert_eq!(config.cycle_sort("name"), SortOrder::Ascending);

        // sorting another column forces the first back to Unsorted
        assert_eq!(config.cycle_sort("amount"), SortOrder::Ascending);
        assert_eq!(config.state("name").unwrap().sort, SortOrder::Unsorted);
        assert_eq!(config.sorted_column(), Some(("amount", SortOrder::Ascending)));
    }

    #[test]
    fn test_unsortable_column_ignores_header_clicks() {
        let mut config = sample_config();
        assert_eq!(config.cycle_sort("active"), SortOrder::None);
        assert_eq!(config.sorted_column(), None);
    }

    #[test]
    fn test_sort_change_resets_page() {
        let mut config = sample_config();
        config.set_page(2);
        config.cycle_sort("name");
        assert_eq!(config.current_page(), 0);
    }

    #[test]
    fn test_selector_puts_kpi_columns_last() {
        let config = sample_config();
        assert_eq!(config.selector_order(), vec!["active", "amount", "name", "margin"]);
    }

    #[test]
    fn test_query_snapshot() {
        let mut config = sample_config();
        config.set_displayed("active", false);
        config.set_filter_value(
            "amount",
            FilterValue::Numeric {
                value: 42.0,
                comparator: NumericComparator::Lt,
            },
        );
        config.cycle_sort("name");

        let query = config.query();
        assert_eq!(query.page, 0);
        assert_eq!(query.displayed, vec!["amount", "margin", "name"]);
        assert_eq!(
            query.sort,
            Some(SortSpec {
                column: "name".to_string(),
                order: SortOrder::Ascending,
            })
        );

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["sort"]["order"], "ASC");
        assert_eq!(json["filters"]["amount"]["comparator"], "<");
        assert_eq!(json["filters"]["amount"]["value"], 42.0);
    }
}
