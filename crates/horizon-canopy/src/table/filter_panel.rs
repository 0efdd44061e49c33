//! Filter panel: one type-specific input field per filtered column.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use horizon_canopy_net::{
    AutocompleteCache, AutocompleteClient, GatewayError, SuggestionPair,
};

use super::filter_config::{ColumnSpec, FilterKind, FilterValue, NumericComparator, TableConfig};

/// One entry of the column selector control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChoice {
    pub id: String,
    pub label: String,
    pub is_kpi: bool,
    pub displayed: bool,
    pub filtered: bool,
}

/// The editable state of one filter field.
///
/// Autocomplete fields own their lookup client and cache; both live exactly
/// as long as the field does.
pub enum FilterField {
    Checkbox {
        checked: bool,
    },
    Text {
        text: String,
    },
    Numeric {
        text: String,
        comparator: NumericComparator,
    },
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Select {
        chosen: Vec<String>,
    },
    Autocomplete {
        client: AutocompleteClient,
        cache: AutocompleteCache,
        text: String,
        chosen: Option<(String, String)>,
    },
}

impl FilterField {
    /// Builds the empty field matching a column's kind.
    ///
    /// Returns `None` for unfilterable columns and for autocomplete columns
    /// without a usable lookup URL.
    fn for_column(spec: &ColumnSpec) -> Option<Self> {
        match spec.kind {
            FilterKind::None => None,
            FilterKind::Checkbox => Some(Self::Checkbox { checked: false }),
            FilterKind::TextField => Some(Self::Text {
                text: String::new(),
            }),
            FilterKind::Numeric => Some(Self::Numeric {
                text: String::new(),
                comparator: NumericComparator::Eq,
            }),
            FilterKind::DateRange => Some(Self::DateRange {
                from: None,
                to: None,
            }),
            FilterKind::Select => Some(Self::Select { chosen: Vec::new() }),
            FilterKind::Autocomplete => {
                let url = spec.lookup_url.as_deref()?;
                match AutocompleteClient::new(url) {
                    Ok(client) => Some(Self::Autocomplete {
                        client,
                        cache: AutocompleteCache::new(),
                        text: String::new(),
                        chosen: None,
                    }),
                    Err(err) => {
                        tracing::warn!(
                            target: "horizon_canopy::table",
                            url,
                            %err,
                            "invalid autocomplete lookup URL"
                        );
                        None
                    }
                }
            }
        }
    }

    /// The committable value of this field, `None` while it is still empty.
    ///
    /// Numeric text that does not parse yields `None` rather than a bogus
    /// value.
    pub fn value(&self) -> Option<FilterValue> {
        match self {
            Self::Checkbox { checked } => Some(FilterValue::Flag(*checked)),
            Self::Text { text } => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(FilterValue::Text(trimmed.to_string()))
                }
            }
            Self::Numeric { text, comparator } => {
                let value = text.trim().parse::<f64>().ok()?;
                Some(FilterValue::Numeric {
                    value,
                    comparator: *comparator,
                })
            }
            Self::DateRange { from, to } => {
                if from.is_none() && to.is_none() {
                    None
                } else {
                    Some(FilterValue::DateRange {
                        from: *from,
                        to: *to,
                    })
                }
            }
            Self::Select { chosen } => {
                if chosen.is_empty() {
                    None
                } else {
                    Some(FilterValue::Selection(chosen.clone()))
                }
            }
            Self::Autocomplete { chosen, .. } => {
                chosen.as_ref().map(|(value, content)| FilterValue::Autocomplete {
                    value: value.clone(),
                    content: content.clone(),
                })
            }
        }
    }
}

impl std::fmt::Debug for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checkbox { checked } => f.debug_struct("Checkbox").field("checked", checked).finish(),
            Self::Text { text } => f.debug_struct("Text").field("text", text).finish(),
            Self::Numeric { text, comparator } => f
                .debug_struct("Numeric")
                .field("text", text)
                .field("comparator", comparator)
                .finish(),
            Self::DateRange { from, to } => f
                .debug_struct("DateRange")
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::Select { chosen } => f.debug_struct("Select").field("chosen", chosen).finish(),
            Self::Autocomplete { text, chosen, .. } => f
                .debug_struct("Autocomplete")
                .field("text", text)
                .field("chosen", chosen)
                .finish(),
        }
    }
}

/// Owns a [`TableConfig`] plus the filter fields of the filtered columns.
#[derive(Debug)]
pub struct FilterPanel {
    config: TableConfig,
    fields: BTreeMap<String, FilterField>,
}

impl FilterPanel {
    /// Wraps a configuration; no fields exist until filters are toggled on.
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            fields: BTreeMap::new(),
        }
    }

    /// The wrapped configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Mutable access to the wrapped configuration.
    pub fn config_mut(&mut self) -> &mut TableConfig {
        &mut self.config
    }

    /// The selector entries: non-KPI columns first, alphabetical by label
    /// within each group.
    pub fn choices(&self) -> Vec<ColumnChoice> {
        self.config
            .selector_order()
            .into_iter()
            .filter_map(|id| {
                let spec = self.config.column(id)?;
                let state = self.config.state(id)?;
                Some(ColumnChoice {
                    id: id.to_string(),
                    label: spec.label.clone(),
                    is_kpi: spec.is_kpi,
                    displayed: state.displayed,
                    filtered: state.filtered,
                })
            })
            .collect()
    }

    /// Shows or hides a column.
    pub fn set_displayed(&mut self, id: &str, displayed: bool) -> bool {
        self.config.set_displayed(id, displayed)
    }

    /// Toggles a column's filter membership.
    ///
    /// Turning a filter on constructs the type-specific field; turning it
    /// off drops the field (and, for autocomplete, its cache) and clears the
    /// committed value. Returns the new membership state.
    pub fn toggle_filter(&mut self, id: &str) -> bool {
        if self.fields.remove(id).is_some() {
            self.config.set_filtered(id, false);
            return false;
        }

        let Some(spec) = self.config.column(id) else {
            return false;
        };
        let Some(field) = FilterField::for_column(spec) else {
            return false;
        };
        self.fields.insert(id.to_string(), field);
        self.config.set_filtered(id, true);
        true
    }

    /// The filter field of a column, if active.
    pub fn field(&self, id: &str) -> Option<&FilterField> {
        self.fields.get(id)
    }

    /// Mutable access to a column's filter field.
    ///
    /// Mutating a field does not touch the configuration until
    /// [`commit`](Self::commit) is called.
    pub fn field_mut(&mut self, id: &str) -> Option<&mut FilterField> {
        self.fields.get_mut(id)
    }

    /// Pushes a field's current value into the configuration.
    ///
    /// An empty field clears the committed value instead. Either way the
    /// page resets and a refresh is requested.
    pub fn commit(&mut self, id: &str) -> bool {
        let Some(field) = self.fields.get(id) else {
            return false;
        };
        match field.value() {
            Some(value) => self.config.set_filter_value(id, value),
            None => self.config.clear_filter_value(id),
        }
    }

    /// Fetches autocomplete suggestions for a column, served from the
    /// field's cache when the query was already answered.
    pub async fn suggest(
        &mut self,
        id: &str,
        query: &str,
    ) -> Result<Vec<SuggestionPair>, GatewayError> {
        match self.fields.get_mut(id) {
            Some(FilterField::Autocomplete { client, cache, text, .. }) => {
                *text = query.to_string();
                let client = client.clone();
                client.lookup_cached(cache, query).await
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Records the picked suggestion on an autocomplete field and commits
    /// it.
    pub fn choose_suggestion(&mut self, id: &str, value: &str, content: &str) -> bool {
        let Some(FilterField::Autocomplete { chosen, text, .. }) = self.fields.get_mut(id) else {
            return false;
        };
        *chosen = Some((value.to_string(), content.to_string()));
        *text = content.to_string();
        self.commit(id)
    }
}
