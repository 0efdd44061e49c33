//! Autocomplete lookup client for table filter fields.
//!
//! The lookup endpoint takes the typed text as `?query=<text>` and answers
//! with a JSON map of `value -> {name}`. Each autocomplete filter field owns
//! one [`AutocompleteCache`], passed by reference into every lookup, so
//! repeated queries within the field's lifetime never hit the network twice.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use url::Url;

use crate::error::Result;

/// One suggestion as the server reports it.
#[derive(Debug, Clone, Deserialize)]
struct Suggestion {
    name: String,
}

/// A `(value, display name)` suggestion pair.
pub type SuggestionPair = (String, String);

/// Per-field cache of answered autocomplete queries.
///
/// Scoped to the lifetime of the filter field that owns it; dropping the
/// field drops the cache.
#[derive(Debug, Default)]
pub struct AutocompleteCache {
    entries: HashMap<String, Vec<SuggestionPair>>,
}

impl AutocompleteCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached suggestions for `query`, if already answered.
    pub fn get(&self, query: &str) -> Option<&[SuggestionPair]> {
        self.entries.get(query).map(Vec::as_slice)
    }

    /// Stores the suggestions for `query`.
    pub fn insert(&mut self, query: impl Into<String>, suggestions: Vec<SuggestionPair>) {
        self.entries.insert(query.into(), suggestions);
    }

    /// Number of distinct queries cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no query has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all cached queries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Client for one column's autocomplete lookup endpoint.
#[derive(Clone, Debug)]
pub struct AutocompleteClient {
    client: reqwest::Client,
    url: Url,
}

impl AutocompleteClient {
    /// Creates a client for the given lookup URL.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: Url::parse(url)?,
        })
    }

    /// Creates a client reusing an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client, url: &str) -> Result<Self> {
        Ok(Self {
            client,
            url: Url::parse(url)?,
        })
    }

    /// The lookup endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches suggestions for `query`, ordered by value.
    pub async fn lookup(&self, query: &str) -> Result<Vec<SuggestionPair>> {
        tracing::debug!(target: "horizon_canopy_net::autocomplete", query, "lookup");

        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("query", query);

        let response = self.client.get(url).send().await?;
        let response = crate::gateway::check_status(response).await?;

        // BTreeMap keeps the pairs in a deterministic (value) order.
        let map = response.json::<BTreeMap<String, Suggestion>>().await?;
        Ok(map.into_iter().map(|(value, s)| (value, s.name)).collect())
    }

    /// Like [`lookup`](Self::lookup), but served from `cache` when the query
    /// was already answered.
    pub async fn lookup_cached(
        &self,
        cache: &mut AutocompleteCache,
        query: &str,
    ) -> Result<Vec<SuggestionPair>> {
        if let Some(hit) = cache.get(query) {
            tracing::trace!(target: "horizon_canopy_net::autocomplete", query, "cache hit");
            return Ok(hit.to_vec());
        }

        let suggestions = self.lookup(query).await?;
        cache.insert(query, suggestions.clone());
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip() {
        let mut cache = AutocompleteCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("al").is_none());

        cache.insert("al", vec![("3".to_string(), "Alice".to_string())]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("al").unwrap()[0].1, "Alice");

        cache.clear();
        assert!(cache.get("al").is_none());
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        assert!(AutocompleteClient::new("not a url").is_err());
    }
}
