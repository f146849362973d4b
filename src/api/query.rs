//! Collection filters and their wire/query-string encoding

use std::collections::BTreeMap;

/// A single filter value: free text or a multi-select set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Many(Vec<String>),
}

/// An entity-specific mapping of filter keys to values
///
/// Equality is structural (two filters with the same entries compare
/// equal regardless of construction order), so callers can skip a
/// redundant refetch by comparing filters directly. The canonical string
/// form doubles as the cache-key component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionFilter {
    entries: BTreeMap<String, FilterValue>,
}

impl CollectionFilter {
    /// Wire parameter names observed across the admin API
    pub const SEARCH: &'static str = "search";
    pub const STATUS: &'static str = "status";
    pub const STAGE: &'static str = "stage";
    pub const DATE_FROM: &'static str = "dateFrom";
    pub const DATE_TO: &'static str = "dateTo";
    pub const PENDING_RESPONSE_FROM: &'static str = "pendingResponseFrom";
    pub const EMAIL: &'static str = "email";
    pub const USER_TYPE: &'static str = "userType";
    pub const TYPE: &'static str = "type";

    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued filter; empty values clear the key instead
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if value.trim().is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, FilterValue::Text(value));
        }
        self
    }

    /// Set a multi-valued filter (e.g. multi-select status); empty sets clear the key
    pub fn set_many<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v| !v.trim().is_empty())
            .collect();
        if values.is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, FilterValue::Many(values));
        }
        self
    }

    /// Convenience for the ubiquitous search box
    pub fn search(self, text: impl Into<String>) -> Self {
        self.set(Self::SEARCH, text)
    }

    /// Convenience for a single status value
    pub fn status(self, status: impl Into<String>) -> Self {
        self.set(Self::STATUS, status)
    }

    /// Convenience for a date range; either bound may be empty
    pub fn date_range(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.set(Self::DATE_FROM, from).set(Self::DATE_TO, to)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Query pairs for the wire: `page` and `limit` first, then the filter
    /// entries in key order. Multi-values repeat the key once per value.
    pub fn to_query_pairs(&self, page: u32, limit: u32) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        for (key, value) in &self.entries {
            match value {
                FilterValue::Text(text) => pairs.push((key.clone(), text.clone())),
                FilterValue::Many(values) => {
                    for v in values {
                        pairs.push((key.clone(), v.clone()));
                    }
                }
            }
        }
        pairs
    }

    /// Deterministic string form for cache keys
    ///
    /// Entries appear in key order; multi-values join with `,`. An empty
    /// filter canonicalizes to `-`.
    pub fn canonical(&self) -> String {
        if self.entries.is_empty() {
            return "-".to_string();
        }
        self.entries
            .iter()
            .map(|(key, value)| match value {
                FilterValue::Text(text) => format!("{key}={text}"),
                FilterValue::Many(values) => format!("{key}={}", values.join(",")),
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
