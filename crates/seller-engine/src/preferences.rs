//! Filter preferences that survive restarts. Persistence problems are logged
//! and otherwise ignored.

use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    lead::LeadStatus,
    lead_query::{LeadQuery, SortDirection},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPreferences {
    pub search_term: String,
    pub status_filter: Option<LeadStatus>,
    pub sort_desc: bool,
}

impl Default for FilterPreferences {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status_filter: None,
            sort_desc: true,
        }
    }
}

impl FilterPreferences {
    pub fn from_query(query: &LeadQuery) -> Self {
        Self {
            search_term: query.search.clone(),
            status_filter: query.status,
            sort_desc: query.sort == SortDirection::Descending,
        }
    }

    pub fn to_query(&self) -> LeadQuery {
        LeadQuery {
            search: self.search_term.clone(),
            status: self.status_filter,
            sort: if self.sort_desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }
}

pub trait PreferenceStore {
    fn load(&self) -> FilterPreferences;
    fn save(&self, prefs: &FilterPreferences);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPreferenceStore;

impl PreferenceStore for NoopPreferenceStore {
    fn load(&self) -> FilterPreferences {
        FilterPreferences::default()
    }

    fn save(&self, _prefs: &FilterPreferences) {}
}

#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> FilterPreferences {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return FilterPreferences::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read filter preferences");
                return FilterPreferences::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed filter preferences");
            FilterPreferences::default()
        })
    }

    fn save(&self, prefs: &FilterPreferences) {
        let text = match serde_json::to_string_pretty(prefs) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize filter preferences");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, text) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write filter preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("filters.json");
        let prefs = FilterPreferences {
            search_term: "tech".to_string(),
            status_filter: Some(LeadStatus::Contacted),
            sort_desc: false,
        };
        JsonFilePreferenceStore::new(&path).save(&prefs);
        assert_eq!(JsonFilePreferenceStore::new(&path).load(), prefs);
    }

    #[test]
    fn missing_or_broken_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("filters.json");
        assert_eq!(JsonFilePreferenceStore::new(&path).load(), FilterPreferences::default());

        fs::write(&path, "{not json").expect("write");
        let prefs = JsonFilePreferenceStore::new(&path).load();
        assert!(prefs.sort_desc);
        assert!(prefs.search_term.is_empty());
    }

    #[test]
    fn partial_file_defaults_sort_to_descending() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("filters.json");
        fs::write(&path, r#"{"search_term": "acme"}"#).expect("write");
        let prefs = JsonFilePreferenceStore::new(&path).load();
        assert_eq!(prefs.search_term, "acme");
        assert!(prefs.sort_desc);
        assert_eq!(prefs.to_query().sort, SortDirection::Descending);
    }

    #[test]
    fn query_conversion_keeps_all_fields() {
        let query = LeadQuery {
            search: "globex".to_string(),
            status: Some(LeadStatus::Lost),
            sort: SortDirection::Ascending,
        };
        assert_eq!(FilterPreferences::from_query(&query).to_query(), query);
    }
}
