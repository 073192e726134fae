//! Export of a document for persistence
//!
//! A save writes up to three entries under a storage key:
//!
//! - `<key>-json`: the content tree
//! - `<key>-html`: exported markup with spreadsheet stand-ins
//! - `<key>-tables`: id → cell data, only when some spreadsheet has data
//!
//! Where the entries go is up to the [`ContentStore`].

use crate::EditorError;
use std::collections::BTreeMap;
use std::fmt;
use tabula_document::{extract_all, find_all, ContentNode};
use tabula_markup::process_spreadsheets_in_html;
use tracing::{debug, error, warn};

pub const DEFAULT_STORAGE_KEY: &str = "tiptap";

/// Storage key for an editor instance: `tiptap` or `tiptap-<editor id>`
pub fn storage_key(base: &str, editor_id: Option<&str>) -> String {
    match editor_id {
        Some(id) if !id.is_empty() => format!("{}-{}", base, id),
        _ => base.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub json: String,
    pub html: String,
    /// `None` when no spreadsheet carries data
    pub tables: Option<String>,
    /// Number of spreadsheet nodes in the tree
    pub widget_count: usize,
}

impl ExportBundle {
    pub fn build(content: &ContentNode, html: &str) -> Result<Self, EditorError> {
        let widget_count = find_all(content).len();
        if widget_count > 0 {
            debug!(widget_count, "Exporting document with spreadsheets");
        }

        let processed = process_spreadsheets_in_html(html);
        if processed.trim().is_empty() {
            warn!("Exported markup is empty");
        }

        let tables = extract_all(content);
        let tables = if tables.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&tables)?)
        };

        Ok(Self {
            json: serde_json::to_string(content)?,
            html: processed,
            tables,
            widget_count,
        })
    }

    /// `(entry name, value)` pairs under `key`, in write order
    ///
    /// The tree comes first, so a save that stops early never leaves markup
    /// or tables without the tree they were made from.
    pub fn entries(&self, key: &str) -> Vec<(String, &str)> {
        let mut entries = vec![
            (format!("{}-json", key), self.json.as_str()),
            (format!("{}-html", key), self.html.as_str()),
        ];
        if let Some(tables) = &self.tables {
            entries.push((format!("{}-tables", key), tables.as_str()));
        }
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Saved => write!(f, "Saved"),
            SaveStatus::Error => write!(f, "Error saving"),
        }
    }
}

/// Key-value persistence for exported entries
pub trait ContentStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), EditorError>;

    fn get(&self, key: &str) -> Result<Option<String>, EditorError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ContentStore for MemoryStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, EditorError> {
        Ok(self.entries.get(key).cloned())
    }
}

/// Write every entry of `bundle`; a failing write is logged and reported as
/// [`SaveStatus::Error`]
///
/// Writes stop at the first failure and earlier entries stay in the store.
pub fn save(store: &mut dyn ContentStore, key: &str, bundle: &ExportBundle) -> SaveStatus {
    for (name, value) in bundle.entries(key) {
        if let Err(e) = store.put(&name, value) {
            error!(entry = %name, error = %e, "Failed to store content");
            return SaveStatus::Error;
        }
    }
    SaveStatus::Saved
}

/// Build and save in one step
pub fn export(
    store: &mut dyn ContentStore,
    key: &str,
    content: &ContentNode,
    html: &str,
) -> SaveStatus {
    match ExportBundle::build(content, html) {
        Ok(bundle) => save(store, key, &bundle),
        Err(e) => {
            error!(error = %e, "Failed to build export");
            SaveStatus::Error
        }
    }
}

/// Content tree previously saved under `key`
pub fn load_content(store: &dyn ContentStore, key: &str) -> Result<Option<ContentNode>, EditorError> {
    store
        .get(&format!("{}-json", key))?
        .map(|json| Ok(ContentNode::from_json(&json)?))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content() -> ContentNode {
        serde_json::from_value(json!({
            "type": "doc",
            "content": [
                { "type": "spreadsheetNode", "attrs": { "id": "t1", "data": [["a", 1]] } },
                { "type": "spreadsheetNode", "attrs": { "id": "t2" } }
            ]
        }))
        .unwrap()
    }

    struct FailingStore;

    impl ContentStore for FailingStore {
        fn put(&mut self, key: &str, _value: &str) -> Result<(), EditorError> {
            Err(EditorError::Store(format!("quota exceeded writing {}", key)))
        }

        fn get(&self, _key: &str) -> Result<Option<String>, EditorError> {
            Ok(None)
        }
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key(DEFAULT_STORAGE_KEY, None), "tiptap");
        assert_eq!(storage_key(DEFAULT_STORAGE_KEY, Some("")), "tiptap");
        assert_eq!(storage_key(DEFAULT_STORAGE_KEY, Some("e1")), "tiptap-e1");
    }

    #[test]
    fn test_bundle_entries() {
        let bundle = ExportBundle::build(&content(), r#"<div data-type="spreadsheet"></div>"#).unwrap();

        assert_eq!(bundle.widget_count, 2);
        assert!(bundle.html.contains("spreadsheet-static"));
        assert_eq!(bundle.tables.as_deref(), Some(r#"{"t1":[["a",1]]}"#));

        let names: Vec<_> = bundle.entries("doc").into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["doc-json", "doc-html", "doc-tables"]);
    }

    #[test]
    fn test_no_tables_entry_without_data() {
        let bundle = ExportBundle::build(&ContentNode::doc(), "<p></p>").unwrap();
        assert!(bundle.tables.is_none());
        assert_eq!(bundle.entries("k").len(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let status = export(&mut store, "tiptap", &content(), "<p>hi</p>");

        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(status.to_string(), "Saved");
        assert_eq!(
            store.keys().collect::<Vec<_>>(),
            vec!["tiptap-html", "tiptap-json", "tiptap-tables"]
        );
        assert_eq!(load_content(&store, "tiptap").unwrap(), Some(content()));
        assert_eq!(load_content(&store, "other").unwrap(), None);
    }

    /// Accepts the first `limit` writes, then fails
    struct FlakyStore {
        inner: MemoryStore,
        limit: usize,
    }

    impl ContentStore for FlakyStore {
        fn put(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
            if self.limit == 0 {
                return Err(EditorError::Store(format!("disk full writing {}", key)));
            }
            self.limit -= 1;
            self.inner.put(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<String>, EditorError> {
            self.inner.get(key)
        }
    }

    #[test]
    fn test_interrupted_save_keeps_the_tree() {
        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            limit: 1,
        };
        let status = export(&mut store, "tiptap", &content(), "<p></p>");

        assert_eq!(status, SaveStatus::Error);
        assert_eq!(store.inner.keys().collect::<Vec<_>>(), vec!["tiptap-json"]);
        assert_eq!(load_content(&store, "tiptap").unwrap(), Some(content()));
    }

    #[test]
    fn test_store_failure_reports_error() {
        let status = export(&mut FailingStore, "tiptap", &content(), "<p></p>");
        assert_eq!(status, SaveStatus::Error);
        assert_eq!(status.to_string(), "Error saving");
    }
}
