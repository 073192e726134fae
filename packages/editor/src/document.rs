//! # Document Handle
//!
//! In-memory document host: owns the content tree, applies node-scoped
//! attribute patches and keeps mounted node views informed of changes they
//! did not make themselves.
//!
//! ## Lifecycle
//!
//! ```text
//! Load ──► insert / mount ──► patches from views ──► snapshot / export
//!   │                                  ▲
//!   └──── replace_content (undo) ──────┴──► views refreshed or torn down
//! ```
//!
//! Cloning a `Document` gives another handle to the same state.

use crate::config::SyncConfig;
use crate::host::AttributeHost;
use crate::node_view::{NodeView, NodeViewHandle};
use crate::widget::Widget;
use crate::EditorError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tabula_document::index::{find_by_id, patch_by_id, update_by_id, widget_paths};
use tabula_document::{
    extract_all, is_widget_node, AttributePatch, CellMatrix, ContentNode, IdGenerator,
    WidgetAttrs,
};
use tracing::{debug, info, instrument};

#[derive(Debug)]
struct DocumentState {
    content: ContentNode,
    /// Increments on every change
    version: u64,
    views: HashMap<String, NodeViewHandle>,
}

#[derive(Debug, Clone)]
pub struct Document {
    state: Arc<Mutex<DocumentState>>,
    ids: IdGenerator,
}

impl Document {
    pub fn new(content: ContentNode) -> Self {
        Self {
            state: Arc::new(Mutex::new(DocumentState {
                content,
                version: 0,
                views: HashMap::new(),
            })),
            ids: IdGenerator::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(ContentNode::doc())
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(Self::new(ContentNode::from_json(json)?))
    }

    /// Ids of inserted nodes carry `namespace`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.ids = IdGenerator::with_namespace(namespace);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, DocumentState>, EditorError> {
        Ok(self.state.lock()?)
    }

    pub fn version(&self) -> Result<u64, EditorError> {
        Ok(self.lock()?.version)
    }

    /// Copy of the current tree
    pub fn content(&self) -> Result<ContentNode, EditorError> {
        Ok(self.lock()?.content.clone())
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(self.lock()?.content.to_json()?)
    }

    /// Cell data of every spreadsheet, keyed by id
    pub fn tables(&self) -> Result<BTreeMap<String, CellMatrix>, EditorError> {
        Ok(extract_all(&self.lock()?.content))
    }

    pub fn widget_attrs(&self, id: &str) -> Result<WidgetAttrs, EditorError> {
        let state = self.lock()?;
        find_by_id(&state.content, id)
            .map(WidgetAttrs::from_node)
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))
    }

    /// Insert a new spreadsheet node with default attributes; returns its id
    #[instrument(skip(self))]
    pub fn insert_widget(&self, parent_path: &[usize], index: usize) -> Result<String, EditorError> {
        let id = self.ids.new_id();
        let node = WidgetAttrs::new_with_id(id.clone()).to_node();

        let mut state = self.lock()?;
        state.content.insert_at(parent_path, index, node)?;
        state.version += 1;

        info!(table_id = %id, "Inserted spreadsheet");
        Ok(id)
    }

    /// Attribute host for the spreadsheet at `path`
    pub fn host_for(&self, path: &[usize]) -> Result<NodeHost, EditorError> {
        let state = self.lock()?;
        let node = state
            .content
            .node_at(path)
            .ok_or_else(|| tabula_document::DocumentError::PathNotFound(path.to_vec()))?;
        if !is_widget_node(node) {
            return Err(EditorError::NotAWidget(path.to_vec()));
        }

        Ok(NodeHost {
            state: self.state.clone(),
            id: WidgetAttrs::from_node(node).id,
            path: path.to_vec(),
        })
    }

    /// Bind `widget` to the spreadsheet at `path`
    ///
    /// A node has at most one live view; unmount the old one first. Must be
    /// called within a tokio runtime.
    pub fn mount_view(
        &self,
        path: &[usize],
        widget: Box<dyn Widget>,
        config: SyncConfig,
    ) -> Result<NodeView, EditorError> {
        let host = self.host_for(path)?;
        let attrs = {
            let mut state = self.lock()?;
            let attrs = state
                .content
                .node_at(path)
                .map(WidgetAttrs::from_node)
                .ok_or_else(|| EditorError::NotAWidget(path.to_vec()))?;

            if let Some(id) = &attrs.id {
                match state.views.get(id).map(NodeViewHandle::is_closed) {
                    Some(false) => return Err(EditorError::AlreadyBound(id.clone())),
                    Some(true) => {
                        state.views.remove(id);
                    }
                    None => {}
                }
            }
            attrs
        };

        // the lock must be free here: mounting patches through the host
        let view = NodeView::mount_with_ids(attrs, widget, Box::new(host), config, &self.ids);

        self.lock()?
            .views
            .insert(view.id().to_string(), view.handle());
        Ok(view)
    }

    pub fn view(&self, id: &str) -> Result<Option<NodeViewHandle>, EditorError> {
        Ok(self.lock()?.views.get(id).cloned())
    }

    /// Swap in a whole new tree, e.g. from undo/redo or a remote load
    ///
    /// Bound views whose node survived are refreshed; the rest are torn down.
    #[instrument(skip_all)]
    pub fn replace_content(&self, content: ContentNode) -> Result<(), EditorError> {
        let mut state = self.lock()?;
        state.content = content;
        state.version += 1;
        notify_views(&mut state);
        Ok(())
    }

    /// External rewrite of one spreadsheet's cells
    pub fn set_widget_data(&self, id: &str, data: &CellMatrix) -> Result<(), EditorError> {
        let mut state = self.lock()?;
        if find_by_id(&state.content, id).is_none() {
            return Err(EditorError::NodeNotFound(id.to_string()));
        }
        state.content = update_by_id(&state.content, id, data);
        state.version += 1;
        notify_views(&mut state);
        Ok(())
    }

    /// Remove the spreadsheet with `id` and tear down its view
    pub fn remove_widget(&self, id: &str) -> Result<ContentNode, EditorError> {
        let mut state = self.lock()?;
        let path = widget_paths(&state.content)
            .into_iter()
            .find(|path| {
                state
                    .content
                    .node_at(path)
                    .is_some_and(|node| node.attr_str("id") == Some(id))
            })
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))?;

        let removed = state
            .content
            .remove_at(&path)
            .ok_or_else(|| EditorError::NodeNotFound(id.to_string()))?;
        state.version += 1;

        if let Some(view) = state.views.remove(id) {
            view.destroy();
        }
        info!(table_id = %id, "Removed spreadsheet");
        Ok(removed)
    }
}

fn notify_views(state: &mut DocumentState) {
    let DocumentState { content, views, .. } = state;
    views.retain(|id, view| match find_by_id(content, id) {
        Some(node) => {
            view.node_updated(WidgetAttrs::from_node(node));
            true
        }
        None => {
            debug!(table_id = %id, "Spreadsheet node gone, tearing down its view");
            view.destroy();
            false
        }
    });
}

/// Patch channel for one node of a [`Document`]
///
/// The node is found by id once it has one, and by path before that.
#[derive(Debug)]
pub struct NodeHost {
    state: Arc<Mutex<DocumentState>>,
    id: Option<String>,
    path: Vec<usize>,
}

impl AttributeHost for NodeHost {
    fn update_attributes(&mut self, patch: AttributePatch) -> Result<(), EditorError> {
        let mut state = self.state.lock()?;

        let applied = match &self.id {
            Some(id) => patch_by_id(&mut state.content, id, &patch),
            None => match state.content.node_at_mut(&self.path) {
                Some(node) if is_widget_node(node) => {
                    patch.apply_to(node.attrs_mut());
                    true
                }
                _ => false,
            },
        };

        if !applied {
            let target = self.id.clone().unwrap_or_else(|| format!("{:?}", self.path));
            return Err(EditorError::NodeNotFound(target));
        }

        if let Some(id) = &patch.id {
            self.id = Some(id.clone());
        }
        state.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_widget() -> Document {
        let content: ContentNode = serde_json::from_value(json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [{ "type": "text", "text": "Intro" }] },
                { "type": "spreadsheetNode", "attrs": { "title": "Untitled" } }
            ]
        }))
        .unwrap();
        Document::new(content)
    }

    #[test]
    fn test_host_patches_by_path_then_by_id() {
        let doc = doc_with_widget();
        let mut host = doc.host_for(&[1]).unwrap();

        host.update_attributes(AttributePatch::id("t1")).unwrap();
        assert_eq!(doc.widget_attrs("t1").unwrap().title.as_deref(), Some("Untitled"));

        // a node inserted before it no longer shifts the target
        doc.insert_widget(&[], 0).unwrap();
        host.update_attributes(AttributePatch::title("Budget")).unwrap();
        assert_eq!(doc.widget_attrs("t1").unwrap().title.as_deref(), Some("Budget"));
        assert_eq!(doc.version().unwrap(), 3);
    }

    #[test]
    fn test_host_for_rejects_other_nodes() {
        let doc = doc_with_widget();
        assert!(matches!(doc.host_for(&[0]), Err(EditorError::NotAWidget(_))));
        assert!(matches!(doc.host_for(&[7]), Err(EditorError::Document(_))));
    }

    #[test]
    fn test_insert_widget_uses_defaults() {
        let doc = Document::empty().with_namespace("s1");
        let id = doc.insert_widget(&[], 0).unwrap();

        assert!(id.starts_with("table-s1-"));
        let attrs = doc.widget_attrs(&id).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Spreadsheet"));
        assert_eq!(attrs.data_or_default(), CellMatrix::default_grid());
        assert_eq!(doc.tables().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_widget() {
        let doc = Document::empty();
        let id = doc.insert_widget(&[], 0).unwrap();

        let removed = doc.remove_widget(&id).unwrap();
        assert_eq!(removed.attr_str("id"), Some(id.as_str()));
        assert!(doc.tables().unwrap().is_empty());
        assert!(matches!(doc.remove_widget(&id), Err(EditorError::NodeNotFound(_))));
    }

    #[test]
    fn test_set_widget_data_missing_id() {
        let doc = doc_with_widget();
        let result = doc.set_widget_data("nope", &CellMatrix::default_grid());
        assert!(matches!(result, Err(EditorError::NodeNotFound(_))));
        assert_eq!(doc.version().unwrap(), 0);
    }
}
