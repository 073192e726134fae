//! # Tabula Editor
//!
//! Keeps live spreadsheet widgets and the document nodes that own them in
//! sync.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: content tree, schema, indexer     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: one node view per mounted widget    │
//! │  - bind: synthesize id/title                │
//! │  - initial load, settle, ready              │
//! │  - debounced widget → document commits      │
//! │  - external updates → widget reloads        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ export: JSON, stand-in markup, tables map   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabula_editor::{Document, SyncConfig};
//!
//! let doc = Document::empty();
//! let id = doc.insert_widget(&[], 0)?;
//! let view = doc.mount_view(&[0], Box::new(grid), SyncConfig::default())?;
//!
//! // user edits arrive through the grid's hooks and are committed after 150ms
//!
//! view.unmount().await?;
//! ```

mod config;
mod document;
mod errors;
mod export;
mod guards;
mod host;
mod node_view;
mod widget;

pub use config::{SyncConfig, DEFAULT_DEBOUNCE, DEFAULT_SETTLE_DELAY};
pub use document::{Document, NodeHost};
pub use errors::EditorError;
pub use export::{
    export, load_content, save, storage_key, ContentStore, ExportBundle, MemoryStore, SaveStatus,
    DEFAULT_STORAGE_KEY,
};
pub use guards::GuardSet;
pub use host::AttributeHost;
pub use node_view::{NodeView, NodeViewHandle, ViewState};
pub use widget::{
    CellChange, ChangeSource, StructureChange, Widget, WidgetError, WidgetEvent, WidgetHooks,
};

// Re-export common types for convenience
pub use tabula_document::{AttributePatch, CellMatrix, CellValue, ContentNode, WidgetAttrs};
