//! # Tabula Document
//!
//! Content tree model and everything that can be done to spreadsheet nodes
//! without a live grid:
//!
//! - [`schema`]: node flags, markup parse/serialize rules, claimed shortcuts
//! - [`attrs`]: typed, lenient view over a node's attributes
//! - [`index`]: find, extract and rewrite spreadsheet nodes in a tree
//! - [`id_generator`]: node identifiers

pub mod attrs;
pub mod content;
pub mod error;
pub mod id_generator;
pub mod index;
pub mod schema;
pub mod settings;

pub use attrs::{
    AttributePatch, CellMatrix, CellValue, ExpressionValue, NamedExpression, TableConfig,
    WidgetAttrs,
};
pub use content::{ContentNode, Mark};
pub use error::{DocumentError, DocumentResult};
pub use id_generator::{generate_id, IdGenerator};
pub use index::{
    duplicate_ids, extract_all, extract_payloads, find_all, find_by_id, is_widget_node,
    is_widget_value, patch_by_id, update_by_id, widget_paths, TablePayload,
};
pub use schema::{claims_shortcut, KeyCombo, DEFAULT_TITLE, NODE_NAME};
pub use settings::WidgetSettings;
