//! # Tree Indexer
//!
//! Pure functions that locate, extract and rewrite spreadsheet nodes anywhere
//! in a content tree.
//!
//! Traversal is depth-first, pre-order, so results follow document order.
//! Spreadsheet nodes are leaves; their `content` is never visited.

use crate::attrs::{AttributePatch, CellMatrix, WidgetAttrs};
use crate::content::ContentNode;
use crate::schema::NODE_NAME;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

pub fn is_widget_node(node: &ContentNode) -> bool {
    node.node_type == NODE_NAME
}

/// Same check on raw JSON; anything malformed is simply not a widget
pub fn is_widget_value(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some(NODE_NAME)
}

/// All spreadsheet nodes in document order
pub fn find_all(tree: &ContentNode) -> Vec<&ContentNode> {
    let mut found = Vec::new();
    collect(tree, &mut found);
    found
}

fn collect<'a>(node: &'a ContentNode, found: &mut Vec<&'a ContentNode>) {
    if is_widget_node(node) {
        found.push(node);
        return;
    }
    for child in node.children() {
        collect(child, found);
    }
}

/// Key used for a found node: its id, or `table_<index>` without one
fn extraction_key(node: &ContentNode, index: usize) -> String {
    node.attr_str("id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("table_{}", index))
}

/// Stored cell data of a node; `None` when absent or not a valid matrix
fn stored_data(node: &ContentNode, key: &str) -> Option<CellMatrix> {
    let value = node.attr("data").filter(|v| !v.is_null())?;
    let data = CellMatrix::from_json(value);
    if data.is_none() {
        warn!(table_id = %key, "Malformed cell data left out of extraction");
    }
    data
}

/// Cell data of every spreadsheet node, keyed by id
///
/// Nodes without a `data` attribute are left out, and so are nodes whose data
/// is not a rectangular matrix. The default grid is never substituted here.
pub fn extract_all(tree: &ContentNode) -> BTreeMap<String, CellMatrix> {
    let mut tables = BTreeMap::new();
    for (index, node) in find_all(tree).into_iter().enumerate() {
        let key = extraction_key(node, index);
        if let Some(data) = stored_data(node, &key) {
            tables.insert(key, data);
        }
    }
    tables
}

/// Everything persisted for one spreadsheet besides its identity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePayload {
    pub data: CellMatrix,
    pub formulas: Vec<Value>,
    pub named_expressions: Vec<crate::attrs::NamedExpression>,
    pub config: crate::attrs::TableConfig,
}

/// Full payload of every spreadsheet node, keyed like [`extract_all`]
///
/// A node without data gets the default grid; one with malformed data is
/// left out.
pub fn extract_payloads(tree: &ContentNode) -> BTreeMap<String, TablePayload> {
    let mut payloads = BTreeMap::new();
    for (index, node) in find_all(tree).into_iter().enumerate() {
        let key = extraction_key(node, index);
        let attrs = WidgetAttrs::from_node(node);
        let data = if attrs.has_data() {
            match stored_data(node, &key) {
                Some(data) => data,
                None => continue,
            }
        } else {
            CellMatrix::default_grid()
        };
        let payload = TablePayload {
            data,
            formulas: attrs.formulas,
            named_expressions: attrs.named_expressions,
            config: attrs.config,
        };
        payloads.insert(key, payload);
    }
    payloads
}

pub fn find_by_id<'a>(tree: &'a ContentNode, id: &str) -> Option<&'a ContentNode> {
    find_all(tree)
        .into_iter()
        .find(|node| node.attr_str("id") == Some(id))
}

fn find_by_id_mut<'a>(node: &'a mut ContentNode, id: &str) -> Option<&'a mut ContentNode> {
    if is_widget_node(node) {
        return (node.attr_str("id") == Some(id)).then_some(node);
    }
    node.content
        .as_mut()?
        .iter_mut()
        .find_map(|child| find_by_id_mut(child, id))
}

/// Copy of `tree` with the first node matching `id` holding `new_data`
///
/// The input is never touched. A missing id is not an error: the copy comes
/// back unchanged, since the node may have been removed by a concurrent edit.
pub fn update_by_id(tree: &ContentNode, id: &str, new_data: &CellMatrix) -> ContentNode {
    let mut copy = tree.clone();
    let patch = AttributePatch {
        data: Some(new_data.clone()),
        ..Default::default()
    };
    if !patch_by_id(&mut copy, id, &patch) {
        debug!(table_id = %id, "No spreadsheet node with this id, tree unchanged");
    }
    copy
}

/// Apply `patch` in place to the first node matching `id`; false if none matched
pub fn patch_by_id(tree: &mut ContentNode, id: &str, patch: &AttributePatch) -> bool {
    match find_by_id_mut(tree, id) {
        Some(node) => {
            patch.apply_to(node.attrs_mut());
            true
        }
        None => false,
    }
}

/// Paths (child indices from the root) of all spreadsheet nodes, in document order
pub fn widget_paths(tree: &ContentNode) -> Vec<Vec<usize>> {
    fn walk(node: &ContentNode, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if is_widget_node(node) {
            out.push(path.clone());
            return;
        }
        for (i, child) in node.children().iter().enumerate() {
            path.push(i);
            walk(child, path, out);
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(tree, &mut Vec::new(), &mut out);
    out
}

/// Ids that appear on more than one spreadsheet node, in first-seen order
pub fn duplicate_ids(tree: &ContentNode) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for id in find_all(tree).into_iter().filter_map(|node| node.attr_str("id")) {
        if !seen.insert(id) && reported.insert(id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ContentNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_is_widget_value_tolerates_garbage() {
        assert!(is_widget_value(&json!({ "type": "spreadsheetNode" })));
        assert!(!is_widget_value(&json!({ "type": 7 })));
        assert!(!is_widget_value(&json!("spreadsheetNode")));
        assert!(!is_widget_value(&json!(null)));
    }

    #[test]
    fn test_does_not_descend_into_widget() {
        let doc = tree(json!({
            "type": "doc",
            "content": [{
                "type": "spreadsheetNode",
                "attrs": { "id": "outer" },
                "content": [{ "type": "spreadsheetNode", "attrs": { "id": "inner" } }]
            }]
        }));

        let found = find_all(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attr_str("id"), Some("outer"));
    }

    #[test]
    fn test_widget_paths() {
        let doc = tree(json!({
            "type": "doc",
            "content": [
                { "type": "paragraph" },
                { "type": "bulletList", "content": [
                    { "type": "listItem", "content": [{ "type": "spreadsheetNode" }] }
                ]},
                { "type": "spreadsheetNode" }
            ]
        }));

        assert_eq!(widget_paths(&doc), vec![vec![1, 0, 0], vec![2]]);
    }

    #[test]
    fn test_patch_by_id_in_place() {
        let mut doc = tree(json!({
            "type": "doc",
            "content": [{ "type": "spreadsheetNode", "attrs": { "id": "t1", "title": "Old" } }]
        }));

        assert!(patch_by_id(&mut doc, "t1", &AttributePatch::title("New")));
        assert_eq!(doc.children()[0].attr_str("title"), Some("New"));
        assert!(!patch_by_id(&mut doc, "t2", &AttributePatch::title("Nope")));
    }

    #[test]
    fn test_duplicate_ids() {
        let doc = tree(json!({
            "type": "doc",
            "content": [
                { "type": "spreadsheetNode", "attrs": { "id": "a" } },
                { "type": "spreadsheetNode", "attrs": { "id": "b" } },
                { "type": "spreadsheetNode", "attrs": { "id": "a" } },
                { "type": "spreadsheetNode", "attrs": { "id": "a" } },
                { "type": "spreadsheetNode" }
            ]
        }));

        assert_eq!(duplicate_ids(&doc), vec!["a".to_string()]);
    }

    #[test]
    fn test_extract_payloads_include_defaults() {
        let doc = tree(json!({
            "type": "doc",
            "content": [{ "type": "spreadsheetNode", "attrs": { "formulas": [{ "cell": "A1" }] } }]
        }));

        let payloads = extract_payloads(&doc);
        let payload = &payloads["table_0"];
        assert_eq!(payload.data, CellMatrix::default_grid());
        assert_eq!(payload.formulas, vec![json!({ "cell": "A1" })]);
        assert!(payload.config.col_headers);
    }
}
