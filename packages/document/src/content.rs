//! # Content Tree
//!
//! JSON-compatible block tree shared with the document host.
//!
//! ```text
//! doc
//!  ├─ heading { attrs: { level: 2 } }
//!  │   └─ text "Budget"
//!  └─ bulletList
//!      └─ listItem
//!          └─ spreadsheetNode { attrs: { id, title, data, ... } }
//! ```
//!
//! Keys the model does not know about are kept in `extra` so a
//! load → save round trip never drops host data.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inline formatting mark (bold, link, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl ContentNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: None,
            content: None,
            text: None,
            marks: None,
            extra: Map::new(),
        }
    }

    /// Empty `doc` root
    pub fn doc() -> Self {
        Self::new("doc").with_content(Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::new("text");
        node.text = Some(text.into());
        node
    }

    pub fn with_content(mut self, content: Vec<ContentNode>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_attrs(mut self, attrs: Map<String, Value>) -> Self {
        self.attrs = Some(attrs);
        self
    }

    pub fn from_json(json: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(name))
    }

    /// String attribute, `None` when absent or not a string
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    pub fn attrs_mut(&mut self) -> &mut Map<String, Value> {
        self.attrs.get_or_insert_with(Map::new)
    }

    pub fn children(&self) -> &[ContentNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Node reached by following child indices from this node
    pub fn node_at(&self, path: &[usize]) -> Option<&ContentNode> {
        path.iter()
            .try_fold(self, |node, &index| node.content.as_ref()?.get(index))
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut ContentNode> {
        let mut node = self;
        for &index in path {
            node = node.content.as_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Insert `child` under the node at `parent_path`, clamping `index`
    pub fn insert_at(
        &mut self,
        parent_path: &[usize],
        index: usize,
        child: ContentNode,
    ) -> DocumentResult<Vec<usize>> {
        let parent = self
            .node_at_mut(parent_path)
            .ok_or_else(|| DocumentError::PathNotFound(parent_path.to_vec()))?;

        if parent.text.is_some() {
            return Err(DocumentError::NotAContainer(parent_path.to_vec()));
        }

        let children = parent.content.get_or_insert_with(Vec::new);
        let index = index.min(children.len());
        children.insert(index, child);

        let mut path = parent_path.to_vec();
        path.push(index);
        Ok(path)
    }

    /// Remove and return the node at `path` (the root itself cannot be removed)
    pub fn remove_at(&mut self, path: &[usize]) -> Option<ContentNode> {
        let (&last, parent_path) = path.split_last()?;
        let children = self.node_at_mut(parent_path)?.content.as_mut()?;
        (last < children.len()).then(|| children.remove(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_keeps_unknown_keys() {
        let value = json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "hi", "marks": [{ "type": "bold" }] }
                ]},
                { "type": "twitter", "attrs": { "src": "x" }, "custom": 42 }
            ]
        });

        let node: ContentNode = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[1].extra.get("custom"), Some(&json!(42)));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_node_at_path() {
        let doc = ContentNode::doc().with_content(vec![
            ContentNode::new("paragraph").with_content(vec![ContentNode::text("a")]),
            ContentNode::new("paragraph").with_content(vec![ContentNode::text("b")]),
        ]);

        assert_eq!(doc.node_at(&[1, 0]).and_then(|n| n.text.as_deref()), Some("b"));
        assert!(doc.node_at(&[2]).is_none());
        assert_eq!(doc.node_at(&[]).map(|n| n.node_type.as_str()), Some("doc"));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut doc = ContentNode::doc();
        let path = doc.insert_at(&[], 10, ContentNode::new("paragraph")).unwrap();
        assert_eq!(path, vec![0]);

        let removed = doc.remove_at(&path).unwrap();
        assert_eq!(removed.node_type, "paragraph");
        assert!(doc.children().is_empty());
        assert!(doc.remove_at(&[]).is_none());
    }

    #[test]
    fn test_insert_into_text_fails() {
        let mut doc = ContentNode::doc().with_content(vec![ContentNode::text("x")]);
        let result = doc.insert_at(&[0], 0, ContentNode::new("paragraph"));
        assert!(matches!(result, Err(DocumentError::NotAContainer(_))));
    }
}
