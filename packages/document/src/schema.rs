//! # Spreadsheet Node Schema
//!
//! Declarative shape of the spreadsheet node: node flags, markup parse and
//! serialize rules, and the keyboard shortcuts the node claims from the host.
//!
//! Only `id` and `title` ever reach markup. Cell data, formulas, named
//! expressions and config live in the structured content alone.

use crate::attrs::WidgetAttrs;
use std::fmt;
use std::str::FromStr;

/// Node type name in the content tree
pub const NODE_NAME: &str = "spreadsheetNode";

/// Value of the `data-type` attribute on the markup placeholder
pub const PLACEHOLDER_TYPE: &str = "spreadsheet";

/// Class carried by the serialized placeholder element
pub const PLACEHOLDER_CLASS: &str = "spreadsheet-placeholder";

/// Title used when none is set or the title field is emptied
pub const DEFAULT_TITLE: &str = "Spreadsheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
    Block,
    Inline,
}

/// Node flags understood by the host editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: &'static str,
    pub group: NodeGroup,
    /// Cannot be split or entered by the cursor
    pub atom: bool,
    pub selectable: bool,
    pub draggable: bool,
    /// Editing operations stop at the node boundary
    pub isolating: bool,
    /// Content expression; empty means the node is a leaf
    pub content: &'static str,
}

pub fn node_spec() -> NodeSpec {
    NodeSpec {
        name: NODE_NAME,
        group: NodeGroup::Block,
        atom: true,
        selectable: true,
        draggable: true,
        isolating: true,
        content: "",
    }
}

/// Markup signature recognized as this node type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRule {
    pub tag: &'static str,
    pub attribute: &'static str,
    pub value: &'static str,
}

impl ParseRule {
    pub fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        tag.eq_ignore_ascii_case(self.tag)
            && attrs
                .iter()
                .any(|(name, value)| name.eq_ignore_ascii_case(self.attribute) && value == self.value)
    }
}

pub fn parse_rules() -> [ParseRule; 1] {
    [ParseRule {
        tag: "div",
        attribute: "data-type",
        value: PLACEHOLDER_TYPE,
    }]
}

/// Read node attributes from a matching markup element
///
/// Returns `None` when the element does not match any parse rule. A stored
/// `data-id` is preserved; a missing one stays absent so the node view can
/// synthesize it at bind time.
pub fn parse_element(tag: &str, attrs: &[(String, String)]) -> Option<WidgetAttrs> {
    if !parse_rules().iter().any(|rule| rule.matches(tag, attrs)) {
        return None;
    }

    let lookup = |name: &str| {
        attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
    };

    Some(WidgetAttrs {
        id: lookup("data-id"),
        title: lookup("data-title"),
        ..Default::default()
    })
}

/// Serialize the node to its placeholder element
pub fn render_html(attrs: &WidgetAttrs) -> String {
    format!(
        r#"<div data-type="{}" data-id="{}" data-title="{}" class="{}"></div>"#,
        PLACEHOLDER_TYPE,
        escape_html(attrs.id.as_deref().unwrap_or_default()),
        escape_html(attrs.title_or_default()),
        PLACEHOLDER_CLASS,
    )
}

/// Escape text for use in element content or a quoted attribute value
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Tab,
    Enter,
    Escape,
}

/// Keyboard combination in host notation, e.g. `Shift-Mod-z`
///
/// `Mod` is the platform command key and is kept distinct from `Ctrl`/`Meta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub mod_key: bool,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            alt: false,
            ctrl: false,
            meta: false,
            mod_key: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComboParseError(pub String);

impl fmt::Display for KeyComboParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key combination: {}", self.0)
    }
}

impl std::error::Error for KeyComboParseError {}

impl FromStr for KeyCombo {
    type Err = KeyComboParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || KeyComboParseError(s.to_string());
        let mut parts: Vec<&str> = s.split('-').collect();
        let key_part = parts.pop().filter(|k| !k.is_empty()).ok_or_else(err)?;

        let key = match key_part {
            "Tab" => Key::Tab,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => return Err(err()),
                }
            }
        };

        let mut combo = KeyCombo::new(key);
        for modifier in parts {
            match modifier {
                "Shift" => combo.shift = true,
                "Alt" => combo.alt = true,
                "Ctrl" => combo.ctrl = true,
                "Meta" => combo.meta = true,
                "Mod" => combo.mod_key = true,
                _ => return Err(err()),
            }
        }
        Ok(combo)
    }
}

/// Undo, redo and field navigation are left to the live grid
pub const CLAIMED_SHORTCUTS: [&str; 4] = ["Mod-z", "Shift-Mod-z", "Tab", "Shift-Tab"];

/// Whether the node claims `combo` while focus is inside it
///
/// Always "handled" for the claimed combinations even though the node itself
/// does nothing; the grid's own key handling takes effect instead.
pub fn claims_shortcut(combo: &KeyCombo) -> bool {
    CLAIMED_SHORTCUTS
        .iter()
        .filter_map(|s| s.parse::<KeyCombo>().ok())
        .any(|claimed| claimed == *combo)
}
