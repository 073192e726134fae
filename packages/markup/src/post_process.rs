//! Rewrites exported markup so spreadsheet placeholders read sensibly outside
//! the editor.
//!
//! Each placeholder gets a static stand-in appended as its last child. Only
//! the stand-ins are inserted; every other byte of the input is kept as is.

use crate::error::MarkupResult;
use crate::escape::escape_html;
use crate::parser::{parse, Close, Fragment};
use tabula_document::attrs::WidgetAttrs;
use tabula_document::schema::parse_element;
use tracing::{debug, instrument, warn};

/// Marker class of an inserted stand-in
pub const STATIC_CLASS: &str = "spreadsheet-static";

/// Text shown in place of the live grid
pub const STATIC_NOTE: &str = "Interactive spreadsheet content";

const STATIC_STYLE: &str =
    "border: 1px solid #ccc; padding: 8px; background-color: #f9f9f9; border-radius: 4px; margin: 8px 0;";
const TITLE_STYLE: &str = "font-weight: bold; margin-bottom: 4px;";
const NOTE_STYLE: &str = "color: #666; font-size: 0.9em;";

/// Append a static stand-in to every spreadsheet placeholder in `html`
///
/// Idempotent: placeholders that already contain a stand-in are skipped.
/// Markup that fails to parse is logged and returned unchanged.
#[instrument(skip(html), fields(len = html.len()))]
pub fn process_spreadsheets_in_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    match try_process(html) {
        Ok(processed) => processed,
        Err(e) => {
            warn!(error = %e, "Could not parse exported markup, leaving it unchanged");
            html.to_string()
        }
    }
}

/// Like [`process_spreadsheets_in_html`] but reports parse failures
pub fn try_process(html: &str) -> MarkupResult<String> {
    let fragment = parse(html)?;
    let mut edits: Vec<Edit> = Vec::new();

    for (index, element) in fragment.elements.iter().enumerate() {
        let Some(attrs) = parse_element(&element.name, &element.attrs) else {
            continue;
        };
        if has_stand_in(&fragment, index) {
            continue;
        }

        let stand_in = render_stand_in(attrs.title.as_deref().unwrap_or_default());
        let edit = match &element.close {
            Close::EndTag(range) => Edit::insert(range.start, stand_in),
            Close::Implicit(at) => Edit::insert(*at, stand_in),
            Close::SelfClosing => {
                // `<div .../>` becomes `<div ...>stand-in</div>`
                let tag = &html[element.start.clone()];
                let slash = tag.rfind('/').unwrap_or(tag.len() - 1);
                Edit {
                    range: element.start.start + slash..element.start.end,
                    text: format!(">{}</{}>", stand_in, element.name),
                }
            }
            Close::Void => continue,
        };
        edits.push(edit);
    }

    if edits.is_empty() {
        return Ok(html.to_string());
    }

    debug!(count = edits.len(), "Inserting spreadsheet stand-ins");
    Ok(apply_edits(html, edits))
}

fn has_stand_in(fragment: &Fragment, index: usize) -> bool {
    fragment
        .descendants(index)
        .any(|i| fragment.elements[i].has_class(STATIC_CLASS))
}

fn render_stand_in(title: &str) -> String {
    let mut out = format!(r#"<div class="{}" style="{}">"#, STATIC_CLASS, STATIC_STYLE);
    if !title.is_empty() {
        out.push_str(&format!(
            r#"<div class="{}-title" style="{}">{}</div>"#,
            STATIC_CLASS,
            TITLE_STYLE,
            escape_html(title)
        ));
    }
    out.push_str(&format!(r#"<div style="{}">{}</div>"#, NOTE_STYLE, STATIC_NOTE));
    out.push_str("</div>");
    out
}

struct Edit {
    range: std::ops::Range<usize>,
    text: String,
}

impl Edit {
    fn insert(at: usize, text: String) -> Self {
        Self { range: at..at, text }
    }
}

fn apply_edits(html: &str, mut edits: Vec<Edit>) -> String {
    // applied back to front so earlier offsets stay valid
    edits.sort_by_key(|edit| edit.range.start);

    let mut out = html.to_string();
    for edit in edits.into_iter().rev() {
        out.replace_range(edit.range, &edit.text);
    }
    out
}

/// Attributes of every placeholder in `html`, in document order
pub fn find_placeholders(html: &str) -> MarkupResult<Vec<WidgetAttrs>> {
    let fragment = parse(html)?;
    Ok(fragment
        .elements
        .iter()
        .filter_map(|element| parse_element(&element.name, &element.attrs))
        .collect())
}
