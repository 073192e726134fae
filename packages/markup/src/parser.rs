//! # Markup Parser
//!
//! Builds a flat element table over exported markup, keeping byte offsets so
//! callers can splice new content in without re-serializing anything else.
//!
//! The parser is deliberately strict: it accepts what an editor exports
//! (well-formed markup plus the usual optional end tags) and reports
//! everything else as an error.

use crate::error::{MarkupError, MarkupResult};
use crate::lexer::{end_tag_name, parse_start_tag, Token};
use logos::Logos;
use std::ops::Range;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose end tag may be left out
const OPTIONAL_END: &[&str] = &[
    "p", "li", "dt", "dd", "tr", "td", "th", "option", "thead", "tbody", "tfoot", "html",
    "head", "body",
];

/// Elements whose content is not markup
const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

/// How an element ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Close {
    /// Explicit `</name>` spanning this range
    EndTag(Range<usize>),
    /// `<name ... />`
    SelfClosing,
    /// Void element such as `<br>`
    Void,
    /// Closed by a parent's end tag, a sibling or end of input at this offset
    Implicit(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Span of the start tag
    pub start: Range<usize>,
    pub close: Close,
    pub parent: Option<usize>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Offset where content appended as the last child belongs
    pub fn content_end(&self) -> Option<usize> {
        match &self.close {
            Close::EndTag(range) => Some(range.start),
            Close::Implicit(at) => Some(*at),
            Close::SelfClosing | Close::Void => None,
        }
    }
}

/// Parsed markup: elements in document order
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub elements: Vec<Element>,
}

impl Fragment {
    pub fn is_descendant(&self, candidate: usize, ancestor: usize) -> bool {
        let mut current = self.elements[candidate].parent;
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.elements[index].parent;
        }
        false
    }

    /// Indices of all elements nested inside `ancestor`
    pub fn descendants(&self, ancestor: usize) -> impl Iterator<Item = usize> + '_ {
        // descendants always come after their ancestor in document order
        (ancestor + 1..self.elements.len()).filter(move |&i| self.is_descendant(i, ancestor))
    }
}

fn implicitly_closes(open: &str, incoming: &str) -> bool {
    match open {
        "p" => matches!(
            incoming,
            "p" | "div" | "ul" | "ol" | "table" | "pre" | "blockquote" | "h1" | "h2" | "h3"
                | "h4" | "h5" | "h6" | "hr"
        ),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        "tr" => incoming == "tr",
        "option" => incoming == "option",
        _ => false,
    }
}

pub fn parse(source: &str) -> MarkupResult<Fragment> {
    let mut elements: Vec<Element> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = result.map_err(|_| MarkupError::lexer_error(span.start))?;

        match token {
            Token::Comment | Token::Doctype | Token::ProcessingInstruction | Token::Text => {}

            Token::StartTag(slice) => {
                let tag = parse_start_tag(slice)
                    .ok_or(MarkupError::MalformedTag { pos: span.start })?;

                while let Some(&top) = stack.last() {
                    if !implicitly_closes(&elements[top].name, &tag.name) {
                        break;
                    }
                    elements[top].close = Close::Implicit(span.start);
                    stack.pop();
                }

                let is_void = VOID_ELEMENTS.contains(&tag.name.as_str());
                let close = if is_void {
                    Close::Void
                } else if tag.self_closing {
                    Close::SelfClosing
                } else {
                    // placeholder until the end tag is seen
                    Close::Implicit(source.len())
                };
                let leaves_open = !is_void && !tag.self_closing;
                let is_raw = RAW_TEXT.contains(&tag.name.as_str());

                let index = elements.len();
                elements.push(Element {
                    name: tag.name,
                    attrs: tag.attrs,
                    start: span.clone(),
                    close,
                    parent: stack.last().copied(),
                });

                if leaves_open {
                    stack.push(index);
                    if is_raw {
                        skip_raw_text(&mut lexer, &elements[index].name, span.start)?;
                    }
                }
            }

            Token::EndTag(slice) => {
                let name = end_tag_name(slice).ok_or(MarkupError::MalformedTag { pos: span.start })?;

                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }

                let position = stack
                    .iter()
                    .rposition(|&i| elements[i].name == name)
                    .ok_or_else(|| MarkupError::unexpected_end_tag(span.start, &name))?;

                for &open in &stack[position + 1..] {
                    if !OPTIONAL_END.contains(&elements[open].name.as_str()) {
                        return Err(MarkupError::mismatched_end_tag(
                            span.start,
                            &elements[open].name,
                            &name,
                        ));
                    }
                    elements[open].close = Close::Implicit(span.start);
                }

                elements[stack[position]].close = Close::EndTag(span.clone());
                stack.truncate(position);
            }
        }
    }

    if let Some(&open) = stack
        .iter()
        .find(|&&i| !OPTIONAL_END.contains(&elements[i].name.as_str()))
    {
        return Err(MarkupError::unclosed(elements[open].start.start, &elements[open].name));
    }

    Ok(Fragment { elements })
}

/// Advance past raw text content up to (not including) its end tag
fn skip_raw_text<'src>(
    lexer: &mut logos::Lexer<'src, Token<'src>>,
    name: &str,
    opened_at: usize,
) -> MarkupResult<()> {
    let needle = format!("</{}", name);
    let remainder = lexer.remainder();
    let found = remainder
        .to_ascii_lowercase()
        .find(&needle)
        .ok_or_else(|| MarkupError::unclosed(opened_at, name))?;
    lexer.bump(found);
    Ok(())
}
