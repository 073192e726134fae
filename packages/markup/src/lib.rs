//! # Tabula Markup
//!
//! Reads the static markup a document exports and rewrites spreadsheet
//! placeholders into readable stand-ins.
//!
//! ```
//! use tabula_markup::process_spreadsheets_in_html;
//!
//! let html = r#"<div data-type="spreadsheet" data-title="Budget"></div>"#;
//! let out = process_spreadsheets_in_html(html);
//! assert!(out.contains("spreadsheet-static"));
//! assert_eq!(process_spreadsheets_in_html(&out), out);
//! ```

pub mod error;
pub mod escape;
pub mod lexer;
pub mod parser;
pub mod post_process;

pub use error::{MarkupError, MarkupResult};
pub use parser::{parse, Close, Element, Fragment};
pub use post_process::{
    find_placeholders, process_spreadsheets_in_html, try_process, STATIC_CLASS, STATIC_NOTE,
};
