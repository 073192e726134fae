//! Markup lexer using logos
//!
//! Tokenizes at tag granularity: start tags are matched whole (attributes
//! included) and split afterwards by [`lex_attributes`]. A `<` that starts
//! no valid construct is a lexer error, which callers treat as malformed
//! markup.

use logos::{Lexer, Logos};

/// Top-level markup tokens
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    #[token("<!--", comment)]
    Comment,

    #[regex(r"<![a-zA-Z][^>]*>")]
    Doctype,

    #[regex(r"<\?[^>]*>")]
    ProcessingInstruction,

    // quoted values may contain `>`; the attribute list is checked later by
    // `lex_attributes`
    #[regex(
        r#"<[a-zA-Z][a-zA-Z0-9:_-]*("[^"]*"|'[^']*'|[^"'<>])*>"#,
        |lex| lex.slice()
    )]
    StartTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_-]*[ \t\r\n\f]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+")]
    Text,
}

/// Consume a comment body up to and including `-->`
fn comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// Tokens inside a start tag, after the tag name
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum AttrToken<'src> {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len()-1]
    })]
    DoubleQuoted(&'src str),

    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        &s[1..s.len()-1]
    })]
    SingleQuoted(&'src str),

    #[regex(r#"[^ \t\r\n\f"'=<>`]+"#, |lex| lex.slice())]
    Word(&'src str),
}

/// Parsed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased tag name
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split a start tag slice (`<div a="b">`) into name, attributes and flags
///
/// Attribute names are lowercased; values are entity-decoded. A repeated
/// attribute keeps its first value.
pub fn parse_start_tag(slice: &str) -> Option<StartTag> {
    let inner = slice.strip_prefix('<')?.strip_suffix('>')?.trim_end();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(is_name_char) {
        return None;
    }

    Some(StartTag {
        name,
        attrs: lex_attributes(&inner[name_end..])?,
        self_closing,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-')
}

/// Attribute list of a start tag; `None` if it does not tokenize
pub fn lex_attributes(source: &str) -> Option<Vec<(String, String)>> {
    let tokens = AttrToken::lexer(source)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let AttrToken::Word(name) = token else {
            return None;
        };

        let value = if iter.peek() == Some(&AttrToken::Eq) {
            iter.next();
            match iter.next()? {
                AttrToken::DoubleQuoted(v) | AttrToken::SingleQuoted(v) | AttrToken::Word(v) => {
                    crate::escape::decode_entities(v)
                }
                AttrToken::Eq => return None,
            }
        } else {
            String::new()
        };

        let name = name.to_ascii_lowercase();
        if !attrs.iter().any(|(existing, _)| *existing == name) {
            attrs.push((name, value));
        }
    }

    Some(attrs)
}

/// Lowercased name of an end tag slice (`</div >`)
pub fn end_tag_name(slice: &str) -> Option<String> {
    let name = slice.strip_prefix("</")?.strip_suffix('>')?.trim_end();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Result<Token<'_>, ()>> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_lex_basic_markup() {
        let toks = tokens(r#"<!DOCTYPE html><p class="x">hi<br/></p><!-- note -->"#);
        assert_eq!(
            toks,
            vec![
                Ok(Token::Doctype),
                Ok(Token::StartTag(r#"<p class="x">"#)),
                Ok(Token::Text),
                Ok(Token::StartTag("<br/>")),
                Ok(Token::EndTag("</p>")),
                Ok(Token::Comment),
            ]
        );
    }

    #[test]
    fn test_comment_may_contain_markup() {
        let toks = tokens("<!-- <div> -- --><p></p>");
        assert_eq!(toks[0], Ok(Token::Comment));
        assert_eq!(toks[1], Ok(Token::StartTag("<p>")));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let toks = tokens("<p></p><!-- never closed");
        assert!(toks.iter().any(|t| t.is_err()));
    }

    #[test]
    fn test_stray_angle_bracket_is_error() {
        let toks = tokens("<p>1 < 2</p>");
        assert!(toks.iter().any(|t| t.is_err()));
    }

    #[test]
    fn test_parse_start_tag_attributes() {
        let tag = parse_start_tag(
            r#"<DIV data-type="spreadsheet" data-title='A &amp; B' hidden data-id=t1>"#,
        )
        .unwrap();

        assert_eq!(tag.name, "div");
        assert!(!tag.self_closing);
        assert_eq!(
            tag.attrs,
            vec![
                ("data-type".to_string(), "spreadsheet".to_string()),
                ("data-title".to_string(), "A & B".to_string()),
                ("hidden".to_string(), String::new()),
                ("data-id".to_string(), "t1".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_self_closing_tag() {
        let tag = parse_start_tag(r#"<img src="a.png" />"#).unwrap();
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        assert_eq!(tag.attrs.len(), 1);
    }

    #[test]
    fn test_whitespace_before_tag_end() {
        let toks = tokens(r#"<p class="a" >x<br />y<img src="a.png" /></p>"#);
        assert!(toks.iter().all(|t| t.is_ok()));
        assert_eq!(toks[0], Ok(Token::StartTag(r#"<p class="a" >"#)));
        assert_eq!(toks[2], Ok(Token::StartTag("<br />")));

        let br = parse_start_tag("<br />").unwrap();
        assert_eq!(br.name, "br");
        assert!(br.self_closing);
        assert!(br.attrs.is_empty());

        let p = parse_start_tag(r#"<p class="a" >"#).unwrap();
        assert!(!p.self_closing);
        assert_eq!(p.attrs, vec![("class".to_string(), "a".to_string())]);
    }

    #[test]
    fn test_quoted_value_may_contain_angle_bracket() {
        let toks = tokens(r#"<div title="a > b">x</div>"#);
        assert_eq!(toks[0], Ok(Token::StartTag(r#"<div title="a > b">"#)));
    }

    #[test]
    fn test_malformed_attribute_list_is_rejected() {
        assert!(parse_start_tag(r#"<div a=="b">"#).is_none());
        assert!(parse_start_tag(r#"<div"x">"#).is_none());
    }

    #[test]
    fn test_end_tag_name() {
        assert_eq!(end_tag_name("</DIV >").as_deref(), Some("div"));
        assert_eq!(end_tag_name("</>"), None);
    }
}
