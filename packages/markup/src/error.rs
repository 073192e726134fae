use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Unexpected end tag </{name}> at {pos}")]
    UnexpectedEndTag { pos: usize, name: String },

    #[error("Mismatched end tag at {pos}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Element <{name}> opened at {pos} is never closed")]
    Unclosed { pos: usize, name: String },

    #[error("Malformed tag at {pos}")]
    MalformedTag { pos: usize },
}

impl MarkupError {
    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn unexpected_end_tag(pos: usize, name: impl Into<String>) -> Self {
        Self::UnexpectedEndTag {
            pos,
            name: name.into(),
        }
    }

    pub fn mismatched_end_tag(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::MismatchedEndTag {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unclosed(pos: usize, name: impl Into<String>) -> Self {
        Self::Unclosed {
            pos,
            name: name.into(),
        }
    }
}
