use thiserror::Error;

/// A syntax error in the template source, with the position the parser had
/// reached when it gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unclosed mustache")]
    UnclosedMustache,

    #[error("unclosed comment")]
    UnclosedComment,

    #[error("unclosed tag <{tag}>")]
    UnclosedTag { tag: String },

    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag { expected: String, found: String },

    #[error("mismatched block close: expected {expected}, found {found}")]
    MismatchedBlockClose { expected: String, found: String },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block params; expected closing '|'")]
    UnclosedBlockParams,

    #[error("invalid number literal: {raw}")]
    InvalidNumber { raw: String },

    #[error("expected {expected}")]
    Expected { expected: &'static str },

    #[error("unexpected {found} with no matching opening")]
    UnexpectedCloser { found: String },
}
