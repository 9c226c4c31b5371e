use thiserror::Error;

use crate::lexer;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Token(#[from] lexer::Error),

    #[error("unexpected token \"{found}\" at offset {offset}, expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        offset: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("unsupported statement starting with \"{0}\"")]
    UnsupportedStatement(String),

    #[error("identifiers may contain at most one dot: \"{0}\"")]
    TooManyQualifiers(String),
}
