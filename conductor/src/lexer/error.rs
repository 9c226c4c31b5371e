use thiserror::Error;

/// Line/column position used to report lexical errors with a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unterminated string literal at {0}")]
    UnterminatedString(Position),

    #[error("unterminated quoted identifier at {0}")]
    UnterminatedIdentifier(Position),

    #[error("unterminated comment at {0}")]
    UnterminatedComment(Position),

    #[error("invalid number literal \"{1}\" at {0}")]
    InvalidNumber(Position, String),
}
