use std::fmt;

/// Classification of a lexical token. Classification of alphanumeric tokens is
/// context-sensitive (see [`super::lex`]); everything else is determined by
/// the character(s) alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Identifier,
    Function,
    Number,
    String,
    Operator,
    Punctuation,
    Placeholder,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenType::Keyword => "keyword",
            TokenType::Identifier => "identifier",
            TokenType::Function => "function",
            TokenType::Number => "number",
            TokenType::String => "string",
            TokenType::Operator => "operator",
            TokenType::Punctuation => "punctuation",
            TokenType::Placeholder => "placeholder",
        };
        write!(f, "{}", s)
    }
}

/// A single lexical token. `start`/`end` are byte offsets into the original
/// source text, after comments are conceptually stripped (see
/// [`super::strip_comments`]) but mapped back onto the original offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenType,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenType, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            start,
            end,
        }
    }

    /// Case-insensitive comparison against a keyword/operator spelling.
    pub fn is(&self, text: &str) -> bool {
        self.text.eq_ignore_ascii_case(text)
    }

    pub fn is_kind(&self, kind: TokenType) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
