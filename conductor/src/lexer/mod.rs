//! SQL lexer. Produces a flat, position-tagged token stream; classification
//! of alphanumeric tokens (keyword vs. identifier vs. function) is
//! context-sensitive and resolved in a second pass over the raw tokens.

mod error;
mod keywords;
mod token;

pub use error::{Error, Position};
pub use token::{Token, TokenType};

/// Replace comments with whitespace, preserving newlines and byte length so
/// that offsets reported for the remaining tokens still index into the
/// original source text.
fn strip_comments(source: &str) -> Result<String, Error> {
    let bytes = source.as_bytes();
    let mut out = vec![b' '; bytes.len()];
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'-' && i + 1 < bytes.len() && bytes[i + 1] == b'-' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            let start = i;
            i += 2;
            let mut closed = false;
            while i + 1 < bytes.len() {
                if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                    i += 2;
                    closed = true;
                    break;
                }
                if bytes[i] == b'\n' {
                    out[i] = b'\n';
                }
                i += 1;
            }
            if !closed {
                return Err(Error::UnterminatedComment(position_of(source, start)));
            }
            continue;
        }
        // Inside string/identifier literals comments are not special, but we
        // don't need to special-case them here: -- and /* sequences do not
        // occur meaningfully inside a properly quoted literal body for this
        // dialect, and if they do, stripping them as whitespace would corrupt
        // the literal. So we must not strip inside quotes.
        if c == b'\'' || c == b'"' || c == b'`' {
            let quote = c;
            out[i] = c;
            i += 1;
            while i < bytes.len() {
                out[i] = bytes[i];
                if bytes[i] == quote {
                    if i + 1 < bytes.len() && bytes[i + 1] == quote {
                        out[i + 1] = bytes[i + 1];
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                i += 1;
            }
            continue;
        }
        out[i] = c;
        i += 1;
    }
    Ok(String::from_utf8(out).expect("comment stripping preserves UTF-8 boundaries"))
}

fn position_of(source: &str, offset: usize) -> Position {
    let mut line = 1;
    let mut column = 1;
    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position { line, column }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Word,
    Number,
    String,
    Operator,
    Punctuation,
    Placeholder,
}

struct RawToken {
    text: String,
    kind: RawKind,
    start: usize,
    end: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn tokenize_raw(source: &str, clean: &str) -> Result<Vec<RawToken>, Error> {
    let chars: Vec<(usize, char)> = clean.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '\'' {
            let (text, end, next) = scan_quoted(&chars, i, source, '\'', true)?;
            tokens.push(RawToken {
                text,
                kind: RawKind::String,
                start,
                end,
            });
            i = next;
            continue;
        }

        if c == '"' || c == '`' {
            let (text, end, next) = scan_quoted(&chars, i, source, c, false)?;
            tokens.push(RawToken {
                text,
                kind: RawKind::Word,
                start,
                end,
            });
            i = next;
            continue;
        }

        if c == '?' {
            tokens.push(RawToken {
                text: "?".into(),
                kind: RawKind::Placeholder,
                start,
                end: start + 1,
            });
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|(_, d)| d.is_ascii_digit())) {
            let (text, end, next) = scan_number(&chars, i, source)?;
            tokens.push(RawToken {
                text,
                kind: RawKind::Number,
                start,
                end,
            });
            i = next;
            continue;
        }

        if is_ident_start(c) {
            let mut j = i + 1;
            while j < chars.len() && is_ident_continue(chars[j].1) {
                j += 1;
            }
            let end = if j < chars.len() { chars[j].0 } else { clean.len() };
            tokens.push(RawToken {
                text: clean[start..end].to_string(),
                kind: RawKind::Word,
                start,
                end,
            });
            i = j;
            continue;
        }

        if let Some((op, width)) = scan_operator(&chars, i) {
            tokens.push(RawToken {
                text: op,
                kind: RawKind::Operator,
                start,
                end: start + width,
            });
            i += width;
            continue;
        }

        if matches!(c, '(' | ')' | ',' | ';') {
            tokens.push(RawToken {
                text: c.to_string(),
                kind: RawKind::Punctuation,
                start,
                end: start + c.len_utf8(),
            });
            i += 1;
            continue;
        }

        // Unknown character: treat as single-char punctuation rather than
        // failing the whole statement; the parser will reject it in context.
        tokens.push(RawToken {
            text: c.to_string(),
            kind: RawKind::Punctuation,
            start,
            end: start + c.len_utf8(),
        });
        i += 1;
    }

    Ok(tokens)
}

/// Scan a quoted region starting at `chars[i]` (the opening quote). When
/// `unescape` is true (string literals), `''` collapses to `'` and `\x`
/// escapes are honored in the returned text; quoted identifiers are returned
/// verbatim without escape processing.
fn scan_quoted(
    chars: &[(usize, char)],
    i: usize,
    source: &str,
    quote: char,
    unescape: bool,
) -> Result<(String, usize, usize), Error> {
    let start = chars[i].0;
    let mut j = i + 1;
    let mut value = String::new();

    loop {
        if j >= chars.len() {
            return Err(if quote == '\'' {
                Error::UnterminatedString(position_of(source, start))
            } else {
                Error::UnterminatedIdentifier(position_of(source, start))
            });
        }

        let (_, c) = chars[j];

        if c == quote {
            // Doubled quote -> literal quote character, stay inside the literal.
            if chars.get(j + 1).map(|&(_, d)| d) == Some(quote) {
                value.push(quote);
                j += 2;
                continue;
            }
            j += 1;
            break;
        }

        if unescape && c == '\\' && j + 1 < chars.len() {
            let (_, next) = chars[j + 1];
            value.push(match next {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            j += 2;
            continue;
        }

        value.push(c);
        j += 1;
    }

    let end = if j < chars.len() { chars[j].0 } else { source.len() };
    Ok((value, end, j))
}

fn scan_number(
    chars: &[(usize, char)],
    i: usize,
    source: &str,
) -> Result<(String, usize, usize), Error> {
    let start = chars[i].0;
    let mut j = i;

    if chars[j].1 == '0' && chars.get(j + 1).map(|&(_, c)| c) == Some('x') {
        j += 2;
        let digit_start = j;
        while j < chars.len() && chars[j].1.is_ascii_hexdigit() {
            j += 1;
        }
        if j == digit_start {
            return Err(Error::InvalidNumber(
                position_of(source, start),
                slice_to(chars, start, j, source),
            ));
        }
        let end = end_of(chars, j, source);
        return Ok((slice_to(chars, start, j, source), end, j));
    }

    if chars[j].1 == '0' && chars.get(j + 1).map(|&(_, c)| c) == Some('b') {
        j += 2;
        let digit_start = j;
        while j < chars.len() && matches!(chars[j].1, '0' | '1') {
            j += 1;
        }
        if j == digit_start {
            return Err(Error::InvalidNumber(
                position_of(source, start),
                slice_to(chars, start, j, source),
            ));
        }
        let end = end_of(chars, j, source);
        return Ok((slice_to(chars, start, j, source), end, j));
    }

    while j < chars.len() && chars[j].1.is_ascii_digit() {
        j += 1;
    }

    if j < chars.len() && chars[j].1 == '.' {
        j += 1;
        while j < chars.len() && chars[j].1.is_ascii_digit() {
            j += 1;
        }
    }

    if j < chars.len() && matches!(chars[j].1, 'e' | 'E') {
        let mark = j;
        j += 1;
        if j < chars.len() && matches!(chars[j].1, '+' | '-') {
            j += 1;
        }
        let digit_start = j;
        while j < chars.len() && chars[j].1.is_ascii_digit() {
            j += 1;
        }
        if j == digit_start {
            // Not actually an exponent (e.g. trailing bare `e`); back off.
            j = mark;
        }
    }

    let end = end_of(chars, j, source);
    Ok((slice_to(chars, start, j, source), end, j))
}

fn end_of(chars: &[(usize, char)], j: usize, source: &str) -> usize {
    if j < chars.len() {
        chars[j].0
    } else {
        source.len()
    }
}

fn slice_to(chars: &[(usize, char)], start: usize, j: usize, source: &str) -> String {
    let end = end_of(chars, j, source);
    source[start..end].to_string()
}

fn scan_operator(chars: &[(usize, char)], i: usize) -> Option<(String, usize)> {
    let (_, c) = chars[i];
    let next = chars.get(i + 1).map(|&(_, c)| c);

    let two = match (c, next) {
        ('<', Some('=')) => Some("<="),
        ('>', Some('=')) => Some(">="),
        ('!', Some('=')) => Some("!="),
        ('<', Some('>')) => Some("<>"),
        _ => None,
    };
    if let Some(op) = two {
        return Some((op.to_string(), 2));
    }

    if matches!(c, '<' | '>' | '=' | '+' | '-' | '*' | '/' | '.') {
        return Some((c.to_string(), 1));
    }

    None
}

/// Tokenize raw SQL text into a position-tagged token stream.
pub fn lex(source: &str) -> Result<Vec<Token>, Error> {
    let clean = strip_comments(source)?;
    let raw = tokenize_raw(source, &clean)?;
    Ok(classify(raw))
}

fn classify(raw: Vec<RawToken>) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());

    for (idx, tok) in raw.iter().enumerate() {
        let kind = match tok.kind {
            RawKind::String => TokenType::String,
            RawKind::Number => TokenType::Number,
            RawKind::Operator => TokenType::Operator,
            RawKind::Punctuation => TokenType::Punctuation,
            RawKind::Placeholder => TokenType::Placeholder,
            RawKind::Word => {
                let next_is_paren = raw
                    .get(idx + 1)
                    .is_some_and(|n| n.kind == RawKind::Punctuation && n.text == "(");

                if next_is_paren && keywords::is_function(&tok.text) {
                    TokenType::Function
                } else {
                    let prev = tokens.last();
                    let follows_ident_or_as = matches!(prev, Some(p) if p.kind == TokenType::Identifier)
                        || matches!(prev, Some(p) if p.kind == TokenType::Keyword && p.is("AS"));

                    if keywords::is_data_type(&tok.text) && follows_ident_or_as {
                        TokenType::Keyword
                    } else if keywords::is_keyword(&tok.text) {
                        TokenType::Keyword
                    } else {
                        TokenType::Identifier
                    }
                }
            }
        };

        tokens.push(Token::new(tok.text.clone(), kind, tok.start, tok.end));
    }

    tokens
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_select() {
        let tokens = lex("SELECT id FROM users WHERE id = ?").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["SELECT", "id", "FROM", "users", "WHERE", "id", "=", "?"]
        );
        assert_eq!(tokens[0].kind, TokenType::Keyword);
        assert_eq!(tokens[1].kind, TokenType::Identifier);
        assert_eq!(tokens[7].kind, TokenType::Placeholder);
    }

    #[test]
    fn test_function_vs_identifier() {
        // COUNT( is a known function.
        let tokens = lex("SELECT COUNT(*) FROM t").unwrap();
        assert_eq!(tokens[1].kind, TokenType::Function);

        // frobnicate( is not in the known function set, stays an identifier.
        let tokens = lex("SELECT frobnicate(x) FROM t").unwrap();
        assert_eq!(tokens[1].kind, TokenType::Identifier);
    }

    #[test]
    fn test_data_type_after_identifier() {
        let tokens = lex("CREATE TABLE t(id INTEGER)").unwrap();
        let int_tok = tokens.iter().find(|t| t.text == "INTEGER").unwrap();
        assert_eq!(int_tok.kind, TokenType::Keyword);

        // Bare INTEGER not following an identifier or AS: identifier.
        let tokens = lex("SELECT INTEGER FROM t").unwrap();
        let int_tok = &tokens[1];
        assert_eq!(int_tok.text, "INTEGER");
        assert_eq!(int_tok.kind, TokenType::Identifier);
    }

    #[test]
    fn test_cast_as_keyword() {
        let tokens = lex("SELECT CAST(x AS TEXT) FROM t").unwrap();
        let text_tok = tokens.iter().find(|t| t.text == "TEXT").unwrap();
        assert_eq!(text_tok.kind, TokenType::Keyword);
    }

    #[test]
    fn test_string_literal_escape() {
        let tokens = lex("SELECT 'it''s' FROM t").unwrap();
        assert_eq!(tokens[1].text, "it's");
        assert_eq!(tokens[1].kind, TokenType::String);
    }

    #[test]
    fn test_quoted_identifier_no_unescape() {
        let tokens = lex(r#"SELECT "my""col" FROM t"#).unwrap();
        assert_eq!(tokens[1].text, "my\"col");
        assert_eq!(tokens[1].kind, TokenType::Identifier);
    }

    #[test]
    fn test_comments_stripped_offsets_preserved() {
        let source = "SELECT id -- comment\nFROM users";
        let tokens = lex(source).unwrap();
        let from_tok = tokens.iter().find(|t| t.text == "FROM").unwrap();
        assert_eq!(&source[from_tok.start..from_tok.end], "FROM");
    }

    #[test]
    fn test_block_comment_stripped() {
        let source = "SELECT /* block \n comment */ id FROM t";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[1].text, "id");
    }

    #[test]
    fn test_unterminated_string_error() {
        let err = lex("SELECT 'abc FROM t").unwrap_err();
        assert!(matches!(err, Error::UnterminatedString(_)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("SELECT 0x1F"), vec![TokenType::Keyword, TokenType::Number]);
        assert_eq!(kinds("SELECT 0b101"), vec![TokenType::Keyword, TokenType::Number]);
        assert_eq!(
            kinds("SELECT 1.5e-10"),
            vec![TokenType::Keyword, TokenType::Number]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a <= b AND c != d").unwrap();
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenType::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["<=", "!="]);
    }
}
