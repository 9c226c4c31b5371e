use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Words that are always keywords, independent of surrounding context.
pub static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "SELECT", "DISTINCT", "FROM", "WHERE", "AND", "OR", "NOT", "NULL", "IS", "IN", "BETWEEN",
        "LIKE", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC", "LIMIT", "OFFSET", "INSERT",
        "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE", "TABLE", "INDEX", "UNIQUE", "IF",
        "EXISTS", "ALTER", "ADD", "COLUMN", "RENAME", "TO", "DROP", "PRAGMA", "AS", "JOIN",
        "LEFT", "RIGHT", "INNER", "OUTER", "ON", "CASE", "WHEN", "THEN", "ELSE", "END", "PRIMARY",
        "KEY", "DEFAULT", "RETURNING", "CONSTRAINT", "FOREIGN", "REFERENCES", "CHECK", "TRUE",
        "FALSE",
    ]
    .into_iter()
    .collect()
});

/// Data-type names. Classified as a keyword only when they follow an
/// identifier (a column definition) or the keyword `AS` (a cast) — otherwise
/// they are ordinary identifiers.
pub static DATA_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "INTEGER", "INT", "BIGINT", "TEXT", "VARCHAR", "CHAR", "REAL", "FLOAT", "DOUBLE",
        "NUMERIC", "DECIMAL", "BOOLEAN", "BLOB", "DATE", "DATETIME", "TIMESTAMP",
    ]
    .into_iter()
    .collect()
});

/// Function names recognized when immediately followed by `(`.
pub static FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "COUNT", "SUM", "AVG", "MIN", "MAX", "COALESCE", "LOWER", "UPPER", "LENGTH", "ABS",
        "ROUND", "SUBSTR", "TRIM", "NOW", "DATE", "JSON", "STRFTIME", "CAST", "IFNULL",
        "NULLIF",
    ]
    .into_iter()
    .collect()
});

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

pub fn is_data_type(word: &str) -> bool {
    DATA_TYPES.contains(word.to_ascii_uppercase().as_str())
}

pub fn is_function(word: &str) -> bool {
    FUNCTIONS.contains(word.to_ascii_uppercase().as_str())
}
