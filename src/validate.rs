//! Canonicalization and bounds checks for caller-supplied ids and search terms.
//!
//! Everything that reaches the store goes through here first. Identifiers are
//! restricted to `[A-Za-z0-9:_/@.-]`; search terms only have control
//! characters removed and SQL `LIKE` wildcards escaped.

use crate::util::decode_if_encoded;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub const MAX_IDENTIFIER_LEN: usize = 500;
pub const MAX_SEARCH_QUERY_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationReason {
    Missing,
    NotAString,
    Empty,
    TooLong { len: usize, max: usize },
    InvalidCharacters,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Missing => f.write_str("is required"),
            ValidationReason::NotAString => f.write_str("must be a string"),
            ValidationReason::Empty => f.write_str("must not be empty"),
            ValidationReason::TooLong { len, max } => {
                write!(f, "is too long ({len} characters, max {max})")
            }
            ValidationReason::InvalidCharacters => f.write_str("contains invalid characters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    #[serde(flatten)]
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

fn is_stripped_control(ch: char) -> bool {
    matches!(ch, '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '/' | '@' | '.' | '-')
}

fn strip_controls(value: &str) -> String {
    value.chars().filter(|ch| !is_stripped_control(*ch)).collect()
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            ValidationReason::TooLong { len, max },
        ));
    }
    Ok(())
}

/// Canonicalize a node/function id.
pub fn validate_identifier(raw: &str) -> Result<String, ValidationError> {
    const FIELD: &str = "id";
    let decoded = decode_if_encoded(raw);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(FIELD, ValidationReason::Empty));
    }
    check_length(FIELD, trimmed, MAX_IDENTIFIER_LEN)?;

    let stripped = strip_controls(trimmed);
    if stripped.is_empty() {
        return Err(ValidationError::new(FIELD, ValidationReason::Empty));
    }
    if !stripped.chars().all(is_identifier_char) {
        return Err(ValidationError::new(
            FIELD,
            ValidationReason::InvalidCharacters,
        ));
    }
    Ok(stripped)
}

/// Sanitize a free-text search term into a `LIKE` fragment with `\` as the
/// escape character. An empty result is valid and means "no query yet".
pub fn validate_search_query(raw: &str) -> Result<String, ValidationError> {
    const FIELD: &str = "query";
    let decoded = decode_if_encoded(raw);
    let trimmed = decoded.trim();
    check_length(FIELD, trimmed, MAX_SEARCH_QUERY_LEN)?;

    let mut escaped = String::with_capacity(trimmed.len());
    for ch in trimmed.chars().filter(|ch| !is_stripped_control(*ch)) {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Ok(escaped)
}

/// Pull an identifier out of a JSON parameter, rejecting absent and non-string values.
pub fn identifier_from_value(value: Option<&Value>) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::new("id", ValidationReason::Missing)),
        Some(Value::String(raw)) => validate_identifier(raw),
        Some(_) => Err(ValidationError::new("id", ValidationReason::NotAString)),
    }
}

/// Absent search terms are treated as empty.
pub fn search_query_from_value(value: Option<&Value>) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(raw)) => validate_search_query(raw),
        Some(_) => Err(ValidationError::new("query", ValidationReason::NotAString)),
    }
}
