//! Extraction of JSON arrays embedded in register pages
//!
//! Register pages ship their data as JavaScript assignments of the form
//! `var <name> = [ ... ];`, possibly spread over many lines. Assignments are
//! located with one non-greedy search across the whole body and decoded with
//! `serde_json`, optionally after replacing raw control characters the source
//! sometimes leaves inside string literals.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::errors::{ParseError, ParseResult};

/// Array assignment: variable name and array text
static ARRAY_ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var (\w+) = (\[.*?\]);").unwrap());

/// Locate the array assigned to `variable`, returning its text
///
/// Returns `None` when the page carries no such assignment.
pub fn find_array<'a>(html: &'a str, variable: &str) -> Option<&'a str> {
    ARRAY_ASSIGNMENT_RE
        .captures_iter(html)
        .find(|caps| &caps[1] == variable)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// Replace C0 and C1 control characters (and DEL) with spaces
pub fn sanitize_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => ' ',
            other => other,
        })
        .collect()
}

/// Decode an array's text into typed entries
///
/// # Errors
///
/// Returns `ParseError::Json` if the text is not a JSON array of `T`
pub fn parse_array<T: DeserializeOwned>(
    text: &str,
    variable: &str,
    sanitize: bool,
) -> ParseResult<Vec<T>> {
    let decoded = if sanitize {
        serde_json::from_str(&sanitize_control_chars(text))
    } else {
        serde_json::from_str(text)
    };

    decoded.map_err(|e| ParseError::Json {
        variable: variable.to_string(),
        source: e,
    })
}

/// Find and decode the array assigned to `variable`
///
/// `Ok(None)` means the page has no such array.
pub fn extract_array<T: DeserializeOwned>(
    html: &str,
    variable: &str,
    sanitize: bool,
) -> ParseResult<Option<Vec<T>>> {
    match find_array(html, variable) {
        Some(text) => parse_array(text, variable, sanitize).map(Some),
        None => Ok(None),
    }
}
