//! Escaping for the delimited row format.
//!
//! Rows are `name=value` pairs joined by tabs and ended by a newline, so
//! those characters must never appear raw inside a name or value.

/// Escape `s`, additionally escaping `extra` when given.
///
/// # Arguments
/// * `s` - The text to escape
/// * `extra` - A delimiter that only needs escaping in this position
fn escape_with(s: &str, extra: Option<char>) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            c if Some(c) == extra => {
                result.push('\\');
                result.push(c);
            }
            c => result.push(c),
        }
    }
    result
}

/// Escape a column value. `=` is left alone: the first raw `=` in a pair
/// always ends the name.
#[inline]
pub fn escape_value(s: &str) -> String {
    escape_with(s, None)
}

/// Escape a column name, including any `=`.
#[inline]
pub fn escape_name(s: &str) -> String {
    escape_with(s, Some('='))
}
