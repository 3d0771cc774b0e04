use crate::error::IdlError;

pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// 1-based line and column of a byte offset in `text`.
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let prefix = &text.as_bytes()[..offset.min(text.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = prefix.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    (line, offset.min(text.len()) - line_start + 1)
}

pub fn error(msg: &str, line: usize, column: usize) -> IdlError {
    IdlError::SchemaSyntax {
        msg: msg.to_owned(),
        line,
        column,
    }
}

/// A syntax error located at byte `offset` of `text`.
pub fn error_at(text: &str, offset: usize, msg: &str) -> IdlError {
    let (line, column) = line_column(text, offset);
    error(msg, line, column)
}
