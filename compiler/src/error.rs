use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Syntax error at line {line}, column {column}: {msg}")]
    SchemaSyntax {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Range error for field {field}: {msg}")]
    SchemaRange {
        field: String,
        msg:   String,
    },

    #[error("Unknown type \"{name}\" in {scope}")]
    UnknownType {
        name:  String,
        scope: String,
    },

    #[error("Unknown struct \"{0}\"")]
    UnknownStruct(String),

    #[error("Validation failed at {path}: expected {expected}, got {actual}")]
    Validation {
        path:     String,
        expected: String,
        actual:   String,
    },

    #[error("Truncated input at {path}: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        path:      String,
        needed:    usize,
        remaining: usize,
    },

    #[error("Nesting deeper than {limit} levels at {path}")]
    DepthLimitExceeded {
        path:  String,
        limit: usize,
    },

    #[error("Length {declared} at {path} exceeds the limit of {limit} bytes")]
    LengthLimitExceeded {
        path:     String,
        declared: u64,
        limit:    usize,
    },

    #[error("Malformed data at {path}: {msg}")]
    Malformed {
        path: String,
        msg:  String,
    },
}
