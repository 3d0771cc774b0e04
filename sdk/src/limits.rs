//! Codec resource limits.

/// Default maximum number of nested struct levels below the top-level struct.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum size of one length-prefixed payload (16 MiB).
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Bounds applied by the codec to untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum nesting of struct fields
    pub max_depth: usize,
    /// Maximum byte length of a string, `any` payload or nested struct
    pub max_length: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}
