//! A schema handle that can be swapped while other threads keep encoding.

use std::sync::Arc;

use arc_swap::ArcSwap;
use brine_idl_compiler::{compile_schema, IdlError};
use brine_idl_schema::SchemaDocument;

/// Publishes one compiled schema to many readers.
///
/// Readers take an `Arc<SchemaDocument>` with [load](#method.load) and keep
/// using it for as long as they hold it; replacing the schema only changes
/// what later loads see. Documents are never mutated in place.
#[derive(Debug)]
pub struct SharedSchema {
    inner: ArcSwap<SchemaDocument>,
}

impl SharedSchema {
    pub fn new(doc: SchemaDocument) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(doc)),
        }
    }

    /// Compiles `text` and wraps the result.
    pub fn from_text(text: &str) -> Result<Self, IdlError> {
        Ok(Self::new(compile_schema(text)?))
    }

    /// The currently published schema.
    pub fn load(&self) -> Arc<SchemaDocument> {
        self.inner.load_full()
    }

    /// Atomically publishes `doc`.
    pub fn store(&self, doc: SchemaDocument) {
        self.inner.store(Arc::new(doc));
    }

    /// Compiles `text` and publishes it. On error the current schema stays
    /// in place.
    pub fn recompile(&self, text: &str) -> Result<(), IdlError> {
        let doc = compile_schema(text)?;
        tracing::debug!(structs = doc.structs().count(), "publishing recompiled schema");
        self.store(doc);
        Ok(())
    }
}
