//! Context enrichment applied to every log call
//!
//! Fault values are flattened into `key`, `key_class`, `key_code`,
//! `key_file`, `key_line`, `key_trace` and the `key_previous` subtree.
//! Over-long strings are split into `key`, `key_1`, `key_2`, ... when
//! chunking is enabled.

use super::fault::Fault;
use super::log_context::{FieldValue, LogContext};
use std::fmt;
use std::sync::Arc;

/// Maximum number of chain nodes written for one fault value
pub const MAX_FAULT_CHAIN_DEPTH: usize = 4;

/// Callback that adds extra keys for a serialized fault
///
/// Called with the context key the fault is written under, the fault
/// itself and the context being built.
pub type ExceptionSerializer = Arc<dyn Fn(&str, &Fault, &mut LogContext) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ContextEnricher {
    chunk_size: usize,
    serializers: Vec<ExceptionSerializer>,
}

impl fmt::Debug for ContextEnricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextEnricher")
            .field("chunk_size", &self.chunk_size)
            .field("serializers", &self.serializers.len())
            .finish()
    }
}

impl ContextEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk length in characters, 0 when chunking is disabled
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn add_serializer(&mut self, serializer: ExceptionSerializer) {
        self.serializers.push(serializer);
    }

    pub fn serializers(&self) -> &[ExceptionSerializer] {
        &self.serializers
    }

    /// Produce the enriched form of `context`
    pub fn enrich(&self, context: &LogContext) -> LogContext {
        let mut enriched = LogContext::with_capacity(context.len());

        for (key, value) in context.iter() {
            match value {
                FieldValue::Fault(fault) => {
                    let message = self.serialize_fault(key, fault, &mut enriched, 1);
                    enriched.insert(key, message);
                }
                FieldValue::String(s) if self.should_chunk(s) => {
                    self.write_chunks(key, s, &mut enriched);
                }
                other => enriched.insert(key, other.clone()),
            }
        }

        enriched
    }

    fn should_chunk(&self, value: &str) -> bool {
        // Byte length bounds the char count from above
        self.chunk_size > 0
            && value.len() > self.chunk_size
            && value.chars().count() > self.chunk_size
    }

    fn write_chunks(&self, key: &str, value: &str, context: &mut LogContext) {
        let chars: Vec<char> = value.chars().collect();

        for (i, chunk) in chars.chunks(self.chunk_size).enumerate() {
            let part: String = chunk.iter().collect();
            if i == 0 {
                context.insert(key, part);
            } else {
                context.insert(format!("{}_{}", key, i), part);
            }
        }
    }

    /// Write one chain node and recurse into its cause
    ///
    /// Returns the fault message, which becomes the value under `key`.
    fn serialize_fault(
        &self,
        key: &str,
        fault: &Fault,
        context: &mut LogContext,
        depth: usize,
    ) -> String {
        context.insert(key, fault.message.as_str());
        context.insert(format!("{}_class", key), fault.class_name.as_str());
        context.insert(format!("{}_code", key), fault.code);
        context.insert(format!("{}_file", key), fault.file.as_str());
        context.insert(format!("{}_line", key), fault.line);
        context.insert(format!("{}_trace", key), fault.trace.as_str());

        for serializer in &self.serializers {
            serializer(key, fault, context);
        }

        if let Some(previous) = fault.previous.as_deref() {
            if depth < MAX_FAULT_CHAIN_DEPTH {
                self.serialize_fault(&format!("{}_previous", key), previous, context, depth + 1);
            }
        }

        fault.message.clone()
    }
}
