//! Traits for format extractors

use crate::config::ExtractionConfig;
use crate::types::*;

/// A parser for one statement format
///
/// Implementations are stateless: everything they need arrives through the
/// document and the format's [`ExtractionConfig`], so one instance can serve
/// any number of documents concurrently.
pub trait StatementExtractor: Send + Sync {
    /// The format this extractor reads
    fn format(&self) -> FormatId;

    /// Extract zero or more statements from a document.
    ///
    /// Parse misses are recovered locally and recorded as statement
    /// warnings. Only configuration problems are returned as errors.
    fn extract(
        &self,
        document: &Document,
        config: &ExtractionConfig,
    ) -> ExtractionResult<Vec<Statement>>;
}
