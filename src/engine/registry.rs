//! Mapping from format identifier to extractor

use std::collections::BTreeMap;
use std::fmt;

use crate::extractors::*;
use crate::traits::StatementExtractor;
use crate::types::FormatId;

/// The extractor that ships for a format
pub fn builtin_extractor(format: FormatId) -> Box<dyn StatementExtractor> {
    match format {
        FormatId::MaybankCasaAndMae => Box::new(LineContinuationExtractor),
        FormatId::Maybank2Cc => Box::new(MultiAccountSplitter),
        FormatId::Tng => Box::new(DelimitedMultiMatchExtractor),
        FormatId::TngEmail => Box::new(AnchorBlockExtractor),
        FormatId::TngCsvExport => Box::new(GroupedTabularExtractor),
    }
}

/// Registered extractors, one per format
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<FormatId, Box<dyn StatementExtractor>>,
}

impl ExtractorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in extractor of every format
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for format in FormatId::TRIAL_ORDER {
            registry.register(builtin_extractor(format));
        }
        registry
    }

    /// Register an extractor under its own format, replacing any previous one
    pub fn register(&mut self, extractor: Box<dyn StatementExtractor>) {
        let format = extractor.format();
        if self.extractors.insert(format, extractor).is_some() {
            tracing::debug!(format = %format, "Replaced extractor");
        }
    }

    pub fn get(&self, format: FormatId) -> Option<&dyn StatementExtractor> {
        self.extractors.get(&format).map(|extractor| extractor.as_ref())
    }

    /// Registered formats in identifier order
    pub fn formats(&self) -> Vec<FormatId> {
        self.extractors.keys().copied().collect()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
