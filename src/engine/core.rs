//! Statement engine: resolves the format of a document and runs its extractor

use crate::config::{AccountDefinition, EngineConfig};
use crate::engine::{ExtractorRegistry, StatementAssembler};
use crate::types::*;

/// How the engine decided to read a document
#[derive(Debug, Clone, Copy)]
enum Resolution<'a> {
    /// A single format, with metadata from a matching definition if any
    Format(FormatId, Option<&'a AccountDefinition>),
    /// Nothing identifies the document; try every format in turn
    Trial,
    /// The document cannot be attributed to any configured account
    Unresolved,
}

/// Main extraction entry point
///
/// Holds validated configuration and the extractor registry. Both are
/// read-only after construction, so one engine can process documents
/// from several threads at once.
#[derive(Debug)]
pub struct StatementEngine {
    config: EngineConfig,
    registry: ExtractorRegistry,
}

impl StatementEngine {
    /// Create an engine with the built-in extractors
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, ExtractorRegistry::standard())
    }

    /// Create an engine with a custom set of extractors
    pub fn with_registry(config: EngineConfig, registry: ExtractorRegistry) -> Self {
        Self { config, registry }
    }

    /// Engine with the built-in configuration and no account definitions
    pub fn builtin() -> ExtractionResult<Self> {
        Ok(Self::new(EngineConfig::builtin()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Extract every statement a document holds.
    ///
    /// `format_override` names a format identifier and skips detection.
    /// An empty result means nothing useful was found; it is not an error.
    /// Errors are reserved for configuration problems.
    pub fn process(
        &self,
        document: &Document,
        format_override: Option<&str>,
    ) -> ExtractionResult<Vec<Statement>> {
        if document.is_empty() {
            tracing::info!(source = %document.source, "Document has no content");
            return Ok(Vec::new());
        }

        let text = document.full_text();
        let statements = match self.resolve(&text, format_override) {
            Resolution::Format(format, definition) => {
                let statements = self.run(format, document)?;
                StatementAssembler::assemble(statements, format, definition.map(|d| &d.account))
            }
            Resolution::Trial => self.trial(document)?,
            Resolution::Unresolved => Vec::new(),
        };

        let statements: Vec<Statement> = statements
            .into_iter()
            .filter(Statement::has_useful_output)
            .collect();

        tracing::info!(
            source = %document.source,
            statements = statements.len(),
            "Processed document"
        );
        Ok(statements)
    }

    fn resolve(&self, text: &str, format_override: Option<&str>) -> Resolution<'_> {
        let accounts = self.config.accounts();

        if let Some(identifier) = format_override {
            let format: FormatId = match identifier.parse() {
                Ok(format) => format,
                Err(e) => {
                    tracing::warn!(format = identifier, "{}", e);
                    return Resolution::Unresolved;
                }
            };

            let definition = accounts.iter().find(|definition| definition.format == format);
            if definition.is_none() {
                tracing::warn!(
                    format = %format,
                    "No account definition for format override, using empty account metadata"
                );
            }
            return Resolution::Format(format, definition);
        }

        if accounts.is_empty() {
            return Resolution::Trial;
        }

        match accounts.iter().find(|definition| definition.matches(text)) {
            Some(definition) => {
                tracing::debug!(
                    format = %definition.format,
                    account = %definition.account.name,
                    "Matched account definition"
                );
                Resolution::Format(definition.format, Some(definition))
            }
            None => {
                tracing::info!("No account definition matches the document");
                Resolution::Unresolved
            }
        }
    }

    fn run(&self, format: FormatId, document: &Document) -> ExtractionResult<Vec<Statement>> {
        let extractor = self
            .registry
            .get(format)
            .ok_or_else(|| ExtractionError::Config(format!("No extractor registered for {}", format)))?;
        let config = self.config.extraction(format)?;

        tracing::debug!(format = %format, source = %document.source, "Running extractor");
        extractor.extract(document, config)
    }

    /// First format in trial order that yields useful output
    fn trial(&self, document: &Document) -> ExtractionResult<Vec<Statement>> {
        for format in FormatId::TRIAL_ORDER {
            if self.registry.get(format).is_none() {
                continue;
            }

            let statements = self.run(format, document)?;
            if statements.iter().any(Statement::has_useful_output) {
                tracing::info!(format = %format, source = %document.source, "Detected format");
                return Ok(statements);
            }
        }

        tracing::info!(source = %document.source, "No format produced output");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASA_ROWS: [&str; 5] = [
        "BEGINNING BALANCE 100.00",
        "01/11/24 TRANSFER IN 50.00+ 150.00",
        "  FROM TEST",
        "02/11/24 PAYMENT OUT 25.50- 124.50",
        "ENDING BALANCE : 124.50",
    ];

    fn engine_with(accounts: &str) -> StatementEngine {
        let json = format!(r#"{{ "accounts": {accounts} }}"#);
        StatementEngine::new(EngineConfig::from_json_str(&json).unwrap())
    }

    #[test]
    fn test_trial_order_detects_ledger() {
        let engine = StatementEngine::builtin().unwrap();
        let document = Document::from_rows("casa.pdf", CASA_ROWS.to_vec());

        let statements = engine.process(&document, None).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].transactions.len(), 2);
    }

    #[test]
    fn test_override_attaches_definition_for_format() {
        let engine = engine_with(
            r#"[{ "regex_identifier": "NEVER PRESENT", "statement_config": "MAYBANK_CASA_AND_MAE",
                  "number": "5550001", "name": "Savings", "drcr": "debit", "reconciliable": true }]"#,
        );
        let document = Document::from_rows("casa.pdf", CASA_ROWS.to_vec());

        let statements = engine.process(&document, Some("MAYBANK_CASA_AND_MAE")).unwrap();

        assert_eq!(statements[0].account.number, "5550001");
        assert_eq!(statements[0].account.name, "Savings");
        assert_eq!(statements[0].account.polarity, Polarity::Debit);
    }

    #[test]
    fn test_unknown_override_is_empty() {
        let engine = StatementEngine::builtin().unwrap();
        let document = Document::from_rows("casa.pdf", CASA_ROWS.to_vec());
        assert!(engine.process(&document, Some("NOT_A_FORMAT")).unwrap().is_empty());
    }

    #[test]
    fn test_unmatched_definitions_give_empty_result() {
        let engine = engine_with(
            r#"[{ "regex_identifier": "NEVER PRESENT", "statement_config": "MAYBANK_CASA_AND_MAE" }]"#,
        );
        let document = Document::from_rows("casa.pdf", CASA_ROWS.to_vec());
        assert!(engine.process(&document, None).unwrap().is_empty());
    }

    #[test]
    fn test_missing_extractor_is_a_configuration_error() {
        let engine =
            StatementEngine::with_registry(EngineConfig::builtin().unwrap(), ExtractorRegistry::new());
        let document = Document::from_rows("casa.pdf", CASA_ROWS.to_vec());

        assert!(engine.process(&document, None).unwrap().is_empty());
        assert!(matches!(
            engine.process(&document, Some("TNG")),
            Err(ExtractionError::Config(_))
        ));
    }

    #[test]
    fn test_empty_document() {
        let engine = StatementEngine::builtin().unwrap();
        let document = Document::from_rows("empty.pdf", Vec::<String>::new());
        assert!(engine.process(&document, None).unwrap().is_empty());
    }
}
