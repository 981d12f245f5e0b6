//! Card statements that cover several cards
//!
//! Each card's block starts with a header naming the card product and
//! number. The text between consecutive headers (cut shortly after the
//! card's sub-total marker) belongs to that card. A card whose header is
//! printed again after a page break gets the text of every occurrence, and
//! each card is parsed as one ledger with the line-continuation parser.

use regex::Regex;
use std::collections::BTreeSet;

use super::line_continuation::{BalanceLookup, LineContinuationParser, SignRule};
use crate::config::ExtractionConfig;
use crate::reconciliation::ReconciliationEngine;
use crate::traits::StatementExtractor;
use crate::types::*;
use crate::utils::parsing::{first_group, named};

/// Bytes kept after the section end marker when no offset is configured
pub const DEFAULT_SECTION_END_OFFSET: usize = 50;

/// Text belonging to one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'t> {
    /// Card product, e.g. `MAYBANK 2 PLAT MASTERCARD`
    pub kind: String,
    /// Card number with spaces removed
    pub number: String,
    pub text: &'t str,
}

fn compact(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split a document into per-card sections.
///
/// A section runs from the end of its header to the start of the next
/// header. When the end marker occurs inside it, the section stops
/// `end_offset` bytes after the marker.
pub fn split_sections<'t>(
    text: &'t str,
    header: &Regex,
    end_marker: Option<&Regex>,
    end_offset: usize,
) -> Vec<Section<'t>> {
    let headers: Vec<_> = header.captures_iter(text).collect();

    headers
        .iter()
        .enumerate()
        .filter_map(|(index, captures)| {
            let start = captures.get(0)?.end();
            let end = headers
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());

            let mut body = &text[start..end];
            if let Some(marker) = end_marker.and_then(|pattern| pattern.find(body)) {
                body = &body[..floor_char_boundary(body, marker.end() + end_offset)];
            }

            Some(Section {
                kind: named(captures, "kind").trim().to_string(),
                number: compact(named(captures, "number")),
                text: body,
            })
        })
        .collect()
}

/// Rows of every section that belongs to one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSection<'t> {
    pub kind: String,
    pub number: String,
    pub lines: Vec<&'t str>,
}

/// Merge sections by card number, in order of first appearance.
///
/// Sections without a number are dropped.
pub fn group_sections(sections: Vec<Section<'_>>) -> Vec<CardSection<'_>> {
    let mut cards: Vec<CardSection<'_>> = Vec::new();

    for section in sections.into_iter().filter(|section| !section.number.is_empty()) {
        let lines = section.text.split('\n');
        match cards.iter().position(|card| card.number == section.number) {
            Some(index) => cards[index].lines.extend(lines),
            None => cards.push(CardSection {
                kind: section.kind,
                number: section.number,
                lines: lines.collect(),
            }),
        }
    }

    cards
}

/// Number of distinct card numbers mentioned in the document
pub fn distinct_section_accounts(text: &str, config: &ExtractionConfig) -> usize {
    let Some(pattern) = config
        .pattern("account_number")
        .or_else(|| config.pattern("section_header"))
    else {
        return 0;
    };

    pattern
        .captures_iter(text)
        .map(|captures| compact(named(&captures, "number")))
        .filter(|number| !number.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Credit card statements, one statement per card
pub struct MultiAccountSplitter;

impl MultiAccountSplitter {
    fn parser(config: &ExtractionConfig) -> ExtractionResult<LineContinuationParser<'_>> {
        LineContinuationParser::new(config, "transaction", None, SignRule::CreditSuffix)
    }

    /// Whole document as one card when no section header is present
    fn extract_single(
        &self,
        document: &Document,
        rows: &[String],
        config: &ExtractionConfig,
    ) -> ExtractionResult<Vec<Statement>> {
        let parser = Self::parser(config)?;
        let text = document.full_text();

        let mut statement = Statement::new(document.source_name());
        statement.account = Account {
            number: config
                .pattern("account_number")
                .and_then(|pattern| pattern.captures(&text))
                .map(|captures| compact(named(&captures, "number")))
                .unwrap_or_default(),
            name: config
                .pattern("account_label")
                .and_then(|pattern| pattern.captures(&text))
                .and_then(|captures| first_group(&captures))
                .unwrap_or_default(),
            polarity: Polarity::Credit,
            reconciliable: true,
            ..Account::default()
        };

        if statement.account.number.is_empty() {
            tracing::debug!(source = %statement.source, "No card number found");
            return Ok(Vec::new());
        }

        parser.parse(rows, &mut statement, BalanceLookup::Accumulate);
        Ok(vec![statement])
    }
}

impl StatementExtractor for MultiAccountSplitter {
    fn format(&self) -> FormatId {
        FormatId::Maybank2Cc
    }

    fn extract(&self, document: &Document, config: &ExtractionConfig) -> ExtractionResult<Vec<Statement>> {
        let Some(rows) = document.rows() else {
            return Ok(Vec::new());
        };

        let text = document.full_text();
        let sections = match config.pattern("section_header") {
            Some(header) => {
                let offset = config
                    .constant("section_end_offset")
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(DEFAULT_SECTION_END_OFFSET);
                split_sections(&text, header, config.pattern("section_end"), offset)
            }
            None => Vec::new(),
        };

        if sections.is_empty() {
            return self.extract_single(document, rows, config);
        }

        let parser =
            Self::parser(config)?.with_reconciler(ReconciliationEngine::default().quiet_when_empty());
        let statement_date = parser.find_statement_date([text.as_str()]);
        let source = document.source_name();

        let section_count = sections.len();
        let cards = group_sections(sections);
        tracing::debug!(
            source = %source,
            sections = section_count,
            cards = cards.len(),
            "Splitting card statement"
        );

        let statements = cards
            .into_iter()
            .map(|card| {
                let mut statement = Statement::new(source.clone());
                statement.statement_date = statement_date;
                statement.account = Account {
                    number: card.number,
                    name: card.kind,
                    polarity: Polarity::Credit,
                    reconciliable: true,
                    ..Account::default()
                };

                parser.parse(&card.lines, &mut statement, BalanceLookup::FirstMatch);
                statement
            })
            .collect();

        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn config() -> ExtractionConfig {
        EngineConfig::builtin()
            .unwrap()
            .extraction(FormatId::Maybank2Cc)
            .unwrap()
            .clone()
    }

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn two_card_rows() -> Vec<&'static str> {
        vec![
            "STATEMENT DATE 15 JAN 24",
            "MAYBANK 2 PLAT MASTERCARD    :    5239 0000 0000 0002",
            "YOUR PREVIOUS STATEMENT BALANCE 100.00",
            "20/12  21/12  GROCER KL  75.50",
            "05/01  05/01  PAYMENT THANK YOU  50.00CR",
            "SUB TOTAL/JUMLAH 125.50",
            "MAYBANK 2 PLAT AMEX    :    3777 000000 00001",
            "YOUR PREVIOUS STATEMENT BALANCE 0.00",
            "10/01  10/01  AIRLINE  20.00",
            "SUB TOTAL/JUMLAH 20.00",
        ]
    }

    #[test]
    fn test_one_statement_per_card() {
        let document = Document::from_rows("cards.pdf", two_card_rows());
        let statements = MultiAccountSplitter.extract(&document, &config()).unwrap();

        assert_eq!(statements.len(), 2);

        let first = &statements[0];
        assert_eq!(first.account.number, "5239000000000002");
        assert_eq!(first.account.name, "MAYBANK 2 PLAT MASTERCARD");
        assert_eq!(first.account.polarity, Polarity::Credit);
        assert_eq!(first.starting_balance, amount("100.00"));
        assert_eq!(first.ending_balance, amount("125.50"));
        assert_eq!(first.calculated_ending_balance, amount("125.50"));
        assert_eq!(first.total_credit, amount("-50.00"));
        assert_eq!(first.total_debit, amount("75.50"));
        assert_eq!(first.nett, amount("25.50"));
        assert_eq!(first.transactions.len(), 2);
        assert_eq!(first.transactions[0].transaction_type, TransactionType::Debit);
        assert_eq!(first.transactions[0].date.date_naive().to_string(), "2023-12-20");
        assert_eq!(first.transactions[1].transaction_type, TransactionType::Credit);
        assert!(first.warnings.is_empty());

        let second = &statements[1];
        assert_eq!(second.account.number, "377700000000001");
        assert_eq!(second.calculated_ending_balance, amount("20.00"));
        assert_eq!(second.statement_date, first.statement_date);
    }

    #[test]
    fn test_sections_stop_after_sub_total() {
        let text = "MAYBANK 2 GOLD MASTERCARD : 1111 2222 3333 4444\nA\nSUB TOTAL/JUMLAH 10.00\nTRAILER";
        let config = config();
        let sections = split_sections(
            text,
            config.pattern("section_header").unwrap(),
            config.pattern("section_end"),
            5,
        );

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].number, "1111222233334444");
        assert!(sections[0].text.ends_with("SUB TOTAL/JUMLAH 10.0"));
    }

    #[test]
    fn test_section_cut_respects_char_boundaries() {
        let text = "MAYBANK 2 GOLD AMEX : 1111 222222 33333\nSUB TOTAL/JUMLAH é";
        let config = config();
        let sections = split_sections(
            text,
            config.pattern("section_header").unwrap(),
            config.pattern("section_end"),
            2,
        );
        assert!(sections[0].text.ends_with("JUMLAH "));
    }

    #[test]
    fn test_statement_count_is_bounded_by_distinct_cards() {
        let text = two_card_rows().join("\n");
        assert_eq!(distinct_section_accounts(&text, &config()), 2);

        let document = Document::from_rows("cards.pdf", two_card_rows());
        let statements = MultiAccountSplitter.extract(&document, &config()).unwrap();
        assert!(statements.len() <= 2);
        assert_ne!(statements[0].account.number, statements[1].account.number);
    }

    #[test]
    fn test_repeated_header_is_one_card() {
        let rows = vec![
            "STATEMENT DATE 15 JAN 24",
            "MAYBANK 2 PLAT MASTERCARD    :    5239 0000 0000 0002",
            "YOUR PREVIOUS STATEMENT BALANCE 100.00",
            "20/12  21/12  GROCER KL  75.50",
            "MAYBANK 2 PLAT MASTERCARD    :    5239 0000 0000 0002",
            "05/01  05/01  PAYMENT THANK YOU  50.00CR",
            "SUB TOTAL/JUMLAH 125.50",
        ];
        let text = rows.join("\n");
        assert_eq!(distinct_section_accounts(&text, &config()), 1);

        let document = Document::from_rows("paged.pdf", rows);
        let statements = MultiAccountSplitter.extract(&document, &config()).unwrap();

        assert_eq!(statements.len(), 1);
        let statement = &statements[0];
        assert_eq!(statement.account.number, "5239000000000002");
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.starting_balance, amount("100.00"));
        assert_eq!(statement.ending_balance, amount("125.50"));
        assert_eq!(statement.calculated_ending_balance, amount("125.50"));
        assert!(statement.warnings.is_empty());
    }

    #[test]
    fn test_group_sections_keeps_first_seen_order() {
        let text = "MAYBANK 2 GOLD AMEX : 1111 222222 33333\nA\n\
                    MAYBANK 2 GOLD MASTERCARD : 4444 5555 6666 7777\nB\n\
                    MAYBANK 2 GOLD AMEX : 1111 222222 33333\nC";
        let config = config();
        let sections = split_sections(text, config.pattern("section_header").unwrap(), None, 0);
        assert_eq!(sections.len(), 3);

        let cards = group_sections(sections);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].number, "111122222233333");
        assert!(cards[0].lines.contains(&"A") && cards[0].lines.contains(&"C"));
        assert_eq!(cards[1].number, "4444555566667777");
    }

    #[test]
    fn test_card_without_transactions_is_quiet() {
        let rows = vec![
            "STATEMENT DATE 15 JAN 24",
            "MAYBANK 2 PLAT AMEX    :    3777 000000 00001",
            "YOUR PREVIOUS STATEMENT BALANCE 40.00",
            "SUB TOTAL/JUMLAH 0.00",
        ];
        let document = Document::from_rows("idle.pdf", rows);
        let statements = MultiAccountSplitter.extract(&document, &config()).unwrap();

        assert_eq!(statements.len(), 1);
        assert!(statements[0].transactions.is_empty());
        assert!(!statements[0].is_reconciled());
        assert!(statements[0].warnings.is_empty());
    }

    #[test]
    fn test_single_card_fallback() {
        let rows = vec![
            "STATEMENT DATE 15 JAN 24",
            "MASTERCARD : 5239 0000 0000 0009",
            "YOUR PREVIOUS STATEMENT BALANCE 10.00",
            "02/01  03/01  BOOKSHOP  5.00",
            "SUB TOTAL/JUMLAH 15.00",
        ];
        let document = Document::from_rows("single.pdf", rows);
        let statements = MultiAccountSplitter.extract(&document, &config()).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].account.number, "5239000000000009");
        assert_eq!(statements[0].calculated_ending_balance, amount("15.00"));
    }

    #[test]
    fn test_no_card_number_yields_nothing() {
        let document = Document::from_rows("blank.pdf", vec!["HELLO", "WORLD"]);
        assert!(MultiAccountSplitter.extract(&document, &config()).unwrap().is_empty());
    }
}
