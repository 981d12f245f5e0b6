//! Format extractors
//!
//! One extractor per parsing strategy. Each implements
//! [`StatementExtractor`](crate::traits::StatementExtractor) and is looked
//! up by format identifier through the engine's registry.

pub mod anchor_block;
pub mod delimited;
pub mod grouped_tabular;
pub mod line_continuation;
pub mod multi_account;

pub use anchor_block::AnchorBlockExtractor;
pub use delimited::DelimitedMultiMatchExtractor;
pub use grouped_tabular::GroupedTabularExtractor;
pub use line_continuation::{BalanceLookup, LineContinuationExtractor, LineContinuationParser, SignRule};
pub use multi_account::{
    distinct_section_accounts, group_sections, split_sections, CardSection, MultiAccountSplitter, Section,
};
