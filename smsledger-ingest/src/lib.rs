//! smsledger-ingest: SMS listing adapter and regex-based transaction extraction.

pub mod extract;
pub mod source;
pub mod types;

pub use extract::{ExtractError, Extractor, MISSING_VALUE, PatternSet, extract};
pub use source::{
    CommandSource, DEFAULT_SMS_COMMAND, MessageSource, SourceError, fetch_bank_messages,
    parse_message_list,
};
pub use types::Message;
