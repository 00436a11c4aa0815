//! Bank SMS -> transaction record extraction.
//!
//! Each bank words its SMS differently, so the amount and balance regexes come
//! from configuration. The only contract is that capture group 1 of each holds
//! the value. Example with the default patterns:
//!   body:     "Paid 1,200- balance:5,000"
//!   amount:   (\d{1,3}(?:,\d{3})*)-          -> "1,200"
//!   balance:  balance:(\d{1,3}(?:,\d{3})*)   -> "5,000"

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use smsledger_core::TransactionRecord;
use thiserror::Error;
use tracing::info;

use crate::types::Message;

/// Value recorded when a pattern does not match the body.
pub const MISSING_VALUE: &str = "0";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("message has no body")]
    MissingBody,
    #[error("message has no received timestamp")]
    MissingTimestamp,
    #[error("malformed received timestamp {0:?}")]
    MalformedTimestamp(String),
    #[error("invalid {name} pattern: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("{name} pattern {pattern:?} has no capture group")]
    NoCaptureGroup { name: &'static str, pattern: String },
}

/// Compiled amount/balance patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub amount: Regex,
    pub balance: Regex,
}

impl PatternSet {
    pub fn new(amount: &str, balance: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            amount: compile("amount", amount)?,
            balance: compile("balance", balance)?,
        })
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ExtractError> {
    let re = Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern { name, source })?;
    // captures_len counts the implicit whole-match group
    if re.captures_len() < 2 {
        return Err(ExtractError::NoCaptureGroup {
            name,
            pattern: pattern.to_string(),
        });
    }
    Ok(re)
}

fn capture_or_missing(re: &Regex, body: &str) -> String {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| MISSING_VALUE.to_string(), |m| m.as_str().to_string())
}

/// Split "YYYY-MM-DD HH:MM[:SS...]" into a date and a minute-precision time.
fn split_received(received: &str) -> Result<(NaiveDate, NaiveTime), ExtractError> {
    let malformed = || ExtractError::MalformedTimestamp(received.to_string());

    let mut tokens = received.split_whitespace();
    let (date_tok, time_tok) = match (tokens.next(), tokens.next()) {
        (Some(d), Some(t)) => (d, t),
        _ => return Err(malformed()),
    };

    let date = NaiveDate::parse_from_str(date_tok, "%Y-%m-%d").map_err(|_| malformed())?;

    let mut hm = time_tok.split(':');
    let (hour, minute) = match (hm.next(), hm.next()) {
        (Some(h), Some(m)) => (h, m),
        _ => return Err(malformed()),
    };
    let time = NaiveTime::parse_from_str(&format!("{hour}:{minute}"), "%H:%M").map_err(|_| malformed())?;

    Ok((date, time))
}

/// Build a record from one message.
///
/// Unmatched patterns give "0"; a missing body or unusable timestamp is an error
/// the caller is expected to log and skip.
pub fn extract(
    message: &Message,
    patterns: &PatternSet,
    bank_identifier: &str,
) -> Result<TransactionRecord, ExtractError> {
    let body = message.body.as_deref().ok_or(ExtractError::MissingBody)?;
    let received = message
        .received
        .as_deref()
        .ok_or(ExtractError::MissingTimestamp)?;
    let (date, time) = split_received(received)?;

    let amount = capture_or_missing(&patterns.amount, body);
    let balance = capture_or_missing(&patterns.balance, body);

    info!("Extracted transaction: {} on {} at {}", amount, date, time.format("%H:%M"));
    Ok(TransactionRecord::bank_payment(amount, balance, date, time, bank_identifier))
}

/// Patterns plus the bank tag, bundled for a processing pass.
#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: PatternSet,
    bank_identifier: String,
}

impl Extractor {
    pub fn new(patterns: PatternSet, bank_identifier: impl Into<String>) -> Self {
        Self {
            patterns,
            bank_identifier: bank_identifier.into(),
        }
    }

    pub fn extract(&self, message: &Message) -> Result<TransactionRecord, ExtractError> {
        extract(message, &self.patterns, &self.bank_identifier)
    }
}
