//! Transaction record types written to the ledger table

use chrono::{NaiveDate, NaiveTime};

/// Label used for every row produced from a bank SMS
pub const BANK_PAYMENT: &str = "Bank Payment";

/// Money flow direction as shown in the first table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Single-letter column value (`I` / `O`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "I",
            Direction::Out => "O",
        }
    }
}

/// One ledger row worth of data, extracted from a single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub direction: Direction,
    pub name: String,
    /// Amount exactly as it appeared in the message (digit grouping kept)
    pub amount: String,
    pub date: NaiveDate,
    /// Minute precision; seconds are dropped at extraction
    pub time: NaiveTime,
    /// Balance exactly as it appeared in the message
    pub balance: String,
    pub bank: String,
    pub description: String,
}

impl TransactionRecord {
    /// Outgoing "Bank Payment" record with an empty description.
    pub fn bank_payment(
        amount: impl Into<String>,
        balance: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
        bank: impl Into<String>,
    ) -> Self {
        Self {
            direction: Direction::Out,
            name: BANK_PAYMENT.to_string(),
            amount: amount.into(),
            date,
            time,
            balance: balance.into(),
            bank: bank.into(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_payment_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(10, 15, 0).unwrap();
        let rec = TransactionRecord::bank_payment("1,200", "0", date, time, "M");

        assert_eq!(rec.direction, Direction::Out);
        assert_eq!(rec.name, "Bank Payment");
        assert_eq!(rec.balance, "0");
        assert!(rec.description.is_empty());
    }

    #[test]
    fn test_direction_letters() {
        assert_eq!(Direction::In.as_str(), "I");
        assert_eq!(Direction::Out.as_str(), "O");
    }
}
