//! Markdown table row rendering.
//!
//! Column order:
//!   | direction | name | amount | date | time | balance | bank | description |
//!
//! The rendered string doubles as the duplicate key in [`crate::ledger`], so any
//! change here changes which rows are considered already present.

use crate::record::TransactionRecord;

/// Render a record as a single table row (no trailing newline).
pub fn format_row(record: &TransactionRecord) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} |",
        record.direction.as_str(),
        record.name,
        record.amount,
        record.date.format("%Y-%m-%d"),
        record.time.format("%H:%M"),
        record.balance,
        record.bank,
        record.description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_format_row_columns() {
        let rec = TransactionRecord::bank_payment(
            "1,200",
            "5,000",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            "M",
        );

        assert_eq!(
            format_row(&rec),
            "| O | Bank Payment | 1,200 | 2024-01-01 | 10:15 | 5,000 | M |  |"
        );
    }

    #[test]
    fn test_format_row_pads_time_and_keeps_description() {
        let mut rec = TransactionRecord::bank_payment(
            "75",
            "0",
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap(),
            "BANK",
        );
        rec.description = "groceries".to_string();

        let row = format_row(&rec);
        assert!(row.contains("| 2024-03-09 | 07:05 |"));
        assert!(row.ends_with("| BANK | groceries |"));
        assert_eq!(row.matches('|').count(), 9);
    }
}
