//! smsledger-core: transaction records, table rows, ledger file updates and the daily schedule

pub mod ledger;
pub mod record;
pub mod row;
pub mod schedule;

pub use ledger::{LedgerError, LedgerUpdate, insertion_point, preview_update, splice_rows, update_ledger};
pub use record::{BANK_PAYMENT, Direction, TransactionRecord};
pub use row::format_row;
pub use schedule::{
    Action, Clock, DailySchedule, GUARD_INTERVAL_SECS, SchedulerLoop, SchedulerState, SystemClock,
    guard_interval,
};
