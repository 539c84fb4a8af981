//! Transaction model, recurrence projection, and month views.

pub mod category;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod recurring;
pub mod serde_compat;
pub mod summary;
pub mod time_interval;
pub mod transaction;
pub mod window;

pub use category::{categories_by_type, icon_for, CategoryFilter, CategoryScope};
pub use ledger::{Ledger, MonthView};
pub use recurring::{
    expand, expand_all, next_occurrence, occurrences_in_month, snapshot_recurrences, Installment,
    Occurrence, RecurrenceSnapshot, RecurrenceStatus, MAX_OCCURRENCES,
};
pub use summary::{CategoryTotal, ChartBreakdown, MonthlySummary};
pub use time_interval::{Frequency, TimeInterval, TimeUnit};
pub use transaction::{NewTransaction, Recurrence, RecurrenceEnd, Transaction, TransactionKind};
pub use window::{DateWindow, YearMonth};
