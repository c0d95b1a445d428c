//! # Business Numbers
//!
//! Human-readable numbers printed on receipts, SMS and parcels.
//!
//! ```text
//! ┌──────────────┬────────┬──────────┬────────────┬─────────────────────┐
//! │ Sequence     │ Prefix │ Period   │ Counter    │ Example             │
//! ├──────────────┼────────┼──────────┼────────────┼─────────────────────┤
//! │ Order        │ PMW    │ YYYYMMDD │ 4 digits   │ PMW202610190001     │
//! │ Transaction  │ TXN    │ YYYYMMDD │ 6 digits   │ TXN20261019000042   │
//! │ Tracking     │ PWA    │ YYYYMMDD │ 5 digits   │ PWA2026101900007    │
//! └──────────────┴────────┴──────────┴────────────┴─────────────────────┘
//! ```
//!
//! The counter restarts every day. It is allocated by the database with an
//! atomic upsert on `(name, period)`; this module only formats.

use chrono::NaiveDate;

/// A daily counter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Order,
    Transaction,
    Tracking,
}

impl Sequence {
    /// Key of the counter row in the `sequences` table.
    pub fn name(&self) -> &'static str {
        match self {
            Sequence::Order => "order",
            Sequence::Transaction => "transaction",
            Sequence::Tracking => "tracking",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Sequence::Order => "PMW",
            Sequence::Transaction => "TXN",
            Sequence::Tracking => "PWA",
        }
    }

    /// Zero-padded width of the counter.
    pub fn width(&self) -> usize {
        match self {
            Sequence::Order => 4,
            Sequence::Transaction => 6,
            Sequence::Tracking => 5,
        }
    }

    /// Formats the number for a counter value allocated on `day`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use promoweb_core::numbering::Sequence;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    /// assert_eq!(Sequence::Order.format(day, 1), "PMW202610190001");
    /// ```
    pub fn format(&self, day: NaiveDate, value: i64) -> String {
        format!(
            "{}{}{:0width$}",
            self.prefix(),
            period(day),
            value,
            width = self.width()
        )
    }
}

/// Counter period of a day (`YYYYMMDD`).
pub fn period(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}
