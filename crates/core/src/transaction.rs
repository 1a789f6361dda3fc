use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::category::CategoryId;
use super::money::Money;

/// Row-order index assigned during normalization, stable for the life of a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub usize);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub date: NaiveDate,
    pub amount: Money,
    pub description: String,
    /// Category text carried over from the source file, if a column was mapped.
    pub raw_category: Option<String>,
    pub category: Option<CategoryId>,
    pub category_confirmed: bool,
    pub account_tag: Option<String>,
    pub duplicate_of: Option<TxId>,
}

impl Transaction {
    pub fn new(id: TxId, date: NaiveDate, amount: Money, description: impl Into<String>) -> Self {
        Transaction {
            id,
            date,
            amount,
            description: description.into(),
            raw_category: None,
            category: None,
            category_confirmed: false,
            account_tag: None,
            duplicate_of: None,
        }
    }

    pub fn is_inflow(&self) -> bool {
        self.amount.is_inflow()
    }

    pub fn is_outflow(&self) -> bool {
        self.amount.is_outflow()
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }

    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: usize, cents: i64) -> Transaction {
        Transaction::new(TxId(id), date(2024, 3, 15), Money::from_cents(cents), "Test")
    }

    #[test]
    fn new_transaction_starts_unreviewed() {
        let t = tx(0, -1599);
        assert_eq!(t.id, TxId(0));
        assert!(t.category.is_none());
        assert!(!t.category_confirmed);
        assert!(t.raw_category.is_none());
        assert!(t.account_tag.is_none());
        assert!(!t.is_duplicate());
    }

    #[test]
    fn flow_direction_follows_amount_sign() {
        assert!(tx(0, 5000).is_inflow());
        assert!(tx(1, -5000).is_outflow());
        assert!(!tx(2, 0).is_inflow());
        assert!(!tx(2, 0).is_outflow());
    }

    #[test]
    fn day_of_month_reads_the_date() {
        assert_eq!(tx(0, -100).day_of_month(), 15);
    }

    #[test]
    fn tx_ids_order_by_row_index() {
        assert!(TxId(2) < TxId(10));
    }
}
