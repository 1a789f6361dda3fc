use billfold_core::{CategoryId, Transaction};
use std::sync::Mutex;
use thiserror::Error;

use crate::recurring::RecurringGroup;
use crate::session::CommittedImport;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend: {0}")]
    Backend(String),
}

/// Persistence seam for committed imports. The desktop app binds this to its
/// database; tests and the CLI use [`MemoryStore`].
pub trait ImportStore: Send + Sync {
    /// Writes transactions and returns their assigned ids, in input order.
    fn persist_transactions(
        &self,
        account_tag: Option<&str>,
        transactions: &[Transaction],
    ) -> Result<Vec<i64>, StoreError>;

    /// Writes bill candidates and returns their assigned ids, in input order.
    fn persist_bill_candidates(&self, bills: &[RecurringGroup]) -> Result<Vec<i64>, StoreError>;

    /// Upserts one learned merchant rule; the newest mapping wins.
    fn persist_merchant_rule(
        &self,
        pattern: &str,
        category: &CategoryId,
    ) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub struct PersistOutcome {
    pub transaction_ids: Vec<i64>,
    pub bill_ids: Vec<i64>,
}

/// Writes everything a committed session produced in one pass.
pub fn persist_committed(
    store: &dyn ImportStore,
    import: &CommittedImport,
) -> Result<PersistOutcome, StoreError> {
    let transaction_ids =
        store.persist_transactions(import.account_tag.as_deref(), &import.transactions)?;
    let bill_ids = store.persist_bill_candidates(&import.bill_candidates)?;
    for rule in &import.learned_rules {
        store.persist_merchant_rule(&rule.pattern, &rule.category)?;
    }
    tracing::info!(
        transactions = transaction_ids.len(),
        bills = bill_ids.len(),
        rules = import.learned_rules.len(),
        "persisted committed import"
    );
    Ok(PersistOutcome {
        transaction_ids,
        bill_ids,
    })
}

/// In-memory store with sequential ids.
#[derive(Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<(Option<String>, Transaction)>>,
    bills: Mutex<Vec<RecurringGroup>>,
    rules: Mutex<Vec<(String, CategoryId)>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn transactions(&self) -> Vec<(Option<String>, Transaction)> {
        self.transactions.lock().unwrap().clone()
    }

    pub fn bill_candidates(&self) -> Vec<RecurringGroup> {
        self.bills.lock().unwrap().clone()
    }

    pub fn merchant_rules(&self) -> Vec<(String, CategoryId)> {
        self.rules.lock().unwrap().clone()
    }

    fn allocate(&self, count: usize) -> Vec<i64> {
        let mut next = self.next_id.lock().unwrap();
        let ids = (*next + 1..=*next + count as i64).collect();
        *next += count as i64;
        ids
    }
}

impl ImportStore for MemoryStore {
    fn persist_transactions(
        &self,
        account_tag: Option<&str>,
        transactions: &[Transaction],
    ) -> Result<Vec<i64>, StoreError> {
        let mut rows = self.transactions.lock().unwrap();
        for tx in transactions {
            rows.push((account_tag.map(str::to_string), tx.clone()));
        }
        Ok(self.allocate(transactions.len()))
    }

    fn persist_bill_candidates(&self, bills: &[RecurringGroup]) -> Result<Vec<i64>, StoreError> {
        self.bills.lock().unwrap().extend_from_slice(bills);
        Ok(self.allocate(bills.len()))
    }

    fn persist_merchant_rule(
        &self,
        pattern: &str,
        category: &CategoryId,
    ) -> Result<(), StoreError> {
        let mut rules = self.rules.lock().unwrap();
        rules.retain(|(p, _)| p != pattern);
        rules.push((pattern.to_string(), category.clone()));
        Ok(())
    }
}
