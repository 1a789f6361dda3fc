use billfold_core::{CategoryId, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::text::merchant_key;
use crate::vocab::Vocabulary;

/// Upper bound on remembered per-user rules; the least recently confirmed
/// rule is evicted first.
pub const MAX_LEARNED_RULES: usize = 50;

/// A rule learned from a user confirmation: a merchant key prefix and the
/// category the user picked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantRule {
    pub pattern: String,
    pub category: CategoryId,
}

/// Assigns categories from two sources, in order: rules learned from the
/// user's own confirmations (newest first), then the hub vocabulary's static
/// patterns. Same input, same output; nothing here touches a clock or RNG.
#[derive(Debug)]
pub struct Categorizer {
    vocab: Arc<Vocabulary>,
    learned: Vec<MerchantRule>,
    pub remember_choices: bool,
}

impl Categorizer {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Categorizer {
            vocab,
            learned: Vec::new(),
            remember_choices: true,
        }
    }

    /// Seeds rules saved by an earlier session, oldest last.
    pub fn preload_rules(&mut self, rules: Vec<MerchantRule>) {
        self.learned = rules;
        self.learned.truncate(MAX_LEARNED_RULES);
    }

    pub fn learned_rules(&self) -> &[MerchantRule] {
        &self.learned
    }

    pub fn categorize(&self, description: &str) -> Option<CategoryId> {
        let lowered = description.to_lowercase();
        for rule in &self.learned {
            if lowered.contains(&rule.pattern.to_lowercase()) {
                return Some(rule.category.clone());
            }
        }
        self.vocab.match_category(description).cloned()
    }

    /// Categorizes every unconfirmed, non-duplicate transaction in place and
    /// returns how many got a category.
    pub fn apply(&self, transactions: &mut [Transaction]) -> usize {
        let mut matched = 0;
        for tx in transactions
            .iter_mut()
            .filter(|t| !t.category_confirmed && !t.is_duplicate())
        {
            tx.category = self.categorize(&tx.description);
            if tx.category.is_some() {
                matched += 1;
            }
        }
        tracing::debug!(matched, "categorizer pass finished");
        matched
    }

    /// Records the user's choice on one transaction. When remembering is on,
    /// the merchant key becomes a learned rule at the front of the list.
    pub fn confirm(&mut self, tx: &mut Transaction, category: CategoryId) {
        tx.category = Some(category.clone());
        tx.category_confirmed = true;
        if self.remember_choices {
            self.learn(merchant_key(&tx.description), category);
        }
    }

    /// Confirms every transaction that already holds a suggestion. No rules
    /// are learned; bulk acceptance says nothing new about any one merchant.
    pub fn accept_all(&self, transactions: &mut [Transaction]) -> usize {
        let mut confirmed = 0;
        for tx in transactions
            .iter_mut()
            .filter(|t| t.category.is_some() && !t.category_confirmed)
        {
            tx.category_confirmed = true;
            confirmed += 1;
        }
        confirmed
    }

    fn learn(&mut self, pattern: String, category: CategoryId) {
        if pattern.is_empty() {
            return;
        }
        // Re-confirming a merchant moves its rule back to the front.
        self.learned.retain(|r| r.pattern != pattern);
        self.learned.insert(0, MerchantRule { pattern, category });
        self.learned.truncate(MAX_LEARNED_RULES);
    }
}
