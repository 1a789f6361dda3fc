use billfold_core::{CategoryId, HubType, Money, Transaction, TxId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::categorize::{Categorizer, MerchantRule};
use crate::columns::{ColumnMapping, SemanticField};
use crate::dedup;
use crate::error::ImportError;
use crate::normalize;
use crate::recurring::{self, Frequency, RecurringGroup};
use crate::tabular::{self, ColumnSet, FileKind, ParsedTable};
use crate::vocab::Vocabulary;

const TOP_CATEGORY_COUNT: usize = 5;

/// Wizard position. Stages advance strictly forward; `back_to` rewinds the
/// cursor without discarding data until the rewound stage is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Uploaded,
    Mapped,
    Normalized,
    Categorized,
    RecurringDetected,
    Reviewed,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Uploaded => write!(f, "uploaded"),
            Stage::Mapped => write!(f, "mapped"),
            Stage::Normalized => write!(f, "normalized"),
            Stage::Categorized => write!(f, "categorized"),
            Stage::RecurringDetected => write!(f, "recurring_detected"),
            Stage::Reviewed => write!(f, "reviewed"),
            Stage::Committed => write!(f, "committed"),
        }
    }
}

/// Who is importing and which accounts they may tag rows with. An empty tag
/// list places no restriction.
#[derive(Debug, Clone)]
pub struct Profile {
    pub hub: HubType,
    pub account_tags: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            hub: HubType::Personal,
            account_tags: Vec::new(),
        }
    }
}

impl Profile {
    pub fn personal() -> Self {
        Profile::default()
    }

    pub fn business() -> Self {
        Profile {
            hub: HubType::Business,
            account_tags: Vec::new(),
        }
    }

    pub fn with_account_tags(mut self, tags: Vec<String>) -> Self {
        self.account_tags = tags;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: CategoryId,
    pub outflow: Money,
}

/// Aggregated view of the batch, excluding rows flagged as duplicates.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub transaction_count: usize,
    pub categorized_count: usize,
    pub uncategorized_count: usize,
    pub duplicate_count: usize,
    pub income_total: Money,
    pub expense_total: Money,
    pub top_categories: Vec<CategoryTotal>,
    pub bill_candidate_count: usize,
    pub bill_candidate_total: Money,
}

/// The frozen result of a committed session.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedImport {
    pub hub: HubType,
    pub account_tag: Option<String>,
    pub transactions: Vec<Transaction>,
    pub bill_candidates: Vec<RecurringGroup>,
    pub learned_rules: Vec<MerchantRule>,
    pub summary: ImportSummary,
}

/// One statement import from upload to commit. The session owns every
/// intermediate artifact and enforces the stage order; all computation is
/// synchronous and deterministic for a given input.
#[derive(Debug)]
pub struct ImportSession {
    table: ParsedTable,
    profile: Profile,
    vocab: Arc<Vocabulary>,
    mapping: ColumnMapping,
    categorizer: Categorizer,
    transactions: Vec<Transaction>,
    recurring: Vec<RecurringGroup>,
    account_tag: Option<String>,
    stage: Stage,
    committed: Option<Arc<CommittedImport>>,
}

impl ImportSession {
    pub fn new(table: ParsedTable, profile: Profile) -> ImportSession {
        let vocab = Vocabulary::builtin(profile.hub);
        Self::with_vocabulary(table, profile, vocab)
    }

    /// Session with a caller-supplied vocabulary, e.g. one loaded from TOML.
    pub fn with_vocabulary(
        table: ParsedTable,
        profile: Profile,
        vocab: Arc<Vocabulary>,
    ) -> ImportSession {
        tracing::debug!(rows = table.row_count(), hub = %profile.hub, "import session opened");
        ImportSession {
            mapping: ColumnMapping::default(),
            categorizer: Categorizer::new(vocab.clone()),
            vocab,
            table,
            profile,
            transactions: Vec::new(),
            recurring: Vec::new(),
            account_tag: None,
            stage: Stage::Uploaded,
            committed: None,
        }
    }

    pub fn from_bytes(
        data: &[u8],
        kind: FileKind,
        profile: Profile,
    ) -> Result<ImportSession, ImportError> {
        let table = tabular::parse_bytes(data, kind)?;
        Ok(ImportSession::new(table, profile))
    }

    // ── accessors ─────────────────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.table.columns
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn recurring_groups(&self) -> &[RecurringGroup] {
        &self.recurring
    }

    pub fn account_tag(&self) -> Option<&str> {
        self.account_tag.as_deref()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Seeds merchant rules saved by an earlier session.
    pub fn preload_rules(&mut self, rules: Vec<MerchantRule>) {
        self.categorizer.preload_rules(rules);
    }

    pub fn set_remember_choices(&mut self, remember: bool) {
        self.categorizer.remember_choices = remember;
    }

    // ── stage transitions ─────────────────────────────────────────────────────

    /// Auto-detects column assignments, filling only fields not already set.
    /// Advances to `Mapped` when the mapping is complete; otherwise the
    /// session stays at `Uploaded` awaiting manual assignments.
    pub fn map_columns(&mut self) -> Result<&ColumnMapping, ImportError> {
        self.ensure_stage(Stage::Uploaded)?;
        self.invalidate_downstream();
        self.mapping.fill_from(&self.table.columns);
        if self.mapping.is_complete() {
            self.stage = Stage::Mapped;
        }
        Ok(&self.mapping)
    }

    /// Manually assigns one semantic field to a source header. Allowed while
    /// at or before `Mapped`; any later artifacts are invalidated.
    pub fn set_column(
        &mut self,
        field: SemanticField,
        header: impl Into<String>,
    ) -> Result<(), ImportError> {
        if self.stage > Stage::Mapped {
            return Err(ImportError::WrongStage {
                needed: Stage::Mapped,
                at: self.stage,
            });
        }
        self.invalidate_downstream();
        self.mapping.set(field, header);
        if self.stage == Stage::Uploaded && self.mapping.is_complete() {
            self.stage = Stage::Mapped;
        }
        Ok(())
    }

    /// Builds transactions from the raw rows, applies the account tag, and
    /// flags likely duplicates. `today` anchors unparseable dates.
    pub fn normalize(&mut self, today: NaiveDate) -> Result<usize, ImportError> {
        self.ensure_stage(Stage::Mapped)?;
        let mut transactions = normalize::normalize(&self.table, &self.mapping, today)?;
        if let Some(tag) = &self.account_tag {
            for tx in &mut transactions {
                tx.account_tag = Some(tag.clone());
            }
        }
        let duplicates = dedup::scan(&mut transactions);
        self.transactions = transactions;
        self.recurring.clear();
        self.stage = Stage::Normalized;
        tracing::info!(
            transactions = self.transactions.len(),
            duplicates,
            "normalized statement batch"
        );
        Ok(self.transactions.len())
    }

    /// Runs the categorizer over the batch; confirmed rows are left alone.
    pub fn categorize(&mut self) -> Result<usize, ImportError> {
        self.ensure_stage(Stage::Normalized)?;
        let matched = self.categorizer.apply(&mut self.transactions);
        self.recurring.clear();
        self.stage = Stage::Categorized;
        Ok(matched)
    }

    pub fn detect_recurring(&mut self) -> Result<usize, ImportError> {
        self.ensure_stage(Stage::Categorized)?;
        self.recurring = recurring::detect(&self.transactions, &self.vocab);
        self.stage = Stage::RecurringDetected;
        Ok(self.recurring.len())
    }

    /// Marks the session reviewed and returns the summary as it stands.
    pub fn review(&mut self) -> Result<ImportSummary, ImportError> {
        self.ensure_stage(Stage::RecurringDetected)?;
        self.stage = Stage::Reviewed;
        Ok(self.summary())
    }

    /// Freezes the session. Duplicate rows and excluded bill candidates are
    /// dropped from the result. Committing again returns the same result.
    pub fn commit(&mut self) -> Result<Arc<CommittedImport>, ImportError> {
        if let Some(existing) = &self.committed {
            return Ok(existing.clone());
        }
        self.ensure_stage(Stage::Reviewed)?;
        let transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| !t.is_duplicate())
            .cloned()
            .collect();
        let bill_candidates: Vec<RecurringGroup> = self
            .recurring
            .iter()
            .filter(|g| g.include_as_bill)
            .cloned()
            .collect();
        let committed = Arc::new(CommittedImport {
            hub: self.profile.hub,
            account_tag: self.account_tag.clone(),
            transactions,
            bill_candidates,
            learned_rules: self.categorizer.learned_rules().to_vec(),
            summary: self.summary(),
        });
        tracing::info!(
            transactions = committed.transactions.len(),
            bills = committed.bill_candidates.len(),
            "import committed"
        );
        self.committed = Some(committed.clone());
        self.stage = Stage::Committed;
        Ok(committed)
    }

    /// Rewinds the cursor to an earlier stage. Data computed by later stages
    /// is kept until one of them is re-run. A committed session cannot move.
    pub fn back_to(&mut self, target: Stage) -> Result<(), ImportError> {
        if self.stage == Stage::Committed || target >= self.stage {
            return Err(ImportError::WrongStage {
                needed: target,
                at: self.stage,
            });
        }
        self.stage = target;
        Ok(())
    }

    // ── review actions ────────────────────────────────────────────────────────

    /// Pins a category on one transaction. When remembering is on, the
    /// merchant key becomes a learned rule for future batches.
    pub fn confirm_category(
        &mut self,
        id: TxId,
        category: CategoryId,
    ) -> Result<(), ImportError> {
        self.ensure_reached(Stage::Normalized)?;
        let idx = self.find_transaction(id)?;
        self.categorizer.confirm(&mut self.transactions[idx], category);
        Ok(())
    }

    /// Confirms every suggested category in one sweep without learning rules.
    pub fn accept_all(&mut self) -> Result<usize, ImportError> {
        self.ensure_reached(Stage::Normalized)?;
        Ok(self.categorizer.accept_all(&mut self.transactions))
    }

    /// Removes a duplicate flag the scan got wrong.
    pub fn clear_duplicate(&mut self, id: TxId) -> Result<(), ImportError> {
        self.ensure_reached(Stage::Normalized)?;
        let idx = self.find_transaction(id)?;
        self.transactions[idx].duplicate_of = None;
        Ok(())
    }

    /// Flags `id` as a duplicate of `of` for pairs the scan missed.
    pub fn flag_duplicate(&mut self, id: TxId, of: TxId) -> Result<(), ImportError> {
        self.ensure_reached(Stage::Normalized)?;
        // A row cannot be its own original.
        if id == of {
            return Err(ImportError::UnknownTransaction(of));
        }
        self.find_transaction(of)?;
        let idx = self.find_transaction(id)?;
        self.transactions[idx].duplicate_of = Some(of);
        Ok(())
    }

    /// Tags the whole batch with one of the profile's accounts. Applies
    /// retroactively to already-normalized transactions.
    pub fn set_account_tag(&mut self, tag: &str) -> Result<(), ImportError> {
        if self.stage == Stage::Committed {
            return Err(ImportError::WrongStage {
                needed: Stage::Reviewed,
                at: self.stage,
            });
        }
        if !self.profile.account_tags.is_empty()
            && !self.profile.account_tags.iter().any(|t| t == tag)
        {
            return Err(ImportError::UnknownAccountTag(tag.to_string()));
        }
        self.account_tag = Some(tag.to_string());
        for tx in &mut self.transactions {
            tx.account_tag = Some(tag.to_string());
        }
        Ok(())
    }

    pub fn set_bill_included(&mut self, key: &str, included: bool) -> Result<(), ImportError> {
        self.ensure_reached(Stage::RecurringDetected)?;
        self.find_group(key)?.include_as_bill = included;
        Ok(())
    }

    pub fn set_group_frequency(
        &mut self,
        key: &str,
        frequency: Frequency,
    ) -> Result<(), ImportError> {
        self.ensure_reached(Stage::RecurringDetected)?;
        self.find_group(key)?.frequency = frequency;
        Ok(())
    }

    pub fn set_group_due_day(&mut self, key: &str, day: u32) -> Result<(), ImportError> {
        self.ensure_reached(Stage::RecurringDetected)?;
        if !(1..=31).contains(&day) {
            return Err(ImportError::InvalidDueDay(day));
        }
        self.find_group(key)?.estimated_due_day = day;
        Ok(())
    }

    // ── summary ───────────────────────────────────────────────────────────────

    /// Computed on demand from the current batch; never cached.
    pub fn summary(&self) -> ImportSummary {
        let live: Vec<&Transaction> =
            self.transactions.iter().filter(|t| !t.is_duplicate()).collect();
        let duplicate_count = self.transactions.len() - live.len();
        let categorized_count = live.iter().filter(|t| t.category.is_some()).count();
        let income_total: Money = live
            .iter()
            .filter(|t| t.is_inflow())
            .map(|t| t.amount)
            .sum();
        let expense_total: Money = live
            .iter()
            .filter(|t| t.is_outflow())
            .map(|t| t.amount.abs())
            .sum();

        let mut spend: BTreeMap<&CategoryId, Money> = BTreeMap::new();
        for t in live.iter().filter(|t| t.is_outflow()) {
            if let Some(category) = &t.category {
                let entry = spend.entry(category).or_insert_with(Money::zero);
                *entry = *entry + t.amount.abs();
            }
        }
        let mut top_categories: Vec<CategoryTotal> = spend
            .into_iter()
            .map(|(category, outflow)| CategoryTotal {
                category: category.clone(),
                outflow,
            })
            .collect();
        top_categories.sort_by(|a, b| b.outflow.cmp(&a.outflow));
        top_categories.truncate(TOP_CATEGORY_COUNT);

        let bills: Vec<&RecurringGroup> =
            self.recurring.iter().filter(|g| g.include_as_bill).collect();

        ImportSummary {
            transaction_count: live.len(),
            categorized_count,
            uncategorized_count: live.len() - categorized_count,
            duplicate_count,
            income_total,
            expense_total,
            top_categories,
            bill_candidate_count: bills.len(),
            bill_candidate_total: bills.iter().map(|g| g.average_amount).sum(),
        }
    }

    // ── internals ─────────────────────────────────────────────────────────────

    fn ensure_stage(&self, needed: Stage) -> Result<(), ImportError> {
        if self.stage == needed {
            Ok(())
        } else {
            Err(ImportError::WrongStage {
                needed,
                at: self.stage,
            })
        }
    }

    fn ensure_reached(&self, needed: Stage) -> Result<(), ImportError> {
        if self.stage >= needed && self.stage < Stage::Committed {
            Ok(())
        } else {
            Err(ImportError::WrongStage {
                needed,
                at: self.stage,
            })
        }
    }

    fn invalidate_downstream(&mut self) {
        self.transactions.clear();
        self.recurring.clear();
    }

    fn find_transaction(&self, id: TxId) -> Result<usize, ImportError> {
        self.transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or(ImportError::UnknownTransaction(id))
    }

    fn find_group(&mut self, key: &str) -> Result<&mut RecurringGroup, ImportError> {
        self.recurring
            .iter_mut()
            .find(|g| g.merchant_key == key)
            .ok_or_else(|| ImportError::UnknownRecurringGroup(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &[u8] = b"Date,Description,Amount\n\
2024-01-15,NETFLIX.COM 866-579-7172,-15.99\n\
2024-02-15,NETFLIX.COM 866-579-7172,-15.99\n\
2024-03-15,NETFLIX.COM 866-579-7172,-15.99\n\
2024-01-20,WHOLE FOODS MARKET 10293,-87.34\n\
2024-01-31,PAYROLL ACME CORP,2500.00\n\
2024-01-22,QUANTUM FLOWERS LLC,-30.00\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn session_for(data: &[u8]) -> ImportSession {
        ImportSession::from_bytes(data, FileKind::Csv, Profile::personal()).unwrap()
    }

    fn driven_session(data: &[u8]) -> ImportSession {
        let mut s = session_for(data);
        s.map_columns().unwrap();
        s.normalize(today()).unwrap();
        s.categorize().unwrap();
        s.detect_recurring().unwrap();
        s
    }

    // ── the happy path ────────────────────────────────────────────────────────

    #[test]
    fn full_pipeline_from_upload_to_commit() {
        let mut s = driven_session(STATEMENT);
        let summary = s.review().unwrap();

        assert_eq!(summary.transaction_count, 6);
        assert_eq!(summary.duplicate_count, 0);
        assert_eq!(summary.income_total, Money::from_cents(250000));
        assert_eq!(summary.expense_total, Money::from_cents(1599 * 3 + 8734 + 3000));
        // Netflix, groceries, and payroll categorize; the florist does not.
        assert_eq!(summary.categorized_count, 5);
        assert_eq!(summary.uncategorized_count, 1);

        let committed = s.commit().unwrap();
        assert_eq!(s.stage(), Stage::Committed);
        assert_eq!(committed.transactions.len(), 6);

        let netflix = committed
            .bill_candidates
            .iter()
            .find(|g| g.display_name == "Netflix")
            .unwrap();
        assert!(netflix.confidence >= 90);
    }

    #[test]
    fn commit_twice_returns_the_same_frozen_result() {
        let mut s = driven_session(STATEMENT);
        s.review().unwrap();
        let first = s.commit().unwrap();
        let second = s.commit().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn unknown_merchant_is_committed_uncategorized() {
        let mut s = driven_session(STATEMENT);
        s.review().unwrap();
        let committed = s.commit().unwrap();
        let florist = committed
            .transactions
            .iter()
            .find(|t| t.description.contains("QUANTUM FLOWERS"))
            .unwrap();
        assert_eq!(florist.category, None);
        assert!(committed.summary.uncategorized_count >= 1);
    }

    // ── stage discipline ──────────────────────────────────────────────────────

    #[test]
    fn stages_cannot_be_skipped() {
        let mut s = session_for(STATEMENT);
        assert!(matches!(
            s.normalize(today()),
            Err(ImportError::WrongStage { needed: Stage::Mapped, at: Stage::Uploaded })
        ));
        assert!(matches!(s.categorize(), Err(ImportError::WrongStage { .. })));
        assert!(matches!(s.detect_recurring(), Err(ImportError::WrongStage { .. })));
        assert!(matches!(s.review(), Err(ImportError::WrongStage { .. })));
        assert!(matches!(s.commit(), Err(ImportError::WrongStage { .. })));
    }

    #[test]
    fn incomplete_detection_waits_for_manual_mapping() {
        let data = b"When,Who,How Much\n2024-01-15,GROCER,-10.00\n";
        let mut s = session_for(data);
        s.map_columns().unwrap();
        assert_eq!(s.stage(), Stage::Uploaded);
        assert!(!s.mapping().is_complete());

        s.set_column(SemanticField::Date, "When").unwrap();
        s.set_column(SemanticField::Description, "Who").unwrap();
        s.set_column(SemanticField::Amount, "How Much").unwrap();
        assert_eq!(s.stage(), Stage::Mapped);
        assert_eq!(s.normalize(today()).unwrap(), 1);
    }

    #[test]
    fn back_to_keeps_data_until_a_stage_is_rerun() {
        let mut s = driven_session(STATEMENT);
        assert!(!s.recurring_groups().is_empty());

        s.back_to(Stage::Normalized).unwrap();
        assert_eq!(s.stage(), Stage::Normalized);
        // Retained for inspection...
        assert!(!s.transactions().is_empty());
        assert!(!s.recurring_groups().is_empty());

        // ...until the stage is recomputed.
        s.categorize().unwrap();
        assert!(s.recurring_groups().is_empty());
        s.detect_recurring().unwrap();
        assert!(!s.recurring_groups().is_empty());
    }

    #[test]
    fn back_to_rejects_forward_or_committed_moves() {
        let mut s = driven_session(STATEMENT);
        assert!(s.back_to(Stage::Reviewed).is_err());
        s.review().unwrap();
        s.commit().unwrap();
        assert!(matches!(
            s.back_to(Stage::Uploaded),
            Err(ImportError::WrongStage { .. })
        ));
    }

    #[test]
    fn remapping_invalidates_normalized_data() {
        let mut s = driven_session(STATEMENT);
        s.back_to(Stage::Uploaded).unwrap();
        s.set_column(SemanticField::Description, "Date").unwrap();
        assert!(s.transactions().is_empty());
        assert!(s.recurring_groups().is_empty());
    }

    // ── review actions ────────────────────────────────────────────────────────

    #[test]
    fn confirm_category_pins_and_learns() {
        let mut s = driven_session(STATEMENT);
        let florist = s
            .transactions()
            .iter()
            .find(|t| t.description.contains("QUANTUM FLOWERS"))
            .map(|t| t.id)
            .unwrap();
        s.confirm_category(florist, CategoryId::new("shopping")).unwrap();

        let tx = s.transactions().iter().find(|t| t.id == florist).unwrap();
        assert_eq!(tx.category, Some(CategoryId::new("shopping")));
        assert!(tx.category_confirmed);

        s.review().unwrap();
        let committed = s.commit().unwrap();
        assert!(committed
            .learned_rules
            .iter()
            .any(|r| r.pattern == "QUANTUM FLOWERS LLC"));
    }

    #[test]
    fn confirm_category_unknown_id_errors() {
        let mut s = driven_session(STATEMENT);
        assert!(matches!(
            s.confirm_category(TxId(999), CategoryId::new("shopping")),
            Err(ImportError::UnknownTransaction(TxId(999)))
        ));
    }

    #[test]
    fn accept_all_confirms_every_suggestion() {
        let mut s = driven_session(STATEMENT);
        let confirmed = s.accept_all().unwrap();
        assert_eq!(confirmed, 5);
        // Bulk acceptance learns no rules.
        s.review().unwrap();
        assert!(s.commit().unwrap().learned_rules.is_empty());
    }

    #[test]
    fn duplicates_are_flagged_and_dropped_at_commit() {
        let data = b"Date,Description,Amount\n\
2024-01-15,STARBUCKS STORE 05411,-5.75\n\
2024-01-15,STARBUCKS STORE 05411,-5.75\n";
        let mut s = driven_session(data);
        let summary = s.summary();
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.duplicate_count, 1);

        s.review().unwrap();
        let committed = s.commit().unwrap();
        assert_eq!(committed.transactions.len(), 1);
    }

    #[test]
    fn clearing_a_duplicate_restores_the_row() {
        let data = b"Date,Description,Amount\n\
2024-01-15,STARBUCKS STORE 05411,-5.75\n\
2024-01-15,STARBUCKS STORE 05411,-5.75\n";
        let mut s = driven_session(data);
        let flagged = s
            .transactions()
            .iter()
            .find(|t| t.is_duplicate())
            .map(|t| t.id)
            .unwrap();
        s.clear_duplicate(flagged).unwrap();
        assert_eq!(s.summary().transaction_count, 2);
        assert_eq!(s.summary().duplicate_count, 0);

        // The cleared flag survives a categorizer re-run.
        s.back_to(Stage::Normalized).unwrap();
        s.categorize().unwrap();
        assert_eq!(s.summary().duplicate_count, 0);
    }

    #[test]
    fn manually_flagged_duplicates_are_dropped_at_commit() {
        let mut s = driven_session(STATEMENT);
        let netflix: Vec<TxId> = s
            .transactions()
            .iter()
            .filter(|t| t.description.contains("NETFLIX"))
            .map(|t| t.id)
            .collect();
        s.flag_duplicate(netflix[2], netflix[0]).unwrap();
        assert_eq!(s.summary().duplicate_count, 1);

        assert!(matches!(
            s.flag_duplicate(netflix[0], netflix[0]),
            Err(ImportError::UnknownTransaction(_))
        ));
        assert!(matches!(
            s.flag_duplicate(TxId(999), netflix[0]),
            Err(ImportError::UnknownTransaction(TxId(999)))
        ));

        s.review().unwrap();
        assert_eq!(s.commit().unwrap().transactions.len(), 5);
    }

    #[test]
    fn account_tag_must_come_from_the_profile() {
        let profile = Profile::personal()
            .with_account_tags(vec!["checking".to_string(), "savings".to_string()]);
        let mut s =
            ImportSession::from_bytes(STATEMENT, FileKind::Csv, profile).unwrap();
        s.map_columns().unwrap();
        s.normalize(today()).unwrap();

        assert!(matches!(
            s.set_account_tag("brokerage"),
            Err(ImportError::UnknownAccountTag(_))
        ));
        s.set_account_tag("checking").unwrap();
        assert!(s.transactions().iter().all(|t| t.account_tag.as_deref() == Some("checking")));
    }

    #[test]
    fn bill_candidate_edits_flow_into_the_summary() {
        let mut s = driven_session(STATEMENT);
        let key = s.recurring_groups()[0].merchant_key.clone();

        s.set_group_due_day(&key, 28).unwrap();
        s.set_group_frequency(&key, Frequency::Quarterly).unwrap();
        assert_eq!(s.recurring_groups()[0].estimated_due_day, 28);
        assert_eq!(s.recurring_groups()[0].frequency, Frequency::Quarterly);

        let before = s.summary().bill_candidate_count;
        s.set_bill_included(&key, false).unwrap();
        assert_eq!(s.summary().bill_candidate_count, before - 1);

        assert!(matches!(
            s.set_group_due_day(&key, 32),
            Err(ImportError::InvalidDueDay(32))
        ));
        assert!(matches!(
            s.set_bill_included("NO SUCH KEY", true),
            Err(ImportError::UnknownRecurringGroup(_))
        ));
    }

    #[test]
    fn committed_sessions_are_frozen() {
        let mut s = driven_session(STATEMENT);
        s.review().unwrap();
        s.commit().unwrap();
        assert!(s.confirm_category(TxId(0), CategoryId::new("dining")).is_err());
        assert!(s.accept_all().is_err());
        assert!(s.set_account_tag("checking").is_err());
        assert!(s.set_bill_included("NETFLIX", false).is_err());
    }

    #[test]
    fn committed_import_serializes_for_export() {
        let mut s = driven_session(STATEMENT);
        s.review().unwrap();
        let committed = s.commit().unwrap();
        let json = serde_json::to_value(&*committed).unwrap();
        assert_eq!(json["hub"], "personal");
        assert_eq!(json["summary"]["transaction_count"], 6);
        assert_eq!(json["transactions"][0]["amount"], "-15.99");
        assert!(json["bill_candidates"][0]["merchant_key"].is_string());
    }

    #[test]
    fn excluded_bills_are_dropped_at_commit() {
        let mut s = driven_session(STATEMENT);
        let key = s
            .recurring_groups()
            .iter()
            .find(|g| g.display_name == "Netflix")
            .map(|g| g.merchant_key.clone())
            .unwrap();
        s.set_bill_included(&key, false).unwrap();
        s.review().unwrap();
        let committed = s.commit().unwrap();
        assert!(committed
            .bill_candidates
            .iter()
            .all(|g| g.display_name != "Netflix"));
    }
}
