use billfold_core::Transaction;

use crate::text::description_similarity;

pub const DATE_WINDOW_DAYS: i64 = 3;
pub const SIMILARITY_THRESHOLD: f32 = 0.9;

/// Flags likely duplicates within a batch: same amount, dates within the
/// window, and near-identical descriptions. Later rows point at the earliest
/// unflagged match; a row already flagged never serves as an original.
pub fn scan(transactions: &mut [Transaction]) -> usize {
    let mut flagged = 0;

    for j in 1..transactions.len() {
        if transactions[j].duplicate_of.is_some() {
            continue;
        }
        for i in 0..j {
            if transactions[i].duplicate_of.is_some() {
                continue;
            }
            if transactions[i].amount != transactions[j].amount {
                continue;
            }
            let gap = (transactions[j].date - transactions[i].date).num_days().abs();
            if gap > DATE_WINDOW_DAYS {
                continue;
            }
            if description_similarity(&transactions[i].description, &transactions[j].description)
                >= SIMILARITY_THRESHOLD
            {
                let original = transactions[i].id;
                transactions[j].duplicate_of = Some(original);
                flagged += 1;
                break;
            }
        }
    }

    if flagged > 0 {
        tracing::debug!(flagged, "duplicate scan flagged rows");
    }
    flagged
}
