use billfold_core::{CategoryId, Money, Transaction, TxId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::text::merchant_key;
use crate::vocab::{KnownMerchant, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Buckets the mean gap between consecutive charges.
    pub fn from_mean_gap_days(gap: f64) -> Frequency {
        if gap <= 8.0 {
            Frequency::Weekly
        } else if gap <= 16.0 {
            Frequency::Biweekly
        } else if gap <= 35.0 {
            Frequency::Monthly
        } else if gap <= 100.0 {
            Frequency::Quarterly
        } else {
            Frequency::Yearly
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Biweekly => write!(f, "biweekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// A set of transactions that look like one repeating bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringGroup {
    pub merchant_key: String,
    pub display_name: String,
    pub member_ids: Vec<TxId>,
    pub average_amount: Money,
    pub frequency: Frequency,
    /// Most common day-of-month across members.
    pub estimated_due_day: u32,
    pub occurrence_count: usize,
    /// 0..=100. Groups from the known-merchant pass score higher than
    /// amount-cluster guesses.
    pub confidence: u8,
    pub include_as_bill: bool,
    pub category: Option<CategoryId>,
}

/// Two passes over the batch. First, known merchants from the vocabulary
/// claim their transactions by description substring. Second, leftover
/// outflows are clustered by amount (rounded to the nearest nickel) and kept
/// when their descriptions cohere. Output is sorted by descending confidence.
pub fn detect(transactions: &[Transaction], vocab: &Vocabulary) -> Vec<RecurringGroup> {
    let mut groups: Vec<RecurringGroup> = Vec::new();
    let mut claimed_keys: HashSet<String> = HashSet::new();
    let mut claimed_ids: HashSet<TxId> = HashSet::new();

    for km in vocab.known_merchants() {
        let members: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| !t.is_duplicate() && !claimed_ids.contains(&t.id))
            .filter(|t| t.description.to_lowercase().contains(&km.pattern))
            .collect();
        if members.is_empty() {
            continue;
        }
        let key = km.pattern.to_uppercase();
        if !claimed_keys.insert(key.clone()) {
            continue;
        }
        claimed_ids.extend(members.iter().map(|t| t.id));
        groups.push(build_group(key, km.display_name.clone(), Some(km), &members));
    }

    let mut clusters: BTreeMap<i64, Vec<&Transaction>> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| !t.is_duplicate() && t.is_outflow() && !claimed_ids.contains(&t.id))
    {
        clusters.entry(nickel_key(t.amount)).or_default().push(t);
    }
    for members in clusters.values() {
        if members.len() < 2 {
            continue;
        }
        if !descriptions_cohere(members) {
            continue;
        }
        let key = merchant_key(&members[0].description);
        if key.is_empty() || !claimed_keys.insert(key.clone()) {
            continue;
        }
        groups.push(build_group(key.clone(), key, None, members));
    }

    groups.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    tracing::debug!(groups = groups.len(), "recurring detection finished");
    groups
}

fn build_group(
    merchant_key: String,
    display_name: String,
    known: Option<&KnownMerchant>,
    members: &[&Transaction],
) -> RecurringGroup {
    let mut dates: Vec<NaiveDate> = members.iter().map(|t| t.date).collect();
    dates.sort_unstable();
    let frequency = if dates.len() < 2 {
        // A single sighting defaults to the most common billing cadence.
        Frequency::Monthly
    } else {
        let total_gap: i64 = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).sum();
        Frequency::from_mean_gap_days(total_gap as f64 / (dates.len() - 1) as f64)
    };

    let average_amount = mean_abs_amount(members);
    let occurrence_count = members.len();

    let mut confidence: i64 = match known {
        Some(_) => 50 + (10 * occurrence_count as i64).min(30),
        None => 40 + 5 * occurrence_count as i64,
    };
    if let Some(typical) = known.and_then(|km| km.typical_amount) {
        confidence += typical_amount_bonus(average_amount, typical);
    }
    if amounts_are_steady(members, average_amount) {
        confidence += 10;
    }

    RecurringGroup {
        merchant_key,
        display_name,
        member_ids: members.iter().map(|t| t.id).collect(),
        average_amount,
        frequency,
        estimated_due_day: estimate_due_day(members),
        occurrence_count,
        confidence: confidence.clamp(0, 100) as u8,
        include_as_bill: true,
        category: known.map(|km| km.category.clone()),
    }
}

fn mean_abs_amount(members: &[&Transaction]) -> Money {
    if members.is_empty() {
        return Money::zero();
    }
    let total: Decimal = members.iter().map(|t| t.amount.as_decimal().abs()).sum();
    Money::from_decimal(total / Decimal::from(members.len() as i64))
}

/// Within 10% of the curated typical amount is a strong signal, within 25% a
/// weaker one.
fn typical_amount_bonus(average: Money, typical: Money) -> i64 {
    let typical = typical.as_decimal().abs();
    if typical.is_zero() {
        return 0;
    }
    let deviation = (average.as_decimal() - typical).abs() / typical;
    if deviation <= Decimal::new(10, 2) {
        15
    } else if deviation <= Decimal::new(25, 2) {
        10
    } else {
        0
    }
}

/// Mean absolute deviation under 5% of the mean counts as a steady amount.
fn amounts_are_steady(members: &[&Transaction], average: Money) -> bool {
    let mean = average.as_decimal();
    if mean.is_zero() || members.is_empty() {
        return false;
    }
    let total_dev: Decimal = members
        .iter()
        .map(|t| (t.amount.as_decimal().abs() - mean).abs())
        .sum();
    let mad = total_dev / Decimal::from(members.len() as i64);
    mad / mean < Decimal::new(5, 2)
}

/// Mode of the members' day-of-month; ties keep the first seen; 15 when there
/// are no members at all.
fn estimate_due_day(members: &[&Transaction]) -> u32 {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for t in members {
        let day = t.day_of_month();
        match counts.iter_mut().find(|(d, _)| *d == day) {
            Some((_, n)) => *n += 1,
            None => counts.push((day, 1)),
        }
    }
    let mut best_day = 15;
    let mut best_count = 0;
    for (day, n) in counts {
        if n > best_count {
            best_day = day;
            best_count = n;
        }
    }
    best_day
}

fn nickel_key(amount: Money) -> i64 {
    let cents = amount.abs().to_cents();
    let q = cents / 5;
    if cents % 5 >= 3 {
        q + 1
    } else {
        q
    }
}

/// All members share one 15-character description prefix, or a group of three
/// or more spans at most two.
fn descriptions_cohere(members: &[&Transaction]) -> bool {
    let prefixes: HashSet<String> = members
        .iter()
        .map(|t| t.description.chars().take(15).collect())
        .collect();
    prefixes.len() == 1 || (members.len() >= 3 && prefixes.len() <= 2)
}
