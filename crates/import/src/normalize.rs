use billfold_core::{Money, Transaction, TxId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::columns::ColumnMapping;
use crate::error::ImportError;
use crate::tabular::ParsedTable;

/// Category-column values that mark a row as money coming in. Anything else
/// (or no category column at all, with a signed amount) is treated as spend.
const INFLOW_MARKERS: &[&str] = &["income", "credit", "deposit"];

const MISSING_DESCRIPTION: &str = "(no description)";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d %H:%M:%S",
];

/// Turns raw rows into transactions, one per row in input order. Normalization
/// never aborts on a bad cell: dates fall back to `today`, amounts to zero.
pub fn normalize(
    table: &ParsedTable,
    mapping: &ColumnMapping,
    today: NaiveDate,
) -> Result<Vec<Transaction>, ImportError> {
    if !mapping.is_complete() {
        return Err(ImportError::IncompleteMapping {
            missing: mapping.missing(),
        });
    }

    let date_col = mapping.date.as_deref().and_then(|h| table.columns.position(h));
    let amount_col = mapping.amount.as_deref().and_then(|h| table.columns.position(h));
    let desc_col = mapping
        .description
        .as_deref()
        .and_then(|h| table.columns.position(h));
    let category_col = mapping
        .category
        .as_deref()
        .and_then(|h| table.columns.position(h));

    let mut transactions = Vec::with_capacity(table.rows.len());

    for (i, row) in table.rows.iter().enumerate() {
        let raw_date = date_col.map(|c| row.get(c)).unwrap_or("");
        let date = parse_date(raw_date).unwrap_or_else(|| {
            tracing::warn!(row = i + 1, value = raw_date, "unparseable date, using import date");
            today
        });

        let raw_amount = amount_col.map(|c| row.get(c)).unwrap_or("");
        let mut amount = parse_amount(raw_amount);
        if amount.is_zero() && !raw_amount.is_empty() && !raw_amount.chars().any(|c| c.is_ascii_digit()) {
            tracing::warn!(row = i + 1, value = raw_amount, "amount has no digits, using zero");
        }

        let raw_category = category_col
            .map(|c| row.get(c))
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        // A mapped category/type column is the source of truth for direction;
        // otherwise the amount's own sign is trusted.
        if mapping.category.is_some() {
            let marker = raw_category.as_deref().unwrap_or("").to_lowercase();
            if INFLOW_MARKERS.iter().any(|m| marker.contains(m)) {
                amount = amount.abs();
            } else {
                amount = -amount.abs();
            }
        }

        let description = desc_col
            .map(|c| row.get(c))
            .filter(|v| !v.is_empty())
            .unwrap_or(MISSING_DESCRIPTION)
            .to_string();

        let mut tx = Transaction::new(TxId(i), date, amount, description);
        tx.raw_category = raw_category;
        transactions.push(tx);
    }

    Ok(transactions)
}

/// Parses a statement amount leniently: currency symbols, grouping separators,
/// and stray text are dropped; `(...)` wrapping or a leading minus negates. A
/// cell with no digits is zero.
pub fn parse_amount(raw: &str) -> Money {
    let trimmed = raw.trim();
    let (wrapped, body) = match trimmed
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(body.len());
    let mut negative = wrapped;
    for c in body.chars() {
        match c {
            '0'..='9' | '.' => digits.push(c),
            '-' if digits.is_empty() => negative = true,
            _ => {}
        }
    }

    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Money::zero();
    }

    // Keep only the last dot as the decimal separator; earlier ones are
    // grouping separators as in "1.234,56" exports stripped of commas.
    if digits.matches('.').count() > 1 {
        let last = digits.rfind('.').unwrap_or(0);
        digits = digits
            .char_indices()
            .filter(|(i, c)| *c != '.' || *i == last)
            .map(|(_, c)| c)
            .collect();
    }
    if digits.ends_with('.') {
        digits.pop();
    }
    if digits.starts_with('.') {
        digits.insert(0, '0');
    }

    let mut value = Decimal::from_str(&digits).unwrap_or(Decimal::ZERO);
    if negative {
        value = -value;
    }
    Money::from_decimal(value)
}

/// Tries each supported date format in order; `None` when nothing fits.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
