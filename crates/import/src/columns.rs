use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tabular::ColumnSet;

/// The four roles a source column can play during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Date,
    Amount,
    Description,
    Category,
}

impl SemanticField {
    pub const ALL: [SemanticField; 4] = [
        SemanticField::Date,
        SemanticField::Amount,
        SemanticField::Description,
        SemanticField::Category,
    ];

    /// Lowercase substrings that mark a header as a candidate for this field.
    fn indicators(self) -> &'static [&'static str] {
        match self {
            SemanticField::Date => &["date", "posted", "trans date"],
            SemanticField::Amount => &["amount", "debit", "credit", "value"],
            SemanticField::Description => &["description", "memo", "payee", "merchant", "name"],
            SemanticField::Category => &["category", "type", "classification"],
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, SemanticField::Category)
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticField::Date => write!(f, "date"),
            SemanticField::Amount => write!(f, "amount"),
            SemanticField::Description => write!(f, "description"),
            SemanticField::Category => write!(f, "category"),
        }
    }
}

/// Maps semantic fields to source headers. Fields left `None` by detection can
/// be set by hand; detection never overwrites an assignment that is already
/// in place, so auto-detect after manual edits is a no-op for those fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl ColumnMapping {
    pub fn detect(columns: &ColumnSet) -> ColumnMapping {
        let mut mapping = ColumnMapping::default();
        mapping.fill_from(columns);
        mapping
    }

    /// Walks headers in source order and assigns each to the first unassigned
    /// field whose indicator list it matches. A header is consumed by at most
    /// one field, and an assigned field is never reassigned.
    pub fn fill_from(&mut self, columns: &ColumnSet) {
        for header in columns.headers() {
            let lowered = header.to_lowercase();
            for field in SemanticField::ALL {
                if self.get(field).is_some() {
                    continue;
                }
                if field.indicators().iter().any(|ind| lowered.contains(ind)) {
                    self.set(field, header.clone());
                    break;
                }
            }
        }
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::Date => self.date.as_deref(),
            SemanticField::Amount => self.amount.as_deref(),
            SemanticField::Description => self.description.as_deref(),
            SemanticField::Category => self.category.as_deref(),
        }
    }

    pub fn set(&mut self, field: SemanticField, header: impl Into<String>) {
        let header = Some(header.into());
        match field {
            SemanticField::Date => self.date = header,
            SemanticField::Amount => self.amount = header,
            SemanticField::Description => self.description = header,
            SemanticField::Category => self.category = header,
        }
    }

    /// Date, amount, and description are required; category is optional.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn missing(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .into_iter()
            .filter(|f| f.is_required() && self.get(*f).is_none())
            .collect()
    }
}
