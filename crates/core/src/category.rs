use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable slug identifying a category, e.g. "groceries" or "software".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(slug: impl Into<String>) -> Self {
        CategoryId(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(slug: &str) -> Self {
        CategoryId(slug.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Transfer,
    Expense,
}

impl CategoryKind {
    /// Income and transfer patterns are tried before expense patterns so that
    /// "PAYROLL TRANSFER" lands on income, not a spending bucket.
    pub fn match_priority(self) -> u8 {
        match self {
            CategoryKind::Income => 0,
            CategoryKind::Transfer => 1,
            CategoryKind::Expense => 2,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Income => write!(f, "income"),
            CategoryKind::Transfer => write!(f, "transfer"),
            CategoryKind::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "transfer" => Ok(CategoryKind::Transfer),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(format!("unknown category kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(id: &str, name: &str, kind: CategoryKind) -> Self {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            kind,
        }
    }
}

/// Which vocabulary a profile draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubType {
    Personal,
    Business,
}

impl fmt::Display for HubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubType::Personal => write!(f, "personal"),
            HubType::Business => write!(f, "business"),
        }
    }
}

impl FromStr for HubType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(HubType::Personal),
            "business" => Ok(HubType::Business),
            other => Err(format!("unknown hub type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_priority_orders_income_first() {
        assert!(CategoryKind::Income.match_priority() < CategoryKind::Transfer.match_priority());
        assert!(CategoryKind::Transfer.match_priority() < CategoryKind::Expense.match_priority());
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [CategoryKind::Income, CategoryKind::Transfer, CategoryKind::Expense] {
            assert_eq!(kind.to_string().parse::<CategoryKind>().unwrap(), kind);
        }
        assert!("groceries".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn hub_type_parses_case_insensitively() {
        assert_eq!("Personal".parse::<HubType>().unwrap(), HubType::Personal);
        assert_eq!("BUSINESS".parse::<HubType>().unwrap(), HubType::Business);
        assert!("corporate".parse::<HubType>().is_err());
    }

    #[test]
    fn category_id_is_transparent() {
        let id = CategoryId::new("dining");
        assert_eq!(id.as_str(), "dining");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dining\"");
    }
}
