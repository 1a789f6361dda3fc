use billfold_core::TxId;
use thiserror::Error;

use crate::columns::SemanticField;
use crate::session::Stage;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("input has no header row")]
    EmptyInput,
    #[error("column mapping incomplete: missing {}", field_list(.missing))]
    IncompleteMapping { missing: Vec<SemanticField> },
    #[error("operation requires the {needed} stage but session is at {at}")]
    WrongStage { needed: Stage, at: Stage },
    #[error("account tag '{0}' is not one of the profile's accounts")]
    UnknownAccountTag(String),
    #[error("due day must be within 1..=31, got {0}")]
    InvalidDueDay(u32),
    #[error("no recurring group keyed '{0}'")]
    UnknownRecurringGroup(String),
    #[error("no transaction with id {0}")]
    UnknownTransaction(TxId),
    #[error("vocabulary error: {0}")]
    Vocabulary(String),
}

fn field_list(fields: &[SemanticField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
