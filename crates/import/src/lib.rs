pub mod categorize;
pub mod columns;
pub mod dedup;
pub mod error;
pub mod normalize;
pub mod recurring;
pub mod session;
pub mod store;
pub mod tabular;
pub(crate) mod text;
pub mod vocab;

pub use categorize::{Categorizer, MerchantRule};
pub use columns::{ColumnMapping, SemanticField};
pub use error::ImportError;
pub use recurring::{Frequency, RecurringGroup};
pub use session::{CategoryTotal, CommittedImport, ImportSession, ImportSummary, Profile, Stage};
pub use store::{persist_committed, ImportStore, MemoryStore, PersistOutcome, StoreError};
pub use tabular::{ColumnSet, FileKind, ParsedTable, RawRow};
pub use vocab::{KnownMerchant, MatchKind, Vocabulary};

use std::path::Path;

/// Opens an import session over statement bytes, inferring the format from
/// the file name.
pub fn open_statement(
    name: &str,
    data: &[u8],
    profile: Profile,
) -> Result<ImportSession, ImportError> {
    let kind = FileKind::from_path(Path::new(name))?;
    ImportSession::from_bytes(data, kind, profile)
}
