//! sunchang-sheet: spreadsheet fetcher, row normalizer, rule tables,
//! fallback collection and CSV export

pub mod error;
pub mod export;
pub mod fallback;
pub mod fetcher;
pub mod normalizer;
pub mod rules;
pub mod snapshot;

pub use error::{FetchError, FetchErrorKind};
pub use export::{ExportView, export_to_path, write_csv};
pub use fallback::fallback_nodes;
pub use fetcher::{FormatWarning, SheetClient, SheetPayload};
pub use normalizer::{Degradation, NormalizeReport, Normalized, normalize_row, normalize_rows};
pub use snapshot::{
    ConnectionTest, LoadTicket, Snapshot, SnapshotSource, SnapshotStore, load_snapshot,
    test_connection,
};
