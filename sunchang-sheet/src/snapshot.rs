//! Load the current collection: fetch, normalize, or fall back.
//!
//! A load always produces a complete `Snapshot`. Failures never leave a
//! partial collection behind; they swap in the static fallback list and
//! attach a banner for the user.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use sunchang_core::FinancialNode;
use tracing::warn;

use crate::error::{FetchError, FetchErrorKind};
use crate::fallback::fallback_nodes;
use crate::fetcher::{FormatWarning, SheetClient};
use crate::normalizer::normalize_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Rows from the configured endpoint
    Remote,
    /// Static demo collection
    Fallback,
}

/// Immutable view of one load
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<FinancialNode>,
    pub source: SnapshotSource,
    /// User-visible notice (failed fetch, odd body)
    pub banner: Option<String>,
    pub loaded_at: DateTime<Utc>,
    /// Rows that needed defaults during normalization
    pub degraded_rows: usize,
}

impl Snapshot {
    pub fn fallback(banner: Option<String>) -> Self {
        Self {
            nodes: fallback_nodes(),
            source: SnapshotSource::Fallback,
            banner,
            loaded_at: Utc::now(),
            degraded_rows: 0,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.source == SnapshotSource::Remote
    }
}

/// Banner for a failed fetch
pub fn failure_banner(err: &FetchError) -> String {
    match err.kind() {
        FetchErrorKind::Permission => {
            "權限錯誤：請確認 Apps Script 部署時「誰可以存取」已設為「任何人」。已切換回離線模式。".to_string()
        }
        _ => format!("無法連線至 Google Sheet，已切換回離線模式。請檢查 URL 或權限。({err})"),
    }
}

/// Banner for a body that parsed but held no rows
pub fn format_banner(warning: &FormatWarning) -> String {
    format!("連線成功但沒有資料，或資料格式不符。({warning})")
}

/// Fetch and normalize `endpoint`, or fall back.
///
/// No endpoint means offline mode: the fallback list without a banner.
pub async fn load_snapshot(client: &SheetClient, endpoint: Option<&str>, today: NaiveDate) -> Snapshot {
    let Some(url) = endpoint.map(str::trim).filter(|u| !u.is_empty()) else {
        return Snapshot::fallback(None);
    };

    match client.fetch_rows(url).await {
        Ok(payload) => {
            let report = normalize_rows(&payload.rows, today);
            if report.degraded_rows > 0 {
                warn!(
                    degraded = report.degraded_rows,
                    total = report.nodes.len(),
                    "some rows were filled with defaults"
                );
            }
            Snapshot {
                nodes: report.nodes,
                source: SnapshotSource::Remote,
                banner: payload.warning.as_ref().map(format_banner),
                loaded_at: Utc::now(),
                degraded_rows: report.degraded_rows,
            }
        }
        Err(err) => {
            warn!(error = %err, "sheet fetch failed; using fallback collection");
            Snapshot::fallback(Some(failure_banner(&err)))
        }
    }
}

/// Ticket for one in-flight load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Holds the current snapshot. A load that finishes after a newer one
/// started is discarded (last write wins); loads are never cancelled.
#[derive(Debug)]
pub struct SnapshotStore {
    generation: AtomicU64,
    current: Mutex<(u64, Arc<Snapshot>)>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            generation: AtomicU64::new(0),
            current: Mutex::new((0, Arc::new(initial))),
        }
    }

    /// Start a load; supersedes every earlier ticket.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publish `snapshot` if `ticket` is still the newest load.
    /// Returns whether it was published.
    pub fn commit(&self, ticket: LoadTicket, snapshot: Snapshot) -> bool {
        if ticket.0 != self.generation.load(Ordering::SeqCst) {
            return false;
        }
        let mut slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if ticket.0 <= slot.0 {
            return false;
        }
        *slot = (ticket.0, Arc::new(snapshot));
        true
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&slot.1)
    }
}

/// Result of the settings "test connection" action
#[derive(Debug)]
pub enum ConnectionTest {
    /// Rows came back; first row's reconciled due date
    Success { rows: usize, first_due: Option<String> },
    /// Reachable, but nothing usable
    Empty { warning: Option<FormatWarning> },
    Failed(FetchError),
}

impl ConnectionTest {
    pub fn is_success(&self) -> bool {
        matches!(self, ConnectionTest::Success { .. })
    }

    pub fn message(&self) -> String {
        match self {
            ConnectionTest::Success { rows, first_due } => format!(
                "成功！讀取到 {rows} 筆資料。首筆資料日期：{}",
                first_due.as_deref().unwrap_or("-")
            ),
            ConnectionTest::Empty { warning: None } => "連線成功但沒有資料，或資料格式不符。".to_string(),
            ConnectionTest::Empty { warning: Some(w) } => format_banner(w),
            ConnectionTest::Failed(FetchError::InvalidUrl { url, .. }) if url.trim().is_empty() => {
                "請先輸入網址".to_string()
            }
            ConnectionTest::Failed(err) if err.kind() == FetchErrorKind::Permission => {
                "權限錯誤：請確認部署時「誰可以存取」已設為「任何人」。".to_string()
            }
            ConnectionTest::Failed(err) => format!("連線失敗：{err}"),
        }
    }
}

/// One fetch of `url`, reported without touching any stored snapshot.
pub async fn test_connection(client: &SheetClient, url: &str, today: NaiveDate) -> ConnectionTest {
    match client.fetch_rows(url).await {
        Ok(payload) if payload.is_empty() => ConnectionTest::Empty {
            warning: payload.warning,
        },
        Ok(payload) => {
            let report = normalize_rows(&payload.rows, today);
            ConnectionTest::Success {
                rows: report.nodes.len(),
                first_due: report.nodes.first().map(|n| n.due_date.to_string()),
            }
        }
        Err(err) => ConnectionTest::Failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(n: usize) -> Snapshot {
        Snapshot {
            nodes: fallback_nodes().into_iter().take(n).collect(),
            source: SnapshotSource::Remote,
            banner: None,
            loaded_at: Utc::now(),
            degraded_rows: 0,
        }
    }

    #[test]
    fn test_store_last_write_wins() {
        let store = SnapshotStore::new(Snapshot::fallback(None));
        let first = store.begin();
        let second = store.begin();

        assert!(store.commit(second, remote(2)));
        // The older load finishing late is dropped
        assert!(!store.commit(first, remote(5)));
        assert_eq!(store.current().nodes.len(), 2);
        assert!(store.current().is_remote());
    }

    #[test]
    fn test_store_keeps_initial_until_commit() {
        let store = SnapshotStore::new(Snapshot::fallback(None));
        let _pending = store.begin();
        assert_eq!(store.current().source, SnapshotSource::Fallback);
        assert_eq!(store.current().nodes.len(), 10);
    }

    #[tokio::test]
    async fn test_no_endpoint_is_offline_fallback() {
        let client = SheetClient::new();
        let today = NaiveDate::from_ymd_opt(2023, 11, 21).unwrap();
        for endpoint in [None, Some(""), Some("   ")] {
            let snap = load_snapshot(&client, endpoint, today).await;
            assert_eq!(snap.source, SnapshotSource::Fallback);
            assert_eq!(snap.banner, None);
        }
    }

    #[tokio::test]
    async fn test_invalid_endpoint_falls_back_with_banner() {
        let client = SheetClient::new();
        let today = NaiveDate::from_ymd_opt(2023, 11, 21).unwrap();
        let snap = load_snapshot(&client, Some("not a url"), today).await;
        assert_eq!(snap.source, SnapshotSource::Fallback);
        assert!(snap.banner.unwrap().contains("離線模式"));
    }

    #[test]
    fn test_connection_messages() {
        let empty_url = ConnectionTest::Failed(FetchError::InvalidUrl {
            url: String::new(),
            reason: "empty".into(),
        });
        assert_eq!(empty_url.message(), "請先輸入網址");

        let denied = ConnectionTest::Failed(FetchError::PermissionDenied);
        assert!(denied.message().starts_with("權限錯誤"));

        let ok = ConnectionTest::Success {
            rows: 3,
            first_due: Some("2023-11-20".into()),
        };
        assert!(ok.is_success());
        assert_eq!(ok.message(), "成功！讀取到 3 筆資料。首筆資料日期：2023-11-20");
    }
}
