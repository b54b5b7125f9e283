//! SQLite dedup store and pending-notification queue — both survive restarts.

use async_trait::async_trait;
use drivewatch_core::error::{DriveWatchError, Result};
use chrono::{DateTime, Utc};
use drivewatch_core::traits::{PendingQueue, SeenStore, StoreStats};
use drivewatch_core::types::{PendingNotification, SeenRecord};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at `path`; tables are created if absent.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| DriveWatchError::Store(e.to_string()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS seen_items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                size INTEGER,
                full_path TEXT NOT NULL,
                first_seen TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS scanned_folders (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                last_scanned TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS pending_notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message TEXT NOT NULL,
                send_at INTEGER NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_pending_send_at ON pending_notifications(send_at);"
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;

        tracing::debug!("Dedup store opened: {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| DriveWatchError::Store(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Result<Option<SeenRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, size, full_path FROM seen_items WHERE id = ?1",
            params![id],
            |row| {
                Ok(SeenRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    size: row.get::<_, Option<i64>>(2)?.and_then(|s| u64::try_from(s).ok()),
                    full_path: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| DriveWatchError::Store(e.to_string()))
    }
}

#[async_trait]
impl SeenStore for SqliteStore {
    fn name(&self) -> &str { "sqlite" }

    async fn is_new(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM seen_items WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(!exists)
    }

    async fn record(&self, record: &SeenRecord) -> Result<bool> {
        let conn = self.lock()?;
        let size = record.size.and_then(|s| i64::try_from(s).ok());
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO seen_items (id, name, size, full_path, first_seen) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.name,
                size,
                record.full_path,
                chrono::Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(inserted == 1)
    }

    async fn mark_folder_scanned(&self, folder_id: &str, source: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scanned_folders (id, source, last_scanned) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET source = excluded.source, last_scanned = excluded.last_scanned",
            params![folder_id, source, chrono::Utc::now().to_rfc3339()],
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |r| r.get(0))
                .map_err(|e| DriveWatchError::Store(e.to_string()))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok(StoreStats {
            seen_items: count("SELECT COUNT(*) FROM seen_items")?,
            scanned_folders: count("SELECT COUNT(*) FROM scanned_folders")?,
        })
    }
}

/// `send_at` is stored as Unix milliseconds so range queries compare numbers.
#[async_trait]
impl PendingQueue for SqliteStore {
    fn name(&self) -> &str { "sqlite" }

    async fn enqueue(&self, pending: PendingNotification) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pending_notifications (message, send_at, attempts) VALUES (?1, ?2, ?3)",
            params![pending.message, pending.send_at.timestamp_millis(), pending.attempts],
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(())
    }

    async fn drain(&self, now: DateTime<Utc>) -> Result<Vec<PendingNotification>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "DELETE FROM pending_notifications WHERE send_at <= ?1
             RETURNING message, send_at, attempts"
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;

        let rows = stmt.query_map(params![now.timestamp_millis()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, u32>(2)?))
        }).map_err(|e| DriveWatchError::Store(e.to_string()))?;

        let mut due = Vec::new();
        for row in rows {
            let (message, send_at, attempts) = row.map_err(|e| DriveWatchError::Store(e.to_string()))?;
            due.push(PendingNotification {
                message,
                send_at: DateTime::from_timestamp_millis(send_at).unwrap_or(now),
                attempts,
            });
        }
        due.sort_by_key(|p| p.send_at);
        Ok(due)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM pending_notifications", [], |r| r.get(0))
            .map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    async fn next_due(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let earliest: Option<i64> = conn.query_row(
            "SELECT MIN(send_at) FROM pending_notifications", [], |r| r.get(0),
        ).map_err(|e| DriveWatchError::Store(e.to_string()))?;
        Ok(earliest.and_then(DateTime::from_timestamp_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 8, 30, 0).unwrap()
    }

    fn rec(id: &str, name: &str, size: Option<u64>, path: &str) -> SeenRecord {
        SeenRecord { id: id.into(), name: name.into(), size, full_path: path.into() }
    }

    #[tokio::test]
    async fn test_record_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("seen.db")).unwrap();

        assert!(store.is_new("1").await.unwrap());
        assert!(store.record(&rec("1", "x.txt", Some(1024), "A>x.txt")).await.unwrap());
        assert!(!store.is_new("1").await.unwrap());

        let got = store.get("1").unwrap().unwrap();
        assert_eq!(got.full_path, "A>x.txt");
        assert_eq!(got.size, Some(1024));
        assert!(store.get("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("seen.db")).unwrap();

        assert!(store.record(&rec("2", "B", None, "A>B")).await.unwrap());
        assert!(!store.record(&rec("2", "B2", None, "A>B2")).await.unwrap());
        assert_eq!(store.get("2").unwrap().unwrap().name, "B");
        assert_eq!(store.stats().await.unwrap().seen_items, 1);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("seen.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.record(&rec("3", "y.txt", None, "A>B>y.txt")).await.unwrap();
            store.mark_folder_scanned("2", "A").await.unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert!(!reopened.is_new("3").await.unwrap());
        let stats = reopened.stats().await.unwrap();
        assert_eq!(stats, StoreStats { seen_items: 1, scanned_folders: 1 });
    }

    #[tokio::test]
    async fn test_rescan_updates_folder_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("seen.db")).unwrap();
        store.mark_folder_scanned("root", "A").await.unwrap();
        store.mark_folder_scanned("root", "A").await.unwrap();
        assert_eq!(store.stats().await.unwrap().scanned_folders, 1);
    }

    #[tokio::test]
    async fn test_pending_drain_returns_only_due() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("seen.db")).unwrap();

        store.enqueue(PendingNotification::new("later", t0() + chrono::Duration::hours(1))).await.unwrap();
        store.enqueue(PendingNotification::new("now", t0())).await.unwrap();
        store.enqueue(PendingNotification::new("earlier", t0() - chrono::Duration::minutes(5)).retry(t0())).await.unwrap();

        let due = store.drain(t0()).await.unwrap();
        let messages: Vec<&str> = due.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&"now") && messages.contains(&"earlier"));
        assert_eq!(due.iter().find(|p| p.message == "earlier").unwrap().attempts, 1);

        assert!(store.drain(t0()).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.next_due().await.unwrap(), Some(t0() + chrono::Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_pending_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.db");
        let send_at = t0() + chrono::Duration::hours(24);
        {
            let store = SqliteStore::open(&path).unwrap();
            store.enqueue(PendingNotification::new("<@&1> 📄 New file detected: A>x.txt", send_at)).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.drain(t0()).await.unwrap().is_empty());
        let due = reopened.drain(send_at).await.unwrap();
        assert_eq!(due, vec![PendingNotification::new("<@&1> 📄 New file detected: A>x.txt", send_at)]);
        assert_eq!(reopened.count().await.unwrap(), 0);
        assert!(reopened.next_due().await.unwrap().is_none());
    }
}
