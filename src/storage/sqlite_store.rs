use rusqlite::{Connection, Result as SqlResult, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::database::Database;
use super::{ErrorCallback, MessageStore, SnapshotCallback, Subscription};
use crate::common::{ChatMessage, NewMessage};
use crate::error::StoreError;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Row count and highest sequence number; changes whenever anyone appends.
type Fingerprint = (i64, i64);

/// Message room backed by a SQLite file that several clients can share.
///
/// Subscriptions poll the file for writes made by other processes and wake up
/// immediately on appends made through this handle.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
    revision: watch::Sender<u64>,
    poll_interval: Duration,
}

impl SqliteStore {
    /// Open (or create) the room at `path`
    pub fn open<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Result<Self, StoreError> {
        let db = Database::new(path)?;
        Self::with_database(db, poll_interval)
    }

    /// Private room that lives as long as this handle
    #[cfg(test)]
    pub fn in_memory(poll_interval: Duration) -> Result<Self, StoreError> {
        let db = Database::in_memory()?;
        Self::with_database(db, poll_interval)
    }

    fn with_database(db: Database, poll_interval: Duration) -> Result<Self, StoreError> {
        init_schema(db.connection())?;
        let (revision, _) = watch::channel(0);
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            revision,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        })
    }

    #[cfg(test)]
    fn message_count(&self) -> Result<usize, StoreError> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        let count: i64 =
            db.connection()
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn init_schema(conn: &Connection) -> SqlResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            sender_id TEXT NOT NULL,
            text TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp, seq)",
        [],
    )?;

    Ok(())
}

fn read_ordered(conn: &Connection) -> SqlResult<Vec<ChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender_id, text, timestamp
         FROM messages
         ORDER BY timestamp ASC, seq ASC",
    )?;

    let messages = stmt
        .query_map([], |row| {
            Ok(ChatMessage {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                text: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?
        .collect::<SqlResult<Vec<_>>>()?;

    Ok(messages)
}

fn fingerprint(conn: &Connection) -> SqlResult<Fingerprint> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(MAX(seq), 0) FROM messages",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}

/// Returns a fresh snapshot only when the table changed since `last_seen`.
fn poll_changes(
    db: &Mutex<Database>,
    last_seen: Option<Fingerprint>,
) -> Result<Option<(Fingerprint, Vec<ChatMessage>)>, StoreError> {
    let db = db.lock().map_err(|_| StoreError::Poisoned)?;
    let conn = db.connection();
    let current = fingerprint(conn)?;
    if last_seen == Some(current) {
        return Ok(None);
    }
    Ok(Some((current, read_ordered(conn)?)))
}

impl MessageStore for SqliteStore {
    fn fetch_ordered(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(read_ordered(db.connection())?)
    }

    fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let stored = message.into_message(Uuid::new_v4().to_string());
        {
            let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
            db.connection().execute(
                "INSERT INTO messages (id, sender_id, text, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![stored.id, stored.sender_id, stored.text, stored.timestamp],
            )?;
        }
        self.revision.send_modify(|revision| *revision += 1);
        Ok(stored)
    }

    fn subscribe(&self, on_snapshot: SnapshotCallback, on_error: ErrorCallback) -> Subscription {
        let db = Arc::clone(&self.db);
        let mut revision = self.revision.subscribe();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_seen = None;

            loop {
                let db = Arc::clone(&db);
                let polled = tokio::task::spawn_blocking(move || poll_changes(&db, last_seen))
                    .await
                    .map_err(StoreError::from)
                    .and_then(|result| result);

                match polled {
                    Ok(Some((current, snapshot))) => {
                        last_seen = Some(current);
                        on_snapshot(snapshot);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("Message subscription stopped: {err}");
                        on_error(err);
                        break;
                    }
                }

                tokio::select! {
                    _ = interval.tick() => {}
                    changed = revision.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Subscription::new(move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn draft(text: &str, timestamp: i64, sender: &str) -> NewMessage {
        NewMessage {
            text: text.to_string(),
            timestamp,
            sender_id: sender.to_string(),
        }
    }

    #[test]
    fn fetch_orders_by_timestamp_then_insertion() {
        let store = SqliteStore::in_memory(Duration::from_millis(50)).unwrap();
        store.append(draft("late", 300, "ann")).unwrap();
        store.append(draft("early", 100, "bob")).unwrap();
        store.append(draft("tie-first", 200, "ann")).unwrap();
        store.append(draft("tie-second", 200, "bob")).unwrap();

        let texts: Vec<_> = store
            .fetch_ordered()
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["early", "tie-first", "tie-second", "late"]);
        assert_eq!(store.message_count().unwrap(), 4);
    }

    #[test]
    fn append_assigns_unique_ids() {
        let store = SqliteStore::in_memory(Duration::from_millis(50)).unwrap();
        let a = store.append(draft("same", 1, "ann")).unwrap();
        let b = store.append(draft("same", 1, "ann")).unwrap();
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[tokio::test]
    async fn subscription_delivers_current_contents_then_appends() {
        let store = SqliteStore::in_memory(Duration::from_secs(60)).unwrap();
        store.append(draft("hello", 1, "ann")).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_sink = Arc::clone(&errors);
        let subscription = store.subscribe(
            Arc::new(move |snapshot: Vec<ChatMessage>| {
                let _ = tx.send(snapshot);
            }),
            Arc::new(move |err: StoreError| errors_sink.lock().unwrap().push(err.to_string())),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.len(), 1);

        // The poll interval is long; the append itself must wake the subscriber.
        store.append(draft("world", 2, "bob")).unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].text, "world");

        subscription.cancel();
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_table_stops_the_subscription_after_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.db");
        let store = SqliteStore::open(&path, Duration::from_millis(20)).unwrap();

        let (snapshots_tx, mut snapshots) = mpsc::unbounded_channel();
        let (errors_tx, mut errors) = mpsc::unbounded_channel();
        let _subscription = store.subscribe(
            Arc::new(move |snapshot: Vec<ChatMessage>| {
                let _ = snapshots_tx.send(snapshot);
            }),
            Arc::new(move |err: StoreError| {
                let _ = errors_tx.send(err.to_string());
            }),
        );
        assert!(snapshots.recv().await.unwrap().is_empty());

        let other = Database::new(&path).unwrap();
        other
            .connection()
            .execute("DROP TABLE messages", [])
            .unwrap();

        let reported = tokio::time::timeout(Duration::from_secs(5), errors.recv())
            .await
            .unwrap();
        assert!(reported.is_some());

        // The polling task has ended, so both callbacks are gone.
        assert_eq!(errors.recv().await, None);
        assert_eq!(snapshots.recv().await, None);
    }
}
