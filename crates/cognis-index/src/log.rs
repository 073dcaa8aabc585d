//! C1: the append-only log client. `Append`/`Subscribe`/`Ack` over the
//! `log_records`/`consumer_offsets` tables, with a bounded blocking read so
//! callers on a cooperative-cancellation thread (the broker, the heartbeat
//! loop) never spin unboundedly on an empty stream.
//!
//! Retries here are a small sync, `std::thread::sleep`-based loop rather
//! than `cognis_core::with_retry`: the log client is called from the
//! thread-based workers in `cognis-runtime`, not from async code, so
//! looping with `tokio::time::sleep` would require a runtime these
//! callers don't have. The backoff policy (linear,
//! `attempt * 100ms`) mirrors `cognis_core::retry::with_retry` exactly;
//! `with_retry` itself stays available in `cognis-core` for async call
//! sites that front this same client (e.g. an SDK method that proxies a
//! blocking store call through `spawn_blocking`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::{params, OptionalExtension};
use tracing::warn;

use crate::db::Database;
use crate::Result;

/// Upper bound on a single blocking read.
const READ_BOUND: Duration = Duration::from_secs(1);
/// How long a single poll sleeps between unsuccessful read attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Attempts for a transient-error retry within one bounded read.
const RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct LogClient {
    db: Arc<Database>,
}

impl LogClient {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append `record` to `stream`, returning the assigned offset. Offsets
    /// are assigned per-stream, monotonically, starting at 1.
    pub fn append(&self, stream: &str, record: &[u8]) -> Result<u64> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let next_offset: i64 = conn.query_row(
            "SELECT COALESCE(MAX(offset), 0) + 1 FROM log_records WHERE stream = ?1",
            params![stream],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO log_records (stream, offset, record, appended_at) VALUES (?1, ?2, ?3, strftime('%s','now'))",
            params![stream, next_offset, record],
        )?;
        tracing::debug!(stream, offset = next_offset, "appended log record");
        Ok(next_offset as u64)
    }

    /// Create-if-absent, idempotent consumer-group registration.
    pub fn ensure_group(&self, stream: &str, group: &str) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO consumer_offsets (stream, consumer_group, last_acked_offset) VALUES (?1, ?2, 0)",
            params![stream, group],
        )?;
        Ok(())
    }

    /// Acknowledge delivery up to `offset` (inclusive) for `(stream, group)`.
    pub fn ack(&self, stream: &str, group: &str, offset: u64) -> Result<()> {
        self.ensure_group(stream, group)?;
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.execute(
            "UPDATE consumer_offsets SET last_acked_offset = ?3
             WHERE stream = ?1 AND consumer_group = ?2 AND last_acked_offset < ?3",
            params![stream, group, offset as i64],
        )?;
        tracing::debug!(stream, group, offset, "acked log record");
        Ok(())
    }

    /// One non-blocking attempt: the oldest unacked record for the group,
    /// if any.
    fn read_next(&self, stream: &str, group: &str) -> Result<Option<(u64, Vec<u8>)>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let last_acked: i64 = conn
            .query_row(
                "SELECT last_acked_offset FROM consumer_offsets WHERE stream = ?1 AND consumer_group = ?2",
                params![stream, group],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        let row: Option<(i64, Vec<u8>)> = conn
            .query_row(
                "SELECT offset, record FROM log_records
                 WHERE stream = ?1 AND offset > ?2
                 ORDER BY offset ASC LIMIT 1",
                params![stream, last_acked],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(offset, record)| (offset as u64, record)))
    }

    /// Subscribe to `(stream, group)` as `consumer`. Registers the group
    /// idempotently and returns a handle whose `poll` performs the bounded
    /// blocking read.
    pub fn subscribe(&self, stream: &str, group: &str, consumer: &str) -> Result<Subscription> {
        self.ensure_group(stream, group)?;
        Ok(Subscription {
            client: self.clone(),
            stream: stream.to_string(),
            group: group.to_string(),
            consumer: consumer.to_string(),
        })
    }

    /// The most recent `limit` records on `stream`, newest first,
    /// independent of any consumer group. Used by the heartbeat reader's
    /// last-N reverse scan rather than `Subscribe`, since heartbeat
    /// lookups aren't a per-consumer cursor walk.
    pub fn read_recent(&self, stream: &str, limit: u32) -> Result<Vec<(u64, Vec<u8>)>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT offset, record FROM log_records WHERE stream = ?1 ORDER BY offset DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![stream, limit], |row| {
            Ok((row.get::<_, i64>(0)? as u64, row.get::<_, Vec<u8>>(1)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

pub struct Subscription {
    client: LogClient,
    stream: String,
    group: String,
    consumer: String,
}

impl Subscription {
    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// A single non-blocking check for the next unacked record, with the
    /// same transient-error retry as `poll` but no idle wait. Used by
    /// callers that multiplex several subscriptions in priority order
    /// (the broker) and need "first one with traffic wins" rather than a
    /// bounded block on any single stream.
    pub fn try_poll(&self) -> Result<Option<(u64, Vec<u8>)>> {
        self.read_once_with_retry()
    }

    /// Block for up to `READ_BOUND` waiting for the next unacked record.
    /// Returns `Ok(None)` on timeout (the caller re-checks cancellation and
    /// calls again) rather than blocking forever, and `Ok(None)` also when
    /// `cancel` flips during the wait. Transient database errors are
    /// logged and the same read retried in place, up to `RETRY_ATTEMPTS`;
    /// exhausting those surfaces the last error to the caller.
    pub fn poll(&self, cancel: &AtomicBool) -> Result<Option<(u64, Vec<u8>)>> {
        let deadline = Instant::now() + READ_BOUND;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }

            match self.read_once_with_retry() {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => {}
                Err(err) => return Err(err),
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
        }
    }

    fn read_once_with_retry(&self) -> Result<Option<(u64, Vec<u8>)>> {
        let mut last_err = None;
        for attempt in 0..RETRY_ATTEMPTS {
            match self.client.read_next(&self.stream, &self.group) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(attempt, stream = %self.stream, group = %self.group, error = %err, "log read failed, retrying");
                    last_err = Some(err);
                    std::thread::sleep(Duration::from_millis(100 * (attempt as u64 + 1)));
                }
            }
        }
        Err(last_err.expect("loop runs at least once"))
    }

    /// Acknowledge `offset` for this subscription's group.
    pub fn ack(&self, offset: u64) -> Result<()> {
        self.client.ack(&self.stream, &self.group, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn client() -> LogClient {
        LogClient::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn append_assigns_monotone_offsets_per_stream() {
        let c = client();
        assert_eq!(c.append("s", b"a").unwrap(), 1);
        assert_eq!(c.append("s", b"b").unwrap(), 2);
        assert_eq!(c.append("other", b"x").unwrap(), 1);
    }

    #[test]
    fn subscribe_delivers_in_offset_order_and_ack_advances_cursor() {
        let c = client();
        c.append("s", b"a").unwrap();
        c.append("s", b"b").unwrap();
        let sub = c.subscribe("s", "g", "c1").unwrap();
        let cancel = AtomicBool::new(false);

        let (off1, rec1) = sub.poll(&cancel).unwrap().unwrap();
        assert_eq!(off1, 1);
        assert_eq!(rec1, b"a");
        sub.ack(off1).unwrap();

        let (off2, rec2) = sub.poll(&cancel).unwrap().unwrap();
        assert_eq!(off2, 2);
        assert_eq!(rec2, b"b");
    }

    #[test]
    fn try_poll_returns_immediately_with_or_without_traffic() {
        let c = client();
        let sub = c.subscribe("s", "g", "c1").unwrap();
        let start = Instant::now();
        assert!(sub.try_poll().unwrap().is_none());
        assert!(start.elapsed() < Duration::from_millis(100));

        c.append("s", b"a").unwrap();
        let (offset, record) = sub.try_poll().unwrap().unwrap();
        assert_eq!(offset, 1);
        assert_eq!(record, b"a");
    }

    #[test]
    fn poll_times_out_on_empty_stream_without_blocking_forever() {
        let c = client();
        let sub = c.subscribe("empty", "g", "c1").unwrap();
        let cancel = AtomicBool::new(false);
        let start = Instant::now();
        let result = sub.poll(&cancel).unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[test]
    fn poll_returns_none_immediately_when_cancelled() {
        let c = client();
        let sub = c.subscribe("empty", "g", "c1").unwrap();
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        let result = sub.poll(&cancel).unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn read_recent_returns_newest_first_independent_of_consumer_groups() {
        let c = client();
        c.append("heartbeats", b"a").unwrap();
        c.append("heartbeats", b"b").unwrap();
        c.append("heartbeats", b"c").unwrap();
        let recent = c.read_recent("heartbeats", 2).unwrap();
        assert_eq!(recent, vec![(3, b"c".to_vec()), (2, b"b".to_vec())]);
    }

    #[test]
    fn ensure_group_is_idempotent() {
        let c = client();
        c.ensure_group("s", "g").unwrap();
        c.ensure_group("s", "g").unwrap();
        let sub = c.subscribe("s", "g", "c1").unwrap();
        assert_eq!(sub.group(), "g");
    }
}
